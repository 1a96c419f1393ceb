//! Synchronous external-process invocation with a wall-clock timeout.
//!
//! The runner spawns the tool with stdout and stderr piped and stdin closed,
//! drains both streams on reader threads, and polls the child for exit until
//! a deadline. A child that misses the deadline is killed and reported as a
//! [`RunnerError::Timeout`] carrying whatever output it produced.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Default wall-clock timeout for a single tool invocation.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Poll interval while waiting for the child to exit.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Errors that can occur while invoking the external tool.
///
/// All of these are infrastructure failures: the check never got a verdict
/// to assert on.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The tool could not be spawned (missing, not executable, ...).
    #[error("failed to launch '{tool}': {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool did not exit before the deadline and was killed.
    #[error("'{tool}' did not exit within {timeout_ms} ms")]
    Timeout {
        tool: String,
        timeout_ms: u64,
        /// Output captured before the kill, for diagnostics.
        partial_output: String,
    },

    /// An I/O error occurred while monitoring the child.
    #[error("error while waiting for '{tool}': {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// One planned invocation of the external tool.
pub struct Invocation {
    tool: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

/// What one invocation produced: exit code and captured streams.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// Exit code; `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl InvocationResult {
    /// Whether the tool exited 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Concatenated stdout + stderr, the text assertions run against.
    pub fn text(&self) -> String {
        let mut s = String::with_capacity(self.stdout.len() + self.stderr.len());
        s.push_str(&self.stdout);
        s.push_str(&self.stderr);
        s
    }
}

impl Invocation {
    pub fn new(tool: PathBuf, args: Vec<String>) -> Self {
        Self {
            tool,
            args,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tool_name(&self) -> String {
        self.tool.display().to_string()
    }

    /// Run the tool to completion or to the deadline, whichever comes first.
    pub fn run(&self) -> Result<InvocationResult, RunnerError> {
        let tool = self.tool_name();

        let mut child = Command::new(&self.tool)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Launch {
                tool: tool.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child can't block on a
        // full pipe buffer while we wait for it to exit. Buffers are shared
        // rather than returned from the threads: a grandchild holding the
        // pipe open must not be able to stall the run on a join.
        let out_buf = Arc::new(Mutex::new(Vec::new()));
        let err_buf = Arc::new(Mutex::new(Vec::new()));
        let out_pipe = child.stdout.take().expect("stdout piped");
        let err_pipe = child.stderr.take().expect("stderr piped");
        let out_thread = drain(out_pipe, out_buf.clone());
        let err_thread = drain(err_pipe, err_buf.clone());

        let started = Instant::now();
        let deadline = started + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        thread::sleep(WAIT_POLL);
                        return Err(RunnerError::Timeout {
                            tool,
                            timeout_ms: self.timeout.as_millis() as u64,
                            partial_output: format!(
                                "{}{}",
                                snapshot(&out_buf),
                                snapshot(&err_buf)
                            ),
                        });
                    }
                    thread::sleep(WAIT_POLL);
                }
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunnerError::Wait { tool, source });
                }
            }
        };

        // The readers normally finish as soon as the child exits, but a
        // grandchild that inherited a pipe keeps it open; give them only the
        // remaining deadline, then fall back to the buffer snapshots.
        await_reader(out_thread, deadline);
        await_reader(err_thread, deadline);

        Ok(InvocationResult {
            code: status.code(),
            stdout: snapshot(&out_buf),
            stderr: snapshot(&err_buf),
            elapsed: started.elapsed(),
        })
    }
}

fn drain<R: Read + Send + 'static>(
    mut pipe: R,
    buf: Arc<Mutex<Vec<u8>>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if let Ok(mut b) = buf.lock() {
                        b.extend_from_slice(&chunk[..n]);
                    }
                }
            }
        }
    })
}

fn await_reader(handle: thread::JoinHandle<()>, deadline: Instant) {
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(WAIT_POLL);
    }
    if handle.is_finished() {
        let _ = handle.join();
    }
}

fn snapshot(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    match buf.lock() {
        Ok(b) => String::from_utf8_lossy(&b).into_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> Invocation {
        Invocation::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), script.to_string()],
        )
        .with_timeout(timeout)
    }

    #[test]
    fn captures_stdout_and_exit_code() {
        let res = sh("echo hello", Duration::from_secs(5)).run().unwrap();
        assert!(res.success());
        assert_eq!(res.stdout, "hello\n");
        assert!(res.stderr.is_empty());
    }

    #[test]
    fn nonzero_exit_is_not_an_error() {
        let res = sh("echo oops >&2; exit 3", Duration::from_secs(5))
            .run()
            .unwrap();
        assert_eq!(res.code, Some(3));
        assert!(!res.success());
        assert_eq!(res.stderr, "oops\n");
    }

    #[test]
    fn text_concatenates_stdout_then_stderr() {
        let res = sh("echo out; echo err >&2", Duration::from_secs(5))
            .run()
            .unwrap();
        assert_eq!(res.text(), "out\nerr\n");
    }

    #[test]
    fn missing_tool_reports_launch_failure() {
        let inv = Invocation::new(
            PathBuf::from("/no/such/tool-anywhere"),
            vec!["run".to_string()],
        );
        let err = inv.run().unwrap_err();
        assert!(matches!(err, RunnerError::Launch { .. }));
    }

    #[test]
    fn lingering_grandchild_does_not_stall_a_finished_run() {
        // the backgrounded sleep inherits the stdout pipe and outlives the
        // tool; the run must still return within the deadline budget
        let started = Instant::now();
        let res = sh("echo early; sleep 5 & exit 0", Duration::from_millis(500))
            .run()
            .unwrap();
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "run() blocked on the grandchild for {:?}",
            started.elapsed()
        );
        assert!(res.success());
        assert!(res.stdout.contains("early"));
    }

    #[test]
    fn hanging_tool_is_killed_at_deadline() {
        let started = Instant::now();
        let err = sh("echo early; exec sleep 30", Duration::from_millis(200))
            .run()
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            RunnerError::Timeout {
                timeout_ms,
                partial_output,
                ..
            } => {
                assert_eq!(timeout_ms, 200);
                assert!(partial_output.contains("early"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
