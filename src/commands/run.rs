use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use polcheck::cli_util::{print_check_error, print_report};
use polcheck::runner::DEFAULT_TIMEOUT_MS;
use polcheck::{run_fixture_check, FixtureCheck, ALLOWED_MARKER, DENIED_MARKER};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Policy-evaluation tool to invoke (fallback POLCHECK_TOOL; default kwctl)
    #[arg(long = "tool", value_name = "PATH")]
    pub tool: Option<PathBuf>,

    /// Admission-request fixture JSON to evaluate the policy against
    #[arg(short = 'r', long = "request-path", value_name = "PATH")]
    pub request_path: Option<PathBuf>,

    /// Expect this substring in the output instead of "allowed":true
    #[arg(long = "expect", value_name = "SUBSTR", conflicts_with = "deny")]
    pub expect: Option<String>,

    /// Expect the request to be denied ("allowed":false)
    #[arg(long = "deny")]
    pub deny: bool,

    /// Settings JSON file, forwarded to the tool via --settings-json
    #[arg(short = 's', long = "settings", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Wall-clock timeout in milliseconds (fallback POLCHECK_TIMEOUT_MS; default 5_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Policy artifact to evaluate
    #[arg(value_name = "POLICY")]
    pub policy: Option<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        tool,
        request_path,
        expect,
        deny,
        settings,
        timeout_ms,
        policy,
        ..
    } = args;

    let (Some(request_path), Some(policy)) = (request_path, policy) else {
        usage_and_exit(program, 2);
    };

    // Resolve knobs: flags -> env -> defaults
    let tool = tool
        .or_else(|| std::env::var("POLCHECK_TOOL").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("kwctl"));
    let timeout_ms = timeout_ms
        .or_else(|| {
            std::env::var("POLCHECK_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
        })
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    let marker = expect.unwrap_or_else(|| {
        if deny {
            DENIED_MARKER.to_string()
        } else {
            ALLOWED_MARKER.to_string()
        }
    });

    // Install SIGINT (ctrl+c) handler to flush and exit immediately; the
    // child shares our process group and gets the signal on its own.
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        std::process::exit(130);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut check = FixtureCheck::new(tool, policy, request_path)
        .expecting(marker)
        .with_timeout(Duration::from_millis(timeout_ms));
    if let Some(settings) = settings {
        check = check.with_settings(settings);
    }

    match run_fixture_check(&check) {
        Ok(report) => {
            print_report(&report);
            if report.passed() { 0 } else { 1 }
        }
        Err(err) => {
            print_check_error(program, &err);
            2
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [--tool <PATH>] [--deny|--expect <SUBSTR>] [--settings <PATH>] --request-path <FIXTURE> <POLICY>

Options:
  --request-path, -r <PATH>  Admission-request fixture JSON to evaluate the policy against
  --tool <PATH>        Policy-evaluation tool to invoke (fallback POLCHECK_TOOL; default kwctl)
  --expect <SUBSTR>    Expect SUBSTR in the output instead of "allowed":true
  --deny               Expect the request to be denied ("allowed":false)
  --settings, -s <PATH>  Settings JSON file, forwarded to the tool via --settings-json
  --timeout <MS>       Wall-clock timeout in milliseconds (fallback POLCHECK_TIMEOUT_MS; default 5_000)
  --help,  -h          Show this help

Notes:
- The tool is invoked as: <tool> run --request-path <FIXTURE> [--settings-json <JSON>] <POLICY>.
- The captured output is echoed in full, pass or fail.
- With --settings, fixture images the repo map rewrites must appear rewritten in the output.

Exit codes:
  0  check passed
  1  assertion failure (nonzero tool exit, or expected text absent)
  2  usage error or infrastructure failure (missing tool/fixture, malformed JSON, timeout)

Examples:
- Assert a pod-creation request is admitted:
    {0} run --request-path test_data/pod_creation.json annotated-policy.wasm
- Assert a request is rejected:
    {0} run --deny --request-path test_data/pod_privileged.json annotated-policy.wasm
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
