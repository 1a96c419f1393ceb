//! The fixture check: one external-process invocation, two assertions.
//!
//! A check invokes `<tool> run --request-path <fixture> <policy>` and then
//! asserts the exit status is zero and the captured output contains the
//! expected marker. With settings loaded, it additionally asserts every
//! fixture image the repo map rewrites shows up rewritten in the output.

use std::path::PathBuf;
use std::time::Duration;

use crate::fixture::{Fixture, FixtureError};
use crate::runner::{Invocation, InvocationResult, RunnerError, DEFAULT_TIMEOUT_MS};
use crate::settings::{Settings, SettingsError};

/// Marker an admitting evaluation prints.
pub const ALLOWED_MARKER: &str = r#""allowed":true"#;

/// Marker a rejecting evaluation prints.
pub const DENIED_MARKER: &str = r#""allowed":false"#;

/// Infrastructure failures: the check never reached a verdict.
///
/// Distinct from assertion failures, which are ordinary entries in the
/// [`CheckReport`]. A nonzero tool exit is the failure mode being tested
/// against, not an error.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// One planned check against the external tool.
pub struct FixtureCheck {
    pub tool: PathBuf,
    pub policy: PathBuf,
    pub fixture: PathBuf,
    /// Substring the captured output must contain.
    pub marker: String,
    /// Optional settings file, forwarded to the tool via `--settings-json`.
    pub settings: Option<PathBuf>,
    pub timeout: Duration,
}

impl FixtureCheck {
    /// A check with the default marker ([`ALLOWED_MARKER`]) and timeout.
    pub fn new(tool: PathBuf, policy: PathBuf, fixture: PathBuf) -> Self {
        Self {
            tool,
            policy,
            fixture,
            marker: ALLOWED_MARKER.to_string(),
            settings: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn expecting(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_settings(mut self, settings: PathBuf) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The outcome of one check: the raw invocation result plus any assertion
/// failures.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub result: InvocationResult,
    pub failures: Vec<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run one fixture check end to end.
///
/// `Err` means infrastructure failure (fixture unreadable, tool missing or
/// hung); `Ok` with a non-empty failure list means the tool ran but the
/// assertions did not hold. Repeated invocations with the same inputs are
/// expected to produce the same report; the harness keeps no state between
/// runs.
pub fn run_fixture_check(check: &FixtureCheck) -> Result<CheckReport, CheckError> {
    let fixture = Fixture::load(&check.fixture)?;

    let settings = match &check.settings {
        Some(path) => Some(Settings::load(path)?),
        None => None,
    };

    let mut args = vec![
        "run".to_string(),
        "--request-path".to_string(),
        check.fixture.display().to_string(),
    ];
    if let Some((_, raw)) = &settings {
        args.push("--settings-json".to_string());
        args.push(raw.clone());
    }
    args.push(check.policy.display().to_string());

    let result = Invocation::new(check.tool.clone(), args)
        .with_timeout(check.timeout)
        .run()?;

    let mut failures = Vec::new();
    evaluate(
        &mut failures,
        &fixture,
        settings.as_ref().map(|(s, _)| s),
        check,
        &result,
    );

    Ok(CheckReport { result, failures })
}

fn evaluate(
    failures: &mut Vec<String>,
    fixture: &Fixture,
    settings: Option<&Settings>,
    check: &FixtureCheck,
    result: &InvocationResult,
) {
    match result.code {
        Some(0) => {}
        Some(code) => failures.push(format!("tool exited with status {code}, expected 0")),
        None => failures.push("tool was terminated by a signal".to_string()),
    }

    let text = result.text();
    if !text.contains(&check.marker) {
        failures.push(format!("output does not contain expected '{}'", check.marker));
    }

    if let Some(settings) = settings {
        for image in fixture.container_images() {
            if let Some(rewritten) = settings.rewrite(&image) {
                if !text.contains(&rewritten) {
                    failures.push(format!(
                        "image '{image}' was not rewritten to '{rewritten}' in the output"
                    ));
                }
            }
        }
    }
}
