//! A fixture-driven end-to-end checker for admission-policy CLIs.
//!
//! `polcheck` shells out to an external policy-evaluation tool (such as
//! `kwctl`), pointing it at a JSON admission-request fixture and a policy
//! artifact, and asserts the outcome: the tool exits 0 and its output
//! contains a marker substring (`"allowed":true` by default).
//!
//! Features and behaviors:
//! - Wall-clock timeout on every invocation; a hanging tool is killed and
//!   reported with whatever output it produced.
//! - Infrastructure failures (missing tool, missing or malformed fixture)
//!   are kept apart from assertion failures (nonzero exit, absent marker).
//! - Captured output is preserved verbatim for diagnostics, pass or fail.
//! - Optional repo-mapping settings: fixture container images that the map
//!   rewrites must appear rewritten in the tool's output.
//!
//! Quick start:
//!
//! ```no_run
//! use std::path::PathBuf;
//! use polcheck::{run_fixture_check, FixtureCheck, ALLOWED_MARKER};
//!
//! let check = FixtureCheck::new(
//!     PathBuf::from("kwctl"),
//!     PathBuf::from("annotated-policy.wasm"),
//!     PathBuf::from("test_data/pod_creation.json"),
//! );
//! let report = run_fixture_check(&check).expect("tool and fixture present");
//! assert!(report.passed(), "expected {ALLOWED_MARKER} in:\n{}", report.result.text());
//! ```

pub mod check;
pub mod cli_util;
pub mod fixture;
pub mod image;
pub mod runner;
pub mod settings;

pub use check::{
    run_fixture_check, CheckError, CheckReport, FixtureCheck, ALLOWED_MARKER, DENIED_MARKER,
};
pub use fixture::{Fixture, FixtureError};
pub use image::ImageRef;
pub use runner::{Invocation, InvocationResult, RunnerError};
pub use settings::Settings;
