use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::fake_tool;

fn cargo_bin() -> Command {
    Command::cargo_bin("polcheck").unwrap()
}

fn denying_tool(dir: &tempfile::TempDir) -> std::path::PathBuf {
    fake_tool(
        dir,
        r#"echo '{"allowed":false,"status":{"message":"privileged containers are not allowed"}}'"#,
    )
}

#[test]
fn test_denied_output_fails_the_default_check() {
    let dir = tempfile::tempdir().unwrap();
    let tool = denying_tool(&dir);

    cargo_bin()
        .arg("run")
        .arg("--tool").arg(&tool)
        .arg("--request-path").arg("test_data/pod_privileged.json")
        .arg("annotated-policy.wasm")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#"does not contain expected '"allowed":true'"#))
        .stderr(predicate::str::contains("check failed"));
}

#[test]
fn test_deny_flag_expects_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let tool = denying_tool(&dir);

    cargo_bin()
        .arg("run")
        .arg("--deny")
        .arg("--tool").arg(&tool)
        .arg("--request-path").arg("test_data/pod_privileged.json")
        .arg("annotated-policy.wasm")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""allowed":false"#))
        .stdout(predicate::str::contains("check passed"));
}

#[test]
fn test_expect_flag_overrides_the_marker() {
    let dir = tempfile::tempdir().unwrap();
    let tool = denying_tool(&dir);

    cargo_bin()
        .arg("run")
        .arg("--expect").arg("privileged containers")
        .arg("--tool").arg(&tool)
        .arg("--request-path").arg("test_data/pod_privileged.json")
        .arg("annotated-policy.wasm")
        .assert()
        .success();
}

#[test]
fn test_expect_and_deny_conflict() {
    cargo_bin()
        .arg("run")
        .arg("--deny")
        .arg("--expect").arg("whatever")
        .arg("--request-path").arg("test_data/pod_privileged.json")
        .arg("annotated-policy.wasm")
        .assert()
        .failure();
}
