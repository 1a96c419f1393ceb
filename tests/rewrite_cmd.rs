use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::write_file;

fn cargo_bin() -> Command {
    Command::cargo_bin("polcheck").unwrap()
}

#[test]
fn test_rewrite_canonicalizes_bare_names() {
    cargo_bin()
        .arg("rewrite")
        .arg("alpine:3.10")
        .arg("gcr.io/fake_project/fake_image")
        .assert()
        .success()
        .stdout(predicate::eq(
            "docker.io/library/alpine:3.10\ngcr.io/fake_project/fake_image:latest\n",
        ));
}

#[test]
fn test_rewrite_applies_settings_map() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_file(
        &dir,
        "settings.json",
        r#"{"repos":{"quay.io":"quay.tencentcloudcr.com","docker.io":"dockerhub.tencentcloudcr.com"}}"#,
    );

    cargo_bin()
        .arg("rewrite")
        .arg("--settings").arg(&settings)
        .arg("quay.io/etcd/etcd:v3.5")
        .arg("nginx")
        .assert()
        .success()
        .stdout(predicate::eq(
            "quay.tencentcloudcr.com/etcd/etcd:v3.5\ndockerhub.tencentcloudcr.com/library/nginx:latest\n",
        ));
}

#[test]
fn test_rewrite_without_images_shows_usage() {
    cargo_bin()
        .arg("rewrite")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_rewrite_with_missing_settings_file_is_fatal() {
    cargo_bin()
        .arg("rewrite")
        .arg("--settings").arg("/no/such/settings.json")
        .arg("alpine")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read settings"));
}
