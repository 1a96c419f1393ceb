#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// Write an executable `fake-kwctl` shell script into `dir`. The script
/// body decides what "the policy tool" prints and how it exits.
pub fn fake_tool(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("fake-kwctl");
    let mut f = fs::File::create(&path).expect("create fake tool");
    writeln!(f, "#!/bin/sh").expect("write shebang");
    writeln!(f, "{body}").expect("write body");
    drop(f);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    path
}

pub fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write file");
    path
}
