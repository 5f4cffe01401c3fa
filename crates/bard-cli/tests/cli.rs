//! Drives the `bard` binary end to end.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMA: &str = r#"{
    "tier": "gcp",
    "definitions": {
        "assay_type": {"type": "stringOptions", "required": true, "description": "Assay used to generate the reads"},
        "out_dir": {"type": "stringPattern", "default_value": "/results", "description": "Output directory"}
    }
}"#;

const ENGINE_VARS: [&str; 5] = [
    "EA_NEXTFLOW_WORK_DIR",
    "EA_DC_DATA_SRC",
    "EA_DC_REFERENCES",
    "EA_NEXTFLOW_LOG_FILE",
    "EA_NEXTFLOW_SYSLOG",
];

fn pipeline_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("param_jsons")).unwrap();
    std::fs::write(dir.path().join("param_jsons/gcp_params.json"), SCHEMA).unwrap();
    dir
}

fn bard(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bard"));
    cmd.args(args)
        .current_dir(dir)
        .env("BARD_PIPELINE_DIR", dir)
        .env_remove("RUST_LOG");
    for var in ENGINE_VARS {
        cmd.env_remove(var);
    }
    cmd.envs(env.iter().copied());
    cmd.output().unwrap()
}

#[test]
fn test_help_exits_zero() {
    let dir = pipeline_dir();
    let out = bard(dir.path(), &["--tier", "gcp", "--help"], &[]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--assay_type"));
    assert!(stdout.contains("Assay used to generate the reads"));
}

#[test]
fn test_missing_environment_exits_nonzero() {
    let dir = pipeline_dir();
    let out = bard(dir.path(), &["--tier", "gcp", "--assay_type", "wgs"], &[]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("EA_NEXTFLOW_WORK_DIR"));
}

#[test]
fn test_missing_tier_exits_nonzero() {
    let dir = pipeline_dir();
    let out = bard(dir.path(), &["--assay_type", "wgs"], &[("EA_DC_DATA_SRC", "/data")]);
    assert!(!out.status.success());
}

#[cfg(unix)]
#[test]
fn test_runs_fake_nextflow() {
    use std::os::unix::fs::PermissionsExt;

    let dir = pipeline_dir();
    let script = dir.path().join("fake-nextflow");
    std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let out = bard(
        dir.path(),
        &["--tier", "gcp", "--assay_type", "wgs"],
        &[
            ("EA_DC_DATA_SRC", "/data"),
            ("BARD_NEXTFLOW_BIN", script.to_str().unwrap()),
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let first = stdout.lines().next().unwrap();
    assert!(first.contains(" run "));
    assert!(first.contains("--assay_type wgs"));
    assert!(first.ends_with("-profile standard,cc"));
}
