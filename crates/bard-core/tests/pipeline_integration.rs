//! End-to-end runs of the pipeline caller against scripted and real processes.

use bard_core::env::{DATA_SRC_VAR, LOG_FILE_VAR};
use bard_core::fakes::{Scripted, ScriptedRunner};
use bard_core::{
    BardError, CleanupOutcome, EnvSnapshot, ErrorKind, PipelineCaller, PipelineConfig, RunState,
    Stage,
};
use std::path::Path;
use tempfile::TempDir;

const RUO_SCHEMA: &str = r#"{
    "tier": "ruo",
    "definitions": {
        "assay_type": {
            "type": "stringOptions",
            "required": true,
            "options": ["wgs", "wes", "panel", "amplicon"],
            "description": "Assay used to generate the reads"
        },
        "variant_type": {"type": "stringOptions", "description": "Variant classes to call"},
        "min_depth": {"type": "integer", "default_value": 20, "description": "Minimum depth"},
        "out_dir": {"type": "stringPattern", "default_value": "/results", "description": "Output directory"}
    }
}"#;

fn pipeline_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let schemas = dir.path().join("param_jsons");
    std::fs::create_dir_all(&schemas).unwrap();
    std::fs::write(schemas.join("ruo_params.json"), RUO_SCHEMA).unwrap();
    dir
}

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig::default().with_pipeline_dir(dir)
}

fn tokens(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn data_env() -> EnvSnapshot {
    EnvSnapshot::from_pairs([(DATA_SRC_VAR, "/data")])
}

fn is_run_name(name: &str) -> bool {
    name.strip_prefix("BARD_")
        .map(|s| s.len() == 32 && s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')))
        .unwrap_or(false)
}

#[test]
fn test_end_to_end_default_profile() {
    let dir = pipeline_dir();
    let runner = ScriptedRunner::default();
    let mut caller = PipelineCaller::new(config_for(dir.path()), &runner);

    let report = caller
        .run(
            &tokens(&["--tier", "ruo", "--assay_type", "wgs", "--variant_type", "genome"]),
            &data_env(),
        )
        .unwrap();

    assert!(is_run_name(report.run_name.as_str()));
    assert!(report.command_line.ends_with("-profile standard,cc"));
    assert_eq!(report.schema_digest.len(), 64);
    assert!(matches!(report.cleanup, CleanupOutcome::Cleaned(_)));
    assert_eq!(caller.state(), RunState::At(Stage::CleanedUp));

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    let run = &calls[0];
    assert_eq!(run.program, "nextflow");
    assert_eq!(run.cwd, dir.path());
    assert_eq!(run.env["NXF_WORK"], "/data/scratch/nextflow/work/");
    assert_eq!(run.env["EA_DC_REFERENCES"], "/data/references/combined");
    assert_eq!(&run.args[..2], ["-log", "/results/nextflow.log"]);

    let clean = &calls[1];
    assert_eq!(
        clean.args,
        vec!["clean", "-quiet", report.run_name.as_str(), "-f"]
    );
}

#[test]
fn test_cleanup_failure_is_distinct_from_run_failure() {
    let dir = pipeline_dir();
    let runner = ScriptedRunner::new([Scripted::exit(0), Scripted::output(1, "", "clean failed")]);
    let mut caller = PipelineCaller::new(config_for(dir.path()), &runner);

    let err = caller
        .run(&tokens(&["--tier", "ruo", "--assay_type", "wes"]), &data_env())
        .unwrap_err();

    assert!(matches!(err, BardError::Cleanup { .. }));
    assert!(err.run_succeeded());
    assert_eq!(err.kind(), ErrorKind::Cleanup);
    assert!(err.to_string().contains("/data/scratch/nextflow/work/"));
    assert_eq!(caller.state(), RunState::At(Stage::CleanupFailed));
    assert!(caller.execution().unwrap().success());
}

#[test]
fn test_run_failure_skips_cleanup() {
    let dir = pipeline_dir();
    let runner = ScriptedRunner::new([Scripted::output(2, "", "process failed")]);
    let mut caller = PipelineCaller::new(config_for(dir.path()), &runner);

    let err = caller
        .run(&tokens(&["--tier", "ruo", "--assay_type", "wgs"]), &data_env())
        .unwrap_err();

    assert!(matches!(err, BardError::Run { exit_code: Some(2), .. }));
    assert!(!err.run_succeeded());
    assert_eq!(
        caller.state(),
        RunState::Failed {
            stage: Stage::CommandBuilt,
            kind: ErrorKind::Run
        }
    );
    assert!(caller.execution().is_none());
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn test_hosted_runner_skips_cleanup() {
    let dir = pipeline_dir();
    let runner = ScriptedRunner::default();
    let mut caller = PipelineCaller::new(config_for(dir.path()), &runner);
    let env = EnvSnapshot::from_pairs([
        (DATA_SRC_VAR, "/data"),
        (LOG_FILE_VAR, "/var/log/nextflow.log"),
    ]);

    let report = caller
        .run(
            &tokens(&["--tier", "ruo", "--assay_type", "wgs", "-profile", "nf_runner,docker"]),
            &env,
        )
        .unwrap();

    assert!(matches!(report.cleanup, CleanupOutcome::Skipped));
    assert!(report.command_line.contains("-log /var/log/nextflow.log"));
    assert_eq!(runner.calls().len(), 1);
    assert_eq!(caller.state(), RunState::At(Stage::CleanedUp));
}

#[test]
fn test_missing_schema_fails_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default();
    let mut caller = PipelineCaller::new(config_for(dir.path()), &runner);

    let err = caller
        .run(&tokens(&["--tier", "ruo", "--assay_type", "wgs"]), &data_env())
        .unwrap_err();

    assert!(matches!(err, BardError::Schema { .. }));
    assert_eq!(
        caller.state(),
        RunState::Failed {
            stage: Stage::Created,
            kind: ErrorKind::Schema
        }
    );
    assert!(runner.calls().is_empty());
}

#[test]
fn test_missing_environment_fails_after_parsing() {
    let dir = pipeline_dir();
    let runner = ScriptedRunner::default();
    let mut caller = PipelineCaller::new(config_for(dir.path()), &runner);

    let err = caller
        .run(
            &tokens(&["--tier", "ruo", "--assay_type", "wgs"]),
            &EnvSnapshot::default(),
        )
        .unwrap_err();

    assert!(matches!(err, BardError::Environment(_)));
    assert_eq!(
        caller.state(),
        RunState::Failed {
            stage: Stage::ArgumentsParsed,
            kind: ErrorKind::Environment
        }
    );
    assert!(caller.invocation().is_none());
}

#[test]
fn test_bad_argument_type_fails_at_schema_loaded() {
    let dir = pipeline_dir();
    let mut caller = PipelineCaller::new(config_for(dir.path()), ScriptedRunner::default());

    let err = caller
        .run(
            &tokens(&["--tier", "ruo", "--assay_type", "wgs", "--min_depth", "deep"]),
            &data_env(),
        )
        .unwrap_err();

    assert!(matches!(err, BardError::ArgumentType(_)));
    assert_eq!(
        caller.state(),
        RunState::Failed {
            stage: Stage::SchemaLoaded,
            kind: ErrorKind::ArgumentType
        }
    );
    assert!(caller.runner().calls().is_empty());
}

#[test]
fn test_help_does_not_fail_the_run() {
    let dir = pipeline_dir();
    let mut caller = PipelineCaller::new(config_for(dir.path()), ScriptedRunner::default());

    let err = caller
        .run(&tokens(&["--tier", "ruo", "--help"]), &data_env())
        .unwrap_err();

    match err {
        BardError::HelpRequested(text) => assert!(text.contains("Assay used to generate the reads")),
        other => panic!("expected help, got {other:?}"),
    }
    assert_eq!(caller.state(), RunState::At(Stage::SchemaLoaded));
}

#[cfg(unix)]
#[test]
fn test_system_runner_with_fake_nextflow() {
    use bard_core::SystemRunner;
    use std::os::unix::fs::PermissionsExt;

    let dir = pipeline_dir();
    let log = dir.path().join("calls.log");
    let script = dir.path().join("nextflow");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\necho \"work=$NXF_WORK\"\nexit 0\n",
            log.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = config_for(dir.path()).with_engine(script.to_string_lossy());
    let mut caller = PipelineCaller::new(config, SystemRunner);
    let report = caller
        .run(&tokens(&["--tier", "ruo", "--assay_type", "panel"]), &data_env())
        .unwrap();

    assert_eq!(report.execution.stdout, "work=/data/scratch/nextflow/work/\n");
    let logged = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = logged.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("--assay_type panel"));
    assert!(lines[0].ends_with("-profile standard,cc"));
    assert_eq!(lines[1], format!("clean -quiet {} -f", report.run_name));
}
