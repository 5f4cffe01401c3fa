//! Child process execution and post-run cleanup
//!
//! All process launches go through [`ProcessRunner`] so the pipeline can be
//! exercised without a Nextflow installation (see [`crate::fakes`]).

use crate::error::BardError;
use crate::invocation::{render_command_line, Invocation};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One process to launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Added on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn command_line(&self) -> String {
        render_command_line(&self.program, &self.args)
    }
}

/// Captured output of a finished process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub captured_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn new(exit_code: Option<i32>, stdout: String, stderr: String, duration_ms: u64) -> Self {
        ExecutionResult {
            exit_code,
            stdout,
            stderr,
            duration_ms,
            captured_at: Utc::now(),
        }
    }

    /// Did the process exit with code 0?
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Print the captured streams, stdout to stdout and stderr to stderr.
    pub fn surface(&self) {
        if !self.stdout.is_empty() {
            println!("{}", self.stdout);
        }
        if !self.stderr.is_empty() {
            eprintln!("{}", self.stderr);
        }
    }
}

/// Launches a process and waits for it
pub trait ProcessRunner {
    /// Run `spec` to completion, capturing both streams in full.
    ///
    /// An `Err` means the process could not be started at all.
    fn run(&self, spec: &CommandSpec) -> std::io::Result<ExecutionResult>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<ExecutionResult> {
        (**self).run(spec)
    }
}

/// Runs commands with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<ExecutionResult> {
        let start = Instant::now();
        debug!("Spawning: {} (cwd {:?})", spec.command_line(), spec.cwd);

        let output = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(&spec.env)
            .output()?;

        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(ExecutionResult::new(
            output.status.code(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms,
        ))
    }
}

/// What happened after a successful run
#[derive(Debug, Clone)]
pub enum CleanupOutcome {
    /// `nextflow clean` exited 0
    Cleaned(ExecutionResult),
    /// Hosted runner; the host owns the work directory
    Skipped,
}

/// Runs the engine and its cleanup through a [`ProcessRunner`]
pub struct Executor<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> Executor<R> {
    pub fn new(runner: R) -> Self {
        Executor { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the engine. Streams are surfaced before a non-zero exit is
    /// turned into [`BardError::Run`].
    pub fn execute(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        let spec = invocation.command_spec();
        info!(run_name = %invocation.run_name, "Starting nextflow run");

        let result = self.runner.run(&spec).map_err(|e| BardError::Run {
            run_name: invocation.run_name.to_string(),
            exit_code: None,
            detail: format!("could not start {}: {}", spec.program, e),
        })?;
        result.surface();

        if !result.success() {
            warn!(
                run_name = %invocation.run_name,
                exit_code = ?result.exit_code,
                duration_ms = result.duration_ms,
                "nextflow run failed"
            );
            return Err(BardError::Run {
                run_name: invocation.run_name.to_string(),
                exit_code: result.exit_code,
                detail: "see the nextflow output above".to_string(),
            });
        }

        info!(
            run_name = %invocation.run_name,
            duration_ms = result.duration_ms,
            "nextflow run completed"
        );
        Ok(result)
    }

    /// Remove the run's engine state unless the hosted runner owns it.
    pub fn cleanup(&self, invocation: &Invocation) -> Result<CleanupOutcome> {
        if invocation.hosted_runner {
            info!(run_name = %invocation.run_name, "Hosted runner; skipping nextflow clean");
            return Ok(CleanupOutcome::Skipped);
        }

        let spec = invocation.cleanup_spec();
        let cleanup_error = |exit_code, detail| BardError::Cleanup {
            run_name: invocation.run_name.to_string(),
            exit_code,
            work_dir: invocation.work_dir.clone(),
            detail,
        };

        let result = self
            .runner
            .run(&spec)
            .map_err(|e| cleanup_error(None, format!("could not start {}: {}", spec.program, e)))?;
        result.surface();

        if !result.success() {
            return Err(cleanup_error(
                result.exit_code,
                "nextflow clean reported an error".to_string(),
            ));
        }

        info!(run_name = %invocation.run_name, "Cleaned up nextflow run state");
        Ok(CleanupOutcome::Cleaned(result))
    }
}
