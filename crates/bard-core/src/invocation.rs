//! Nextflow invocation assembly
//!
//! The argument order is a contract with Nextflow:
//!
//! ```text
//! nextflow -log <file> -syslog <dest> run <entry.nf> -name <run> -c <runner.config> <tokens...> [-profile <p>]
//! ```
//!
//! Arguments stay a token list until they reach the process; the quoted
//! single-line form is for display only.

use crate::args::{ParsedArguments, PROFILE_FLAG};
use crate::config::PipelineConfig;
use crate::env::EnvironmentConfig;
use crate::error::BardError;
use crate::executor::CommandSpec;
use crate::Result;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique name of one pipeline run: `<PIPELINE>_<32 hex>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunName(String);

impl RunName {
    pub fn generate(pipeline_name: &str) -> Self {
        RunName(format!("{}_{}", pipeline_name, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully assembled engine run
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub run_name: RunName,
    pub working_dir: PathBuf,
    /// Added on top of the inherited environment
    pub env_overlay: BTreeMap<String, String>,
    /// Needed by cleanup to name the work dir in errors
    pub work_dir: PathBuf,
    pub hosted_runner: bool,
}

impl Invocation {
    /// Assemble the run with a freshly generated run name.
    pub fn build(
        config: &PipelineConfig,
        args: &ParsedArguments,
        env: &EnvironmentConfig,
    ) -> Result<Self> {
        Self::build_named(config, args, env, RunName::generate(&config.pipeline_name))
    }

    pub fn build_named(
        config: &PipelineConfig,
        args: &ParsedArguments,
        env: &EnvironmentConfig,
        run_name: RunName,
    ) -> Result<Self> {
        let mut argv: Vec<String> = vec![
            "-log".to_string(),
            env.log_file.to_string_lossy().into_owned(),
            "-syslog".to_string(),
            env.syslog.clone(),
            "run".to_string(),
            config.entry_point_path().to_string_lossy().into_owned(),
            "-name".to_string(),
            run_name.to_string(),
            "-c".to_string(),
            config.runner_config.to_string_lossy().into_owned(),
        ];
        argv.extend(args.raw().iter().cloned());

        // An explicit -profile already sits in the raw tokens
        if !args.has_explicit_profile() {
            argv.push(PROFILE_FLAG.to_string());
            argv.push(args.profile.clone());
        }

        let invocation = Invocation {
            program: config.engine.clone(),
            args: argv,
            run_name,
            working_dir: config.pipeline_dir.clone(),
            env_overlay: env.child_overlay(),
            work_dir: env.work_dir.clone(),
            hosted_runner: env.hosted_runner,
        };
        invocation.validate()?;
        Ok(invocation)
    }

    fn validate(&self) -> Result<()> {
        if self.program.is_empty() {
            return Err(BardError::ArgumentType(
                "engine executable must not be empty".to_string(),
            ));
        }
        if let Some(bad) = self.args.iter().find(|a| a.contains('\0')) {
            return Err(BardError::ArgumentType(format!(
                "argument {bad:?} contains a NUL byte"
            )));
        }
        Ok(())
    }

    /// Shell-quoted single-line rendering, for display and logs.
    pub fn command_line(&self) -> String {
        render_command_line(&self.program, &self.args)
    }

    /// The engine run as a process spec
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            args: self.args.clone(),
            cwd: self.working_dir.clone(),
            env: self.env_overlay.clone(),
        }
    }

    /// `nextflow clean -quiet <run name> -f`, scoped to this run
    pub fn cleanup_spec(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            args: vec![
                "clean".to_string(),
                "-quiet".to_string(),
                self.run_name.to_string(),
                "-f".to_string(),
            ],
            cwd: self.working_dir.clone(),
            env: BTreeMap::new(),
        }
    }
}

/// Join tokens into one line, single-quoting anything a POSIX shell would
/// split or expand.
pub fn render_command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(token: &str) -> Cow<'_, str> {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:,=@%+".contains(c));
    if safe {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', r"'\''")))
    }
}
