//! End-to-end run of the BARD pipeline
//!
//! ```text
//! Created → SchemaLoaded → ArgumentsParsed → EnvironmentResolved
//!         → CommandBuilt → Executed → {CleanedUp | CleanupFailed}
//! ```
//!
//! Any stage before cleanup can end in `Failed(stage, kind)`, where `stage`
//! is the last stage reached. A cleanup failure ends in `CleanupFailed`
//! instead: the run itself already succeeded.

use crate::args::{ArgumentBuilder, ParsedArguments};
use crate::config::PipelineConfig;
use crate::env::{EnvironmentConfig, VarSource};
use crate::error::{BardError, ErrorKind};
use crate::executor::{CleanupOutcome, ExecutionResult, Executor, ProcessRunner};
use crate::invocation::{Invocation, RunName};
use crate::schema::ParameterSchema;
use crate::tier::find_tier;
use crate::Result;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Milestones of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Created,
    SchemaLoaded,
    ArgumentsParsed,
    EnvironmentResolved,
    CommandBuilt,
    Executed,
    CleanedUp,
    CleanupFailed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::CleanedUp | Stage::CleanupFailed)
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    At(Stage),
    Failed { stage: Stage, kind: ErrorKind },
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_name: RunName,
    pub command_line: String,
    pub schema_digest: String,
    pub execution: ExecutionResult,
    pub cleanup: CleanupOutcome,
}

/// Drives one run through every stage
pub struct PipelineCaller<R: ProcessRunner> {
    config: PipelineConfig,
    executor: Executor<R>,
    state: RunState,
    invocation: Option<Invocation>,
    execution: Option<ExecutionResult>,
    schema_digest: Option<String>,
}

impl<R: ProcessRunner> PipelineCaller<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        PipelineCaller {
            config,
            executor: Executor::new(runner),
            state: RunState::At(Stage::Created),
            invocation: None,
            execution: None,
            schema_digest: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    /// The invocation built by the last run, if it got that far
    pub fn invocation(&self) -> Option<&Invocation> {
        self.invocation.as_ref()
    }

    /// Engine result of the last run, if the engine succeeded
    pub fn execution(&self) -> Option<&ExecutionResult> {
        self.execution.as_ref()
    }

    /// Run every stage up to and including `CommandBuilt`.
    pub fn prepare(&mut self, tokens: &[String], vars: &impl VarSource) -> Result<Invocation> {
        self.state = RunState::At(Stage::Created);
        self.invocation = None;
        self.execution = None;
        self.schema_digest = None;

        let tier = find_tier(tokens).or_else(|e| self.fail(e))?;
        let schema_path = self.config.schema_path(tier);
        let schema = ParameterSchema::load(&schema_path, tier).or_else(|e| self.fail(e))?;
        self.schema_digest = Some(schema.digest.clone());
        self.advance(Stage::SchemaLoaded);

        let args = self.parse_arguments(&schema, tokens)?;
        self.advance(Stage::ArgumentsParsed);

        let env = EnvironmentConfig::resolve(vars, &args, &self.config.hosted_marker)
            .or_else(|e| self.fail(e))?;
        self.advance(Stage::EnvironmentResolved);

        let invocation = Invocation::build(&self.config, &args, &env).or_else(|e| self.fail(e))?;
        info!(
            run_name = %invocation.run_name,
            hosted_runner = env.hosted_runner,
            schema_digest = %schema.digest,
            "Built nextflow command"
        );
        self.invocation = Some(invocation.clone());
        self.advance(Stage::CommandBuilt);

        Ok(invocation)
    }

    /// Build, execute and clean up one run.
    pub fn run(&mut self, tokens: &[String], vars: &impl VarSource) -> Result<RunReport> {
        let invocation = self.prepare(tokens, vars)?;
        let command_line = invocation.command_line();
        println!("{command_line}");

        let execution = self.executor.execute(&invocation).or_else(|e| self.fail(e))?;
        self.execution = Some(execution.clone());
        self.advance(Stage::Executed);

        match self.executor.cleanup(&invocation) {
            Ok(cleanup) => {
                self.advance(Stage::CleanedUp);
                Ok(RunReport {
                    run_name: invocation.run_name.clone(),
                    command_line,
                    schema_digest: self.schema_digest.clone().unwrap_or_default(),
                    execution,
                    cleanup,
                })
            }
            Err(e) => {
                warn!(run_name = %invocation.run_name, "Run succeeded but cleanup failed");
                self.advance(Stage::CleanupFailed);
                Err(e)
            }
        }
    }

    fn parse_arguments(
        &mut self,
        schema: &ParameterSchema,
        tokens: &[String],
    ) -> Result<ParsedArguments> {
        let parsed = ArgumentBuilder::new(schema)
            .with_default_profile(&self.config.default_profile)
            .parse(tokens);
        match parsed {
            Ok(args) => Ok(args),
            // Help is not a failure; leave the state where it is
            Err(e @ BardError::HelpRequested(_)) => Err(e),
            Err(e) => self.fail(e),
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(stage = ?stage, "Pipeline stage reached");
        self.state = RunState::At(stage);
    }

    fn fail<T>(&mut self, err: BardError) -> Result<T> {
        let stage = match self.state {
            RunState::At(stage) => stage,
            RunState::Failed { stage, .. } => stage,
        };
        error!(stage = ?stage, kind = %err.kind(), "{}", err);
        self.state = RunState::Failed {
            stage,
            kind: err.kind(),
        };
        Err(err)
    }
}
