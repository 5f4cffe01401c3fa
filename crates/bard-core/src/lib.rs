//! BARD Core Library
//!
//! Turns a tier's parameter schema and a raw token list into a validated
//! Nextflow invocation, runs it and cleans up after it.

pub mod args;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod invocation;
pub mod pipeline;
pub mod schema;
pub mod schema_gen;
pub mod telemetry;
pub mod tier;

pub use args::{ArgumentBuilder, ParsedArguments, DEFAULT_PROFILE, PROFILE_FLAG};
pub use config::PipelineConfig;
pub use env::{EnvSnapshot, EnvironmentConfig, VarSource};
pub use error::{BardError, ErrorKind};
pub use executor::{
    CleanupOutcome, CommandSpec, ExecutionResult, Executor, ProcessRunner, SystemRunner,
};
pub use invocation::{render_command_line, Invocation, RunName};
pub use pipeline::{PipelineCaller, RunReport, RunState, Stage};
pub use schema::{ParamValue, ParameterDefinition, ParameterKind, ParameterSchema};
pub use schema_gen::SchemaGenerator;
pub use telemetry::init_tracing;
pub use tier::Tier;

pub type Result<T> = std::result::Result<T, BardError>;

/// BARD version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
