//! Error types for bard-core

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`BardError`], used by the run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    ArgumentType,
    Environment,
    Run,
    Cleanup,
    Generate,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Schema => "SchemaError",
            ErrorKind::ArgumentType => "ArgumentTypeError",
            ErrorKind::Environment => "EnvironmentError",
            ErrorKind::Run => "RunError",
            ErrorKind::Cleanup => "CleanupError",
            ErrorKind::Generate => "GenerateError",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while launching the pipeline
#[derive(Error, Debug)]
pub enum BardError {
    /// Schema file missing, unreadable or malformed
    #[error("schema error ({}): {}", .path.display(), .reason)]
    Schema { path: PathBuf, reason: String },

    /// A token failed coercion, a required argument is missing, or the
    /// profile has forbidden characters
    #[error("argument error: {0}")]
    ArgumentType(String),

    /// `--help` was requested; carries the rendered help text
    #[error("{0}")]
    HelpRequested(String),

    /// A required environment variable and its fallback are both unset
    #[error("environment error: {0}")]
    Environment(String),

    /// The engine run exited non-zero or could not be started
    #[error(
        "BARD nextflow run {} did not exit with exit code 0{}: {}",
        .run_name,
        exit_suffix(.exit_code),
        .detail
    )]
    Run {
        run_name: String,
        exit_code: Option<i32>,
        detail: String,
    },

    /// The run succeeded but `nextflow clean` did not
    #[error(
        "BARD run {} succeeded but cleanup failed{}: {}. Consider manually cleaning {} if it is not a scratch space, and escalate this to the pipeline development team if issues with `nextflow clean` persist",
        .run_name,
        exit_suffix(.exit_code),
        .detail,
        .work_dir.display()
    )]
    Cleanup {
        run_name: String,
        exit_code: Option<i32>,
        work_dir: PathBuf,
        detail: String,
    },

    /// Schema generation from `nextflow config -flat` failed
    #[error("schema generation error: {0}")]
    Generate(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {code})"),
        None => String::new(),
    }
}

impl BardError {
    pub(crate) fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BardError::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error for the run state machine.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BardError::Schema { .. } => ErrorKind::Schema,
            BardError::ArgumentType(_) | BardError::HelpRequested(_) => ErrorKind::ArgumentType,
            BardError::Environment(_) => ErrorKind::Environment,
            BardError::Run { .. } => ErrorKind::Run,
            BardError::Cleanup { .. } => ErrorKind::Cleanup,
            BardError::Generate(_) | BardError::Io(_) | BardError::Json(_) => ErrorKind::Generate,
        }
    }

    /// True when the engine run itself completed successfully.
    ///
    /// Only a cleanup failure leaves the scientific result intact.
    pub fn run_succeeded(&self) -> bool {
        matches!(self, BardError::Cleanup { .. })
    }
}
