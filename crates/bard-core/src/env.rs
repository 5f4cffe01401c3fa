//! Environment resolution
//!
//! Everything the launcher needs from the process environment is read once
//! into an [`EnvSnapshot`] and resolved into an immutable
//! [`EnvironmentConfig`]. Nothing here writes to the process environment.

use crate::args::ParsedArguments;
use crate::error::BardError;
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Explicit Nextflow work directory
pub const WORK_DIR_VAR: &str = "EA_NEXTFLOW_WORK_DIR";
/// Base of the data source; work and reference dirs derive from it
pub const DATA_SRC_VAR: &str = "EA_DC_DATA_SRC";
/// Explicit references directory; also exported to the child process
pub const REFERENCES_VAR: &str = "EA_DC_REFERENCES";
/// Log file location under the hosted runner
pub const LOG_FILE_VAR: &str = "EA_NEXTFLOW_LOG_FILE";
/// Optional syslog destination
pub const SYSLOG_VAR: &str = "EA_NEXTFLOW_SYSLOG";

const WORK_SUFFIX: &str = "scratch/nextflow/work/";
const REFERENCES_SUFFIX: &str = "references/combined";

/// Read-only source of environment variables
pub trait VarSource {
    /// Value of `key`; empty values count as unset.
    fn var(&self, key: &str) -> Option<String>;
}

impl VarSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

impl VarSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Environment captured once at startup
///
/// Process variables take precedence over those from a `.env` file.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the process environment layered over `./.env` (or the first
    /// `.env` found in a parent directory).
    pub fn capture() -> Self {
        let mut vars = BTreeMap::new();

        match dotenvy::dotenv_iter() {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((key, value)) => {
                            vars.insert(key, value);
                        }
                        Err(e) => warn!("Skipping malformed .env entry: {}", e),
                    }
                }
            }
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Could not read .env file: {}", e),
        }

        vars.extend(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }));

        EnvSnapshot { vars }
    }

    /// Build a snapshot from explicit pairs (tests, embedding).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSnapshot {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Whether a switch variable is set to a truthy value
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.var(key).as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "true" | "yes" | "on")
        )
    }
}

impl VarSource for EnvSnapshot {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.var(key)
    }
}

/// Operational settings derived from the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentConfig {
    /// Nextflow work (scratch) directory, exported as `NXF_WORK`
    pub work_dir: PathBuf,
    /// Reference data directory, exported as `EA_DC_REFERENCES`
    pub references_dir: PathBuf,
    /// Nextflow log file
    pub log_file: PathBuf,
    /// Syslog destination; empty means disabled
    pub syslog: String,
    /// Running under the hosted NF runner
    pub hosted_runner: bool,
}

impl EnvironmentConfig {
    /// Resolve settings for a run.
    ///
    /// `hosted_marker` is the profile substring identifying the hosted runner.
    pub fn resolve(vars: &impl VarSource, args: &ParsedArguments, hosted_marker: &str) -> Result<Self> {
        let hosted_runner = args.profile.contains(hosted_marker);
        Self::resolve_parts(vars, hosted_runner, args.get_str("out_dir"))
    }

    /// Resolve settings from the run mode and the `--out_dir` value.
    pub fn resolve_parts(
        vars: &impl VarSource,
        hosted_runner: bool,
        out_dir: Option<&str>,
    ) -> Result<Self> {
        let work_dir = resolve_work_dir(vars)?;
        let references_dir = resolve_references_dir(vars)?;
        let log_file = resolve_log_file(vars, hosted_runner, out_dir)?;
        let syslog = vars.var(SYSLOG_VAR).unwrap_or_default();

        debug!(
            work_dir = ?work_dir,
            references_dir = ?references_dir,
            log_file = ?log_file,
            hosted_runner,
            "Resolved environment"
        );

        Ok(EnvironmentConfig {
            work_dir,
            references_dir,
            log_file,
            syslog,
            hosted_runner,
        })
    }

    /// Variables added on top of the inherited environment of the engine
    pub fn child_overlay(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("NXF_WORK".to_string(), self.work_dir.to_string_lossy().into_owned()),
            (
                REFERENCES_VAR.to_string(),
                self.references_dir.to_string_lossy().into_owned(),
            ),
        ])
    }
}

fn resolve_work_dir(vars: &impl VarSource) -> Result<PathBuf> {
    if let Some(dir) = vars.var(WORK_DIR_VAR) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(base) = vars.var(DATA_SRC_VAR) {
        return Ok(under(&base, WORK_SUFFIX));
    }
    Err(BardError::Environment(format!(
        "The {WORK_DIR_VAR} or {DATA_SRC_VAR} environment variable is needed to set the work directory scratch space"
    )))
}

fn resolve_references_dir(vars: &impl VarSource) -> Result<PathBuf> {
    if let Some(dir) = vars.var(REFERENCES_VAR) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(base) = vars.var(DATA_SRC_VAR) {
        return Ok(under(&base, REFERENCES_SUFFIX));
    }
    Err(BardError::Environment(format!(
        "The {REFERENCES_VAR} or {DATA_SRC_VAR} environment variable is needed to set the references directory"
    )))
}

fn resolve_log_file(
    vars: &impl VarSource,
    hosted_runner: bool,
    out_dir: Option<&str>,
) -> Result<PathBuf> {
    if hosted_runner {
        return vars.var(LOG_FILE_VAR).map(PathBuf::from).ok_or_else(|| {
            BardError::Environment(format!(
                "When using the NF Runner profile the env variable {LOG_FILE_VAR} must be set"
            ))
        });
    }

    match out_dir.filter(|d| !d.is_empty()) {
        Some(dir) => Ok(Path::new(dir).join("nextflow.log")),
        None => Err(BardError::Environment(
            "The parameter --out_dir must be set to set the log file location".to_string(),
        )),
    }
}

/// `<base>/<suffix>` as text, so a trailing slash in `suffix` survives.
fn under(base: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}/{}", base.trim_end_matches('/'), suffix))
}
