//! Deployment configuration for the pipeline launcher

use crate::env::VarSource;
use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the pipeline lives and how to launch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline checkout; the engine runs with this as working directory
    pub pipeline_dir: PathBuf,
    /// Prefix of every run name
    pub pipeline_name: String,
    /// Workflow script relative to `pipeline_dir`
    pub entry_point: String,
    /// Nextflow executable
    pub engine: String,
    /// Runner configuration passed with `-c`
    pub runner_config: PathBuf,
    /// Profile used when the caller gives none
    pub default_profile: String,
    /// Profile substring that marks the hosted NF runner
    pub hosted_marker: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            pipeline_dir: PathBuf::from("/opt/pipeline"),
            pipeline_name: "BARD".to_string(),
            entry_point: "main_bard.nf".to_string(),
            engine: "nextflow".to_string(),
            runner_config: PathBuf::from("/opt/nf-runner/nf-runner.config"),
            default_profile: crate::args::DEFAULT_PROFILE.to_string(),
            hosted_marker: "nf_runner".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, overridden by `BARD_PIPELINE_DIR`, `BARD_NEXTFLOW_BIN` and
    /// `BARD_NF_RUNNER_CONFIG` when set.
    pub fn from_vars(vars: &impl VarSource) -> Self {
        let mut config = Self::default();
        if let Some(dir) = vars.var("BARD_PIPELINE_DIR") {
            config.pipeline_dir = PathBuf::from(dir);
        }
        if let Some(bin) = vars.var("BARD_NEXTFLOW_BIN") {
            config.engine = bin;
        }
        if let Some(path) = vars.var("BARD_NF_RUNNER_CONFIG") {
            config.runner_config = PathBuf::from(path);
        }
        config
    }

    /// Config rooted at a different pipeline directory
    pub fn with_pipeline_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pipeline_dir = dir.into();
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.pipeline_dir.join("param_jsons")
    }

    /// `<pipeline_dir>/param_jsons/<tier>_params.json`
    pub fn schema_path(&self, tier: Tier) -> PathBuf {
        self.schema_dir().join(format!("{tier}_params.json"))
    }

    pub fn entry_point_path(&self) -> PathBuf {
        self.pipeline_dir.join(&self.entry_point)
    }
}
