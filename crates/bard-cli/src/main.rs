//! BARD - Nextflow pipeline launcher
//!
//! `bard --tier <ruo|gcp> [--<param> <value>]... [-profile <p>] [nextflow flags]...`
//!
//! Every token is forwarded to Nextflow, so launcher logging is configured
//! from the environment instead of flags:
//!
//! - `BARD_VERBOSE`: debug-level logs
//! - `BARD_LOG_JSON`: JSON log lines
//! - `RUST_LOG`: full filter override

use anyhow::{Context, Result};
use bard_core::telemetry::level_for;
use bard_core::{BardError, EnvSnapshot, PipelineCaller, PipelineConfig, SystemRunner};
use tracing::{info, warn};

fn main() -> Result<()> {
    let snapshot = EnvSnapshot::capture();
    bard_core::init_tracing(
        snapshot.flag("BARD_LOG_JSON"),
        level_for(snapshot.flag("BARD_VERBOSE")),
    );

    let tokens = std::env::args_os()
        .skip(1)
        .map(|arg| {
            arg.into_string()
                .map_err(|bad| anyhow::anyhow!("argument {bad:?} is not valid UTF-8"))
        })
        .collect::<Result<Vec<String>>>()?;

    let config = PipelineConfig::from_vars(&snapshot);
    let mut caller = PipelineCaller::new(config, SystemRunner);

    match caller.run(&tokens, &snapshot) {
        Ok(report) => {
            info!(
                run_name = %report.run_name,
                duration_ms = report.execution.duration_ms,
                "BARD run finished"
            );
            Ok(())
        }
        Err(BardError::HelpRequested(help)) => {
            print!("{help}");
            Ok(())
        }
        Err(err) if err.run_succeeded() => {
            warn!("Pipeline results are complete; only cleanup failed");
            Err(err).context("BARD cleanup failed")
        }
        Err(err) => Err(err).context("BARD run failed"),
    }
}
