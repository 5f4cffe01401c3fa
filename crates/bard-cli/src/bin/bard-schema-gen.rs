//! Regenerate `param_jsons/<tier>_params.json` from the pipeline's
//! `nextflow.config`.

use anyhow::{Context, Result};
use bard_core::telemetry::level_for;
use bard_core::{EnvSnapshot, PipelineConfig, SchemaGenerator, SystemRunner, Tier};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "bard-schema-gen")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate BARD parameter schemas with `nextflow config -flat`", long_about = None)]
struct Cli {
    /// Pipeline directory containing nextflow.config
    #[arg(short, long, env = "BARD_PIPELINE_DIR", default_value = "/opt/pipeline")]
    dir: PathBuf,

    /// Tiers to generate
    #[arg(short, long, value_enum, num_args = 1.., required = true)]
    tiers: Vec<Tier>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bard_core::init_tracing(cli.json, level_for(cli.verbose));

    let engine = PipelineConfig::from_vars(&EnvSnapshot::capture()).engine;
    let generator = SchemaGenerator::new(&cli.dir, engine, SystemRunner);
    let written = generator
        .generate(&cli.tiers)
        .with_context(|| format!("Failed to generate schemas in {}", cli.dir.display()))?;

    for path in written {
        info!("Created {}", path.display());
    }
    Ok(())
}
