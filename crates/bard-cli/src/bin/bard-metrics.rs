//! Aggregate BARD QC metric files into `<output>.txt` and `<output>.json`.

use anyhow::{Context, Result};
use bard_core::telemetry::level_for;
use bard_metrics::{aggregate, AssayType, MetricInputs};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "bard-metrics")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate BARD QC metrics into text and JSON reports", long_about = None)]
struct Cli {
    /// BAM alignment summary metrics file
    #[arg(short, long)]
    align: PathBuf,

    /// BAM insert size metrics file
    #[arg(short, long)]
    insert: PathBuf,

    /// BAM duplication metrics file
    #[arg(short, long)]
    dedup: Option<PathBuf>,

    /// Assay performance metrics file from picard
    #[arg(short = 'p', long = "picard_metrics")]
    picard_metrics: PathBuf,

    /// Variant calling metrics file from TNscope or DNscope
    #[arg(short, long = "mnp_metrics")]
    mnp_metrics: PathBuf,

    /// Tumor mutational burden metrics file
    #[arg(short = 'b', long = "tmb_metrics")]
    tmb_metrics: Option<PathBuf>,

    /// Tumor-only diagnostics from PureCN
    #[arg(short = 'n', long = "purecn_metrics")]
    purecn_metrics: Option<PathBuf>,

    /// Assay type
    #[arg(short = 't', long = "assay_type", value_enum)]
    assay_type: AssayType,

    /// Base name for the .txt and .json outputs
    #[arg(short, long)]
    output: PathBuf,

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

    let inputs = MetricInputs {
        align: cli.align,
        insert: cli.insert,
        dedup: cli.dedup,
        picard: cli.picard_metrics,
        mnp: cli.mnp_metrics,
        tmb: cli.tmb_metrics,
        purecn: cli.purecn_metrics,
        assay_type: cli.assay_type,
    };

    let report = aggregate(&inputs).context("Failed to aggregate metrics")?;
    let (txt, json) = report
        .write(&cli.output)
        .with_context(|| format!("Failed to write report {}", cli.output.display()))?;

    info!("Metrics written to {} and {}", txt.display(), json.display());
    Ok(())
}
