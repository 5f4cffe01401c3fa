//! Combines every tool's metrics into one report

use crate::assay::AssayType;
use crate::error::{MetricsError, Result};
use crate::parsers;
use crate::report::MetricReport;
use std::path::PathBuf;
use tracing::info;

/// Metric files for one sample
#[derive(Debug, Clone)]
pub struct MetricInputs {
    pub align: PathBuf,
    pub insert: PathBuf,
    pub dedup: Option<PathBuf>,
    pub picard: PathBuf,
    pub mnp: PathBuf,
    pub tmb: Option<PathBuf>,
    pub purecn: Option<PathBuf>,
    pub assay_type: AssayType,
}

/// Read every present input, in report order.
pub fn aggregate(inputs: &MetricInputs) -> Result<MetricReport> {
    let mut batches = vec![
        parsers::parse_align(&inputs.align)?,
        parsers::parse_insert(&inputs.insert)?,
    ];
    if let Some(path) = &inputs.dedup {
        batches.push(parsers::parse_dedup(path)?);
    }
    batches.push(parsers::parse_picard(&inputs.picard, inputs.assay_type)?);
    batches.push(parsers::parse_mnp(&inputs.mnp)?);
    if let Some(path) = &inputs.tmb {
        batches.push(parsers::parse_tmb(path)?);
    }
    if let Some(path) = &inputs.purecn {
        batches.push(parsers::parse_purecn(path)?);
    }

    let mut report = MetricReport::new();
    for record in batches.into_iter().flatten() {
        report.push(record);
    }

    if report.is_empty() {
        return Err(MetricsError::NoMetrics);
    }
    info!(metrics = report.len(), assay = %inputs.assay_type, "Aggregated metrics");
    Ok(report)
}
