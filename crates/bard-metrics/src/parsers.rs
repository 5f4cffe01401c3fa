//! One reader per tool output
//!
//! Each reader returns its metrics in report order.

use crate::assay::AssayType;
use crate::error::{MetricsError, Result};
use crate::report::MetricRecord;
use crate::table::{Delimiter, Row, Table};
use crate::value::MetricValue;
use std::path::Path;
use tracing::debug;

const ALIGNMENT: &str = "alignment";
const DUPLICATION: &str = "duplication";
const ASSAY_PERFORMANCE: &str = "assay_performance";
const VARIANT_CALLING: &str = "variant_calling";
const TMB: &str = "tumor_mutational_burden";
const TUMOR_ONLY: &str = "tumor-only_diagnostic";

const TMB_COLUMNS: [&str; 4] = [
    "Number of mutations",
    "total size of region filtered by depth",
    "total size of region",
    "TMB",
];

/// Copy `(metric, column)` pairs from `row`
fn copy_columns(
    category: &str,
    row: &Row<'_>,
    pairs: &[(&str, &str)],
    percent: bool,
) -> Result<Vec<MetricRecord>> {
    pairs
        .iter()
        .map(|(metric, column)| -> Result<MetricRecord> {
            let value = if percent {
                row.percent(column)?
            } else {
                row.value(column)?
            };
            Ok(MetricRecord::new(category, *metric, value))
        })
        .collect()
}

/// Picard alignment summary: the `PAIR` row
pub fn parse_align(path: &Path) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Tab)?;
    let pair = table.row_keyed("PAIR")?;
    copy_columns(
        ALIGNMENT,
        &pair,
        &[("pct_aligned", "PCT_READS_ALIGNED_IN_PAIRS")],
        true,
    )
}

/// Picard insert size metrics
pub fn parse_insert(path: &Path) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Tab)?;
    copy_columns(
        ALIGNMENT,
        &table.first_row()?,
        &[
            ("mean_insert_size", "MEAN_INSERT_SIZE"),
            ("median_insert_size", "MEDIAN_INSERT_SIZE"),
        ],
        false,
    )
}

/// Picard duplication metrics
pub fn parse_dedup(path: &Path) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Tab)?;
    let row = table.first_row()?;
    let mut records = copy_columns(
        DUPLICATION,
        &row,
        &[("pct_duplication", "PERCENT_DUPLICATION")],
        true,
    )?;
    records.extend(copy_columns(
        DUPLICATION,
        &row,
        &[("estimated_library_size", "ESTIMATED_LIBRARY_SIZE")],
        false,
    )?);
    Ok(records)
}

/// Picard WGS, hybrid-selection or amplicon coverage metrics.
///
/// The table's first column must match the layout of `assay`.
pub fn parse_picard(path: &Path, assay: AssayType) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Tab)?;
    let layout = assay.layout();
    if table.first_header() != Some(layout.first_column) {
        return Err(MetricsError::AssayMismatch {
            path: path.to_path_buf(),
            assay: assay.to_string(),
        });
    }
    debug!(assay = %assay, picard_table = layout.first_column, "Matched picard metrics");

    let row = table.first_row()?;
    let mut records = vec![MetricRecord::new(
        ASSAY_PERFORMANCE,
        "assay_type",
        MetricValue::Text(layout.label.to_string()),
    )];
    records.extend(copy_columns(ASSAY_PERFORMANCE, &row, layout.coverage, false)?);
    records.extend(copy_columns(ASSAY_PERFORMANCE, &row, layout.fractions, true)?);
    Ok(records)
}

/// DNAscope / TNscope variant call metrics
pub fn parse_mnp(path: &Path) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Tab)?;
    copy_columns(
        VARIANT_CALLING,
        &table.first_row()?,
        &[("total_snps", "TOTAL_SNPS"), ("total_indels", "TOTAL_INDELS")],
        false,
    )
}

/// Tumor mutational burden; a file without a `TMB` column reports a
/// missing TMB only.
pub fn parse_tmb(path: &Path) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Tab)?;
    if !table.has_column("TMB") {
        debug!(path = %path.display(), "No TMB column; reporting TMB as missing");
        return Ok(vec![MetricRecord::new(TMB, "TMB", MetricValue::Missing)]);
    }

    let row = table.first_row()?;
    TMB_COLUMNS
        .iter()
        .map(|column| -> Result<MetricRecord> {
            Ok(MetricRecord::new(
                TMB,
                column.replace(' ', "_"),
                row.value(column)?,
            ))
        })
        .collect()
}

/// PureCN tumor-only purity and ploidy
pub fn parse_purecn(path: &Path) -> Result<Vec<MetricRecord>> {
    let table = Table::read(path, Delimiter::Comma)?;
    let pairs: Vec<(&str, &str)> = ["Purity", "Ploidy", "Flagged", "Comment"]
        .iter()
        .map(|c| (*c, *c))
        .collect();
    copy_columns(TUMOR_ONLY, &table.first_row()?, &pairs, false)
}
