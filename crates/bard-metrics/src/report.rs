//! The flat metric report and its text and JSON renderings

use crate::error::Result;
use crate::value::MetricValue;
use serde::Serialize;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

/// One `(category, metric) -> value` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub category: String,
    pub metric: String,
    pub value: MetricValue,
}

impl MetricRecord {
    pub fn new(
        category: impl Into<String>,
        metric: impl Into<String>,
        value: MetricValue,
    ) -> Self {
        MetricRecord {
            category: category.into(),
            metric: metric.into(),
            value,
        }
    }

    /// `<category>--<metric>`, the key used by the text report
    pub fn key(&self) -> String {
        format!("{}--{}", self.category, self.metric)
    }
}

/// Metrics in input order, values normalised
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricReport {
    records: Vec<MetricRecord>,
}

impl MetricReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push(MetricRecord {
            value: record.value.normalise(),
            ..record
        });
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, category: &str, metric: &str) -> Option<&MetricValue> {
        self.records
            .iter()
            .rev()
            .find(|r| r.category == category && r.metric == metric)
            .map(|r| &r.value)
    }

    /// Tab-separated `Metric\tValue` table, one line per metric
    pub fn to_txt(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(["Metric", "Value"])?;
        for record in &self.records {
            writer.write_record([record.key(), record.value.to_txt()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// `{category: {metric: value}}` in input order, 4-space indented
    pub fn to_json(&self) -> Result<String> {
        let mut root = Map::new();
        for record in &self.records {
            let category = root
                .entry(record.category.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(metrics) = category {
                metrics.insert(record.metric.clone(), serde_json::to_value(&record.value)?);
            }
        }

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        Value::Object(root).serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Write `<base>.txt` and `<base>.json`, returning both paths.
    pub fn write(&self, base: &Path) -> Result<(PathBuf, PathBuf)> {
        let txt = with_suffix(base, ".txt");
        let json = with_suffix(base, ".json");
        std::fs::write(&txt, self.to_txt()?)?;
        std::fs::write(&json, self.to_json()?)?;
        info!(
            metrics = self.len(),
            txt = %txt.display(),
            json = %json.display(),
            "Wrote metrics report"
        );
        Ok((txt, json))
    }
}

/// Append a suffix without touching dots already in the file name
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
