//! Metric cell values

use serde::{Serialize, Serializer};

/// One metric value as read from a tool's output
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Empty, `NA` or `NaN`
    Missing,
}

impl MetricValue {
    /// Interpret a table cell: integer, then float, then text.
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() || matches!(cell, "NA" | "NaN" | "nan") {
            return MetricValue::Missing;
        }
        if let Ok(i) = cell.parse::<i64>() {
            return MetricValue::Int(i);
        }
        match cell.parse::<f64>() {
            Ok(f) if f.is_nan() => MetricValue::Missing,
            Ok(f) => MetricValue::Float(f),
            Err(_) => MetricValue::Text(cell.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, MetricValue::Missing)
    }

    /// Floats keep six decimals; those left integral become integers.
    pub fn normalise(self) -> Self {
        match self {
            MetricValue::Float(f) if !f.is_finite() => MetricValue::Missing,
            MetricValue::Float(f) => {
                let rounded = (f * 1e6).round() / 1e6;
                if rounded.fract() == 0.0 && rounded.abs() < i64::MAX as f64 {
                    MetricValue::Int(rounded as i64)
                } else {
                    MetricValue::Float(rounded)
                }
            }
            other => other,
        }
    }

    /// Rendering used by the text report
    pub fn to_txt(&self) -> String {
        match self {
            MetricValue::Int(i) => i.to_string(),
            MetricValue::Float(f) => format!("{f:.1}"),
            MetricValue::Text(s) => s.clone(),
            MetricValue::Missing => String::new(),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Int(i) => serializer.serialize_i64(*i),
            MetricValue::Float(f) => serializer.serialize_f64(*f),
            MetricValue::Text(s) => serializer.serialize_str(s),
            MetricValue::Missing => serializer.serialize_none(),
        }
    }
}
