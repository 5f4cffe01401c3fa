//! Delimited metric tables
//!
//! Picard-style files carry `#` header lines and blank separators around a
//! delimited table. Those lines are dropped before the table is read; rows
//! may be shorter or longer than the header.

use crate::error::{MetricsError, Result};
use crate::value::MetricValue;
use std::path::{Path, PathBuf};

/// Field separator of a metric file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    fn byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

/// A parsed metric table
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path, delimiter: Delimiter) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| MetricsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, delimiter, path)
    }

    pub fn parse(text: &str, delimiter: Delimiter, path: &Path) -> Result<Self> {
        let body = text
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");

        let table_error = |source| MetricsError::Table {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.byte())
            .quoting(delimiter == Delimiter::Comma)
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(table_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(MetricsError::Empty(path.to_path_buf()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(table_error)?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Table {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the first column; picard uses it to tell its tools apart
    pub fn first_header(&self) -> Option<&str> {
        self.headers.first().map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn first_row(&self) -> Result<Row<'_>> {
        self.rows
            .first()
            .map(|cells| Row { table: self, cells })
            .ok_or_else(|| MetricsError::Empty(self.path.clone()))
    }

    /// The first row whose first cell equals `key`
    pub fn row_keyed(&self, key: &str) -> Result<Row<'_>> {
        self.rows
            .iter()
            .find(|cells| cells.first().map(|c| c.trim()) == Some(key))
            .map(|cells| Row { table: self, cells })
            .ok_or_else(|| MetricsError::MissingRow {
                path: self.path.clone(),
                key: key.to_string(),
            })
    }
}

/// One data row of a [`Table`]
#[derive(Debug, Clone, Copy)]
pub struct Row<'t> {
    table: &'t Table,
    cells: &'t [String],
}

impl Row<'_> {
    /// Value in `column`; a short row reads as missing.
    pub fn value(&self, column: &str) -> Result<MetricValue> {
        let index = self
            .table
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| MetricsError::MissingColumn {
                path: self.table.path.clone(),
                column: column.to_string(),
            })?;
        Ok(self
            .cells
            .get(index)
            .map(|c| MetricValue::parse(c))
            .unwrap_or(MetricValue::Missing))
    }

    /// A fraction in `column` expressed as a percentage
    pub fn percent(&self, column: &str) -> Result<MetricValue> {
        match self.value(column)? {
            MetricValue::Int(i) => Ok(MetricValue::Float(i as f64 * 100.0)),
            MetricValue::Float(f) => Ok(MetricValue::Float(f * 100.0)),
            MetricValue::Missing => Ok(MetricValue::Missing),
            MetricValue::Text(value) => Err(MetricsError::NonNumeric {
                path: self.table.path.clone(),
                column: column.to_string(),
                value,
            }),
        }
    }
}
