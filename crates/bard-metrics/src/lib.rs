//! BARD Metrics
//!
//! Collects picard, variant-calling, TMB and PureCN metric files into a
//! flat `(category, metric) -> value` report written as text and JSON.

pub mod aggregate;
pub mod assay;
pub mod error;
pub mod parsers;
pub mod report;
pub mod table;
pub mod value;

pub use aggregate::{aggregate, MetricInputs};
pub use assay::{AssayType, CoverageLayout};
pub use error::{MetricsError, Result};
pub use report::{MetricRecord, MetricReport};
pub use table::{Delimiter, Table};
pub use value::MetricValue;
