//! Assay types and their picard coverage layouts

use clap::ValueEnum;
use serde::Serialize;

/// Sequencing assay the metrics come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssayType {
    #[value(alias = "WGS")]
    Wgs,
    #[value(alias = "WES")]
    Wes,
    Panel,
    Amplicon,
}

impl AssayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssayType::Wgs => "wgs",
            AssayType::Wes => "wes",
            AssayType::Panel => "panel",
            AssayType::Amplicon => "amplicon",
        }
    }

    /// Coverage layout expected from picard for this assay
    pub fn layout(&self) -> &'static CoverageLayout {
        match self {
            AssayType::Wgs => &WGS,
            AssayType::Wes => &WES,
            AssayType::Panel => &PANEL,
            AssayType::Amplicon => &AMPLICON,
        }
    }
}

impl std::fmt::Display for AssayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which picard columns become which `assay_performance` metrics
#[derive(Debug)]
pub struct CoverageLayout {
    /// First column of the picard table; identifies the picard tool
    pub first_column: &'static str,
    /// Reported as `assay_performance/assay_type`
    pub label: &'static str,
    /// `(metric, column)` pairs copied as-is
    pub coverage: &'static [(&'static str, &'static str)],
    /// `(metric, column)` pairs holding fractions, reported as percentages
    pub fractions: &'static [(&'static str, &'static str)],
}

static WGS: CoverageLayout = CoverageLayout {
    first_column: "GENOME_TERRITORY",
    label: "WGS",
    coverage: &[
        ("mean_coverage", "MEAN_COVERAGE"),
        ("median_coverage", "MEDIAN_COVERAGE"),
    ],
    fractions: &[
        ("pct_1x", "PCT_1X"),
        ("pct_10x", "PCT_10X"),
        ("pct_20x", "PCT_20X"),
        ("pct_30x", "PCT_30X"),
    ],
};

const TARGET_COVERAGE: &[(&str, &str)] = &[
    ("mean_target_coverage", "MEAN_TARGET_COVERAGE"),
    ("median_target_coverage", "MEDIAN_TARGET_COVERAGE"),
];

static WES: CoverageLayout = CoverageLayout {
    first_column: "BAIT_SET",
    label: "hybrid selection",
    coverage: TARGET_COVERAGE,
    fractions: &[
        ("pct_target_1x", "PCT_TARGET_BASES_1X"),
        ("pct_target_20x", "PCT_TARGET_BASES_20X"),
        ("pct_target_50x", "PCT_TARGET_BASES_50X"),
        ("pct_target_100x", "PCT_TARGET_BASES_100X"),
    ],
};

static PANEL: CoverageLayout = CoverageLayout {
    first_column: "BAIT_SET",
    label: "hybrid selection",
    coverage: TARGET_COVERAGE,
    fractions: &[
        ("pct_target_1x", "PCT_TARGET_BASES_1X"),
        ("pct_target_100x", "PCT_TARGET_BASES_100X"),
        ("pct_target_250x", "PCT_TARGET_BASES_250X"),
        ("pct_target_500x", "PCT_TARGET_BASES_500X"),
        ("pct_target_1000x", "PCT_TARGET_BASES_1000X"),
    ],
};

static AMPLICON: CoverageLayout = CoverageLayout {
    first_column: "CUSTOM_AMPLICON_SET",
    label: "targeted PCR",
    coverage: TARGET_COVERAGE,
    fractions: &[
        ("pct_target_1x", "PCT_TARGET_BASES_1X"),
        ("pct_target_100x", "PCT_TARGET_BASES_100X"),
        ("pct_target_500x", "PCT_TARGET_BASES_500X"),
        ("pct_target_1000x", "PCT_TARGET_BASES_1000X"),
        ("pct_target_5000x", "PCT_TARGET_BASES_5000X"),
    ],
};
