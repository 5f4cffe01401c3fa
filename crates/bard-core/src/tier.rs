//! Regulatory tiers and the `--tier` pre-scan

use crate::error::BardError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Regulatory/operational tier selecting the parameter schema file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Research use only
    Ruo,
    /// Good clinical practice
    Gcp,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Ruo, Tier::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Ruo => "ruo",
            Tier::Gcp => "gcp",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = BardError;

    fn from_str(s: &str) -> Result<Self> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| {
                BardError::ArgumentType(format!(
                    "argument --tier: invalid choice: '{s}' (choose from 'ruo', 'gcp')"
                ))
            })
    }
}

/// Locate `--tier` in the raw tokens before the schema is known.
///
/// Accepts `--tier <value>` and `--tier=<value>`; the last occurrence wins.
/// Everything else is ignored, since most tokens belong to the schema parser
/// or to the engine.
pub fn find_tier(tokens: &[String]) -> Result<Tier> {
    let mut found: Option<&str> = None;
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if token == "--tier" {
            let value = iter.next().ok_or_else(|| {
                BardError::ArgumentType("argument --tier: expected one argument".to_string())
            })?;
            found = Some(value.as_str());
        } else if let Some(value) = token.strip_prefix("--tier=") {
            found = Some(value);
        }
    }

    match found {
        Some(value) => value.parse(),
        None => Err(BardError::ArgumentType(
            "the following arguments are required: --tier".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_tier_separate_value() {
        let tier = find_tier(&tokens(&["--assay_type", "wgs", "--tier", "gcp"])).unwrap();
        assert_eq!(tier, Tier::Gcp);
    }

    #[test]
    fn test_find_tier_equals_form() {
        assert_eq!(find_tier(&tokens(&["--tier=ruo"])).unwrap(), Tier::Ruo);
    }

    #[test]
    fn test_find_tier_missing() {
        let err = find_tier(&tokens(&["--assay_type", "wgs"])).unwrap_err();
        assert!(matches!(err, BardError::ArgumentType(_)));
    }

    #[test]
    fn test_find_tier_invalid_choice() {
        let err = find_tier(&tokens(&["--tier", "clia"])).unwrap_err();
        assert!(err.to_string().contains("invalid choice"));
    }

    #[test]
    fn test_find_tier_dangling_flag() {
        assert!(find_tier(&tokens(&["--tier"])).is_err());
    }
}
