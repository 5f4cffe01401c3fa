//! Tier-specific parameter schema
//!
//! The schema files live at `<pipeline_dir>/param_jsons/<tier>_params.json`
//! and are produced by `bard-schema-gen` from the pipeline's own
//! `nextflow config`. Each entry under `definitions` describes one
//! `--<name>` parameter of the pipeline.

use crate::error::BardError;
use crate::tier::Tier;
use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flag names owned by the launcher itself
pub const RESERVED_NAMES: [&str; 3] = ["tier", "profile", "help"];

/// The declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "stringOptions")]
    StringOptions,
    #[serde(rename = "stringPattern")]
    StringPattern,
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParameterKind::Integer => "integer",
            ParameterKind::Float => "float",
            ParameterKind::Boolean => "boolean",
            ParameterKind::StringOptions => "stringOptions",
            ParameterKind::StringPattern => "stringPattern",
        };
        f.write_str(name)
    }
}

/// A kind-typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Renders the value in the token form the parser accepts.
impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Boolean(b) => write!(f, "{b}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// One declared pipeline parameter
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: String,
    pub kind: ParameterKind,
    /// Never true for booleans
    pub required: bool,
    pub default: Option<ParamValue>,
    pub description: String,
    /// Allowed values for `stringOptions`; empty means unrestricted
    pub options: Vec<String>,
    /// Anchored pattern for `stringPattern`
    pub pattern: Option<Regex>,
}

/// Shape of a definition as written in the schema file
#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(rename = "type")]
    kind: ParameterKind,
    #[serde(default)]
    default_value: Option<Value>,
    /// `null` reads as no description
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    pattern: Option<String>,
}

/// The loaded, validated schema for one tier
#[derive(Debug, Clone)]
pub struct ParameterSchema {
    pub tier: Tier,
    /// File the schema was read from
    pub source: PathBuf,
    /// SHA256 of the file bytes
    pub digest: String,
    definitions: BTreeMap<String, ParameterDefinition>,
}

impl ParameterSchema {
    /// Load and validate the schema file for `tier`.
    pub fn load(path: &Path, tier: Tier) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BardError::schema(path, "schema file not found")
            } else {
                BardError::schema(path, format!("could not read schema file: {e}"))
            }
        })?;

        let schema = Self::from_slice(&bytes, tier, path)?;
        info!(
            tier = %tier,
            parameters = schema.len(),
            digest = %&schema.digest[..12],
            "Loaded parameter schema from {:?}",
            path
        );
        Ok(schema)
    }

    /// Parse and validate schema bytes; `source` is only used for messages.
    pub fn from_slice(bytes: &[u8], tier: Tier, source: &Path) -> Result<Self> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hex::encode(hasher.finalize());

        let doc: Value = serde_json::from_slice(bytes)
            .map_err(|e| BardError::schema(source, format!("invalid JSON: {e}")))?;
        let doc = doc
            .as_object()
            .ok_or_else(|| BardError::schema(source, "top level must be a JSON object"))?;

        let marker = doc.get("tier").ok_or_else(|| {
            BardError::schema(source, "no tier marker in the schema, refusing to use it")
        })?;
        if marker.as_str() != Some(tier.as_str()) {
            warn!(
                "Schema {:?} declares tier {} but tier {} was requested",
                source, marker, tier
            );
        }

        let raw = doc
            .get("definitions")
            .and_then(Value::as_object)
            .ok_or_else(|| BardError::schema(source, "missing `definitions` object"))?;

        let mut definitions = BTreeMap::new();
        for (name, value) in raw {
            let def = parse_definition(name, value.clone())
                .map_err(|reason| BardError::schema(source, reason))?;
            definitions.insert(name.clone(), def);
        }

        Ok(ParameterSchema {
            tier,
            source: source.to_path_buf(),
            digest,
            definitions,
        })
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Definitions in name order
    pub fn definitions(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.definitions.values()
    }
}

fn parse_definition(name: &str, value: Value) -> std::result::Result<ParameterDefinition, String> {
    if RESERVED_NAMES.contains(&name) {
        return Err(format!("parameter name `{name}` is reserved by the launcher"));
    }
    if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
        return Err(format!("`{name}` is not a usable parameter name"));
    }

    // The key's presence marks the parameter required, whatever its value.
    let mut required = value
        .as_object()
        .is_some_and(|fields| fields.contains_key("required"));
    let raw: RawDefinition =
        serde_json::from_value(value).map_err(|e| format!("definition `{name}`: {e}"))?;

    let default = match raw.default_value {
        Some(v) => Some(coerce_default(raw.kind, &v).map_err(|e| format!("definition `{name}`: {e}"))?),
        None => None,
    };

    if raw.kind == ParameterKind::Boolean {
        if default.is_none() {
            return Err(format!("boolean definition `{name}` has no default_value"));
        }
        if required {
            debug!("Boolean parameter {} declared required; treating as optional", name);
            required = false;
        }
    }

    let pattern = match (raw.kind, raw.pattern) {
        (ParameterKind::StringPattern, Some(p)) => Some(
            Regex::new(&format!("^(?:{p})$"))
                .map_err(|e| format!("definition `{name}` has an invalid pattern: {e}"))?,
        ),
        _ => None,
    };

    Ok(ParameterDefinition {
        name: name.to_string(),
        kind: raw.kind,
        required,
        default,
        description: raw.description.unwrap_or_default(),
        options: raw.options,
        pattern,
    })
}

fn coerce_default(kind: ParameterKind, value: &Value) -> std::result::Result<ParamValue, String> {
    let mismatch = || format!("default_value {value} is not a valid {kind}");
    match kind {
        ParameterKind::Integer => value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(ParamValue::Integer)
            .ok_or_else(mismatch),
        ParameterKind::Float => value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(ParamValue::Float)
            .ok_or_else(mismatch),
        ParameterKind::Boolean => value
            .as_bool()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(ParamValue::Boolean)
            .ok_or_else(mismatch),
        ParameterKind::StringOptions | ParameterKind::StringPattern => match value {
            Value::String(s) => Ok(ParamValue::Text(s.clone())),
            Value::Number(n) => Ok(ParamValue::Text(n.to_string())),
            Value::Bool(b) => Ok(ParamValue::Text(b.to_string())),
            _ => Err(mismatch()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "tier": "ruo",
        "definitions": {
            "assay_type": {
                "type": "stringOptions",
                "required": true,
                "options": ["wgs", "wes", "panel", "amplicon"],
                "description": "assay type"
            },
            "min_depth": {"type": "integer", "default_value": 20, "description": "minimum depth"},
            "min_af": {"type": "float", "default_value": 0.05, "description": "minimum allele fraction"},
            "skip_qc": {"type": "boolean", "default_value": false, "description": "skip QC"},
            "sample_id": {"type": "stringPattern", "pattern": "[A-Za-z0-9_-]+", "description": "sample"}
        }
    }"#;

    fn parse(text: &str) -> Result<ParameterSchema> {
        ParameterSchema::from_slice(text.as_bytes(), Tier::Ruo, Path::new("ruo_params.json"))
    }

    #[test]
    fn test_parameter_count_matches_definitions() {
        let schema = parse(SAMPLE).unwrap();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.definitions().count(), 5);
        assert_eq!(schema.digest.len(), 64);
    }

    #[test]
    fn test_definition_fields() {
        let schema = parse(SAMPLE).unwrap();

        let assay = schema.get("assay_type").unwrap();
        assert_eq!(assay.kind, ParameterKind::StringOptions);
        assert!(assay.required);
        assert_eq!(assay.options.len(), 4);

        let depth = schema.get("min_depth").unwrap();
        assert!(!depth.required);
        assert_eq!(depth.default, Some(ParamValue::Integer(20)));

        let skip = schema.get("skip_qc").unwrap();
        assert_eq!(skip.default, Some(ParamValue::Boolean(false)));

        let sample = schema.get("sample_id").unwrap();
        let pattern = sample.pattern.as_ref().unwrap();
        assert!(pattern.is_match("S_01"));
        assert!(!pattern.is_match("S 01"));
    }

    #[test]
    fn test_missing_tier_marker_rejected() {
        let err = parse(r#"{"definitions": {}}"#).unwrap_err();
        assert!(matches!(err, BardError::Schema { .. }));
        assert!(err.to_string().contains("no tier marker"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = parse("{ not json").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_missing_definitions_rejected() {
        assert!(parse(r#"{"tier": "ruo"}"#).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = parse(r#"{"tier": "ruo", "definitions": {"x": {"type": "list"}}}"#).unwrap_err();
        assert!(matches!(err, BardError::Schema { .. }));
    }

    #[test]
    fn test_boolean_requires_default() {
        let err = parse(r#"{"tier": "ruo", "definitions": {"x": {"type": "boolean"}}}"#).unwrap_err();
        assert!(err.to_string().contains("no default_value"));
    }

    #[test]
    fn test_boolean_never_required() {
        let schema = parse(
            r#"{"tier": "ruo", "definitions": {"x": {"type": "boolean", "required": true, "default_value": "true"}}}"#,
        )
        .unwrap();
        let x = schema.get("x").unwrap();
        assert!(!x.required);
        assert_eq!(x.default, Some(ParamValue::Boolean(true)));
    }

    #[test]
    fn test_required_key_presence_marks_required() {
        let schema = parse(
            r#"{"tier": "ruo", "definitions": {
                "a": {"type": "integer", "required": false},
                "b": {"type": "integer", "required": null},
                "c": {"type": "integer", "required": "yes"},
                "d": {"type": "integer"}
            }}"#,
        )
        .unwrap();
        assert!(schema.get("a").unwrap().required);
        assert!(schema.get("b").unwrap().required);
        assert!(schema.get("c").unwrap().required);
        assert!(!schema.get("d").unwrap().required);
    }

    #[test]
    fn test_null_description_reads_as_empty() {
        let schema = parse(
            r#"{"tier": "ruo", "definitions": {"a": {"type": "integer", "description": null}}}"#,
        )
        .unwrap();
        assert_eq!(schema.get("a").unwrap().description, "");
    }

    #[test]
    fn test_default_kind_mismatch_rejected() {
        let err = parse(
            r#"{"tier": "ruo", "definitions": {"n": {"type": "integer", "default_value": "many"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a valid integer"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = parse(
            r#"{"tier": "ruo", "definitions": {"s": {"type": "stringPattern", "pattern": "(["}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_reserved_name_rejected() {
        let err = parse(
            r#"{"tier": "ruo", "definitions": {"profile": {"type": "stringPattern"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ParameterSchema::load(&dir.path().join("ruo_params.json"), Tier::Ruo).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ruo_params.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let schema = ParameterSchema::load(&path, Tier::Ruo).unwrap();
        assert_eq!(schema.tier, Tier::Ruo);
        assert_eq!(schema.source, path);
    }

    #[test]
    fn test_tier_mismatch_is_not_fatal() {
        let schema = ParameterSchema::from_slice(
            SAMPLE.as_bytes(),
            Tier::Gcp,
            Path::new("gcp_params.json"),
        )
        .unwrap();
        assert_eq!(schema.tier, Tier::Gcp);
    }

    #[test]
    fn test_param_value_token_form() {
        assert_eq!(ParamValue::Integer(30).to_string(), "30");
        assert_eq!(ParamValue::Float(0.25).to_string(), "0.25");
        assert_eq!(ParamValue::Boolean(false).to_string(), "false");
        assert_eq!(ParamValue::Text("wgs".into()).to_string(), "wgs");
    }
}
