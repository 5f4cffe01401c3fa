//! Parameter schema generation from `nextflow config -flat`
//!
//! Each `params.<a>.<b>... = <value>` line becomes one leaf of a nested JSON
//! object, written to `<pipeline_dir>/param_jsons/<tier>_params.json`.

use crate::error::BardError;
use crate::executor::{CommandSpec, ProcessRunner};
use crate::tier::Tier;
use crate::Result;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Tier selector read by the pipeline's `nextflow.config`
pub const TIER_VAR: &str = "NXF_TIER";

const PARAMS_PREFIX: &str = "params.";

/// Parse flattened config output into the nested `params` tree.
///
/// Lines that do not start with `params.` are ignored.
pub fn parse_flat_config(output: &str) -> Result<Map<String, Value>> {
    let mut root = Map::new();
    for line in output.lines() {
        let Some(rest) = line.strip_prefix(PARAMS_PREFIX) else {
            continue;
        };
        let Some((key, raw)) = rest.split_once(" = ") else {
            return Err(BardError::Generate(format!(
                "malformed config line: {line:?}"
            )));
        };
        let segments: Vec<&str> = key.trim().split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(BardError::Generate(format!("empty key segment in {key:?}")));
        }
        insert_path(&mut root, &segments, parse_value(raw.trim()), key)?;
    }
    Ok(root)
}

fn insert_path(
    node: &mut Map<String, Value>,
    segments: &[&str],
    value: Value,
    full_key: &str,
) -> Result<()> {
    match segments {
        [] => Ok(()),
        [leaf] => {
            node.insert(leaf.to_string(), value);
            Ok(())
        }
        [head, tail @ ..] => {
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => insert_path(map, tail, value, full_key),
                _ => Err(BardError::Generate(format!(
                    "cannot set params.{full_key}: params.{head} already holds a value"
                ))),
            }
        }
    }
}

/// Interpret one config value literal.
pub fn parse_value(raw: &str) -> Value {
    if let Some(text) = unquote(raw) {
        return Value::String(text);
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Value::Array(split_list(inner).into_iter().map(parse_value).collect());
    }
    Value::String(raw.to_string())
}

fn unquote(raw: &str) -> Option<String> {
    let quote = raw.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = raw.strip_prefix(quote)?.strip_suffix(quote)?;
    Some(inner.replace(&format!("\\{quote}"), &quote.to_string()))
}

/// Split list items on top-level commas, ignoring commas in quotes or
/// nested brackets.
fn split_list(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() || !items.is_empty() {
        items.push(last);
    }
    items
}

/// Regenerates per-tier parameter schemas for a pipeline checkout
pub struct SchemaGenerator<R: ProcessRunner> {
    pipeline_dir: PathBuf,
    engine: String,
    runner: R,
}

impl<R: ProcessRunner> SchemaGenerator<R> {
    pub fn new(pipeline_dir: impl Into<PathBuf>, engine: impl Into<String>, runner: R) -> Self {
        SchemaGenerator {
            pipeline_dir: pipeline_dir.into(),
            engine: engine.into(),
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn output_dir(&self) -> PathBuf {
        self.pipeline_dir.join("param_jsons")
    }

    /// Write one schema per tier and return the written paths in order.
    pub fn generate(&self, tiers: &[Tier]) -> Result<Vec<PathBuf>> {
        if !self.pipeline_dir.is_dir() {
            return Err(BardError::Generate(format!(
                "--dir {} is not a valid directory",
                self.pipeline_dir.display()
            )));
        }
        if !self.pipeline_dir.join("nextflow.config").is_file() {
            return Err(BardError::Generate(format!(
                "could not find nextflow.config file in --dir {}",
                self.pipeline_dir.display()
            )));
        }

        let out_dir = self.output_dir();
        std::fs::create_dir_all(&out_dir)?;

        let mut written = Vec::with_capacity(tiers.len());
        for tier in tiers {
            info!(tier = %tier, "Generating parameter schema");
            let output = self.flat_config(*tier)?;
            let params = parse_flat_config(&output)?;
            debug!(tier = %tier, top_level_keys = params.len(), "Parsed flat config");

            let path = out_dir.join(format!("{tier}_params.json"));
            let json = serde_json::to_string_pretty(&Value::Object(params))?;
            std::fs::write(&path, json)?;
            info!(path = %path.display(), "Wrote parameter schema");
            written.push(path);
        }

        set_mode_755(&out_dir)?;
        for path in &written {
            set_mode_755(path)?;
        }
        Ok(written)
    }

    fn flat_config(&self, tier: Tier) -> Result<String> {
        let spec = CommandSpec {
            program: self.engine.clone(),
            args: vec!["config".to_string(), "-flat".to_string()],
            cwd: self.pipeline_dir.clone(),
            env: BTreeMap::from([(TIER_VAR.to_string(), tier.to_string())]),
        };
        let result = self
            .runner
            .run(&spec)
            .map_err(|e| BardError::Generate(format!("could not start {}: {}", spec.program, e)))?;
        if !result.success() {
            return Err(BardError::Generate(format!(
                "`{}` failed for tier {} (exit {:?}): {}",
                spec.command_line(),
                tier,
                result.exit_code,
                result.stderr.trim()
            )));
        }
        Ok(result.stdout)
    }
}

#[cfg(unix)]
fn set_mode_755(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode_755(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{Scripted, ScriptedRunner};
    use serde_json::json;

    const FLAT: &str = "\
manifest.name = 'bard'
params.tier = 'ruo'
params.definitions.assay_type.type = 'stringOptions'
params.definitions.assay_type.required = true
params.definitions.assay_type.options = ['wgs', 'wes', 'panel']
params.definitions.min_depth.type = 'integer'
params.definitions.min_depth.default_value = 20
params.definitions.vaf.default_value = 0.05
params.definitions.note.default_value = null
process.executor = 'local'
";

    #[test]
    fn test_parse_flat_config_builds_tree() {
        let tree = parse_flat_config(FLAT).unwrap();
        assert_eq!(
            Value::Object(tree),
            json!({
                "tier": "ruo",
                "definitions": {
                    "assay_type": {
                        "type": "stringOptions",
                        "required": true,
                        "options": ["wgs", "wes", "panel"]
                    },
                    "min_depth": {"type": "integer", "default_value": 20},
                    "vaf": {"default_value": 0.05},
                    "note": {"default_value": null}
                }
            })
        );
    }

    #[test]
    fn test_parse_value_literals() {
        assert_eq!(parse_value("\"double\""), json!("double"));
        assert_eq!(parse_value("'it\\'s'"), json!("it's"));
        assert_eq!(parse_value("false"), json!(false));
        assert_eq!(parse_value("-3"), json!(-3));
        assert_eq!(parse_value("[]"), json!([]));
        assert_eq!(parse_value("['a,b', [1, 2]]"), json!(["a,b", [1, 2]]));
        assert_eq!(parse_value("2.GB"), json!("2.GB"));
        assert_eq!(parse_value("'"), json!("'"));
    }

    #[test]
    fn test_insert_beneath_leaf_fails() {
        let err = parse_flat_config("params.a = 1\nparams.a.b = 2\n").unwrap_err();
        assert!(matches!(err, BardError::Generate(_)));
        assert!(err.to_string().contains("params.a.b"));
    }

    #[test]
    fn test_malformed_line_fails() {
        assert!(parse_flat_config("params.a=1\n").is_err());
    }

    #[test]
    fn test_generate_writes_each_tier() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nextflow.config"), "").unwrap();
        let runner = ScriptedRunner::new([
            Scripted::output(0, "params.tier = 'ruo'\n", ""),
            Scripted::output(0, "params.tier = 'gcp'\n", ""),
        ]);

        let gen = SchemaGenerator::new(dir.path(), "nextflow", &runner);
        let written = gen.generate(&[Tier::Ruo, Tier::Gcp]).unwrap();

        assert_eq!(written.len(), 2);
        let ruo = std::fs::read_to_string(dir.path().join("param_jsons/ruo_params.json")).unwrap();
        assert_eq!(ruo, "{\n  \"tier\": \"ruo\"\n}");

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["config", "-flat"]);
        assert_eq!(calls[0].env[TIER_VAR], "ruo");
        assert_eq!(calls[1].env[TIER_VAR], "gcp");
        assert_eq!(calls[0].cwd, dir.path());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&written[0]).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_generate_requires_nextflow_config() {
        let dir = tempfile::tempdir().unwrap();
        let gen = SchemaGenerator::new(dir.path(), "nextflow", ScriptedRunner::default());
        let err = gen.generate(&[Tier::Ruo]).unwrap_err();
        assert!(err.to_string().contains("nextflow.config"));
        assert!(gen.runner().calls().is_empty());
    }

    #[test]
    fn test_generate_surfaces_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nextflow.config"), "").unwrap();
        let runner = ScriptedRunner::new([Scripted::output(1, "", "Unknown config attribute")]);
        let gen = SchemaGenerator::new(dir.path(), "nextflow", runner);
        let err = gen.generate(&[Tier::Gcp]).unwrap_err();
        assert!(err.to_string().contains("Unknown config attribute"));
    }
}
