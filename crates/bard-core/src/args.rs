//! Dynamic argument parsing driven by the parameter schema
//!
//! The parser is a `clap::Command` assembled at runtime: one `--<name>` flag
//! per schema definition plus the launcher's own `--tier` and `-profile`.
//! Tokens the schema does not declare are not errors. They are kept as
//! pass-through tokens, because the full token list is forwarded to
//! Nextflow unchanged.

use crate::error::BardError;
use crate::schema::{ParamValue, ParameterDefinition, ParameterKind, ParameterSchema};
use crate::tier::Tier;
use crate::Result;
use clap::builder::{BoolishValueParser, PossibleValuesParser};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Nextflow's single-dash profile option
pub const PROFILE_FLAG: &str = "-profile";

/// Profile used when `-profile` is not given
pub const DEFAULT_PROFILE: &str = "standard,cc";

/// Validate a profile list: letters, digits, underscore and comma only.
pub fn check_profile(value: &str) -> std::result::Result<String, String> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ',')
    {
        Ok(value.to_string())
    } else {
        Err("the -profile argument can be a word character or comma".to_string())
    }
}

/// Arguments after validation against the schema
#[derive(Debug, Clone)]
pub struct ParsedArguments {
    pub tier: Tier,
    /// Validated profile list, explicit or default
    pub profile: String,
    values: BTreeMap<String, ParamValue>,
    raw: Vec<String>,
    passthrough: Vec<String>,
}

impl ParsedArguments {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(ParamValue::as_str)
    }

    /// Typed values by parameter name, defaults included
    pub fn values(&self) -> &BTreeMap<String, ParamValue> {
        &self.values
    }

    /// Every token exactly as received
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Tokens the schema does not declare
    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    /// Whether the caller already chose a profile on the command line
    pub fn has_explicit_profile(&self) -> bool {
        self.raw
            .iter()
            .any(|t| t == PROFILE_FLAG || t.starts_with("-profile="))
    }
}

/// How a recognised flag consumes the token after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    None,
    Required,
    /// Booleans: take the next token unless it looks like a flag
    Optional,
}

/// Builds the runtime parser for one schema
pub struct ArgumentBuilder<'a> {
    schema: &'a ParameterSchema,
    default_profile: String,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(schema: &'a ParameterSchema) -> Self {
        ArgumentBuilder {
            schema,
            default_profile: DEFAULT_PROFILE.to_string(),
        }
    }

    pub fn with_default_profile(mut self, profile: &str) -> Self {
        self.default_profile = profile.to_string();
        self
    }

    /// The clap command for this schema. Help text comes from the schema
    /// descriptions.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new("bard")
            .no_binary_name(true)
            .args_override_self(true)
            .about("Launch the BARD Nextflow pipeline")
            .after_help("Flags not listed here are forwarded to Nextflow unchanged.")
            .arg(
                Arg::new("tier")
                    .long("tier")
                    .required(true)
                    .action(ArgAction::Set)
                    .value_parser(clap::value_parser!(Tier))
                    .help("regulatory tier"),
            )
            .arg(
                Arg::new("profile")
                    .long("profile")
                    .value_name("PROFILE")
                    .action(ArgAction::Set)
                    .value_parser(check_profile)
                    .help(format!(
                        "Nextflow profile, passed as -profile (default: {})",
                        self.default_profile
                    )),
            );

        for def in self.schema.definitions() {
            cmd = cmd.arg(arg_for(def));
        }
        cmd
    }

    /// Validate `tokens` against the schema.
    pub fn parse(&self, tokens: &[String]) -> Result<ParsedArguments> {
        let (known, passthrough) = self.split(tokens);
        debug!("Declared tokens: {:?}", known);
        if !passthrough.is_empty() {
            info!(
                count = passthrough.len(),
                "Forwarding undeclared tokens to nextflow: {:?}", passthrough
            );
        }

        let matches = self
            .command()
            .try_get_matches_from(&known)
            .map_err(map_clap_error)?;

        let tier = matches
            .get_one::<Tier>("tier")
            .copied()
            .ok_or_else(|| BardError::ArgumentType("argument --tier is required".to_string()))?;
        let profile = matches
            .get_one::<String>("profile")
            .cloned()
            .unwrap_or_else(|| self.default_profile.clone());

        let mut values = BTreeMap::new();
        for def in self.schema.definitions() {
            if let Some(value) = value_of(&matches, def).or_else(|| def.default.clone()) {
                values.insert(def.name.clone(), value);
            }
        }

        Ok(ParsedArguments {
            tier,
            profile,
            values,
            raw: tokens.to_vec(),
            passthrough,
        })
    }

    /// Separate declared flags (normalised to `--name[=value]` for clap) from
    /// everything else.
    fn split(&self, tokens: &[String]) -> (Vec<String>, Vec<String>) {
        let mut known = Vec::new();
        let mut passthrough = Vec::new();
        let mut iter = tokens.iter().peekable();

        while let Some(token) = iter.next() {
            let Some((name, inline, arity)) = self.classify(token) else {
                passthrough.push(token.clone());
                continue;
            };

            if let Some(value) = inline {
                known.push(format!("--{name}={value}"));
                continue;
            }

            let value = match arity {
                Arity::None => None,
                Arity::Required => iter.next(),
                Arity::Optional => iter.next_if(|next| !next.starts_with('-')),
            };
            match value {
                Some(value) => known.push(format!("--{name}={value}")),
                None if name == "h" => known.push("-h".to_string()),
                None => known.push(format!("--{name}")),
            }
        }

        (known, passthrough)
    }

    fn classify<'t>(&self, token: &'t str) -> Option<(&'t str, Option<&'t str>, Arity)> {
        if token == "-h" {
            return Some(("h", None, Arity::None));
        }
        if let Some(rest) = token.strip_prefix(PROFILE_FLAG) {
            return match rest.strip_prefix('=') {
                Some(value) => Some(("profile", Some(value), Arity::Required)),
                None if rest.is_empty() => Some(("profile", None, Arity::Required)),
                None => None,
            };
        }

        let body = token.strip_prefix("--")?;
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let arity = match name {
            "help" => Arity::None,
            "tier" => Arity::Required,
            _ => match self.schema.get(name)?.kind {
                ParameterKind::Boolean => Arity::Optional,
                _ => Arity::Required,
            },
        };
        Some((name, inline, arity))
    }
}

fn arg_for(def: &ParameterDefinition) -> Arg {
    let arg = Arg::new(def.name.clone())
        .long(def.name.clone())
        .help(def.description.clone())
        .action(ArgAction::Set);

    match def.kind {
        ParameterKind::Integer => arg
            .required(def.required)
            .value_parser(clap::value_parser!(i64)),
        ParameterKind::Float => arg
            .required(def.required)
            .value_parser(clap::value_parser!(f64)),
        ParameterKind::Boolean => arg
            .num_args(0..=1)
            .default_missing_value("true")
            .value_parser(BoolishValueParser::new()),
        ParameterKind::StringOptions if !def.options.is_empty() => arg
            .required(def.required)
            .value_parser(PossibleValuesParser::new(def.options.clone())),
        ParameterKind::StringOptions => arg.required(def.required),
        ParameterKind::StringPattern => match &def.pattern {
            Some(pattern) => {
                let pattern = pattern.clone();
                arg.required(def.required)
                    .value_parser(move |value: &str| -> std::result::Result<String, String> {
                        if pattern.is_match(value) {
                            Ok(value.to_string())
                        } else {
                            Err(format!("value does not match pattern {}", pattern.as_str()))
                        }
                    })
            }
            None => arg.required(def.required),
        },
    }
}

fn value_of(matches: &ArgMatches, def: &ParameterDefinition) -> Option<ParamValue> {
    let id = def.name.as_str();
    match def.kind {
        ParameterKind::Integer => matches.get_one::<i64>(id).copied().map(ParamValue::Integer),
        ParameterKind::Float => matches.get_one::<f64>(id).copied().map(ParamValue::Float),
        ParameterKind::Boolean => matches.get_one::<bool>(id).copied().map(ParamValue::Boolean),
        ParameterKind::StringOptions | ParameterKind::StringPattern => matches
            .get_one::<String>(id)
            .cloned()
            .map(ParamValue::Text),
    }
}

fn map_clap_error(err: clap::Error) -> BardError {
    use clap::error::ErrorKind;

    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            BardError::HelpRequested(err.render().to_string())
        }
        _ => BardError::ArgumentType(err.render().to_string().trim_end().to_string()),
    }
}
