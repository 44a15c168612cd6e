// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! TOML loader for [`PolicyDocument`].
//!
//! A small hand-rolled error enum, a file-path entry point, and strict
//! field-by-field validation rather than trusting `toml`'s deserialization
//! to catch domain errors (an out-of-range threshold parses fine as a
//! float; it is this module's job to reject it).

#![cfg(feature = "config-loader")]

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::Deserialize;

use crate::policy::{EasCurve, ParameterConstraint, PolicyDocument, ToolSpec};
use crate::types::RiskTier;

/// Errors from loading or parsing a policy document file.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading the file from disk failed.
    FileRead(String),
    /// The file was not valid TOML.
    TomlParse(String),
    /// A required field was missing or the wrong shape.
    ParseField(String),
    /// A field's value was out of its valid range.
    InvalidRange(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::FileRead(reason) => write!(f, "failed to read policy file: {reason}"),
            ConfigError::TomlParse(reason) => write!(f, "failed to parse policy TOML: {reason}"),
            ConfigError::ParseField(reason) => write!(f, "invalid policy field: {reason}"),
            ConfigError::InvalidRange(reason) => write!(f, "policy field out of range: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Top-level keys this loader understands. Anything else in the document
/// is ignored with a warning rather than rejected — unlike per-tool keys,
/// which are rejected strictly (see [`RawTool`]).
const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["version", "default_verdict", "eas_curve", "tools"];

#[derive(Debug, Deserialize)]
struct RawDocument {
    version: String,
    #[serde(default)]
    default_verdict: Option<String>,
    #[serde(default)]
    eas_curve: Vec<RawBreakpoint>,
    #[serde(default)]
    tools: Vec<RawTool>,
}

#[derive(Debug, Deserialize)]
struct RawBreakpoint {
    eas: f64,
    delta: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTool {
    name: String,
    risk_tier: String,
    base_threshold: f64,
    #[serde(default = "default_max_targets")]
    max_targets: usize,
    #[serde(default)]
    requires_audit: bool,
    #[serde(default)]
    requires_senior_approval: bool,
    #[serde(default)]
    required_parameters: Vec<String>,
}

fn default_max_targets() -> usize {
    50
}

fn parse_risk_tier(raw: &str) -> Result<RiskTier, ConfigError> {
    match raw {
        "read" => Ok(RiskTier::Read),
        "low_write" => Ok(RiskTier::LowWrite),
        "high_write" => Ok(RiskTier::HighWrite),
        "destructive" => Ok(RiskTier::Destructive),
        other => Err(ConfigError::ParseField(format!("unknown risk_tier '{other}'"))),
    }
}

fn build_document(raw: RawDocument) -> Result<PolicyDocument, ConfigError> {
    if raw.version.trim().is_empty() {
        return Err(ConfigError::ParseField("version must not be empty".to_string()));
    }

    if let Some(ref default_verdict) = raw.default_verdict {
        if default_verdict != "BLOCK" {
            return Err(ConfigError::ParseField(format!(
                "default_verdict must be 'BLOCK', got '{default_verdict}'"
            )));
        }
    }

    let eas_curve = if raw.eas_curve.is_empty() {
        EasCurve::flat()
    } else {
        for breakpoint in &raw.eas_curve {
            if !(0.0..=1.0).contains(&breakpoint.eas) {
                return Err(ConfigError::InvalidRange(format!(
                    "eas_curve breakpoint {} outside [0.0, 1.0]",
                    breakpoint.eas
                )));
            }
        }
        EasCurve::new(raw.eas_curve.iter().map(|bp| (bp.eas, bp.delta)).collect())
    };

    let mut tools = Vec::with_capacity(raw.tools.len());
    for tool in raw.tools {
        if !(0.0..=1.0).contains(&tool.base_threshold) {
            return Err(ConfigError::InvalidRange(format!(
                "tool '{}' base_threshold {} outside [0.0, 1.0]",
                tool.name, tool.base_threshold
            )));
        }
        if tool.max_targets == 0 {
            return Err(ConfigError::InvalidRange(format!(
                "tool '{}' max_targets must be at least 1",
                tool.name
            )));
        }
        let parameter_constraint = if tool.required_parameters.is_empty() {
            None
        } else {
            Some(ParameterConstraint::All(
                tool.required_parameters
                    .into_iter()
                    .map(|key| ParameterConstraint::Required { key })
                    .collect(),
            ))
        };
        tools.push(ToolSpec {
            name: tool.name,
            risk_tier: parse_risk_tier(&tool.risk_tier)?,
            base_threshold: tool.base_threshold,
            max_targets: tool.max_targets,
            requires_audit: tool.requires_audit,
            requires_senior_approval: tool.requires_senior_approval,
            parameter_constraint,
        });
    }

    Ok(PolicyDocument::new(raw.version.clone(), eas_curve, tools))
}

/// Load a policy document from a TOML file on disk.
#[cfg(feature = "std")]
pub fn load_policy_document(path: &std::path::Path) -> Result<PolicyDocument, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|err| ConfigError::FileRead(err.to_string()))?;
    load_policy_document_from_str(&text)
}

/// Parse a policy document from an in-memory TOML string.
pub fn load_policy_document_from_str(text: &str) -> Result<PolicyDocument, ConfigError> {
    let value: toml::Value = toml::from_str(text).map_err(|err| ConfigError::TomlParse(err.to_string()))?;
    warn_on_unknown_top_level_keys(&value);
    let raw: RawDocument = value.try_into().map_err(|err| ConfigError::TomlParse(err.to_string()))?;
    build_document(raw)
}

/// Unknown top-level keys are ignored, not rejected (unlike unknown
/// per-tool keys, which `RawTool`'s `deny_unknown_fields` rejects at parse
/// time) — log so a typo'd key doesn't silently do nothing.
fn warn_on_unknown_top_level_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else { return };
    for key in table.keys() {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "ignoring unknown top-level policy document key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        version = "2026.07.1"

        [[eas_curve]]
        eas = 0.0
        delta = 0.0

        [[eas_curve]]
        eas = 1.0
        delta = -0.2

        [[tools]]
        name = "show_interfaces"
        risk_tier = "read"
        base_threshold = 0.3
        requires_audit = true

        [[tools]]
        name = "factory_reset"
        risk_tier = "destructive"
        base_threshold = 0.95
        requires_senior_approval = true
        required_parameters = ["confirm_token"]
    "#;

    #[test]
    fn loads_a_well_formed_document() {
        let document = load_policy_document_from_str(SAMPLE).unwrap();
        assert_eq!(document.version, "2026.07.1");
        assert_eq!(document.tool_count(), 2);
        assert!(document.tool("show_interfaces").is_some());
        let destructive = document.tool("factory_reset").unwrap();
        assert!(destructive.requires_senior_approval);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let bad = r#"
            version = "1"
            [[tools]]
            name = "bad_tool"
            risk_tier = "read"
            base_threshold = 1.5
        "#;
        let result = load_policy_document_from_str(bad);
        assert!(matches!(result, Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    fn rejects_unknown_risk_tier() {
        let bad = r#"
            version = "1"
            [[tools]]
            name = "bad_tool"
            risk_tier = "medium"
            base_threshold = 0.5
        "#;
        let result = load_policy_document_from_str(bad);
        assert!(matches!(result, Err(ConfigError::ParseField(_))));
    }

    #[test]
    fn rejects_empty_version() {
        let bad = "version = \"\"";
        let result = load_policy_document_from_str(bad);
        assert!(matches!(result, Err(ConfigError::ParseField(_))));
    }

    #[test]
    fn missing_eas_curve_defaults_to_flat() {
        let document = load_policy_document_from_str("version = \"1\"").unwrap();
        assert_eq!(document.eas_curve.delta_at(0.9), 0.0);
    }

    #[test]
    fn rejects_unknown_per_tool_key() {
        let bad = r#"
            version = "1"
            [[tools]]
            name = "bad_tool"
            risk_tier = "read"
            base_threshold = 0.5
            made_up_key = true
        "#;
        let result = load_policy_document_from_str(bad);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn accepts_declared_block_default_verdict() {
        let document = load_policy_document_from_str("version = \"1\"\ndefault_verdict = \"BLOCK\"").unwrap();
        assert_eq!(document.version, "1");
    }

    #[test]
    fn rejects_non_block_default_verdict() {
        let bad = "version = \"1\"\ndefault_verdict = \"PERMIT\"";
        let result = load_policy_document_from_str(bad);
        assert!(matches!(result, Err(ConfigError::ParseField(_))));
    }

    #[test]
    fn ignores_unknown_top_level_key_with_a_warning() {
        // Unknown top-level keys are ignored (not rejected); the TOML still
        // parses and the rest of the document is honored.
        let document = load_policy_document_from_str("version = \"1\"\nunexpected = 42").unwrap();
        assert_eq!(document.version, "1");
    }
}
