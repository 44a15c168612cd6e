// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The Policy Document — immutable, versioned tool catalog.
//!
//! A [`PolicyDocument`] is constructed once (by a loader, see
//! [`crate::config_loader`]) and then treated as read-only for the lifetime
//! of every evaluation that observes it. Reloads construct a brand-new
//! document and hot-swap the pointer the engine holds — there is no
//! in-place mutation of a live document.

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::RiskTier;

// ---------------------------------------------------------------------------
// Parameter constraints
// ---------------------------------------------------------------------------

/// A predicate over request parameters, evaluated during step 3 of
/// [`PolicyEngine::evaluate`](crate::engine::PolicyEngine::evaluate).
///
/// Only the constraint shapes needed by real tool catalogs are modeled —
/// this is not a general expression language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterConstraint {
    /// The named parameter must be present and non-empty.
    Required {
        /// Parameter key that must be present.
        key: String,
    },
    /// The named parameter, if present, must equal one of `allowed`.
    OneOf {
        /// Parameter key to check.
        key: String,
        /// Permitted values.
        allowed: Vec<String>,
    },
    /// All of the nested constraints must pass.
    All(Vec<ParameterConstraint>),
}

impl ParameterConstraint {
    /// Evaluate this constraint against `parameters`.
    ///
    /// Returns `Ok(())` when satisfied, or `Err(reason)` naming the
    /// violated constraint.
    pub fn check(&self, parameters: &HashMap<String, String>) -> Result<(), String> {
        match self {
            ParameterConstraint::Required { key } => {
                match parameters.get(key.as_str()) {
                    Some(value) if !value.is_empty() => Ok(()),
                    _ => Err(alloc::format!("missing required parameter '{key}'")),
                }
            }
            ParameterConstraint::OneOf { key, allowed } => match parameters.get(key.as_str()) {
                Some(value) if allowed.iter().any(|candidate| candidate == value) => Ok(()),
                Some(value) => Err(alloc::format!(
                    "parameter '{key}' = '{value}' is not one of the allowed values"
                )),
                None => Ok(()),
            },
            ParameterConstraint::All(constraints) => {
                for constraint in constraints {
                    constraint.check(parameters)?;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tool catalog entry
// ---------------------------------------------------------------------------

/// One entry in the Policy Document's tool catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Stable tool name, matched exactly against `EvaluationRequest::tool_name`.
    pub name: String,
    /// The tool's risk tier.
    pub risk_tier: RiskTier,
    /// Base confidence threshold in `[0.0, 1.0]`, before EAS adjustment.
    pub base_threshold: f64,
    /// Maximum number of device targets a single request may name.
    pub max_targets: usize,
    /// Whether decisions for this tool must be written to the audit log.
    /// Always honored as `true` by the current engine; retained for
    /// forward-compatible selective-audit policies.
    pub requires_audit: bool,
    /// Whether this tool always escalates regardless of confidence.
    pub requires_senior_approval: bool,
    /// Optional parameter constraint evaluated at step 3.
    pub parameter_constraint: Option<ParameterConstraint>,
}

// ---------------------------------------------------------------------------
// EAS adjustment curve
// ---------------------------------------------------------------------------

/// Piecewise-linear mapping from an Earned Autonomy Score to a
/// threshold-delta, interpolated between explicit breakpoints.
///
/// Breakpoints must be sorted by `eas` ascending; `eas` values are clamped
/// to `[0.0, 1.0]` on construction. Higher EAS producing a larger delta
/// lowers the effective threshold (the engine subtracts the delta), so the
/// curve is expected to be monotonic non-decreasing in EAS per spec — this
/// type does not itself enforce monotonicity beyond what the loader
/// validates, since a deliberately non-monotonic curve is a policy-author
/// error, not a representational one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasCurve {
    /// `(eas_breakpoint, threshold_delta)` pairs, sorted by breakpoint.
    breakpoints: Vec<(f64, f64)>,
}

impl EasCurve {
    /// Construct a curve from explicit breakpoints, sorting them by `eas`.
    pub fn new(mut breakpoints: Vec<(f64, f64)>) -> Self {
        breakpoints.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal));
        Self { breakpoints }
    }

    /// A curve that never adjusts the threshold (delta is always `0.0`).
    pub fn flat() -> Self {
        Self { breakpoints: alloc::vec![(0.0, 0.0), (1.0, 0.0)] }
    }

    /// Evaluate the curve at `eas`, clamping `eas` into `[0.0, 1.0]` first.
    ///
    /// Returns `0.0` for an empty curve. Below the first breakpoint the
    /// first breakpoint's delta is held constant; above the last, the
    /// last's delta is held constant.
    pub fn delta_at(&self, eas: f64) -> f64 {
        let eas = eas.clamp(0.0, 1.0);
        if self.breakpoints.is_empty() {
            return 0.0;
        }
        if eas <= self.breakpoints[0].0 {
            return self.breakpoints[0].1;
        }
        let last = self.breakpoints.len() - 1;
        if eas >= self.breakpoints[last].0 {
            return self.breakpoints[last].1;
        }
        for window in self.breakpoints.windows(2) {
            let (lo_eas, lo_delta) = window[0];
            let (hi_eas, hi_delta) = window[1];
            if eas >= lo_eas && eas <= hi_eas {
                if (hi_eas - lo_eas).abs() < f64::EPSILON {
                    return lo_delta;
                }
                let fraction = (eas - lo_eas) / (hi_eas - lo_eas);
                return lo_delta + fraction * (hi_delta - lo_delta);
            }
        }
        0.0
    }
}

// ---------------------------------------------------------------------------
// Unknown-tool policy
// ---------------------------------------------------------------------------

/// Verdict applied to any tool absent from the catalog.
///
/// Spec mandates fail-closed: the only supported value is [`Verdict::Block`](crate::types::Verdict::Block),
/// but the type is kept distinct from [`crate::types::Verdict`] so a loader
/// can reject any other value at parse time with a clear field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownToolPolicy {
    /// Unknown tools are blocked. The only permitted value.
    Block,
}

// ---------------------------------------------------------------------------
// Policy Document
// ---------------------------------------------------------------------------

/// Immutable, versioned snapshot of the policy catalog.
///
/// # Invariants
///
/// * `version` strictly increases across reloads of the same logical
///   policy source (enforced by the loader, not this type).
/// * Once constructed, a `PolicyDocument` is never mutated — reloads build
///   a new instance and the engine swaps its reference atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Monotonically increasing version identifier.
    pub version: String,
    /// Verdict for tools absent from `tools`.
    pub default_verdict: UnknownToolPolicy,
    /// EAS-to-threshold-delta adjustment curve.
    pub eas_curve: EasCurve,
    /// Tool name -> catalog entry.
    tools: HashMap<String, ToolSpec>,
}

impl PolicyDocument {
    /// Construct a new document from an explicit tool list.
    pub fn new(version: impl Into<String>, eas_curve: EasCurve, tools: Vec<ToolSpec>) -> Self {
        let mut map = HashMap::new();
        for tool in tools {
            map.insert(tool.name.clone(), tool);
        }
        Self {
            version: version.into(),
            default_verdict: UnknownToolPolicy::Block,
            eas_curve,
            tools: map,
        }
    }

    /// Look up a tool by name.
    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    /// Number of catalogued tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn eas_curve_interpolates_between_breakpoints() {
        let curve = EasCurve::new(vec![(0.0, 0.2), (1.0, -0.1)]);
        assert!((curve.delta_at(0.5) - 0.05).abs() < 1e-9);
        assert_eq!(curve.delta_at(-1.0), curve.delta_at(0.0));
        assert_eq!(curve.delta_at(2.0), curve.delta_at(1.0));
    }

    #[test]
    fn flat_curve_never_adjusts() {
        let curve = EasCurve::flat();
        assert_eq!(curve.delta_at(0.0), 0.0);
        assert_eq!(curve.delta_at(0.73), 0.0);
        assert_eq!(curve.delta_at(1.0), 0.0);
    }

    #[test]
    fn required_parameter_constraint() {
        let constraint = ParameterConstraint::Required { key: "vlan_id".into() };
        let mut params = HashMap::new();
        assert!(constraint.check(&params).is_err());
        params.insert("vlan_id".into(), "100".into());
        assert!(constraint.check(&params).is_ok());
    }

    #[test]
    fn one_of_constraint_allows_absence() {
        let constraint = ParameterConstraint::OneOf {
            key: "protocol".into(),
            allowed: vec!["tcp".into(), "udp".into()],
        };
        let params = HashMap::new();
        assert!(constraint.check(&params).is_ok());
    }

    #[test]
    fn one_of_constraint_rejects_unlisted_value() {
        let constraint = ParameterConstraint::OneOf {
            key: "protocol".into(),
            allowed: vec!["tcp".into(), "udp".into()],
        };
        let mut params = HashMap::new();
        params.insert("protocol".into(), "icmp".into());
        assert!(constraint.check(&params).is_err());
    }

    #[test]
    fn policy_document_looks_up_tools_by_name() {
        let doc = PolicyDocument::new(
            "1",
            EasCurve::flat(),
            vec![ToolSpec {
                name: "show_interfaces".into(),
                risk_tier: RiskTier::Read,
                base_threshold: 0.5,
                max_targets: 50,
                requires_audit: true,
                requires_senior_approval: false,
                parameter_constraint: None,
            }],
        );
        assert!(doc.tool("show_interfaces").is_some());
        assert!(doc.tool("factory_reset").is_none());
    }
}
