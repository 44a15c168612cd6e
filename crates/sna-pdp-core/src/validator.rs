// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Validator Framework.
//!
//! Post-change validators inspect device state (or other evidence) after an
//! action executes and report a [`ValidationResult`]. Validators compose:
//! a [`CompositeValidator`] runs its children and reduces to the worst
//! status observed — a capability-trait ("polymorphic validator") pattern
//! rather than an inheritance hierarchy.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::diff::{validate_config_diff, DiffOutcome};
use crate::notifier::Notifier;
use crate::types::{NotificationEvent, ValidationStatus};
pub use crate::types::ValidationResult;

/// Opaque before/after device state captured by the caller. Only
/// `running_config` is interpreted here; other keys pass through
/// untouched for other validators to inspect.
pub struct DeviceState {
    /// Raw `running_config` text, if the caller captured one.
    pub running_config: Option<String>,
}

/// Validates that a tool invocation produced an observable, semantically
/// meaningful change to a device's running configuration.
///
/// Grounded on the Python `SemanticDiffValidator`: SKIP when state wasn't
/// captured, FAIL when nothing changed, PASS with a structured change list
/// otherwise.
pub struct SemanticDiffValidator {
    tool_name: String,
    device_target: String,
    before: Option<DeviceState>,
    after: Option<DeviceState>,
    timestamp_ms: u64,
}

impl SemanticDiffValidator {
    /// Build a validator for one tool invocation against one device.
    pub fn new(
        tool_name: impl Into<String>,
        device_target: impl Into<String>,
        before: Option<DeviceState>,
        after: Option<DeviceState>,
        timestamp_ms: u64,
    ) -> Self {
        Self { tool_name: tool_name.into(), device_target: device_target.into(), before, after, timestamp_ms }
    }
}

impl Validator for SemanticDiffValidator {
    fn name(&self) -> &str {
        "semantic_diff"
    }

    fn validate(&self) -> ValidationResult {
        let before_config = self.before.as_ref().and_then(|state| state.running_config.as_deref());
        let after_config = self.after.as_ref().and_then(|state| state.running_config.as_deref());

        let testcase_name = alloc::format!("semantic_diff[{}@{}]", self.tool_name, self.device_target);

        match validate_config_diff(&self.tool_name, before_config, after_config) {
            DiffOutcome::Skip => ValidationResult {
                status: ValidationStatus::Skip,
                testcase_name,
                message: "before/after running_config not captured".to_string(),
                details: serde_json::Value::Null,
                timestamp_ms: self.timestamp_ms,
                duration_seconds: 0.0,
            },
            DiffOutcome::Fail(message) => ValidationResult {
                status: ValidationStatus::Fail,
                testcase_name,
                message,
                details: serde_json::Value::Null,
                timestamp_ms: self.timestamp_ms,
                duration_seconds: 0.0,
            },
            DiffOutcome::Pass(changes) => {
                let details = serde_json::json!({
                    "changes": changes
                        .iter()
                        .map(|change| serde_json::json!({
                            "section": change.section,
                            "change_type": change.change_type,
                            "before_lines": change.before_lines,
                            "after_lines": change.after_lines,
                        }))
                        .collect::<Vec<_>>(),
                });
                ValidationResult {
                    status: ValidationStatus::Pass,
                    testcase_name,
                    message: alloc::format!("{} section(s) changed", changes.len()),
                    details,
                    timestamp_ms: self.timestamp_ms,
                    duration_seconds: 0.0,
                }
            }
        }
    }
}

/// A single post-change check.
///
/// Implementations are synchronous here; an async-runtime caller wraps
/// `validate` in `spawn_blocking` or similar as needed — core traits stay
/// synchronous and [`crate::async_engine`] layers on top rather than
/// threading `async fn` through every trait.
pub trait Validator: Send + Sync {
    /// Human-readable name for this validator, used as `testcase_name`.
    fn name(&self) -> &str;

    /// Run the check and produce a result.
    fn validate(&self) -> ValidationResult;
}

/// Runs a fixed set of validators and reduces their outcomes to a single
/// worst-case [`ValidationResult`].
///
/// Reduction order follows [`ValidationStatus`]'s `Ord` impl: `Error` >
/// `Fail` > `Skip` > `Pass`. An empty validator set is itself a `Skip`
/// (nothing could be checked, so nothing passed or failed).
pub struct CompositeValidator {
    name: String,
    children: Vec<Box<dyn Validator>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl CompositeValidator {
    /// Build a composite named `name` over `children`, run in order.
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Validator>>) -> Self {
        Self { name: name.into(), children, notifier: None }
    }

    /// Attach a notifier to dispatch a [`NotificationEvent`] whenever this
    /// composite's worst child status is `Fail` or `Error`.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> ValidationResult {
        if self.children.is_empty() {
            return ValidationResult {
                status: ValidationStatus::Skip,
                testcase_name: self.name.clone(),
                message: "no child validators registered".to_string(),
                details: serde_json::Value::Null,
                timestamp_ms: 0,
                duration_seconds: 0.0,
            };
        }

        let results: Vec<ValidationResult> = self.children.iter().map(|child| child.validate()).collect();

        let worst = results
            .iter()
            .map(|result| result.status)
            .max()
            .unwrap_or(ValidationStatus::Skip);

        let duration_seconds: f64 = results.iter().map(|result| result.duration_seconds).sum();
        let timestamp_ms = results.iter().map(|result| result.timestamp_ms).max().unwrap_or(0);

        let details = serde_json::json!({
            "children": results
                .iter()
                .map(|result| serde_json::json!({
                    "testcase_name": result.testcase_name,
                    "status": result.status.to_string(),
                }))
                .collect::<Vec<_>>(),
        });

        let outcome = ValidationResult {
            status: worst,
            testcase_name: self.name.clone(),
            message: alloc::format!("{} of {} children in worst state {:?}", results.len(), results.len(), worst),
            details,
            timestamp_ms,
            duration_seconds,
        };

        if matches!(outcome.status, ValidationStatus::Fail | ValidationStatus::Error) {
            if let Some(notifier) = &self.notifier {
                let event = NotificationEvent::for_validation_failure(&outcome);
                let _ = notifier.notify(&event);
            }
        }

        outcome
    }
}

impl core::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            ValidationStatus::Pass => "PASS",
            ValidationStatus::Skip => "SKIP",
            ValidationStatus::Fail => "FAIL",
            ValidationStatus::Error => "ERROR",
        };
        write!(f, "{label}")
    }
}
