// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Shared data types used across the policy decision point.
//!
//! All types implement [`Clone`], [`Debug`], [`serde::Serialize`], and
//! [`serde::Deserialize`] so they can be serialised to JSON, stored, and
//! transmitted across process boundaries without additional conversion
//! steps.

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Risk tier
// ---------------------------------------------------------------------------

/// Four-level risk classification for a catalogued tool.
///
/// Discriminant order matters: comparisons (`tier >= RiskTier::HighWrite`)
/// are used by callers that want to branch on severity without a match arm
/// per variant.
///
/// # Examples
///
/// ```rust
/// use sna_pdp_core::types::RiskTier;
///
/// assert!(RiskTier::Destructive > RiskTier::Read);
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    /// Read-only queries. No device state is mutated.
    Read = 0,
    /// Low-impact writes (e.g. cosmetic config, non-production toggles).
    LowWrite = 1,
    /// High-impact writes (e.g. routing, VLAN, interface config).
    HighWrite = 2,
    /// Irreversible or fleet-wide operations (e.g. erase config, reload).
    Destructive = 3,
}

impl RiskTier {
    /// Human-readable display name for logging and audit surfaces.
    pub fn display_name(self) -> &'static str {
        match self {
            RiskTier::Read => "READ",
            RiskTier::LowWrite => "LOW_WRITE",
            RiskTier::HighWrite => "HIGH_WRITE",
            RiskTier::Destructive => "DESTRUCTIVE",
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The three terminal outcomes of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The action is permitted to proceed.
    Permit,
    /// The action requires human approval before proceeding.
    Escalate,
    /// The action is denied.
    Block,
}

impl Verdict {
    /// Display name matching the wire contract (`PERMIT` / `ESCALATE` / `BLOCK`).
    pub fn display_name(self) -> &'static str {
        match self {
            Verdict::Permit => "PERMIT",
            Verdict::Escalate => "ESCALATE",
            Verdict::Block => "BLOCK",
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation request / result
// ---------------------------------------------------------------------------

/// The action submitted to [`PolicyEngine::evaluate`](crate::engine::PolicyEngine::evaluate).
///
/// Ephemeral — never persisted as-is. Only the fields the engine derives
/// from it are carried into the [`AuditEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Name of the tool the agent wants to invoke. Must be non-empty.
    pub tool_name: String,
    /// Tool parameters as submitted by the agent.
    pub parameters: HashMap<String, String>,
    /// Ordered list of target device hostnames. Must be non-empty; each
    /// hostname must be <= 255 characters.
    pub device_targets: Vec<String>,
    /// The agent's self-reported confidence in `[0.0, 1.0]`.
    pub confidence_score: f64,
    /// Free-form caller context (e.g. correlation metadata), not
    /// interpreted by the engine itself.
    pub context: HashMap<String, String>,
}

/// Result of a single [`PolicyEngine::evaluate`](crate::engine::PolicyEngine::evaluate) call.
///
/// Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The verdict reached by the engine.
    pub verdict: Verdict,
    /// The tool's risk tier, or `None` for an unknown tool (reported as
    /// `"UNKNOWN"` on the wire via [`EvaluationResult::risk_tier_label`]).
    pub risk_tier: Option<RiskTier>,
    /// Name of the tool that was evaluated.
    pub tool_name: String,
    /// Human-readable explanation of the verdict.
    pub reason: String,
    /// The confidence score echoed back from the request.
    pub confidence_score: f64,
    /// The effective confidence threshold used for the confidence gate.
    pub confidence_threshold: f64,
    /// Number of device targets in the request (duplicates counted
    /// individually).
    pub device_count: usize,
    /// Whether the matched tool requires an audit entry (always `true` in
    /// the current engine — retained on the result for forward
    /// compatibility with selective-audit policies).
    pub requires_audit: bool,
    /// Whether the matched tool requires senior approval regardless of
    /// confidence.
    pub requires_senior_approval: bool,
    /// Present iff `verdict == Verdict::Escalate`.
    pub escalation_id: Option<String>,
    /// The policy document version this decision was made against.
    pub policy_version: String,
    /// The Earned Autonomy Score observed at decision time.
    pub eas_snapshot: f64,
}

impl EvaluationResult {
    /// Wire-facing risk tier label: the tier's display name, or `"UNKNOWN"`
    /// when the tool was absent from the catalog.
    pub fn risk_tier_label(&self) -> &'static str {
        match self.risk_tier {
            Some(tier) => tier.display_name(),
            None => "UNKNOWN",
        }
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// An immutable record of a single evaluation.
///
/// Records are chained via `prev_hash` to form a tamper-evident log,
/// mirroring the audit chain design used elsewhere in this codebase family.
/// The chain is recording-only — there is no anomaly detection here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Opaque, stable, URL-safe, globally unique identifier.
    pub external_id: String,
    /// Wall-clock UTC timestamp in Unix epoch milliseconds. Monotonic
    /// within a single writer.
    pub timestamp_ms: u64,
    /// Correlation id supplied by the calling context, if any.
    pub correlation_id: Option<String>,
    /// All fields of the [`EvaluationResult`] this entry records.
    pub result: EvaluationResult,
    /// SHA-256 hex digest covering this entry's payload and `prev_hash`.
    pub hash: String,
    /// Hash of the immediately preceding entry, or 64 zeros for the
    /// genesis entry.
    pub prev_hash: String,
}

/// Filter used to narrow the results of [`AuditLog::query`](crate::audit::AuditLog::query).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// If set, only return entries for this tool.
    pub tool_name: Option<String>,
    /// If set, only return entries with this verdict.
    pub verdict: Option<Verdict>,
    /// If set, only return entries at or after this Unix epoch millisecond.
    pub since_ms: Option<u64>,
    /// If set, only return entries at or before this Unix epoch millisecond.
    pub until_ms: Option<u64>,
}

/// 1-indexed pagination parameters, `page_size` clamped to `[1, 200]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-indexed page number.
    pub page: usize,
    /// Number of items per page, in `[1, 200]`.
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_size: 50 }
    }
}

impl Pagination {
    /// Clamp `page` to >= 1 and `page_size` to `[1, 200]`.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, 200),
        }
    }

    /// Zero-based offset into the result set.
    pub fn offset(self) -> usize {
        (self.normalized().page - 1) * self.normalized().page_size
    }
}

/// A single page of [`AuditEntry`] results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    /// The entries on this page, most-recent-first.
    pub items: Vec<AuditEntry>,
    /// Total number of entries matching the filter, across all pages.
    pub total: usize,
    /// The page number that was served.
    pub page: usize,
    /// The page size that was served.
    pub page_size: usize,
    /// Whether a subsequent page exists.
    pub has_next: bool,
    /// Whether a preceding page exists.
    pub has_prev: bool,
}

/// Server-computed compliance summary over a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// The requested lookback window, in hours.
    pub time_window_hours: u64,
    /// Total evaluations recorded in the window.
    pub total_evaluations: usize,
    /// Count of PERMIT verdicts in the window.
    pub permit_count: usize,
    /// Count of ESCALATE verdicts in the window.
    pub escalate_count: usize,
    /// Count of BLOCK verdicts in the window.
    pub block_count: usize,
    /// The current Earned Autonomy Score.
    pub current_eas: f64,
}

// ---------------------------------------------------------------------------
// Execution (recorded by the caller, not the engine)
// ---------------------------------------------------------------------------

/// Recorded by the caller after running a PERMITted action against a single
/// device. One row per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEntry {
    /// The [`AuditEntry::external_id`] of the evaluation that permitted
    /// this execution.
    pub external_id: String,
    /// Wall-clock UTC timestamp in Unix epoch milliseconds.
    pub timestamp_ms: u64,
    /// Name of the tool that was executed.
    pub tool_name: String,
    /// The single device this row covers.
    pub device_target: String,
    /// The sanitized command that was sent to the device.
    pub command_sent: String,
    /// The sanitized output returned by the device.
    pub output: String,
    /// Whether the execution succeeded.
    pub success: bool,
    /// Wall-clock duration of the execution, in seconds.
    pub duration_seconds: f64,
    /// Error detail, if `success` is `false`.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

/// States in the escalation lifecycle. `Pending` is the only non-terminal
/// state; all others are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationState {
    /// Awaiting human approval.
    Pending,
    /// Approved by a human reviewer. Terminal.
    Approved,
    /// Rejected by a human reviewer. Terminal.
    Rejected,
    /// Timed out while pending. Terminal.
    Expired,
}

impl EscalationState {
    /// Whether this state accepts further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, EscalationState::Pending)
    }
}

/// Created when the engine returns [`Verdict::Escalate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    /// Stable identifier, also surfaced in the originating
    /// [`EvaluationResult::escalation_id`].
    pub escalation_id: String,
    /// Unix epoch milliseconds at which the record was created.
    pub created_at_ms: u64,
    /// Current lifecycle state.
    pub state: EscalationState,
    /// Identity of the approver, set on a terminal transition out of
    /// `Pending` via human action (never on automatic expiry).
    pub approver: Option<String>,
    /// Human-readable reason supplied at creation time.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of a single validator run. Ordered by severity
/// (`Error > Fail > Skip > Pass`) so a composite validator can reduce a set
/// of results to the worst one with a simple `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// The validated effect matches intent.
    Pass = 0,
    /// Validation ran but the change could not be confirmed; rollback
    /// policy is the caller's decision.
    Skip = 1,
    /// The validated effect does not match intent.
    Fail = 2,
    /// The validator itself raised internally.
    Error = 3,
}

/// Result from a single validator run against a single action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The outcome of this validation.
    pub status: ValidationStatus,
    /// Name of the test case (e.g. `"semantic_diff"`).
    pub testcase_name: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details specific to the validator (e.g. a diff listing).
    pub details: serde_json::Value,
    /// Wall-clock UTC timestamp in Unix epoch milliseconds.
    pub timestamp_ms: u64,
    /// Wall-clock duration of the validation run, in seconds.
    pub duration_seconds: f64,
}

// ---------------------------------------------------------------------------
// Notification (contract only — backends are out of scope)
// ---------------------------------------------------------------------------

/// The data a caller-supplied [`Notifier`](crate::notifier::Notifier) needs
/// to render an alert. Constructed by [`PolicyEngine::evaluate`](crate::engine::PolicyEngine::evaluate)
/// for ESCALATE verdicts and by the validator framework for FAILs — the
/// core never dispatches one itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Logical channel this event should be routed to (e.g. `"escalation"`,
    /// `"validation-failure"`).
    pub channel: String,
    /// Short human-readable title.
    pub title: String,
    /// Longer human-readable body.
    pub body: String,
    /// Unix epoch milliseconds at which the event was constructed.
    pub timestamp_ms: u64,
}

impl NotificationEvent {
    /// Build the event the engine constructs for an `ESCALATE` verdict.
    pub fn for_escalation(result: &EvaluationResult, now_ms: u64) -> Self {
        Self {
            channel: String::from("escalation"),
            title: alloc::format!("{} requires approval", result.tool_name),
            body: result.reason.clone(),
            timestamp_ms: now_ms,
        }
    }

    /// Build the event the validator framework constructs for a FAIL (or
    /// ERROR) [`ValidationResult`].
    pub fn for_validation_failure(result: &ValidationResult) -> Self {
        Self {
            channel: String::from("validation-failure"),
            title: alloc::format!("{} failed validation", result.testcase_name),
            body: result.message.clone(),
            timestamp_ms: result.timestamp_ms,
        }
    }
}
