// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The Policy Engine — `evaluate(req) -> EvaluationResult`.
//!
//! Pure with respect to the request; impure only through reading the
//! current [`PolicyDocument`], reading the EAS, writing one audit entry,
//! and possibly creating one escalation. A sequential pipeline of gate
//! checks with short-circuit denial, followed by unconditional side
//! effects in a fixed order.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;

use crate::audit::{AuditLog, VerdictStore};
use crate::config::Config;
use crate::eas::EasCalculator;
use crate::escalation::{EscalationRegistry, EscalationStore};
use crate::notifier::Notifier;
use crate::policy::PolicyDocument;
use crate::types::{
    EscalationState, EvaluationRequest, EvaluationResult, NotificationEvent, RiskTier, Verdict,
};

/// Current time in milliseconds since the Unix epoch.
#[cfg(feature = "std")]
fn current_time_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(not(feature = "std"))]
fn current_time_ms() -> u64 {
    0
}

/// The gate outcome of steps 1-6, before side effects are applied.
struct GateOutcome {
    verdict: Verdict,
    risk_tier: Option<RiskTier>,
    reason: String,
    effective_threshold: f64,
    requires_audit: bool,
    requires_senior_approval: bool,
}

/// Evaluates [`EvaluationRequest`]s against a [`PolicyDocument`], an EAS
/// calculator, a verdict store, and an escalation registry.
///
/// `V` and `E` are generic over storage so callers can choose in-memory or
/// durable backends without the engine depending on either directly.
pub struct PolicyEngine<V: VerdictStore, E: EscalationStore> {
    config: Config,
    policy: Arc<PolicyDocument>,
    audit: AuditLog<V>,
    escalations: EscalationRegistry<E>,
    eas: EasCalculator,
    notifier: Option<Box<dyn Notifier>>,
}

impl<V: VerdictStore, E: EscalationStore> PolicyEngine<V, E> {
    /// Build an engine over `config`, an initial policy snapshot, and
    /// storage. Tuning knobs are supplied once, up front, rather than
    /// threaded through every call.
    pub fn new(config: Config, policy: Arc<PolicyDocument>, verdict_store: V, escalation_store: E) -> Self {
        let eas = EasCalculator::with_window_days(config.eas_window_days);
        Self {
            config,
            policy,
            audit: AuditLog::new(verdict_store),
            escalations: EscalationRegistry::new(escalation_store),
            eas,
            notifier: None,
        }
    }

    /// Attach a notifier the engine will invoke for `ESCALATE` verdicts.
    /// Without one, the engine still constructs no [`NotificationEvent`] —
    /// there is simply nowhere for it to go.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The engine's tuning configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The EAS calculator this engine was configured with.
    pub fn eas(&self) -> &EasCalculator {
        &self.eas
    }

    /// Hot-swap the policy snapshot the engine evaluates against. No
    /// in-flight evaluation observes a torn document: the `Arc` swap is
    /// the only mutation, there is no mutex on the read path and no
    /// copy-on-write of individual tools.
    pub fn reload_policy(&mut self, policy: Arc<PolicyDocument>) {
        self.policy = policy;
    }

    /// Current policy snapshot.
    pub fn policy(&self) -> &PolicyDocument {
        &self.policy
    }

    /// Escalation registry, exposed so callers can transition records
    /// created by `evaluate`.
    pub fn escalations(&mut self) -> &mut EscalationRegistry<E> {
        &mut self.escalations
    }

    /// Audit log, exposed for querying.
    pub fn audit(&self) -> &AuditLog<V> {
        &self.audit
    }

    fn gate(&self, request: &EvaluationRequest) -> GateOutcome {
        // Step 1: classify.
        let tool = match self.policy.tool(&request.tool_name) {
            None => {
                return GateOutcome {
                    verdict: Verdict::Block,
                    risk_tier: None,
                    reason: "unknown tool".to_string(),
                    effective_threshold: 1.0,
                    requires_audit: true,
                    requires_senior_approval: false,
                };
            }
            Some(tool) => tool,
        };

        // Step 2: scope check. Duplicate targets count individually.
        if request.device_targets.len() > tool.max_targets {
            return GateOutcome {
                verdict: Verdict::Block,
                risk_tier: Some(tool.risk_tier),
                reason: alloc::format!(
                    "scope exceeded ({} > {})",
                    request.device_targets.len(),
                    tool.max_targets
                ),
                effective_threshold: tool.base_threshold,
                requires_audit: tool.requires_audit,
                requires_senior_approval: tool.requires_senior_approval,
            };
        }

        // Step 3: parameter constraints.
        if let Some(ref constraint) = tool.parameter_constraint {
            if let Err(violation) = constraint.check(&request.parameters) {
                return GateOutcome {
                    verdict: Verdict::Block,
                    risk_tier: Some(tool.risk_tier),
                    reason: violation,
                    effective_threshold: tool.base_threshold,
                    requires_audit: tool.requires_audit,
                    requires_senior_approval: tool.requires_senior_approval,
                };
            }
        }

        // Step 4: EAS-adjusted threshold. The curve's own delta is clamped
        // to the configured maximum magnitude first, so a misconfigured
        // curve can't collapse the effective threshold beyond what the
        // deployment has agreed to tolerate.
        let eas = self.eas.recompute(self.audit.store(), current_time_ms());
        let max_delta = self.config.max_threshold_delta.abs();
        let delta = self.policy.eas_curve.delta_at(eas).clamp(-max_delta, max_delta);
        let effective_threshold = (tool.base_threshold - delta).clamp(0.0, 1.0);

        // Step 5: confidence gate.
        let below_threshold = request.confidence_score < effective_threshold;
        let mut verdict = Verdict::Permit;
        let mut reason = "permitted".to_string();

        match tool.risk_tier {
            RiskTier::Destructive => {
                if request.confidence_score < 1.0 {
                    verdict = Verdict::Escalate;
                    reason = "destructive action requires perfect confidence".to_string();
                } else if below_threshold {
                    verdict = Verdict::Escalate;
                    reason = "confidence below effective threshold".to_string();
                }
            }
            RiskTier::HighWrite => {
                if below_threshold {
                    verdict = Verdict::Escalate;
                    reason = "confidence below effective threshold".to_string();
                }
            }
            RiskTier::LowWrite => {
                if below_threshold {
                    verdict = Verdict::Escalate;
                    reason = "confidence below effective threshold".to_string();
                }
            }
            RiskTier::Read => {}
        }

        // Step 6: senior approval flag overrides regardless of confidence.
        if tool.requires_senior_approval {
            verdict = Verdict::Escalate;
            reason = "tool requires senior approval".to_string();
        }

        // Step 7: default PERMIT is already the initial value above.
        GateOutcome {
            verdict,
            risk_tier: Some(tool.risk_tier),
            reason,
            effective_threshold,
            requires_audit: tool.requires_audit,
            requires_senior_approval: tool.requires_senior_approval,
        }
    }

    /// Evaluate a request, applying side effects in the mandated order:
    /// escalation creation, then audit append (fail-closed to BLOCK on
    /// storage failure), then metrics emission.
    pub fn evaluate(&mut self, request: EvaluationRequest) -> EvaluationResult {
        let now_ms = current_time_ms();
        let outcome = self.gate(&request);
        let eas_snapshot = self.eas.recompute(self.audit.store(), now_ms);

        let mut result = EvaluationResult {
            verdict: outcome.verdict,
            risk_tier: outcome.risk_tier,
            tool_name: request.tool_name.clone(),
            reason: outcome.reason,
            confidence_score: request.confidence_score,
            confidence_threshold: outcome.effective_threshold,
            device_count: request.device_targets.len(),
            requires_audit: outcome.requires_audit,
            requires_senior_approval: outcome.requires_senior_approval,
            escalation_id: None,
            policy_version: self.policy.version.clone(),
            eas_snapshot,
        };

        // Step 8a: escalation creation, plus the notification event this
        // verdict class constructs (never sent here — only handed to
        // whatever notifier the caller attached).
        if result.verdict == Verdict::Escalate {
            let escalation_id = generate_escalation_id(now_ms, &request.tool_name);
            self.escalations.create(escalation_id.clone(), result.reason.clone(), now_ms);
            result.escalation_id = Some(escalation_id);

            if let Some(notifier) = &self.notifier {
                let event = NotificationEvent::for_escalation(&result, now_ms);
                if let Err(_error) = notifier.notify(&event) {
                    #[cfg(feature = "std")]
                    tracing::warn!(tool = %result.tool_name, "escalation notifier backend failed");
                }
            }
        }

        // Step 8b: audit append, fail-closed.
        match self.audit.log(result.clone(), now_ms, correlation_id_from(&request)) {
            Ok(_) => {}
            Err(_storage_error) => {
                result.verdict = Verdict::Block;
                result.reason = "audit write failed".to_string();
                // A downgraded verdict must still be recorded; if this
                // second append also fails the request is lost to the
                // caller's own error handling, matching fail-closed intent
                // without risking an infinite retry loop here.
                let _ = self.audit.log(result.clone(), now_ms, correlation_id_from(&request));
            }
        }

        // Step 8c: metrics emission is the caller's responsibility (see
        // the notifier/metrics contract) — the engine only logs.
        #[cfg(feature = "std")]
        tracing::debug!(
            tool = %result.tool_name,
            verdict = %result.verdict.display_name(),
            tier = %result.risk_tier_label(),
            "policy evaluation complete"
        );

        result
    }

    /// Sweep expired escalations against an explicit TTL.
    pub fn expire_escalations(&mut self, ttl_ms: u64) -> usize {
        let cutoff = current_time_ms().saturating_sub(ttl_ms);
        self.escalations.expire_older_than(cutoff)
    }

    /// Sweep expired escalations using the engine's configured
    /// `escalation_ttl_ms`.
    pub fn expire_stale_escalations(&mut self) -> usize {
        self.expire_escalations(self.config.escalation_ttl_ms)
    }
}

#[cfg(feature = "std")]
fn generate_escalation_id(_now_ms: u64, _tool_name: &str) -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(not(feature = "std"))]
fn generate_escalation_id(now_ms: u64, tool_name: &str) -> String {
    alloc::format!("esc-{now_ms}-{tool_name}")
}

fn correlation_id_from(request: &EvaluationRequest) -> Option<String> {
    request.context.get("correlation_id").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryVerdictStore;
    use crate::escalation::InMemoryEscalationStore;
    use crate::policy::{EasCurve, ToolSpec};
    use hashbrown::HashMap;

    fn sample_policy() -> Arc<PolicyDocument> {
        Arc::new(PolicyDocument::new(
            "1",
            EasCurve::flat(),
            alloc::vec![
                ToolSpec {
                    name: "show_interfaces".to_string(),
                    risk_tier: RiskTier::Read,
                    base_threshold: 0.3,
                    max_targets: 10,
                    requires_audit: true,
                    requires_senior_approval: false,
                    parameter_constraint: None,
                },
                ToolSpec {
                    name: "configure_vlan".to_string(),
                    risk_tier: RiskTier::LowWrite,
                    base_threshold: 0.6,
                    max_targets: 5,
                    requires_audit: true,
                    requires_senior_approval: false,
                    parameter_constraint: None,
                },
                ToolSpec {
                    name: "factory_reset".to_string(),
                    risk_tier: RiskTier::Destructive,
                    base_threshold: 0.9,
                    max_targets: 1,
                    requires_audit: true,
                    requires_senior_approval: true,
                    parameter_constraint: None,
                },
            ],
        ))
    }

    fn engine() -> PolicyEngine<InMemoryVerdictStore, InMemoryEscalationStore> {
        PolicyEngine::new(
            Config::default(),
            sample_policy(),
            InMemoryVerdictStore::new(),
            InMemoryEscalationStore::new(),
        )
    }

    fn request(tool_name: &str, confidence: f64, targets: usize) -> EvaluationRequest {
        EvaluationRequest {
            tool_name: tool_name.to_string(),
            parameters: HashMap::new(),
            device_targets: (0..targets).map(|i| alloc::format!("dev-{i}")).collect(),
            confidence_score: confidence,
            context: HashMap::new(),
        }
    }

    #[test]
    fn unknown_tool_blocks() {
        let mut engine = engine();
        let result = engine.evaluate(request("reboot_all", 0.99, 1));
        assert_eq!(result.verdict, Verdict::Block);
        assert_eq!(result.reason, "unknown tool");
        assert_eq!(result.risk_tier_label(), "UNKNOWN");
    }

    #[test]
    fn read_tool_permits_at_high_confidence() {
        let mut engine = engine();
        let result = engine.evaluate(request("show_interfaces", 0.95, 3));
        assert_eq!(result.verdict, Verdict::Permit);
    }

    #[test]
    fn scope_exceeded_blocks() {
        let mut engine = engine();
        let result = engine.evaluate(request("configure_vlan", 0.95, 10));
        assert_eq!(result.verdict, Verdict::Block);
        assert!(result.reason.starts_with("scope exceeded"));
    }

    #[test]
    fn destructive_always_escalates_below_perfect_confidence() {
        let mut engine = engine();
        let result = engine.evaluate(request("factory_reset", 0.999, 1));
        assert_eq!(result.verdict, Verdict::Escalate);
        assert!(result.escalation_id.is_some());
    }

    #[test]
    fn senior_approval_tool_escalates_even_at_full_confidence() {
        let mut engine = engine();
        let result = engine.evaluate(request("factory_reset", 1.0, 1));
        assert_eq!(result.verdict, Verdict::Escalate);
    }

    #[test]
    fn low_write_escalates_below_threshold() {
        let mut engine = engine();
        let result = engine.evaluate(request("configure_vlan", 0.1, 1));
        assert_eq!(result.verdict, Verdict::Escalate);
    }

    #[test]
    fn every_evaluation_appends_an_audit_entry() {
        let mut engine = engine();
        engine.evaluate(request("show_interfaces", 0.9, 1));
        engine.evaluate(request("show_interfaces", 0.9, 1));
        assert_eq!(engine.audit().count(&Default::default()), 2);
    }

    #[test]
    fn empty_history_yields_zero_eas_and_raises_bar() {
        let mut engine = engine();
        let result = engine.evaluate(request("configure_vlan", 0.55, 1));
        // base_threshold 0.6, flat curve => effective threshold stays 0.6.
        assert_eq!(result.confidence_threshold, 0.6);
        assert_eq!(result.verdict, Verdict::Escalate);
    }

    #[test]
    fn max_threshold_delta_clamps_an_aggressive_curve() {
        // A constant -0.9 delta would push effective_threshold to
        // base_threshold + 0.9, clamped to 1.0 by the [0.0, 1.0] bound alone.
        // With max_threshold_delta capped at 0.1, the curve's own delta is
        // clamped to -0.1 first, landing at 0.7 instead.
        let policy = Arc::new(PolicyDocument::new(
            "1",
            EasCurve::new(alloc::vec![(0.0, -0.9), (1.0, -0.9)]),
            alloc::vec![ToolSpec {
                name: "configure_vlan".to_string(),
                risk_tier: RiskTier::LowWrite,
                base_threshold: 0.6,
                max_targets: 5,
                requires_audit: true,
                requires_senior_approval: false,
                parameter_constraint: None,
            }],
        ));
        let config = Config { max_threshold_delta: 0.1, ..Config::default() };
        let mut engine = PolicyEngine::new(
            config,
            policy,
            InMemoryVerdictStore::new(),
            InMemoryEscalationStore::new(),
        );

        let result = engine.evaluate(request("configure_vlan", 0.95, 1));
        assert!((result.confidence_threshold - 0.7).abs() < 1e-9);
    }

    #[test]
    fn expire_stale_escalations_uses_the_configured_ttl() {
        let config = Config { escalation_ttl_ms: 0, ..Config::default() };
        let mut engine = PolicyEngine::new(
            config,
            sample_policy(),
            InMemoryVerdictStore::new(),
            InMemoryEscalationStore::new(),
        );
        engine.evaluate(request("factory_reset", 1.0, 1));
        let expired = engine.expire_stale_escalations();
        assert_eq!(expired, 1);
    }

    struct RecordingNotifier {
        events: alloc::sync::Arc<core::sync::atomic::AtomicUsize>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _event: &NotificationEvent) -> Result<(), crate::notifier::NotifyError> {
            self.events.fetch_add(1, core::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn escalate_verdicts_construct_and_dispatch_a_notification() {
        let events = alloc::sync::Arc::new(core::sync::atomic::AtomicUsize::new(0));
        let mut engine = PolicyEngine::new(
            Config::default(),
            sample_policy(),
            InMemoryVerdictStore::new(),
            InMemoryEscalationStore::new(),
        )
        .with_notifier(Box::new(RecordingNotifier { events: events.clone() }));

        let result = engine.evaluate(request("factory_reset", 1.0, 1));
        assert_eq!(result.verdict, Verdict::Escalate);
        assert_eq!(events.load(core::sync::atomic::Ordering::SeqCst), 1);

        engine.evaluate(request("show_interfaces", 0.95, 1));
        assert_eq!(events.load(core::sync::atomic::Ordering::SeqCst), 1);
    }
}
