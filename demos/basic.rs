// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # Basic Policy Engine Example
//!
//! Demonstrates the full sequential evaluation pipeline using the
//! in-memory stores. Run with:
//!
//! ```bash
//! cargo run --example basic
//! ```

use std::sync::Arc;

use hashbrown::HashMap;
use sna_pdp_core::audit::InMemoryVerdictStore;
use sna_pdp_core::config::Config;
use sna_pdp_core::engine::PolicyEngine;
use sna_pdp_core::escalation::InMemoryEscalationStore;
use sna_pdp_core::notifier::{NotificationEvent, Notifier, NotifyError};
use sna_pdp_core::policy::{EasCurve, ParameterConstraint, PolicyDocument, ToolSpec};
use sna_pdp_core::types::{AuditFilter, EvaluationRequest, Pagination, RiskTier};

/// Prints escalation notifications to stdout. A real deployment would swap
/// this for a chat webhook or pager integration.
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        println!("  [notify:{}] {} — {}", event.channel, event.title, event.body);
        Ok(())
    }
}

fn main() {
    println!("sna-pdp-core — Basic Example\n");

    // -----------------------------------------------------------------------
    // 1. Build a policy document and construct the engine
    // -----------------------------------------------------------------------
    let policy = Arc::new(PolicyDocument::new(
        "2026.07.1",
        EasCurve::new(vec![(0.0, 0.0), (1.0, -0.2)]),
        vec![
            ToolSpec {
                name: "show_interfaces".into(),
                risk_tier: RiskTier::Read,
                base_threshold: 0.3,
                max_targets: 50,
                requires_audit: true,
                requires_senior_approval: false,
                parameter_constraint: None,
            },
            ToolSpec {
                name: "configure_vlan".into(),
                risk_tier: RiskTier::LowWrite,
                base_threshold: 0.6,
                max_targets: 10,
                requires_audit: true,
                requires_senior_approval: false,
                parameter_constraint: Some(ParameterConstraint::Required { key: "vlan_id".into() }),
            },
            ToolSpec {
                name: "factory_reset".into(),
                risk_tier: RiskTier::Destructive,
                base_threshold: 0.95,
                max_targets: 1,
                requires_audit: true,
                requires_senior_approval: true,
                parameter_constraint: None,
            },
        ],
    ));

    let mut engine = PolicyEngine::new(
        Config::default(),
        policy,
        InMemoryVerdictStore::new(),
        InMemoryEscalationStore::new(),
    )
    .with_notifier(Box::new(StdoutNotifier));

    // -----------------------------------------------------------------------
    // 2. Evaluate a handful of proposed actions
    // -----------------------------------------------------------------------

    // A — read-only query, high confidence: PERMIT.
    let mut params_a = HashMap::new();
    params_a.insert("interface".into(), "Gi0/1".into());
    let result_a = engine.evaluate(EvaluationRequest {
        tool_name: "show_interfaces".into(),
        parameters: params_a,
        device_targets: vec!["router-1".into()],
        confidence_score: 0.97,
        context: HashMap::new(),
    });
    print_result("show_interfaces", &result_a);

    // B — low-impact write missing its required parameter: BLOCK.
    let result_b = engine.evaluate(EvaluationRequest {
        tool_name: "configure_vlan".into(),
        parameters: HashMap::new(),
        device_targets: vec!["switch-1".into()],
        confidence_score: 0.9,
        context: HashMap::new(),
    });
    print_result("configure_vlan (missing vlan_id)", &result_b);

    // C — destructive action at less-than-perfect confidence: ESCALATE.
    let result_c = engine.evaluate(EvaluationRequest {
        tool_name: "factory_reset".into(),
        parameters: HashMap::new(),
        device_targets: vec!["switch-1".into()],
        confidence_score: 0.999,
        context: HashMap::new(),
    });
    print_result("factory_reset", &result_c);

    // D — unknown tool: BLOCK, fail-closed.
    let result_d = engine.evaluate(EvaluationRequest {
        tool_name: "reboot_fleet".into(),
        parameters: HashMap::new(),
        device_targets: vec!["switch-1".into()],
        confidence_score: 0.99,
        context: HashMap::new(),
    });
    print_result("reboot_fleet (not catalogued)", &result_d);

    // -----------------------------------------------------------------------
    // 3. Approve the pending escalation from C
    // -----------------------------------------------------------------------
    if let Some(escalation_id) = result_c.escalation_id {
        println!("\nApproving escalation {escalation_id}...");
        let approved = engine.escalations().transition(
            &escalation_id,
            sna_pdp_core::types::EscalationState::Pending,
            sna_pdp_core::types::EscalationState::Approved,
            Some("noc-lead".into()),
        );
        println!("  new state: {:?}", approved.map(|record| record.state));
    }

    // -----------------------------------------------------------------------
    // 4. Query the audit log
    // -----------------------------------------------------------------------
    println!("\nAudit log (all entries):");
    let page = engine.audit().query(&AuditFilter::default(), Pagination::default());
    println!("  total={} has_next={}", page.total, page.has_next);
    for entry in &page.items {
        println!(
            "  [{}] tool={} verdict={} reason={}",
            entry.external_id,
            entry.result.tool_name,
            entry.result.verdict.display_name(),
            entry.result.reason
        );
    }

    println!("\nDone.");
}

fn print_result(label: &str, result: &sna_pdp_core::types::EvaluationResult) {
    println!(
        "[{}] verdict={} tier={} reason={}",
        label,
        result.verdict.display_name(),
        result.risk_tier_label(),
        result.reason
    );
    println!(
        "  confidence={:.3} threshold={:.3} eas={:.3}\n",
        result.confidence_score, result.confidence_threshold, result.eas_snapshot
    );
}
