// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hashbrown::HashMap;

use sna_pdp_core::audit::InMemoryVerdictStore;
use sna_pdp_core::config::Config;
use sna_pdp_core::diff::validate_config_diff;
use sna_pdp_core::eas::EasCalculator;
use sna_pdp_core::engine::PolicyEngine;
use sna_pdp_core::escalation::InMemoryEscalationStore;
use sna_pdp_core::policy::{EasCurve, ToolSpec};
use sna_pdp_core::sanitizer::sanitize_output;
use sna_pdp_core::types::{EvaluationRequest, RiskTier};
use sna_pdp_core::PolicyDocument;

fn sample_policy() -> Arc<PolicyDocument> {
    Arc::new(PolicyDocument::new(
        "1",
        EasCurve::new(vec![(0.0, 0.0), (1.0, -0.2)]),
        vec![
            ToolSpec {
                name: "show_interfaces".to_string(),
                risk_tier: RiskTier::Read,
                base_threshold: 0.3,
                max_targets: 50,
                requires_audit: true,
                requires_senior_approval: false,
                parameter_constraint: None,
            },
            ToolSpec {
                name: "configure_vlan".to_string(),
                risk_tier: RiskTier::LowWrite,
                base_threshold: 0.6,
                max_targets: 10,
                requires_audit: true,
                requires_senior_approval: false,
                parameter_constraint: None,
            },
        ],
    ))
}

fn sample_request() -> EvaluationRequest {
    EvaluationRequest {
        tool_name: "show_interfaces".to_string(),
        parameters: HashMap::new(),
        device_targets: vec!["router-1".to_string(), "router-2".to_string()],
        confidence_score: 0.9,
        context: HashMap::new(),
    }
}

fn full_evaluation(c: &mut Criterion) {
    let mut engine =
        PolicyEngine::new(Config::default(), sample_policy(), InMemoryVerdictStore::new(), InMemoryEscalationStore::new());
    c.bench_function("full_evaluation", |b| {
        b.iter(|| black_box(engine.evaluate(black_box(sample_request()))))
    });
}

fn eas_recompute(c: &mut Criterion) {
    let mut engine =
        PolicyEngine::new(Config::default(), sample_policy(), InMemoryVerdictStore::new(), InMemoryEscalationStore::new());
    for _ in 0..1000 {
        engine.evaluate(sample_request());
    }
    let calculator = EasCalculator::default();
    c.bench_function("eas_recompute_1000_entries", |b| {
        b.iter(|| black_box(calculator.recompute(engine.audit().store(), black_box(u64::MAX / 2))))
    });
}

fn semantic_diff(c: &mut Criterion) {
    let before = "interface Gi0/1\n status up\nhostname r1\nvlan 10\n name old".repeat(20);
    let after = "interface Gi0/1\n status down\nhostname r1\nvlan 20\n name new".repeat(20);
    c.bench_function("semantic_diff", |b| {
        b.iter(|| black_box(validate_config_diff("configure_vlan", Some(black_box(&before)), Some(black_box(&after)))))
    });
}

fn sanitizer_pass(c: &mut Criterion) {
    let input = "password 7 094F471A1A0A\nsnmp-server community PUBLIC\ninterface Gi0/1".repeat(50);
    c.bench_function("sanitize_output", |b| b.iter(|| black_box(sanitize_output(black_box(&input)))));
}

criterion_group!(benches, full_evaluation, eas_recompute, semantic_diff, sanitizer_pass);
criterion_main!(benches);
