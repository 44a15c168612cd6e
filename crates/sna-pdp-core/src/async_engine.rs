// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Async wrapper over [`PolicyEngine`], gated behind the `async` feature.
//!
//! The whole engine is wrapped in a single `tokio::sync::RwLock`, and the
//! evaluation order exactly matches the synchronous engine — this wrapper
//! changes *how* the state is accessed, never *what* is computed.

#![cfg(feature = "async")]

use alloc::string::String;
use alloc::sync::Arc;

use tokio::sync::RwLock;

use crate::audit::{AuditPage, VerdictStore};
use crate::config::Config;
use crate::escalation::{EscalationError, EscalationRecord, EscalationStore};
use crate::engine::PolicyEngine;
use crate::policy::PolicyDocument;
use crate::types::{AuditFilter, EscalationState, EvaluationRequest, EvaluationResult, Pagination};

/// Thread-safe async handle onto a [`PolicyEngine`].
///
/// A single `RwLock` guards the whole engine rather than one lock per
/// manager: `evaluate` touches the policy document, the EAS calculator,
/// the audit log, and the escalation registry in one atomic step, so
/// splitting the lock finer would only reintroduce the torn-read risk the
/// sync engine's `Arc`-swap design avoids.
pub struct AsyncPolicyEngine<V: VerdictStore, E: EscalationStore> {
    inner: RwLock<PolicyEngine<V, E>>,
}

impl<V: VerdictStore, E: EscalationStore> AsyncPolicyEngine<V, E> {
    /// Wrap a [`PolicyEngine`] for concurrent async access.
    pub fn new(config: Config, policy: Arc<PolicyDocument>, verdict_store: V, escalation_store: E) -> Self {
        Self { inner: RwLock::new(PolicyEngine::new(config, policy, verdict_store, escalation_store)) }
    }

    /// Evaluate a request. Takes the write lock for the whole pipeline,
    /// since evaluation appends to the audit log and may create an
    /// escalation.
    pub async fn evaluate(&self, request: EvaluationRequest) -> EvaluationResult {
        let mut engine = self.inner.write().await;
        engine.evaluate(request)
    }

    /// Hot-swap the policy document.
    pub async fn reload_policy(&self, policy: Arc<PolicyDocument>) {
        let mut engine = self.inner.write().await;
        engine.reload_policy(policy);
    }

    /// Query the audit log.
    pub async fn query_audit(&self, filter: AuditFilter, pagination: Pagination) -> AuditPage {
        let engine = self.inner.read().await;
        engine.audit().query(&filter, pagination)
    }

    /// Transition an escalation's state.
    pub async fn transition_escalation(
        &self,
        escalation_id: String,
        expected: EscalationState,
        next: EscalationState,
        approver: Option<String>,
    ) -> Result<EscalationRecord, EscalationError> {
        let mut engine = self.inner.write().await;
        engine.escalations().transition(&escalation_id, expected, next, approver)
    }

    /// Sweep expired escalations.
    pub async fn expire_escalations(&self, ttl_ms: u64) -> usize {
        let mut engine = self.inner.write().await;
        engine.expire_escalations(ttl_ms)
    }

    /// Current EAS, recomputed against the live audit log using the
    /// engine's configured window.
    pub async fn current_eas(&self, now_ms: u64) -> f64 {
        let engine = self.inner.read().await;
        engine.eas().recompute(engine.audit().store(), now_ms)
    }
}
