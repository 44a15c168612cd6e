// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Escalation Registry.
//!
//! Tracks [`EscalationRecord`] state transitions for ESCALATE verdicts that
//! require a human decision. Transitions are compare-and-set: a caller names
//! the state it expects to be transitioning *from*, and a stale expectation
//! is reported as [`EscalationError::Conflict`] rather than silently
//! overwriting a concurrent decision.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::types::{EscalationRecord, EscalationState};

/// Errors produced by [`EscalationRegistry`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationError {
    /// No escalation exists with the given id.
    NotFound(String),
    /// The expected current state did not match the stored state.
    Conflict {
        /// Escalation id involved in the conflicting transition.
        escalation_id: String,
        /// State the caller expected.
        expected: EscalationState,
        /// State actually stored.
        actual: EscalationState,
    },
    /// The escalation is already in a terminal state and cannot transition
    /// further (terminal: Approved, Rejected, Expired).
    AlreadyTerminal(String),
}

impl core::fmt::Display for EscalationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EscalationError::NotFound(id) => write!(f, "no escalation with id '{id}'"),
            EscalationError::Conflict { escalation_id, expected, actual } => write!(
                f,
                "escalation '{escalation_id}' expected state {expected:?} but found {actual:?}"
            ),
            EscalationError::AlreadyTerminal(id) => {
                write!(f, "escalation '{id}' is already in a terminal state")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EscalationError {}

/// Pluggable persistence for [`EscalationRecord`]s.
pub trait EscalationStore: Send + Sync {
    /// Insert a new escalation record. Caller guarantees `escalation_id`
    /// uniqueness (generated by the registry, not user input).
    fn insert(&mut self, record: EscalationRecord);

    /// Fetch a record by id.
    fn get(&self, escalation_id: &str) -> Option<EscalationRecord>;

    /// Replace a record in place. Caller has already validated the
    /// transition; this is a raw write.
    fn replace(&mut self, record: EscalationRecord);

    /// All records currently in `Pending` state.
    fn pending(&self) -> Vec<EscalationRecord>;
}

/// In-memory [`EscalationStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryEscalationStore {
    records: hashbrown::HashMap<String, EscalationRecord>,
}

impl InMemoryEscalationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EscalationStore for InMemoryEscalationStore {
    fn insert(&mut self, record: EscalationRecord) {
        self.records.insert(record.escalation_id.clone(), record);
    }

    fn get(&self, escalation_id: &str) -> Option<EscalationRecord> {
        self.records.get(escalation_id).cloned()
    }

    fn replace(&mut self, record: EscalationRecord) {
        self.records.insert(record.escalation_id.clone(), record);
    }

    fn pending(&self) -> Vec<EscalationRecord> {
        self.records
            .values()
            .filter(|record| record.state == EscalationState::Pending)
            .cloned()
            .collect()
    }
}

/// Registry orchestrating CAS transitions over an [`EscalationStore`].
pub struct EscalationRegistry<S: EscalationStore> {
    store: S,
}

impl<S: EscalationStore> EscalationRegistry<S> {
    /// Wrap `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a new pending escalation for `reason`, timestamped `created_at_ms`.
    pub fn create(&mut self, escalation_id: String, reason: String, created_at_ms: u64) -> EscalationRecord {
        let record = EscalationRecord {
            escalation_id,
            created_at_ms,
            state: EscalationState::Pending,
            approver: None,
            reason,
        };
        self.store.insert(record.clone());
        record
    }

    /// Attempt a compare-and-set transition: only succeeds if the stored
    /// state equals `expected`.
    pub fn transition(
        &mut self,
        escalation_id: &str,
        expected: EscalationState,
        next: EscalationState,
        approver: Option<String>,
    ) -> Result<EscalationRecord, EscalationError> {
        let mut record = self
            .store
            .get(escalation_id)
            .ok_or_else(|| EscalationError::NotFound(escalation_id.to_string()))?;

        if record.state.is_terminal() {
            return Err(EscalationError::AlreadyTerminal(escalation_id.to_string()));
        }

        if record.state != expected {
            return Err(EscalationError::Conflict {
                escalation_id: escalation_id.to_string(),
                expected,
                actual: record.state,
            });
        }

        record.state = next;
        if approver.is_some() {
            record.approver = approver;
        }
        self.store.replace(record.clone());
        Ok(record)
    }

    /// Transition every still-pending escalation at or beyond `cutoff_ms`
    /// to `Expired`. Returns the number of records expired. The boundary
    /// is inclusive: an escalation created exactly at the TTL's edge has
    /// fully elapsed, not almost elapsed.
    pub fn expire_older_than(&mut self, cutoff_ms: u64) -> usize {
        let stale: Vec<String> = self
            .store
            .pending()
            .into_iter()
            .filter(|record| record.created_at_ms <= cutoff_ms)
            .map(|record| record.escalation_id)
            .collect();

        let mut expired = 0usize;
        for escalation_id in stale {
            if self
                .transition(&escalation_id, EscalationState::Pending, EscalationState::Expired, None)
                .is_ok()
            {
                expired += 1;
            }
        }
        expired
    }

    /// Count escalations currently pending.
    pub fn pending_count(&self) -> usize {
        self.store.pending().len()
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_approve() {
        let mut registry = EscalationRegistry::new(InMemoryEscalationStore::new());
        registry.create("esc-1".into(), "destructive action".into(), 1_000);
        let approved = registry
            .transition(
                "esc-1",
                EscalationState::Pending,
                EscalationState::Approved,
                Some("alice".into()),
            )
            .unwrap();
        assert_eq!(approved.state, EscalationState::Approved);
        assert_eq!(approved.approver.as_deref(), Some("alice"));
    }

    #[test]
    fn stale_cas_reports_conflict() {
        let mut registry = EscalationRegistry::new(InMemoryEscalationStore::new());
        registry.create("esc-1".into(), "reason".into(), 1_000);
        registry
            .transition("esc-1", EscalationState::Pending, EscalationState::Rejected, None)
            .unwrap();

        let result = registry.transition(
            "esc-1",
            EscalationState::Pending,
            EscalationState::Approved,
            None,
        );
        assert!(matches!(result, Err(EscalationError::AlreadyTerminal(_))));
    }

    #[test]
    fn transition_unknown_id_not_found() {
        let mut registry = EscalationRegistry::new(InMemoryEscalationStore::new());
        let result = registry.transition(
            "missing",
            EscalationState::Pending,
            EscalationState::Approved,
            None,
        );
        assert!(matches!(result, Err(EscalationError::NotFound(_))));
    }

    #[test]
    fn expire_older_than_sweeps_stale_pending() {
        let mut registry = EscalationRegistry::new(InMemoryEscalationStore::new());
        registry.create("old".into(), "reason".into(), 1_000);
        registry.create("fresh".into(), "reason".into(), 9_000);

        let expired = registry.expire_older_than(5_000);
        assert_eq!(expired, 1);
        assert_eq!(registry.store().get("old").unwrap().state, EscalationState::Expired);
        assert_eq!(registry.store().get("fresh").unwrap().state, EscalationState::Pending);
    }

    #[test]
    fn expire_older_than_is_inclusive_of_the_exact_cutoff() {
        let mut registry = EscalationRegistry::new(InMemoryEscalationStore::new());
        registry.create("at-cutoff".into(), "reason".into(), 5_000);

        let expired = registry.expire_older_than(5_000);
        assert_eq!(expired, 1);
        assert_eq!(registry.store().get("at-cutoff").unwrap().state, EscalationState::Expired);
    }

    #[test]
    fn pending_count_reflects_store() {
        let mut registry = EscalationRegistry::new(InMemoryEscalationStore::new());
        registry.create("a".into(), "r".into(), 0);
        registry.create("b".into(), "r".into(), 0);
        assert_eq!(registry.pending_count(), 2);
        registry
            .transition("a", EscalationState::Pending, EscalationState::Approved, None)
            .unwrap();
        assert_eq!(registry.pending_count(), 1);
    }
}
