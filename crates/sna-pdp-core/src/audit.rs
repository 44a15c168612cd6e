// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Verdict Store / Audit Log.
//!
//! [`VerdictStore`] is the single persistence interface between the engine
//! and any backing store. This crate ships [`InMemoryVerdictStore`] for
//! development and testing; production implementations (file-based,
//! database, etc.) live in downstream crates so this core crate stays
//! `no_std`-compatible (see [`crate::config_loader`] for the analogous
//! split on the config side).
//!
//! Entries are chained via SHA-256 hashes to form a tamper-evident log —
//! the chain is recording-only, there is no anomaly detection here.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use sha2::{Digest, Sha256};

use crate::types::{AuditEntry, AuditFilter, AuditPage, EvaluationResult, Pagination, Verdict};

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors surfaced by a [`VerdictStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// `external_id` collided with an existing entry.
    Duplicate(String),
    /// The backing store failed for an implementation-specific reason.
    Backend(String),
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageError::Duplicate(id) => write!(f, "duplicate external_id '{id}'"),
            StorageError::Backend(reason) => write!(f, "storage backend error: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}

// ---------------------------------------------------------------------------
// VerdictStore trait
// ---------------------------------------------------------------------------

/// Pluggable append-only persistence for [`AuditEntry`] records.
///
/// Implementations MUST be `Send + Sync` so the engine can be shared across
/// threads when wrapped in `Arc<Mutex<...>>` / `Arc<RwLock<...>>`.
///
/// # Guarantees expected of implementations
///
/// * Entries appear in commit order.
/// * `external_id` is unique; a duplicate insert returns
///   [`StorageError::Duplicate`] rather than overwriting.
/// * Reads are snapshot-consistent within a single call.
pub trait VerdictStore: Send + Sync {
    /// Append an entry. Atomic, durable, crash-safe in a real backend.
    fn append(&mut self, entry: AuditEntry) -> Result<(), StorageError>;

    /// Return the page of entries matching `filter`, most-recent-first,
    /// tiebreak on insertion order (recency of append).
    fn query(&self, filter: &AuditFilter, pagination: Pagination) -> AuditPage;

    /// Count all entries matching `filter`.
    fn count(&self, filter: &AuditFilter) -> usize;

    /// Count entries by verdict, restricted to `timestamp_ms >= since_ms`.
    fn count_by_verdict_since(&self, since_ms: u64) -> (usize, usize, usize);

    /// All entries in append order (oldest first). Used by the EAS
    /// calculator, which needs the raw timeline rather than a page.
    fn all_since(&self, since_ms: u64) -> Vec<AuditEntry>;
}

// ---------------------------------------------------------------------------
// InMemoryVerdictStore
// ---------------------------------------------------------------------------

/// A volatile, heap-allocated [`VerdictStore`] backed by a `Vec`.
///
/// All data lives in process memory and is lost when dropped. Suitable for
/// integration testing; production deployments should use a durable
/// implementation such as `sna-pdp-std`'s file-based store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVerdictStore {
    entries: Vec<AuditEntry>,
}

impl InMemoryVerdictStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(entry: &AuditEntry, filter: &AuditFilter) -> bool {
        if let Some(ref tool_name) = filter.tool_name {
            if &entry.result.tool_name != tool_name {
                return false;
            }
        }
        if let Some(verdict) = filter.verdict {
            if entry.result.verdict != verdict {
                return false;
            }
        }
        if let Some(since_ms) = filter.since_ms {
            if entry.timestamp_ms < since_ms {
                return false;
            }
        }
        if let Some(until_ms) = filter.until_ms {
            if entry.timestamp_ms > until_ms {
                return false;
            }
        }
        true
    }
}

impl VerdictStore for InMemoryVerdictStore {
    fn append(&mut self, entry: AuditEntry) -> Result<(), StorageError> {
        if self.entries.iter().any(|existing| existing.external_id == entry.external_id) {
            return Err(StorageError::Duplicate(entry.external_id));
        }
        self.entries.push(entry);
        Ok(())
    }

    fn query(&self, filter: &AuditFilter, pagination: Pagination) -> AuditPage {
        let pagination = pagination.normalized();

        // Most-recent-first, tiebreak on insertion order: reverse the
        // append-ordered vector, which is already insertion-ordered.
        let mut matched: Vec<&AuditEntry> = self
            .entries
            .iter()
            .rev()
            .filter(|entry| Self::matches(entry, filter))
            .collect();

        let total = matched.len();
        let offset = pagination.offset();
        let items: Vec<AuditEntry> = if offset >= matched.len() {
            Vec::new()
        } else {
            matched
                .drain(offset..)
                .take(pagination.page_size)
                .cloned()
                .collect()
        };

        let has_prev = pagination.page > 1;
        let has_next = offset + items.len() < total;

        AuditPage {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            has_next,
            has_prev,
        }
    }

    fn count(&self, filter: &AuditFilter) -> usize {
        self.entries.iter().filter(|entry| Self::matches(entry, filter)).count()
    }

    fn count_by_verdict_since(&self, since_ms: u64) -> (usize, usize, usize) {
        let mut permit = 0usize;
        let mut escalate = 0usize;
        let mut block = 0usize;
        for entry in self.entries.iter().filter(|entry| entry.timestamp_ms >= since_ms) {
            match entry.result.verdict {
                Verdict::Permit => permit += 1,
                Verdict::Escalate => escalate += 1,
                Verdict::Block => block += 1,
            }
        }
        (permit, escalate, block)
    }

    fn all_since(&self, since_ms: u64) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.timestamp_ms >= since_ms)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// AuditLog — hash-chained writer wrapping a VerdictStore
// ---------------------------------------------------------------------------

/// Wraps a [`VerdictStore`] with hash-chain bookkeeping and the
/// external_id generation scheme.
///
/// `AuditLog` is the only component that constructs [`AuditEntry`] values —
/// callers (the [`PolicyEngine`](crate::engine::PolicyEngine)) hand it an
/// [`EvaluationResult`] and get back the persisted entry.
pub struct AuditLog<S: VerdictStore> {
    store: S,
    last_hash: String,
}

impl<S: VerdictStore> AuditLog<S> {
    /// Wrap `store` with an empty hash chain (genesis = 64 zeros).
    pub fn new(store: S) -> Self {
        Self { store, last_hash: "0".repeat(64) }
    }

    /// Append an [`EvaluationResult`] to the chain.
    ///
    /// `external_id` is generated here (std: UUID v4; no_std: a
    /// deterministic FNV-1a-derived identifier seeded by the chain tip and
    /// entry count, since no_std has no portable random source).
    pub fn log(
        &mut self,
        result: EvaluationResult,
        timestamp_ms: u64,
        correlation_id: Option<String>,
    ) -> Result<AuditEntry, StorageError> {
        let external_id = generate_external_id(&self.last_hash, timestamp_ms);
        let prev_hash = self.last_hash.clone();
        let hash = compute_entry_hash(&external_id, &result, timestamp_ms, &prev_hash);

        let entry = AuditEntry {
            external_id,
            timestamp_ms,
            correlation_id,
            result,
            hash: hash.clone(),
            prev_hash,
        };

        self.store.append(entry.clone())?;
        self.last_hash = hash;
        Ok(entry)
    }

    /// Query the underlying store.
    pub fn query(&self, filter: &AuditFilter, pagination: Pagination) -> AuditPage {
        self.store.query(filter, pagination)
    }

    /// Count entries matching `filter`.
    pub fn count(&self, filter: &AuditFilter) -> usize {
        self.store.count(filter)
    }

    /// Hash of the most recently appended entry.
    pub fn chain_tip(&self) -> &str {
        &self.last_hash
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Compute a SHA-256 hex digest covering `external_id`, the serialised
/// outcome, `timestamp_ms`, and `prev_hash`, so tampering with any field
/// breaks the chain.
fn compute_entry_hash(
    external_id: &str,
    result: &EvaluationResult,
    timestamp_ms: u64,
    prev_hash: &str,
) -> String {
    let payload = alloc::format!(
        "{prev_hash}:{external_id}:{}:{}:{timestamp_ms}:{:.6}",
        result.tool_name,
        result.verdict.display_name(),
        result.confidence_score,
    );
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|byte| alloc::format!("{byte:02x}")).collect()
}

#[cfg(feature = "std")]
fn generate_external_id(_prev_hash: &str, _timestamp_ms: u64) -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(not(feature = "std"))]
fn generate_external_id(prev_hash: &str, timestamp_ms: u64) -> String {
    let seed = alloc::format!("{prev_hash}:{timestamp_ms}");
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(16).map(|byte| alloc::format!("{byte:02x}")).collect::<Vec<_>>().join("").to_string()
}
