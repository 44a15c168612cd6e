// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! File-based JSON storage backends.
//!
//! [`FileVerdictStore`] and [`FileEscalationStore`] each persist their
//! state to a single JSON file on disk. Every mutation flushes the file
//! atomically (write-rename) so a crash mid-write never corrupts existing
//! data.
//!
//! ## Caveats
//!
//! * Both stores hold their full state in memory and flush on every
//!   mutation. Not intended for high-frequency write workloads.
//! * Concurrent access from multiple processes is not supported — use a
//!   database-backed implementation for multi-process deployments.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sna_pdp_core::audit::{StorageError, VerdictStore};
use sna_pdp_core::escalation::EscalationStore;
use sna_pdp_core::types::{AuditEntry, AuditFilter, AuditPage, EscalationRecord, Pagination};

fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, format!("JSON serialization error: {error}")))?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn read_json_or_default<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> io::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, format!("JSON parse error: {error}")))
}

// ---------------------------------------------------------------------------
// FileVerdictStore
// ---------------------------------------------------------------------------

/// A file-backed [`VerdictStore`] that persists entries as a JSON array.
///
/// # Examples
///
/// ```rust,no_run
/// use sna_pdp_std::storage::file::FileVerdictStore;
///
/// let store = FileVerdictStore::open("/tmp/sna-pdp-audit.json")
///     .expect("could not open audit store");
/// ```
pub struct FileVerdictStore {
    path: PathBuf,
    entries: Vec<AuditEntry>,
}

impl FileVerdictStore {
    /// Open an existing JSON file, or start with an empty log if the path
    /// does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = read_json_or_default(&path)?;
        Ok(Self { path, entries })
    }

    /// Flush current state to disk via write-rename.
    pub fn flush(&self) -> io::Result<()> {
        atomic_write_json(&self.path, &self.entries)
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

impl VerdictStore for FileVerdictStore {
    fn append(&mut self, entry: AuditEntry) -> Result<(), StorageError> {
        if self.entries.iter().any(|existing| existing.external_id == entry.external_id) {
            return Err(StorageError::Duplicate(entry.external_id));
        }
        self.entries.push(entry);
        // Best-effort durability: a flush failure here is reported as a
        // backend error rather than silently dropped, since a compliance
        // audit log that silently loses writes defeats its own purpose.
        self.flush().map_err(|error| StorageError::Backend(error.to_string()))
    }

    fn query(&self, filter: &AuditFilter, pagination: Pagination) -> AuditPage {
        let pagination = pagination.normalized();
        let mut matched: Vec<&AuditEntry> =
            self.entries.iter().rev().filter(|entry| Self::matches(entry, filter)).collect();

        let total = matched.len();
        let offset = pagination.offset();
        let items: Vec<AuditEntry> = if offset >= matched.len() {
            Vec::new()
        } else {
            matched.drain(offset..).take(pagination.page_size).cloned().collect()
        };

        let has_prev = pagination.page > 1;
        let has_next = offset + items.len() < total;

        AuditPage { items, total, page: pagination.page, page_size: pagination.page_size, has_next, has_prev }
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
                sna_pdp_core::types::Verdict::Permit => permit += 1,
                sna_pdp_core::types::Verdict::Escalate => escalate += 1,
                sna_pdp_core::types::Verdict::Block => block += 1,
            }
        }
        (permit, escalate, block)
    }

    fn all_since(&self, since_ms: u64) -> Vec<AuditEntry> {
        self.entries.iter().filter(|entry| entry.timestamp_ms >= since_ms).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// FileEscalationStore
// ---------------------------------------------------------------------------

/// A file-backed [`EscalationStore`] that persists records keyed by
/// `escalation_id`.
pub struct FileEscalationStore {
    path: PathBuf,
    records: HashMap<String, EscalationRecord>,
}

impl FileEscalationStore {
    /// Open an existing JSON file, or start empty.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = read_json_or_default(&path)?;
        Ok(Self { path, records })
    }

    /// Flush current state to disk via write-rename.
    pub fn flush(&self) -> io::Result<()> {
        atomic_write_json(&self.path, &self.records)
    }
}

impl EscalationStore for FileEscalationStore {
    fn insert(&mut self, record: EscalationRecord) {
        self.records.insert(record.escalation_id.clone(), record);
        let _ = self.flush();
    }

    fn get(&self, escalation_id: &str) -> Option<EscalationRecord> {
        self.records.get(escalation_id).cloned()
    }

    fn replace(&mut self, record: EscalationRecord) {
        self.records.insert(record.escalation_id.clone(), record);
        let _ = self.flush();
    }

    fn pending(&self) -> Vec<EscalationRecord> {
        self.records
            .values()
            .filter(|record| record.state == sna_pdp_core::types::EscalationState::Pending)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sna_pdp_core::types::{EscalationState, EvaluationResult, Verdict};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sna-pdp-std-test-{name}-{}.json", std::process::id()))
    }

    fn sample_result() -> EvaluationResult {
        EvaluationResult {
            verdict: Verdict::Permit,
            risk_tier: None,
            tool_name: "ping".to_string(),
            reason: "test".to_string(),
            confidence_score: 0.9,
            confidence_threshold: 0.5,
            device_count: 1,
            requires_audit: true,
            requires_senior_approval: false,
            escalation_id: None,
            policy_version: "1".to_string(),
            eas_snapshot: 0.0,
        }
    }

    #[test]
    fn verdict_store_survives_reopen() {
        let path = temp_path("verdicts");
        let _ = std::fs::remove_file(&path);

        {
            let mut store = FileVerdictStore::open(&path).unwrap();
            store
                .append(AuditEntry {
                    external_id: "e1".to_string(),
                    timestamp_ms: 1,
                    correlation_id: None,
                    result: sample_result(),
                    hash: "h".to_string(),
                    prev_hash: "0".repeat(64),
                })
                .unwrap();
        }

        let reopened = FileVerdictStore::open(&path).unwrap();
        assert_eq!(reopened.count(&AuditFilter::default()), 1);

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("tmp"));
    }

    #[test]
    fn duplicate_external_id_rejected() {
        let path = temp_path("dup");
        let _ = std::fs::remove_file(&path);

        let mut store = FileVerdictStore::open(&path).unwrap();
        let entry = AuditEntry {
            external_id: "dup-1".to_string(),
            timestamp_ms: 1,
            correlation_id: None,
            result: sample_result(),
            hash: "h".to_string(),
            prev_hash: "0".repeat(64),
        };
        store.append(entry.clone()).unwrap();
        assert!(store.append(entry).is_err());

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("tmp"));
    }

    #[test]
    fn escalation_store_survives_reopen() {
        let path = temp_path("escalations");
        let _ = std::fs::remove_file(&path);

        {
            let mut store = FileEscalationStore::open(&path).unwrap();
            store.insert(EscalationRecord {
                escalation_id: "esc-1".to_string(),
                created_at_ms: 10,
                state: EscalationState::Pending,
                approver: None,
                reason: "destructive action".to_string(),
            });
        }

        let reopened = FileEscalationStore::open(&path).unwrap();
        assert_eq!(reopened.pending().len(), 1);

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("tmp"));
    }
}
