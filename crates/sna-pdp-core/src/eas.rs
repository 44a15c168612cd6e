// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Earned Autonomy Score (EAS) Calculator.
//!
//! The EAS is a rolling measure of how often an agent's recent proposals
//! were permitted outright. A high EAS lets the [`crate::policy::EasCurve`]
//! lower the effective confidence threshold; an agent with no history, or a
//! history full of escalations and blocks, gets no such relief.

use crate::audit::VerdictStore;
use crate::types::AuditEntry;

/// Default sliding-window size for EAS computation, in days.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Stateless EAS computation over a [`VerdictStore`]'s recent history.
///
/// Mirrors the ratio-of-permits-to-total window computation: an empty
/// window (no evaluations at all in the lookback period) scores `0.0`
/// rather than, say, `1.0` — an agent earns autonomy through observed
/// permits, it is not presumed trustworthy by default.
#[derive(Debug, Clone, Copy)]
pub struct EasCalculator {
    window_days: u64,
}

impl Default for EasCalculator {
    fn default() -> Self {
        Self { window_days: DEFAULT_WINDOW_DAYS }
    }
}

impl EasCalculator {
    /// Build a calculator with a custom lookback window.
    pub fn with_window_days(window_days: u64) -> Self {
        Self { window_days }
    }

    /// Recompute the EAS as of `now_ms`, scanning `store` for entries within
    /// the configured window.
    ///
    /// Returns `0.0` for an empty window. Otherwise `permits / total` over
    /// the window, restricted to `[0.0, 1.0]` by construction since both
    /// counters are non-negative and `permits <= total`.
    pub fn recompute<S: VerdictStore>(&self, store: &S, now_ms: u64) -> f64 {
        let since_ms = now_ms.saturating_sub(self.window_days.saturating_mul(MS_PER_DAY));
        let (permit, escalate, block) = store.count_by_verdict_since(since_ms);
        let total = permit + escalate + block;
        if total == 0 {
            return 0.0;
        }
        permit as f64 / total as f64
    }

    /// Recompute EAS directly from a slice of entries already fetched by the
    /// caller (used where the caller already holds the window's entries and
    /// would rather not re-scan the store, e.g. a compliance report).
    pub fn recompute_from_entries(&self, entries: &[AuditEntry]) -> f64 {
        if entries.is_empty() {
            return 0.0;
        }
        let permits = entries
            .iter()
            .filter(|entry| entry.result.verdict == crate::types::Verdict::Permit)
            .count();
        permits as f64 / entries.len() as f64
    }
}
