// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Engine-tuning configuration, distinct from the Policy Document (the
//! tool catalog) loaded via [`crate::config_loader`].

/// Engine-wide tuning knobs. Unlike [`crate::policy::PolicyDocument`],
/// `Config` rarely changes across deploys and is typically built once at
/// process start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Sliding window, in days, used by the EAS calculator.
    pub eas_window_days: u64,
    /// How long a pending escalation may sit before
    /// [`crate::escalation::EscalationRegistry::expire_older_than`]
    /// considers it stale, in milliseconds.
    pub escalation_ttl_ms: u64,
    /// Maximum magnitude the EAS curve may shift a threshold by, clamped
    /// on top of whatever the curve's own breakpoints specify — a defense
    /// against a misconfigured curve collapsing the threshold to zero.
    pub max_threshold_delta: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            eas_window_days: crate::eas::DEFAULT_WINDOW_DAYS,
            escalation_ttl_ms: 24 * 60 * 60 * 1000,
            max_threshold_delta: 0.3,
        }
    }
}
