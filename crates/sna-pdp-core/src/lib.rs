// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # sna-pdp-core
//!
//! Policy decision point for network-automation agent tool calls.
//!
//! This crate is `no_std`-compatible (requires `alloc`) for its pure
//! decision modules. Enable the `std` feature (on by default) to gain
//! the sanitizer, URL safety validator, and the rest of the library.
//!
//! ## Architecture
//!
//! ```text
//! PolicyEngine<V: VerdictStore, E: EscalationStore>
//!   ├── PolicyDocument       — versioned tool catalog + EAS curve
//!   ├── EasCalculator        — rolling PERMIT ratio over the audit log
//!   ├── AuditLog<V>          — hash-chained, append-only decision log
//!   └── EscalationRegistry<E> — CAS state machine for ESCALATE verdicts
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use sna_pdp_core::{
//!     audit::InMemoryVerdictStore,
//!     config::Config,
//!     escalation::InMemoryEscalationStore,
//!     engine::PolicyEngine,
//!     policy::{EasCurve, PolicyDocument, ToolSpec},
//!     types::{EvaluationRequest, RiskTier},
//! };
//! use alloc::sync::Arc;
//! use hashbrown::HashMap;
//! extern crate alloc;
//!
//! let policy = Arc::new(PolicyDocument::new(
//!     "1",
//!     EasCurve::flat(),
//!     vec![ToolSpec {
//!         name: "show_interfaces".into(),
//!         risk_tier: RiskTier::Read,
//!         base_threshold: 0.3,
//!         max_targets: 50,
//!         requires_audit: true,
//!         requires_senior_approval: false,
//!         parameter_constraint: None,
//!     }],
//! ));
//!
//! let mut engine = PolicyEngine::new(
//!     Config::default(),
//!     policy,
//!     InMemoryVerdictStore::new(),
//!     InMemoryEscalationStore::new(),
//! );
//! let result = engine.evaluate(EvaluationRequest {
//!     tool_name: "show_interfaces".into(),
//!     parameters: HashMap::new(),
//!     device_targets: vec!["router-1".into()],
//!     confidence_score: 0.95,
//!     context: HashMap::new(),
//! });
//! assert_eq!(result.verdict.display_name(), "PERMIT");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod audit;
pub mod config;
pub mod diff;
pub mod eas;
pub mod engine;
pub mod escalation;
pub mod notifier;
pub mod policy;
pub mod types;
pub mod validator;

// Requires `std` — pulls in `regex` and synchronous DNS resolution.
#[cfg(feature = "std")]
pub mod sanitizer;
#[cfg(feature = "std")]
pub mod url_safety;

// Async engine — only compiled when the "async" feature is enabled.
// Requires the "std" feature (Tokio cannot run in no_std environments).
#[cfg(feature = "async")]
pub mod async_engine;

// Config loader — TOML policy document loading.
// Only compiled when the "config-loader" feature is enabled.
#[cfg(feature = "config-loader")]
pub mod config_loader;

// Re-export the most commonly used items at the crate root so consumers can
// write `use sna_pdp_core::PolicyEngine;` instead of the fully qualified path.
pub use engine::PolicyEngine;
pub use policy::PolicyDocument;
pub use types::{
    AuditEntry, AuditFilter, AuditPage, ComplianceReport, EscalationRecord, EscalationState,
    EvaluationRequest, EvaluationResult, ExecutionEntry, Pagination, RiskTier, ValidationResult,
    ValidationStatus, Verdict,
};

// Re-export the async engine at the crate root for ergonomic imports.
#[cfg(feature = "async")]
pub use async_engine::AsyncPolicyEngine;

// Re-export config loader entry points at the crate root.
#[cfg(feature = "config-loader")]
pub use config_loader::{load_policy_document, load_policy_document_from_str, ConfigError};
