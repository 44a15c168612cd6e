// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # sna-pdp-std
//!
//! `std`-only durable storage backends for `sna-pdp-core`.
//!
//! This crate provides [`FileVerdictStore`] and [`FileEscalationStore`],
//! JSON file-backed implementations of the core crate's `VerdictStore` and
//! `EscalationStore` traits, suitable for a single-process PDP service
//! that does not need a full database.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sna_pdp_std::storage::FileVerdictStore;
//! use sna_pdp_core::config::Config;
//! use sna_pdp_core::engine::PolicyEngine;
//! use sna_pdp_std::storage::FileEscalationStore;
//! use sna_pdp_core::policy::{EasCurve, PolicyDocument};
//! use alloc::sync::Arc;
//! extern crate alloc;
//!
//! let verdicts = FileVerdictStore::open("/var/lib/sna-pdp/audit.json")
//!     .expect("failed to open audit store");
//! let escalations = FileEscalationStore::open("/var/lib/sna-pdp/escalations.json")
//!     .expect("failed to open escalation store");
//!
//! let policy = Arc::new(PolicyDocument::new("1", EasCurve::flat(), vec![]));
//! let engine = PolicyEngine::new(Config::default(), policy, verdicts, escalations);
//! ```

pub mod storage;

pub use storage::file::{FileEscalationStore, FileVerdictStore};
