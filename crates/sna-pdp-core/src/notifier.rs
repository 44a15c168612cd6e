// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Notifier contract.
//!
//! The engine never sends notifications itself — it only constructs
//! [`NotificationEvent`]s for ESCALATE verdicts and validator failures and
//! hands them to a caller-supplied [`Notifier`]. Backends (chat webhooks,
//! email, pager integrations) live outside this crate; this module defines
//! only the trait and a dispatch-to-all composite, mirroring the abstract
//! notifier protocol pattern.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

pub use crate::types::NotificationEvent;

/// Error returned by a notifier backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError {
    /// Human-readable failure reason from the backend.
    pub reason: String,
}

impl core::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "notification failed: {}", self.reason)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NotifyError {}

/// A single notification backend.
///
/// Implementations are responsible for their own delivery guarantees and
/// for incrementing whatever external metric counts deliveries — the core
/// only counts `NotificationEvent` construction, not delivery outcome.
pub trait Notifier: Send + Sync {
    /// Deliver `event`. Backends that cannot deliver synchronously should
    /// enqueue and return `Ok(())`, reporting failures via their own
    /// channel rather than blocking the caller.
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Dispatches to every registered backend without short-circuiting: one
/// backend's failure does not prevent the others from being attempted.
pub struct CompositeNotifier {
    backends: Vec<Box<dyn Notifier>>,
}

impl CompositeNotifier {
    /// Build a composite over `backends`, invoked in registration order.
    pub fn new(backends: Vec<Box<dyn Notifier>>) -> Self {
        Self { backends }
    }
}

impl Notifier for CompositeNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let mut first_error = None;
        for backend in &self.backends {
            if let Err(error) = backend.notify(event) {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Notifier for CountingNotifier {
        fn notify(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotifyError { reason: "simulated failure".into() })
            } else {
                Ok(())
            }
        }
    }

    fn sample_event() -> NotificationEvent {
        NotificationEvent {
            channel: "ops".into(),
            title: "escalation".into(),
            body: "a destructive action needs approval".into(),
            timestamp_ms: 0,
        }
    }

    #[test]
    fn composite_invokes_all_backends_even_after_failure() {
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let succeeding_calls = Arc::new(AtomicUsize::new(0));
        let failing = CountingNotifier { calls: failing_calls.clone(), fail: true };
        let succeeding = CountingNotifier { calls: succeeding_calls.clone(), fail: false };

        let composite = CompositeNotifier::new(alloc::vec![Box::new(failing), Box::new(succeeding)]);
        let result = composite.notify(&sample_event());

        assert!(result.is_err());
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(succeeding_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn composite_with_no_failures_succeeds() {
        let a = CountingNotifier { calls: Arc::new(AtomicUsize::new(0)), fail: false };
        let b = CountingNotifier { calls: Arc::new(AtomicUsize::new(0)), fail: false };
        let composite = CompositeNotifier::new(alloc::vec![Box::new(a), Box::new(b)]);
        assert!(composite.notify(&sample_event()).is_ok());
    }
}
