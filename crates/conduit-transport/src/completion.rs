//! Single-assignment lifecycle completion signal.

use std::sync::Arc;

use tokio::sync::watch;

use conduit_core::errors::TransportError;

/// Terminal outcome of one pump.
#[derive(Clone, Debug)]
pub enum PumpOutcome {
    /// Clean shutdown — normal disconnect or cooperative cancellation.
    Clean,
    /// The pump faulted.
    Faulted(Arc<TransportError>),
}

impl PumpOutcome {
    /// Whether this is the clean resolution.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// The fault, if any.
    pub fn fault(&self) -> Option<&Arc<TransportError>> {
        match self {
            Self::Clean => None,
            Self::Faulted(err) => Some(err),
        }
    }
}

/// Single-assignment future marking pump termination.
///
/// Exactly one resolution ever takes effect. Multiple terminal events
/// (on-close racing a receive fault, for instance) legitimately race at the
/// boundary, so later `resolve` calls are defensive no-ops rather than
/// contract violations that crash. Clones share the same cell; any number of
/// tasks may `wait()`.
#[derive(Clone)]
pub struct CompletionSignal {
    cell: Arc<watch::Sender<Option<PumpOutcome>>>,
}

impl CompletionSignal {
    /// Fresh, unresolved signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { cell: Arc::new(tx) }
    }

    /// Resolve the signal. Returns `true` if this call won the assignment,
    /// `false` if it was already resolved.
    pub fn resolve(&self, outcome: PumpOutcome) -> bool {
        let mut outcome = Some(outcome);
        self.cell.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = outcome.take();
                true
            } else {
                false
            }
        })
    }

    /// Resolve cleanly.
    pub fn resolve_clean(&self) -> bool {
        self.resolve(PumpOutcome::Clean)
    }

    /// Resolve with a fault.
    pub fn resolve_fault(&self, error: Arc<TransportError>) -> bool {
        self.resolve(PumpOutcome::Faulted(error))
    }

    /// The outcome, if resolved.
    pub fn outcome(&self) -> Option<PumpOutcome> {
        self.cell.borrow().clone()
    }

    /// Whether the signal has resolved.
    pub fn is_resolved(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Suspend until the signal resolves.
    pub async fn wait(&self) -> PumpOutcome {
        let mut rx = self.cell.subscribe();
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            // The sender lives in `self`, so `changed` cannot observe a
            // dropped channel here.
            if rx.changed().await.is_err() {
                return PumpOutcome::Clean;
            }
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::errors::{SendError, TransportError};
    use std::time::Duration;
    use tokio::time::timeout;

    fn fault() -> Arc<TransportError> {
        Arc::new(TransportError::Send(SendError::Closed))
    }

    #[test]
    fn first_resolution_wins() {
        let signal = CompletionSignal::new();
        assert!(signal.resolve_clean());
        assert!(!signal.resolve_fault(fault()));
        assert!(signal.outcome().unwrap().is_clean());
    }

    #[test]
    fn fault_then_clean_stays_faulted() {
        let signal = CompletionSignal::new();
        assert!(signal.resolve_fault(fault()));
        assert!(!signal.resolve_clean());
        assert!(signal.outcome().unwrap().fault().is_some());
    }

    #[tokio::test]
    async fn waiters_observe_resolution() {
        let signal = CompletionSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(signal.resolve_clean());
        let outcome = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn wait_after_resolution_returns_immediately() {
        let signal = CompletionSignal::new();
        let _ = signal.resolve_clean();
        let outcome = timeout(Duration::from_millis(50), signal.wait())
            .await
            .unwrap();
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn racing_resolutions_assign_exactly_once() {
        let signal = CompletionSignal::new();
        let mut tasks = Vec::new();
        for i in 0..32 {
            let signal = signal.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    signal.resolve_clean()
                } else {
                    signal.resolve_fault(fault())
                }
            }));
        }
        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(signal.is_resolved());
    }
}
