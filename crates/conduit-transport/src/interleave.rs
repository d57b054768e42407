//! Both-complete-or-first-fault coordination of two asynchronous operations.

use std::future::Future;

use futures::future::try_join;

use conduit_core::errors::TransportError;

/// Run `a` and `b` concurrently on one task.
///
/// Resolves `Ok` only when both complete successfully; resolves `Err` as soon
/// as either faults, dropping (cancelling) the other. Neither side waits for
/// the other to start — the pump uses this so the first receive is issued
/// immediately even while a slow `connected` callback is still running.
pub async fn interleave<A, B, T, U>(a: A, b: B) -> Result<(T, U), TransportError>
where
    A: Future<Output = Result<T, TransportError>>,
    B: Future<Output = Result<U, TransportError>>,
{
    try_join(a, b).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use conduit_core::errors::SendError;
    use std::future::pending;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    fn fault() -> TransportError {
        TransportError::Send(SendError::Closed)
    }

    #[tokio::test]
    async fn resolves_when_both_finish() {
        let out = interleave(async { Ok(1) }, async { Ok("two") }).await;
        assert_matches!(out, Ok((1, "two")));
    }

    #[tokio::test]
    async fn first_fault_wins_over_pending_peer() {
        // One side never settles; the other faults promptly. Must not deadlock.
        let out = timeout(
            Duration::from_secs(1),
            interleave(pending::<Result<(), TransportError>>(), async {
                Err::<(), _>(fault())
            }),
        )
        .await
        .expect("interleave must not deadlock");
        assert_matches!(out, Err(TransportError::Send(SendError::Closed)));
    }

    #[tokio::test]
    async fn both_sides_start_immediately() {
        // The right side signals as soon as it is polled; the left side only
        // completes after observing that signal. Interleaving (rather than
        // sequencing) is what lets this terminate.
        let (started_tx, started_rx) = oneshot::channel();
        let left = async move {
            started_rx.await.map_err(|_| fault())?;
            Ok::<_, TransportError>("left")
        };
        let right = async move {
            let _ = started_tx.send(());
            Ok::<_, TransportError>("right")
        };
        let out = timeout(Duration::from_secs(1), interleave(left, right))
            .await
            .expect("right side must run before left completes");
        assert_matches!(out, Ok(("left", "right")));
    }

    #[tokio::test]
    async fn slow_success_still_joins() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, TransportError>(7)
        };
        let out = interleave(slow, async { Ok(()) }).await;
        assert_matches!(out, Ok((7, ())));
    }
}
