//! Application callback boundary.

use std::sync::Arc;

use async_trait::async_trait;

use conduit_core::errors::TransportError;

/// Optional application callbacks for one connection's lifecycle.
///
/// Every method defaults to a no-op, so a host registers only what it needs.
/// Invocation contract (per event occurrence, at most once each):
///
/// - `connected` runs interleaved with the pump's first receive; a fault here
///   resolves the pump's completion signal as faulted
/// - `disconnected` / `error` / `received` are fire-and-forget: their failures
///   are logged and swallowed, never propagated into the pump's loop
#[async_trait]
pub trait ConnectionEvents: Send + Sync {
    /// The socket opened and the pump is starting.
    async fn connected(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The socket closed cleanly.
    async fn disconnected(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The transport signaled a fault.
    async fn error(&self, _error: Arc<TransportError>) -> anyhow::Result<()> {
        Ok(())
    }

    /// An inbound frame arrived from the client.
    async fn received(&self, _payload: String) -> anyhow::Result<()> {
        Ok(())
    }
}

/// No callbacks registered; the pump starts receiving immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

#[async_trait]
impl ConnectionEvents for NoEvents {}
