//! Outbound half of the socket-channel boundary.

use async_trait::async_trait;

use conduit_core::errors::SendError;

/// One physical socket's outbound send operation.
///
/// The pump serializes its own sends — it never issues a second `send` until
/// the previous one resolved — so implementations only need to survive
/// sequential use. Inbound traffic and lifecycle events reach the pump
/// through its `on_message` / `on_close` / `on_error` entry points instead,
/// driven by whatever task owns the physical socket.
#[async_trait]
pub trait SocketChannel: Send + Sync {
    /// Deliver one text frame, resolving when the transport accepted it.
    async fn send(&self, frame: String) -> Result<(), SendError>;
}
