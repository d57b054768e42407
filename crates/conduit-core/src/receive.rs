//! The receive contract consumed by transport pumps.

use async_trait::async_trait;

use crate::cursor::Cursor;
use crate::errors::ReceiveError;
use crate::ids::ConnectionId;
use crate::message::MessageBatch;

/// Asynchronous "receive messages after cursor" contract.
///
/// Guarantees:
///
/// - suspends (never blocks a worker) until at least one message exists past
///   the given cursor; a successful batch is never empty
/// - `cursor: None` means "only messages published after this call"
/// - no payload already covered by the requested cursor is returned again
/// - teardown of the source resolves [`ReceiveError::Closed`], which callers
///   treat as a clean disconnect
#[async_trait]
pub trait ReceivingConnection: Send + Sync {
    /// Identity of the logical connection this receiver drains.
    fn identity(&self) -> &ConnectionId;

    /// Wait for the next non-empty batch past `cursor`.
    async fn receive_after(&self, cursor: Option<Cursor>) -> Result<MessageBatch, ReceiveError>;
}
