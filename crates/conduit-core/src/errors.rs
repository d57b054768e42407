//! Error hierarchy for the transport core.
//!
//! Taxonomy (one variant family per failure origin):
//!
//! - [`ReceiveError`] — the message source failed, or was torn down
//!   cooperatively ([`ReceiveError::Closed`], which is not a fault)
//! - [`SendError`] — the socket channel rejected or failed to deliver a frame
//! - [`TransportError`] — terminal pump outcome carrying one of the above,
//!   a serialization failure, or a transport-level channel fault

use thiserror::Error;

/// Failure of the logical connection's receive operation.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The message source was torn down cooperatively. Treated by the pump as
    /// a clean disconnect, never surfaced as an error.
    #[error("message source closed")]
    Closed,

    /// The message source itself failed.
    #[error("message source failed: {0}")]
    Source(String),
}

impl ReceiveError {
    /// Whether this is the cooperative-teardown (non-error) case.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Failure of the socket channel's send operation.
#[derive(Debug, Error)]
pub enum SendError {
    /// The socket is already closed.
    #[error("socket closed")]
    Closed,

    /// The transport failed to deliver the frame.
    #[error("socket send failed: {0}")]
    Transport(String),
}

/// Terminal fault of a transport pump.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Receive failure (taxonomy (a)). Never constructed from
    /// [`ReceiveError::Closed`].
    #[error("receive failed: {0}")]
    Receive(#[source] ReceiveError),

    /// Send failure (taxonomy (b)).
    #[error("send failed: {0}")]
    Send(#[from] SendError),

    /// Outbound batch could not be serialized.
    #[error("frame serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Transport-level error signaled by the socket infrastructure
    /// (taxonomy (c)).
    #[error("channel fault: {0}")]
    Channel(String),

    /// The application `connected` callback faulted before the pump settled.
    #[error("connected callback failed: {0}")]
    Callback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_is_cancellation() {
        assert!(ReceiveError::Closed.is_cancellation());
        assert!(!ReceiveError::Source("boom".into()).is_cancellation());
    }

    #[test]
    fn display_is_stable() {
        let err = TransportError::Send(SendError::Transport("reset".into()));
        assert_eq!(err.to_string(), "send failed: socket send failed: reset");
        assert_eq!(
            TransportError::Channel("io".into()).to_string(),
            "channel fault: io"
        );
    }
}
