//! `SocketChannel` adapter over an axum WebSocket.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;
use tokio::sync::Mutex;

use conduit_core::errors::SendError;
use conduit_transport::SocketChannel;

/// Outbound half of one WebSocket.
///
/// The pump already serializes its sends; the async mutex keeps the adapter
/// safe for the driver's own close frame racing a final pump send.
pub struct WsChannel {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsChannel {
    /// Wrap the write half of a split socket.
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink: Mutex::new(sink) }
    }

    /// Best-effort close frame; errors are ignored because the peer may
    /// already be gone.
    pub async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let _ = sink.send(Message::Close(None)).await;
    }
}

#[async_trait]
impl SocketChannel for WsChannel {
    async fn send(&self, frame: String) -> Result<(), SendError> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(frame.into()))
            .await
            .map_err(|err| SendError::Transport(err.to_string()))
    }
}
