//! The demo `raw` endpoint: inbound text is echoed back onto the sender's
//! own message stream.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use conduit_broker::MessageBroker;
use conduit_core::ids::ConnectionId;
use conduit_server::EventsFactory;
use conduit_transport::ConnectionEvents;

/// Callback factory for the `raw` endpoint.
pub fn factory(broker: Arc<MessageBroker>) -> EventsFactory {
    Arc::new(move |id: &ConnectionId| {
        Arc::new(RawEvents {
            id: id.clone(),
            broker: Arc::clone(&broker),
        }) as Arc<dyn ConnectionEvents>
    })
}

struct RawEvents {
    id: ConnectionId,
    broker: Arc<MessageBroker>,
}

#[async_trait]
impl ConnectionEvents for RawEvents {
    async fn connected(&self) -> anyhow::Result<()> {
        info!(connection_id = %self.id, "raw client connected");
        Ok(())
    }

    async fn disconnected(&self) -> anyhow::Result<()> {
        info!(connection_id = %self.id, "raw client disconnected");
        Ok(())
    }

    async fn received(&self, payload: String) -> anyhow::Result<()> {
        if !self.broker.publish(&self.id, json!({ "echo": payload })) {
            warn!(connection_id = %self.id, "echo dropped; mailbox gone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::cursor::Cursor;
    use conduit_core::receive::ReceivingConnection;

    #[tokio::test]
    async fn received_text_is_echoed_to_the_senders_stream() {
        let broker = Arc::new(MessageBroker::new());
        let id = ConnectionId::new("raw_1").unwrap();
        let connection = broker.connect(id.clone());

        let events = factory(Arc::clone(&broker))(&id);
        events.received("hello".into()).await.unwrap();

        let batch = connection
            .receive_after(Some(Cursor::new(0)))
            .await
            .unwrap();
        assert_eq!(batch.messages[0]["echo"], "hello");
    }

    #[tokio::test]
    async fn echo_without_mailbox_is_swallowed() {
        let broker = Arc::new(MessageBroker::new());
        let id = ConnectionId::new("ghost").unwrap();
        let events = factory(Arc::clone(&broker))(&id);
        // No mailbox opened; must not error.
        events.received("lost".into()).await.unwrap();
    }
}
