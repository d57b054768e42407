//! Broker: mailbox registry plus the publish/broadcast dispatch surface.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use conduit_core::cursor::Cursor;
use conduit_core::errors::ReceiveError;
use conduit_core::ids::ConnectionId;
use conduit_core::message::MessageBatch;
use conduit_core::receive::ReceivingConnection;

use crate::mailbox::Mailbox;

/// Default per-connection retention window, in messages.
const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Shared in-memory message store, one ordered mailbox per connection.
///
/// Many pumps may hold connections into the same broker, but each pump only
/// ever advances its own cursor. Publishing never blocks; receives suspend on
/// a per-mailbox watch channel.
pub struct MessageBroker {
    mailboxes: RwLock<HashMap<ConnectionId, Arc<Mailbox>>>,
    capacity: usize,
}

impl MessageBroker {
    /// Broker with the default retention window.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    /// Broker with a custom per-mailbox retention window.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mailboxes: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Open (or re-attach to) the mailbox for `id`.
    ///
    /// Reconnects re-attach to the existing mailbox so a resume cursor can
    /// pick up retained messages. A previously closed mailbox is replaced
    /// with a fresh one.
    pub fn connect(&self, id: ConnectionId) -> BrokerConnection {
        let mut mailboxes = self.mailboxes.write();
        let mailbox = match mailboxes.get(&id) {
            Some(existing) if !existing.is_closed() => Arc::clone(existing),
            _ => {
                debug!(connection_id = %id, "opening mailbox");
                let fresh = Arc::new(Mailbox::new(self.capacity));
                let _ = mailboxes.insert(id.clone(), Arc::clone(&fresh));
                fresh
            }
        };
        BrokerConnection { id, mailbox }
    }

    /// Append a payload to one connection's stream. Returns `false` when the
    /// connection has no open mailbox.
    pub fn publish(&self, id: &ConnectionId, payload: Value) -> bool {
        let mailbox = {
            let mailboxes = self.mailboxes.read();
            mailboxes.get(id).map(Arc::clone)
        };
        match mailbox {
            Some(mailbox) => match mailbox.append(payload) {
                Some(seq) => {
                    trace!(connection_id = %id, seq, "published");
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Append a payload to every open mailbox. Returns the recipient count.
    pub fn broadcast(&self, payload: Value) -> usize {
        let mailboxes = self.mailboxes.read();
        let mut recipients = 0;
        for mailbox in mailboxes.values() {
            if mailbox.append(payload.clone()).is_some() {
                recipients += 1;
            }
        }
        recipients
    }

    /// Tear down one connection's mailbox; its pending receive resolves as a
    /// clean close.
    pub fn close(&self, id: &ConnectionId) {
        let removed = self.mailboxes.write().remove(id);
        if let Some(mailbox) = removed {
            debug!(connection_id = %id, "closing mailbox");
            mailbox.close();
        }
    }

    /// Tear down every mailbox (host shutdown).
    pub fn shutdown(&self) {
        let mut mailboxes = self.mailboxes.write();
        for mailbox in mailboxes.values() {
            mailbox.close();
        }
        mailboxes.clear();
    }

    /// Number of open mailboxes.
    pub fn mailbox_count(&self) -> usize {
        self.mailboxes.read().len()
    }
}

impl Default for MessageBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// One connection's handle onto its broker mailbox.
pub struct BrokerConnection {
    id: ConnectionId,
    mailbox: Arc<Mailbox>,
}

#[async_trait]
impl ReceivingConnection for BrokerConnection {
    fn identity(&self) -> &ConnectionId {
        &self.id
    }

    async fn receive_after(&self, cursor: Option<Cursor>) -> Result<MessageBatch, ReceiveError> {
        // Absent cursor: only messages published after this call.
        let position = match cursor {
            Some(cursor) => cursor.position(),
            None => self.mailbox.tail(),
        };
        self.mailbox.wait_beyond(position).await
    }
}
