//! Message batches delivered by a logical connection.

use serde_json::Value;

use crate::cursor::Cursor;

/// An ordered run of application payloads plus the cursor to resume from.
///
/// INVARIANT: a batch returned by a successful receive is never empty — the
/// receive operation suspends until at least one message exists.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageBatch {
    /// Payloads in arrival order.
    pub messages: Vec<Value>,
    /// Cursor the next receive should resume from.
    pub next_cursor: Cursor,
}

impl MessageBatch {
    /// Build a batch.
    pub fn new(messages: Vec<Value>, next_cursor: Cursor) -> Self {
        Self {
            messages,
            next_cursor,
        }
    }

    /// Number of payloads in the batch.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the batch carries no payloads.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_preserves_order() {
        let batch = MessageBatch::new(vec![json!("A"), json!("B")], Cursor::new(2));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.messages[0], json!("A"));
        assert_eq!(batch.messages[1], json!("B"));
        assert_eq!(batch.next_cursor, Cursor::new(2));
    }
}
