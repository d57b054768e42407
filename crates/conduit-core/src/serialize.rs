//! Wire encoding of outbound message batches.

use serde::Serialize;
use serde_json::Value;

use crate::cursor::Cursor;
use crate::message::MessageBatch;

/// Encodes a [`MessageBatch`] into one outbound text frame.
///
/// The pump receives its serializer by constructor parameter — never from a
/// process-wide registry — so hosts can swap encodings per endpoint.
pub trait FrameSerializer: Send + Sync {
    /// Render the batch as a single text frame.
    fn serialize(&self, batch: &MessageBatch) -> Result<String, serde_json::Error>;
}

/// Default JSON encoding: `{"cursor":"<n>","messages":[...]}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

#[derive(Serialize)]
struct WireFrame<'a> {
    cursor: Cursor,
    messages: &'a [Value],
}

impl FrameSerializer for JsonSerializer {
    fn serialize(&self, batch: &MessageBatch) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireFrame {
            cursor: batch.next_cursor,
            messages: &batch.messages,
        })
    }
}
