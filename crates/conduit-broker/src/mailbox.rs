//! Per-connection ordered message log.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use conduit_core::cursor::Cursor;
use conduit_core::errors::ReceiveError;
use conduit_core::message::MessageBatch;

/// One connection's bounded message log.
///
/// Sequences start at 1 and only grow; cursor N covers every sequence `<= N`.
/// When the log exceeds its capacity the oldest entries are evicted — a
/// resume cursor older than the retained window resumes from the start of
/// the window.
pub(crate) struct Mailbox {
    log: Mutex<Log>,
    /// Highest appended sequence; waiters watch this for wakeups.
    head: watch::Sender<u64>,
    closed: AtomicBool,
    capacity: usize,
}

struct Log {
    entries: VecDeque<(u64, Value)>,
    next_seq: u64,
}

impl Mailbox {
    pub(crate) fn new(capacity: usize) -> Self {
        let (head, _) = watch::channel(0);
        Self {
            log: Mutex::new(Log {
                entries: VecDeque::new(),
                next_seq: 1,
            }),
            head,
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Append a payload and wake any waiting receiver. Returns the sequence
    /// assigned, or `None` if the mailbox is closed.
    pub(crate) fn append(&self, payload: Value) -> Option<u64> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        let seq = {
            let mut log = self.log.lock();
            let seq = log.next_seq;
            log.next_seq += 1;
            log.entries.push_back((seq, payload));
            while log.entries.len() > self.capacity {
                let _ = log.entries.pop_front();
            }
            seq
        };
        let _ = self.head.send_replace(seq);
        Some(seq)
    }

    /// Current tail sequence — the position a cursor-less receive starts from.
    pub(crate) fn tail(&self) -> u64 {
        self.log.lock().next_seq - 1
    }

    /// Tear the mailbox down; pending and future receives resolve `Closed`.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.head.send_modify(|_| {});
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Everything retained past `cursor`, or `None` if nothing is there yet.
    fn collect_after(&self, cursor: u64) -> Option<MessageBatch> {
        let log = self.log.lock();
        let mut messages = Vec::new();
        let mut last_seq = cursor;
        for (seq, payload) in &log.entries {
            if *seq > cursor {
                messages.push(payload.clone());
                last_seq = *seq;
            }
        }
        if messages.is_empty() {
            None
        } else {
            Some(MessageBatch::new(messages, Cursor::new(last_seq)))
        }
    }

    /// Suspend until at least one message exists past `cursor`.
    pub(crate) async fn wait_beyond(&self, cursor: u64) -> Result<MessageBatch, ReceiveError> {
        let mut head = self.head.subscribe();
        loop {
            if self.is_closed() {
                return Err(ReceiveError::Closed);
            }
            if let Some(batch) = self.collect_after(cursor) {
                return Ok(batch);
            }
            if head.changed().await.is_err() {
                // Sender dropped with the mailbox itself.
                return Err(ReceiveError::Closed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn sequences_start_at_one() {
        let mailbox = Mailbox::new(16);
        assert_eq!(mailbox.tail(), 0);
        assert_eq!(mailbox.append(json!("A")), Some(1));
        assert_eq!(mailbox.append(json!("B")), Some(2));
        assert_eq!(mailbox.tail(), 2);
    }

    #[test]
    fn collect_after_excludes_covered_sequences() {
        let mailbox = Mailbox::new(16);
        let _ = mailbox.append(json!("A"));
        let _ = mailbox.append(json!("B"));
        let batch = mailbox.collect_after(1).unwrap();
        assert_eq!(batch.messages, vec![json!("B")]);
        assert_eq!(batch.next_cursor, Cursor::new(2));
        assert!(mailbox.collect_after(2).is_none());
    }

    #[test]
    fn eviction_keeps_newest_window() {
        let mailbox = Mailbox::new(2);
        let _ = mailbox.append(json!(1));
        let _ = mailbox.append(json!(2));
        let _ = mailbox.append(json!(3));
        // Cursor 0 is older than the retained window; delivery resumes from
        // the oldest retained entry.
        let batch = mailbox.collect_after(0).unwrap();
        assert_eq!(batch.messages, vec![json!(2), json!(3)]);
        assert_eq!(batch.next_cursor, Cursor::new(3));
    }

    #[tokio::test]
    async fn wait_beyond_suspends_until_append() {
        let mailbox = Arc::new(Mailbox::new(16));
        let waiter = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.wait_beyond(0).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        let _ = mailbox.append(json!("late"));
        let batch = waiter.await.unwrap().unwrap();
        assert_eq!(batch.messages, vec![json!("late")]);
    }

    #[tokio::test]
    async fn close_wakes_waiter_with_closed() {
        let mailbox = Arc::new(Mailbox::new(16));
        let waiter = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.wait_beyond(0).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        mailbox.close();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn closed_wins_over_pending_data() {
        let mailbox = Mailbox::new(16);
        let _ = mailbox.append(json!("stale"));
        mailbox.close();
        let err = mailbox.wait_beyond(0).await.unwrap_err();
        assert!(err.is_cancellation());
    }

    #[test]
    fn append_after_close_is_rejected() {
        let mailbox = Mailbox::new(16);
        mailbox.close();
        assert_eq!(mailbox.append(json!("x")), None);
    }
}
