//! # conduit-broker
//!
//! The logical-connection side of conduit: an in-memory, per-connection
//! ordered message log with a cursor-indexed asynchronous receive.
//!
//! A [`MessageBroker`] holds one mailbox per [`ConnectionId`]. The dispatch
//! layer appends with [`MessageBroker::publish`] / [`MessageBroker::broadcast`];
//! each transport pump drains its own mailbox through the
//! [`ReceivingConnection`] contract. Receives suspend without polling until at
//! least one message exists past the requested cursor, and resolve
//! [`ReceiveError::Closed`] when the mailbox is torn down.
//!
//! [`ConnectionId`]: conduit_core::ids::ConnectionId
//! [`ReceiveError::Closed`]: conduit_core::errors::ReceiveError::Closed

#![deny(unsafe_code)]

mod broker;
mod mailbox;

pub use broker::{BrokerConnection, MessageBroker};
pub use conduit_core::receive::ReceivingConnection;
