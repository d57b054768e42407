//! # conduit-core
//!
//! Foundation types shared by every conduit crate.
//!
//! - **Identity**: [`ids::ConnectionId`] — the opaque client-supplied token
//!   correlating a physical socket with its logical connection
//! - **Cursors**: [`cursor::Cursor`] — the totally-ordered resume position in a
//!   connection's message stream
//! - **Batches**: [`message::MessageBatch`] — an ordered slice of payloads plus
//!   the cursor to resume from
//! - **Receive contract**: [`receive::ReceivingConnection`] — the
//!   asynchronous "messages after cursor" operation a logical connection
//!   exposes to its transport
//! - **Serialization**: [`serialize::FrameSerializer`] and the default
//!   [`serialize::JsonSerializer`] wire encoding
//! - **Errors**: [`errors`] hierarchy via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other conduit crates.

#![deny(unsafe_code)]

pub mod cursor;
pub mod errors;
pub mod ids;
pub mod message;
pub mod receive;
pub mod serialize;
