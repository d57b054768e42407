//! # conduit-server
//!
//! Axum host for conduit persistent connections.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `state` | Shared server state: broker handle, mounted endpoints, registry |
//! | `negotiate` | Handshake endpoint minting a connection identity |
//! | `connect` | WebSocket upgrade, query validation, per-socket pump driver |
//! | `channel` | `SocketChannel` adapter over the split axum WebSocket sink |
//! | `registry` | Active-connection bookkeeping for metrics and logs |
//! | `routes` | Router assembly: endpoints, health, metrics, static assets |
//! | `metrics` | Prometheus recorder install and metric name constants |
//!
//! ## Data Flow
//!
//! `negotiate` hands the client an identity → `connect` validates the query
//! and upgrades → the socket driver splits the socket, builds a
//! [`conduit_transport::TransportPump`], forwards inbound frames/close/error
//! into it, and awaits the completion signal before deregistering.

#![deny(unsafe_code)]

pub mod channel;
pub mod connect;
pub mod metrics;
pub mod negotiate;
pub mod registry;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{EventsFactory, ServerState};
