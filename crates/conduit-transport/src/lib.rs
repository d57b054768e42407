//! # conduit-transport
//!
//! The bidirectional message pump bridging a logical connection to one
//! physical full-duplex socket.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `channel` | Outbound socket-channel contract implemented by transports |
//! | `events` | Application callback boundary (`connected`/`disconnected`/`error`/`received`) |
//! | `completion` | Single-assignment lifecycle completion signal |
//! | `interleave` | Both-complete-or-first-fault coordinator |
//! | `pump` | The `AwaitingOpen → Running → {Disconnected\|Faulted}` state machine |
//!
//! ## Data Flow
//!
//! socket open → `pump::TransportPump::on_open` runs the `connected` callback
//! interleaved with the receive/send loop → loop: await batch past cursor,
//! serialize, send, advance cursor → close/error/cancellation resolves the
//! completion signal exactly once → owner tears down.

#![deny(unsafe_code)]

pub mod channel;
pub mod completion;
pub mod events;
pub mod interleave;
pub mod pump;

pub use channel::SocketChannel;
pub use completion::{CompletionSignal, PumpOutcome};
pub use events::{ConnectionEvents, NoEvents};
pub use pump::{PumpState, TransportPump};
