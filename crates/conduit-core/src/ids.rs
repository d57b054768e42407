//! Branded connection identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of one logical connection.
///
/// Supplied by the client at handshake time (minted by the negotiate endpoint
/// on fresh connects) and immutable for the lifetime of the socket. The server
/// never interprets the contents beyond equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wrap an existing identity token.
    ///
    /// Returns `None` for an empty token — a blank `connectionId` query
    /// parameter is a denied handshake, never a valid identity.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    /// Mint a fresh identity (UUIDv7, time-ordered).
    pub fn mint() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
