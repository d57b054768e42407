//! Message cursors: opaque, totally-ordered resume positions.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Position marker in a connection's message stream.
///
/// Numeric internally, rendered as a decimal string on the wire so clients
/// treat it as opaque. Each successful receive yields a cursor that is
/// monotonically non-decreasing; a client resumes after reconnection by
/// echoing the last cursor it observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(u64);

impl Cursor {
    /// Build a cursor from its numeric position.
    pub const fn new(position: u64) -> Self {
        Self(position)
    }

    /// The numeric position.
    pub const fn position(self) -> u64 {
        self.0
    }

    /// Parse the wire representation (decimal string).
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CursorVisitor;

        impl Visitor<'_> for CursorVisitor {
            type Value = Cursor;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal cursor string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Cursor, E> {
                Cursor::parse(v).ok_or_else(|| E::custom(format!("invalid cursor: {v:?}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cursor, E> {
                Ok(Cursor::new(v))
            }
        }

        deserializer.deserialize_any(CursorVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_position() {
        assert!(Cursor::new(1) < Cursor::new(2));
        assert_eq!(Cursor::new(7), Cursor::new(7));
    }

    #[test]
    fn parses_wire_form() {
        assert_eq!(Cursor::parse("42"), Some(Cursor::new(42)));
        assert_eq!(Cursor::parse(""), None);
        assert_eq!(Cursor::parse("abc"), None);
        assert_eq!(Cursor::parse("-1"), None);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Cursor::new(9)).unwrap();
        assert_eq!(json, "\"9\"");
    }

    #[test]
    fn deserializes_string_and_number() {
        let from_str: Cursor = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(from_str, Cursor::new(12));
        let from_num: Cursor = serde_json::from_str("12").unwrap();
        assert_eq!(from_num, Cursor::new(12));
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Cursor::new(1234).to_string(), "1234");
    }
}
