// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Identifier types for sequence operations and entries.
//!
//! # Identifier Hierarchy
//!
//! - `ActorId`: a replica, 32 opaque bytes (typically a public key)
//! - `OpId`: an operation, and the entry it creates (actor, seq)
//! - `ActorIdx`: a dense per-replica index standing in for an `ActorId`
//! - `EntryId`: the compact form of `OpId` stored inside a sequence
//!
//! `ActorId` and `OpId` cross the wire. `ActorIdx` and `EntryId` are local to
//! one replica: two replicas may assign different indices to the same actor,
//! so they must never be compared across replicas or used for ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use super::error::ParseIdError;

/// Length of an actor identifier in bytes.
pub const ACTOR_ID_LEN: usize = 32;

/// A replica identifier.
///
/// Totally ordered by byte-wise comparison. This order is what breaks ties
/// between concurrent inserts, so it must be the same on every replica.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub [u8; ACTOR_ID_LEN]);

impl ActorId {
    /// Create an actor id from raw bytes.
    pub const fn from_bytes(bytes: [u8; ACTOR_ID_LEN]) -> ActorId {
        return ActorId(bytes);
    }

    /// Derive a deterministic actor id from an arbitrary label.
    ///
    /// The label is hashed with blake3, so equal labels give equal ids on
    /// every replica.
    pub fn derive(label: &str) -> ActorId {
        return ActorId(crate::key::hash(label.as_bytes()).0);
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; ACTOR_ID_LEN] {
        return &self.0;
    }
}

fn hex(bytes: &[u8]) -> String {
    return bytes.iter().map(|b| format!("{:02x}", b)).collect();
}

fn nibble(c: u8) -> Option<u8> {
    return match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    };
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&hex(&self.0));
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first four bytes are plenty to tell replicas apart in logs.
        return write!(f, "ActorId({}..)", hex(&self.0[..4]));
    }
}

impl FromStr for ActorId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<ActorId, ParseIdError> {
        let raw = s.as_bytes();
        if raw.len() != ACTOR_ID_LEN * 2 {
            return Err(ParseIdError::ActorLength { found: raw.len() });
        }

        let mut bytes = [0u8; ACTOR_ID_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = nibble(pair[0]).ok_or(ParseIdError::ActorDigit { index: i * 2 })?;
            let lo = nibble(pair[1]).ok_or(ParseIdError::ActorDigit { index: i * 2 + 1 })?;
            bytes[i] = hi << 4 | lo;
        }
        return Ok(ActorId(bytes));
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return serializer.collect_str(self);
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<ActorId, D::Error> {
        let text = String::deserialize(deserializer)?;
        return text.parse().map_err(serde::de::Error::custom);
    }
}

/// An operation identifier.
///
/// Names both the insert operation and the entry it creates. The (actor, seq)
/// pair is globally unique because each actor numbers its own inserts
/// 0, 1, 2, ... without gaps.
///
/// Ordered by `seq` first, then by `actor`. Document position never depends
/// on this order; it is only a deterministic tie-breaker for callers that
/// need one (sorting ops for display, using ids as map keys).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId {
    /// The actor that issued the insert.
    pub actor: ActorId,
    /// The actor's private counter at the time of the insert.
    pub seq: u64,
}

impl OpId {
    /// Create a new operation id.
    pub fn new(actor: ActorId, seq: u64) -> OpId {
        return OpId { actor, seq };
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.seq.cmp(&other.seq) {
            Ordering::Equal => self.actor.cmp(&other.actor),
            other => other,
        }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}@{}", self.seq, self.actor);
    }
}

impl fmt::Debug for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "OpId({}@{}..)", self.seq, hex(&self.actor.0[..4]));
    }
}

impl FromStr for OpId {
    type Err = ParseIdError;

    /// Parse the `"<seq>@<actor-hex>"` form produced by `Display`.
    fn from_str(s: &str) -> Result<OpId, ParseIdError> {
        let (seq, actor) = s.split_once('@').ok_or(ParseIdError::MissingSeparator)?;
        let seq = seq.parse::<u64>().map_err(|_| ParseIdError::Seq(seq.to_string()))?;
        let actor = actor.parse::<ActorId>()?;
        return Ok(OpId { actor, seq });
    }
}

/// A compact actor index.
///
/// Assigned by an `ActorRegistry` in order of first sight. Only meaningful
/// within the registry that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorIdx(pub u32);

impl ActorIdx {
    /// Create a new actor index.
    pub fn new(idx: u32) -> ActorIdx {
        return ActorIdx(idx);
    }

    /// Use as an index into per-actor tables.
    #[inline]
    pub fn as_usize(self) -> usize {
        return self.0 as usize;
    }
}

/// A compact entry identifier: an `OpId` with the actor replaced by its index.
///
/// Equality is O(1), which keeps id scans in the sequence cheap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId {
    /// Actor index (into the owning registry).
    pub actor: ActorIdx,
    /// Sequence number.
    pub seq: u64,
}

impl EntryId {
    /// Create a new entry id.
    pub fn new(actor: ActorIdx, seq: u64) -> EntryId {
        return EntryId { actor, seq };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(byte: u8) -> ActorId {
        return ActorId([byte; ACTOR_ID_LEN]);
    }

    #[test]
    fn actor_ordering_is_bytewise() {
        let mut low = [0u8; ACTOR_ID_LEN];
        let mut high = [0u8; ACTOR_ID_LEN];
        low[31] = 0xff;
        high[0] = 0x01;
        assert!(ActorId(low) < ActorId(high));
    }

    #[test]
    fn op_id_orders_by_seq_then_actor() {
        let a = OpId::new(actor(2), 1);
        let b = OpId::new(actor(1), 2);
        let c = OpId::new(actor(2), 2);

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn actor_hex_round_trip() {
        let id = ActorId::derive("alice");
        let text = id.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<ActorId>().unwrap(), id);
    }

    #[test]
    fn actor_parse_accepts_uppercase() {
        let text = "AB".repeat(32);
        assert_eq!(text.parse::<ActorId>().unwrap(), actor(0xab));
    }

    #[test]
    fn actor_parse_rejects_bad_input() {
        assert_eq!(
            "abc".parse::<ActorId>(),
            Err(ParseIdError::ActorLength { found: 3 })
        );

        let mut text = "0".repeat(64);
        text.replace_range(5..6, "g");
        assert_eq!(
            text.parse::<ActorId>(),
            Err(ParseIdError::ActorDigit { index: 5 })
        );
    }

    #[test]
    fn op_id_text_form() {
        let id = OpId::new(actor(0x0f), 42);
        let text = id.to_string();
        assert!(text.starts_with("42@0f0f"));
        assert_eq!(text.parse::<OpId>().unwrap(), id);
    }

    #[test]
    fn op_id_parse_errors() {
        assert_eq!("42".parse::<OpId>(), Err(ParseIdError::MissingSeparator));

        let text = format!("x1@{}", actor(0));
        assert_eq!(text.parse::<OpId>(), Err(ParseIdError::Seq("x1".to_string())));
    }

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(ActorId::derive("bob"), ActorId::derive("bob"));
        assert_ne!(ActorId::derive("bob"), ActorId::derive("carol"));
    }

    #[test]
    fn entry_id_equality() {
        let a = EntryId::new(ActorIdx::new(0), 3);
        let b = EntryId::new(ActorIdx::new(0), 3);
        let c = EntryId::new(ActorIdx::new(1), 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
