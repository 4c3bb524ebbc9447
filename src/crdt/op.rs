// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Operations exchanged between replicas.
//!
//! Each replica turns its local edits into ops and ships them to its peers,
//! which replay them into their own sequence. Ops are *intention-preserving*:
//! they describe positions by the ids of neighbouring entries rather than by
//! numeric offsets, so they still mean the same thing after concurrent edits
//! have shifted everything around.
//!
//! - Insert: "I put this value between entry L and entry R"
//! - Delete: "I deleted entry X"
//!
//! A multi-character insert is not one op: it is a chain of single-value
//! inserts, each anchored on the previous one.

use serde::Deserialize;
use serde::Serialize;

use super::id::OpId;

/// An operation that can be applied to a sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op<V> {
    /// Insert a value between two existing entries.
    Insert {
        /// Id of the new entry.
        id: OpId,
        /// The entry immediately to the left when this was inserted
        /// (None = beginning of the sequence).
        origin_left: Option<OpId>,
        /// The entry immediately to the right when this was inserted
        /// (None = end of the sequence).
        origin_right: Option<OpId>,
        /// The inserted value.
        value: V,
    },

    /// Tombstone an existing entry.
    Delete {
        /// The entry to delete.
        id: OpId,
    },
}

/// Ops over text, one character per insert.
pub type TextOp = Op<char>;

impl<V> Op<V> {
    /// Create an insert op.
    pub fn insert(id: OpId, origin_left: Option<OpId>, origin_right: Option<OpId>, value: V) -> Op<V> {
        return Op::Insert { id, origin_left, origin_right, value };
    }

    /// Create a delete op.
    pub fn delete(id: OpId) -> Op<V> {
        return Op::Delete { id };
    }

    /// The entry this op creates or deletes.
    pub fn id(&self) -> &OpId {
        return match self {
            Op::Insert { id, .. } => id,
            Op::Delete { id } => id,
        };
    }

    pub fn is_insert(&self) -> bool {
        return matches!(self, Op::Insert { .. });
    }

    pub fn is_delete(&self) -> bool {
        return matches!(self, Op::Delete { .. });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::id::ActorId;

    #[test]
    fn insert_op() {
        let actor = ActorId::derive("alice");
        let op = Op::insert(OpId::new(actor, 1), Some(OpId::new(actor, 0)), None, 'x');

        match &op {
            Op::Insert { id, origin_left, origin_right, value } => {
                assert_eq!(id.seq, 1);
                assert_eq!(origin_left.map(|o| o.seq), Some(0));
                assert!(origin_right.is_none());
                assert_eq!(*value, 'x');
            }
            _ => panic!("expected Insert"),
        }
        assert!(op.is_insert());
        assert!(!op.is_delete());
    }

    #[test]
    fn delete_op() {
        let target = OpId::new(ActorId::derive("bob"), 42);
        let op: TextOp = Op::delete(target);

        assert_eq!(op.id(), &target);
        assert!(op.is_delete());
    }
}
