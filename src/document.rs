// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! A text document owned by one local actor.
//!
//! Editors that cannot report fine-grained edits hand over the whole buffer
//! instead. `Document::merge` diffs that snapshot against the visible text
//! and turns the difference into ops: it trims the common prefix and suffix,
//! deletes what is left of the old text in between and inserts what is left
//! of the new text. The ops are applied locally and returned so the caller
//! can ship them to peers, where `Document::apply_all` replays them.
//!
//! ```
//! use concord::crdt::id::ActorId;
//! use concord::document::Document;
//!
//! let mut alice = Document::new(ActorId::derive("alice"));
//! let mut bob = Document::new(ActorId::derive("bob"));
//!
//! let ops = alice.merge("hello");
//! assert!(bob.apply_all(&ops));
//!
//! let ops = bob.merge("hello world");
//! assert!(alice.apply_all(&ops));
//! assert_eq!(alice.visible_text(), "hello world");
//! ```

use tracing::debug;

use crate::crdt::Crdt;
use crate::crdt::error::ApplyError;
use crate::crdt::error::BatchError;
use crate::crdt::id::ActorId;
use crate::crdt::id::OpId;
use crate::crdt::op::Op;
use crate::crdt::op::TextOp;
use crate::crdt::sequence::Sequence;
use crate::crdt::sequence::SequenceConfig;

/// A replicated text document with a single local actor.
#[derive(Clone, Debug)]
pub struct Document {
    seq: Sequence<char>,
    local_actor: ActorId,
}

impl Document {
    /// Create an empty document that edits as `local_actor`.
    pub fn new(local_actor: ActorId) -> Document {
        return Document::with_config(local_actor, SequenceConfig::default());
    }

    /// Create an empty document with the given sequence tuning.
    pub fn with_config(local_actor: ActorId, config: SequenceConfig) -> Document {
        return Document {
            seq: Sequence::with_config(config),
            local_actor,
        };
    }

    pub fn local_actor(&self) -> &ActorId {
        return &self.local_actor;
    }

    /// The underlying sequence, tombstones included.
    pub fn sequence(&self) -> &Sequence<char> {
        return &self.seq;
    }

    /// The current text.
    pub fn visible_text(&self) -> String {
        return self.seq.iter().collect();
    }

    /// Number of visible characters.
    pub fn len(&self) -> usize {
        return self.seq.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.seq.is_empty();
    }

    /// The id of the character at visible position `pos`.
    pub fn id_at(&self, pos: usize) -> Option<OpId> {
        return self.seq
            .entries()
            .filter(|(_, value)| value.is_some())
            .nth(pos)
            .map(|(id, _)| id);
    }

    // --- Local edits ---

    /// Build the ops that insert `text` between two anchors as `actor`.
    ///
    /// Characters get consecutive seqs starting at `first_seq`. Each one is
    /// anchored left on the character before it, and all of them share the
    /// same right anchor.
    pub fn insert_ops(
        actor: ActorId,
        first_seq: u64,
        origin_left: Option<OpId>,
        origin_right: Option<OpId>,
        text: &str,
    ) -> Vec<TextOp> {
        let mut ops = Vec::new();
        let mut left = origin_left;
        for (offset, c) in text.chars().enumerate() {
            let id = OpId::new(actor, first_seq + offset as u64);
            ops.push(Op::insert(id, left, origin_right, c));
            left = Some(id);
        }
        return ops;
    }

    /// Insert `text` between two anchors and return the ops for peers.
    ///
    /// Panics if the anchors are not in this document.
    pub fn insert_text(
        &mut self,
        origin_left: Option<OpId>,
        origin_right: Option<OpId>,
        text: &str,
    ) -> Vec<TextOp> {
        let first_seq = self.seq.next_seq(&self.local_actor);
        let ops = Document::insert_ops(self.local_actor, first_seq, origin_left, origin_right, text);

        for op in &ops {
            if let Op::Insert { id, origin_left, origin_right, value } = op {
                if let Err(err) = self.seq.insert(*id, *value, *origin_left, *origin_right) {
                    panic!("local insert rejected: {err}");
                }
            }
        }

        debug!(actor = ?self.local_actor, inserts = ops.len(), "generated local inserts");
        return ops;
    }

    /// Delete every visible character from `left` (inclusive) up to `right`
    /// (exclusive) and return the ops for peers.
    ///
    /// A missing `left` means the start of the document, a missing `right`
    /// means the end. Characters that are already deleted produce no op.
    /// Panics if an anchor is not in this document.
    pub fn delete_range(&mut self, left: Option<OpId>, right: Option<OpId>) -> Vec<TextOp> {
        let start = match left {
            Some(id) => self.index_of(&id),
            None => 0,
        };
        let end = match right {
            Some(id) => self.index_of(&id),
            None => self.seq.entry_count(),
        };

        let ops = self.delete_indices(start, end);
        debug!(actor = ?self.local_actor, deletes = ops.len(), "generated local deletes");
        return ops;
    }

    fn index_of(&self, id: &OpId) -> usize {
        return match self.seq.find_index(id) {
            Some(index) => index,
            None => panic!("unknown anchor {id}"),
        };
    }

    /// Tombstone the live entries in `[start, end)`.
    fn delete_indices(&mut self, start: usize, end: usize) -> Vec<TextOp> {
        let targets: Vec<OpId> = (start..end)
            .filter(|&index| self.seq.value_at(index).is_some())
            .filter_map(|index| self.seq.id_at(index))
            .collect();

        let mut ops = Vec::with_capacity(targets.len());
        for id in targets {
            if let Err(err) = self.seq.delete(&id) {
                panic!("local delete rejected: {err}");
            }
            ops.push(Op::delete(id));
        }
        return ops;
    }

    // --- Snapshot merge ---

    /// Make the visible text equal `new_text` and return the ops that did it.
    ///
    /// Deletes come first, then inserts. Returns no ops when the text is
    /// already equal.
    pub fn merge(&mut self, new_text: &str) -> Vec<TextOp> {
        let text: Vec<char> = new_text.chars().collect();

        if text.is_empty() {
            if self.seq.is_empty() {
                return Vec::new();
            }
            return self.delete_range(None, None);
        }
        if self.seq.entry_count() == 0 {
            return self.insert_text(None, None, new_text);
        }

        let len = self.seq.entry_count();

        // Common prefix, skipping tombstones
        let mut list_start = 0;
        let mut text_start = 0;
        while list_start < len {
            if let Some(&c) = self.seq.value_at(list_start) {
                if text_start == text.len() || c != text[text_start] {
                    break;
                }
                text_start += 1;
            }
            list_start += 1;
        }

        if list_start == len && text_start == text.len() {
            return Vec::new();
        }

        // Common suffix, never crossing the prefix
        let mut list_end = len;
        let mut text_end = text.len();
        while list_end > list_start {
            if let Some(&c) = self.seq.value_at(list_end - 1) {
                if text_end == text_start || c != text[text_end - 1] {
                    break;
                }
                text_end -= 1;
            }
            list_end -= 1;
        }

        let mut ops = self.delete_indices(list_start, list_end);
        let deletes = ops.len();

        // Anchors must be neighbours here: the new run goes right after the
        // left anchor, ahead of the tombstones just made
        if text_start < text_end {
            let origin_left = match list_start {
                0 => None,
                _ => self.seq.id_at(list_start - 1),
            };
            let origin_right = self.seq.id_at(list_start);
            let inserted: String = text[text_start..text_end].iter().collect();
            ops.extend(self.insert_text(origin_left, origin_right, &inserted));
        }

        debug!(deletes, inserts = ops.len() - deletes, "merged snapshot");
        return ops;
    }

    // --- Remote ops ---

    /// Apply one op from a peer, reporting why it was rejected.
    ///
    /// A rejected op changes nothing. Inserts that fail with a recoverable
    /// error can be retried once more ops have arrived.
    pub fn apply_op(&mut self, op: &TextOp) -> Result<(), ApplyError> {
        let result = match op {
            Op::Insert { id, origin_left, origin_right, value } => self.seq
                .insert(*id, *value, *origin_left, *origin_right)
                .map_err(ApplyError::from),
            Op::Delete { id } => self.seq.delete(id).map_err(ApplyError::from),
        };

        if let Err(err) = &result {
            debug!(op = %op.id(), error = %err, "rejected op");
        }
        return result;
    }

    /// Apply one op from a peer. Returns false if it was rejected.
    pub fn apply(&mut self, op: &TextOp) -> bool {
        return self.apply_op(op).is_ok();
    }

    /// Apply ops in order, stopping at the first rejected one.
    ///
    /// Ops before the rejected one stay applied. Use `apply_batch` to learn
    /// how many that was.
    pub fn apply_all(&mut self, ops: &[TextOp]) -> bool {
        return ops.iter().all(|op| self.apply(op));
    }

    /// Apply ops in order and return how many were applied.
    ///
    /// Stops at the first rejected op. The error names how many ops of the
    /// batch were applied before it, and those stay applied.
    pub fn apply_batch(&mut self, ops: &[TextOp]) -> Result<usize, BatchError> {
        for (applied, op) in ops.iter().enumerate() {
            self.apply_op(op).map_err(|error| BatchError { applied, error })?;
        }
        return Ok(ops.len());
    }
}

impl Crdt for Document {
    /// Bring in everything another replica of this document has.
    ///
    /// The local actor is kept.
    fn merge(&mut self, other: &Self) {
        self.seq.merge(&other.seq);
    }
}
