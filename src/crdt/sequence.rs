// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Replicated sequence using YATA-style integration.
//!
//! Every entry remembers the two neighbours it was inserted between: its left
//! origin and its right origin. When a remote insert arrives, those two
//! anchors bound the region it may land in, and a fixed decision table orders
//! it against concurrent inserts that landed in the same region. Because the
//! table only looks at structure that every replica shares once the same ops
//! are applied, every replica ends up with the same order no matter the
//! delivery order.
//!
//! Entries are never removed. A delete clears the value and leaves a
//! tombstone behind, so ops that reference the deleted entry as an anchor
//! keep working.
//!
//! # Example
//!
//! ```
//! use concord::crdt::id::{ActorId, OpId};
//! use concord::crdt::sequence::Sequence;
//!
//! let alice = ActorId::derive("alice");
//! let mut seq = Sequence::new();
//!
//! seq.insert(OpId::new(alice, 0), 'h', None, None).unwrap();
//! seq.insert(OpId::new(alice, 1), 'i', Some(OpId::new(alice, 0)), None).unwrap();
//! assert_eq!(seq.visible_values(), vec!['h', 'i']);
//!
//! seq.delete(&OpId::new(alice, 0)).unwrap();
//! assert_eq!(seq.visible_values(), vec!['i']);
//! ```

use std::cmp::Ordering;

use tracing::debug;
use tracing::trace;

use super::Crdt;
use super::error::DeleteError;
use super::error::InsertError;
use super::id::ActorId;
use super::id::ActorIdx;
use super::id::EntryId;
use super::id::OpId;
use super::registry::ActorRegistry;

// =============================================================================
// Configuration
// =============================================================================

/// Tuning knobs for a sequence.
///
/// None of these change what a sequence contains, only how fast lookups are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceConfig {
    /// How many entries before a position hint to check before falling back
    /// to a full scan.
    pub hint_before: usize,
    /// How many entries after a position hint to check before falling back
    /// to a full scan.
    pub hint_after: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        return SequenceConfig {
            hint_before: 1,
            hint_after: 4,
        };
    }
}

// =============================================================================
// Entry
// =============================================================================

/// One slot in the sequence.
///
/// Ids and origins are stored in compact form and never change. The value is
/// cleared exactly once, when the entry is deleted.
#[derive(Clone, Debug)]
struct Entry<V> {
    id: EntryId,
    origin_left: Option<EntryId>,
    origin_right: Option<EntryId>,
    /// None once deleted (tombstone).
    value: Option<V>,
}

/// Per-actor state, indexed by `ActorIdx`.
///
/// An actor only gets a state once one of its inserts succeeds, so every
/// state has a meaningful `last_seen_seq`.
#[derive(Clone, Copy, Debug, Default)]
struct ActorState {
    /// Highest seq applied for this actor. Ops arrive without gaps, so every
    /// seq up to this one is present as well.
    last_seen_seq: u64,
    /// Where this actor's last insert landed. Seeds position hints for the
    /// actor's next op, which usually anchors right next to it.
    last_inserted_index: usize,
}

// =============================================================================
// Sequence
// =============================================================================

/// A replicated sequence of values.
///
/// Stores entries in document order in a plain `Vec`. Lookups by id are
/// linear, sped up by position hints for the common case of an actor editing
/// where it last edited.
#[derive(Clone, Debug)]
pub struct Sequence<V> {
    /// Entries in document order, tombstones included.
    entries: Vec<Entry<V>>,
    /// Actor ids seen by this replica.
    actors: ActorRegistry,
    /// Per-actor state, indexed by `ActorIdx`.
    actor_states: Vec<ActorState>,
    /// Number of entries that are not tombstones.
    doc_size: usize,
    config: SequenceConfig,
}

impl<V> Default for Sequence<V> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<V> Sequence<V> {
    /// Create a new empty sequence.
    pub fn new() -> Sequence<V> {
        return Sequence::with_config(SequenceConfig::default());
    }

    /// Create a new empty sequence with the given tuning.
    pub fn with_config(config: SequenceConfig) -> Sequence<V> {
        return Sequence {
            entries: Vec::new(),
            actors: ActorRegistry::new(),
            actor_states: Vec::new(),
            doc_size: 0,
            config,
        };
    }

    pub fn config(&self) -> &SequenceConfig {
        return &self.config;
    }

    /// Number of visible (not deleted) values.
    pub fn len(&self) -> usize {
        return self.doc_size;
    }

    /// Check if there are no visible values. Tombstones may remain.
    pub fn is_empty(&self) -> bool {
        return self.doc_size == 0;
    }

    /// Number of entries, tombstones included.
    pub fn entry_count(&self) -> usize {
        return self.entries.len();
    }

    /// The actors this replica has applied inserts from.
    pub fn actors(&self) -> &ActorRegistry {
        return &self.actors;
    }

    /// Drop all entries and actors, keeping the configuration.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.actors.clear();
        self.actor_states.clear();
        self.doc_size = 0;
    }

    /// The highest seq applied for an actor, or None if none was.
    pub fn last_seen_seq(&self, actor: &ActorId) -> Option<u64> {
        let idx = self.actors.lookup(actor)?;
        return Some(self.actor_states[idx.as_usize()].last_seen_seq);
    }

    /// The seq the actor's next insert must carry.
    pub fn next_seq(&self, actor: &ActorId) -> u64 {
        return match self.last_seen_seq(actor) {
            Some(seq) => seq + 1,
            None => 0,
        };
    }

    // --- Id translation ---

    fn actor_id(&self, idx: ActorIdx) -> &ActorId {
        return self.actors.actor(idx).expect("entry references an unregistered actor");
    }

    fn to_entry_id(&self, id: &OpId) -> Option<EntryId> {
        let actor = self.actors.lookup(&id.actor)?;
        return Some(EntryId::new(actor, id.seq));
    }

    fn to_op_id(&self, id: EntryId) -> OpId {
        return OpId::new(*self.actor_id(id.actor), id.seq);
    }

    // --- Lookup ---

    /// Find an entry, checking a small window around `hint` first.
    fn position_near(&self, id: EntryId, hint: usize) -> Option<usize> {
        let start = hint.saturating_sub(self.config.hint_before);
        let end = hint
            .saturating_add(self.config.hint_after)
            .saturating_add(1)
            .min(self.entries.len());

        if start < end {
            if let Some(offset) = self.entries[start..end].iter().position(|e| e.id == id) {
                return Some(start + offset);
            }
        }

        return self.entries.iter().position(|e| e.id == id);
    }

    /// Find an entry that is known to exist.
    ///
    /// Origins of integrated entries always exist, because an insert is only
    /// accepted once both of its origins are present and entries are never
    /// removed.
    fn locate(&self, id: EntryId, hint: usize) -> usize {
        return self.position_near(id, hint).expect("integrated entry has an unknown origin");
    }

    fn hint_for(&self, actor: ActorIdx) -> usize {
        return self.actor_states
            .get(actor.as_usize())
            .map_or(0, |state| state.last_inserted_index);
    }

    /// Resolve an op id to its compact id and current index.
    fn resolve(&self, id: &OpId, hint: usize) -> Option<(EntryId, usize)> {
        let entry_id = self.to_entry_id(id)?;
        let index = self.position_near(entry_id, hint)?;
        return Some((entry_id, index));
    }

    /// Find the index of an entry by id, tombstones included.
    ///
    /// Starts near where the entry's actor last inserted.
    pub fn find_index(&self, id: &OpId) -> Option<usize> {
        let entry_id = self.to_entry_id(id)?;
        return self.position_near(entry_id, self.hint_for(entry_id.actor));
    }

    /// Find the index of an entry by id, searching around `hint` first.
    ///
    /// The hint only affects speed: a miss falls back to a full scan.
    pub fn find_index_near(&self, id: &OpId, hint: usize) -> Option<usize> {
        let entry_id = self.to_entry_id(id)?;
        return self.position_near(entry_id, hint);
    }

    // --- Index access ---

    /// The id of the entry at `index`.
    pub fn id_at(&self, index: usize) -> Option<OpId> {
        let entry = self.entries.get(index)?;
        return Some(self.to_op_id(entry.id));
    }

    /// The value at `index`, or None if out of range or deleted.
    pub fn value_at(&self, index: usize) -> Option<&V> {
        return self.entries.get(index)?.value.as_ref();
    }

    /// Check if the entry at `index` is a tombstone.
    pub fn is_tombstone(&self, index: usize) -> bool {
        return self.entries.get(index).is_some_and(|e| e.value.is_none());
    }

    /// Iterate over all entries in order as (id, value) pairs.
    /// Tombstones have no value.
    pub fn entries(&self) -> impl Iterator<Item = (OpId, Option<&V>)> + '_ {
        return self.entries
            .iter()
            .map(|e| (self.to_op_id(e.id), e.value.as_ref()));
    }

    /// Iterate over visible values in order.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        return self.entries.iter().filter_map(|e| e.value.as_ref());
    }

    /// Collect visible values in order.
    pub fn visible_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        return self.iter().cloned().collect();
    }

    /// Recount visible values and compare against the running count.
    ///
    /// Linear in the number of entries; meant for tests and debug checks.
    pub fn verify_invariants(&self) -> bool {
        let live = self.entries.iter().filter(|e| e.value.is_some()).count();
        return live == self.doc_size;
    }

    // --- Mutation ---

    /// Insert a value.
    ///
    /// `id.seq` must be the actor's next seq, and both origins must already
    /// be present. On error nothing changes, and the caller may retry the
    /// same insert later.
    pub fn insert(
        &mut self,
        id: OpId,
        value: V,
        origin_left: Option<OpId>,
        origin_right: Option<OpId>,
    ) -> Result<(), InsertError> {
        self.integrate(id, Some(value), origin_left, origin_right)?;
        return Ok(());
    }

    /// Delete the entry with the given id.
    pub fn delete(&mut self, id: &OpId) -> Result<(), DeleteError> {
        let index = self.find_index(id).ok_or(DeleteError::NotFound { id: *id })?;

        if self.entries[index].value.take().is_none() {
            return Err(DeleteError::AlreadyDeleted { id: *id });
        }
        self.doc_size -= 1;

        trace!(id = %id, index, "tombstoned entry");
        return Ok(());
    }

    /// Check, place and splice a new entry. Returns where it landed.
    ///
    /// `value` is None only when copying a tombstone from another replica.
    fn integrate(
        &mut self,
        id: OpId,
        value: Option<V>,
        origin_left: Option<OpId>,
        origin_right: Option<OpId>,
    ) -> Result<usize, InsertError> {
        // Causal gate: the actor's ops must arrive without gaps
        let known = self.actors.lookup(&id.actor);
        let expected = match known {
            Some(idx) => self.actor_states[idx.as_usize()].last_seen_seq + 1,
            None => 0,
        };
        if id.seq != expected {
            return Err(InsertError::OutOfOrder { expected, found: id.seq });
        }

        if self.entries.is_empty() {
            if let Some(parent) = origin_left.or(origin_right) {
                return Err(InsertError::MissingParent { parent });
            }
        }

        let hint = known.map_or(0, |idx| self.hint_for(idx));

        let left = match origin_left {
            Some(parent) => Some(
                self.resolve(&parent, hint)
                    .ok_or(InsertError::MissingParent { parent })?,
            ),
            None => None,
        };
        let left_index = left.map(|(_, index)| index);
        let scan_start = left_index.map_or(0, |index| index + 1);

        let right = match origin_right {
            Some(parent) => Some(
                self.resolve(&parent, scan_start)
                    .ok_or(InsertError::MissingParent { parent })?,
            ),
            None => None,
        };
        let right_bound = right.map_or(self.entries.len(), |(_, index)| index);

        let dest = self.find_insert_index(&id.actor, left_index, scan_start, right_bound);

        // Everything checked, commit
        let actor = self.actors.register_or_lookup(&id.actor);
        while self.actor_states.len() <= actor.as_usize() {
            self.actor_states.push(ActorState::default());
        }

        let live = value.is_some();
        self.entries.insert(dest, Entry {
            id: EntryId::new(actor, id.seq),
            origin_left: left.map(|(entry_id, _)| entry_id),
            origin_right: right.map(|(entry_id, _)| entry_id),
            value,
        });
        if live {
            self.doc_size += 1;
        }

        let state = &mut self.actor_states[actor.as_usize()];
        state.last_seen_seq = id.seq;
        state.last_inserted_index = dest;

        trace!(id = %id, index = dest, live, "integrated entry");
        return Ok(dest);
    }

    /// The YATA scan.
    ///
    /// Walks from just after the left origin towards the right origin and
    /// decides, entry by entry, whether the new entry goes before it:
    ///
    /// ```text
    ///          | ir < R   | ir == R        | ir > R
    /// ---------+----------+----------------+---------
    /// il < L   | stop     | stop           | stop
    /// il == L  | scanning | actor decides  | skip
    /// il > L   | (no change to scanning state)
    /// ```
    ///
    /// While `scanning`, the insertion point stays where the scan began: the
    /// entries passed over are nested inside a concurrent sibling and the new
    /// entry may still need to go before that whole run. An absent left
    /// origin sorts before every index, an absent right origin resolves to
    /// the end of the sequence.
    fn find_insert_index(
        &self,
        actor: &ActorId,
        left: Option<usize>,
        scan_start: usize,
        right_bound: usize,
    ) -> usize {
        let len = self.entries.len();
        let mut dest = scan_start;
        let mut scanning = false;
        let mut i = scan_start;

        loop {
            if !scanning {
                dest = i;
            }
            if i >= right_bound || i >= len {
                break;
            }

            let other = &self.entries[i];
            let other_left = other.origin_left.map(|o| self.locate(o, scan_start));

            match other_left.cmp(&left) {
                Ordering::Less => break,
                Ordering::Greater => {}
                Ordering::Equal => {
                    let other_right = other.origin_right.map_or(len, |o| self.locate(o, i));
                    match other_right.cmp(&right_bound) {
                        Ordering::Less => scanning = true,
                        Ordering::Equal => {
                            // Same anchors on both sides: a true conflict
                            if actor < self.actor_id(other.id.actor) {
                                break;
                            }
                            scanning = false;
                        }
                        Ordering::Greater => scanning = false,
                    }
                }
            }

            i += 1;
        }

        return dest;
    }
}

/// What a state merge did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MergeStats {
    /// Entries copied over, tombstones included.
    integrated: usize,
    /// Entries that could never be placed.
    stuck: usize,
    /// Entries tombstoned here because the other replica had.
    deleted: usize,
    /// Tombstones whose entry does not exist here.
    missing: usize,
}

impl<V: Clone> Sequence<V> {
    /// Replay every entry and tombstone of `other` that this replica lacks.
    ///
    /// Entries are replayed per actor in seq order, retrying actors whose
    /// next entry is still waiting on an origin from another actor, until a
    /// full pass makes no progress.
    fn merge_from(&mut self, other: &Self) -> MergeStats {
        let mut stats = MergeStats::default();

        let mut queues: Vec<Vec<usize>> = vec![Vec::new(); other.actors.len()];
        for (index, entry) in other.entries.iter().enumerate() {
            queues[entry.id.actor.as_usize()].push(index);
        }
        for queue in &mut queues {
            queue.sort_by_key(|&index| other.entries[index].id.seq);
        }

        // Skip what we already have
        let mut cursors: Vec<usize> = queues
            .iter()
            .enumerate()
            .map(|(actor, queue)| {
                let actor = other.actor_id(ActorIdx::new(actor as u32));
                let next = self.next_seq(actor);
                queue.partition_point(|&index| other.entries[index].id.seq < next)
            })
            .collect();

        loop {
            let mut progress = false;
            for (actor, queue) in queues.iter().enumerate() {
                while cursors[actor] < queue.len() {
                    let entry = &other.entries[queue[cursors[actor]]];
                    let id = other.to_op_id(entry.id);
                    let origin_left = entry.origin_left.map(|o| other.to_op_id(o));
                    let origin_right = entry.origin_right.map(|o| other.to_op_id(o));

                    if self.integrate(id, entry.value.clone(), origin_left, origin_right).is_err() {
                        break;
                    }
                    cursors[actor] += 1;
                    stats.integrated += 1;
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }

        stats.stuck = queues
            .iter()
            .zip(&cursors)
            .map(|(queue, &cursor)| queue.len() - cursor)
            .sum();

        for entry in other.entries.iter().filter(|e| e.value.is_none()) {
            match self.delete(&other.to_op_id(entry.id)) {
                Ok(()) => stats.deleted += 1,
                Err(DeleteError::AlreadyDeleted { .. }) => {}
                Err(DeleteError::NotFound { .. }) => stats.missing += 1,
            }
        }

        return stats;
    }
}

impl<V: Clone> Crdt for Sequence<V> {
    /// Bring in every entry and tombstone `other` has.
    fn merge(&mut self, other: &Self) {
        let stats = self.merge_from(other);
        debug!(
            integrated = stats.integrated,
            stuck = stats.stuck,
            deleted = stats.deleted,
            missing = stats.missing,
            entries = self.entries.len(),
            "merged replica state"
        );
    }
}
