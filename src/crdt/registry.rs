// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Actor registry mapping actor ids to compact indices.
//!
//! Every entry in a sequence names its actor, and every origin names another
//! entry's actor. Storing full 32-byte ids there would make each id
//! comparison in the integration scan a 32-byte compare, so the sequence
//! stores a dense `ActorIdx` instead and keeps this table to translate.
//!
//! The table supports:
//! - Register or lookup: O(1) average case (hash map)
//! - Index to id: O(1) (array lookup)
//! - Indices are append-only and never reused

use rustc_hash::FxHashMap;

use super::id::ActorId;
use super::id::ActorIdx;

/// A table mapping actor ids to compact indices.
#[derive(Clone, Debug, Default)]
pub struct ActorRegistry {
    /// Map from actor id to index.
    id_to_idx: FxHashMap<ActorId, ActorIdx>,
    /// Map from index to actor id.
    idx_to_id: Vec<ActorId>,
}

impl ActorRegistry {
    /// Create a new empty registry.
    pub fn new() -> ActorRegistry {
        return ActorRegistry {
            id_to_idx: FxHashMap::default(),
            idx_to_id: Vec::new(),
        };
    }

    /// Look up an actor, assigning the next free index on first sight.
    ///
    /// Panics if more than `u32::MAX` actors are registered.
    pub fn register_or_lookup(&mut self, actor: &ActorId) -> ActorIdx {
        if let Some(&idx) = self.id_to_idx.get(actor) {
            return idx;
        }

        let idx = u32::try_from(self.idx_to_id.len()).expect("too many actors");
        let actor_idx = ActorIdx::new(idx);
        self.idx_to_id.push(*actor);
        self.id_to_idx.insert(*actor, actor_idx);

        return actor_idx;
    }

    /// Get the index for an actor, if it has been registered.
    #[inline]
    pub fn lookup(&self, actor: &ActorId) -> Option<ActorIdx> {
        return self.id_to_idx.get(actor).copied();
    }

    /// Get the actor id for an index, if it exists.
    #[inline]
    pub fn actor(&self, idx: ActorIdx) -> Option<&ActorId> {
        return self.idx_to_id.get(idx.as_usize());
    }

    /// Number of registered actors.
    #[inline]
    pub fn len(&self) -> usize {
        return self.idx_to_id.len();
    }

    /// Check if no actor has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.idx_to_id.is_empty();
    }

    /// Iterate over all (index, actor) pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ActorIdx, &ActorId)> {
        return self.idx_to_id
            .iter()
            .enumerate()
            .map(|(i, actor)| (ActorIdx::new(i as u32), actor));
    }

    /// Forget every actor.
    pub fn clear(&mut self) {
        self.id_to_idx.clear();
        self.idx_to_id.clear();
    }
}
