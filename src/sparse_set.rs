// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sparse set index
//!
//! `sparse` is indexed directly by entity id and holds a slot into `dense`;
//! `dense` lists member entities contiguously. Component pools keep their
//! value array index-parallel with `dense`.
//!
//! Invariant: `sparse[dense[i]] == i` for every `i < dense.len()`.

use crate::entity::Entity;

/// Sentinel for "no dense slot"
pub const DEAD_INDEX: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
pub struct SparseSet {
    sparse: Vec<usize>,
    dense: Vec<Entity>,
}

impl SparseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(entity_capacity: usize, dense_capacity: usize) -> Self {
        Self {
            sparse: vec![DEAD_INDEX; entity_capacity],
            dense: Vec::with_capacity(dense_capacity),
        }
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Dense slot of `entity`, if it is a member
    #[inline]
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        match self.sparse.get(entity.index()) {
            Some(&slot) if slot != DEAD_INDEX && self.dense.get(slot) == Some(&entity) => {
                Some(slot)
            }
            _ => None,
        }
    }

    /// Append `entity` and return its dense slot.
    ///
    /// Caller guarantees `entity` is not already a member.
    pub fn insert(&mut self, entity: Entity) -> usize {
        debug_assert!(!self.contains(entity), "{entity:?} already in sparse set");

        let index = entity.index();
        if index >= self.sparse.len() {
            let grown = (index + 1).next_power_of_two();
            self.sparse.resize(grown, DEAD_INDEX);
        }

        let slot = self.dense.len();
        self.dense.push(entity);
        self.sparse[index] = slot;
        slot
    }

    /// Swap-remove `entity`. The last member moves into the vacated slot.
    ///
    /// Returns the vacated slot so a parallel value array can mirror the move.
    pub fn swap_remove(&mut self, entity: Entity) -> Option<usize> {
        let slot = self.dense_index(entity)?;

        self.dense.swap_remove(slot);
        if let Some(&moved) = self.dense.get(slot) {
            self.sparse[moved.index()] = slot;
            debug_assert_eq!(self.dense[self.sparse[moved.index()]], moved);
        }
        self.sparse[entity.index()] = DEAD_INDEX;

        Some(slot)
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn clear(&mut self) {
        self.sparse.iter_mut().for_each(|slot| *slot = DEAD_INDEX);
        self.dense.clear();
    }

    /// Full invariant check. O(sparse + dense).
    pub fn validate(&self) -> bool {
        let forward = self
            .dense
            .iter()
            .enumerate()
            .all(|(i, e)| self.sparse.get(e.index()) == Some(&i));
        let live_slots = self.sparse.iter().filter(|&&s| s != DEAD_INDEX).count();
        forward && live_slots == self.dense.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(raw: u32) -> Entity {
        Entity::from_raw(raw)
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = SparseSet::new();
        assert_eq!(set.insert(e(5)), 0);
        assert_eq!(set.insert(e(2)), 1);
        assert!(set.contains(e(5)));
        assert!(set.contains(e(2)));
        assert!(!set.contains(e(3)));
        assert!(!set.contains(e(1000)));
        assert_eq!(set.entities(), &[e(5), e(2)]);
        assert!(set.validate());
    }

    #[test]
    fn test_swap_remove_moves_last_into_hole() {
        let mut set = SparseSet::new();
        for raw in 1..=4 {
            set.insert(e(raw));
        }

        assert_eq!(set.swap_remove(e(2)), Some(1));
        assert_eq!(set.entities(), &[e(1), e(4), e(3)]);
        assert_eq!(set.dense_index(e(4)), Some(1));
        assert!(!set.contains(e(2)));
        assert!(set.validate());
    }

    #[test]
    fn test_swap_remove_last_and_missing() {
        let mut set = SparseSet::new();
        set.insert(e(1));
        set.insert(e(2));

        assert_eq!(set.swap_remove(e(2)), Some(1));
        assert_eq!(set.swap_remove(e(2)), None);
        assert_eq!(set.swap_remove(e(77)), None);
        assert_eq!(set.len(), 1);
        assert!(set.validate());
    }

    #[test]
    fn test_clear_resets_membership() {
        let mut set = SparseSet::with_capacity(16, 4);
        set.insert(e(3));
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(e(3)));
        assert!(set.validate());
    }
}
