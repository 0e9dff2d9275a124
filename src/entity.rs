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

//! Entity identifiers and the id allocator.
//!
//! An [`Entity`] is a bare integer. Destroyed ids go onto a FIFO free-list and
//! are handed out again by later `create` calls, so a raw id kept across a
//! `destroy` may later name a different entity.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::bitset::BitSet;
use crate::error::{EcsError, Result};

/// Opaque entity handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Reserved handle that never refers to a live entity
    pub const NULL: Entity = Entity(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Slot in sparse arrays
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(NULL)")
        } else {
            write!(f, "Entity({})", self.0)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues entity ids and recycles destroyed ones.
///
/// The free-list holds spans of dead ids below `next`, oldest first. A
/// destroyed id is a span of one; ids skipped by `create_at` form one span.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next: u32,
    max_id: u32,
    free: VecDeque<Range<u32>>,
    alive: BitSet,
    live: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, u32::MAX - 1)
    }

    /// Allocator that never hands out an id above `max_id`.
    pub fn with_limits(capacity: usize, max_id: u32) -> Self {
        Self {
            next: 1,
            max_id: max_id.min(u32::MAX - 1),
            free: VecDeque::new(),
            alive: BitSet::with_capacity(capacity),
            live: 0,
        }
    }

    /// Allocate an entity, reusing the oldest destroyed id first.
    ///
    /// # Panics
    /// Panics when every id up to the limit is live.
    pub fn create(&mut self) -> Entity {
        match self.try_create() {
            Ok(entity) => entity,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_create(&mut self) -> Result<Entity> {
        let entity = match self.free.front_mut() {
            Some(span) => {
                let recycled = Entity(span.start);
                span.start += 1;
                if span.is_empty() {
                    self.free.pop_front();
                }
                recycled
            }
            None => {
                if self.next > self.max_id {
                    return Err(EcsError::EntityCapacityExhausted);
                }
                let fresh = Entity(self.next);
                self.next += 1;
                fresh
            }
        };

        self.alive.insert(entity.index());
        self.live += 1;
        Ok(entity)
    }

    /// Whether `create_at(entity)` would succeed.
    pub fn can_create_at(&self, entity: Entity) -> bool {
        !entity.is_null() && entity.0 <= self.max_id && !self.is_alive(entity)
    }

    /// Revive a specific id (scene restore keeps persisted ids stable).
    pub fn create_at(&mut self, entity: Entity) -> Result<()> {
        if !self.can_create_at(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        if entity.0 >= self.next {
            if entity.0 > self.next {
                self.free.push_back(self.next..entity.0);
            }
            self.next = entity.0 + 1;
        } else {
            self.take_free(entity.0);
        }

        self.alive.insert(entity.index());
        self.live += 1;
        Ok(())
    }

    /// Cut `id` out of the span holding it.
    fn take_free(&mut self, id: u32) {
        let Some(at) = self.free.iter().position(|span| span.contains(&id)) else {
            return;
        };
        let tail = id + 1..self.free[at].end;
        self.free[at].end = id;
        if !tail.is_empty() {
            self.free.insert(at + 1, tail);
        }
        if self.free[at].is_empty() {
            self.free.remove(at);
        }
    }

    /// Return `entity` to the free-list. False for `NULL` or dead ids.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if entity.is_null() || !self.alive.remove(entity.index()) {
            return false;
        }
        self.free.push_back(entity.0..entity.0 + 1);
        self.live -= 1;
        true
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        !entity.is_null() && self.alive.contains(entity.index())
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entities in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.ones().map(|index| Entity(index as u32))
    }

    /// Forget every id; the next `create` starts from 1 again.
    pub fn clear(&mut self) {
        self.next = 1;
        self.free.clear();
        self.alive.clear();
        self.live = 0;
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_never_returns_null() {
        let mut allocator = EntityAllocator::new();
        let first = allocator.create();
        assert!(!first.is_null());
        assert_eq!(first.to_raw(), 1);
        assert!(allocator.is_alive(first));
        assert!(!allocator.is_alive(Entity::NULL));
    }

    #[test]
    fn test_destroy_recycles_oldest_first() {
        let mut allocator = EntityAllocator::new();
        let e1 = allocator.create();
        let e2 = allocator.create();
        let _e3 = allocator.create();

        assert!(allocator.destroy(e2));
        assert!(allocator.destroy(e1));
        assert_eq!(allocator.len(), 1);

        assert_eq!(allocator.create(), e2);
        assert_eq!(allocator.create(), e1);
        assert_eq!(allocator.create().to_raw(), 4);
    }

    #[test]
    fn test_destroy_dead_or_null_is_rejected() {
        let mut allocator = EntityAllocator::new();
        let e = allocator.create();
        assert!(allocator.destroy(e));
        assert!(!allocator.destroy(e));
        assert!(!allocator.destroy(Entity::NULL));
        assert!(!allocator.destroy(Entity::from_raw(99)));
        assert_eq!(allocator.len(), 0);
    }

    #[test]
    fn test_create_at_fills_gap_into_free_list() {
        let mut allocator = EntityAllocator::new();
        allocator.create_at(Entity::from_raw(4)).unwrap();
        assert!(allocator.is_alive(Entity::from_raw(4)));

        // 1..=3 were skipped and are now reusable
        assert_eq!(allocator.create().to_raw(), 1);
        assert_eq!(allocator.create().to_raw(), 2);
        assert_eq!(allocator.create().to_raw(), 3);
        assert_eq!(allocator.create().to_raw(), 5);

        assert!(allocator.create_at(Entity::from_raw(4)).is_err());
        assert!(allocator.create_at(Entity::NULL).is_err());
    }

    #[test]
    fn test_large_gap_is_one_span() {
        let mut allocator = EntityAllocator::new();
        allocator.create_at(Entity::from_raw(1 << 20)).unwrap();
        assert_eq!(allocator.free.len(), 1);

        // Reviving an id inside the gap splits it around that id
        allocator.create_at(Entity::from_raw(3)).unwrap();
        assert_eq!(allocator.free, VecDeque::from(vec![1..3, 4..(1 << 20)]));
        let next: Vec<u32> = (0..3).map(|_| allocator.create().to_raw()).collect();
        assert_eq!(next, vec![1, 2, 4]);
        assert_eq!(allocator.len(), 5);
    }

    #[test]
    fn test_ids_above_limit_are_rejected() {
        let mut allocator = EntityAllocator::with_limits(0, 2);
        assert_eq!(
            allocator.create_at(Entity::from_raw(3_000_000_000)),
            Err(EcsError::InvalidEntity(Entity::from_raw(3_000_000_000)))
        );
        assert!(allocator.is_empty());
        assert!(allocator.free.is_empty());

        allocator.create();
        allocator.create();
        assert_eq!(allocator.try_create(), Err(EcsError::EntityCapacityExhausted));
        assert!(!allocator.can_create_at(Entity::from_raw(u32::MAX)));
    }

    #[test]
    fn test_iter_lists_live_ids() {
        let mut allocator = EntityAllocator::new();
        let ids: Vec<_> = (0..5).map(|_| allocator.create()).collect();
        allocator.destroy(ids[1]);
        allocator.destroy(ids[3]);
        let live: Vec<u32> = allocator.iter().map(Entity::to_raw).collect();
        assert_eq!(live, vec![1, 3, 5]);
    }
}
