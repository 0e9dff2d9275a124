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

//! Component pools
//!
//! A pool stores every value of one component type in a dense `Vec<T>` kept
//! index-parallel with its [`SparseSet`]: `components[i]` belongs to
//! `index.entities()[i]`. Removal is a swap-remove on both arrays, so the
//! position of the last member changes.

use std::any::Any;
use std::sync::Arc;

use crate::component::{component_name, Component};
use crate::entity::Entity;
use crate::observer::{ChangeEvent, ChangeKind, ChangeQueue, RemovalQueue, RemovalSink};
use crate::sparse_set::SparseSet;

/// Dense storage of one component type
pub struct ComponentPool<T> {
    pub(crate) index: SparseSet,
    pub(crate) components: Vec<T>,
    observers: Vec<Arc<ChangeQueue>>,
    removal_sinks: Vec<Arc<dyn RemovalSink<T>>>,
}

impl<T: Component> ComponentPool<T> {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(entity_capacity: usize, capacity: usize) -> Self {
        Self {
            index: SparseSet::with_capacity(entity_capacity, capacity),
            components: Vec::with_capacity(capacity),
            observers: Vec::new(),
            removal_sinks: Vec::new(),
        }
    }

    /// Insert `value`, or overwrite in place if `entity` already has one.
    pub fn insert(&mut self, entity: Entity, value: T) -> ChangeKind {
        if let Some(slot) = self.index.dense_index(entity) {
            self.components[slot] = value;
            self.notify(ChangeEvent::updated(entity));
            return ChangeKind::Updated;
        }

        let slot = self.index.insert(entity);
        self.components.push(value);
        debug_assert_eq!(slot + 1, self.components.len());
        self.notify(ChangeEvent::created(entity));
        ChangeKind::Created
    }

    /// Swap-remove the component of `entity` and return it.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.index.swap_remove(entity)?;
        let value = self.components.swap_remove(slot);
        debug_assert_eq!(self.index.len(), self.components.len());

        self.notify(ChangeEvent::removed(entity));
        self.record_removal(entity, &value);
        Some(value)
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains(entity)
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let slot = self.index.dense_index(entity)?;
        self.components.get(slot)
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = self.index.dense_index(entity)?;
        self.components.get_mut(slot)
    }

    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        self.index.dense_index(entity)
    }

    /// Remove every member, emitting `Removed` for each.
    pub fn clear(&mut self) {
        let entities = std::mem::take(&mut self.index);
        let components = std::mem::take(&mut self.components);
        for (&entity, value) in entities.entities().iter().zip(&components) {
            self.notify(ChangeEvent::removed(entity));
            self.record_removal(entity, value);
        }
        // Keep the sparse allocation around for the next frame
        self.index = entities;
        self.index.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Member entities in dense order
    pub fn entities(&self) -> &[Entity] {
        self.index.entities()
    }

    /// Component values in dense order
    pub fn components(&self) -> &[T] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.index.entities().iter().copied().zip(self.components.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.index
            .entities()
            .iter()
            .copied()
            .zip(self.components.iter_mut())
    }

    /// Sparse/dense invariants plus value-array alignment
    pub fn validate(&self) -> bool {
        self.index.validate() && self.index.len() == self.components.len()
    }

    /// Attach a fresh change queue unless `limit` live queues already exist.
    pub(crate) fn attach_observer(&mut self, limit: usize) -> Option<Arc<ChangeQueue>> {
        self.prune_observers();
        if self.live_observers() >= limit {
            return None;
        }
        let queue = Arc::new(ChangeQueue::default());
        self.observers.push(queue.clone());
        Some(queue)
    }

    pub(crate) fn notify_updated(&mut self, entity: Entity) {
        self.notify(ChangeEvent::updated(entity));
    }

    /// Number of attached change and removal queues that still have a handle
    pub fn live_observers(&self) -> usize {
        self.observers
            .iter()
            .filter(|q| Arc::strong_count(*q) > 1)
            .count()
            + self
                .removal_sinks
                .iter()
                .filter(|s| Arc::strong_count(*s) > 1)
                .count()
    }

    fn notify(&mut self, event: ChangeEvent) {
        if self.observers.is_empty() {
            return;
        }
        self.observers.retain(|q| Arc::strong_count(q) > 1);
        for queue in &self.observers {
            queue.push(event);
        }
    }

    fn record_removal(&mut self, entity: Entity, value: &T) {
        if self.removal_sinks.is_empty() {
            return;
        }
        self.removal_sinks.retain(|s| Arc::strong_count(s) > 1);
        for sink in &self.removal_sinks {
            sink.record(entity, value);
        }
    }

    fn prune_observers(&mut self) {
        self.observers.retain(|q| Arc::strong_count(q) > 1);
        self.removal_sinks.retain(|s| Arc::strong_count(s) > 1);
    }
}

impl<T: Component + Clone> ComponentPool<T> {
    pub(crate) fn attach_removal_observer(
        &mut self,
        limit: usize,
    ) -> Option<Arc<RemovalQueue<T>>> {
        self.prune_observers();
        if self.live_observers() >= limit {
            return None;
        }
        let queue = Arc::new(RemovalQueue::<T>::default());
        let sink: Arc<dyn RemovalSink<T>> = queue.clone();
        self.removal_sinks.push(sink);
        Some(queue)
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased pool interface
///
/// Lets the database destroy an entity across every pool without knowing the
/// concrete component types.
pub trait ErasedPool: Send + Sync {
    fn contains(&self, entity: Entity) -> bool;

    /// Remove `entity`'s component if present, emitting `Removed`.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entities(&self) -> &[Entity];

    fn live_observers(&self) -> usize;

    fn component_name(&self) -> &'static str;

    fn validate(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn contains(&self, entity: Entity) -> bool {
        ComponentPool::contains(self, entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clear(&mut self) {
        ComponentPool::clear(self)
    }

    fn len(&self) -> usize {
        ComponentPool::len(self)
    }

    fn entities(&self) -> &[Entity] {
        ComponentPool::entities(self)
    }

    fn live_observers(&self) -> usize {
        ComponentPool::live_observers(self)
    }

    fn component_name(&self) -> &'static str {
        component_name::<T>()
    }

    fn validate(&self) -> bool {
        ComponentPool::validate(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{Observer, RemovalObserver};

    #[derive(Debug, Clone, PartialEq)]
    struct Tag(u32);

    fn e(raw: u32) -> Entity {
        Entity::from_raw(raw)
    }

    #[test]
    fn test_insert_then_overwrite_keeps_slot() {
        let mut pool = ComponentPool::new();
        assert_eq!(pool.insert(e(1), Tag(1)), ChangeKind::Created);
        assert_eq!(pool.insert(e(2), Tag(2)), ChangeKind::Created);
        assert_eq!(pool.insert(e(1), Tag(10)), ChangeKind::Updated);

        assert_eq!(pool.dense_index(e(1)), Some(0));
        assert_eq!(pool.get(e(1)), Some(&Tag(10)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_swap_remove_keeps_values_aligned() {
        let mut pool = ComponentPool::new();
        for raw in 1..=5 {
            pool.insert(e(raw), Tag(raw * 100));
        }

        assert_eq!(pool.remove(e(2)), Some(Tag(200)));
        assert_eq!(pool.dense_index(e(5)), Some(1));
        for raw in [1, 3, 4, 5] {
            assert_eq!(pool.get(e(raw)), Some(&Tag(raw * 100)));
        }
        assert!(pool.get(e(2)).is_none());
        assert!(pool.validate());
    }

    #[test]
    fn test_dropped_observer_is_detached() {
        let mut pool = ComponentPool::<Tag>::new();
        let queue = pool.attach_observer(4).unwrap();
        let observer = Observer::<Tag>::new(queue);
        assert_eq!(pool.live_observers(), 1);

        pool.insert(e(1), Tag(1));
        assert_eq!(observer.len(), 1);

        drop(observer);
        pool.insert(e(2), Tag(2));
        assert_eq!(pool.live_observers(), 0);
    }

    #[test]
    fn test_observer_limit() {
        let mut pool = ComponentPool::<Tag>::new();
        let first = pool.attach_observer(1);
        assert!(first.is_some());
        assert!(pool.attach_observer(1).is_none());
        drop(first);
        assert!(pool.attach_observer(1).is_some());
    }

    #[test]
    fn test_clear_reports_removed_values() {
        let mut pool = ComponentPool::new();
        let removed = RemovalObserver::new(pool.attach_removal_observer(4).unwrap());
        pool.insert(e(3), Tag(3));
        pool.insert(e(4), Tag(4));
        pool.clear();

        assert!(pool.is_empty());
        assert!(!pool.contains(e(3)));
        assert_eq!(removed.entries(), vec![(e(3), Tag(3)), (e(4), Tag(4))]);
    }
}
