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

//! EntityDatabase: the entity allocator plus one sparse-set pool per
//! component type
//!
//! Single-threaded: one logical thread mutates the database at a time and
//! per-frame systems are ordered by the caller.

use ahash::AHashMap;
use std::any::TypeId;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::component::{component_name, Component};
use crate::config::DatabaseConfig;
use crate::entity::{Entity, EntityAllocator};
use crate::error::{EcsError, Result};
use crate::observer::{Observer, RemovalObserver};
use crate::pool::{ComponentPool, ErasedPool};
use crate::registry::ComponentRegistry;
use crate::view::{View, ViewMut, ViewQuery};

/// Per-pool statistics for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSummary {
    pub component: &'static str,
    pub len: usize,
    pub live_observers: usize,
}

/// Central entity database
pub struct EntityDatabase {
    allocator: EntityAllocator,

    /// One type-erased pool per component type
    pools: AHashMap<TypeId, Box<dyn ErasedPool>>,

    config: DatabaseConfig,
}

impl EntityDatabase {
    /// Create a new, empty database with default configuration.
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            allocator: EntityAllocator::with_limits(
                config.initial_entity_capacity,
                config.max_entity_id,
            ),
            pools: AHashMap::with_capacity(32),
            config,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Create the pool for `T` ahead of use. Returns false if it existed.
    pub fn register<T: Component>(&mut self) -> bool {
        if self.pools.contains_key(&TypeId::of::<T>()) {
            return false;
        }
        self.pool_or_insert::<T>();
        true
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.pools.contains_key(&TypeId::of::<T>())
    }

    /// Create an entity with no components.
    ///
    /// # Panics
    /// Panics once every id up to `max_entity_id` is live.
    pub fn create(&mut self) -> Entity {
        self.allocator.create()
    }

    pub fn try_create(&mut self) -> Result<Entity> {
        self.allocator.try_create()
    }

    /// Create an entity with a specific id (scene restore).
    ///
    /// Fails with `InvalidEntity` for `NULL`, a live id, or an id above
    /// `max_entity_id`.
    pub fn create_at(&mut self, entity: Entity) -> Result<()> {
        self.allocator.create_at(entity)
    }

    pub fn can_create_at(&self, entity: Entity) -> bool {
        self.allocator.can_create_at(entity)
    }

    #[inline]
    pub fn exists(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.len()
    }

    /// Live entities in ascending id order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocator.iter()
    }

    /// Remove `entity` from every pool and recycle its id.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        if !self.allocator.is_alive(entity) {
            tracing::debug!(%entity, "destroy on dead or null entity");
            return Err(EcsError::InvalidEntity(entity));
        }

        for pool in self.pools.values_mut() {
            pool.remove_entity(entity);
        }
        self.allocator.destroy(entity);
        tracing::trace!(%entity, "entity destroyed");
        Ok(())
    }

    /// Add `value` to `entity`, or overwrite the existing one in place.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> Result<()> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        self.pool_or_insert::<T>().insert(entity, value);
        Ok(())
    }

    #[inline]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.pool::<T>()
            .and_then(|pool| pool.get(entity))
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: component_name::<T>(),
            })
    }

    /// Mutable access without an `Updated` event; see [`Self::update`].
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.pool_mut::<T>()
            .and_then(|pool| pool.get_mut(entity))
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: component_name::<T>(),
            })
    }

    /// Mutate a component in place and emit `Updated`.
    pub fn update<T: Component, R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let not_found = EcsError::ComponentNotFound {
            entity,
            component: component_name::<T>(),
        };
        let pool = self.pool_mut::<T>().ok_or_else(|| not_found.clone())?;
        let result = f(pool.get_mut(entity).ok_or(not_found)?);
        pool.notify_updated(entity);
        Ok(result)
    }

    /// Swap-remove `T` from `entity` and return the removed value.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<T> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        self.pool_mut::<T>()
            .and_then(|pool| pool.remove(entity))
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: component_name::<T>(),
            })
    }

    /// Number of entities that have `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.pool::<T>().map_or(0, ComponentPool::len)
    }

    /// Remove `T` from every entity, emitting `Removed` for each.
    pub fn clear_components<T: Component>(&mut self) {
        if let Some(pool) = self.pool_mut::<T>() {
            pool.clear();
        }
    }

    /// Destroy every entity and component. Pools and observers stay attached.
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.allocator.clear();
    }

    /// Overwrite `target` with a copy of this database.
    ///
    /// Ids and the free-list carry over, so both sides hand out the same ids
    /// afterwards. Components go through `registry`; unregistered types are
    /// not copied. Observers on `target` stay attached and see the clear and
    /// the copy. On error `target` is untouched.
    pub fn duplicate_into(
        &self,
        registry: &ComponentRegistry,
        target: &mut EntityDatabase,
    ) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("database.duplicate", entities = self.entity_count()).entered();

        let mut staged = Vec::new();
        for registration in registry.iter() {
            for entity in self.entities() {
                if (registration.has_fn)(self, entity) {
                    let value = (registration.get_fn)(self, entity)?;
                    (registration.validate_fn)(&value)?;
                    staged.push((registration, entity, value));
                }
            }
        }

        target.clear();
        target.allocator = self.allocator.clone();
        target.config = self.config.clone();
        let components = staged.len();
        for (registration, entity, value) in staged {
            (registration.set_fn)(target, entity, value)?;
        }
        tracing::debug!(
            entities = self.entity_count(),
            components,
            "database duplicated"
        );
        Ok(())
    }

    /// Fresh copy of this database; see [`duplicate_into`](Self::duplicate_into).
    pub fn duplicate(&self, registry: &ComponentRegistry) -> Result<EntityDatabase> {
        let mut copy = EntityDatabase::with_config(self.config.clone());
        self.duplicate_into(registry, &mut copy)?;
        Ok(copy)
    }

    /// `(Entity, &T)` over one pool in dense order
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.pool::<T>().into_iter().flat_map(|pool| pool.iter())
    }

    /// Entities owning every type in `Q`, with shared references.
    pub fn view<Q: ViewQuery>(&self) -> View<'_, Q> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("database.view", query = std::any::type_name::<Q>()).entered();
        View::new(self)
    }

    /// Entities owning every type in `Q`, with mutable references.
    ///
    /// # Panics
    /// Panics if `Q` repeats a component type.
    pub fn view_mut<Q: ViewQuery>(&mut self) -> ViewMut<'_, Q> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("database.view_mut", query = std::any::type_name::<Q>()).entered();
        ViewMut::new(self)
    }

    /// Attach a change queue to `T`'s pool.
    pub fn observe<T: Component>(&mut self) -> Result<Observer<T>> {
        let limit = self.config.max_observers_per_component;
        self.pool_or_insert::<T>()
            .attach_observer(limit)
            .map(Observer::new)
            .ok_or_else(|| observer_limit::<T>(limit))
    }

    /// Attach a queue receiving a clone of every removed `T`.
    pub fn observe_removed<T: Component + Clone>(&mut self) -> Result<RemovalObserver<T>> {
        let limit = self.config.max_observers_per_component;
        self.pool_or_insert::<T>()
            .attach_removal_observer(limit)
            .map(RemovalObserver::new)
            .ok_or_else(|| observer_limit::<T>(limit))
    }

    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
    }

    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
    }

    /// Registered pools sorted by component name
    pub fn pool_summaries(&self) -> Vec<PoolSummary> {
        let mut summaries: Vec<_> = self
            .pools
            .values()
            .map(|pool| PoolSummary {
                component: pool.component_name(),
                len: pool.len(),
                live_observers: pool.live_observers(),
            })
            .collect();
        summaries.sort_by(|a, b| a.component.cmp(b.component));
        summaries
    }

    /// Check sparse/dense invariants of every pool and that no pool holds a
    /// dead entity.
    pub fn validate(&self) -> bool {
        self.pools.values().all(|pool| {
            pool.validate() && pool.entities().iter().all(|&e| self.allocator.is_alive(e))
        })
    }

    /// Run `f` over every `T` in parallel.
    #[cfg(feature = "parallel")]
    pub fn par_for_each_mut<T, F>(&mut self, f: F)
    where
        T: Component,
        F: Fn(Entity, &mut T) + Send + Sync,
    {
        use rayon::prelude::*;

        if let Some(pool) = self.pool_mut::<T>() {
            let ComponentPool {
                index, components, ..
            } = pool;
            index
                .entities()
                .par_iter()
                .zip(components.par_iter_mut())
                .for_each(|(&entity, component)| f(entity, component));
        }
    }

    fn pool_or_insert<T: Component>(&mut self) -> &mut ComponentPool<T> {
        let entity_capacity = self.config.initial_entity_capacity;
        let pool_capacity = self.config.initial_pool_capacity;
        let pool = self.pools.entry(TypeId::of::<T>()).or_insert_with(|| {
            tracing::debug!(component = component_name::<T>(), "component pool created");
            Box::new(ComponentPool::<T>::with_capacity(
                entity_capacity,
                pool_capacity,
            ))
        });
        match pool.as_any_mut().downcast_mut::<ComponentPool<T>>() {
            Some(pool) => pool,
            None => unreachable!("pool keyed by TypeId holds another type"),
        }
    }
}

fn observer_limit<T: Component>(limit: usize) -> EcsError {
    tracing::warn!(
        component = component_name::<T>(),
        limit,
        "observer limit reached"
    );
    EcsError::ObserverLimitReached {
        component: component_name::<T>(),
        limit,
    }
}

impl Default for EntityDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDatabase")
            .field("entities", &self.entity_count())
            .field("pools", &self.pools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    #[derive(Debug, Clone, PartialEq)]
    struct Speed(f32);

    #[test]
    fn test_set_get_overwrite() {
        let mut db = EntityDatabase::new();
        let e = db.create();
        db.set(e, Health(100)).unwrap();
        db.set(e, Health(50)).unwrap();
        assert_eq!(db.get::<Health>(e).unwrap(), &Health(50));
        assert_eq!(db.pool::<Health>().unwrap().dense_index(e), Some(0));
    }

    #[test]
    fn test_get_missing_component_is_recoverable() {
        let mut db = EntityDatabase::new();
        let e = db.create();
        assert_eq!(
            db.get::<Health>(e),
            Err(EcsError::ComponentNotFound {
                entity: e,
                component: "Health"
            })
        );
        db.set(e, Speed(1.0)).unwrap();
        assert!(db.get::<Health>(e).is_err());
        assert!(db.validate());
    }

    #[test]
    fn test_mutation_on_invalid_entity_is_reported() {
        let mut db = EntityDatabase::new();
        assert_eq!(
            db.set(Entity::NULL, Health(1)),
            Err(EcsError::InvalidEntity(Entity::NULL))
        );

        let e = db.create();
        db.destroy(e).unwrap();
        assert!(matches!(db.set(e, Health(1)), Err(EcsError::InvalidEntity(_))));
        assert!(matches!(db.remove::<Health>(e), Err(EcsError::InvalidEntity(_))));
        assert!(matches!(db.destroy(e), Err(EcsError::InvalidEntity(_))));
        assert!(!db.has::<Health>(e));
    }

    #[test]
    fn test_remove_returns_value() {
        let mut db = EntityDatabase::new();
        let e = db.create();
        db.set(e, Health(7)).unwrap();
        assert_eq!(db.remove::<Health>(e), Ok(Health(7)));
        assert!(matches!(
            db.remove::<Health>(e),
            Err(EcsError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn test_update_emits_event() {
        let mut db = EntityDatabase::new();
        let e = db.create();
        db.set(e, Health(10)).unwrap();
        let observer = db.observe::<Health>().unwrap();

        let doubled = db.update::<Health, _>(e, |h| {
            h.0 *= 2;
            h.0
        });
        assert_eq!(doubled, Ok(20));
        assert_eq!(observer.drain().len(), 1);

        // get_mut is silent
        db.get_mut::<Health>(e).unwrap().0 = 1;
        assert!(observer.is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut db = EntityDatabase::new();
        assert!(!db.is_registered::<Health>());
        assert!(db.register::<Health>());
        assert!(!db.register::<Health>());
        assert_eq!(db.component_count::<Health>(), 0);
    }

    #[test]
    fn test_observer_limit_from_config() {
        let config = DatabaseConfig {
            max_observers_per_component: 1,
            ..DatabaseConfig::default()
        };
        let mut db = EntityDatabase::with_config(config);
        let _first = db.observe::<Health>().unwrap();
        assert!(matches!(
            db.observe::<Health>(),
            Err(EcsError::ObserverLimitReached { limit: 1, .. })
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut db = EntityDatabase::new();
        for i in 0..4 {
            let e = db.create();
            db.set(e, Health(i)).unwrap();
        }
        db.clear();
        assert_eq!(db.entity_count(), 0);
        assert_eq!(db.component_count::<Health>(), 0);
        assert_eq!(db.create().to_raw(), 1);
    }

    #[test]
    fn test_pool_summaries_sorted() {
        let mut db = EntityDatabase::new();
        let e = db.create();
        db.set(e, Speed(2.0)).unwrap();
        db.set(e, Health(1)).unwrap();
        let names: Vec<_> = db.pool_summaries().iter().map(|s| s.component).collect();
        assert_eq!(names, vec!["Health", "Speed"]);
    }

    #[test]
    fn test_ids_above_config_limit_are_rejected() {
        let config = DatabaseConfig {
            max_entity_id: 16,
            ..DatabaseConfig::default()
        };
        let mut db = EntityDatabase::with_config(config);
        let huge = Entity::from_raw(3_000_000_000);
        assert!(!db.can_create_at(huge));
        assert_eq!(db.create_at(huge), Err(EcsError::InvalidEntity(huge)));
        assert_eq!(db.entity_count(), 0);
        db.create_at(Entity::from_raw(16)).unwrap();
        assert_eq!(db.create().to_raw(), 1);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_par_for_each_mut() {
        let mut db = EntityDatabase::new();
        for i in 0..1000 {
            let e = db.create();
            db.set(e, Health(i)).unwrap();
        }
        db.par_for_each_mut::<Health, _>(|_, h| h.0 += 1);
        assert!(db.iter::<Health>().all(|(e, h)| h.0 == e.to_raw()));
    }
}
