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

//! Multi-component views
//!
//! A view walks the dense entity list of the smallest participating pool and
//! keeps the entities that are members of every other pool. The driving
//! length is captured when the view is created; the view borrows the
//! database, so no structural change can happen while it is alive. Systems
//! that need to destroy or remove while iterating queue the change in a
//! [`CommandBuffer`](crate::command::CommandBuffer) or tag the entity with
//! [`PendingDelete`](crate::command::PendingDelete).

use std::marker::PhantomData;
use std::ptr::{addr_of, addr_of_mut, NonNull};

use crate::component::{Component, ComponentSet};
use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::pool::ComponentPool;
use crate::sparse_set::SparseSet;

/// Tuple of component types that can be viewed together
///
/// # Safety
/// Implementations must only hand out references into the pools returned by
/// `pools`/`pools_mut`, one element per pool per entity.
pub unsafe trait ViewQuery: ComponentSet {
    /// Raw pointers to the participating pools
    type Pools: Copy;

    /// `(Entity, &A, &B, ..)`
    type Item<'w>;

    /// `(Entity, &mut A, &mut B, ..)`
    type ItemMut<'w>;

    /// None if any participating type has no pool yet
    fn pools(db: &EntityDatabase) -> Option<Self::Pools>;

    fn pools_mut(db: &mut EntityDatabase) -> Option<Self::Pools>;

    /// Sparse set of the smallest participating pool
    ///
    /// # Safety
    /// Pool pointers must be valid.
    unsafe fn driving(pools: Self::Pools) -> NonNull<SparseSet>;

    /// # Safety
    /// Pool pointers must be valid.
    unsafe fn contains_all(pools: Self::Pools, entity: Entity) -> bool;

    /// # Safety
    /// `entity` must be a member of every pool.
    unsafe fn fetch<'w>(pools: Self::Pools, entity: Entity) -> Self::Item<'w>;

    /// # Safety
    /// `entity` must be a member of every pool, pools must come from
    /// `pools_mut`, the component types must be distinct and each entity
    /// fetched at most once per borrow.
    unsafe fn fetch_mut<'w>(pools: Self::Pools, entity: Entity) -> Self::ItemMut<'w>;
}

#[inline]
unsafe fn index_of<T>(pool: NonNull<ComponentPool<T>>) -> NonNull<SparseSet> {
    NonNull::new_unchecked(addr_of!((*pool.as_ptr()).index) as *mut SparseSet)
}

#[inline]
unsafe fn slot_of<T>(pool: NonNull<ComponentPool<T>>, entity: Entity) -> usize {
    let slot = (*index_of(pool).as_ptr()).dense_index(entity);
    debug_assert!(slot.is_some(), "fetch on non-member {entity:?}");
    slot.unwrap_or_default()
}

#[inline]
unsafe fn component_ref<'w, T>(pool: NonNull<ComponentPool<T>>, entity: Entity) -> &'w T {
    let slot = slot_of(pool, entity);
    let components = addr_of!((*pool.as_ptr()).components);
    &*(*components).as_ptr().add(slot)
}

#[inline]
unsafe fn component_mut<'w, T>(pool: NonNull<ComponentPool<T>>, entity: Entity) -> &'w mut T {
    let slot = slot_of(pool, entity);
    let components = addr_of_mut!((*pool.as_ptr()).components);
    &mut *(*components).as_mut_ptr().add(slot)
}

macro_rules! impl_view_query {
    ($($T:ident),*) => {
        #[allow(non_snake_case)]
        unsafe impl<$($T: Component),*> ViewQuery for ($($T,)*) {
            type Pools = ($(NonNull<ComponentPool<$T>>,)*);
            type Item<'w> = (Entity, $(&'w $T,)*);
            type ItemMut<'w> = (Entity, $(&'w mut $T,)*);

            fn pools(db: &EntityDatabase) -> Option<Self::Pools> {
                Some(($(NonNull::from(db.pool::<$T>()?),)*))
            }

            fn pools_mut(db: &mut EntityDatabase) -> Option<Self::Pools> {
                Some(($(NonNull::from(db.pool_mut::<$T>()?),)*))
            }

            unsafe fn driving(pools: Self::Pools) -> NonNull<SparseSet> {
                let ($($T,)*) = pools;
                let candidates = [$(index_of($T),)*];
                let mut smallest = candidates[0];
                for candidate in candidates {
                    if (*candidate.as_ptr()).len() < (*smallest.as_ptr()).len() {
                        smallest = candidate;
                    }
                }
                smallest
            }

            unsafe fn contains_all(pools: Self::Pools, entity: Entity) -> bool {
                let ($($T,)*) = pools;
                true $(&& (*index_of($T).as_ptr()).contains(entity))*
            }

            unsafe fn fetch<'w>(pools: Self::Pools, entity: Entity) -> Self::Item<'w> {
                let ($($T,)*) = pools;
                (entity, $(component_ref($T, entity),)*)
            }

            unsafe fn fetch_mut<'w>(pools: Self::Pools, entity: Entity) -> Self::ItemMut<'w> {
                let ($($T,)*) = pools;
                (entity, $(component_mut($T, entity),)*)
            }
        }
    };
}

impl_view_query!(A);
impl_view_query!(A, B);
impl_view_query!(A, B, C);
impl_view_query!(A, B, C, D);
impl_view_query!(A, B, C, D, E);
impl_view_query!(A, B, C, D, E, F);
impl_view_query!(A, B, C, D, E, F, G);
impl_view_query!(A, B, C, D, E, F, G, H);

/// Shared cursor over the driving set
struct Cursor<Q: ViewQuery> {
    pools: Option<Q::Pools>,
    driving: Option<NonNull<SparseSet>>,
    position: usize,
    end: usize,
}

impl<Q: ViewQuery> Cursor<Q> {
    fn new(pools: Option<Q::Pools>) -> Self {
        // SAFETY: pointers were just taken from a live borrow of the database
        let driving = pools.map(|p| unsafe { Q::driving(p) });
        let end = driving.map_or(0, |d| unsafe { (*d.as_ptr()).len() });
        Self {
            pools,
            driving,
            position: 0,
            end,
        }
    }

    /// Next entity present in every pool
    ///
    /// # Safety
    /// The pools must still be alive.
    unsafe fn advance(&mut self) -> Option<(Q::Pools, Entity)> {
        let pools = self.pools?;
        let driving = &*self.driving?.as_ptr();
        while self.position < self.end {
            let position = self.position;
            self.position += 1;

            let entity = *driving.entities().get(position)?;
            if Q::contains_all(pools, entity) {
                return Some((pools, entity));
            }
        }
        None
    }

    fn remaining(&self) -> usize {
        self.end - self.position
    }
}

/// Read-only view yielding `(Entity, &A, &B, ..)`
pub struct View<'w, Q: ViewQuery> {
    cursor: Cursor<Q>,
    _borrow: PhantomData<&'w EntityDatabase>,
}

impl<'w, Q: ViewQuery> View<'w, Q> {
    pub(crate) fn new(db: &'w EntityDatabase) -> Self {
        Self {
            cursor: Cursor::new(Q::pools(db)),
            _borrow: PhantomData,
        }
    }
}

impl<'w, Q: ViewQuery> Iterator for View<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the shared borrow of the database outlives 'w
        unsafe {
            let (pools, entity) = self.cursor.advance()?;
            Some(Q::fetch(pools, entity))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cursor.remaining()))
    }
}

/// Mutable view yielding `(Entity, &mut A, &mut B, ..)`
pub struct ViewMut<'w, Q: ViewQuery> {
    cursor: Cursor<Q>,
    _borrow: PhantomData<&'w mut EntityDatabase>,
}

impl<'w, Q: ViewQuery> ViewMut<'w, Q> {
    /// # Panics
    /// Panics if `Q` names the same component type twice.
    pub(crate) fn new(db: &'w mut EntityDatabase) -> Self {
        assert!(
            !Q::has_duplicates(),
            "view_mut requested the same component type twice: {}",
            std::any::type_name::<Q>()
        );
        Self {
            cursor: Cursor::new(Q::pools_mut(db)),
            _borrow: PhantomData,
        }
    }
}

impl<'w, Q: ViewQuery> Iterator for ViewMut<'w, Q> {
    type Item = Q::ItemMut<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: exclusive borrow of the database for 'w, distinct component
        // types, and the driving set yields each entity once
        unsafe {
            let (pools, entity) = self.cursor.advance()?;
            Some(Q::fetch_mut(pools, entity))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cursor.remaining()))
    }
}
