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

//! Change observers
//!
//! An observer is a queue shared between a component pool and the consumer
//! holding the handle. Every `set`/`remove` on the pool appends to each
//! attached queue; the consumer drains it, usually once per frame. Observers
//! of the same type do not share state. Dropping a handle detaches its queue.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::entity::Entity;

/// Kind of structural change recorded by an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Component added to an entity that lacked it
    Created,

    /// Existing component overwritten
    Updated,

    /// Component removed (explicitly or by entity destruction)
    Removed,
}

/// One queued change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub entity: Entity,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn created(entity: Entity) -> Self {
        Self {
            entity,
            kind: ChangeKind::Created,
        }
    }

    pub fn updated(entity: Entity) -> Self {
        Self {
            entity,
            kind: ChangeKind::Updated,
        }
    }

    pub fn removed(entity: Entity) -> Self {
        Self {
            entity,
            kind: ChangeKind::Removed,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChangeQueue {
    events: Mutex<Vec<ChangeEvent>>,
}

impl ChangeQueue {
    pub(crate) fn push(&self, event: ChangeEvent) {
        self.events.lock().push(event);
    }
}

/// Handle to one change queue of component type `T`
pub struct Observer<T> {
    queue: Arc<ChangeQueue>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Observer<T> {
    pub(crate) fn new(queue: Arc<ChangeQueue>) -> Self {
        Self {
            queue,
            _marker: PhantomData,
        }
    }

    /// Queued events since the last `clear`/`drain`, in call order
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.queue.events.lock().clone()
    }

    /// Take all queued events, leaving the queue empty
    pub fn drain(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.queue.events.lock())
    }

    pub fn clear(&self) {
        self.queue.events.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.events.lock().is_empty()
    }
}

impl<T> std::fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("component", &std::any::type_name::<T>())
            .field("pending", &self.len())
            .finish()
    }
}

/// Receives removed values for component type `T`
pub(crate) trait RemovalSink<T>: Send + Sync {
    fn record(&self, entity: Entity, value: &T);
}

pub(crate) struct RemovalQueue<T> {
    entries: Mutex<Vec<(Entity, T)>>,
}

impl<T> Default for RemovalQueue<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone + Send + Sync> RemovalSink<T> for RemovalQueue<T> {
    fn record(&self, entity: Entity, value: &T) {
        self.entries.lock().push((entity, value.clone()));
    }
}

/// Handle to a queue of removed `(entity, value)` pairs
///
/// Lets a consumer release whatever a component referenced after the
/// component itself is gone.
pub struct RemovalObserver<T> {
    queue: Arc<RemovalQueue<T>>,
}

impl<T> RemovalObserver<T> {
    pub(crate) fn new(queue: Arc<RemovalQueue<T>>) -> Self {
        Self { queue }
    }

    pub fn drain(&self) -> Vec<(Entity, T)> {
        std::mem::take(&mut *self.queue.entries.lock())
    }

    pub fn clear(&self) {
        self.queue.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.entries.lock().is_empty()
    }
}

impl<T: Clone> RemovalObserver<T> {
    pub fn entries(&self) -> Vec<(Entity, T)> {
        self.queue.entries.lock().clone()
    }
}
