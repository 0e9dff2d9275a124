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

//! Deferred structural changes
//!
//! Views borrow the database, so a system that decides to destroy or remove
//! while iterating records the change here and applies it afterwards.

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::component::Component;
use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::error::Result;
use crate::hierarchy::destroy_recursive;

/// Type alias for database mutation closures
pub type CommandClosure = Box<dyn FnOnce(&mut EntityDatabase) -> Result<()> + Send>;

/// Deferred database mutation
pub enum Command {
    Destroy(Entity),

    /// Custom database mutation
    Custom(CommandClosure),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Destroy(e) => f.debug_tuple("Destroy").field(e).finish(),
            Command::Custom(_) => write!(f, "Custom(...)"),
        }
    }
}

/// Command buffer for deferred operations
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn destroy(&mut self, entity: Entity) {
        self.commands.push(Command::Destroy(entity));
    }

    /// Queue a custom database mutation
    pub fn add<F>(&mut self, f: F)
    where
        F: FnOnce(&mut EntityDatabase) -> Result<()> + Send + 'static,
    {
        self.commands.push(Command::Custom(Box::new(f)));
    }

    pub fn set<T: Component>(&mut self, entity: Entity, component: T) {
        self.add(move |db| db.set(entity, component));
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.add(move |db| db.remove::<T>(entity).map(|_| ()));
    }

    /// Apply queued commands in order and empty the buffer.
    ///
    /// Stops at the first failing command and returns its error; the
    /// commands after it are discarded.
    pub fn apply(&mut self, db: &mut EntityDatabase) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("commands.apply", count = self.commands.len()).entered();

        for command in self.commands.drain(..) {
            match command {
                Command::Destroy(entity) => db.destroy(entity)?,
                Command::Custom(f) => f(db)?,
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Marker for entities to be destroyed by [`sweep_pending_deletes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingDelete;

/// Destroy every entity tagged with [`PendingDelete`] along with its
/// descendants. Returns the number of entities destroyed.
pub fn sweep_pending_deletes(db: &mut EntityDatabase) -> Result<usize> {
    #[cfg(feature = "profiling")]
    let _span = info_span!("commands.sweep_pending_deletes").entered();

    let marked: Vec<Entity> = db.iter::<PendingDelete>().map(|(e, _)| e).collect();
    let mut destroyed = 0;
    for entity in marked {
        // Already gone as a descendant of an earlier marked entity
        if !db.exists(entity) {
            continue;
        }
        destroyed += destroy_recursive(db, entity)?;
    }
    Ok(destroyed)
}
