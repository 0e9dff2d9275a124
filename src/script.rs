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

//! Script-facing entity handle
//!
//! Scripts must never abort the host, so every failure here is logged at
//! `debug` and turned into `None`/`false`.

use serde_json::Value;

use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::error::Result;
use crate::registry::ComponentRegistry;

pub struct ScriptEntity<'a> {
    db: &'a mut EntityDatabase,
    registry: &'a ComponentRegistry,
    entity: Entity,
}

impl<'a> ScriptEntity<'a> {
    pub fn new(db: &'a mut EntityDatabase, registry: &'a ComponentRegistry, entity: Entity) -> Self {
        Self {
            db,
            registry,
            entity,
        }
    }

    /// Spawn a fresh entity. None once the id space is exhausted.
    pub fn spawn(db: &'a mut EntityDatabase, registry: &'a ComponentRegistry) -> Option<Self> {
        let entity = quiet(db.try_create(), "spawn")?;
        Some(Self::new(db, registry, entity))
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn exists(&self) -> bool {
        self.db.exists(self.entity)
    }

    pub fn has(&self, component: &str) -> bool {
        quiet(self.registry.has(&*self.db, self.entity, component), "has").unwrap_or(false)
    }

    pub fn get(&self, component: &str) -> Option<Value> {
        quiet(self.registry.get(&*self.db, self.entity, component), "get")
    }

    pub fn set(&mut self, component: &str, value: Value) -> bool {
        quiet(
            self.registry.set(self.db, self.entity, component, value),
            "set",
        )
        .is_some()
    }

    pub fn remove(&mut self, component: &str) -> bool {
        quiet(self.registry.remove(self.db, self.entity, component), "remove").is_some()
    }

    pub fn destroy(self) -> bool {
        quiet(self.db.destroy(self.entity), "destroy").is_some()
    }
}

fn quiet<T>(result: Result<T>, op: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(op, error = %err, "script call failed");
            None
        }
    }
}
