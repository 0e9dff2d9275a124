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

//! Name-keyed component registry
//!
//! Maps a stable component name to monomorphized accessors so scripts, scene
//! files and editors can reach typed pools with `serde_json::Value` payloads.

use std::any::TypeId;
use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::component::Component;
use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::error::{EcsError, Result};

/// Accessors for one registered component type
pub struct ComponentRegistration {
    pub name: String,
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub has_fn: fn(&EntityDatabase, Entity) -> bool,
    pub get_fn: fn(&EntityDatabase, Entity) -> Result<Value>,
    pub set_fn: fn(&mut EntityDatabase, Entity, Value) -> Result<()>,
    pub remove_fn: fn(&mut EntityDatabase, Entity) -> Result<()>,
    /// Checks that a value deserializes, without touching a database
    pub validate_fn: fn(&Value) -> Result<()>,
    pub register_fn: fn(&mut EntityDatabase) -> bool,
}

impl ComponentRegistration {
    pub fn new<T>(name: impl Into<String>) -> Self
    where
        T: Component + Serialize + DeserializeOwned,
    {
        Self {
            name: name.into(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            has_fn: |db, entity| db.has::<T>(entity),
            get_fn: |db, entity| {
                let value = db.get::<T>(entity)?;
                serde_json::to_value(value).map_err(|e| EcsError::SerializationError(e.to_string()))
            },
            set_fn: |db, entity, value| {
                let component: T = serde_json::from_value(value)
                    .map_err(|e| EcsError::DeserializationError(e.to_string()))?;
                db.set(entity, component)
            },
            remove_fn: |db, entity| db.remove::<T>(entity).map(|_| ()),
            validate_fn: |value| {
                T::deserialize(value)
                    .map(|_| ())
                    .map_err(|e| EcsError::DeserializationError(e.to_string()))
            },
            register_fn: |db| db.register::<T>(),
        }
    }
}

impl std::fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registry of serializable component types by stable name
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Sorted so scene output is deterministic
    by_name: BTreeMap<String, ComponentRegistration>,
    by_type: AHashMap<TypeId, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in components
    pub fn with_builtins() -> Self {
        use crate::builtin::{LocalTransform, Name, WorldTransform};
        use crate::hierarchy::{Children, Parent};

        let mut registry = Self::new();
        let builtins = [
            ComponentRegistration::new::<Name>("Name"),
            ComponentRegistration::new::<LocalTransform>("LocalTransform"),
            ComponentRegistration::new::<WorldTransform>("WorldTransform"),
            ComponentRegistration::new::<Parent>("Parent"),
            ComponentRegistration::new::<Children>("Children"),
        ];
        for registration in builtins {
            // Fresh registry, names are distinct
            let _ = registry.insert(registration);
        }
        registry
    }

    /// Register `T` under `name`. Each name and each type may appear once.
    pub fn register<T>(&mut self, name: impl Into<String>) -> Result<()>
    where
        T: Component + Serialize + DeserializeOwned,
    {
        self.insert(ComponentRegistration::new::<T>(name))
    }

    fn insert(&mut self, registration: ComponentRegistration) -> Result<()> {
        if self.by_name.contains_key(&registration.name)
            || self.by_type.contains_key(&registration.type_id)
        {
            return Err(EcsError::DuplicateComponentName(registration.name));
        }
        tracing::debug!(
            name = %registration.name,
            type_name = registration.type_name,
            "component registered"
        );
        self.by_type
            .insert(registration.type_id, registration.name.clone());
        self.by_name.insert(registration.name.clone(), registration);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered name of `T`, if any
    pub fn name_of<T: Component>(&self) -> Option<&str> {
        self.by_type.get(&TypeId::of::<T>()).map(String::as_str)
    }

    pub fn registration(&self, name: &str) -> Result<&ComponentRegistration> {
        self.by_name.get(name).ok_or_else(|| {
            tracing::debug!(name, "unknown component name");
            EcsError::UnknownComponentType(name.to_string())
        })
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRegistration> + '_ {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Create pools for every registered type.
    pub fn register_pools(&self, db: &mut EntityDatabase) {
        for registration in self.by_name.values() {
            (registration.register_fn)(db);
        }
    }

    pub fn has(&self, db: &EntityDatabase, entity: Entity, name: &str) -> Result<bool> {
        Ok((self.registration(name)?.has_fn)(db, entity))
    }

    pub fn get(&self, db: &EntityDatabase, entity: Entity, name: &str) -> Result<Value> {
        (self.registration(name)?.get_fn)(db, entity)
    }

    pub fn set(
        &self,
        db: &mut EntityDatabase,
        entity: Entity,
        name: &str,
        value: Value,
    ) -> Result<()> {
        (self.registration(name)?.set_fn)(db, entity, value)
    }

    pub fn remove(&self, db: &mut EntityDatabase, entity: Entity, name: &str) -> Result<()> {
        (self.registration(name)?.remove_fn)(db, entity)
    }

    /// Check `value` against the type registered as `name`.
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        (self.registration(name)?.validate_fn)(value)
    }
}
