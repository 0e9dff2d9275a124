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

//! Scene capture and restore
//!
//! A scene lists live entities by raw id with each registered component as
//! JSON. Restoring revives the same ids, so components that store an
//! [`Entity`] (such as `Parent`) stay valid across a save/load cycle.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::registry::ComponentRegistry;

/// Current scene format version
pub const SCENE_VERSION: u32 = 1;

/// One entity and its registered components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    pub id: Entity,

    /// Component name to serialized value
    #[serde(default)]
    pub components: BTreeMap<String, Value>,
}

/// Serializable snapshot of a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub version: u32,
    pub entities: Vec<SceneEntity>,
}

impl SceneData {
    pub fn new() -> Self {
        Self {
            version: SCENE_VERSION,
            entities: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EcsError::SerializationError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scene: SceneData = serde_json::from_str(json)
            .map_err(|e| EcsError::DeserializationError(e.to_string()))?;
        scene.check_version()?;
        Ok(scene)
    }

    fn check_version(&self) -> Result<()> {
        if self.version != SCENE_VERSION {
            return Err(EcsError::DeserializationError(format!(
                "Unsupported scene version {} (expected {SCENE_VERSION})",
                self.version
            )));
        }
        Ok(())
    }
}

impl Default for SceneData {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot every live entity, in ascending id order, with the components
/// known to `registry`. Unregistered component types are skipped.
pub fn capture_scene(db: &EntityDatabase, registry: &ComponentRegistry) -> Result<SceneData> {
    #[cfg(feature = "profiling")]
    let _span = info_span!("scene.capture").entered();

    let mut scene = SceneData::new();
    for entity in db.entities() {
        let mut components = BTreeMap::new();
        for registration in registry.iter() {
            if (registration.has_fn)(db, entity) {
                let value = (registration.get_fn)(db, entity)?;
                components.insert(registration.name.clone(), value);
            }
        }
        scene.entities.push(SceneEntity {
            id: entity,
            components,
        });
    }
    tracing::debug!(entities = scene.entities.len(), "scene captured");
    Ok(scene)
}

/// Recreate the entities of `scene` under their original ids and set their
/// components.
///
/// Every id and value is checked before `db` changes, so a failed restore
/// leaves it as it was. Fails with `InvalidEntity` for a `NULL`, repeated or
/// already-live id, so restore into an empty (or cleared) database.
pub fn restore_scene(
    db: &mut EntityDatabase,
    registry: &ComponentRegistry,
    scene: &SceneData,
) -> Result<()> {
    #[cfg(feature = "profiling")]
    let _span = info_span!("scene.restore").entered();

    scene.check_version()?;

    let mut seen = AHashSet::with_capacity(scene.entities.len());
    for entry in &scene.entities {
        if !db.can_create_at(entry.id) || !seen.insert(entry.id) {
            tracing::debug!(id = %entry.id, "scene id rejected");
            return Err(EcsError::InvalidEntity(entry.id));
        }
        for (name, value) in &entry.components {
            registry.validate(name, value)?;
        }
    }

    // Ids first, so relations can point forward
    for entry in &scene.entities {
        db.create_at(entry.id)?;
    }
    for entry in &scene.entities {
        for (name, value) in &entry.components {
            registry.set(db, entry.id, name, value.clone())?;
        }
    }
    tracing::debug!(entities = scene.entities.len(), "scene restored");
    Ok(())
}

/// Write `scene` as pretty JSON.
pub fn save_scene(scene: &SceneData, path: &Path) -> Result<()> {
    fs::write(path, scene.to_json()?)
        .map_err(|e| EcsError::IoError(format!("Failed to write scene file: {e}")))
}

pub fn load_scene(path: &Path) -> Result<SceneData> {
    let json = fs::read_to_string(path)
        .map_err(|e| EcsError::IoError(format!("Failed to read scene file: {e}")))?;
    SceneData::from_json(&json)
}
