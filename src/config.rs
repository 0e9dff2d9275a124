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

//! Database configuration

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, Result};

/// Tuning knobs for [`EntityDatabase`](crate::database::EntityDatabase)
///
/// Missing fields fall back to their defaults when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Entity ids pre-sized in the live set and in each new pool's sparse array
    pub initial_entity_capacity: usize,

    /// Dense capacity reserved by each new pool
    pub initial_pool_capacity: usize,

    /// Live observers allowed per component type
    pub max_observers_per_component: usize,

    /// Highest raw id `create` and `create_at` will hand out. Lower it before
    /// restoring untrusted scenes, since sparse arrays grow to the largest id.
    pub max_entity_id: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: 1024,
            initial_pool_capacity: 64,
            max_observers_per_component: 100,
            max_entity_id: u32::MAX - 1,
        }
    }
}

impl DatabaseConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EcsError::DeserializationError(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
