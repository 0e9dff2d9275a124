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

//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use sparse_ecs::prelude::*;
//! ```

pub use crate::builtin::{update_world_transforms, LocalTransform, Name, WorldTransform};
pub use crate::command::{sweep_pending_deletes, CommandBuffer, PendingDelete};
pub use crate::component::Component;
pub use crate::config::DatabaseConfig;
pub use crate::database::EntityDatabase;
pub use crate::debug::DatabaseInspector;
pub use crate::entity::Entity;
pub use crate::error::{EcsError, Result};
pub use crate::hierarchy::{
    descendants, destroy_recursive, remove_parent, repair_relations, set_parent, Children, Parent,
};
pub use crate::observer::{ChangeEvent, ChangeKind, Observer, RemovalObserver};
pub use crate::registry::ComponentRegistry;
pub use crate::script::ScriptEntity;
pub use crate::serialization::{capture_scene, restore_scene, SceneData};
