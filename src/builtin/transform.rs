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

//! Local and world transforms, with hierarchy propagation.

use ahash::AHashSet;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::hierarchy::{Children, Parent};

/// Transform relative to the parent entity (or the world for roots)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// World-space matrix, written by [`update_world_transforms`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    pub matrix: Mat4,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
    };

    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Recompute `WorldTransform = parent_world * local` for every entity with a
/// `LocalTransform`, starting from roots (no `Parent`, or a dead parent).
///
/// Entities lacking a `WorldTransform` get one. Children without a
/// `LocalTransform` break the chain below them. Returns the number of
/// entities written.
pub fn update_world_transforms(db: &mut EntityDatabase) -> usize {
    #[cfg(feature = "profiling")]
    let _span = info_span!("transforms.update_world").entered();

    // Collect first, write after: views and lookups borrow the database
    let roots: Vec<(Entity, Mat4)> = db
        .iter::<LocalTransform>()
        .filter(|(entity, _)| match db.get::<Parent>(*entity) {
            Ok(parent) => !db.exists(parent.0),
            Err(_) => true,
        })
        .map(|(entity, local)| (entity, local.matrix()))
        .collect();

    let mut updates: Vec<(Entity, Mat4)> = Vec::with_capacity(roots.len());
    let mut visited = AHashSet::with_capacity(roots.len());
    let mut stack = roots;
    while let Some((entity, world)) = stack.pop() {
        if !visited.insert(entity) {
            continue;
        }
        updates.push((entity, world));
        let Ok(children) = db.get::<Children>(entity) else {
            continue;
        };
        for child in children.iter() {
            if let Ok(local) = db.get::<LocalTransform>(child) {
                stack.push((child, world * local.matrix()));
            }
        }
    }

    let written = updates.len();
    for (entity, matrix) in updates {
        match db.get_mut::<WorldTransform>(entity) {
            Ok(world) => world.matrix = matrix,
            Err(_) => {
                // Walked entities come from live pools
                let inserted = db.set(entity, WorldTransform { matrix });
                debug_assert!(inserted.is_ok(), "world transform write failed: {inserted:?}");
            }
        }
    }
    written
}
