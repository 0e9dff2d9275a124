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

//! Parent/child relations stored as ordinary components
//!
//! The database itself knows nothing about relations: a destroyed parent
//! leaves its children's `Parent` dangling until [`repair_relations`] runs,
//! and entity ids are recycled. Use [`destroy_recursive`] or the
//! [`PendingDelete`](crate::command::PendingDelete) sweep to tear down whole
//! subtrees.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::database::EntityDatabase;
use crate::entity::Entity;
use crate::error::{EcsError, Result};

/// Parent relationship component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent(pub Entity);

impl Parent {
    pub fn new(parent: Entity) -> Self {
        Self(parent)
    }

    pub fn entity(&self) -> Entity {
        self.0
    }
}

/// Children relationship component
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Children {
    children: Vec<Entity>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child(&mut self, child: Entity) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub fn remove_child(&mut self, child: Entity) -> bool {
        if let Some(pos) = self.children.iter().position(|&c| c == child) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, child: Entity) -> bool {
        self.children.contains(&child)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.children.iter().copied()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Attach `child` under `parent`, detaching it from any previous parent.
///
/// Fails with `HierarchyError` on self-parenting or when `parent` already
/// sits below `child`.
pub fn set_parent(db: &mut EntityDatabase, child: Entity, parent: Entity) -> Result<()> {
    for entity in [child, parent] {
        if !db.exists(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
    }
    if child == parent {
        return Err(EcsError::HierarchyError(format!(
            "Cannot attach entity {child} to itself"
        )));
    }
    if is_ancestor(db, child, parent) {
        return Err(EcsError::HierarchyError(format!(
            "Attaching {child} under {parent} would create a cycle"
        )));
    }

    if let Ok(&Parent(old)) = db.get::<Parent>(child) {
        if old == parent {
            return Ok(());
        }
        detach_from(db, old, child)?;
    }

    db.set(child, Parent::new(parent))?;
    match db.get_mut::<Children>(parent) {
        Ok(children) => children.add_child(child),
        Err(_) => {
            let mut children = Children::new();
            children.add_child(child);
            db.set(parent, children)?;
        }
    }
    Ok(())
}

/// Detach `child` from its parent. Returns the former parent, if any.
pub fn remove_parent(db: &mut EntityDatabase, child: Entity) -> Result<Option<Entity>> {
    if !db.exists(child) {
        return Err(EcsError::InvalidEntity(child));
    }
    let Ok(Parent(parent)) = db.remove::<Parent>(child) else {
        return Ok(None);
    };
    if db.exists(parent) {
        detach_from(db, parent, child)?;
    }
    Ok(Some(parent))
}

/// Every live entity below `root`, depth-first, `root` excluded.
pub fn descendants(db: &EntityDatabase, root: Entity) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut visited = AHashSet::new();
    visited.insert(root);

    let mut stack: Vec<Entity> = children_of(db, root);
    stack.reverse();
    while let Some(entity) = stack.pop() {
        if !db.exists(entity) || !visited.insert(entity) {
            continue;
        }
        out.push(entity);
        let mut below = children_of(db, entity);
        below.reverse();
        stack.extend(below);
    }
    out
}

/// Destroy `root` and everything below it. Returns the number destroyed.
pub fn destroy_recursive(db: &mut EntityDatabase, root: Entity) -> Result<usize> {
    if !db.exists(root) {
        return Err(EcsError::InvalidEntity(root));
    }
    remove_parent(db, root)?;

    let subtree = descendants(db, root);
    db.destroy(root)?;
    for entity in &subtree {
        db.destroy(*entity)?;
    }
    tracing::debug!(%root, count = subtree.len() + 1, "subtree destroyed");
    Ok(subtree.len() + 1)
}

/// Drop relations that point at dead entities. Returns the number of
/// components changed or removed.
pub fn repair_relations(db: &mut EntityDatabase) -> usize {
    let mut fixes = 0;

    let orphans: Vec<Entity> = db
        .iter::<Parent>()
        .filter(|(_, parent)| !db.exists(parent.0))
        .map(|(entity, _)| entity)
        .collect();
    for entity in orphans {
        if db.remove::<Parent>(entity).is_ok() {
            fixes += 1;
        }
    }

    let mut emptied = Vec::new();
    if let Some(pool) = db.pool::<Children>() {
        let stale: Vec<Entity> = pool
            .iter()
            .filter(|(_, children)| children.iter().any(|c| !db.exists(c)))
            .map(|(entity, _)| entity)
            .collect();
        for entity in stale {
            let alive: Vec<Entity> = children_of(db, entity)
                .into_iter()
                .filter(|&c| db.exists(c))
                .collect();
            if let Ok(children) = db.get_mut::<Children>(entity) {
                children.children = alive;
                fixes += 1;
                if children.is_empty() {
                    emptied.push(entity);
                }
            }
        }
    }
    for entity in emptied {
        let removed = db.remove::<Children>(entity);
        debug_assert!(removed.is_ok(), "emptied Children vanished: {removed:?}");
    }

    if fixes > 0 {
        tracing::debug!(fixes, "relations repaired");
    }
    fixes
}

fn children_of(db: &EntityDatabase, entity: Entity) -> Vec<Entity> {
    db.get::<Children>(entity)
        .map(|children| children.as_slice().to_vec())
        .unwrap_or_default()
}

/// True if `ancestor` is reachable from `entity` by following `Parent`.
fn is_ancestor(db: &EntityDatabase, ancestor: Entity, entity: Entity) -> bool {
    let mut visited = AHashSet::new();
    let mut current = entity;
    while let Ok(&Parent(parent)) = db.get::<Parent>(current) {
        if parent == ancestor {
            return true;
        }
        if !visited.insert(parent) {
            return false;
        }
        current = parent;
    }
    false
}

fn detach_from(db: &mut EntityDatabase, parent: Entity, child: Entity) -> Result<()> {
    let now_empty = match db.get_mut::<Children>(parent) {
        Ok(children) => {
            children.remove_child(child);
            children.is_empty()
        }
        Err(_) => false,
    };
    if now_empty {
        db.remove::<Children>(parent)?;
    }
    Ok(())
}
