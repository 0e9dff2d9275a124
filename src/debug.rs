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

use std::fmt::Write;

use crate::database::{EntityDatabase, PoolSummary};
use crate::entity::Entity;
use crate::registry::ComponentRegistry;

/// Database inspector for debugging
pub struct DatabaseInspector;

impl DatabaseInspector {
    pub fn entity_count(db: &EntityDatabase) -> usize {
        db.entity_count()
    }

    /// Per-pool sizes and observer counts
    pub fn pool_summary(db: &EntityDatabase) -> Vec<PoolSummary> {
        db.pool_summaries()
    }

    /// Registered component names present on `entity`
    pub fn entity_components(
        db: &EntityDatabase,
        registry: &ComponentRegistry,
        entity: Entity,
    ) -> Vec<String> {
        registry
            .iter()
            .filter(|registration| (registration.has_fn)(db, entity))
            .map(|registration| registration.name.clone())
            .collect()
    }

    pub fn summary(db: &EntityDatabase) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Database Summary ===");
        let _ = writeln!(out, "Entities: {}", db.entity_count());
        for pool in db.pool_summaries() {
            let _ = writeln!(
                out,
                "{}: {} components, {} observers",
                pool.component, pool.len, pool.live_observers
            );
        }
        out
    }

    /// Print database summary to console
    pub fn print_summary(db: &EntityDatabase) {
        print!("{}", Self::summary(db));
    }

    pub fn print_entity(db: &EntityDatabase, registry: &ComponentRegistry, entity: Entity) {
        if db.exists(entity) {
            println!("=== Entity {entity:?} ===");
            for name in Self::entity_components(db, registry, entity) {
                println!("  {name}");
            }
        } else {
            println!("Entity {entity:?} not found");
        }
    }
}
