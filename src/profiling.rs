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

//! # Profiling Guide
//!
//! The database logs through `tracing` at all times (`debug!` for rejected
//! operations and pool creation, `warn!` for observer caps). With the
//! `profiling` feature it also opens `info_span!`s around views, command
//! application, pending-delete sweeps, transform propagation and scene
//! capture/restore.
//!
//! ## Basic Usage
//!
//! ```toml
//! [dependencies]
//! sparse_ecs = { version = "0.3", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! use sparse_ecs::profiling;
//!
//! // Human-readable output filtered by RUST_LOG, falling back to "debug"
//! profiling::init_logging("debug");
//!
//! // Or a JSON trace file; keep the guard alive until shutdown
//! let _guard = profiling::init_json_trace("trace.json".as_ref())?;
//! ```
//!
//! ## Profiling your own systems
//!
//! ```ignore
//! use tracing::info_span;
//!
//! fn movement_system(db: &mut EntityDatabase) {
//!     #[cfg(feature = "profiling")]
//!     let _span = info_span!("movement_system", entities = db.entity_count()).entered();
//!
//!     for (_, pos, vel) in db.view_mut::<(Position, Velocity)>() {
//!         pos.x += vel.x;
//!     }
//! }
//! ```
//!
//! ## Performance Tips
//!
//! 1. Profile in release mode for accurate metrics
//! 2. Use `RUST_LOG=sparse_ecs=trace` to see entity destruction

#[cfg(feature = "profiling")]
use std::fs::File;
#[cfg(feature = "profiling")]
use std::path::Path;

#[cfg(feature = "profiling")]
use tracing_appender::non_blocking::WorkerGuard;
#[cfg(feature = "profiling")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "profiling")]
use crate::error::Result;

/// Install a stdout subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns false if a global subscriber was already set.
#[cfg(feature = "profiling")]
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install a subscriber writing JSON lines to `path` on a background thread.
///
/// Buffered events are flushed when the returned guard drops.
#[cfg(feature = "profiling")]
pub fn init_json_trace(path: &Path) -> Result<WorkerGuard> {
    let file = File::create(path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let installed = tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .try_init();
    if installed.is_err() {
        tracing::warn!(path = %path.display(), "global subscriber already set");
    }
    Ok(guard)
}
