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

//! Sparse ECS - sparse-set entity-component storage
//!
//! Entities are integer ids; each component type lives in its own dense pool
//! indexed through a sparse set, giving O(1) add, remove and lookup and
//! contiguous iteration. Multi-component views, change observers, deferred
//! commands, parent/child relations and JSON scenes are built on top.

pub mod bitset;
pub mod builtin;
pub mod command;
pub mod component;
pub mod config;
pub mod database;
pub mod debug;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod observer;
pub mod pool;
pub mod prelude;
pub mod profiling;
pub mod registry;
pub mod script;
pub mod serialization;
pub mod sparse_set;
pub mod view;


pub use command::*;
pub use component::*;
pub use config::*;
pub use database::*;
pub use entity::*;
pub use error::*;
pub use hierarchy::*;
pub use observer::*;
pub use pool::*;
pub use registry::*;
pub use script::*;
pub use serialization::*;
pub use sparse_set::*;
pub use view::*;
