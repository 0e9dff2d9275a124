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

//! Component and ComponentSet traits
//!
//! Components are plain values stored in per-type pools.
//! Component sets name several component types at once (views).

use std::any::TypeId;

use smallvec::{smallvec, SmallVec};

/// Maximum number of component types in one view
pub const MAX_VIEW_COMPONENTS: usize = 8;

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: 'static + Send + Sync {}

/// Automatically implement Component for all valid types
impl<T: 'static + Send + Sync> Component for T {}

/// Short type name used in errors and diagnostics
pub fn component_name<T: Component>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Strip the module path but keep generic arguments intact
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// Tuple of distinct component types
pub trait ComponentSet: 'static {
    /// Type ids in declaration order
    fn type_ids() -> SmallVec<[TypeId; MAX_VIEW_COMPONENTS]>;

    /// True if the same component type appears twice
    fn has_duplicates() -> bool {
        let ids = Self::type_ids();
        ids.iter()
            .enumerate()
            .any(|(i, id)| ids[i + 1..].contains(id))
    }
}

macro_rules! impl_component_set {
    ($($T:ident),*) => {
        impl<$($T: Component),*> ComponentSet for ($($T,)*) {
            fn type_ids() -> SmallVec<[TypeId; MAX_VIEW_COMPONENTS]> {
                smallvec![$(TypeId::of::<$T>()),*]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
