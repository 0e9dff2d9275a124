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

//! Error types

use std::fmt;

use crate::entity::Entity;

/// Entity database error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Operation on `Entity::NULL` or an id that is not alive
    InvalidEntity(Entity),

    /// `get`/`remove` on an entity lacking the component
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },

    /// Name-keyed access to a component name nobody registered
    UnknownComponentType(String),

    /// Two component types registered under the same stable name
    DuplicateComponentName(String),

    /// Too many live observers attached to one component type
    ObserverLimitReached {
        component: &'static str,
        limit: usize,
    },

    /// Every id up to `max_entity_id` is in use
    EntityCapacityExhausted,

    /// Parent/child relation error (cycle, self-parenting)
    HierarchyError(String),

    /// Serialization error
    SerializationError(String),

    /// Deserialization error
    DeserializationError(String),

    /// IO error (file operations, etc.)
    IoError(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::InvalidEntity(entity) => write!(f, "Invalid entity: {entity}"),
            EcsError::ComponentNotFound { entity, component } => {
                write!(f, "Component {component} not found on entity {entity}")
            }
            EcsError::UnknownComponentType(name) => write!(f, "Unknown component type: {name}"),
            EcsError::DuplicateComponentName(name) => {
                write!(f, "Component name already registered: {name}")
            }
            EcsError::ObserverLimitReached { component, limit } => {
                write!(f, "Observer limit of {limit} reached for component {component}")
            }
            EcsError::EntityCapacityExhausted => write!(f, "Entity id space exhausted"),
            EcsError::HierarchyError(msg) => write!(f, "Hierarchy error: {msg}"),
            EcsError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            EcsError::DeserializationError(msg) => write!(f, "Deserialization error: {msg}"),
            EcsError::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<std::io::Error> for EcsError {
    fn from(err: std::io::Error) -> Self {
        EcsError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            EcsError::IoError(err.to_string())
        } else {
            EcsError::SerializationError(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EcsError::ComponentNotFound {
            entity: Entity::from_raw(3),
            component: "Health",
        };
        assert_eq!(err.to_string(), "Component Health not found on entity 3");
        assert_eq!(
            EcsError::UnknownComponentType("Mesh".into()).to_string(),
            "Unknown component type: Mesh"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(EcsError::from(io), EcsError::IoError(_)));
    }
}
