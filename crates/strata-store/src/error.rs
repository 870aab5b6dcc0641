//! Storage error types

use strata_attrib::EntityType;
use thiserror::Error;

/// Backend failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No project with this name
    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    /// Row missing on update
    #[error("{entity_type} '{key}' not found")]
    RowNotFound {
        /// Entity type of the row
        entity_type: EntityType,
        /// Row key
        key: String,
    },

    /// Insert of an existing key
    #[error("{entity_type} '{key}' already exists")]
    Conflict {
        /// Entity type of the row
        entity_type: EntityType,
        /// Row key
        key: String,
    },

    /// Anything else the backend reports
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
