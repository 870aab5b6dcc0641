//! Error types for Strata Core
//!
//! Configuration and validation errors abort the operation. Inconsistencies
//! in the closure store are not errors: they surface as
//! [`InconsistencyWarning`] values next to the loaded entity.

use std::fmt;
use strata_attrib::{ConfigurationError, EntityType};
use strata_schema::{SchemaError, ValidationError};
use strata_store::StoreError;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid attribute definition
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Invalid field table
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Settings could not be read or parsed
    #[error("settings error: {0}")]
    Settings(String),

    /// Entity or project absent
    #[error("{0} not found")]
    NotFound(String),

    /// Payload does not fit a schema shape
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A required categorical default cannot be resolved
    #[error("defaulting failed: {0}")]
    Defaulting(String),

    /// The lifecycle manager does not handle this entity type
    #[error("{0} entities are not managed here")]
    Unsupported(EntityType),

    /// Backend failure
    #[error("store error: {0}")]
    Store(StoreError),
}

impl CoreError {
    /// Whether the error means something does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProjectNotFound(project) => {
                CoreError::NotFound(format!("project '{project}'"))
            }
            StoreError::RowNotFound { entity_type, key } => {
                CoreError::NotFound(format!("{entity_type} '{key}'"))
            }
            other => CoreError::Store(other),
        }
    }
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Non-fatal inconsistency found while resolving attributes
///
/// Resolution proceeds with an empty inherited set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistencyWarning {
    /// Entity type being resolved
    pub entity_type: EntityType,
    /// Key of the entity
    pub key: String,
    /// What is missing or broken
    pub message: String,
}

impl InconsistencyWarning {
    /// Create a warning and log it
    pub fn raise(entity_type: EntityType, key: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            entity_type,
            key: key.into(),
            message: message.into(),
        };
        tracing::warn!(
            entity_type = %warning.entity_type,
            key = %warning.key,
            "{}",
            warning.message
        );
        warning
    }
}

impl fmt::Display for InconsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.entity_type, self.key, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_maps_to_not_found() {
        let err = CoreError::from(StoreError::ProjectNotFound("demo".into()));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "project 'demo' not found");
    }

    #[test]
    fn conflict_stays_a_store_error() {
        let err = CoreError::from(StoreError::Conflict {
            entity_type: EntityType::Task,
            key: "x".into(),
        });
        assert!(matches!(err, CoreError::Store(_)));
    }

    #[test]
    fn warning_display() {
        let warning = InconsistencyWarning::raise(EntityType::Task, "abc", "closure missing");
        assert_eq!(warning.to_string(), "task 'abc': closure missing");
    }
}
