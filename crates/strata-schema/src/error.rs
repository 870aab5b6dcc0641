//! Error types for schema generation and payload validation

use crate::shape::ShapeKind;
use strata_attrib::{ConfigurationError, EntityType};

/// Schema generation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Attribute registry misconfiguration
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Two fields of the composed field list share a name
    #[error("duplicate field '{name}' in {entity_type} schema")]
    DuplicateField {
        /// Entity type being generated
        entity_type: EntityType,
        /// Colliding field name
        name: String,
    },
}

/// Single reason a payload was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Offending field (`attrib.<name>` for attributes)
    pub field: String,
    /// What is wrong with it
    pub reason: String,
}

impl FieldViolation {
    /// Create a violation
    #[inline]
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Payload does not fit a schema shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {shape} payload for {entity_type}: {}", join(.violations))]
pub struct ValidationError {
    /// Entity type
    pub entity_type: EntityType,
    /// Shape validated against
    pub shape: ShapeKind,
    /// Every violation found
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Check if a field is among the violations
    #[must_use]
    pub fn concerns(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            entity_type: EntityType::Task,
            shape: ShapeKind::Patch,
            violations: vec![
                FieldViolation::new("name", "expected string"),
                FieldViolation::new("attrib.fps", "unknown attribute"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "invalid patch payload for task: name: expected string; attrib.fps: unknown attribute"
        );
        assert!(err.concerns("attrib.fps"));
    }

    #[test]
    fn configuration_conversion() {
        let err: SchemaError = ConfigurationError::EmptyScope("fps".to_string()).into();
        assert!(matches!(err, SchemaError::Configuration(_)));
    }
}
