//! Error types for the attribute registry

use crate::entity_type::EntityType;
use crate::value::ValueType;

/// Invalid attribute configuration
///
/// Raised while the registry is populated at startup; always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Name already registered for an entity type in the definition's scope
    #[error("attribute '{name}' is already registered for {entity_type}")]
    DuplicateAttribute {
        /// Attribute name
        name: String,
        /// Entity type where both definitions apply
        entity_type: EntityType,
    },

    /// Value type name is not one of the recognized kinds
    #[error("unknown value type: '{0}'")]
    UnknownValueType(String),

    /// Entity type name is not recognized
    #[error("unknown entity type: '{0}'")]
    UnknownEntityType(String),

    /// Default value does not fit the declared value type
    #[error("default of attribute '{name}' is not a valid {expected}")]
    InvalidDefault {
        /// Attribute name
        name: String,
        /// Declared value type
        expected: ValueType,
    },

    /// Definition applies to no entity type
    #[error("attribute '{0}' has an empty scope")]
    EmptyScope(String),

    /// Attribute name is not a valid identifier
    #[error("invalid attribute name: '{0}'")]
    InvalidName(String),
}
