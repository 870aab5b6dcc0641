//! Attribute definitions
//!
//! An [`AttributeDefinition`] is immutable once registered. Definitions are
//! either built in code with the builder methods or read from configuration
//! through [`AttributeConfig`], which keeps type names as strings so that an
//! unknown kind surfaces as a [`ConfigurationError`] instead of a serde error.

use crate::entity_type::EntityType;
use crate::error::ConfigurationError;
use crate::value::ValueType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static ATTRIBUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid attribute name pattern"));

/// Specification of a single attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDefinition {
    /// Attribute name (camelCase by convention, e.g. `frameStart`)
    pub name: String,

    /// Kind of value
    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Entity types that may hold this attribute
    pub scope: Vec<EntityType>,

    /// Whether descendants inherit the value when they do not set their own
    pub inheritable: bool,

    /// Value used when neither the entity nor any ancestor sets one
    pub default: Option<Value>,

    /// Whether the attribute must resolve to a value
    pub required: bool,

    /// Human readable title
    pub title: Option<String>,

    /// Longer description
    pub description: Option<String>,

    /// Example value for schema consumers
    pub example: Option<Value>,

    /// Closed set of allowed values
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

impl AttributeDefinition {
    /// Create an inheritable, optional definition with an empty scope
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            scope: Vec::new(),
            inheritable: true,
            default: None,
            required: false,
            title: None,
            description: None,
            example: None,
            enum_values: None,
        }
    }

    /// Set the entity types this attribute applies to
    #[must_use]
    pub fn with_scope(mut self, scope: impl IntoIterator<Item = EntityType>) -> Self {
        self.scope = scope.into_iter().collect();
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Disable inheritance
    #[must_use]
    pub fn not_inherited(mut self) -> Self {
        self.inheritable = false;
        self
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the example value
    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Restrict values to a closed set
    #[must_use]
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    /// Whether the definition applies to an entity type
    #[inline]
    #[must_use]
    pub fn applies_to(&self, entity_type: EntityType) -> bool {
        self.scope.contains(&entity_type)
    }

    /// Check a value against the value type and the enum restriction
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        if !self.value_type.accepts(value) {
            return false;
        }
        match &self.enum_values {
            Some(allowed) => allowed.contains(value),
            None => true,
        }
    }

    /// Validate the definition itself
    ///
    /// # Errors
    /// - `InvalidName` if the name is not an identifier
    /// - `EmptyScope` if no entity type is in scope
    /// - `InvalidDefault` if the default does not fit the value type
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !ATTRIBUTE_NAME.is_match(&self.name) {
            return Err(ConfigurationError::InvalidName(self.name.clone()));
        }
        if self.scope.is_empty() {
            return Err(ConfigurationError::EmptyScope(self.name.clone()));
        }
        if let Some(default) = &self.default {
            if !self.accepts(default) {
                return Err(ConfigurationError::InvalidDefault {
                    name: self.name.clone(),
                    expected: self.value_type,
                });
            }
        }
        Ok(())
    }
}

/// Attribute definition as written in configuration files
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeConfig {
    /// Attribute name
    pub name: String,
    /// Value type name (`string`, `integer`, ...)
    #[serde(rename = "type")]
    pub value_type: String,
    /// Entity type names
    pub scope: Vec<String>,
    /// Inheritance flag
    #[serde(default = "default_inherit", alias = "inheritable")]
    pub inherit: bool,
    /// Default value
    #[serde(default)]
    pub default: Option<Value>,
    /// Required flag
    #[serde(default)]
    pub required: bool,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Example value
    #[serde(default)]
    pub example: Option<Value>,
    /// Allowed values
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

fn default_inherit() -> bool {
    true
}

impl TryFrom<AttributeConfig> for AttributeDefinition {
    type Error = ConfigurationError;

    fn try_from(config: AttributeConfig) -> Result<Self, Self::Error> {
        let value_type = config.value_type.parse::<ValueType>()?;
        let scope = config
            .scope
            .iter()
            .map(|s| s.parse::<EntityType>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name,
            value_type,
            scope,
            inheritable: config.inherit,
            default: config.default,
            required: config.required,
            title: config.title,
            description: config.description,
            example: config.example,
            enum_values: config.enum_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_flags() {
        let def = AttributeDefinition::new("fps", ValueType::Float)
            .with_scope([EntityType::Project, EntityType::Folder])
            .with_default(json!(25.0))
            .not_inherited()
            .required();

        assert_eq!(def.scope.len(), 2);
        assert!(!def.inheritable);
        assert!(def.required);
        assert!(def.applies_to(EntityType::Folder));
        assert!(!def.applies_to(EntityType::Task));
    }

    #[test]
    fn validate_rejects_bad_default() {
        let def = AttributeDefinition::new("frameStart", ValueType::Integer)
            .with_scope([EntityType::Folder])
            .with_default(json!("1001"));
        assert!(matches!(
            def.validate(),
            Err(ConfigurationError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_scope() {
        let def = AttributeDefinition::new("frameStart", ValueType::Integer);
        assert!(matches!(def.validate(), Err(ConfigurationError::EmptyScope(_))));
    }

    #[test]
    fn validate_rejects_bad_name() {
        let def = AttributeDefinition::new("frame start", ValueType::Integer)
            .with_scope([EntityType::Folder]);
        assert!(matches!(def.validate(), Err(ConfigurationError::InvalidName(_))));
    }

    #[test]
    fn enum_restricts_values() {
        let def = AttributeDefinition::new("priority", ValueType::String)
            .with_scope([EntityType::Task])
            .with_enum([json!("low"), json!("high")]);
        assert!(def.accepts(&json!("low")));
        assert!(!def.accepts(&json!("urgent")));
    }

    #[test]
    fn config_conversion() {
        let config: AttributeConfig = toml::from_str(
            r#"
            name = "shotType"
            type = "string"
            scope = ["folder", "task"]
            inherit = false
            default = "regular"
            "#,
        )
        .unwrap();

        let def = AttributeDefinition::try_from(config).unwrap();
        assert_eq!(def.value_type, ValueType::String);
        assert_eq!(def.scope, vec![EntityType::Folder, EntityType::Task]);
        assert!(!def.inheritable);
        assert_eq!(def.default, Some(json!("regular")));
    }

    #[test]
    fn config_unknown_type_is_configuration_error() {
        let config: AttributeConfig = toml::from_str(
            r#"
            name = "ratio"
            type = "decimal"
            scope = ["folder"]
            "#,
        )
        .unwrap();

        let err = AttributeDefinition::try_from(config).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownValueType("decimal".to_string()));
    }
}
