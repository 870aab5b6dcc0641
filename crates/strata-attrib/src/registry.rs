//! Attribute definition registry
//!
//! Provides [`AttributeRegistry`], the ordered catalog of attribute
//! definitions per entity type. Registration order is significant: it is the
//! field order of generated attribute schemas.
//!
//! The registry is populated once at startup and then shared read-only
//! (typically behind an `Arc`).

use crate::builtin::builtin_attributes;
use crate::definition::{AttributeConfig, AttributeDefinition};
use crate::entity_type::EntityType;
use crate::error::ConfigurationError;
use std::collections::HashMap;

/// Ordered catalog of attribute definitions
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    /// Definitions in registration order
    definitions: Vec<AttributeDefinition>,
    /// Per entity type: indices into `definitions`, in registration order
    by_type: HashMap<EntityType, Vec<usize>>,
}

impl AttributeRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in attribute table
    ///
    /// # Errors
    /// Never fails for the shipped table; errors are propagated for symmetry
    /// with configured definitions.
    pub fn with_builtins() -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        for definition in builtin_attributes() {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Register a definition for every entity type in its scope
    ///
    /// # Errors
    /// - `DuplicateAttribute` if the name is taken for any type in scope
    /// - any error from [`AttributeDefinition::validate`]
    pub fn register(&mut self, definition: AttributeDefinition) -> Result<(), ConfigurationError> {
        definition.validate()?;

        for entity_type in &definition.scope {
            if self.lookup(*entity_type, &definition.name).is_some() {
                return Err(ConfigurationError::DuplicateAttribute {
                    name: definition.name.clone(),
                    entity_type: *entity_type,
                });
            }
        }

        let index = self.definitions.len();
        for entity_type in &definition.scope {
            let slots = self.by_type.entry(*entity_type).or_default();
            if !slots.contains(&index) {
                slots.push(index);
            }
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Register a definition for a single entity type
    ///
    /// The definition's scope is narrowed to `entity_type`.
    ///
    /// # Errors
    /// Same as [`register`](Self::register).
    pub fn register_for(
        &mut self,
        entity_type: EntityType,
        definition: AttributeDefinition,
    ) -> Result<(), ConfigurationError> {
        self.register(definition.with_scope([entity_type]))
    }

    /// Register definitions read from configuration
    ///
    /// # Errors
    /// Unknown value/entity type names, plus any registration error.
    pub fn register_configs(
        &mut self,
        configs: impl IntoIterator<Item = AttributeConfig>,
    ) -> Result<(), ConfigurationError> {
        for config in configs {
            self.register(AttributeDefinition::try_from(config)?)?;
        }
        Ok(())
    }

    /// Definitions applicable to an entity type, in registration order
    pub fn list(&self, entity_type: EntityType) -> impl Iterator<Item = &AttributeDefinition> {
        self.by_type
            .get(&entity_type)
            .into_iter()
            .flatten()
            .map(|&i| &self.definitions[i])
    }

    /// Look up a definition by entity type and name
    #[must_use]
    pub fn lookup(&self, entity_type: EntityType, name: &str) -> Option<&AttributeDefinition> {
        self.list(entity_type).find(|d| d.name == name)
    }

    /// Whether `name` is an inheritable attribute of `entity_type`
    #[inline]
    #[must_use]
    pub fn is_inheritable(&self, entity_type: EntityType, name: &str) -> bool {
        self.lookup(entity_type, name)
            .is_some_and(|d| d.inheritable)
    }

    /// Attribute names of an entity type, in registration order
    #[must_use]
    pub fn names(&self, entity_type: EntityType) -> Vec<&str> {
        self.list(entity_type).map(|d| d.name.as_str()).collect()
    }

    /// All definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.iter()
    }

    /// Number of distinct definitions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
