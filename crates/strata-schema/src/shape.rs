//! Generated schema value objects
//!
//! An [`EntityTypeSchema`] bundles the three payload shapes of an entity type
//! with its attribute sub-schema. All of these are immutable once generated.

use crate::field::FieldSpec;
use serde::Serialize;
use std::fmt;
use strata_attrib::{AttributeDefinition, EntityType};

/// Which payload shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Read model: every field including derived ones
    Full,
    /// Create payload: caller-supplied fields only
    Create,
    /// Partial update: create fields, all optional
    Patch,
}

impl ShapeKind {
    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Full => "full",
            ShapeKind::Create => "create",
            ShapeKind::Patch => "patch",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered field set of one shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaShape {
    /// Shape kind
    pub kind: ShapeKind,
    /// Model name, e.g. `TaskPatchModel`
    pub title: String,
    /// Fields in schema order
    pub fields: Vec<FieldSpec>,
}

impl SchemaShape {
    /// Find a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in order
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Names of required fields
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// Attribute sub-schema of an entity type
///
/// A snapshot of the registry entries in scope for the entity type, in
/// registration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSchema {
    /// Model name, e.g. `TaskAttribModel`
    pub title: String,
    /// Definitions in registration order
    pub attributes: Vec<AttributeDefinition>,
}

impl AttributeSchema {
    /// Find a definition by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whether the attribute exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Attribute names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Iterate definitions
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.iter()
    }
}

/// Generated schemas of one entity type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTypeSchema {
    /// Entity type
    pub entity_type: EntityType,
    /// Read shape
    pub full: SchemaShape,
    /// Create shape
    pub create: SchemaShape,
    /// Patch shape
    pub patch: SchemaShape,
    /// Attribute sub-schema
    pub attrib: AttributeSchema,
    /// Fields excluded from create and patch payloads
    pub dynamic_fields: Vec<String>,
}

impl EntityTypeSchema {
    /// Shape by kind
    #[must_use]
    pub fn shape(&self, kind: ShapeKind) -> &SchemaShape {
        match kind {
            ShapeKind::Full => &self.full,
            ShapeKind::Create => &self.create,
            ShapeKind::Patch => &self.patch,
        }
    }

    /// Whether a field is dynamic
    #[inline]
    #[must_use]
    pub fn is_dynamic(&self, name: &str) -> bool {
        self.dynamic_fields.iter().any(|f| f == name)
    }

    /// Name of the identifier field (`id` or `name`)
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &'static str {
        if self.entity_type.has_surrogate_id() {
            "id"
        } else {
            "name"
        }
    }
}
