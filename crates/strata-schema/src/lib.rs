//! Strata Schema Generator
//!
//! Builds, per entity type, three payload shapes from a declarative field
//! table and the attribute registry:
//!
//! - **full**: read model with identifier, derived fields and timestamps
//! - **create**: caller-supplied fields only
//! - **patch**: the create fields, all optional
//!
//! plus the attribute sub-schema. Schemas are immutable values, cached per
//! entity type by [`SchemaGenerator`], validated against with
//! [`EntityTypeSchema::validate`] and exported as JSON Schema.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_attrib::{AttributeRegistry, EntityType};
//! use strata_schema::{SchemaGenerator, ShapeKind};
//!
//! let registry = Arc::new(AttributeRegistry::with_builtins().unwrap());
//! let generator = SchemaGenerator::new(registry);
//!
//! let schema = generator.schema(EntityType::Task).unwrap();
//! assert!(schema.create.field("id").is_none());
//! assert!(schema.patch.fields.iter().all(|f| !f.required));
//! let _doc = schema.json_schema(ShapeKind::Patch);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod field;
pub mod fields;
pub mod generator;
pub mod json_schema;
pub mod shape;
pub mod validate;

// Re-exports
pub use error::{FieldViolation, SchemaError, ValidationError};
pub use field::{is_entity_id, FieldSpec, FieldType};
pub use fields::{standard_fields, FieldCatalog};
pub use generator::{generate, SchemaGenerator, OWN_ATTRIB};
pub use shape::{AttributeSchema, EntityTypeSchema, SchemaShape, ShapeKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for schema handling
    pub use crate::{
        EntityTypeSchema, FieldCatalog, FieldSpec, SchemaError, SchemaGenerator, ShapeKind,
        ValidationError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
