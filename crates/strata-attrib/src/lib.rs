//! Strata Attribute Registry
//!
//! Catalog of the attributes each entity type may carry.
//!
//! # Overview
//!
//! - [`EntityType`]: closed set of entity kinds in a production hierarchy
//! - [`ValueType`]: the value kinds an attribute may hold
//! - [`AttributeDefinition`]: one attribute, its scope and inheritance flag
//! - [`AttributeRegistry`]: ordered, per-entity-type catalog built once at
//!   startup and read-only afterwards
//!
//! # Example
//!
//! ```rust
//! use strata_attrib::{AttributeDefinition, AttributeRegistry, EntityType, ValueType};
//! use serde_json::json;
//!
//! let mut registry = AttributeRegistry::new();
//! registry
//!     .register(
//!         AttributeDefinition::new("frameStart", ValueType::Integer)
//!             .with_scope([EntityType::Folder, EntityType::Task])
//!             .with_default(json!(1001)),
//!     )
//!     .unwrap();
//!
//! let def = registry.lookup(EntityType::Task, "frameStart").unwrap();
//! assert!(def.inheritable);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builtin;
pub mod definition;
pub mod entity_type;
pub mod error;
pub mod registry;
pub mod value;

// Re-exports
pub use definition::{AttributeConfig, AttributeDefinition};
pub use entity_type::EntityType;
pub use error::ConfigurationError;
pub use registry::AttributeRegistry;
pub use value::ValueType;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for attribute handling
    pub use crate::{
        AttributeDefinition, AttributeRegistry, ConfigurationError, EntityType, ValueType,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
