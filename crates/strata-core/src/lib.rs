//! Strata Core
//!
//! Attribute inheritance and the entity lifecycle for a hierarchical
//! production-tracking store.
//!
//! - [`resolve`] / [`InheritanceResolver`]: own value, then the owning
//!   folder's closure, then the registered default
//! - [`EntityManager`]: `create`, `load`, `save`, `patch`, `delete` and
//!   schema introspection
//! - [`Anatomy`]: project templates and [`create_project_from_anatomy`]
//! - [`references`]: relations of tasks and versions
//! - [`Settings`]: startup configuration building the shared registry
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_core::prelude::*;
//! use strata_store::MemoryStore;
//!
//! # async fn run() -> CoreResult<()> {
//! let settings = Settings::new();
//! let manager = EntityManager::from_settings(&settings, Arc::new(MemoryStore::new()))?;
//! create_project_from_anatomy(&manager, "demo", "dm", Anatomy::default(), false).await?;
//! let project = manager.load_project("demo").await?;
//! assert_eq!(project.attrib().get("fps"), Some(&serde_json::json!(25.0)));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod anatomy;
pub mod config;
pub mod defaulting;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod references;
pub mod resolver;

// Re-exports
pub use anatomy::{
    anatomy_to_project_payload, create_project_from_anatomy, ensure_unique_names, Anatomy,
};
pub use config::{CacheSettings, Settings};
pub use entity::{Entity, EntityState};
pub use error::{CoreError, CoreResult, InconsistencyWarning};
pub use lifecycle::{EntityManager, SchemaDocuments};
pub use references::{references, EntityReference, ReferenceType, RelationSource};
pub use resolver::{resolve, AttributeSet, InheritanceResolver};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with entities
    pub use crate::{
        create_project_from_anatomy, Anatomy, AttributeSet, CoreError, CoreResult, Entity,
        EntityManager, EntityState, Settings,
    };
    pub use strata_attrib::EntityType;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
