//! Strata Store
//!
//! Persistence seam for entity rows and the inheritance closure store.
//!
//! - [`EntityStore`]: async backend trait over rows, category tables and
//!   closure rows
//! - [`MemoryStore`]: in-process backend with per-row locks
//! - [`ClosureCache`]: moka cache of folder closures with `invalidate` and
//!   cascading `rebuild`
//!
//! Rows only ever hold an entity's own attribute values.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod closure;
pub mod error;
pub mod memory;
pub mod row;

// Re-exports
pub use backend::{EntityStore, RowLock};
pub use closure::{ClosureCache, ClosureReader, InheritanceClosure};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use row::{Category, CategoryEntry, ClosureOwner, EntityRow, FetchedRow};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for storage
    pub use crate::{
        ClosureCache, ClosureReader, EntityRow, EntityStore, InheritanceClosure, MemoryStore,
        StoreError, StoreResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
