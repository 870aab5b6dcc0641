//! Storage backend trait
//!
//! [`EntityStore`] is the seam between the lifecycle manager and a concrete
//! database. Rows are addressed by `(project, entity type, key)`; a project
//! exists once its own row has been inserted.

use crate::closure::InheritanceClosure;
use crate::error::StoreResult;
use crate::row::{Category, CategoryEntry, EntityRow, FetchedRow};
use serde_json::Value;
use strata_attrib::EntityType;
use tokio::sync::OwnedMutexGuard;

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

/// Exclusive hold on one row, released on drop
pub struct RowLock {
    guard: Option<OwnedMutexGuard<()>>,
    on_release: Option<ReleaseHook>,
}

impl RowLock {
    /// Wrap an acquired guard
    #[inline]
    #[must_use]
    pub fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self {
            guard: Some(guard),
            on_release: None,
        }
    }

    /// Run `hook` once the guard has been released
    #[must_use]
    pub fn with_release(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }
}

impl Drop for RowLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for RowLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowLock")
            .field("held", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

/// Entity persistence
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync + std::fmt::Debug {
    /// Whether the project exists
    async fn project_exists(&self, project: &str) -> StoreResult<bool>;

    /// Fetch a row with its closure owner
    ///
    /// Returns `Ok(None)` for a missing row and `ProjectNotFound` for a
    /// missing project.
    async fn fetch(
        &self,
        project: &str,
        entity_type: EntityType,
        key: &str,
    ) -> StoreResult<Option<FetchedRow>>;

    /// Acquire the row lock for a read-modify-write sequence
    async fn lock_row(&self, project: &str, entity_type: EntityType, key: &str)
        -> StoreResult<RowLock>;

    /// Insert a new row; a project row creates the project
    async fn insert(&self, project: &str, row: EntityRow) -> StoreResult<()>;

    /// Replace an existing row
    async fn update(&self, project: &str, row: EntityRow) -> StoreResult<()>;

    /// Remove a row; removing the project row drops the project
    ///
    /// Returns whether a row was removed.
    async fn delete(&self, project: &str, entity_type: EntityType, key: &str)
        -> StoreResult<bool>;

    /// Keys of rows whose natural field equals `value`, or contains it when
    /// the field is a list
    async fn find_keys(
        &self,
        project: &str,
        entity_type: EntityType,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<String>>;

    /// Category entries ordered by position
    async fn categories(&self, project: &str, category: Category)
        -> StoreResult<Vec<CategoryEntry>>;

    /// Replace a category table
    async fn set_categories(
        &self,
        project: &str,
        category: Category,
        entries: Vec<CategoryEntry>,
    ) -> StoreResult<()>;

    /// Stored closure row of a folder
    async fn closure_row(&self, project: &str, folder_id: &str)
        -> StoreResult<Option<InheritanceClosure>>;

    /// Write a folder's closure row
    async fn put_closure_row(
        &self,
        project: &str,
        folder_id: &str,
        closure: InheritanceClosure,
    ) -> StoreResult<()>;

    /// Drop a folder's closure row
    async fn delete_closure_row(&self, project: &str, folder_id: &str) -> StoreResult<()>;

    /// Folders whose `parent_id` is `parent` (`None` for top-level folders)
    async fn child_folders(&self, project: &str, parent: Option<&str>)
        -> StoreResult<Vec<EntityRow>>;
}
