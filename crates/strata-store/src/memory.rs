//! In-memory backend
//!
//! Tables live behind a `parking_lot` lock and are never held across an
//! await. Row locks are per-key async mutexes handed out through
//! [`EntityStore::lock_row`].

use crate::backend::{EntityStore, RowLock};
use crate::closure::InheritanceClosure;
use crate::error::{StoreError, StoreResult};
use crate::row::{Category, CategoryEntry, ClosureOwner, EntityRow, FetchedRow};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use strata_attrib::EntityType;
use tokio::sync::Mutex;

/// Tables of one project
#[derive(Debug, Default)]
struct ProjectTables {
    rows: HashMap<(EntityType, String), EntityRow>,
    categories: HashMap<Category, Vec<CategoryEntry>>,
    closures: HashMap<String, InheritanceClosure>,
}

impl ProjectTables {
    fn row(&self, entity_type: EntityType, key: &str) -> Option<&EntityRow> {
        self.rows.get(&(entity_type, key.to_string()))
    }

    /// Follow one parent reference
    fn parent_of<'a>(
        &'a self,
        row: &EntityRow,
        field: &str,
        parent_type: EntityType,
    ) -> Result<&'a EntityRow, String> {
        let parent_key = row
            .field_str(field)
            .ok_or_else(|| format!("{} '{}' has no {field}", row.entity_type, row.key))?;
        self.row(parent_type, parent_key).ok_or_else(|| {
            format!(
                "{parent_type} '{parent_key}' referenced by {} '{}' is missing",
                row.entity_type, row.key
            )
        })
    }

    fn folder_id_of(row: &EntityRow) -> Result<String, String> {
        row.field_str("folder_id")
            .map(str::to_string)
            .ok_or_else(|| format!("{} '{}' has no folder_id", row.entity_type, row.key))
    }

    /// Walk parent references up to the owning folder
    fn closure_owner(&self, row: &EntityRow) -> ClosureOwner {
        let folder_id = match row.entity_type {
            EntityType::Project | EntityType::User | EntityType::Workfile => {
                return ClosureOwner::None;
            }
            EntityType::Folder => {
                return row
                    .field_str("parent_id")
                    .map_or(ClosureOwner::ProjectRoot, |id| {
                        ClosureOwner::Folder(id.to_string())
                    });
            }
            EntityType::Task | EntityType::Subset => Self::folder_id_of(row),
            EntityType::Version => self
                .parent_of(row, "subset_id", EntityType::Subset)
                .and_then(Self::folder_id_of),
            EntityType::Representation => self
                .parent_of(row, "version_id", EntityType::Version)
                .and_then(|version| self.parent_of(version, "subset_id", EntityType::Subset))
                .and_then(Self::folder_id_of),
        };
        match folder_id {
            Ok(id) => ClosureOwner::Folder(id),
            Err(broken) => ClosureOwner::Unresolved(broken),
        }
    }
}

/// Backend keeping everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<HashMap<String, ProjectTables>>,
    row_locks: Arc<DashMap<RowKey, Arc<Mutex<()>>>>,
}

type RowKey = (String, EntityType, String);

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of projects
    #[must_use]
    pub fn project_count(&self) -> usize {
        self.projects.read().len()
    }

    /// Number of row locks currently tracked
    #[must_use]
    pub fn row_lock_count(&self) -> usize {
        self.row_locks.len()
    }

    /// Number of rows in a project, project row included
    #[must_use]
    pub fn row_count(&self, project: &str) -> usize {
        self.projects.read().get(project).map_or(0, |t| t.rows.len())
    }

    fn with_project<T>(
        &self,
        project: &str,
        f: impl FnOnce(&ProjectTables) -> T,
    ) -> StoreResult<T> {
        let projects = self.projects.read();
        let tables = projects
            .get(project)
            .ok_or_else(|| StoreError::ProjectNotFound(project.to_string()))?;
        Ok(f(tables))
    }

    fn with_project_mut<T>(
        &self,
        project: &str,
        f: impl FnOnce(&mut ProjectTables) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut projects = self.projects.write();
        let tables = projects
            .get_mut(project)
            .ok_or_else(|| StoreError::ProjectNotFound(project.to_string()))?;
        f(tables)
    }
}

fn field_matches(stored: Option<&Value>, value: &Value) -> bool {
    match stored {
        Some(Value::Array(items)) if !value.is_array() => items.contains(value),
        Some(stored) => stored == value,
        None => value.is_null(),
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn project_exists(&self, project: &str) -> StoreResult<bool> {
        Ok(self.projects.read().contains_key(project))
    }

    async fn fetch(
        &self,
        project: &str,
        entity_type: EntityType,
        key: &str,
    ) -> StoreResult<Option<FetchedRow>> {
        self.with_project(project, |tables| {
            tables.row(entity_type, key).map(|row| FetchedRow {
                closure_owner: tables.closure_owner(row),
                row: row.clone(),
            })
        })
    }

    async fn lock_row(
        &self,
        project: &str,
        entity_type: EntityType,
        key: &str,
    ) -> StoreResult<RowLock> {
        let row_key = (project.to_string(), entity_type, key.to_string());
        let mutex = self.row_locks.entry(row_key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;

        // drop the entry once no holder or waiter is left
        let locks = Arc::clone(&self.row_locks);
        Ok(RowLock::new(guard).with_release(move || {
            locks.remove_if(&row_key, |_, mutex| Arc::strong_count(mutex) == 1);
        }))
    }

    async fn insert(&self, project: &str, row: EntityRow) -> StoreResult<()> {
        if row.entity_type == EntityType::Project {
            let mut projects = self.projects.write();
            if projects.contains_key(project) {
                return Err(StoreError::Conflict {
                    entity_type: EntityType::Project,
                    key: project.to_string(),
                });
            }
            let mut tables = ProjectTables::default();
            tables.rows.insert((row.entity_type, row.key.clone()), row);
            projects.insert(project.to_string(), tables);
            return Ok(());
        }

        self.with_project_mut(project, |tables| {
            let key = (row.entity_type, row.key.clone());
            if tables.rows.contains_key(&key) {
                return Err(StoreError::Conflict {
                    entity_type: row.entity_type,
                    key: row.key,
                });
            }
            tables.rows.insert(key, row);
            Ok(())
        })
    }

    async fn update(&self, project: &str, row: EntityRow) -> StoreResult<()> {
        self.with_project_mut(project, |tables| {
            let key = (row.entity_type, row.key.clone());
            match tables.rows.get_mut(&key) {
                Some(stored) => {
                    *stored = row;
                    Ok(())
                }
                None => Err(StoreError::RowNotFound {
                    entity_type: row.entity_type,
                    key: row.key,
                }),
            }
        })
    }

    async fn delete(&self, project: &str, entity_type: EntityType, key: &str) -> StoreResult<bool> {
        if entity_type == EntityType::Project {
            let removed = self.projects.write().remove(project).is_some();
            self.row_locks.retain(|(p, _, _), _| p != project);
            return Ok(removed);
        }
        let removed = self.with_project_mut(project, |tables| {
            Ok(tables.rows.remove(&(entity_type, key.to_string())).is_some())
        })?;
        self.row_locks
            .remove(&(project.to_string(), entity_type, key.to_string()));
        Ok(removed)
    }

    async fn find_keys(
        &self,
        project: &str,
        entity_type: EntityType,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<String>> {
        self.with_project(project, |tables| {
            let mut keys: Vec<(chrono::DateTime<chrono::Utc>, String)> = tables
                .rows
                .values()
                .filter(|row| row.entity_type == entity_type)
                .filter(|row| field_matches(row.fields.get(field), value))
                .map(|row| (row.created_at, row.key.clone()))
                .collect();
            keys.sort();
            keys.into_iter().map(|(_, key)| key).collect()
        })
    }

    async fn categories(
        &self,
        project: &str,
        category: Category,
    ) -> StoreResult<Vec<CategoryEntry>> {
        self.with_project(project, |tables| {
            let mut entries = tables.categories.get(&category).cloned().unwrap_or_default();
            entries.sort_by_key(|e| e.position);
            entries
        })
    }

    async fn set_categories(
        &self,
        project: &str,
        category: Category,
        entries: Vec<CategoryEntry>,
    ) -> StoreResult<()> {
        self.with_project_mut(project, |tables| {
            tables.categories.insert(category, entries);
            Ok(())
        })
    }

    async fn closure_row(
        &self,
        project: &str,
        folder_id: &str,
    ) -> StoreResult<Option<InheritanceClosure>> {
        self.with_project(project, |tables| tables.closures.get(folder_id).cloned())
    }

    async fn put_closure_row(
        &self,
        project: &str,
        folder_id: &str,
        closure: InheritanceClosure,
    ) -> StoreResult<()> {
        self.with_project_mut(project, |tables| {
            tables.closures.insert(folder_id.to_string(), closure);
            Ok(())
        })
    }

    async fn delete_closure_row(&self, project: &str, folder_id: &str) -> StoreResult<()> {
        self.with_project_mut(project, |tables| {
            tables.closures.remove(folder_id);
            Ok(())
        })
    }

    async fn child_folders(
        &self,
        project: &str,
        parent: Option<&str>,
    ) -> StoreResult<Vec<EntityRow>> {
        self.with_project(project, |tables| {
            let mut children: Vec<EntityRow> = tables
                .rows
                .values()
                .filter(|row| row.entity_type == EntityType::Folder)
                .filter(|row| row.field_str("parent_id") == parent)
                .cloned()
                .collect();
            children.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.key.cmp(&b.key))
            });
            children
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert("demo", EntityRow::new(EntityType::Project, "demo"))
            .await
            .unwrap();
        store
            .insert(
                "demo",
                EntityRow::new(EntityType::Folder, "f1").with_field("parent_id", Value::Null),
            )
            .await
            .unwrap();
        store
            .insert(
                "demo",
                EntityRow::new(EntityType::Subset, "s1").with_field("folder_id", json!("f1")),
            )
            .await
            .unwrap();
        store
            .insert(
                "demo",
                EntityRow::new(EntityType::Version, "v1").with_field("subset_id", json!("s1")),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn fetch_missing_project() {
        let store = MemoryStore::new();
        let err = store.fetch("nope", EntityType::Task, "x").await.unwrap_err();
        assert_eq!(err, StoreError::ProjectNotFound("nope".into()));
    }

    #[tokio::test]
    async fn fetch_missing_row_is_none() {
        let store = store().await;
        assert!(store.fetch("demo", EntityType::Task, "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_conflicts() {
        let store = store().await;
        let err = store
            .insert("demo", EntityRow::new(EntityType::Subset, "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn closure_owner_follows_parents() {
        let store = store().await;
        let folder = store.fetch("demo", EntityType::Folder, "f1").await.unwrap().unwrap();
        assert_eq!(folder.closure_owner, ClosureOwner::ProjectRoot);

        let version = store.fetch("demo", EntityType::Version, "v1").await.unwrap().unwrap();
        assert_eq!(version.closure_owner, ClosureOwner::Folder("f1".into()));
    }

    #[tokio::test]
    async fn dangling_parent_is_unresolved() {
        let store = store().await;
        store
            .insert(
                "demo",
                EntityRow::new(EntityType::Representation, "r1")
                    .with_field("version_id", json!("gone")),
            )
            .await
            .unwrap();
        let fetched = store
            .fetch("demo", EntityType::Representation, "r1")
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(fetched.closure_owner, ClosureOwner::Unresolved(_)));
    }

    #[tokio::test]
    async fn categories_are_ordered_by_position() {
        let store = store().await;
        store
            .set_categories(
                "demo",
                Category::TaskType,
                vec![CategoryEntry::new("Modeling", 1), CategoryEntry::new("Generic", 0)],
            )
            .await
            .unwrap();
        let names: Vec<String> = store
            .categories("demo", Category::TaskType)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Generic", "Modeling"]);
    }

    #[tokio::test]
    async fn find_keys_matches_list_members() {
        let store = store().await;
        store
            .insert(
                "demo",
                EntityRow::new(EntityType::Task, "t1")
                    .with_field("assignees", json!(["alice", "bob"])),
            )
            .await
            .unwrap();
        let keys = store
            .find_keys("demo", EntityType::Task, "assignees", &json!("bob"))
            .await
            .unwrap();
        assert_eq!(keys, vec!["t1"]);
    }

    #[tokio::test]
    async fn deleting_project_row_drops_project() {
        let store = store().await;
        assert!(store.delete("demo", EntityType::Project, "demo").await.unwrap());
        assert!(!store.project_exists("demo").await.unwrap());
        assert_eq!(store.project_count(), 0);
    }

    #[tokio::test]
    async fn row_lock_serializes_holders() {
        let store = Arc::new(store().await);
        let guard = store.lock_row("demo", EntityType::Subset, "s1").await.unwrap();

        let contender = Arc::clone(&store);
        let waiter = tokio::spawn(async move {
            contender.lock_row("demo", EntityType::Subset, "s1").await.map(|_| ())
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn released_row_lock_is_forgotten() {
        let store = Arc::new(store().await);
        let guard = store.lock_row("demo", EntityType::Task, "t1").await.unwrap();
        assert_eq!(store.row_lock_count(), 1);

        let contender = Arc::clone(&store);
        let waiter = tokio::spawn(async move {
            contender.lock_row("demo", EntityType::Task, "t1").await.map(drop)
        });
        tokio::task::yield_now().await;

        drop(guard);
        waiter.await.unwrap().unwrap();
        assert_eq!(store.row_lock_count(), 0);

        for key in ["missing-1", "missing-2", "missing-3"] {
            drop(store.lock_row("demo", EntityType::Task, key).await.unwrap());
        }
        assert_eq!(store.row_lock_count(), 0);
    }
}
