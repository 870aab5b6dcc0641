//! Inheritance closure store
//!
//! Each folder has a precomputed closure: the merge of the project's
//! attributes, every ancestor folder's own attributes and the folder's own,
//! inheritable attributes only. Children of the folder read it in one lookup
//! instead of walking the ancestor chain.
//!
//! [`ClosureCache`] keeps closures in a moka cache in front of the backend's
//! closure rows. Structural changes call [`ClosureCache::rebuild`] (recompute
//! and cascade to descendants) or [`ClosureCache::invalidate`] (evict the
//! cached copy only). Readers go through [`ClosureReader`].

use crate::backend::EntityStore;
use crate::error::{StoreError, StoreResult};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use strata_attrib::{AttributeRegistry, EntityType};

/// Flattened inherited attribute mapping of one folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InheritanceClosure {
    attrib: Map<String, Value>,
}

impl InheritanceClosure {
    /// Create from a mapping
    #[inline]
    #[must_use]
    pub fn new(attrib: Map<String, Value>) -> Self {
        Self { attrib }
    }

    /// Value of one attribute
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrib.get(name)
    }

    /// Whether the closure holds a value for `name`
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attrib.contains_key(name)
    }

    /// Iterate entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrib.iter()
    }

    /// Number of attributes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrib.len()
    }

    /// Whether the closure is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrib.is_empty()
    }

    /// Extend with the inheritable subset of `own`, overriding existing keys
    fn overlay(
        &self,
        own: &Map<String, Value>,
        registry: &AttributeRegistry,
        entity_type: EntityType,
    ) -> Self {
        let mut attrib = self.attrib.clone();
        for (name, value) in own {
            if registry.is_inheritable(entity_type, name) {
                attrib.insert(name.clone(), value.clone());
            }
        }
        Self { attrib }
    }
}

/// Read access to closures
///
/// The resolver only ever reads; refreshing is the structural-change side's
/// job.
#[async_trait::async_trait]
pub trait ClosureReader: Send + Sync {
    /// Closure of a folder, `None` if never computed
    async fn closure(&self, project: &str, folder_id: &str)
        -> StoreResult<Option<Arc<InheritanceClosure>>>;

    /// Attributes a top-level folder inherits from its project
    async fn root_closure(&self, project: &str) -> StoreResult<Arc<InheritanceClosure>>;
}

/// Key of the project-level closure in the cache
const ROOT_KEY: &str = "";

type CacheKey = (String, String);

/// Cached closure store over a backend
#[derive(Debug, Clone)]
pub struct ClosureCache {
    inner: Cache<CacheKey, Arc<InheritanceClosure>>,
    store: Arc<dyn EntityStore>,
    registry: Arc<AttributeRegistry>,
}

impl ClosureCache {
    /// Create with a capacity bound
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        registry: Arc<AttributeRegistry>,
        max_capacity: u64,
    ) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            store,
            registry,
        }
    }

    /// Create with a capacity bound and time-based expiration
    #[must_use]
    pub fn with_ttl(
        store: Arc<dyn EntityStore>,
        registry: Arc<AttributeRegistry>,
        max_capacity: u64,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            store,
            registry,
        }
    }

    fn key(project: &str, folder_id: &str) -> CacheKey {
        (project.to_string(), folder_id.to_string())
    }

    /// Evict a folder's cached closure
    ///
    /// The stored closure row is left as is; the next read reloads it.
    pub async fn invalidate(&self, project: &str, folder_id: &str) {
        tracing::debug!(project, folder_id, "closure invalidated");
        self.inner.invalidate(&Self::key(project, folder_id)).await;
    }

    /// Evict the cached project-level closure
    pub async fn invalidate_root(&self, project: &str) {
        self.inner.invalidate(&Self::key(project, ROOT_KEY)).await;
    }

    /// Evict every cached closure of a project
    pub async fn invalidate_project(&self, project: &str) {
        let keys: Vec<Arc<CacheKey>> = self
            .inner
            .iter()
            .filter(|(key, _)| key.0 == project)
            .map(|(key, _)| key)
            .collect();
        for key in keys {
            self.inner.invalidate(key.as_ref()).await;
        }
    }

    /// Evict everything
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate number of cached closures
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Recompute a folder's closure and those of all its descendants
    ///
    /// The cached project-level closure is refreshed along the way. Returns the number of folders rebuilt.
    ///
    /// # Errors
    /// `RowNotFound` if the folder does not exist, plus backend errors.
    pub async fn rebuild(&self, project: &str, folder_id: &str) -> StoreResult<usize> {
        let chain = self.ancestry(project, folder_id).await?;

        let mut closure = self.refresh_root(project).await?.as_ref().clone();
        for own in chain.iter().rev() {
            closure = closure.overlay(own, &self.registry, EntityType::Folder);
        }
        self.store_closure(project, folder_id, closure.clone()).await?;

        let rebuilt = 1 + self.cascade(project, folder_id, closure).await?;
        tracing::debug!(project, folder_id, rebuilt, "closure rebuilt");
        Ok(rebuilt)
    }

    /// Recompute every folder closure of a project, top-down
    ///
    /// # Errors
    /// Backend errors.
    pub async fn rebuild_project(&self, project: &str) -> StoreResult<usize> {
        let root = self.refresh_root(project).await?;

        let mut rebuilt = 0;
        for folder in self.store.child_folders(project, None).await? {
            let closure = root.overlay(&folder.attrib, &self.registry, EntityType::Folder);
            self.store_closure(project, &folder.key, closure.clone()).await?;
            rebuilt += 1 + self.cascade(project, &folder.key, closure).await?;
        }
        tracing::debug!(project, rebuilt, "project closures rebuilt");
        Ok(rebuilt)
    }

    /// Drop a deleted folder's closure row and cached copy
    ///
    /// # Errors
    /// Backend errors.
    pub async fn remove(&self, project: &str, folder_id: &str) -> StoreResult<()> {
        self.store.delete_closure_row(project, folder_id).await?;
        self.invalidate(project, folder_id).await;
        Ok(())
    }

    /// Own attribute maps from `folder_id` up to its top-level ancestor
    async fn ancestry(&self, project: &str, folder_id: &str) -> StoreResult<Vec<Map<String, Value>>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(folder_id.to_string());

        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                return Err(StoreError::Backend(format!(
                    "folder hierarchy cycle at '{id}'"
                )));
            }
            let fetched = self
                .store
                .fetch(project, EntityType::Folder, &id)
                .await?
                .ok_or_else(|| StoreError::RowNotFound {
                    entity_type: EntityType::Folder,
                    key: id.clone(),
                })?;
            current = fetched.row.field_str("parent_id").map(str::to_string);
            chain.push(fetched.row.attrib);
        }
        Ok(chain)
    }

    /// Breadth-first rebuild below `folder_id`, whose closure is `closure`
    async fn cascade(
        &self,
        project: &str,
        folder_id: &str,
        closure: InheritanceClosure,
    ) -> StoreResult<usize> {
        let mut queue = VecDeque::from([(folder_id.to_string(), closure)]);
        let mut seen = HashSet::from([folder_id.to_string()]);
        let mut rebuilt = 0;

        while let Some((parent, parent_closure)) = queue.pop_front() {
            for child in self.store.child_folders(project, Some(&parent)).await? {
                if !seen.insert(child.key.clone()) {
                    continue;
                }
                let closure =
                    parent_closure.overlay(&child.attrib, &self.registry, EntityType::Folder);
                self.store_closure(project, &child.key, closure.clone()).await?;
                queue.push_back((child.key, closure));
                rebuilt += 1;
            }
        }
        Ok(rebuilt)
    }

    async fn compute_root(&self, project: &str) -> StoreResult<InheritanceClosure> {
        let fetched = self
            .store
            .fetch(project, EntityType::Project, project)
            .await?
            .ok_or_else(|| StoreError::ProjectNotFound(project.to_string()))?;
        Ok(InheritanceClosure::default().overlay(
            &fetched.row.attrib,
            &self.registry,
            EntityType::Project,
        ))
    }

    /// Recompute the project-level closure and replace the cached copy
    async fn refresh_root(&self, project: &str) -> StoreResult<Arc<InheritanceClosure>> {
        let root = Arc::new(self.compute_root(project).await?);
        self.inner
            .insert(Self::key(project, ROOT_KEY), Arc::clone(&root))
            .await;
        Ok(root)
    }

    async fn store_closure(
        &self,
        project: &str,
        folder_id: &str,
        closure: InheritanceClosure,
    ) -> StoreResult<()> {
        self.store
            .put_closure_row(project, folder_id, closure.clone())
            .await?;
        self.inner
            .insert(Self::key(project, folder_id), Arc::new(closure))
            .await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClosureReader for ClosureCache {
    async fn closure(
        &self,
        project: &str,
        folder_id: &str,
    ) -> StoreResult<Option<Arc<InheritanceClosure>>> {
        let key = Self::key(project, folder_id);
        if let Some(cached) = self.inner.get(&key).await {
            tracing::debug!(project, folder_id, "closure cache hit");
            return Ok(Some(cached));
        }

        tracing::debug!(project, folder_id, "closure cache miss");
        let Some(closure) = self.store.closure_row(project, folder_id).await? else {
            return Ok(None);
        };
        let closure = Arc::new(closure);
        self.inner.insert(key, Arc::clone(&closure)).await;
        Ok(Some(closure))
    }

    async fn root_closure(&self, project: &str) -> StoreResult<Arc<InheritanceClosure>> {
        let key = Self::key(project, ROOT_KEY);
        if let Some(cached) = self.inner.get(&key).await {
            return Ok(cached);
        }
        self.refresh_root(project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn overlay_keeps_inheritable_only() {
        let registry = AttributeRegistry::with_builtins().unwrap();
        let base = InheritanceClosure::new(map(json!({"fps": 25})));
        let own = map(json!({"fps": 24, "description": "hero shot", "frameStart": 1001}));

        let merged = base.overlay(&own, &registry, EntityType::Folder);
        assert_eq!(merged.get("fps"), Some(&json!(24)));
        assert_eq!(merged.get("frameStart"), Some(&json!(1001)));
        assert!(!merged.contains("description"));
    }

    #[test]
    fn closure_serializes_as_plain_mapping() {
        let closure = InheritanceClosure::new(map(json!({"fps": 25})));
        assert_eq!(serde_json::to_value(&closure).unwrap(), json!({"fps": 25}));
    }
}
