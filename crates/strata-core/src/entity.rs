//! Hydrated entity
//!
//! An [`Entity`] is created by the lifecycle manager, either fresh from a
//! create payload or by loading a stored row. Natural fields are plain JSON
//! values; attributes live in an [`AttributeSet`] that only the manager's
//! patch path mutates.

use crate::error::InconsistencyWarning;
use crate::resolver::AttributeSet;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use strata_attrib::EntityType;
use strata_schema::OWN_ATTRIB;
use strata_store::RowLock;

/// Lifecycle state of an in-memory entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Constructed but never stored
    Unloaded,
    /// Freshly read from the store
    Loaded,
    /// Changed since the last load or save
    Modified,
    /// Written to the store
    Persisted,
}

/// One entity instance
#[derive(Debug)]
pub struct Entity {
    pub(crate) entity_type: EntityType,
    pub(crate) project: String,
    pub(crate) key: String,
    pub(crate) fields: Map<String, Value>,
    pub(crate) attrib: AttributeSet,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) state: EntityState,
    pub(crate) exists: bool,
    pub(crate) lock: Option<RowLock>,
    pub(crate) warning: Option<InconsistencyWarning>,
}

impl Entity {
    /// Entity type
    #[inline]
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Owning project name
    #[inline]
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Surrogate id, or the name for projects
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.key
    }

    /// Natural fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// One natural field
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    fn field_strs(&self, name: &str) -> Vec<&str> {
        self.field(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Effective attributes and ownership
    #[inline]
    #[must_use]
    pub fn attrib(&self) -> &AttributeSet {
        &self.attrib
    }

    /// Names of own attributes
    #[must_use]
    pub fn own_attrib(&self) -> Vec<&str> {
        self.attrib.own().iter().map(String::as_str).collect()
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last update time
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Whether a stored row exists for this entity
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Whether the row lock is held
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Release the row lock early
    pub fn release_lock(&mut self) {
        self.lock = None;
    }

    /// Inconsistency found while loading
    #[inline]
    #[must_use]
    pub fn warning(&self) -> Option<&InconsistencyWarning> {
        self.warning.as_ref()
    }

    /// Display name: the label, or the name when unset
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.field_str("label").or_else(|| self.name())
    }

    /// Store a display label; `None` clears it
    pub fn set_label(&mut self, label: Option<&str>) {
        let value = label.map_or(Value::Null, |l| Value::String(l.to_string()));
        self.fields.insert("label".to_string(), value);
        self.state = EntityState::Modified;
    }

    /// Entity name (version entities have none)
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        if self.entity_type == EntityType::Project {
            Some(&self.key)
        } else {
            self.field_str("name")
        }
    }

    /// Active flag
    #[must_use]
    pub fn active(&self) -> bool {
        self.field("active").and_then(Value::as_bool).unwrap_or(true)
    }

    /// Status, for project-level entities
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.field_str("status")
    }

    /// Tags, for project-level entities
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.field_strs("tags")
    }

    /// Auxiliary data
    #[must_use]
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.field("data").and_then(Value::as_object)
    }

    /// Parent folder of a folder
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.field_str("parent_id")
    }

    /// Owning folder of a task or subset
    #[must_use]
    pub fn folder_id(&self) -> Option<&str> {
        self.field_str("folder_id")
    }

    /// Task of a version or workfile
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        self.field_str("task_id")
    }

    /// Subset of a version
    #[must_use]
    pub fn subset_id(&self) -> Option<&str> {
        self.field_str("subset_id")
    }

    /// Version of a representation
    #[must_use]
    pub fn version_id(&self) -> Option<&str> {
        self.field_str("version_id")
    }

    /// Task type of a task
    #[must_use]
    pub fn task_type(&self) -> Option<&str> {
        self.field_str("task_type")
    }

    /// Folder type of a folder
    #[must_use]
    pub fn folder_type(&self) -> Option<&str> {
        self.field_str("folder_type")
    }

    /// Users assigned to a task
    #[must_use]
    pub fn assignees(&self) -> Vec<&str> {
        self.field_strs("assignees")
    }

    /// Author of a version
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.field_str("author")
    }

    /// Subtype shown next to the entity type
    #[must_use]
    pub fn entity_subtype(&self) -> Option<&str> {
        match self.entity_type {
            EntityType::Task => self.task_type(),
            EntityType::Folder => self.folder_type(),
            EntityType::Subset => self.field_str("family"),
            _ => None,
        }
    }

    /// Full read document: identifier, fields, effective attributes,
    /// `own_attrib` and timestamps
    #[must_use]
    pub fn to_document(&self) -> Map<String, Value> {
        let identifier = if self.entity_type.has_surrogate_id() { "id" } else { "name" };
        let mut doc = Map::new();
        doc.insert(identifier.to_string(), Value::String(self.key.clone()));
        for (name, value) in &self.fields {
            doc.insert(name.clone(), value.clone());
        }
        doc.insert("attrib".to_string(), Value::Object(self.attrib.effective().clone()));
        doc.insert(
            OWN_ATTRIB.to_string(),
            Value::Array(
                self.attrib
                    .own()
                    .iter()
                    .map(|n| Value::String(n.clone()))
                    .collect(),
            ),
        );
        doc.insert("created_at".to_string(), Value::String(self.created_at.to_rfc3339()));
        doc.insert("updated_at".to_string(), Value::String(self.updated_at.to_rfc3339()));
        doc
    }
}
