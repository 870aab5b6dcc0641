//! Stored row representation
//!
//! A row holds the natural fields of an entity and the attribute values the
//! entity owns. Inherited values are never stored on a row; the set of own
//! attribute names is the key set of [`EntityRow::attrib`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_attrib::EntityType;

/// One stored entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    /// Entity type (table)
    pub entity_type: EntityType,
    /// Primary key: the surrogate id, or the name for natural-key types
    pub key: String,
    /// Natural fields, auxiliary `data`, `active`, `status`, `tags`
    pub fields: Map<String, Value>,
    /// Own attribute overrides only
    pub attrib: Map<String, Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl EntityRow {
    /// Create a row stamped with the current time
    #[must_use]
    pub fn new(entity_type: EntityType, key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entity_type,
            key: key.into(),
            fields: Map::new(),
            attrib: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set a natural field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Set an own attribute
    #[must_use]
    pub fn with_attrib(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attrib.insert(name.into(), value);
        self
    }

    /// String value of a natural field
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Names of the owned attributes, in stored order
    pub fn own_attrib(&self) -> impl Iterator<Item = &str> {
        self.attrib.keys().map(String::as_str)
    }
}

/// Where an entity's inherited attributes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureOwner {
    /// The type does not inherit attributes
    None,
    /// Top-level folder: inherits from the project itself
    ProjectRoot,
    /// Inherits the closure of this folder
    Folder(String),
    /// A parent reference is dangling; the description names the broken link
    Unresolved(String),
}

/// A row together with the folder whose closure it inherits
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    /// The stored row
    pub row: EntityRow,
    /// Source of inherited attributes
    pub closure_owner: ClosureOwner,
}

/// Ordered per-project category tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Task types, used to default `task_type`
    TaskType,
    /// Folder types, used to default `folder_type`
    FolderType,
    /// Statuses
    Status,
}

impl Category {
    /// Project field holding this category's list
    #[must_use]
    pub fn project_field(&self) -> &'static str {
        match self {
            Category::TaskType => "task_types",
            Category::FolderType => "folder_types",
            Category::Status => "statuses",
        }
    }

    /// All categories
    pub const ALL: [Category; 3] = [Category::TaskType, Category::FolderType, Category::Status];
}

/// One category entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Entry name
    pub name: String,
    /// Ordering key; lowest first
    pub position: i64,
    /// Remaining properties (icon, color, short name)
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl CategoryEntry {
    /// Create a bare entry
    #[must_use]
    pub fn new(name: impl Into<String>, position: i64) -> Self {
        Self {
            name: name.into(),
            position,
            data: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn own_attrib_follows_stored_keys() {
        let row = EntityRow::new(EntityType::Task, "a")
            .with_attrib("fps", json!(24))
            .with_attrib("frameStart", json!(1001));
        assert_eq!(row.own_attrib().collect::<Vec<_>>(), vec!["fps", "frameStart"]);
    }

    #[test]
    fn field_str_reads_strings_only() {
        let row = EntityRow::new(EntityType::Task, "a")
            .with_field("folder_id", json!("f"))
            .with_field("assignees", json!([]));
        assert_eq!(row.field_str("folder_id"), Some("f"));
        assert_eq!(row.field_str("assignees"), None);
    }

    #[test]
    fn category_fields() {
        assert_eq!(Category::TaskType.project_field(), "task_types");
        assert_eq!(Category::Status.project_field(), "statuses");
    }
}
