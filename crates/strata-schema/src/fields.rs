//! Declared field tables per entity type
//!
//! These are the entity-specific fields only. Identifier, attribute bag,
//! auxiliary data, active flag, project-level status/tags and timestamps are
//! added by the generator.

use crate::field::{FieldSpec, FieldType, ENTITY_ID_EXAMPLE, ENTITY_ID_REGEX, NAME_REGEX, PROJECT_CODE_REGEX};
use serde_json::json;
use std::collections::HashMap;
use strata_attrib::{EntityType, ValueType};

/// Field tables for every entity type
///
/// Built once at startup and handed to the schema generator. Tables can be
/// replaced per entity type before the generator is constructed.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    tables: HashMap<EntityType, Vec<FieldSpec>>,
}

impl FieldCatalog {
    /// Catalog with the standard field tables
    #[must_use]
    pub fn standard() -> Self {
        let tables = EntityType::ALL
            .iter()
            .map(|t| (*t, standard_fields(*t)))
            .collect();
        Self { tables }
    }

    /// Replace the field table of an entity type
    #[must_use]
    pub fn with_fields(mut self, entity_type: EntityType, fields: Vec<FieldSpec>) -> Self {
        self.tables.insert(entity_type, fields);
        self
    }

    /// Declared fields of an entity type
    #[must_use]
    pub fn fields(&self, entity_type: EntityType) -> &[FieldSpec] {
        self.tables.get(&entity_type).map_or(&[], Vec::as_slice)
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn id_ref(name: &str, title: &str) -> FieldSpec {
    FieldSpec::value(name, ValueType::String)
        .with_regex(ENTITY_ID_REGEX)
        .with_title(title)
        .with_example(json!(ENTITY_ID_EXAMPLE))
}

fn entity_name(entity_type: EntityType) -> FieldSpec {
    FieldSpec::value("name", ValueType::String)
        .required()
        .with_regex(NAME_REGEX)
        .with_title(format!("{} name", entity_type.title()))
}

fn label() -> FieldSpec {
    FieldSpec::value("label", ValueType::String)
        .with_title("Label")
        .with_description("Human friendly name, falls back to name")
}

fn thumbnail() -> FieldSpec {
    id_ref("thumbnail_id", "Thumbnail ID")
}

/// Standard declared fields of an entity type
#[must_use]
pub fn standard_fields(entity_type: EntityType) -> Vec<FieldSpec> {
    match entity_type {
        EntityType::Project => project_fields(),
        EntityType::Folder => vec![
            entity_name(entity_type),
            label(),
            FieldSpec::value("folder_type", ValueType::String)
                .with_title("Folder type")
                .with_example(json!("Shot")),
            id_ref("parent_id", "Parent folder ID"),
            thumbnail(),
            FieldSpec::value("path", ValueType::String)
                .dynamic()
                .with_title("Path")
                .with_example(json!("/assets/characters/xenomorph")),
        ],
        EntityType::Task => vec![
            entity_name(entity_type),
            label(),
            FieldSpec::value("task_type", ValueType::String)
                .with_title("Task type")
                .with_example(json!("Compositing")),
            FieldSpec::value("assignees", ValueType::ListOfStrings)
                .with_default(json!([]))
                .with_title("Assignees")
                .with_example(json!(["john_doe", "jane_doe"])),
            id_ref("folder_id", "Folder ID").required(),
            thumbnail(),
        ],
        EntityType::Subset => vec![
            entity_name(entity_type),
            id_ref("folder_id", "Folder ID").required(),
            FieldSpec::value("family", ValueType::String)
                .required()
                .with_title("Family")
                .with_example(json!("model")),
        ],
        EntityType::Version => vec![
            FieldSpec::value("version", ValueType::Integer)
                .required()
                .with_title("Version number")
                .with_example(json!(1)),
            id_ref("subset_id", "Subset ID").required(),
            id_ref("task_id", "Task ID"),
            thumbnail(),
            FieldSpec::value("author", ValueType::String)
                .with_title("Author")
                .with_example(json!("john_doe")),
        ],
        EntityType::Representation => vec![
            entity_name(entity_type),
            id_ref("version_id", "Version ID").required(),
            FieldSpec::new("files", FieldType::ListOfMappings)
                .with_default(json!([]))
                .with_title("Files"),
        ],
        EntityType::Workfile => vec![
            FieldSpec::value("path", ValueType::String)
                .required()
                .with_title("Path")
                .with_example(json!("{root[work]}/project/shots/sh010/work/sh010_comp_v001.nk")),
            id_ref("task_id", "Task ID").required(),
            thumbnail(),
            FieldSpec::value("created_by", ValueType::String).with_title("Created by"),
            FieldSpec::value("updated_by", ValueType::String).with_title("Updated by"),
        ],
        EntityType::User => Vec::new(),
    }
}

fn project_fields() -> Vec<FieldSpec> {
    let list = |name: &str, title: &str| {
        FieldSpec::new(name, FieldType::ListOfMappings)
            .with_default(json!([]))
            .with_title(title)
    };
    vec![
        FieldSpec::value("code", ValueType::String)
            .required()
            .with_regex(PROJECT_CODE_REGEX)
            .with_title("Project code")
            .with_example(json!("prj")),
        FieldSpec::value("library", ValueType::Boolean)
            .with_default(json!(false))
            .with_title("Library project"),
        list("folder_types", "Folder types"),
        list("task_types", "Task types"),
        list("link_types", "Link types"),
        list("statuses", "Statuses"),
        list("tags", "Tags"),
        FieldSpec::value("config", ValueType::Mapping)
            .with_default(json!({}))
            .with_title("Project config"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_has_no_declared_fields() {
        assert!(standard_fields(EntityType::User).is_empty());
    }

    #[test]
    fn task_requires_folder() {
        let fields = standard_fields(EntityType::Task);
        let folder_id = fields.iter().find(|f| f.name == "folder_id").unwrap();
        assert!(folder_id.required);
    }

    #[test]
    fn catalog_override() {
        let catalog = FieldCatalog::standard()
            .with_fields(EntityType::User, vec![FieldSpec::value("nick", ValueType::String)]);
        assert_eq!(catalog.fields(EntityType::User).len(), 1);
        assert!(!catalog.fields(EntityType::Folder).is_empty());
    }
}
