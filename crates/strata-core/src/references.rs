//! Relations between entities
//!
//! Each entity kind is one variant of [`RelationSource`]; each variant has
//! its own extraction function. Kinds without relations yield nothing.

use crate::entity::Entity;
use crate::error::CoreResult;
use serde::Serialize;
use serde_json::Value;
use strata_attrib::EntityType;
use strata_store::EntityStore;

/// Kind of reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    /// Structural relation between entities
    Relation,
}

/// Reference to a related entity, by name or by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReference {
    /// Referenced entity type
    pub entity_type: EntityType,
    /// Name, for natural-key types (users)
    pub entity_name: Option<String>,
    /// Id, for surrogate-id types
    pub entity_id: Option<String>,
    /// Reference kind
    pub reference_type: ReferenceType,
}

impl EntityReference {
    /// Relation to a user
    #[must_use]
    pub fn user(name: &str) -> Self {
        Self {
            entity_type: EntityType::User,
            entity_name: Some(name.to_string()),
            entity_id: None,
            reference_type: ReferenceType::Relation,
        }
    }

    /// Relation to a project-level entity
    #[must_use]
    pub fn entity(entity_type: EntityType, id: &str) -> Self {
        Self {
            entity_type,
            entity_name: None,
            entity_id: Some(id.to_string()),
            reference_type: ReferenceType::Relation,
        }
    }
}

/// Relation-bearing view of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationSource<'a> {
    /// A task: its assignees and the versions made for it
    Task {
        /// Project name
        project: &'a str,
        /// Task id
        id: &'a str,
        /// Assigned user names
        assignees: Vec<&'a str>,
    },
    /// A version: its author and its task
    Version {
        /// Author user name
        author: Option<&'a str>,
        /// Task id
        task_id: Option<&'a str>,
    },
    /// Anything else
    Other,
}

impl<'a> RelationSource<'a> {
    /// Classify an entity
    #[must_use]
    pub fn of(entity: &'a Entity) -> Self {
        match entity.entity_type() {
            EntityType::Task => RelationSource::Task {
                project: entity.project(),
                id: entity.id(),
                assignees: entity.assignees(),
            },
            EntityType::Version => RelationSource::Version {
                author: entity.author(),
                task_id: entity.task_id(),
            },
            _ => RelationSource::Other,
        }
    }
}

async fn task_references(
    store: &dyn EntityStore,
    project: &str,
    id: &str,
    assignees: &[&str],
) -> CoreResult<Vec<EntityReference>> {
    let mut references: Vec<EntityReference> =
        assignees.iter().map(|name| EntityReference::user(name)).collect();

    let versions = store
        .find_keys(project, EntityType::Version, "task_id", &Value::String(id.to_string()))
        .await?;
    references.extend(
        versions
            .iter()
            .map(|version| EntityReference::entity(EntityType::Version, version)),
    );
    Ok(references)
}

fn version_references(author: Option<&str>, task_id: Option<&str>) -> Vec<EntityReference> {
    author
        .map(EntityReference::user)
        .into_iter()
        .chain(task_id.map(|id| EntityReference::entity(EntityType::Task, id)))
        .collect()
}

/// Entities related to `entity`
///
/// # Errors
/// Store errors while looking up a task's versions.
pub async fn references(store: &dyn EntityStore, entity: &Entity) -> CoreResult<Vec<EntityReference>> {
    match RelationSource::of(entity) {
        RelationSource::Task {
            project,
            id,
            assignees,
        } => task_references(store, project, id, &assignees).await,
        RelationSource::Version { author, task_id } => Ok(version_references(author, task_id)),
        RelationSource::Other => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_without_author_relates_to_task_only() {
        let refs = version_references(None, Some("abc"));
        assert_eq!(refs, vec![EntityReference::entity(EntityType::Task, "abc")]);
    }

    #[test]
    fn version_relations_in_order() {
        let refs = version_references(Some("alice"), Some("abc"));
        assert_eq!(refs[0], EntityReference::user("alice"));
        assert_eq!(refs[1].entity_type, EntityType::Task);
    }

    #[test]
    fn reference_serializes_lowercase() {
        let value = serde_json::to_value(EntityReference::user("bob")).unwrap();
        assert_eq!(value["reference_type"], "relation");
        assert_eq!(value["entity_type"], "user");
        assert!(value["entity_id"].is_null());
    }
}
