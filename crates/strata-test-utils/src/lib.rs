//! Testing utilities for the Strata workspace
//!
//! Shared fixtures: a registry, a manager over an in-memory store and a small
//! project hierarchy with closures built.

#![allow(missing_docs)]

use serde_json::{json, Map, Value};
use std::sync::Arc;
use strata_attrib::{AttributeRegistry, EntityType};
use strata_core::{Entity, EntityManager};
use strata_store::{EntityStore, MemoryStore};

pub const PROJECT: &str = "demo";

/// Ids of the sample hierarchy
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub sequence: String,
    pub shot: String,
    pub task: String,
}

pub fn registry() -> Arc<AttributeRegistry> {
    Arc::new(AttributeRegistry::with_builtins().unwrap())
}

pub fn payload(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

pub fn setup_manager() -> EntityManager {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    EntityManager::new(registry(), store)
}

/// Save a project with the given task types
pub async fn create_project(manager: &EntityManager, task_types: &[&str]) -> Entity {
    let task_types: Vec<Value> = task_types.iter().map(|t| json!({"name": t})).collect();
    let mut project = manager
        .create(
            PROJECT,
            EntityType::Project,
            &payload(json!({
                "code": "dm",
                "task_types": task_types,
                "folder_types": [{"name": "Sequence"}, {"name": "Shot"}],
                "attrib": {"fps": 24.0},
            })),
        )
        .unwrap();
    manager.save(&mut project).await.unwrap();
    project
}

pub async fn create_entity(
    manager: &EntityManager,
    entity_type: EntityType,
    body: Value,
) -> Entity {
    let mut entity = manager.create(PROJECT, entity_type, &payload(body)).unwrap();
    manager.save(&mut entity).await.unwrap();
    entity
}

/// Project `demo` (fps 24) -> sequence `sq010` (frameStart 1001) -> shot
/// `sh010` -> task `compositing`, closures rebuilt
pub async fn setup_hierarchy() -> (EntityManager, Hierarchy) {
    let manager = setup_manager();
    create_project(&manager, &["Generic", "Modeling"]).await;

    let sequence = create_entity(
        &manager,
        EntityType::Folder,
        json!({"name": "sq010", "folder_type": "Sequence", "attrib": {"frameStart": 1001}}),
    )
    .await;
    let shot = create_entity(
        &manager,
        EntityType::Folder,
        json!({"name": "sh010", "folder_type": "Shot", "parent_id": sequence.id()}),
    )
    .await;
    let task = create_entity(
        &manager,
        EntityType::Task,
        json!({"name": "compositing", "folder_id": shot.id(), "assignees": ["alice"]}),
    )
    .await;

    manager.closures().rebuild_project(PROJECT).await.unwrap();

    let hierarchy = Hierarchy {
        sequence: sequence.id().to_string(),
        shot: shot.id().to_string(),
        task: task.id().to_string(),
    };
    (manager, hierarchy)
}
