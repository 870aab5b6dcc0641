//! End-to-end inheritance scenarios

use pretty_assertions::assert_eq;
use serde_json::json;
use strata_attrib::{ConfigurationError, EntityType};
use strata_core::anatomy::Root;
use strata_core::{anatomy_to_project_payload, Anatomy, CoreError, EntityManager, Settings};
use strata_store::EntityStore;
use strata_test_utils::{
    create_entity, create_project, payload, setup_hierarchy, setup_manager, PROJECT,
};

#[tokio::test]
async fn task_inherits_folder_attribute() {
    let (manager, ids) = setup_hierarchy().await;

    let task = manager
        .load(PROJECT, EntityType::Task, &ids.task, false)
        .await
        .unwrap();

    assert_eq!(task.attrib().get("frameStart"), Some(&json!(1001)));
    assert!(!task.attrib().is_own("frameStart"));
    assert_eq!(task.attrib().get("fps"), Some(&json!(24.0)));
    assert!(task.warning().is_none());
}

#[tokio::test]
async fn patched_value_is_pinned() {
    let (manager, ids) = setup_hierarchy().await;

    let mut task = manager
        .load(PROJECT, EntityType::Task, &ids.task, true)
        .await
        .unwrap();
    manager
        .patch(&mut task, &payload(json!({"attrib": {"frameStart": 1050}})))
        .unwrap();
    manager.save(&mut task).await.unwrap();
    drop(task);

    let task = manager
        .load(PROJECT, EntityType::Task, &ids.task, false)
        .await
        .unwrap();
    assert_eq!(task.attrib().get("frameStart"), Some(&json!(1050)));
    assert!(task.attrib().is_own("frameStart"));

    let mut sequence = manager
        .load(PROJECT, EntityType::Folder, &ids.sequence, false)
        .await
        .unwrap();
    manager
        .patch(&mut sequence, &payload(json!({"attrib": {"frameStart": 2001}})))
        .unwrap();
    manager.save(&mut sequence).await.unwrap();
    manager.closures().rebuild(PROJECT, &ids.sequence).await.unwrap();

    let shot = manager
        .load(PROJECT, EntityType::Folder, &ids.shot, false)
        .await
        .unwrap();
    assert_eq!(shot.attrib().get("frameStart"), Some(&json!(2001)));

    let task = manager
        .load(PROJECT, EntityType::Task, &ids.task, false)
        .await
        .unwrap();
    assert_eq!(task.attrib().get("frameStart"), Some(&json!(1050)));
}

#[tokio::test]
async fn missing_closure_degrades_to_defaults() {
    let (manager, ids) = setup_hierarchy().await;
    manager.closures().remove(PROJECT, &ids.shot).await.unwrap();

    let task = manager
        .load(PROJECT, EntityType::Task, &ids.task, false)
        .await
        .unwrap();

    assert_eq!(task.attrib().get("fps"), Some(&json!(25.0)));
    assert_eq!(task.attrib().get("frameStart"), Some(&json!(1001)));
    let warning = task.warning().unwrap();
    assert_eq!(warning.entity_type, EntityType::Task);
    assert!(warning.message.contains(&ids.shot));
}

#[test]
fn duplicate_attribute_for_same_type_is_rejected() {
    let settings = Settings::from_toml_str(
        r#"
        [[attributes]]
        name = "status"
        type = "string"
        scope = ["task"]

        [[attributes]]
        name = "status"
        type = "string"
        scope = ["task", "folder"]
        "#,
    )
    .unwrap();

    let err = settings.build_registry().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Configuration(ConfigurationError::DuplicateAttribute { .. })
    ));
}

#[tokio::test]
async fn task_type_defaults_to_first_by_position() {
    let (manager, ids) = setup_hierarchy().await;
    let task = manager
        .load(PROJECT, EntityType::Task, &ids.task, false)
        .await
        .unwrap();
    assert_eq!(task.task_type(), Some("Generic"));
}

#[tokio::test]
async fn task_type_defaulting_fails_without_task_types() {
    let manager = setup_manager();
    create_project(&manager, &[]).await;
    let folder = create_entity(
        &manager,
        EntityType::Folder,
        json!({"name": "assets", "folder_type": "Sequence"}),
    )
    .await;

    let mut task = manager
        .create(
            PROJECT,
            EntityType::Task,
            &payload(json!({"name": "modeling", "folder_id": folder.id()})),
        )
        .unwrap();
    let err = manager.save(&mut task).await.unwrap_err();
    assert!(matches!(err, CoreError::Defaulting(_)));
    assert!(!task.exists());
}

#[test]
fn anatomy_roots_keyed_by_name() {
    let anatomy = Anatomy {
        roots: vec![
            Root {
                name: "work".into(),
                windows: "W:/work".into(),
                linux: "/mnt/work".into(),
                darwin: "/Volumes/work".into(),
            },
            Root {
                name: "publish".into(),
                windows: "P:/publish".into(),
                linux: "/mnt/publish".into(),
                darwin: "/Volumes/publish".into(),
            },
        ],
        ..Anatomy::default()
    };

    let payload = anatomy_to_project_payload(&anatomy).unwrap();
    let roots = payload["config"]["roots"].as_object().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots["work"]["linux"], "/mnt/work");
    assert_eq!(roots["publish"]["windows"], "P:/publish");
}

#[tokio::test]
async fn folder_type_defaults_too() {
    let manager: EntityManager = setup_manager();
    create_project(&manager, &["Generic"]).await;
    let folder = create_entity(&manager, EntityType::Folder, json!({"name": "assets"})).await;
    assert_eq!(folder.folder_type(), Some("Sequence"));

    let stored = manager
        .store()
        .fetch(PROJECT, EntityType::Folder, folder.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.row.field_str("folder_type"), Some("Sequence"));
}
