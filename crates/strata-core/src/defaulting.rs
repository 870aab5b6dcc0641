//! Type-specific defaulting applied before save

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use strata_attrib::EntityType;
use strata_store::{Category, EntityStore};

/// Categorical field an entity type defaults, with its category table
#[must_use]
pub fn categorical_field(entity_type: EntityType) -> Option<(&'static str, Category)> {
    match entity_type {
        EntityType::Task => Some(("task_type", Category::TaskType)),
        EntityType::Folder => Some(("folder_type", Category::FolderType)),
        _ => None,
    }
}

/// Fill an unset categorical field with the project's first entry by
/// position
///
/// # Errors
/// `Defaulting` when the project has no entries for the category.
pub async fn apply_categorical_default(store: &dyn EntityStore, entity: &mut Entity) -> CoreResult<()> {
    let Some((field, category)) = categorical_field(entity.entity_type) else {
        return Ok(());
    };
    if entity.field(field).is_some() {
        return Ok(());
    }

    let first = store
        .categories(&entity.project, category)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            CoreError::Defaulting(format!(
                "no {} defined for project '{}'",
                category.project_field().replace('_', " "),
                entity.project
            ))
        })?;

    tracing::debug!(field, value = %first.name, "categorical default applied");
    entity.fields.insert(field.to_string(), Value::String(first.name));
    Ok(())
}

/// Fill an unset `status` of a project-level entity with the project's
/// first status
///
/// Projects without statuses leave the field unset.
///
/// # Errors
/// Store errors.
pub async fn apply_status_default(store: &dyn EntityStore, entity: &mut Entity) -> CoreResult<()> {
    if !entity.entity_type.is_project_level() || entity.field("status").is_some() {
        return Ok(());
    }
    if let Some(first) = store
        .categories(&entity.project, Category::Status)
        .await?
        .into_iter()
        .next()
    {
        entity.fields.insert("status".to_string(), Value::String(first.name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tasks_and_folders_default() {
        assert_eq!(
            categorical_field(EntityType::Task),
            Some(("task_type", Category::TaskType))
        );
        assert_eq!(
            categorical_field(EntityType::Folder),
            Some(("folder_type", Category::FolderType))
        );
        assert_eq!(categorical_field(EntityType::Version), None);
    }
}
