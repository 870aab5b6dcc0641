//! Schema generation
//!
//! [`generate`] is a pure function from a field table and the attribute
//! registry to an [`EntityTypeSchema`]. [`SchemaGenerator`] memoizes it per
//! entity type.
//!
//! # Composition
//!
//! ```text
//! full   = identifier + fields + common + project-level + timestamps
//! create = (fields + project-level + common) - dynamic
//! patch  = create, every field optional
//! ```
//!
//! `common` is the attribute bag, auxiliary data, the active flag and
//! `own_attrib`. Only `own_attrib` and fields declared dynamic are excluded
//! from create and patch payloads.

use crate::error::SchemaError;
use crate::field::{
    FieldSpec, FieldType, ENTITY_ID_EXAMPLE, ENTITY_ID_REGEX, NAME_REGEX, USER_NAME_REGEX,
};
use crate::fields::FieldCatalog;
use crate::shape::{AttributeSchema, EntityTypeSchema, SchemaShape, ShapeKind};
use dashmap::DashMap;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use strata_attrib::{AttributeRegistry, EntityType, ValueType};

/// Name of the field listing explicitly set attributes
pub const OWN_ATTRIB: &str = "own_attrib";

/// Generate the schemas of an entity type
///
/// Deterministic: equal inputs produce structurally equal output.
///
/// # Errors
/// `DuplicateField` if the composed full field list contains a name twice.
/// Collisions are reported, never silently dropped.
pub fn generate(
    entity_type: EntityType,
    fields: &[FieldSpec],
    registry: &AttributeRegistry,
) -> Result<EntityTypeSchema, SchemaError> {
    let title = entity_type.title();
    let attrib = AttributeSchema {
        title: format!("{title}AttribModel"),
        attributes: registry.list(entity_type).cloned().collect(),
    };

    let common = common_fields(entity_type);
    let project_level = project_level_fields(entity_type);

    let mut full_fields = vec![identifier_field(entity_type)];
    full_fields.extend(fields.iter().cloned());
    full_fields.extend(common.iter().cloned());
    full_fields.extend(project_level.iter().cloned());
    full_fields.extend(timestamp_fields());
    ensure_unique(entity_type, &full_fields)?;

    let writable: Vec<FieldSpec> = fields
        .iter()
        .chain(project_level.iter())
        .chain(common.iter())
        .filter(|f| !f.dynamic)
        .cloned()
        .collect();

    let patch_fields = writable.iter().cloned().map(FieldSpec::optional).collect();

    let mut dynamic_fields: Vec<String> = fields
        .iter()
        .filter(|f| f.dynamic)
        .map(|f| f.name.clone())
        .collect();
    dynamic_fields.push(OWN_ATTRIB.to_string());

    Ok(EntityTypeSchema {
        entity_type,
        full: SchemaShape {
            kind: ShapeKind::Full,
            title: format!("{title}Model"),
            fields: full_fields,
        },
        create: SchemaShape {
            kind: ShapeKind::Create,
            title: format!("{title}PostModel"),
            fields: writable,
        },
        patch: SchemaShape {
            kind: ShapeKind::Patch,
            title: format!("{title}PatchModel"),
            fields: patch_fields,
        },
        attrib,
        dynamic_fields,
    })
}

fn ensure_unique(entity_type: EntityType, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                entity_type,
                name: field.name.clone(),
            });
        }
    }
    Ok(())
}

fn identifier_field(entity_type: EntityType) -> FieldSpec {
    let title = entity_type.title();
    if entity_type.has_surrogate_id() {
        FieldSpec::value("id", ValueType::String)
            .with_regex(ENTITY_ID_REGEX)
            .with_title(format!("{title} ID"))
            .with_description(format!("Unique identifier of the {entity_type}"))
            .with_example(json!(ENTITY_ID_EXAMPLE))
    } else {
        let regex = if entity_type == EntityType::User {
            USER_NAME_REGEX
        } else {
            NAME_REGEX
        };
        FieldSpec::value("name", ValueType::String)
            .required()
            .with_regex(regex)
            .with_title(format!("{title} name"))
            .with_description(format!("Name is an unique id of the {entity_type}"))
            .with_example(json!(format!("awesome_{entity_type}")))
    }
}

fn common_fields(entity_type: EntityType) -> Vec<FieldSpec> {
    let title = entity_type.title();
    vec![
        FieldSpec::new("attrib", FieldType::Attributes).with_title(format!("{title} attributes")),
        FieldSpec::value("data", ValueType::Mapping)
            .with_default(json!({}))
            .with_title(format!("{title} auxiliary data")),
        FieldSpec::value("active", ValueType::Boolean)
            .with_default(json!(true))
            .with_title(format!("{title} active"))
            .with_description(format!("Whether the {entity_type} is active")),
        FieldSpec::value(OWN_ATTRIB, ValueType::ListOfStrings)
            .dynamic()
            .with_title("Own attributes")
            .with_example(json!(["frameStart", "frameEnd"])),
    ]
}

fn project_level_fields(entity_type: EntityType) -> Vec<FieldSpec> {
    if !entity_type.is_project_level() {
        return Vec::new();
    }
    let title = entity_type.title();
    vec![
        // filled from the project's first status on save when absent
        FieldSpec::value("status", ValueType::String)
            .with_title(format!("{title} status"))
            .with_description(format!("Status of the {entity_type}"))
            .with_example(json!("In progress")),
        FieldSpec::value("tags", ValueType::ListOfStrings)
            .with_default(json!([]))
            .with_title(format!("{title} tags"))
            .with_description(format!("Tags assigned to the {entity_type}"))
            .with_example(json!(["flabadob", "blip"])),
    ]
}

fn timestamp_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::value("created_at", ValueType::Datetime)
            .with_title("Created at")
            .with_description("Time of creation")
            .with_example(json!("2023-01-01T00:00:00+00:00")),
        FieldSpec::value("updated_at", ValueType::Datetime)
            .with_title("Updated at")
            .with_description("Time of last update")
            .with_example(json!("2023-01-01T00:00:00+00:00")),
    ]
}

/// Per-entity-type schema cache
///
/// Holds the explicit configuration (registry and field catalog) and the
/// generated schemas. Concurrent first use of an entity type may generate
/// twice; the first inserted result wins and both are structurally equal, so
/// no lock is held during generation.
#[derive(Debug)]
pub struct SchemaGenerator {
    registry: Arc<AttributeRegistry>,
    catalog: FieldCatalog,
    cache: DashMap<EntityType, Arc<EntityTypeSchema>>,
}

impl SchemaGenerator {
    /// Create generator with the standard field catalog
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<AttributeRegistry>) -> Self {
        Self::with_catalog(registry, FieldCatalog::standard())
    }

    /// Create generator with a custom field catalog
    #[must_use]
    pub fn with_catalog(registry: Arc<AttributeRegistry>, catalog: FieldCatalog) -> Self {
        Self {
            registry,
            catalog,
            cache: DashMap::new(),
        }
    }

    /// Schema of an entity type, generated on first use
    ///
    /// # Errors
    /// Propagates [`generate`] errors; failures are not cached.
    pub fn schema(&self, entity_type: EntityType) -> Result<Arc<EntityTypeSchema>, SchemaError> {
        if let Some(hit) = self.cache.get(&entity_type) {
            return Ok(Arc::clone(hit.value()));
        }

        tracing::debug!("Generating schema for {}", entity_type);
        let generated = generate(entity_type, self.catalog.fields(entity_type), &self.registry)?;

        let entry = self
            .cache
            .entry(entity_type)
            .or_insert_with(|| Arc::new(generated));
        Ok(Arc::clone(entry.value()))
    }

    /// Attribute registry the generator was built with
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<AttributeRegistry> {
        &self.registry
    }

    /// Number of cached schemas
    #[inline]
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::standard_fields;
    use pretty_assertions::assert_eq;
    use strata_attrib::AttributeDefinition;

    fn registry() -> Arc<AttributeRegistry> {
        Arc::new(AttributeRegistry::with_builtins().unwrap())
    }

    fn task_schema() -> EntityTypeSchema {
        generate(EntityType::Task, &standard_fields(EntityType::Task), &registry()).unwrap()
    }

    #[test]
    fn full_shape_order() {
        let schema = task_schema();
        assert_eq!(
            schema.full.field_names(),
            vec![
                "id", "name", "label", "task_type", "assignees", "folder_id", "thumbnail_id",
                "attrib", "data", "active", "own_attrib", "status", "tags", "created_at",
                "updated_at",
            ]
        );
    }

    #[test]
    fn create_shape_excludes_identifier_and_dynamic() {
        let schema = task_schema();
        let names = schema.create.field_names();
        assert!(!names.contains(&"id"));
        assert!(!names.contains(&"own_attrib"));
        assert!(!names.contains(&"created_at"));
        assert!(names.contains(&"attrib"));
        assert!(schema.create.field("folder_id").unwrap().required);
    }

    #[test]
    fn declared_dynamic_field_is_excluded() {
        let registry = registry();
        let schema =
            generate(EntityType::Folder, &standard_fields(EntityType::Folder), &registry).unwrap();
        assert!(schema.full.field("path").is_some());
        assert!(schema.create.field("path").is_none());
        assert!(schema.patch.field("path").is_none());
        assert_eq!(schema.dynamic_fields, vec!["path", "own_attrib"]);
    }

    #[test]
    fn patch_shape_is_all_optional() {
        let schema = task_schema();
        assert_eq!(schema.patch.field_names(), schema.create.field_names());
        assert!(schema.patch.fields.iter().all(|f| !f.required));
        assert!(schema.create.fields.iter().any(|f| f.required));
    }

    #[test]
    fn project_uses_natural_key_without_status() {
        let registry = registry();
        let schema =
            generate(EntityType::Project, &standard_fields(EntityType::Project), &registry)
                .unwrap();
        assert_eq!(schema.identifier(), "name");
        assert_eq!(schema.full.fields[0].name, "name");
        assert!(schema.full.field("status").is_none());
    }

    #[test]
    fn attribute_subschema_is_scoped() {
        let schema = task_schema();
        assert!(schema.attrib.contains("frameStart"));
        assert!(!schema.attrib.contains("email"));
        assert_eq!(schema.attrib.title, "TaskAttribModel");
    }

    #[test]
    fn duplicate_field_is_reported() {
        let fields = vec![FieldSpec::value("active", ValueType::Boolean)];
        let err = generate(EntityType::Task, &fields, &registry()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                entity_type: EntityType::Task,
                name: "active".to_string(),
            }
        );
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(task_schema(), task_schema());
    }

    #[test]
    fn generator_caches_first_result() {
        let generator = SchemaGenerator::new(registry());
        let a = generator.schema(EntityType::Version).unwrap();
        let b = generator.schema(EntityType::Version).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(generator.cached_count(), 1);
    }

    #[test]
    fn attribute_order_follows_registration() {
        let mut registry = AttributeRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register_for(EntityType::Subset, AttributeDefinition::new(name, ValueType::String))
                .unwrap();
        }
        let schema =
            generate(EntityType::Subset, &standard_fields(EntityType::Subset), &registry).unwrap();
        assert_eq!(schema.attrib.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn concurrent_first_use_yields_equal_schemas() {
        let generator = Arc::new(SchemaGenerator::new(registry()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                tokio::spawn(async move { generator.schema(EntityType::Task).unwrap() })
            })
            .collect();

        let mut schemas = Vec::new();
        for handle in handles {
            schemas.push(handle.await.unwrap());
        }
        for schema in &schemas[1..] {
            assert_eq!(**schema, *schemas[0]);
        }
        assert_eq!(generator.cached_count(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn registry_with(entity_type: EntityType, extra: &[String]) -> AttributeRegistry {
            let mut registry = AttributeRegistry::with_builtins().unwrap();
            for name in extra {
                registry
                    .register_for(entity_type, AttributeDefinition::new(name, ValueType::String))
                    .unwrap();
            }
            registry
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn generation_is_deterministic_for_any_registry(
                index in 0..EntityType::ALL.len(),
                extra in proptest::collection::btree_set("x_[a-z0-9]{1,8}", 0..6),
            ) {
                let entity_type = EntityType::ALL[index];
                let extra: Vec<String> = extra.into_iter().collect();
                let registry = registry_with(entity_type, &extra);
                let fields = standard_fields(entity_type);

                let first = generate(entity_type, &fields, &registry).unwrap();
                let second = generate(entity_type, &fields, &registry).unwrap();
                prop_assert_eq!(&first, &second);

                let names = first.attrib.names();
                prop_assert!(names.ends_with(&extra.iter().map(String::as_str).collect::<Vec<_>>()));
                prop_assert!(first.patch.fields.iter().all(|f| !f.required));
                prop_assert!(first.create.field(first.identifier()).is_none());
            }
        }
    }
}

