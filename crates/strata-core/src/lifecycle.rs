//! Entity lifecycle manager
//!
//! Orchestrates `create`, `load`, `save`, `patch` and `delete` for projects
//! and project-level entities on top of the schema generator, the resolver
//! and a storage backend.
//!
//! Only the owned attribute subset is ever written. Closure refresh after
//! structural changes is left to the caller, through [`EntityManager::closures`].

use crate::config::{CacheSettings, Settings};
use crate::defaulting::{apply_categorical_default, apply_status_default};
use crate::entity::{Entity, EntityState};
use crate::error::{CoreError, CoreResult};
use crate::resolver::{resolve, InheritanceResolver};
use chrono::Utc;
use schemars::schema::RootSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use strata_attrib::{AttributeRegistry, EntityType};
use strata_schema::{
    is_entity_id, EntityTypeSchema, FieldViolation, SchemaGenerator, ShapeKind, ValidationError,
};
use strata_store::{Category, CategoryEntry, ClosureCache, ClosureReader, EntityRow, EntityStore};

/// Machine-readable schemas of one entity type
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDocuments {
    /// Read shape
    pub full: RootSchema,
    /// Create payload shape
    pub create: RootSchema,
    /// Partial update shape
    pub patch: RootSchema,
}

/// Entity lifecycle manager
#[derive(Debug)]
pub struct EntityManager {
    generator: SchemaGenerator,
    store: Arc<dyn EntityStore>,
    closures: Arc<ClosureCache>,
    resolver: InheritanceResolver,
}

impl EntityManager {
    /// Create new manager with a default-sized closure cache
    #[must_use]
    pub fn new(registry: Arc<AttributeRegistry>, store: Arc<dyn EntityStore>) -> Self {
        let capacity = CacheSettings::default().capacity;
        let closures = ClosureCache::new(Arc::clone(&store), Arc::clone(&registry), capacity);
        Self::with_closures(registry, store, closures)
    }

    /// Create with an explicit closure cache
    #[must_use]
    pub fn with_closures(
        registry: Arc<AttributeRegistry>,
        store: Arc<dyn EntityStore>,
        closures: ClosureCache,
    ) -> Self {
        let closures = Arc::new(closures);
        let reader: Arc<dyn ClosureReader> = closures.clone();
        Self {
            generator: SchemaGenerator::new(Arc::clone(&registry)),
            resolver: InheritanceResolver::new(registry, reader),
            store,
            closures,
        }
    }

    /// Build registry and closure cache from settings
    ///
    /// # Errors
    /// `Configuration` from the attribute definitions.
    pub fn from_settings(settings: &Settings, store: Arc<dyn EntityStore>) -> CoreResult<Self> {
        let registry = settings.build_registry()?;
        let cache = &settings.closure_cache;
        let closures = match cache.ttl() {
            Some(ttl) => ClosureCache::with_ttl(
                Arc::clone(&store),
                Arc::clone(&registry),
                cache.capacity,
                ttl,
            ),
            None => ClosureCache::new(Arc::clone(&store), Arc::clone(&registry), cache.capacity),
        };
        Ok(Self::with_closures(registry, store, closures))
    }

    /// Attribute registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<AttributeRegistry> {
        self.generator.registry()
    }

    /// Schema generator
    #[inline]
    #[must_use]
    pub fn generator(&self) -> &SchemaGenerator {
        &self.generator
    }

    /// Storage backend
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Closure store, for structural-change refreshes
    #[inline]
    #[must_use]
    pub fn closures(&self) -> &Arc<ClosureCache> {
        &self.closures
    }

    fn managed_schema(&self, entity_type: EntityType) -> CoreResult<Arc<EntityTypeSchema>> {
        if entity_type == EntityType::User {
            return Err(CoreError::Unsupported(entity_type));
        }
        Ok(self.generator.schema(entity_type)?)
    }

    /// Full, create and patch JSON schemas of an entity type
    ///
    /// # Errors
    /// `Schema` if the field table is invalid.
    pub fn schema(&self, entity_type: EntityType) -> CoreResult<SchemaDocuments> {
        let schema = self.generator.schema(entity_type)?;
        Ok(SchemaDocuments {
            full: schema.json_schema(ShapeKind::Full),
            create: schema.json_schema(ShapeKind::Create),
            patch: schema.json_schema(ShapeKind::Patch),
        })
    }

    /// Construct a new, unsaved entity from a create payload
    ///
    /// Projects take `project` as their name. Other types get a fresh id.
    /// Inherited values appear after the entity is saved and loaded again.
    ///
    /// # Errors
    /// `Validation` if the payload does not fit the create shape.
    pub fn create(
        &self,
        project: &str,
        entity_type: EntityType,
        payload: &Map<String, Value>,
    ) -> CoreResult<Entity> {
        let schema = self.managed_schema(entity_type)?;
        schema.validate(ShapeKind::Create, payload)?;

        let mut fields = Map::new();
        let mut own = Map::new();
        for (name, value) in payload {
            if name == "attrib" {
                if let Some(attrib) = value.as_object() {
                    own.extend(
                        attrib
                            .iter()
                            .filter(|(_, v)| !v.is_null())
                            .map(|(k, v)| (k.clone(), v.clone())),
                    );
                }
            } else {
                fields.insert(name.clone(), value.clone());
            }
        }
        for field in &schema.create.fields {
            if let Some(default) = &field.default {
                if field.name != "attrib" && !fields.contains_key(&field.name) {
                    fields.insert(field.name.clone(), default.clone());
                }
            }
        }

        let key = if entity_type.has_surrogate_id() {
            uuid::Uuid::new_v4().simple().to_string()
        } else {
            project.to_string()
        };
        let now = Utc::now();

        Ok(Entity {
            entity_type,
            project: project.to_string(),
            key,
            fields,
            attrib: resolve(self.registry(), entity_type, &own, None),
            created_at: now,
            updated_at: now,
            state: EntityState::Unloaded,
            exists: false,
            lock: None,
            warning: None,
        })
    }

    /// Load an entity with its effective attributes
    ///
    /// With `for_update` the row lock is taken before reading and held by the
    /// returned entity until it is dropped or released.
    ///
    /// # Errors
    /// - `Validation` for a malformed id, before touching the store
    /// - `NotFound` for a missing project or entity
    pub async fn load(
        &self,
        project: &str,
        entity_type: EntityType,
        id: &str,
        for_update: bool,
    ) -> CoreResult<Entity> {
        self.managed_schema(entity_type)?;
        if entity_type.has_surrogate_id() && !is_entity_id(id) {
            return Err(ValidationError {
                entity_type,
                shape: ShapeKind::Full,
                violations: vec![FieldViolation::new("id", format!("invalid {entity_type} id"))],
            }
            .into());
        }

        let lock = if for_update {
            Some(self.store.lock_row(project, entity_type, id).await?)
        } else {
            None
        };
        let fetched = self
            .store
            .fetch(project, entity_type, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("{entity_type} '{id}'")))?;

        let (attrib, warning) = self.resolver.resolve_row(project, &fetched).await;
        let row = fetched.row;
        tracing::debug!(project, %entity_type, id, "entity loaded");

        Ok(Entity {
            entity_type,
            project: project.to_string(),
            key: row.key,
            fields: row.fields,
            attrib,
            created_at: row.created_at,
            updated_at: row.updated_at,
            state: EntityState::Loaded,
            exists: true,
            lock,
            warning,
        })
    }

    /// Load a project by name
    ///
    /// # Errors
    /// `NotFound` if the project does not exist.
    pub async fn load_project(&self, name: &str) -> CoreResult<Entity> {
        self.load(name, EntityType::Project, name, false).await
    }

    /// Persist an entity
    ///
    /// Applies categorical and status defaults, validates against the create shape and
    /// writes the natural fields plus the owned attributes only. Saving a
    /// project also rewrites its category tables.
    ///
    /// # Errors
    /// `Defaulting`, `Validation`, `NotFound` for a missing project, or a
    /// store error.
    pub async fn save(&self, entity: &mut Entity) -> CoreResult<()> {
        let schema = self.managed_schema(entity.entity_type)?;
        apply_categorical_default(self.store.as_ref(), entity).await?;
        apply_status_default(self.store.as_ref(), entity).await?;

        let mut fields: Map<String, Value> = entity
            .fields
            .iter()
            .filter(|(name, _)| name.as_str() != "attrib" && schema.create.field(name).is_some())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let own = entity.attrib.own_values();

        fields.insert("attrib".to_string(), Value::Object(own.clone()));
        schema.validate(ShapeKind::Create, &fields)?;
        fields.remove("attrib");

        let now = Utc::now();
        let row = EntityRow {
            entity_type: entity.entity_type,
            key: entity.key.clone(),
            fields,
            attrib: own,
            created_at: entity.created_at,
            updated_at: now,
        };

        if entity.exists {
            self.store.update(&entity.project, row).await?;
        } else {
            self.store.insert(&entity.project, row).await?;
        }
        if entity.entity_type == EntityType::Project {
            self.sync_categories(entity).await?;
        }

        entity.updated_at = now;
        entity.exists = true;
        entity.state = EntityState::Persisted;
        tracing::info!(
            project = %entity.project,
            entity_type = %entity.entity_type,
            id = %entity.key,
            "entity saved"
        );
        Ok(())
    }

    async fn sync_categories(&self, project: &Entity) -> CoreResult<()> {
        for category in Category::ALL {
            let entries = project
                .field(category.project_field())
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .filter_map(|item| {
                            let name = item.get("name")?.as_str()?.to_string();
                            let mut data = item.clone();
                            data.remove("name");
                            Some((name, data))
                        })
                        .zip(0_i64..)
                        .map(|((name, data), position)| CategoryEntry {
                            name,
                            position,
                            data,
                        })
                        .collect()
                })
                .unwrap_or_default();
            self.store
                .set_categories(&project.project, category, entries)
                .await?;
        }
        Ok(())
    }

    /// Apply a partial update in memory
    ///
    /// Absent keys are left unchanged. A `null` natural field clears it. In
    /// `attrib`, a value pins the attribute as own (even when equal to the
    /// inherited value) and `null` resets it to the inherited value; a
    /// `null` attrib resets every own attribute. An empty document changes
    /// nothing.
    ///
    /// # Errors
    /// `Validation` if the document does not fit the patch shape.
    pub fn patch(&self, entity: &mut Entity, partial: &Map<String, Value>) -> CoreResult<()> {
        if partial.is_empty() {
            return Ok(());
        }
        let schema = self.managed_schema(entity.entity_type)?;
        schema.validate(ShapeKind::Patch, partial)?;

        let attrib = match partial.get("attrib") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::Object(attrib)) => Some(Some(attrib)),
            Some(_) => {
                return Err(ValidationError {
                    entity_type: entity.entity_type,
                    shape: ShapeKind::Patch,
                    violations: vec![FieldViolation::new("attrib", "expected mapping or null")],
                }
                .into())
            }
        };

        for (name, value) in partial.iter().filter(|(name, _)| *name != "attrib") {
            entity.fields.insert(name.clone(), value.clone());
        }
        match attrib {
            Some(Some(attrib)) => {
                for (attribute, value) in attrib {
                    if value.is_null() {
                        entity.attrib.reset(attribute);
                    } else {
                        entity.attrib.set(attribute, value.clone());
                    }
                }
            }
            Some(None) => {
                let owned: Vec<String> = entity.attrib.own().iter().cloned().collect();
                for attribute in owned {
                    entity.attrib.reset(&attribute);
                }
            }
            None => {}
        }

        entity.state = EntityState::Modified;
        Ok(())
    }

    /// Remove an entity's stored row
    ///
    /// Returns whether a row was removed. Closures are not refreshed here;
    /// deleting a project also drops its cached closures.
    ///
    /// # Errors
    /// Store errors.
    pub async fn delete(&self, entity: Entity) -> CoreResult<bool> {
        if !entity.exists {
            return Ok(false);
        }
        let removed = self
            .store
            .delete(&entity.project, entity.entity_type, &entity.key)
            .await?;
        if entity.entity_type == EntityType::Project {
            self.closures.invalidate_project(&entity.project).await;
        }
        tracing::info!(
            project = %entity.project,
            entity_type = %entity.entity_type,
            id = %entity.key,
            removed,
            "entity deleted"
        );
        Ok(removed)
    }
}
