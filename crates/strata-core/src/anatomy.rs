//! Project anatomy templates
//!
//! An [`Anatomy`] describes how a new project is set up: storage roots,
//! path templates, attribute values and the category lists. The transform
//! to a project payload is one-way; nothing maps a project back to a
//! template.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::lifecycle::EntityManager;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use strata_attrib::{AttributeRegistry, EntityType};
use strata_schema::{FieldViolation, ShapeKind, ValidationError};

/// Items identified by a unique name within their list
pub trait Named {
    /// Item name
    fn name(&self) -> &str;
}

macro_rules! named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

/// Storage root with per-platform paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Root {
    /// Root name, referenced from templates as `{root[name]}`
    pub name: String,
    /// Windows path
    #[serde(default)]
    pub windows: String,
    /// Linux path
    #[serde(default)]
    pub linux: String,
    /// macOS path
    #[serde(default)]
    pub darwin: String,
}

/// Named path template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    /// Template name
    pub name: String,
    /// Remaining keys (`directory`, `file`, ...)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Path template configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Templates {
    /// Zero padding of version numbers
    pub version_padding: u32,
    /// Version token format
    pub version: String,
    /// Zero padding of frame numbers
    pub frame_padding: u32,
    /// Frame token format
    pub frame: String,
    /// Work file templates
    pub work: Vec<Template>,
    /// Publish templates
    pub publish: Vec<Template>,
    /// Hero version templates
    pub hero: Vec<Template>,
    /// Delivery templates
    pub delivery: Vec<Template>,
    /// Other templates
    pub others: Vec<Template>,
}

fn template(name: &str, properties: Value) -> Template {
    Template {
        name: name.to_string(),
        properties: properties.as_object().cloned().unwrap_or_default(),
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            version_padding: 3,
            version: "v{version:0>{@version_padding}}".to_string(),
            frame_padding: 4,
            frame: "{frame:0>{@frame_padding}}".to_string(),
            work: vec![template(
                "default",
                json!({
                    "directory": "{root[work]}/{project[name]}/{hierarchy}/{folder[name]}/work/{task[name]}",
                    "file": "{project[code]}_{folder[name]}_{task[name]}_{@version}<_{comment}>.{ext}",
                }),
            )],
            publish: vec![template(
                "default",
                json!({
                    "directory": "{root[work]}/{project[name]}/{hierarchy}/{folder[name]}/publish/{family}/{subset}/{@version}",
                    "file": "{project[code]}_{folder[name]}_{subset}_{@version}<.{@frame}><_{udim}>.{ext}",
                }),
            )],
            hero: vec![template(
                "default",
                json!({
                    "directory": "{root[work]}/{project[name]}/{hierarchy}/{folder[name]}/publish/{family}/{subset}/hero",
                    "file": "{project[code]}_{folder[name]}_{subset}_hero<.{@frame}><_{udim}>.{ext}",
                }),
            )],
            delivery: Vec::new(),
            others: Vec::new(),
        }
    }
}

impl Templates {
    fn groups(&self) -> [(&'static str, &[Template]); 5] {
        [
            ("work", self.work.as_slice()),
            ("publish", self.publish.as_slice()),
            ("hero", self.hero.as_slice()),
            ("delivery", self.delivery.as_slice()),
            ("others", self.others.as_slice()),
        ]
    }

    /// Template configuration as stored on the project
    ///
    /// The scalar settings go under `common`; each non-empty group maps
    /// template names to their remaining properties.
    #[must_use]
    pub fn to_config(&self) -> Value {
        let mut config = Map::new();
        config.insert(
            "common".to_string(),
            json!({
                "version_padding": self.version_padding,
                "version": self.version,
                "frame_padding": self.frame_padding,
                "frame": self.frame,
            }),
        );
        for (group, templates) in self.groups() {
            if templates.is_empty() {
                continue;
            }
            let named: Map<String, Value> = templates
                .iter()
                .map(|t| (t.name.clone(), Value::Object(t.properties.clone())))
                .collect();
            config.insert(group.to_string(), Value::Object(named));
        }
        Value::Object(config)
    }
}

/// Folder type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FolderType {
    /// Name
    pub name: String,
    /// Abbreviation
    #[serde(default, alias = "shortName")]
    pub short_name: String,
    /// Icon name
    #[serde(default)]
    pub icon: String,
}

/// Task type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaskType {
    /// Name
    pub name: String,
    /// Abbreviation
    #[serde(default, alias = "shortName")]
    pub short_name: String,
    /// Icon name
    #[serde(default)]
    pub icon: String,
}

/// Link type between entity types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LinkType {
    /// Link type name
    pub link_type: String,
    /// Source entity type name
    pub input_type: String,
    /// Target entity type name
    pub output_type: String,
    /// Display color
    #[serde(default)]
    pub color: String,
    /// Line style
    #[serde(default = "default_link_style")]
    pub style: String,
}

fn default_link_style() -> String {
    "solid".to_string()
}

/// Workflow state a status belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    /// Not started
    NotStarted,
    /// In progress
    InProgress,
    /// Done
    Done,
    /// Blocked
    Blocked,
}

/// Status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Status {
    /// Name
    pub name: String,
    /// Abbreviation
    #[serde(default, alias = "shortName")]
    pub short_name: String,
    /// Workflow state
    #[serde(default = "default_status_state")]
    pub state: StatusState,
    /// Icon name
    #[serde(default)]
    pub icon: String,
    /// Display color
    #[serde(default)]
    pub color: String,
}

fn default_status_state() -> StatusState {
    StatusState::NotStarted
}

/// Tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tag {
    /// Name
    pub name: String,
    /// Display color
    #[serde(default)]
    pub color: String,
}

named!(Root, FolderType, TaskType, Status, Tag);

/// Project template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Anatomy {
    /// Storage roots
    pub roots: Vec<Root>,
    /// Path templates
    pub templates: Templates,
    /// Project attribute values
    pub attributes: Map<String, Value>,
    /// Folder types, in default order
    pub folder_types: Vec<FolderType>,
    /// Task types, in default order
    pub task_types: Vec<TaskType>,
    /// Link types
    pub link_types: Vec<LinkType>,
    /// Statuses
    pub statuses: Vec<Status>,
    /// Tags
    pub tags: Vec<Tag>,
}

fn folder_type(name: &str, short_name: &str, icon: &str) -> FolderType {
    FolderType {
        name: name.to_string(),
        short_name: short_name.to_string(),
        icon: icon.to_string(),
    }
}

fn task_type(name: &str, short_name: &str, icon: &str) -> TaskType {
    TaskType {
        name: name.to_string(),
        short_name: short_name.to_string(),
        icon: icon.to_string(),
    }
}

fn status(name: &str, short_name: &str, state: StatusState, color: &str) -> Status {
    Status {
        name: name.to_string(),
        short_name: short_name.to_string(),
        state,
        icon: String::new(),
        color: color.to_string(),
    }
}

fn link_type(link_type: &str, input_type: EntityType, output_type: EntityType) -> LinkType {
    LinkType {
        link_type: link_type.to_string(),
        input_type: input_type.to_string(),
        output_type: output_type.to_string(),
        color: String::new(),
        style: default_link_style(),
    }
}

impl Default for Anatomy {
    fn default() -> Self {
        Self {
            roots: vec![Root {
                name: "work".to_string(),
                windows: "C:/projects".to_string(),
                linux: "/mnt/share/projects".to_string(),
                darwin: "/Volumes/projects".to_string(),
            }],
            templates: Templates::default(),
            attributes: Map::new(),
            folder_types: vec![
                folder_type("Folder", "", "folder"),
                folder_type("Library", "lib", "category"),
                folder_type("Asset", "", "smart_toy"),
                folder_type("Episode", "ep", "live_tv"),
                folder_type("Sequence", "sq", "theaters"),
                folder_type("Shot", "sh", "movie"),
            ],
            task_types: vec![
                task_type("Generic", "gener", "task_alt"),
                task_type("Art", "art", "palette"),
                task_type("Modeling", "mdl", "language"),
                task_type("Texture", "tex", "brush"),
                task_type("Lookdev", "look", "ev_shadow"),
                task_type("Rigging", "rig", "construction"),
                task_type("Edit", "edit", "imagesearch_roller"),
                task_type("Layout", "lay", "nature_people"),
                task_type("Animation", "anim", "directions_run"),
                task_type("FX", "fx", "fireplace"),
                task_type("Lighting", "lgt", "highlight"),
                task_type("Compositing", "comp", "layers"),
            ],
            link_types: vec![
                link_type("generative", EntityType::Version, EntityType::Version),
                link_type("breakdown", EntityType::Folder, EntityType::Folder),
                link_type("reference", EntityType::Version, EntityType::Version),
            ],
            statuses: vec![
                status("Not ready", "NRD", StatusState::NotStarted, "#3d444f"),
                status("Ready to start", "RDY", StatusState::NotStarted, "#bababa"),
                status("In progress", "PRG", StatusState::InProgress, "#3498db"),
                status("Pending review", "RVW", StatusState::InProgress, "#ff9b0a"),
                status("Approved", "APP", StatusState::Done, "#00f0b4"),
                status("On hold", "HLD", StatusState::Blocked, "#fa6e46"),
                status("Omitted", "OMT", StatusState::Blocked, "#cb1a1a"),
            ],
            tags: Vec::new(),
        }
    }
}

/// Check that no two items share a name
///
/// # Errors
/// A violation on `field_name` naming the first duplicate.
pub fn ensure_unique_names<T: Named>(items: &[T], field_name: &str) -> Result<(), FieldViolation> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.name()) {
            return Err(FieldViolation::new(
                field_name,
                format!("duplicate name '{}'", item.name()),
            ));
        }
    }
    Ok(())
}

impl Anatomy {
    /// Parse YAML, missing keys defaulted
    ///
    /// # Errors
    /// `Settings` on malformed input.
    pub fn from_yaml_str(text: &str) -> CoreResult<Self> {
        serde_yaml::from_str(text).map_err(|e| CoreError::Settings(e.to_string()))
    }

    /// Parse JSON, missing keys defaulted
    ///
    /// # Errors
    /// `Settings` on malformed input.
    pub fn from_json_str(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::Settings(e.to_string()))
    }

    /// Check name uniqueness of roots, folder types, task types, statuses
    /// and tags
    ///
    /// # Errors
    /// `ValidationError` listing each list with a duplicate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ensure_unique_names(&self.roots, "roots"),
            ensure_unique_names(&self.folder_types, "folder_types"),
            ensure_unique_names(&self.task_types, "task_types"),
            ensure_unique_names(&self.statuses, "statuses"),
            ensure_unique_names(&self.tags, "tags"),
        ];
        let violations: Vec<FieldViolation> = checks.into_iter().filter_map(Result::err).collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                entity_type: EntityType::Project,
                shape: ShapeKind::Create,
                violations,
            })
        }
    }

    /// Fill unset project attributes with their registered defaults
    #[must_use]
    pub fn with_attribute_defaults(mut self, registry: &AttributeRegistry) -> Self {
        for definition in registry.list(EntityType::Project) {
            if let Some(default) = &definition.default {
                self.attributes
                    .entry(definition.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        self
    }
}

fn to_values<T: Serialize>(items: &[T]) -> CoreResult<Value> {
    serde_json::to_value(items).map_err(|e| CoreError::Settings(e.to_string()))
}

/// Initial project payload for an anatomy
///
/// Produces the category lists, the project attributes and a `config`
/// holding `roots` (keyed by root name) and `templates`.
///
/// # Errors
/// `Settings` if a template value cannot be serialized.
pub fn anatomy_to_project_payload(anatomy: &Anatomy) -> CoreResult<Map<String, Value>> {
    let roots: Map<String, Value> = anatomy
        .roots
        .iter()
        .map(|root| {
            (
                root.name.clone(),
                json!({
                    "windows": root.windows,
                    "linux": root.linux,
                    "darwin": root.darwin,
                }),
            )
        })
        .collect();

    let mut payload = Map::new();
    payload.insert("task_types".to_string(), to_values(&anatomy.task_types)?);
    payload.insert("folder_types".to_string(), to_values(&anatomy.folder_types)?);
    payload.insert("link_types".to_string(), to_values(&anatomy.link_types)?);
    payload.insert("statuses".to_string(), to_values(&anatomy.statuses)?);
    payload.insert("tags".to_string(), to_values(&anatomy.tags)?);
    payload.insert("attrib".to_string(), Value::Object(anatomy.attributes.clone()));
    payload.insert(
        "config".to_string(),
        json!({
            "roots": roots,
            "templates": anatomy.templates.to_config(),
        }),
    );
    Ok(payload)
}

/// Create and save a project from an anatomy
///
/// Unset project attributes take their registered defaults.
///
/// # Errors
/// `Validation` for duplicate names or an invalid payload, and store errors
/// (a `Conflict` if the project exists).
pub async fn create_project_from_anatomy(
    manager: &EntityManager,
    name: &str,
    code: &str,
    anatomy: Anatomy,
    library: bool,
) -> CoreResult<Entity> {
    anatomy.validate()?;
    let anatomy = anatomy.with_attribute_defaults(manager.registry());

    let mut payload = anatomy_to_project_payload(&anatomy)?;
    payload.insert("code".to_string(), Value::String(code.to_string()));
    payload.insert("library".to_string(), Value::Bool(library));

    let mut project = manager.create(name, EntityType::Project, &payload)?;
    manager.save(&mut project).await?;
    manager.closures().invalidate_root(name).await;

    tracing::info!(project = name, code, library, "project created from anatomy");
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_anatomy_is_valid() {
        Anatomy::default().validate().unwrap();
    }

    #[test]
    fn duplicate_task_type_is_rejected() {
        let mut anatomy = Anatomy::default();
        anatomy.task_types.push(task_type("Generic", "gen", ""));
        let err = anatomy.validate().unwrap_err();
        assert!(err.concerns("task_types"));
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn templates_group_by_kind() {
        let config = Templates::default().to_config();
        assert_eq!(config["common"]["version_padding"], 3);
        assert!(config["work"]["default"]["directory"].is_string());
        assert!(config.get("delivery").is_none());
    }

    #[test]
    fn yaml_fills_defaults() {
        let anatomy = Anatomy::from_yaml_str(
            "roots:\n  - name: work\n    linux: /mnt/work\ntags:\n  - name: hero\n",
        )
        .unwrap();
        assert_eq!(anatomy.roots.len(), 1);
        assert_eq!(anatomy.roots[0].windows, "");
        assert_eq!(anatomy.tags[0].name, "hero");
        assert_eq!(anatomy.task_types, Anatomy::default().task_types);
    }

    #[test]
    fn json_accepts_camel_case_short_names() {
        let anatomy =
            Anatomy::from_json_str(r#"{"task_types": [{"name": "Edit", "shortName": "ed"}]}"#)
                .unwrap();
        assert_eq!(anatomy.task_types[0].short_name, "ed");
    }

    #[test]
    fn attribute_defaults_do_not_override() {
        let registry = AttributeRegistry::with_builtins().unwrap();
        let mut anatomy = Anatomy::default();
        anatomy.attributes.insert("fps".to_string(), json!(24));
        let anatomy = anatomy.with_attribute_defaults(&registry);
        assert_eq!(anatomy.attributes["fps"], json!(24));
        assert_eq!(anatomy.attributes["frameStart"], json!(1001));
    }
}
