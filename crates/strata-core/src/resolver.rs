//! Inheritance resolution
//!
//! An entity's effective attributes are, per registered attribute:
//!
//! 1. the entity's own stored value
//! 2. else the value in its owning folder's closure (inheritable only)
//! 3. else the registered default
//!
//! [`resolve`] is the pure merge; [`InheritanceResolver`] locates the
//! closure for a fetched row and degrades to an empty closure, with an
//! [`InconsistencyWarning`], when it is missing.

use crate::error::InconsistencyWarning;
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use strata_attrib::{AttributeRegistry, EntityType};
use strata_store::{ClosureOwner, ClosureReader, FetchedRow, InheritanceClosure};

/// Effective attribute view of one entity
///
/// `own` is always a subset of the keys of `effective`. Values only change
/// through the lifecycle manager's patch path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeSet {
    effective: Map<String, Value>,
    own: IndexSet<String>,
    /// Value each attribute falls back to when not owned
    #[serde(skip)]
    fallback: Map<String, Value>,
}

impl AttributeSet {
    /// Effective mapping, in registration order
    #[inline]
    #[must_use]
    pub fn effective(&self) -> &Map<String, Value> {
        &self.effective
    }

    /// Names stored explicitly on the entity
    #[inline]
    #[must_use]
    pub fn own(&self) -> &IndexSet<String> {
        &self.own
    }

    /// Effective value of one attribute
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.effective.get(name)
    }

    /// Whether the entity owns `name`
    #[inline]
    #[must_use]
    pub fn is_own(&self, name: &str) -> bool {
        self.own.contains(name)
    }

    /// Inherited or default value `name` would show if reset
    #[inline]
    #[must_use]
    pub fn inherited(&self, name: &str) -> Option<&Value> {
        self.fallback.get(name)
    }

    /// The owned subset, as persisted
    #[must_use]
    pub fn own_values(&self) -> Map<String, Value> {
        self.own
            .iter()
            .filter_map(|name| self.effective.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    /// Pin a value as own
    pub(crate) fn set(&mut self, name: &str, value: Value) {
        self.own.insert(name.to_string());
        self.effective.insert(name.to_string(), value);
    }

    /// Drop ownership and fall back to the inherited value
    pub(crate) fn reset(&mut self, name: &str) {
        self.own.shift_remove(name);
        match self.fallback.get(name) {
            Some(value) => {
                self.effective.insert(name.to_string(), value.clone());
            }
            None => {
                self.effective.shift_remove(name);
            }
        }
    }
}

/// Merge own values, a closure and registered defaults
///
/// Stored names unknown to the registry for `entity_type` are dropped and
/// logged.
#[must_use]
pub fn resolve(
    registry: &AttributeRegistry,
    entity_type: EntityType,
    stored: &Map<String, Value>,
    closure: Option<&InheritanceClosure>,
) -> AttributeSet {
    let mut set = AttributeSet::default();

    for name in stored.keys() {
        if registry.lookup(entity_type, name).is_some() {
            set.own.insert(name.clone());
        } else {
            tracing::warn!(%entity_type, attribute = %name, "dropping unknown stored attribute");
        }
    }

    for definition in registry.list(entity_type) {
        let inherited = closure
            .filter(|_| definition.inheritable)
            .and_then(|c| c.get(&definition.name))
            .or(definition.default.as_ref());
        if let Some(value) = inherited {
            set.fallback.insert(definition.name.clone(), value.clone());
        }

        let effective = if set.own.contains(&definition.name) {
            stored.get(&definition.name)
        } else {
            inherited
        };
        if let Some(value) = effective {
            set.effective.insert(definition.name.clone(), value.clone());
        }
    }

    set
}

/// Closure-aware resolver
#[derive(Clone)]
pub struct InheritanceResolver {
    registry: Arc<AttributeRegistry>,
    closures: Arc<dyn ClosureReader>,
}

impl std::fmt::Debug for InheritanceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InheritanceResolver")
            .field("attributes", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl InheritanceResolver {
    /// Create new resolver
    #[must_use]
    pub fn new(registry: Arc<AttributeRegistry>, closures: Arc<dyn ClosureReader>) -> Self {
        Self { registry, closures }
    }

    /// Resolve the attributes of a fetched row
    ///
    /// Never fails: a missing or unreadable closure yields a warning and an
    /// empty inherited set.
    pub async fn resolve_row(
        &self,
        project: &str,
        fetched: &FetchedRow,
    ) -> (AttributeSet, Option<InconsistencyWarning>) {
        let row = &fetched.row;
        let warn = |message: String| {
            Some(InconsistencyWarning::raise(row.entity_type, row.key.clone(), message))
        };

        let (closure, warning) = match &fetched.closure_owner {
            ClosureOwner::None => (None, None),
            ClosureOwner::ProjectRoot => match self.closures.root_closure(project).await {
                Ok(closure) => (Some(closure), None),
                Err(err) => (None, warn(format!("project closure unavailable: {err}"))),
            },
            ClosureOwner::Folder(folder_id) => {
                match self.closures.closure(project, folder_id).await {
                    Ok(Some(closure)) => (Some(closure), None),
                    Ok(None) => (
                        None,
                        warn(format!("folder '{folder_id}' has no inherited attributes")),
                    ),
                    Err(err) => (
                        None,
                        warn(format!("closure of folder '{folder_id}' unavailable: {err}")),
                    ),
                }
            }
            ClosureOwner::Unresolved(broken) => (None, warn(broken.clone())),
        };

        let attributes = resolve(&self.registry, row.entity_type, &row.attrib, closure.as_deref());
        (attributes, warning)
    }

    /// Attribute registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<AttributeRegistry> {
        &self.registry
    }
}
