//! Entity kinds of the production hierarchy

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of entity stored in the hierarchy
///
/// Projects are the root. Folders nest under a project or another folder,
/// tasks and subsets hang off folders, versions off subsets and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Project (hierarchy root, natural key)
    Project,
    /// Folder (asset, shot, sequence ...)
    Folder,
    /// Task on a folder
    Task,
    /// Published subset of a folder
    Subset,
    /// Version of a subset
    Version,
    /// Representation of a version
    Representation,
    /// Work file of a task
    Workfile,
    /// User (natural key, lives outside projects)
    User,
}

impl EntityType {
    /// All entity types in hierarchy order
    pub const ALL: [EntityType; 8] = [
        EntityType::Project,
        EntityType::Folder,
        EntityType::Task,
        EntityType::Subset,
        EntityType::Version,
        EntityType::Representation,
        EntityType::Workfile,
        EntityType::User,
    ];

    /// Lowercase name used in storage and payloads
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Project => "project",
            EntityType::Folder => "folder",
            EntityType::Task => "task",
            EntityType::Subset => "subset",
            EntityType::Version => "version",
            EntityType::Representation => "representation",
            EntityType::Workfile => "workfile",
            EntityType::User => "user",
        }
    }

    /// Capitalized name used for titles
    #[must_use]
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Whether rows carry a generated `id` rather than a natural `name` key
    #[inline]
    #[must_use]
    pub fn has_surrogate_id(&self) -> bool {
        !matches!(self, EntityType::Project | EntityType::User)
    }

    /// Whether the entity lives inside a project (carries `status`/`tags`)
    #[inline]
    #[must_use]
    pub fn is_project_level(&self) -> bool {
        self.has_surrogate_id()
    }

    /// Whether attribute values are inherited from ancestor folders
    #[inline]
    #[must_use]
    pub fn inherits_attributes(&self) -> bool {
        matches!(
            self,
            EntityType::Folder
                | EntityType::Task
                | EntityType::Subset
                | EntityType::Version
                | EntityType::Representation
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownEntityType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_every_type() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_type_is_configuration_error() {
        let err = "shot".parse::<EntityType>().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownEntityType(_)));
    }

    #[test]
    fn natural_key_types() {
        assert!(!EntityType::Project.has_surrogate_id());
        assert!(!EntityType::User.has_surrogate_id());
        assert!(EntityType::Task.has_surrogate_id());
    }

    #[test]
    fn inheritance_aware_types() {
        assert!(EntityType::Folder.inherits_attributes());
        assert!(EntityType::Representation.inherits_attributes());
        assert!(!EntityType::Project.inherits_attributes());
        assert!(!EntityType::Workfile.inherits_attributes());
        assert!(!EntityType::User.inherits_attributes());
    }

    #[test]
    fn title_capitalizes() {
        assert_eq!(EntityType::Representation.title(), "Representation");
    }
}
