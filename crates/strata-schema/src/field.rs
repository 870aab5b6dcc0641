//! Field descriptors
//!
//! A [`FieldSpec`] describes one top-level field of an entity payload. Field
//! tables are plain data evaluated once when a schema is generated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use strata_attrib::ValueType;

/// Name pattern for folders, tasks, subsets, representations and projects
pub const NAME_REGEX: &str = r"^[a-zA-Z0-9_]([a-zA-Z0-9_\.\-]*[a-zA-Z0-9_])?$";

/// User name pattern
pub const USER_NAME_REGEX: &str = r"^[a-zA-Z0-9][a-zA-Z0-9_\.\-]*[a-zA-Z0-9]$";

/// Entity identifier pattern (32 lowercase hex digits)
pub const ENTITY_ID_REGEX: &str = r"^[0-9a-f]{32}$";

/// Project code pattern
pub const PROJECT_CODE_REGEX: &str = r"^[a-zA-Z0-9_]*$";

/// Example entity identifier
pub const ENTITY_ID_EXAMPLE: &str = "c10d5bc73dcab7da4cba0f3e0b3c0aea";

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(ENTITY_ID_REGEX).expect("valid entity id pattern"));

/// Check whether a string is a well-formed entity identifier
#[inline]
#[must_use]
pub fn is_entity_id(value: &str) -> bool {
    ENTITY_ID.is_match(value)
}

/// Kind of a top-level field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Any attribute value kind
    Value(ValueType),
    /// Array of JSON objects
    ListOfMappings,
    /// Nested attribute sub-schema
    Attributes,
}

impl FieldType {
    /// Check a non-null JSON value against the field kind
    ///
    /// `Attributes` only checks for an object; keys are checked against the
    /// attribute sub-schema separately.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Value(value_type) => value_type.accepts(value),
            FieldType::ListOfMappings => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
            FieldType::Attributes => value.is_object(),
        }
    }

    /// Short name for diagnostics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Value(value_type) => value_type.as_str(),
            FieldType::ListOfMappings => "list_of_mappings",
            FieldType::Attributes => "attributes",
        }
    }
}

/// Descriptor of a single payload field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Field kind
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be supplied on create
    pub required: bool,
    /// Value filled in when the field is absent on create
    pub default: Option<Value>,
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Example value
    pub example: Option<Value>,
    /// Pattern string values must match
    pub regex: Option<String>,
    /// Derived field, never accepted in create or patch payloads
    pub dynamic: bool,
}

impl FieldSpec {
    /// Create an optional, non-dynamic field
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            title: None,
            description: None,
            example: None,
            regex: None,
            dynamic: false,
        }
    }

    /// Shorthand for a scalar field
    #[must_use]
    pub fn value(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, FieldType::Value(value_type))
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Mark as dynamic
    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the example value
    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Set the value pattern
    #[must_use]
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_format() {
        assert!(is_entity_id(ENTITY_ID_EXAMPLE));
        assert!(!is_entity_id("C10D5BC73DCAB7DA4CBA0F3E0B3C0AEA"));
        assert!(!is_entity_id("c10d5bc7-3dca-b7da-4cba-0f3e0b3c0aea"));
    }

    #[test]
    fn list_of_mappings_accepts_objects_only() {
        let ft = FieldType::ListOfMappings;
        assert!(ft.accepts(&json!([{"name": "Generic"}])));
        assert!(!ft.accepts(&json!(["Generic"])));
    }

    #[test]
    fn builder_flags() {
        let field = FieldSpec::value("path", ValueType::String)
            .dynamic()
            .with_title("Path");
        assert!(field.dynamic);
        assert!(!field.required);
        assert_eq!(field.title.as_deref(), Some("Path"));
    }
}
