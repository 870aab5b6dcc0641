//! Payload validation against generated shapes

use crate::error::{FieldViolation, ValidationError};
use crate::field::{FieldSpec, FieldType};
use crate::shape::{EntityTypeSchema, ShapeKind};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Compiled field patterns, keyed by pattern source
static PATTERNS: Lazy<DashMap<String, Option<Regex>>> = Lazy::new(DashMap::new);

fn pattern_matches(pattern: &str, value: &str) -> bool {
    if let Some(compiled) = PATTERNS.get(pattern) {
        return compiled.as_ref().map_or(true, |re| re.is_match(value));
    }
    let compiled = Regex::new(pattern).ok();
    let matches = compiled.as_ref().map_or(true, |re| re.is_match(value));
    PATTERNS.insert(pattern.to_string(), compiled);
    matches
}

impl EntityTypeSchema {
    /// Validate a payload against one shape
    ///
    /// - unknown and dynamic fields are rejected
    /// - `create`/`full`: required fields must be present and non-null
    /// - `patch`: absent means unchanged, `null` clears an optional field;
    ///   `null` inside `attrib` resets the attribute to its inherited value
    ///
    /// # Errors
    /// `ValidationError` listing every violation found.
    pub fn validate(&self, kind: ShapeKind, payload: &Map<String, Value>) -> Result<(), ValidationError> {
        let shape = self.shape(kind);
        let mut violations = Vec::new();

        for (name, value) in payload {
            let Some(field) = shape.field(name) else {
                let reason = if self.is_dynamic(name) {
                    "field is read-only"
                } else {
                    "unknown field"
                };
                violations.push(FieldViolation::new(name, reason));
                continue;
            };

            if value.is_null() {
                let required_on_create = self
                    .create
                    .field(name)
                    .is_some_and(|f| f.required);
                if field.required || (kind == ShapeKind::Patch && required_on_create) {
                    violations.push(FieldViolation::new(name, "field cannot be null"));
                }
                continue;
            }

            check_value(field, value, &mut violations);

            if field.field_type == FieldType::Attributes {
                if let Some(attrib) = value.as_object() {
                    self.check_attributes(kind, attrib, &mut violations);
                }
            }
        }

        if kind != ShapeKind::Patch {
            for field in shape.required_fields() {
                if payload.get(&field.name).map_or(true, Value::is_null) {
                    violations.push(FieldViolation::new(&field.name, "field is required"));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                entity_type: self.entity_type,
                shape: kind,
                violations,
            })
        }
    }

    fn check_attributes(
        &self,
        kind: ShapeKind,
        attrib: &Map<String, Value>,
        violations: &mut Vec<FieldViolation>,
    ) {
        for (name, value) in attrib {
            let field = format!("attrib.{name}");
            let Some(definition) = self.attrib.get(name) else {
                violations.push(FieldViolation::new(field, "unknown attribute"));
                continue;
            };
            if value.is_null() {
                if kind == ShapeKind::Full {
                    violations.push(FieldViolation::new(field, "attribute cannot be null"));
                }
                continue;
            }
            if !definition.accepts(value) {
                violations.push(FieldViolation::new(
                    field,
                    format!("expected {}", definition.value_type),
                ));
            }
        }
    }
}

fn check_value(field: &FieldSpec, value: &Value, violations: &mut Vec<FieldViolation>) {
    if !field.field_type.accepts(value) {
        violations.push(FieldViolation::new(
            &field.name,
            format!("expected {}", field.field_type.as_str()),
        ));
        return;
    }
    if let (Some(pattern), Some(text)) = (&field.regex, value.as_str()) {
        if !pattern_matches(pattern, text) {
            violations.push(FieldViolation::new(
                &field.name,
                format!("does not match {pattern}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ENTITY_ID_EXAMPLE;
    use crate::fields::standard_fields;
    use crate::generator::generate;
    use serde_json::json;
    use strata_attrib::{AttributeRegistry, EntityType};

    fn schema() -> EntityTypeSchema {
        let registry = AttributeRegistry::with_builtins().unwrap();
        generate(EntityType::Task, &standard_fields(EntityType::Task), &registry).unwrap()
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn valid_create_payload() {
        let body = payload(json!({
            "name": "compositing",
            "folder_id": ENTITY_ID_EXAMPLE,
            "attrib": {"frameStart": 1001, "fps": 24},
            "tags": ["hero"],
        }));
        schema().validate(ShapeKind::Create, &body).unwrap();
    }

    #[test]
    fn create_requires_fields() {
        let body = payload(json!({"label": "Comp"}));
        let err = schema().validate(ShapeKind::Create, &body).unwrap_err();
        assert!(err.concerns("name"));
        assert!(err.concerns("folder_id"));
        assert_eq!(err.shape, ShapeKind::Create);
    }

    #[test]
    fn patch_accepts_partial_document() {
        let body = payload(json!({"label": "Comp"}));
        schema().validate(ShapeKind::Patch, &body).unwrap();
        schema().validate(ShapeKind::Patch, &Map::new()).unwrap();
    }

    #[test]
    fn dynamic_field_is_read_only() {
        let body = payload(json!({"own_attrib": ["fps"]}));
        let err = schema().validate(ShapeKind::Patch, &body).unwrap_err();
        assert_eq!(err.violations[0].reason, "field is read-only");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let body = payload(json!({"colour": "red"}));
        let err = schema().validate(ShapeKind::Patch, &body).unwrap_err();
        assert_eq!(err.violations[0].reason, "unknown field");
    }

    #[test]
    fn attribute_type_is_checked() {
        let body = payload(json!({"attrib": {"frameStart": "first"}}));
        let err = schema().validate(ShapeKind::Patch, &body).unwrap_err();
        assert!(err.concerns("attrib.frameStart"));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let body = payload(json!({"attrib": {"email": "a@b.c"}}));
        let err = schema().validate(ShapeKind::Patch, &body).unwrap_err();
        assert_eq!(err.violations[0].reason, "unknown attribute");
    }

    #[test]
    fn patch_null_attribute_means_reset() {
        let body = payload(json!({"attrib": {"frameStart": null}}));
        schema().validate(ShapeKind::Patch, &body).unwrap();
    }

    #[test]
    fn patch_cannot_null_required_field() {
        let body = payload(json!({"name": null}));
        let err = schema().validate(ShapeKind::Patch, &body).unwrap_err();
        assert_eq!(err.violations[0].reason, "field cannot be null");

        let body = payload(json!({"label": null}));
        schema().validate(ShapeKind::Patch, &body).unwrap();
    }

    #[test]
    fn regex_is_enforced() {
        let body = payload(json!({"folder_id": "not-an-id"}));
        let err = schema().validate(ShapeKind::Patch, &body).unwrap_err();
        assert!(err.violations[0].reason.starts_with("does not match"));

        let body = payload(json!({"name": "bad name!"}));
        assert!(schema().validate(ShapeKind::Patch, &body).is_err());
    }
}
