//! JSON Schema export for form-rendering consumers
//!
//! Shapes render to a schemars [`RootSchema`] whose `attrib` property points
//! at the attribute sub-schema in `definitions`.

use crate::field::{FieldSpec, FieldType};
use crate::shape::{AttributeSchema, EntityTypeSchema, ShapeKind};
use schemars::schema::{InstanceType, RootSchema, Schema, SchemaObject, SingleOrVec};
use serde_json::Value;
use strata_attrib::{AttributeDefinition, ValueType};

fn typed(instance_type: InstanceType) -> SchemaObject {
    SchemaObject {
        instance_type: Some(SingleOrVec::Single(Box::new(instance_type))),
        ..Default::default()
    }
}

fn array_of(item: SchemaObject) -> SchemaObject {
    let mut schema = typed(InstanceType::Array);
    schema.array().items = Some(SingleOrVec::Single(Box::new(Schema::Object(item))));
    schema
}

fn value_schema(value_type: ValueType) -> SchemaObject {
    match value_type {
        ValueType::String => typed(InstanceType::String),
        ValueType::Integer => typed(InstanceType::Integer),
        ValueType::Float => typed(InstanceType::Number),
        ValueType::Boolean => typed(InstanceType::Boolean),
        ValueType::Datetime => {
            let mut schema = typed(InstanceType::String);
            schema.format = Some("date-time".to_string());
            schema
        }
        ValueType::ListOfStrings => array_of(typed(InstanceType::String)),
        ValueType::Mapping => typed(InstanceType::Object),
    }
}

fn describe(
    schema: &mut SchemaObject,
    title: Option<&String>,
    description: Option<&String>,
    default: Option<&Value>,
    example: Option<&Value>,
) {
    let metadata = schema.metadata();
    metadata.title = title.cloned();
    metadata.description = description.cloned();
    metadata.default = default.cloned();
    if let Some(example) = example {
        metadata.examples.push(example.clone());
    }
}

fn field_schema(field: &FieldSpec, attrib_ref: &str) -> SchemaObject {
    let mut schema = match field.field_type {
        FieldType::Value(value_type) => value_schema(value_type),
        FieldType::ListOfMappings => array_of(typed(InstanceType::Object)),
        FieldType::Attributes => SchemaObject::new_ref(attrib_ref.to_string()),
    };
    if let Some(pattern) = &field.regex {
        schema.string().pattern = Some(pattern.clone());
    }
    describe(
        &mut schema,
        field.title.as_ref(),
        field.description.as_ref(),
        field.default.as_ref(),
        field.example.as_ref(),
    );
    schema
}

fn attribute_schema(definition: &AttributeDefinition) -> SchemaObject {
    let mut schema = value_schema(definition.value_type);
    schema.enum_values = definition.enum_values.clone();
    describe(
        &mut schema,
        definition.title.as_ref(),
        definition.description.as_ref(),
        definition.default.as_ref(),
        definition.example.as_ref(),
    );
    schema
}

impl AttributeSchema {
    /// Render the attribute sub-schema
    ///
    /// Attributes are never required in payloads; missing values are
    /// inherited or defaulted.
    #[must_use]
    pub fn json_schema(&self) -> SchemaObject {
        let mut schema = typed(InstanceType::Object);
        schema.metadata().title = Some(self.title.clone());
        let object = schema.object();
        for definition in &self.attributes {
            object.properties.insert(
                definition.name.clone(),
                Schema::Object(attribute_schema(definition)),
            );
        }
        object.additional_properties = Some(Box::new(Schema::Bool(false)));
        schema
    }
}

impl EntityTypeSchema {
    /// Render one shape as a JSON Schema document
    #[must_use]
    pub fn json_schema(&self, kind: ShapeKind) -> RootSchema {
        let shape = self.shape(kind);
        let attrib_ref = format!("#/definitions/{}", self.attrib.title);

        let mut schema = typed(InstanceType::Object);
        schema.metadata().title = Some(shape.title.clone());
        let object = schema.object();
        for field in &shape.fields {
            object
                .properties
                .insert(field.name.clone(), Schema::Object(field_schema(field, &attrib_ref)));
            if field.required {
                object.required.insert(field.name.clone());
            }
        }
        object.additional_properties = Some(Box::new(Schema::Bool(false)));

        let mut root = RootSchema {
            meta_schema: Some("http://json-schema.org/draft-07/schema#".to_string()),
            schema,
            ..Default::default()
        };
        root.definitions.insert(
            self.attrib.title.clone(),
            Schema::Object(self.attrib.json_schema()),
        );
        root
    }

    /// Render a shape as a JSON value
    ///
    /// # Errors
    /// Serialization failure (not expected for generated schemas).
    pub fn json_schema_value(&self, kind: ShapeKind) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.json_schema(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::standard_fields;
    use crate::generator::generate;
    use strata_attrib::{AttributeRegistry, EntityType};

    fn schema() -> EntityTypeSchema {
        let registry = AttributeRegistry::with_builtins().unwrap();
        generate(EntityType::Task, &standard_fields(EntityType::Task), &registry).unwrap()
    }

    #[test]
    fn create_schema_lists_required() {
        let value = schema().json_schema_value(ShapeKind::Create).unwrap();
        let required: Vec<&str> = value["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"name"));
        assert!(required.contains(&"folder_id"));
        assert_eq!(value["title"], "TaskPostModel");
    }

    #[test]
    fn patch_schema_has_no_required() {
        let value = schema().json_schema_value(ShapeKind::Patch).unwrap();
        assert!(value.get("required").is_none());
    }

    #[test]
    fn attrib_is_a_reference() {
        let value = schema().json_schema_value(ShapeKind::Full).unwrap();
        assert_eq!(
            value["properties"]["attrib"]["$ref"],
            "#/definitions/TaskAttribModel"
        );
        let frame_start = &value["definitions"]["TaskAttribModel"]["properties"]["frameStart"];
        assert_eq!(frame_start["type"], "integer");
        assert_eq!(frame_start["default"], 1001);
    }

    #[test]
    fn datetime_has_format() {
        let value = schema().json_schema_value(ShapeKind::Full).unwrap();
        assert_eq!(value["properties"]["created_at"]["format"], "date-time");
    }
}
