//! Built-in attribute table
//!
//! Attributes every production project starts with. Custom attributes are
//! appended after these from configuration.

use crate::definition::AttributeDefinition;
use crate::entity_type::EntityType;
use crate::value::ValueType;
use serde_json::json;

use EntityType::{Folder, Project, Representation, Subset, Task, User, Version, Workfile};

/// Scope of timing and format attributes
const SHOT_SCOPE: [EntityType; 5] = [Project, Folder, Task, Version, Representation];

/// Built-in definitions in their canonical order
#[must_use]
pub fn builtin_attributes() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::new("fps", ValueType::Float)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(25.0))
            .with_title("FPS")
            .with_description("Frame rate")
            .with_example(json!(25.0)),
        AttributeDefinition::new("resolutionWidth", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1920))
            .with_title("Width")
            .with_description("Horizontal resolution")
            .with_example(json!(1920)),
        AttributeDefinition::new("resolutionHeight", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1080))
            .with_title("Height")
            .with_description("Vertical resolution")
            .with_example(json!(1080)),
        AttributeDefinition::new("pixelAspect", ValueType::Float)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1.0))
            .with_title("Pixel aspect")
            .with_example(json!(1.0)),
        AttributeDefinition::new("clipIn", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1))
            .with_title("Clip In")
            .with_example(json!(1)),
        AttributeDefinition::new("clipOut", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1))
            .with_title("Clip Out")
            .with_example(json!(1)),
        AttributeDefinition::new("frameStart", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1001))
            .with_title("Start frame")
            .with_description("Frame start")
            .with_example(json!(1001)),
        AttributeDefinition::new("frameEnd", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(1001))
            .with_title("End frame")
            .with_description("Frame end")
            .with_example(json!(1200)),
        AttributeDefinition::new("handleStart", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(0))
            .with_title("Handle start")
            .with_example(json!(8)),
        AttributeDefinition::new("handleEnd", ValueType::Integer)
            .with_scope(SHOT_SCOPE)
            .with_default(json!(0))
            .with_title("Handle end")
            .with_example(json!(8)),
        AttributeDefinition::new("tools", ValueType::ListOfStrings)
            .with_scope([Project, Folder, Task])
            .with_default(json!([]))
            .with_title("Tools")
            .with_example(json!(["maya", "nuke"])),
        AttributeDefinition::new("startDate", ValueType::Datetime)
            .with_scope([Project, Folder])
            .with_title("Start date")
            .with_example(json!("2023-01-01T00:00:00+00:00")),
        AttributeDefinition::new("endDate", ValueType::Datetime)
            .with_scope([Project, Folder])
            .with_title("End date")
            .with_example(json!("2023-12-31T00:00:00+00:00")),
        AttributeDefinition::new("description", ValueType::String)
            .with_scope([Project, Folder, Task, Subset, Version, Representation, Workfile])
            .not_inherited()
            .with_title("Description")
            .with_example(json!("A very nice entity")),
        AttributeDefinition::new("fullName", ValueType::String)
            .with_scope([User])
            .not_inherited()
            .with_title("Full name")
            .with_example(json!("Jane Doe")),
        AttributeDefinition::new("email", ValueType::String)
            .with_scope([User])
            .not_inherited()
            .with_title("E-Mail")
            .with_example(json!("jane.doe@example.com")),
        AttributeDefinition::new("avatarUrl", ValueType::String)
            .with_scope([User])
            .not_inherited()
            .with_title("Avatar URL"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtins_are_valid() {
        for def in builtin_attributes() {
            def.validate().unwrap();
        }
    }

    #[test]
    fn builtin_names_are_unique() {
        let defs = builtin_attributes();
        let names: HashSet<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn frame_start_default() {
        let defs = builtin_attributes();
        let frame_start = defs.iter().find(|d| d.name == "frameStart").unwrap();
        assert_eq!(frame_start.default, Some(json!(1001)));
        assert!(frame_start.inheritable);
    }
}
