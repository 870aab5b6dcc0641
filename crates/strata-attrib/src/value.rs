//! Attribute value kinds

use crate::error::ConfigurationError;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The kind of value an attribute holds
///
/// Values travel as JSON; `accepts` checks that a JSON value fits the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Integer,
    /// Floating point number (integers are accepted)
    Float,
    /// true / false
    Boolean,
    /// RFC 3339 timestamp string
    Datetime,
    /// Array of strings
    ListOfStrings,
    /// JSON object
    Mapping,
}

impl ValueType {
    /// Configuration name of the value type
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Datetime => "datetime",
            ValueType::ListOfStrings => "list_of_strings",
            ValueType::Mapping => "mapping",
        }
    }

    /// Check whether a JSON value is of this kind
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Integer => value.is_i64() || value.is_u64(),
            ValueType::Float => value.is_number(),
            ValueType::Boolean => value.is_boolean(),
            ValueType::Datetime => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            ValueType::ListOfStrings => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ValueType::Mapping => value.is_object(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "integer" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "boolean" => Ok(ValueType::Boolean),
            "datetime" => Ok(ValueType::Datetime),
            "list_of_strings" => Ok(ValueType::ListOfStrings),
            "mapping" | "dict" => Ok(ValueType::Mapping),
            other => Err(ConfigurationError::UnknownValueType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_rejects_float() {
        assert!(ValueType::Integer.accepts(&json!(1001)));
        assert!(!ValueType::Integer.accepts(&json!(24.5)));
    }

    #[test]
    fn float_accepts_integer() {
        assert!(ValueType::Float.accepts(&json!(25)));
        assert!(ValueType::Float.accepts(&json!(23.976)));
        assert!(!ValueType::Float.accepts(&json!("25")));
    }

    #[test]
    fn datetime_requires_rfc3339() {
        assert!(ValueType::Datetime.accepts(&json!("2023-01-01T00:00:00+00:00")));
        assert!(!ValueType::Datetime.accepts(&json!("yesterday")));
        assert!(!ValueType::Datetime.accepts(&json!(0)));
    }

    #[test]
    fn list_of_strings_checks_items() {
        assert!(ValueType::ListOfStrings.accepts(&json!(["maya", "nuke"])));
        assert!(!ValueType::ListOfStrings.accepts(&json!(["maya", 1])));
    }

    #[test]
    fn unknown_name_fails() {
        let err = "decimal".parse::<ValueType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown value type: 'decimal'");
    }

    #[test]
    fn dict_is_mapping_alias() {
        assert_eq!("dict".parse::<ValueType>().unwrap(), ValueType::Mapping);
    }
}
