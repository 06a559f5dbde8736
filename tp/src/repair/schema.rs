//! Target shapes for structured replies

use serde::de::DeserializeOwned;

use super::SchemaError;

/// A type the repair pipeline can produce
///
/// Deserialization rejects missing fields and wrong types; `validate` adds
/// the value checks serde cannot express.
pub trait Schema: DeserializeOwned {
    fn validate(&self) -> Result<(), SchemaError> {
        Ok(())
    }

    /// Deserialize and validate a parsed value
    fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let parsed: Self = serde_json::from_value(value).map_err(|e| SchemaError::Shape(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

impl Schema for serde_json::Value {}
