//! JSON schema derivation with a process-wide cache.
//!
//! Schemas are derived once per Rust type and reused, so repeated requests
//! for the same structured output carry byte-identical schema strings.

use parking_lot::RwLock;
use schemars::JsonSchema;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use xai_sdk_core::messages::ResponseFormat;
use xai_sdk_core::{Result, XaiError};

static SCHEMA_CACHE: LazyLock<RwLock<HashMap<TypeId, Arc<str>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// The JSON schema of `T`, serialized to a string.
///
/// The first call for a type derives and caches the schema; later calls
/// return the cached string.
pub fn json_schema_for<T: JsonSchema + 'static>() -> Result<Arc<str>> {
    let key = TypeId::of::<T>();
    if let Some(schema) = SCHEMA_CACHE.read().get(&key) {
        return Ok(Arc::clone(schema));
    }

    let schema = schemars::schema_for!(T);
    let encoded: Arc<str> = serde_json::to_string(&schema)
        .map_err(|e| XaiError::schema(format!("{}: {e}", type_name::<T>())))?
        .into();
    debug!(schema_type = type_name::<T>(), bytes = encoded.len(), "derived JSON schema");

    // Another thread may have won the race; keep whichever landed first.
    let mut cache = SCHEMA_CACHE.write();
    Ok(Arc::clone(cache.entry(key).or_insert(encoded)))
}

/// A schema-mode response format for `T`.
pub fn response_format_for<T: JsonSchema + 'static>() -> Result<ResponseFormat> {
    let schema = json_schema_for::<T>()?;
    Ok(ResponseFormat::json_schema(schema.as_ref()))
}

/// Number of cached schemas.
pub fn cached_schemas() -> usize {
    SCHEMA_CACHE.read().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use xai_sdk_core::FormatType;

    #[allow(dead_code)]
    #[derive(Debug, Deserialize, JsonSchema)]
    struct City {
        name: String,
        population: u64,
    }

    #[allow(dead_code)]
    #[derive(Debug, Deserialize, JsonSchema)]
    struct Country {
        capital: City,
    }

    #[test]
    fn test_schema_is_cached_and_identical() {
        let first = json_schema_for::<City>().unwrap();
        let second = json_schema_for::<City>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert!(cached_schemas() >= 1);
    }

    #[test]
    fn test_schema_describes_fields() {
        let schema: serde_json::Value =
            serde_json::from_str(&json_schema_for::<City>().unwrap()).unwrap();
        let properties = &schema["properties"];
        assert!(properties.get("name").is_some());
        assert!(properties.get("population").is_some());
    }

    #[test]
    fn test_distinct_types_distinct_schemas() {
        let city = json_schema_for::<City>().unwrap();
        let country = json_schema_for::<Country>().unwrap();
        assert_ne!(city, country);
    }

    #[test]
    fn test_response_format_for() {
        let format = response_format_for::<Country>().unwrap();
        assert_eq!(format.format_type, FormatType::JsonSchema);
        assert!(format.schema.unwrap().contains("capital"));
    }
}
