//! JSON Schema validation for rule configuration files.
//!
//! The config schema is embedded at compile time from
//! `schemas/dedup-config.json` and checked with JSON Schema Draft 7
//! before a config is deserialized.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use dupcheck::validation::validate_config;
//!
//! let config = json!({
//!     "identifierColumn": "externalId",
//!     "coreFields": [{ "name": "name", "type": "name" }]
//! });
//! assert!(validate_config(&config).is_ok());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static CONFIG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/dedup-config.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with one message per violation
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use dupcheck::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {
///         "name": { "type": "string" }
///     }
/// });
///
/// assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
/// assert!(validate(&schema, &json!({ "age": 42 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean form of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate against the embedded rule configuration schema.
pub fn validate_config(data: &Value) -> Result<(), Vec<String>> {
    validate(&CONFIG_SCHEMA, data)
}

/// Quick check against the rule configuration schema.
pub fn is_valid_config(data: &Value) -> bool {
    is_valid(&CONFIG_SCHEMA, data)
}
