use jsonschema::validator_for;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("Arguments do not match tool schema: {0}")]
    ValidationFailed(String),
}

/// Validate a tool's argument map against its declared input schema
/// (draft 2020-12). Returns Ok(()) if valid, Err naming the first violation.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), SchemaValidationError> {
    let validator = validator_for(schema)
        .map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    match validator.validate(arguments) {
        Ok(()) => Ok(()),
        Err(e) => Err(SchemaValidationError::ValidationFailed(e.to_string())),
    }
}
