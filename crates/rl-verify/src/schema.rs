//! Soft JSON Schema check of `bundle.json`.

use serde_json::Value;

/// Embedded schema (Draft 2020-12), shared with the producer.
pub const BUNDLE_SCHEMA_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../schemas/bundle.schema.json"
));

/// Outcome of the schema check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    Valid,
    Invalid(Vec<String>),
    /// No validator available; the check was skipped.
    Unavailable(String),
}

#[cfg(feature = "schema")]
mod imp {
    use super::{SchemaCheck, BUNDLE_SCHEMA_JSON};
    use serde_json::Value;
    use std::sync::OnceLock;

    const MAX_ERRORS: usize = 10;

    static VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

    fn compiled() -> &'static Result<jsonschema::Validator, String> {
        VALIDATOR.get_or_init(|| {
            let schema: Value = serde_json::from_str(BUNDLE_SCHEMA_JSON)
                .map_err(|e| format!("embedded bundle schema is not valid JSON: {e}"))?;
            jsonschema::options()
                .with_draft(jsonschema::Draft::Draft202012)
                .build(&schema)
                .map_err(|e| format!("failed to compile bundle schema: {e}"))
        })
    }

    pub fn check(instance: &Value) -> SchemaCheck {
        match compiled() {
            Ok(v) if v.is_valid(instance) => SchemaCheck::Valid,
            Ok(v) => SchemaCheck::Invalid(
                v.iter_errors(instance)
                    .take(MAX_ERRORS)
                    .map(|e| e.to_string())
                    .collect(),
            ),
            Err(e) => SchemaCheck::Unavailable(e.clone()),
        }
    }
}

#[cfg(not(feature = "schema"))]
mod imp {
    use super::SchemaCheck;
    use serde_json::Value;

    pub fn check(_instance: &Value) -> SchemaCheck {
        SchemaCheck::Unavailable("built without the `schema` feature".to_string())
    }
}

/// Validate `instance` against the bundle schema, if a validator is available.
pub fn check(instance: &Value) -> SchemaCheck {
    imp::check(instance)
}
