//! Optional JSON Schema capability for `bundle.json`.
//!
//! The schema check is soft: when the `schema` feature is disabled, or the
//! embedded schema fails to compile, [`SchemaValidator::bundled`] returns
//! `None` and callers skip the check.

use serde_json::Value;

/// Embedded bundle schema (Draft 2020-12).
pub const BUNDLE_SCHEMA_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../schemas/bundle.schema.json"
));

/// Maximum validation errors collected per instance.
#[cfg(feature = "schema")]
const MAX_ERRORS: usize = 10;

/// Compiled schema validator.
pub struct SchemaValidator {
    #[cfg(feature = "schema")]
    inner: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

#[cfg(feature = "schema")]
impl SchemaValidator {
    /// Compile the embedded bundle schema.
    pub fn bundled() -> Option<Self> {
        let schema: Value = match serde_json::from_str(BUNDLE_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Embedded bundle schema is not valid JSON");
                return None;
            }
        };
        Self::compile(&schema)
    }

    /// Compile an arbitrary schema value.
    pub fn compile(schema: &Value) -> Option<Self> {
        match jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(schema)
        {
            Ok(inner) => Some(Self { inner }),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compile bundle schema, schema check disabled");
                None
            }
        }
    }

    /// Validate an instance, returning up to ten error messages on failure.
    pub fn validate(&self, instance: &Value) -> std::result::Result<(), Vec<String>> {
        if self.inner.is_valid(instance) {
            return Ok(());
        }
        Err(self
            .inner
            .iter_errors(instance)
            .take(MAX_ERRORS)
            .map(|e| e.to_string())
            .collect())
    }
}

#[cfg(not(feature = "schema"))]
impl SchemaValidator {
    /// Schema support is compiled out.
    pub fn bundled() -> Option<Self> {
        None
    }

    /// Schema support is compiled out.
    pub fn compile(_schema: &Value) -> Option<Self> {
        None
    }

    /// Unreachable in practice: no instance can be constructed.
    pub fn validate(&self, _instance: &Value) -> std::result::Result<(), Vec<String>> {
        Ok(())
    }
}

#[cfg(all(test, feature = "schema"))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundled_schema_compiles() {
        assert!(SchemaValidator::bundled().is_some());
    }

    #[test]
    fn test_empty_object_is_invalid() {
        let v = SchemaValidator::bundled().unwrap();
        let errors = v.validate(&json!({})).unwrap_err();
        assert!(!errors.is_empty());
        assert!(errors.len() <= MAX_ERRORS);
    }

    #[test]
    fn test_wrong_policy_is_invalid() {
        let v = SchemaValidator::bundled().unwrap();
        let instance = json!({
            "kind": "repolens.pr_schau.bundle",
            "version": "1.0",
            "meta": {
                "repo": "demo",
                "generated_at": "2026-01-15T14:30:22Z",
                "generator": {"name": "repolens", "component": "pr-schau", "version": "0.1.0"}
            },
            "completeness": {
                "is_complete": true,
                "policy": "shrink",
                "parts": ["review.md"],
                "primary_part": "review.md",
                "expected_bytes": 1,
                "emitted_bytes": 1
            },
            "artifacts": []
        });
        assert!(v.validate(&instance).is_err());

        let mut fixed = instance.clone();
        fixed["completeness"]["policy"] = json!("split");
        assert!(v.validate(&fixed).is_ok());
    }
}
