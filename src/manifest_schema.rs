//! The concrete mod manifest schema and its validation. Per the component
//! design notes, validation is an aggregate `validate()` that fans
//! individual field checks out and collects every failure rather than
//! stopping at the first one.

use serde::{Deserialize, Serialize};

use bmt_ignore::ManifestOracle;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ModManifest {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> ValidationError {
        ValidationError { field, message: message.into() }
    }
}

impl ModManifest {
    /// Runs every field validator and collects all failures, rather than
    /// returning on the first one — callers that want all problems at once
    /// (e.g. to show a user a full list) get them.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "must not be empty"));
        }
        if self.id.trim().is_empty() {
            errors.push(ValidationError::new("id", "must not be empty"));
        } else if !self.id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            errors.push(ValidationError::new(
                "id",
                "must contain only letters, digits, '-' or '_'",
            ));
        }
        if !self.version.is_empty() && !is_plausible_version(&self.version) {
            errors.push(ValidationError::new("version", "must look like a dotted version number"));
        }

        errors
    }
}

fn is_plausible_version(v: &str) -> bool {
    v.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Implements the core crate's typed parse-and-validate oracle for the
/// concrete manifest schema. `strict` selects between the two explicit
/// modes the design notes call out: a non-empty error list either discards
/// the record (`strict = true`) or is ignored and the structurally valid
/// record is returned anyway (`strict = false`).
pub struct BmtManifestOracle {
    pub strict: bool,
}

impl ManifestOracle<ModManifest> for BmtManifestOracle {
    fn parse_and_validate(&self, bytes: &[u8]) -> Option<ModManifest> {
        let text = std::str::from_utf8(bytes).ok()?;
        let manifest: ModManifest = serde_json::from_str(text).ok()?;
        if self.strict && !manifest.validate().is_empty() {
            return None;
        }
        Some(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ModManifest {
        ModManifest {
            name: "Example Mod".to_string(),
            id: "example_mod".to_string(),
            version: "1.2.3".to_string(),
            author: "Someone".to_string(),
            description: "Does things".to_string(),
        }
    }

    #[test]
    fn valid_manifest_has_no_errors() {
        assert!(valid().validate().is_empty());
    }

    #[test]
    fn empty_name_and_id_both_reported() {
        let manifest = ModManifest { name: String::new(), id: String::new(), ..valid() };
        let errors = manifest.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "name"));
        assert!(errors.iter().any(|e| e.field == "id"));
    }

    #[test]
    fn strict_oracle_drops_invalid_records() {
        let oracle = BmtManifestOracle { strict: true };
        let bytes = br#"{"name":"","id":"ok"}"#;
        assert!(oracle.parse_and_validate(bytes).is_none());
    }

    #[test]
    fn lenient_oracle_keeps_invalid_records() {
        let oracle = BmtManifestOracle { strict: false };
        let bytes = br#"{"name":"","id":"ok"}"#;
        assert!(oracle.parse_and_validate(bytes).is_some());
    }

    #[test]
    fn broken_json_yields_none_regardless_of_mode() {
        let oracle = BmtManifestOracle { strict: false };
        assert!(oracle.parse_and_validate(b"{ broken json").is_none());
    }
}
