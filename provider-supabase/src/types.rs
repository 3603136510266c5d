//! PostgREST response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by PostgREST for rejected requests
///
/// See: https://postgrest.org/en/stable/references/errors.html
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgrestError {
    /// PostgreSQL or PostgREST error code (e.g. `23505`, `PGRST204`)
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    /// Free-form detail, usually a string
    #[serde(default)]
    pub details: Option<Value>,

    #[serde(default)]
    pub hint: Option<String>,
}

impl PostgrestError {
    /// `details` rendered as text
    pub fn details_text(&self) -> Option<String> {
        match self.details.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_postgrest_error() {
        let json = r#"{
            "code": "23505",
            "details": "Key (id)=(1) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"episodes_pkey\""
        }"#;

        let error: PostgrestError = serde_json::from_str(json).unwrap();
        assert_eq!(error.code.as_deref(), Some("23505"));
        assert_eq!(
            error.details_text().as_deref(),
            Some("Key (id)=(1) already exists.")
        );
        assert_eq!(error.hint, None);
        assert!(error.message.unwrap().contains("episodes_pkey"));
    }

    #[test]
    fn test_deserialize_partial_error() {
        let error: PostgrestError = serde_json::from_str(r#"{"message": "boom"}"#).unwrap();
        assert_eq!(error.message.as_deref(), Some("boom"));
        assert_eq!(error.code, None);
        assert_eq!(error.details_text(), None);
    }
}
