//! Metadata and episode document parsing
//!
//! Work metadata files are plain YAML mappings. Episode documents carry an
//! optional YAML frontmatter block between two `---` lines, followed by the
//! body text. YAML values are converted to JSON values on the way in so they
//! can be forwarded to the record store unchanged.

use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;

use crate::error::{ContentError, Result};

/// Field name → value mapping parsed from metadata.
pub type Fields = Map<String, Value>;

const DELIMITER: &str = "---";

/// A parsed episode document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub metadata: Fields,
    /// Body text with surrounding whitespace removed
    pub body: String,
}

/// Read and parse a work metadata file.
pub fn read_metadata_file(path: &Path) -> Result<Fields> {
    let text = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
    parse_metadata(path, &text)
}

/// Read and parse an episode document.
pub fn read_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
    parse_document(path, &text)
}

/// Parse a YAML mapping. An empty document yields an empty mapping.
pub fn parse_metadata(path: &Path, text: &str) -> Result<Fields> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| ContentError::InvalidYaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    match yaml_to_json(yaml) {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Fields::new()),
        _ => Err(ContentError::NotAMapping(path.to_path_buf())),
    }
}

/// Split a document into frontmatter metadata and body.
pub fn parse_document(path: &Path, text: &str) -> Result<Document> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text.split_inclusive('\n');
    let opens_block = lines
        .next()
        .map(|first| first.trim_end() == DELIMITER)
        .unwrap_or(false);

    if !opens_block {
        return Ok(Document {
            metadata: Fields::new(),
            body: text.trim().to_string(),
        });
    }

    let mut offset = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let header_start = offset;

    for line in lines {
        if line.trim_end() == DELIMITER {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            return Ok(Document {
                metadata: parse_metadata(path, header)?,
                body: body.trim().to_string(),
            });
        }
        offset += line.len();
    }

    Err(ContentError::UnterminatedFrontmatter(path.to_path_buf()))
}

/// Convert a YAML value into the equivalent JSON value.
///
/// Non-string mapping keys are rendered to strings; tags are dropped; floats
/// JSON cannot represent become `null`.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key_to_string(k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key_to_string(key: serde_yaml::Value) -> String {
    match yaml_to_json(key) {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("manuscript/001.md")
    }

    #[test]
    fn test_parse_document_with_frontmatter() {
        let text = "---\nid: 1\ntitle: Prologue\nstatus: new\n---\n\nIt began at dawn.\n";
        let doc = parse_document(&path(), text).unwrap();

        assert_eq!(doc.metadata.get("id"), Some(&json!(1)));
        assert_eq!(doc.metadata.get("title"), Some(&json!("Prologue")));
        assert_eq!(doc.metadata.get("status"), Some(&json!("new")));
        assert_eq!(doc.body, "It began at dawn.");
    }

    #[test]
    fn test_parse_document_without_frontmatter() {
        let doc = parse_document(&path(), "Just text.\n").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "Just text.");
    }

    #[test]
    fn test_parse_document_empty_body() {
        let doc = parse_document(&path(), "---\nid: 3\n---\n   \n").unwrap();
        assert_eq!(doc.metadata.get("id"), Some(&json!(3)));
        assert!(doc.body.is_empty());
    }

    #[test]
    fn test_parse_document_crlf_and_bom() {
        let text = "\u{feff}---\r\nid: 2\r\n---\r\nBody\r\n";
        let doc = parse_document(&path(), text).unwrap();
        assert_eq!(doc.metadata.get("id"), Some(&json!(2)));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_parse_document_empty_frontmatter_block() {
        let doc = parse_document(&path(), "---\n---\nBody").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_unterminated_frontmatter_is_error() {
        let err = parse_document(&path(), "---\nid: 1\nno closing line\n").unwrap_err();
        assert!(matches!(err, ContentError::UnterminatedFrontmatter(_)));
    }

    #[test]
    fn test_frontmatter_must_be_mapping() {
        let err = parse_document(&path(), "---\n- a\n- b\n---\nBody").unwrap_err();
        assert!(matches!(err, ContentError::NotAMapping(_)));
    }

    #[test]
    fn test_parse_metadata_values() {
        let text = "title: Night Train\nauthor: K\ntags: [mystery, 2024]\ncreated_at: 2024-01-05\npublished: true\n";
        let fields = parse_metadata(Path::new("info.yml"), text).unwrap();

        assert_eq!(fields.get("title"), Some(&json!("Night Train")));
        assert_eq!(fields.get("tags"), Some(&json!(["mystery", 2024])));
        assert_eq!(fields.get("created_at"), Some(&json!("2024-01-05")));
        assert_eq!(fields.get("published"), Some(&json!(true)));
    }

    #[test]
    fn test_parse_metadata_preserves_key_order() {
        let fields = parse_metadata(Path::new("info.yml"), "b: 1\na: 2\n").unwrap();
        let keys: Vec<&String> = fields.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_parse_metadata_empty_file() {
        let fields = parse_metadata(Path::new("info.yml"), "").unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_parse_metadata_invalid_yaml() {
        let err = parse_metadata(Path::new("info.yml"), "title: [unclosed").unwrap_err();
        assert!(matches!(err, ContentError::InvalidYaml { .. }));
    }

    #[test]
    fn test_parse_metadata_scalar_is_not_mapping() {
        let err = parse_metadata(Path::new("info.yml"), "just a string").unwrap_err();
        assert!(matches!(err, ContentError::NotAMapping(_)));
    }

    #[test]
    fn test_yaml_to_json_non_string_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        assert_eq!(yaml_to_json(yaml), json!({"1": "one", "true": "yes"}));
    }
}
