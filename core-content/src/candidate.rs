//! Raw records produced by extraction, before classification.

use serde_json::Value;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::document::Fields;

/// Metadata key carrying an episode's identity.
pub const EPISODE_ID_FIELD: &str = "id";

/// Author-supplied episode identity.
///
/// Numbers and non-empty strings are accepted. Two identities are equal when
/// their textual forms are equal, so `1` and `"1"` collide.
#[derive(Debug, Clone)]
pub struct EpisodeId {
    text: String,
    value: Value,
}

impl EpisodeId {
    /// Interpret a metadata value as an episode identity.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return None,
        };
        Some(Self {
            text,
            value: value.clone(),
        })
    }

    /// Read the identity from an episode's metadata.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        fields.get(EPISODE_ID_FIELD).and_then(Self::from_value)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The value as written in the document, used as the store key.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for EpisodeId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for EpisodeId {}

impl Hash for EpisodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// One episode document that carried an identity.
#[derive(Debug, Clone)]
pub struct EpisodeCandidate {
    pub source: PathBuf,
    pub id: EpisodeId,
    /// All frontmatter fields, including `id`
    pub fields: Fields,
    pub content: String,
}

impl EpisodeCandidate {
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One work directory with parseable metadata.
#[derive(Debug, Clone)]
pub struct WorkCandidate {
    /// Work directory name
    pub name: String,
    pub source: PathBuf,
    pub fields: Fields,
    /// Episodes in file name order
    pub episodes: Vec<EpisodeCandidate>,
}
