//! Classified work and episode records.
//!
//! Records are built fresh each run by the classifier, receive their remote
//! identity from the correlator, and are turned into store payloads only at
//! the moment they are sent. Engine-internal fields ([`LocalKey`], parent
//! keys, operations) never appear in a payload.

use bridge_traits::store::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use core_content::EpisodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column holding a record's store identity.
pub const ID_COLUMN: &str = "id";
/// Episode column referencing the parent work.
pub const NOVEL_ID_COLUMN: &str = "novel_id";

/// Identity of a work before the store has assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalKey {
    /// The `id` declared in the work's metadata
    Declared(i64),
    /// The work's title, for works without a declared id
    Title(String),
}

impl std::fmt::Display for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalKey::Declared(id) => write!(f, "id:{}", id),
            LocalKey::Title(title) => write!(f, "title:{}", title),
        }
    }
}

/// What a run does with a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOperation {
    Insert,
    Update,
    Skip,
}

impl WorkOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOperation::Insert => "insert",
            WorkOperation::Update => "update",
            WorkOperation::Skip => "skip",
        }
    }
}

impl std::fmt::Display for WorkOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a run does with an episode.
///
/// `Skip` episodes (drafts) never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeOperation {
    Insert,
    Update,
    Delete,
    Skip,
}

impl EpisodeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeOperation::Insert => "insert",
            EpisodeOperation::Update => "update",
            EpisodeOperation::Delete => "delete",
            EpisodeOperation::Skip => "skip",
        }
    }
}

impl std::fmt::Display for EpisodeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authored work after classification.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkRecord {
    /// Work directory name, for logs
    pub source: String,
    pub local_key: LocalKey,
    /// Declared in metadata or assigned by the store
    pub remote_id: Option<i64>,
    pub title: String,
    pub author: String,
    pub summary: Option<String>,
    pub genre: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub operation: WorkOperation,
}

impl WorkRecord {
    /// Columns sent to the works table.
    ///
    /// The identity is not part of the payload; updates address the row
    /// through a key instead.
    pub fn payload(&self) -> Record {
        let mut record = Record::new();
        record.insert("title".into(), Value::String(self.title.clone()));
        record.insert("author".into(), Value::String(self.author.clone()));
        if let Some(summary) = &self.summary {
            record.insert("summary".into(), Value::String(summary.clone()));
        }
        if let Some(genre) = &self.genre {
            record.insert("genre".into(), Value::String(genre.clone()));
        }
        record.insert(
            "tags".into(),
            Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
        );
        record.insert("created_at".into(), timestamp(self.created_at));
        record.insert("updated_at".into(), timestamp(self.updated_at));
        record
    }
}

/// One episode after classification.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    /// Episode file name, for logs
    pub source: String,
    pub id: EpisodeId,
    pub parent_local_key: LocalKey,
    /// Set by the correlator
    pub novel_id: Option<i64>,
    pub content: String,
    /// Pass-through metadata, already stripped of engine-only fields
    pub fields: Record,
    pub updated_at: DateTime<Utc>,
    pub operation: EpisodeOperation,
}

impl EpisodeRecord {
    /// Columns sent to the episodes table.
    pub fn payload(&self) -> Record {
        let mut record = self.fields.clone();
        if let Some(novel_id) = self.novel_id {
            record.insert(NOVEL_ID_COLUMN.into(), Value::from(novel_id));
        }
        record.insert("content".into(), Value::String(self.content.clone()));
        record.insert("updated_at".into(), timestamp(self.updated_at));
        record
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn work() -> WorkRecord {
        WorkRecord {
            source: "night-train".to_string(),
            local_key: LocalKey::Title("Night Train".to_string()),
            remote_id: None,
            title: "Night Train".to_string(),
            author: "K".to_string(),
            summary: Some("A long ride".to_string()),
            genre: None,
            tags: vec!["mystery".to_string()],
            created_at: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            updated_at: at(),
            operation: WorkOperation::Insert,
        }
    }

    #[test]
    fn test_work_payload_columns() {
        let payload = work().payload();
        assert_eq!(
            Value::Object(payload),
            json!({
                "title": "Night Train",
                "author": "K",
                "summary": "A long ride",
                "tags": ["mystery"],
                "created_at": "2024-01-05T00:00:00Z",
                "updated_at": "2024-03-01T12:00:00Z"
            })
        );
    }

    #[test]
    fn test_work_payload_never_carries_local_key() {
        let mut work = work();
        work.local_key = LocalKey::Declared(9);
        work.remote_id = Some(9);
        let payload = work.payload();
        assert!(!payload.contains_key("id"));
        assert!(!payload.values().any(|v| v == &json!("id:9")));
    }

    #[test]
    fn test_episode_payload_adds_parent_and_content() {
        let mut fields = Record::new();
        fields.insert("id".into(), json!(1));
        fields.insert("title".into(), json!("Prologue"));

        let episode = EpisodeRecord {
            source: "001.md".to_string(),
            id: EpisodeId::from_value(&json!(1)).unwrap(),
            parent_local_key: LocalKey::Title("Night Train".to_string()),
            novel_id: Some(42),
            content: "It began.".to_string(),
            fields,
            updated_at: at(),
            operation: EpisodeOperation::Insert,
        };

        assert_eq!(
            Value::Object(episode.payload()),
            json!({
                "id": 1,
                "title": "Prologue",
                "novel_id": 42,
                "content": "It began.",
                "updated_at": "2024-03-01T12:00:00Z"
            })
        );
    }

    #[test]
    fn test_local_key_display() {
        assert_eq!(LocalKey::Declared(3).to_string(), "id:3");
        assert_eq!(LocalKey::Title("A".to_string()).to_string(), "title:A");
    }
}
