//! # Operation Classifier
//!
//! Turns extracted work candidates into tagged records.
//!
//! ## Work rules
//!
//! - `title` and `author` are required (and `published` when the
//!   configuration demands it). A missing field excludes the work and all
//!   of its episodes.
//! - `published: false` excludes the work with a warning.
//! - A declared `id` must be an integer. With `updated: true` the work is an
//!   update, without it the work is already synced and skipped. A work with
//!   no `id` is always inserted.
//! - `description` is sent as `summary`; `tags` are normalized.
//!
//! ## Episode rules
//!
//! The `status` marker decides the operation: `draft` is never sent,
//! `deleted` deletes, `updated` updates, `new` or no marker inserts. Any
//! other value inserts with a warning. Two episodes sharing an `id` exclude
//! the whole work.

use bridge_traits::store::Record;
use bridge_traits::time::Clock;
use chrono::{DateTime, NaiveDate, Utc};
use core_content::{EpisodeCandidate, Fields, WorkCandidate};
use core_runtime::config::SyncConfig;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::ValidationIssue;
use crate::records::{EpisodeOperation, EpisodeRecord, LocalKey, WorkOperation, WorkRecord};

pub const TITLE_FIELD: &str = "title";
pub const AUTHOR_FIELD: &str = "author";
pub const PUBLISHED_FIELD: &str = "published";
pub const UPDATED_FIELD: &str = "updated";
pub const DECLARED_ID_FIELD: &str = "id";
pub const STATUS_FIELD: &str = "status";

/// Episode lifecycle marker read from `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleMarker {
    New,
    Updated,
    Deleted,
    Draft,
    Unrecognized(String),
}

impl LifecycleMarker {
    /// Read the marker from episode metadata. Absent means `New`.
    pub fn from_fields(fields: &Fields) -> Self {
        match fields.get(STATUS_FIELD) {
            None | Some(Value::Null) => LifecycleMarker::New,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "new" => LifecycleMarker::New,
                "updated" => LifecycleMarker::Updated,
                "deleted" => LifecycleMarker::Deleted,
                "draft" => LifecycleMarker::Draft,
                _ => LifecycleMarker::Unrecognized(s.clone()),
            },
            Some(other) => LifecycleMarker::Unrecognized(other.to_string()),
        }
    }

    pub fn operation(&self) -> EpisodeOperation {
        match self {
            LifecycleMarker::New | LifecycleMarker::Unrecognized(_) => EpisodeOperation::Insert,
            LifecycleMarker::Updated => EpisodeOperation::Update,
            LifecycleMarker::Deleted => EpisodeOperation::Delete,
            LifecycleMarker::Draft => EpisodeOperation::Skip,
        }
    }
}

/// Result of classifying one work candidate.
#[derive(Debug)]
pub enum Classification {
    Ready(ClassifiedWork),
    /// `published: false`
    Unpublished { work: String },
    Invalid {
        work: String,
        issues: Vec<ValidationIssue>,
    },
}

/// A work and its episodes, ready for planning.
#[derive(Debug, Clone)]
pub struct ClassifiedWork {
    pub work: WorkRecord,
    /// Every episode, drafts included as `Skip`
    pub episodes: Vec<EpisodeRecord>,
}

impl ClassifiedWork {
    pub fn drafts(&self) -> usize {
        self.episodes
            .iter()
            .filter(|e| e.operation == EpisodeOperation::Skip)
            .count()
    }
}

/// Assigns operations to works and episodes.
#[derive(Debug, Clone)]
pub struct OperationClassifier {
    now: DateTime<Utc>,
    require_publication_flag: bool,
    stripped_fields: Vec<String>,
}

impl OperationClassifier {
    /// Create a classifier for one run. Every record of the run is stamped
    /// with the same instant.
    pub fn new(config: &SyncConfig, clock: &dyn Clock) -> Self {
        Self {
            now: clock.now(),
            require_publication_flag: config.require_publication_flag,
            stripped_fields: config.stripped_episode_fields.clone(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn classify(&self, unit: WorkCandidate) -> Classification {
        let mut issues = Vec::new();

        let title = required_text(&unit.fields, TITLE_FIELD);
        if title.is_none() {
            issues.push(ValidationIssue::MissingField { field: TITLE_FIELD });
        }
        let author = required_text(&unit.fields, AUTHOR_FIELD);
        if author.is_none() {
            issues.push(ValidationIssue::MissingField {
                field: AUTHOR_FIELD,
            });
        }
        let published = parse_flag(unit.fields.get(PUBLISHED_FIELD));
        if self.require_publication_flag && published.is_none() {
            issues.push(ValidationIssue::MissingField {
                field: PUBLISHED_FIELD,
            });
        }

        let declared_id = match unit.fields.get(DECLARED_ID_FIELD) {
            None | Some(Value::Null) => None,
            Some(value) => match parse_declared_id(value) {
                Ok(id) => Some(id),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            },
        };

        issues.extend(duplicate_episode_ids(&unit.episodes));

        let (Some(title), Some(author)) = (title, author) else {
            return Classification::Invalid {
                work: unit.name,
                issues,
            };
        };
        if !issues.is_empty() {
            return Classification::Invalid {
                work: unit.name,
                issues,
            };
        }

        if published == Some(false) {
            return Classification::Unpublished { work: unit.name };
        }

        let operation = match (declared_id, parse_flag(unit.fields.get(UPDATED_FIELD))) {
            (None, _) => WorkOperation::Insert,
            (Some(_), Some(true)) => WorkOperation::Update,
            (Some(_), _) => WorkOperation::Skip,
        };

        let local_key = match declared_id {
            Some(id) => LocalKey::Declared(id),
            None => LocalKey::Title(title.clone()),
        };

        let work = WorkRecord {
            source: unit.name.clone(),
            local_key: local_key.clone(),
            remote_id: declared_id,
            title,
            author,
            summary: optional_text(&unit.fields, "description"),
            genre: optional_text(&unit.fields, "genre"),
            tags: normalize_tags(unit.fields.get("tags")),
            created_at: parse_created_at(unit.fields.get("created_at"), self.now),
            updated_at: self.now,
            operation,
        };

        let episodes = unit
            .episodes
            .into_iter()
            .map(|episode| self.classify_episode(&unit.name, &local_key, episode))
            .collect();

        debug!(work = %unit.name, key = %local_key, operation = %operation, "Classified work");
        Classification::Ready(ClassifiedWork { work, episodes })
    }

    fn classify_episode(
        &self,
        work: &str,
        parent: &LocalKey,
        episode: EpisodeCandidate,
    ) -> EpisodeRecord {
        let source = episode.file_name();
        let marker = LifecycleMarker::from_fields(&episode.fields);
        if let LifecycleMarker::Unrecognized(status) = &marker {
            warn!(
                work = %work,
                episode = %episode.id,
                status = %status,
                "Unrecognized episode status, treating as new"
            );
        }

        let mut fields: Record = episode.fields;
        for name in &self.stripped_fields {
            fields.remove(name);
        }

        EpisodeRecord {
            source,
            id: episode.id,
            parent_local_key: parent.clone(),
            novel_id: None,
            content: episode.content,
            fields,
            updated_at: self.now,
            operation: marker.operation(),
        }
    }
}

/// A required text field, trimmed. Scalars are accepted in their display
/// form so `title: 1984` still counts.
pub fn required_text(fields: &Fields, name: &str) -> Option<String> {
    let text = match fields.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn optional_text(fields: &Fields, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a declared work identity: an integer or a string holding one.
pub fn parse_declared_id(value: &Value) -> Result<i64, ValidationIssue> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationIssue::InvalidIdentity {
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

/// Interpret a flag. Booleans and `true`/`false`/`yes`/`no` strings are
/// understood; anything else counts as not set.
pub fn parse_flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Normalize `tags` to trimmed, non-empty strings. Never fails.
pub fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    fn scalar(value: &Value) -> Option<String> {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    match value {
        Some(text @ Value::String(_)) => scalar(text).into_iter().collect(),
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        _ => Vec::new(),
    }
}

/// Parse `created_at` from `YYYY-MM-DD` or RFC 3339, falling back to `now`.
pub fn parse_created_at(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(Value::String(text)) = value else {
        return now;
    };
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return at.with_timezone(&Utc);
    }

    debug!(value = %text, "Unparseable created_at, using current time");
    now
}

fn duplicate_episode_ids(episodes: &[EpisodeCandidate]) -> Vec<ValidationIssue> {
    let mut seen: HashMap<&str, String> = HashMap::new();
    let mut issues = Vec::new();
    for episode in episodes {
        let file = episode.file_name();
        if let Some(first) = seen.get(episode.id.as_str()) {
            issues.push(ValidationIssue::DuplicateEpisodeId {
                id: episode.id.to_string(),
                first: first.clone(),
                second: file,
            });
        } else {
            seen.insert(episode.id.as_str(), file);
        }
    }
    issues
}
