//! # Identity Correlator
//!
//! Bridges the local key of each work to the identity the store knows it by,
//! then rewrites every episode's `novel_id`.
//!
//! Inserted works get their identity from the batch response. The store is
//! expected to answer in submission order; this is checked rather than
//! trusted: every response row must echo the submitted title, and a row
//! that does not leaves its work unmapped. Updated and skipped works already
//! declare their identity.
//!
//! The map is built once per run and consumed by [`IdentityMap::apply`].

use bridge_traits::store::Record;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, warn};

use crate::records::{EpisodeRecord, LocalKey, WorkRecord, ID_COLUMN};

/// Outcome of correlating one insert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertCorrelation {
    pub mapped: usize,
    pub unmapped: usize,
    pub surplus: usize,
}

/// Episodes split by whether their parent identity is known.
#[derive(Debug, Default)]
pub struct CorrelatedEpisodes {
    /// `novel_id` set
    pub mapped: Vec<EpisodeRecord>,
    pub unmapped: Vec<EpisodeRecord>,
}

/// One-shot `LocalKey → remote id` mapping.
#[derive(Debug, Default)]
pub struct IdentityMap {
    ids: HashMap<LocalKey, i64>,
    collisions: usize,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a work whose identity is declared in its metadata.
    pub fn record_existing(&mut self, key: &LocalKey, id: i64) {
        self.insert(key.clone(), id);
    }

    /// Zip a create response onto the submitted works.
    pub fn record_inserted(&mut self, submitted: &[WorkRecord], response: &[Record]) -> InsertCorrelation {
        let mut outcome = InsertCorrelation::default();

        if response.len() != submitted.len() {
            warn!(
                submitted = submitted.len(),
                returned = response.len(),
                "Insert response count differs from submitted works"
            );
        }

        for (position, work) in submitted.iter().enumerate() {
            let Some(row) = response.get(position) else {
                error!(
                    work = %work.source,
                    position,
                    "No insert response for work; its episodes will not be synced"
                );
                outcome.unmapped += 1;
                continue;
            };

            let echoed = row.get("title").and_then(Value::as_str);
            if echoed != Some(work.title.as_str()) {
                error!(
                    work = %work.source,
                    position,
                    expected = %work.title,
                    returned = ?echoed,
                    "Insert response does not match submitted work; leaving it unmapped"
                );
                outcome.unmapped += 1;
                continue;
            }

            match row.get(ID_COLUMN).and_then(Value::as_i64) {
                Some(id) => {
                    debug!(work = %work.source, id, "Work inserted");
                    self.insert(work.local_key.clone(), id);
                    outcome.mapped += 1;
                }
                None => {
                    error!(
                        work = %work.source,
                        position,
                        "Insert response carries no integer id; leaving work unmapped"
                    );
                    outcome.unmapped += 1;
                }
            }
        }

        if response.len() > submitted.len() {
            outcome.surplus = response.len() - submitted.len();
            warn!(surplus = outcome.surplus, "Ignoring surplus insert response rows");
        }

        outcome
    }

    pub fn get(&self, key: &LocalKey) -> Option<i64> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of keys that were recorded more than once.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Set `novel_id` on every episode whose parent is mapped.
    pub fn apply(self, episodes: Vec<EpisodeRecord>) -> CorrelatedEpisodes {
        let mut correlated = CorrelatedEpisodes::default();
        for mut episode in episodes {
            match self.ids.get(&episode.parent_local_key) {
                Some(&id) => {
                    episode.novel_id = Some(id);
                    correlated.mapped.push(episode);
                }
                None => {
                    warn!(
                        work = %episode.parent_local_key,
                        episode = %episode.id,
                        file = %episode.source,
                        "Parent work has no remote identity; episode not synced"
                    );
                    correlated.unmapped.push(episode);
                }
            }
        }
        correlated
    }

    fn insert(&mut self, key: LocalKey, id: i64) {
        if let Some(previous) = self.ids.insert(key.clone(), id) {
            self.collisions += 1;
            warn!(
                key = %key,
                previous,
                id,
                "Two works share a local key; the later one wins"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EpisodeOperation, WorkOperation};
    use chrono::Utc;
    use core_content::EpisodeId;
    use serde_json::json;

    fn work(title: &str) -> WorkRecord {
        WorkRecord {
            source: title.to_lowercase(),
            local_key: LocalKey::Title(title.to_string()),
            remote_id: None,
            title: title.to_string(),
            author: "B".to_string(),
            summary: None,
            genre: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            operation: WorkOperation::Insert,
        }
    }

    fn episode(parent: LocalKey, id: i64) -> EpisodeRecord {
        EpisodeRecord {
            source: format!("{:03}.md", id),
            id: EpisodeId::from_value(&json!(id)).unwrap(),
            parent_local_key: parent,
            novel_id: None,
            content: String::new(),
            fields: Record::new(),
            updated_at: Utc::now(),
            operation: EpisodeOperation::Insert,
        }
    }

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_positional_correlation() {
        let works = vec![work("A"), work("B")];
        let response = vec![
            row(json!({"id": 10, "title": "A"})),
            row(json!({"id": 11, "title": "B"})),
        ];

        let mut map = IdentityMap::new();
        let outcome = map.record_inserted(&works, &response);

        assert_eq!(outcome.mapped, 2);
        assert_eq!(map.get(&LocalKey::Title("A".to_string())), Some(10));
        assert_eq!(map.get(&LocalKey::Title("B".to_string())), Some(11));
    }

    #[test]
    fn test_short_response_leaves_tail_unmapped() {
        let works = vec![work("A"), work("B")];
        let response = vec![row(json!({"id": 10, "title": "A"}))];

        let mut map = IdentityMap::new();
        let outcome = map.record_inserted(&works, &response);

        assert_eq!(outcome, InsertCorrelation { mapped: 1, unmapped: 1, surplus: 0 });
        assert_eq!(map.get(&LocalKey::Title("B".to_string())), None);
    }

    #[test]
    fn test_reordered_response_is_not_trusted() {
        let works = vec![work("A"), work("B")];
        let response = vec![
            row(json!({"id": 11, "title": "B"})),
            row(json!({"id": 10, "title": "A"})),
        ];

        let mut map = IdentityMap::new();
        let outcome = map.record_inserted(&works, &response);

        assert_eq!(outcome.mapped, 0);
        assert_eq!(outcome.unmapped, 2);
        assert!(map.is_empty());
    }

    #[test]
    fn test_surplus_and_missing_id() {
        let works = vec![work("A")];
        let response = vec![
            row(json!({"id": "x", "title": "A"})),
            row(json!({"id": 99, "title": "Z"})),
        ];

        let mut map = IdentityMap::new();
        let outcome = map.record_inserted(&works, &response);

        assert_eq!(outcome, InsertCorrelation { mapped: 0, unmapped: 1, surplus: 1 });
    }

    #[test]
    fn test_apply_sets_novel_id_and_flags_orphans() {
        let mut map = IdentityMap::new();
        map.record_existing(&LocalKey::Declared(5), 5);

        let correlated = map.apply(vec![
            episode(LocalKey::Declared(5), 1),
            episode(LocalKey::Title("Missing".to_string()), 2),
        ]);

        assert_eq!(correlated.mapped.len(), 1);
        assert_eq!(correlated.mapped[0].novel_id, Some(5));
        assert_eq!(correlated.unmapped.len(), 1);
        assert_eq!(correlated.unmapped[0].novel_id, None);
    }

    #[test]
    fn test_key_collision_later_wins() {
        let mut map = IdentityMap::new();
        let key = LocalKey::Title("Same".to_string());
        map.record_existing(&key, 1);
        map.record_existing(&key, 2);

        assert_eq!(map.get(&key), Some(2));
        assert_eq!(map.collisions(), 1);
    }
}
