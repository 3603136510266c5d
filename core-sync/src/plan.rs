//! Splitting classified records by operation.

use crate::classifier::ClassifiedWork;
use crate::records::{EpisodeOperation, EpisodeRecord, WorkOperation, WorkRecord};

/// Works grouped by operation, plus every episode awaiting correlation.
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Submission order is the order works were extracted
    pub work_inserts: Vec<WorkRecord>,
    pub work_updates: Vec<WorkRecord>,
    pub work_skips: Vec<WorkRecord>,
    /// Non-draft episodes of every planned work
    pub episodes: Vec<EpisodeRecord>,
    pub drafts: usize,
}

impl SyncPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, classified: ClassifiedWork) {
        let ClassifiedWork { work, episodes } = classified;
        for episode in episodes {
            if episode.operation == EpisodeOperation::Skip {
                self.drafts += 1;
            } else {
                self.episodes.push(episode);
            }
        }
        match work.operation {
            WorkOperation::Insert => self.work_inserts.push(work),
            WorkOperation::Update => self.work_updates.push(work),
            WorkOperation::Skip => self.work_skips.push(work),
        }
    }

    pub fn work_count(&self) -> usize {
        self.work_inserts.len() + self.work_updates.len() + self.work_skips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.work_count() == 0
    }
}

impl FromIterator<ClassifiedWork> for SyncPlan {
    fn from_iter<I: IntoIterator<Item = ClassifiedWork>>(iter: I) -> Self {
        let mut plan = SyncPlan::new();
        for work in iter {
            plan.push(work);
        }
        plan
    }
}

/// Correlated episodes in the order they are sent: deletes, updates, then
/// one insert batch.
#[derive(Debug, Default)]
pub struct EpisodeBatches {
    pub deletes: Vec<EpisodeRecord>,
    pub updates: Vec<EpisodeRecord>,
    pub inserts: Vec<EpisodeRecord>,
}

impl EpisodeBatches {
    pub fn split(episodes: Vec<EpisodeRecord>) -> Self {
        let mut batches = EpisodeBatches::default();
        for episode in episodes {
            match episode.operation {
                EpisodeOperation::Delete => batches.deletes.push(episode),
                EpisodeOperation::Update => batches.updates.push(episode),
                EpisodeOperation::Insert => batches.inserts.push(episode),
                EpisodeOperation::Skip => {}
            }
        }
        batches
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.updates.len() + self.inserts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LocalKey;
    use bridge_traits::store::Record;
    use chrono::Utc;
    use core_content::EpisodeId;
    use serde_json::json;

    fn work(title: &str, operation: WorkOperation) -> WorkRecord {
        WorkRecord {
            source: title.to_string(),
            local_key: LocalKey::Title(title.to_string()),
            remote_id: None,
            title: title.to_string(),
            author: "B".to_string(),
            summary: None,
            genre: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            operation,
        }
    }

    fn episode(id: i64, operation: EpisodeOperation) -> EpisodeRecord {
        EpisodeRecord {
            source: format!("{:03}.md", id),
            id: EpisodeId::from_value(&json!(id)).unwrap(),
            parent_local_key: LocalKey::Title("A".to_string()),
            novel_id: None,
            content: String::new(),
            fields: Record::new(),
            updated_at: Utc::now(),
            operation,
        }
    }

    #[test]
    fn test_plan_groups_works_and_drops_drafts() {
        let plan: SyncPlan = vec![
            ClassifiedWork {
                work: work("A", WorkOperation::Insert),
                episodes: vec![
                    episode(1, EpisodeOperation::Insert),
                    episode(2, EpisodeOperation::Skip),
                ],
            },
            ClassifiedWork {
                work: work("B", WorkOperation::Skip),
                episodes: vec![episode(3, EpisodeOperation::Delete)],
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(plan.work_inserts.len(), 1);
        assert_eq!(plan.work_skips.len(), 1);
        assert_eq!(plan.work_count(), 2);
        assert_eq!(plan.episodes.len(), 2);
        assert_eq!(plan.drafts, 1);
    }

    #[test]
    fn test_episode_batches_split() {
        let batches = EpisodeBatches::split(vec![
            episode(1, EpisodeOperation::Insert),
            episode(2, EpisodeOperation::Update),
            episode(3, EpisodeOperation::Delete),
            episode(4, EpisodeOperation::Insert),
        ]);
        assert_eq!(batches.deletes.len(), 1);
        assert_eq!(batches.updates.len(), 1);
        assert_eq!(batches.inserts.len(), 2);
        assert_eq!(batches.len(), 4);
    }
}
