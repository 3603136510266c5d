//! # Sync Coordinator
//!
//! Drives one reconciliation run of a content tree against the record store.
//!
//! ## Workflow
//!
//! 1. Extract work candidates lazily from the tree
//! 2. Classify each work and its episodes as it is read
//! 3. Split works by operation
//! 4. Insert new works in one batch, update flagged works one at a time
//! 5. Correlate returned identities onto episodes
//! 6. Delete, then update, then batch-insert episodes
//! 7. Report
//!
//! Every remote call is awaited before the next is issued. The first
//! failed call ends the run: nothing is retried and nothing already written
//! is rolled back. In dry-run mode steps 4 and 6 only log what they would
//! send.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncCoordinator;
//! use std::sync::Arc;
//!
//! let coordinator = SyncCoordinator::new(config, Arc::new(connector));
//! let report = coordinator.run(Path::new("data")).await?;
//! if !report.is_success() {
//!     std::process::exit(1);
//! }
//! ```

use bridge_traits::store::{Record, RecordKey, RecordStore, StoreError};
use bridge_traits::time::{Clock, SystemClock};
use core_content::{ContentExtractor, ContentTree};
use core_runtime::config::SyncConfig;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::classifier::{Classification, OperationClassifier};
use crate::correlator::IdentityMap;
use crate::plan::{EpisodeBatches, SyncPlan};
use crate::records::{EpisodeRecord, WorkRecord, ID_COLUMN};
use crate::run::{RunOutcome, RunPhase, RunStats, SyncRun};
use crate::{Result, SyncError};

/// Records of a rejected batch included in the diagnostic dump.
const DIAGNOSTIC_SAMPLE: usize = 3;
/// Longest field value echoed in the diagnostic dump.
const DIAGNOSTIC_VALUE_CHARS: usize = 120;

/// Result of a finished run.
#[derive(Debug)]
pub struct SyncReport {
    pub run: SyncRun,
    /// The failure that ended the run
    pub error: Option<SyncError>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.run.is_success()
    }

    pub fn outcome(&self) -> RunOutcome {
        self.run.outcome.unwrap_or(RunOutcome::Failure)
    }

    pub fn stats(&self) -> &RunStats {
        &self.run.stats
    }
}

/// Reconciliation driver
pub struct SyncCoordinator {
    config: SyncConfig,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl SyncCoordinator {
    pub fn new(config: SyncConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used to stamp records.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run a full reconciliation of the tree at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run cannot start (missing root).
    /// Failures during the run are reported through [`SyncReport`].
    #[instrument(skip(self, root), fields(root = %root.display(), dry_run = self.config.dry_run))]
    pub async fn run(&self, root: &Path) -> Result<SyncReport> {
        let tree = ContentTree::open(root, self.config.layout.clone())?;
        let classifier = OperationClassifier::new(&self.config, self.clock.as_ref());
        let mut run = SyncRun::new(classifier.now(), self.config.dry_run);

        info!(run_id = %run.id, "Starting sync");

        match self.execute(&tree, &classifier, &mut run).await {
            Ok(()) => {
                let run = run.complete(self.clock.now())?;
                log_summary(&run);
                Ok(SyncReport { run, error: None })
            }
            Err(e) => {
                error!(run_id = %run.id, phase = %run.phase, error = %e, "Sync failed");
                let run = run.fail(e.to_string(), self.clock.now())?;
                Ok(SyncReport {
                    run,
                    error: Some(e),
                })
            }
        }
    }

    async fn execute(
        &self,
        tree: &ContentTree,
        classifier: &OperationClassifier,
        run: &mut SyncRun,
    ) -> Result<()> {
        let extractor = ContentExtractor::new(tree.clone());
        let mut units = extractor.extract()?;

        run.advance(RunPhase::Classify)?;
        let mut plan = SyncPlan::new();
        for unit in units.by_ref() {
            match classifier.classify(unit) {
                Classification::Ready(work) => plan.push(work),
                Classification::Unpublished { work } => {
                    warn!(work = %work, "Skipping unpublished work");
                    run.stats.works_unpublished += 1;
                }
                Classification::Invalid { work, issues } => {
                    for issue in &issues {
                        error!(work = %work, issue = %issue, "Invalid work, skipping it and its episodes");
                    }
                    run.stats.works_invalid += 1;
                }
            }
        }
        let extraction = units.stats();
        run.stats.works_seen = extraction.works_seen;
        run.stats.works_skipped = extraction.works_skipped;
        run.stats.episodes_dropped = extraction.episodes_dropped;

        run.advance(RunPhase::SplitByOperation)?;
        run.stats.episodes_drafts = plan.drafts;
        if plan.is_empty() {
            warn!("No valid works found to sync");
        }
        info!(
            inserts = plan.work_inserts.len(),
            updates = plan.work_updates.len(),
            unchanged = plan.work_skips.len(),
            episodes = plan.episodes.len(),
            drafts = plan.drafts,
            "Planned work operations"
        );

        run.advance(RunPhase::MutateWorks)?;
        let mut identities = IdentityMap::new();
        self.mutate_works(&plan, &mut identities, &mut run.stats)
            .await?;

        run.advance(RunPhase::CorrelateIdentities)?;
        let correlated = identities.apply(plan.episodes);
        run.stats.episodes_unmapped = correlated.unmapped.len();
        if !correlated.unmapped.is_empty() {
            warn!(
                unmapped = correlated.unmapped.len(),
                "Episodes excluded because their work has no remote identity"
            );
        }

        run.advance(RunPhase::MutateEpisodes)?;
        self.mutate_episodes(EpisodeBatches::split(correlated.mapped), &mut run.stats)
            .await?;

        run.advance(RunPhase::Report)?;
        Ok(())
    }

    async fn mutate_works(
        &self,
        plan: &SyncPlan,
        identities: &mut IdentityMap,
        stats: &mut RunStats,
    ) -> Result<()> {
        let table = self.config.novels_table.as_str();

        if plan.work_inserts.is_empty() {
            warn!(table, "No data to insert");
        } else if self.config.dry_run {
            for work in &plan.work_inserts {
                info!(table, work = %work.source, title = %work.title, "Dry run: would insert work");
            }
        } else {
            let payload: Vec<Record> = plan.work_inserts.iter().map(WorkRecord::payload).collect();
            let created = self.create_batch(table, payload).await?;
            let correlation = identities.record_inserted(&plan.work_inserts, &created);
            stats.works_inserted = plan.work_inserts.len();
            stats.works_unmapped = correlation.unmapped;
        }

        for work in &plan.work_updates {
            let Some(id) = work.remote_id else {
                continue;
            };
            if self.config.dry_run {
                info!(table, work = %work.source, id, "Dry run: would update work");
            } else {
                self.update_record(table, RecordKey::new(ID_COLUMN, id), work.payload())
                    .await?;
                stats.works_updated += 1;
            }
            identities.record_existing(&work.local_key, id);
        }

        for work in &plan.work_skips {
            let Some(id) = work.remote_id else {
                continue;
            };
            debug!(work = %work.source, id, "Work already synced");
            identities.record_existing(&work.local_key, id);
            stats.works_unchanged += 1;
        }

        Ok(())
    }

    async fn mutate_episodes(&self, batches: EpisodeBatches, stats: &mut RunStats) -> Result<()> {
        let table = self.config.episodes_table.as_str();
        let EpisodeBatches {
            deletes,
            updates,
            inserts,
        } = batches;

        for episode in &deletes {
            let key = episode_key(episode);
            if self.config.dry_run {
                info!(table, key = %key, "Dry run: would delete episode");
                continue;
            }
            self.delete_record(table, key).await?;
            stats.episodes_deleted += 1;
        }

        for episode in &updates {
            let key = episode_key(episode);
            if self.config.dry_run {
                info!(table, key = %key, "Dry run: would update episode");
                continue;
            }
            self.update_record(table, key, episode.payload()).await?;
            stats.episodes_updated += 1;
        }

        if inserts.is_empty() {
            warn!(table, "No data to insert");
        } else if self.config.dry_run {
            for episode in &inserts {
                info!(
                    table,
                    episode = %episode.id,
                    novel_id = ?episode.novel_id,
                    "Dry run: would insert episode"
                );
            }
        } else {
            let payload: Vec<Record> = inserts.iter().map(EpisodeRecord::payload).collect();
            self.create_batch(table, payload).await?;
            stats.episodes_inserted = inserts.len();
        }

        Ok(())
    }

    async fn create_batch(&self, table: &str, records: Vec<Record>) -> Result<Vec<Record>> {
        let total = records.len();
        let sample: Vec<Record> = records.iter().take(DIAGNOSTIC_SAMPLE).cloned().collect();

        info!(table, count = total, "Inserting records");
        match self.store.create(table, records).await {
            Ok(created) => {
                info!(table, count = created.len(), "Inserted records");
                Ok(created)
            }
            Err(e) => {
                log_rejection(table, &e, &sample, total);
                Err(SyncError::remote("create", table, e))
            }
        }
    }

    async fn update_record(&self, table: &str, key: RecordKey, record: Record) -> Result<Record> {
        let sample = [record.clone()];

        debug!(table, key = %key, "Updating record");
        match self.store.update_one(table, &key, record).await {
            Ok(updated) => {
                info!(table, key = %key, "Updated record");
                Ok(updated)
            }
            Err(e) => {
                log_rejection(table, &e, &sample, 1);
                Err(SyncError::remote("update", table, e))
            }
        }
    }

    async fn delete_record(&self, table: &str, key: RecordKey) -> Result<()> {
        debug!(table, key = %key, "Deleting record");
        match self.store.delete_one(table, &key).await {
            Ok(()) => {
                info!(table, key = %key, "Deleted record");
                Ok(())
            }
            Err(e) => {
                log_rejection(table, &e, &[], 0);
                error!(table, key = %key, "Delete failed");
                Err(SyncError::remote("delete", table, e))
            }
        }
    }
}

fn episode_key(episode: &EpisodeRecord) -> RecordKey {
    RecordKey::new(ID_COLUMN, episode.id.value().clone())
}

fn log_summary(run: &SyncRun) {
    let stats = &run.stats;
    info!(
        run_id = %run.id,
        dry_run = run.dry_run,
        works_seen = stats.works_seen,
        works_inserted = stats.works_inserted,
        works_updated = stats.works_updated,
        works_unchanged = stats.works_unchanged,
        works_skipped = stats.works_skipped + stats.works_invalid + stats.works_unpublished,
        episodes_inserted = stats.episodes_inserted,
        episodes_updated = stats.episodes_updated,
        episodes_deleted = stats.episodes_deleted,
        episodes_unmapped = stats.episodes_unmapped,
        duration_ms = run.duration_ms().unwrap_or(0),
        "Sync completed"
    );
}

/// Log a failed call together with the first records that were sent.
fn log_rejection(table: &str, err: &StoreError, sample: &[Record], total: usize) {
    match err {
        StoreError::Rejected {
            status,
            message,
            code,
            hint,
            details,
        } => error!(
            table,
            status,
            message = %message,
            code = code.as_deref().unwrap_or("-"),
            hint = hint.as_deref().unwrap_or("-"),
            details = details.as_deref().unwrap_or("-"),
            "Store rejected request"
        ),
        other => error!(table, error = %other, "Store request failed"),
    }

    for (index, record) in sample.iter().enumerate() {
        let position = index + 1;
        let sent = Value::Object(record.clone());
        error!(table, record = position, "Data sent: {}", sent);
        for (field, value) in record {
            error!(
                record = position,
                field = %field,
                kind = json_type(value),
                value = %preview(value),
                "Field type"
            );
        }
    }
    if total > sample.len() {
        error!(table, "... and {} more records", total - sample.len());
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > DIAGNOSTIC_VALUE_CHARS {
        let cut: String = text.chars().take(DIAGNOSTIC_VALUE_CHARS).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type(&json!(null)), "null");
        assert_eq!(json_type(&json!(1)), "integer");
        assert_eq!(json_type(&json!(1.5)), "float");
        assert_eq!(json_type(&json!("x")), "string");
        assert_eq!(json_type(&json!([1])), "array");
        assert_eq!(json_type(&json!({"a": 1})), "object");
        assert_eq!(json_type(&json!(false)), "boolean");
    }

    #[test]
    fn test_rejection_dump_accepts_partial_sample() {
        let record = match json!({"id": 1, "content": "x".repeat(300)}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = StoreError::Rejected {
            status: 409,
            message: "duplicate key value".to_string(),
            code: Some("23505".to_string()),
            hint: None,
            details: None,
        };
        log_rejection("episodes", &err, &[record], 5);
        log_rejection("episodes", &StoreError::InvalidResponse("empty".to_string()), &[], 0);
    }

    #[test]
    fn test_preview_truncates_long_values() {
        let long = "x".repeat(500);
        let shown = preview(&json!(long));
        assert_eq!(shown.chars().count(), DIAGNOSTIC_VALUE_CHARS + 3);
        assert_eq!(preview(&json!(42)), "42");
    }
}
