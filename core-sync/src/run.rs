//! # Sync Run State Machine
//!
//! Tracks one reconciliation run through its phases with validated
//! transitions.
//!
//! ## State Machine
//!
//! ```text
//! Extract → Classify → SplitByOperation → MutateWorks
//!         → CorrelateIdentities → MutateEpisodes → Report → Success
//!
//! any phase ──────────────────────────────────────────────→ Failure
//! ```
//!
//! Phases only move forward one step at a time. `Success` is reachable only
//! from `Report`; `Failure` from any phase. Both are terminal.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::run::{RunPhase, SyncRun};
//!
//! let mut run = SyncRun::new(clock.now(), false);
//! run.advance(RunPhase::Classify)?;
//! // ...
//! run.advance(RunPhase::Report)?;
//! let run = run.complete(clock.now())?;
//! assert!(run.is_success());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, SyncError};

/// Unique identifier for a sync run, attached to every log line of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Phases of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Extract,
    Classify,
    SplitByOperation,
    MutateWorks,
    CorrelateIdentities,
    MutateEpisodes,
    Report,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Extract => "extract",
            RunPhase::Classify => "classify",
            RunPhase::SplitByOperation => "split_by_operation",
            RunPhase::MutateWorks => "mutate_works",
            RunPhase::CorrelateIdentities => "correlate_identities",
            RunPhase::MutateEpisodes => "mutate_episodes",
            RunPhase::Report => "report",
        }
    }

    /// The phase that follows this one, if any
    pub fn next(&self) -> Option<RunPhase> {
        match self {
            RunPhase::Extract => Some(RunPhase::Classify),
            RunPhase::Classify => Some(RunPhase::SplitByOperation),
            RunPhase::SplitByOperation => Some(RunPhase::MutateWorks),
            RunPhase::MutateWorks => Some(RunPhase::CorrelateIdentities),
            RunPhase::CorrelateIdentities => Some(RunPhase::MutateEpisodes),
            RunPhase::MutateEpisodes => Some(RunPhase::Report),
            RunPhase::Report => None,
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failure,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Success => "success",
            RunOutcome::Failure => "failure",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters collected over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Work directories visited by extraction
    pub works_seen: usize,
    /// Dropped by extraction (no or unreadable metadata)
    pub works_skipped: usize,
    /// Failed validation during classification
    pub works_invalid: usize,
    /// `published: false`
    pub works_unpublished: usize,
    pub works_inserted: usize,
    pub works_updated: usize,
    /// Already synced, identity declared
    pub works_unchanged: usize,
    /// Inserted works whose identity could not be correlated
    pub works_unmapped: usize,
    pub episodes_dropped: usize,
    pub episodes_drafts: usize,
    pub episodes_inserted: usize,
    pub episodes_updated: usize,
    pub episodes_deleted: usize,
    /// Excluded because the parent work has no identity
    pub episodes_unmapped: usize,
}

impl RunStats {
    /// Total remote mutations performed
    pub fn total_mutations(&self) -> usize {
        self.works_inserted
            + self.works_updated
            + self.episodes_inserted
            + self.episodes_updated
            + self.episodes_deleted
    }
}

/// One reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: RunId,
    pub phase: RunPhase,
    /// Set once the run is terminal
    pub outcome: Option<RunOutcome>,
    pub dry_run: bool,
    pub stats: RunStats,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncRun {
    /// Create a run positioned at [`RunPhase::Extract`]
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            id: RunId::new(),
            phase: RunPhase::Extract,
            outcome: None,
            dry_run,
            stats: RunStats::default(),
            error_message: None,
            started_at,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Some(RunOutcome::Success)
    }

    /// Move to the next phase
    ///
    /// # Errors
    ///
    /// Returns an error if the run is terminal or `to` is not the phase
    /// directly after the current one
    pub fn advance(&mut self, to: RunPhase) -> Result<()> {
        if let Some(outcome) = self.outcome {
            return Err(SyncError::InvalidStateTransition {
                from: outcome.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: "Run has already finished".to_string(),
            });
        }

        if self.phase.next() != Some(to) {
            return Err(SyncError::InvalidStateTransition {
                from: self.phase.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!(
                    "Cannot transition from {} to {}",
                    self.phase.as_str(),
                    to.as_str()
                ),
            });
        }

        self.phase = to;
        Ok(())
    }

    /// Finish the run successfully
    ///
    /// # Errors
    ///
    /// Returns an error unless the run is in [`RunPhase::Report`]
    pub fn complete(mut self, at: DateTime<Utc>) -> Result<Self> {
        if self.is_terminal() || self.phase != RunPhase::Report {
            return Err(SyncError::InvalidStateTransition {
                from: self.state_str().to_string(),
                to: RunOutcome::Success.as_str().to_string(),
                reason: "Run must be reporting to succeed".to_string(),
            });
        }
        self.outcome = Some(RunOutcome::Success);
        self.finished_at = Some(at);
        Ok(self)
    }

    /// Finish the run as failed
    ///
    /// # Errors
    ///
    /// Returns an error if the run is already terminal
    pub fn fail(mut self, message: impl Into<String>, at: DateTime<Utc>) -> Result<Self> {
        if self.is_terminal() {
            return Err(SyncError::InvalidStateTransition {
                from: self.state_str().to_string(),
                to: RunOutcome::Failure.as_str().to_string(),
                reason: "Run has already finished".to_string(),
            });
        }
        self.outcome = Some(RunOutcome::Failure);
        self.error_message = Some(message.into());
        self.finished_at = Some(at);
        Ok(self)
    }

    /// Wall-clock duration, once finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    fn state_str(&self) -> &'static str {
        match self.outcome {
            Some(outcome) => outcome.as_str(),
            None => self.phase.as_str(),
        }
    }
}
