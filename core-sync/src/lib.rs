//! # Sync & Validation Module
//!
//! Reconciles an authored content tree against the remote record store.
//!
//! ## Overview
//!
//! A run reads works and episodes from the tree, decides per record whether
//! it is inserted, updated, deleted or left alone, writes the works, maps the
//! identities the store assigned back onto the episodes, and then writes the
//! episodes. The same tree can also be validated without any remote calls.
//!
//! ## Components
//!
//! - **Records** (`records`): classified work/episode records and their store payloads
//! - **Classifier** (`classifier`): flag and lifecycle rules, field normalization
//! - **Plan** (`plan`): records grouped by operation
//! - **Correlator** (`correlator`): local key to remote identity mapping
//! - **Run State Machine** (`run`): run phases with validated transitions
//! - **Sync Coordinator** (`coordinator`): the reconciliation driver
//! - **Validator** (`validation`): offline checks of a content tree

pub mod classifier;
pub mod coordinator;
pub mod correlator;
pub mod error;
pub mod plan;
pub mod records;
pub mod run;
pub mod validation;

pub use classifier::{
    normalize_tags, parse_created_at, parse_flag, Classification, ClassifiedWork,
    LifecycleMarker, OperationClassifier,
};
pub use coordinator::{SyncCoordinator, SyncReport};
pub use correlator::{CorrelatedEpisodes, IdentityMap, InsertCorrelation};
pub use error::{Result, SyncError, ValidationIssue};
pub use plan::{EpisodeBatches, SyncPlan};
pub use records::{EpisodeOperation, EpisodeRecord, LocalKey, WorkOperation, WorkRecord};
pub use run::{RunId, RunOutcome, RunPhase, RunStats, SyncRun};
pub use validation::{ContentValidator, Finding, Severity, ValidationReport};
