//! Record Store Abstraction
//!
//! The remote relational store the reconciliation engine writes to. Every
//! method is a single request with per-call atomicity; nothing spans calls.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::BridgeError;

/// A single row as sent to or returned by the store.
pub type Record = Map<String, Value>;

/// Column/value pair selecting exactly one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordKey {
    pub column: String,
    pub value: Value,
}

impl RecordKey {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// The key value rendered for use in a filter expression.
    pub fn value_str(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.column, self.value_str())
    }
}

/// Failures reported by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store answered and refused the call.
    #[error("store rejected request (status {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
        hint: Option<String>,
        details: Option<String>,
    },

    /// A point-wise update matched nothing.
    #[error("no record in '{table}' matches {key}")]
    NoMatchingRecord { table: String, key: String },

    /// The store answered with a body that could not be interpreted.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// The request never completed.
    #[error(transparent)]
    Transport(#[from] BridgeError),
}

impl StoreError {
    /// HTTP-style status code, when the store produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Record store client
///
/// # Ordering contract
///
/// `create` returns the created rows in the same order the records were
/// submitted. Callers relying on this still verify it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::store::{RecordKey, RecordStore};
///
/// async fn rename(store: &dyn RecordStore) -> StoreResult<()> {
///     let mut row = Record::new();
///     row.insert("title".into(), "New title".into());
///     store.update_one("novels", &RecordKey::new("id", 7), row).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a batch of records, returning the created rows with assigned
    /// identities.
    ///
    /// A record whose primary key already exists is merged into that row
    /// instead of being rejected, so re-sending a batch is harmless.
    async fn create(&self, table: &str, records: Vec<Record>) -> StoreResult<Vec<Record>>;

    /// Update the single row matching `key`.
    async fn update_one(&self, table: &str, key: &RecordKey, record: Record)
        -> StoreResult<Record>;

    /// Delete the single row matching `key`.
    async fn delete_one(&self, table: &str, key: &RecordKey) -> StoreResult<()>;

    /// List rows, projecting the given columns (all columns when empty).
    async fn list(&self, table: &str, columns: &[String]) -> StoreResult<Vec<Record>>;
}
