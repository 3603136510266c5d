//! Error types for the Supabase provider

use bridge_traits::error::BridgeError;
use bridge_traits::store::StoreError;
use thiserror::Error;

use crate::types::PostgrestError;

/// Supabase provider errors
#[derive(Error, Debug)]
pub enum SupabaseError {
    /// The REST interface answered with a non-2xx status
    #[error("Supabase API error (status {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        code: Option<String>,
        hint: Option<String>,
        details: Option<String>,
    },

    /// A filtered update touched no row
    #[error("No row in '{table}' matches {key}")]
    NoMatchingRow { table: String, key: String },

    /// A filtered update touched more than one row
    #[error("Update of {key} in '{table}' affected {count} rows")]
    AmbiguousMatch {
        table: String,
        key: String,
        count: usize,
    },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

impl SupabaseError {
    /// Build an API error from a rejected response.
    ///
    /// PostgREST error bodies are decoded; any other body is kept verbatim
    /// as the message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<PostgrestError>(body) {
            Ok(error) if error.message.is_some() || error.code.is_some() => {
                let details = error.details_text();
                SupabaseError::ApiError {
                    status,
                    message: error
                        .message
                        .unwrap_or_else(|| "request rejected".to_string()),
                    code: error.code,
                    hint: error.hint,
                    details,
                }
            }
            _ => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                SupabaseError::ApiError {
                    status,
                    message: if text.is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        text
                    },
                    code: None,
                    hint: None,
                    details: None,
                }
            }
        }
    }
}

/// Result type for Supabase operations
pub type Result<T> = std::result::Result<T, SupabaseError>;

impl From<SupabaseError> for StoreError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::ApiError {
                status,
                message,
                code,
                hint,
                details,
            } => StoreError::Rejected {
                status,
                message,
                code,
                hint,
                details,
            },
            SupabaseError::NoMatchingRow { table, key } => {
                StoreError::NoMatchingRecord { table, key }
            }
            e @ SupabaseError::AmbiguousMatch { .. } => StoreError::InvalidResponse(e.to_string()),
            SupabaseError::ParseError(msg) => StoreError::InvalidResponse(msg),
            SupabaseError::BridgeError(e) => StoreError::Transport(e),
        }
    }
}
