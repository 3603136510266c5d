//! # Supabase Provider
//!
//! Implements `RecordStore` over the Supabase REST interface (PostgREST).
//!
//! ## Overview
//!
//! This module provides:
//! - Batch inserts returning the created rows
//! - Point updates and deletes addressed by `column=eq.value` filters
//! - Projected listing via `select`
//! - Parsing of PostgREST error bodies into typed store errors

pub mod connector;
pub mod error;
pub mod types;

pub use connector::SupabaseConnector;
pub use error::{Result, SupabaseError};
pub use types::PostgrestError;
