//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the content sync tools:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other crate reads its settings from [`config::SyncConfig`] and logs
//! through `tracing`; the binaries call [`logging::init_logging`] once at
//! startup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ContentLayout, SyncConfig, SyncConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
