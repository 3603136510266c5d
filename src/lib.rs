//! Content sync workspace.
//!
//! Hosts the `sync-content` and `validate-content` binaries and re-exports
//! the workspace crates they are assembled from.

pub use bridge_desktop;
pub use bridge_traits;
pub use core_content;
pub use core_runtime;
pub use core_sync;
pub use provider_supabase;

use bridge_traits::time::LogLevel;
use clap::Args;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

/// Logging options shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,
}

impl LogArgs {
    /// Install the global subscriber.
    pub fn init(&self) -> core_runtime::Result<()> {
        init_logging(
            LoggingConfig::default()
                .with_level(self.log_level)
                .with_format(self.log_format),
        )
    }
}
