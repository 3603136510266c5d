//! # Sync Configuration Module
//!
//! Provides configuration management for the content sync tools.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `SyncConfig` instance holding the record store endpoint, credentials,
//! table names and the content tree layout. It enforces fail-fast validation
//! so a misconfigured run stops before touching the content tree or the
//! network.
//!
//! ## Required Settings
//!
//! - `store_url` - Base URL of the record store (not needed for dry runs)
//! - `service_key` - Service credential sent with every request (not needed for dry runs)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SyncConfig;
//!
//! let config = SyncConfig::builder()
//!     .store_url("https://project.supabase.co")
//!     .service_key(std::env::var("SUPABASE_SERVICE_ROLE_KEY")?)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::SyncConfig;
//!
//! // Remote runs need credentials
//! let config = SyncConfig::builder()
//!     .store_url("https://project.supabase.co")
//!     .build()
//!     .expect("Should fail - missing service key");
//! ```

use crate::error::{Error, Result};

/// Default per-work metadata file name
pub const DEFAULT_METADATA_FILE: &str = "info.yml";

/// Default per-work episode directory name
pub const DEFAULT_EPISODES_DIR: &str = "manuscript";

/// Default episode document extension
pub const DEFAULT_EPISODE_EXTENSION: &str = "md";

/// Upper bound for the request timeout, in seconds
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// File names the content tree is expected to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLayout {
    /// Metadata file inside each work directory
    pub metadata_file_name: String,

    /// Subdirectory of each work directory holding episode documents
    pub episodes_dir_name: String,

    /// Extension (without dot) of episode documents
    pub episode_extension: String,
}

impl Default for ContentLayout {
    fn default() -> Self {
        Self {
            metadata_file_name: DEFAULT_METADATA_FILE.to_string(),
            episodes_dir_name: DEFAULT_EPISODES_DIR.to_string(),
            episode_extension: DEFAULT_EPISODE_EXTENSION.to_string(),
        }
    }
}

impl ContentLayout {
    /// Validates that every name is usable as a single path component.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("Metadata file name", &self.metadata_file_name),
            ("Episodes directory name", &self.episodes_dir_name),
            ("Episode extension", &self.episode_extension),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", label)));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(Error::Config(format!(
                    "{} must be a single path component: {}",
                    label, value
                )));
            }
        }

        if self.episode_extension.starts_with('.') {
            return Err(Error::Config(
                "Episode extension must not start with '.'".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for one sync run.
///
/// Use [`SyncConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct SyncConfig {
    /// Base URL of the record store
    pub store_url: String,

    /// Service credential for the record store
    pub service_key: String,

    /// Table holding works
    pub novels_table: String,

    /// Table holding episodes
    pub episodes_table: String,

    /// Content tree layout
    pub layout: ContentLayout,

    /// Require works to carry an explicit `published` flag
    pub require_publication_flag: bool,

    /// Episode metadata fields never sent to the store
    pub stripped_episode_fields: Vec<String>,

    /// Transport timeout for each store request (seconds)
    pub request_timeout_secs: u64,

    /// Plan the run without issuing remote calls
    pub dry_run: bool,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("store_url", &self.store_url)
            .field("service_key", &"[REDACTED]")
            .field("novels_table", &self.novels_table)
            .field("episodes_table", &self.episodes_table)
            .field("layout", &self.layout)
            .field("require_publication_flag", &self.require_publication_flag)
            .field("stripped_episode_fields", &self.stripped_episode_fields)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl SyncConfig {
    /// Creates a new builder for constructing a `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Store URL and service key are present (unless dry run)
    /// - Store URL uses http or https
    /// - Table names are not empty
    /// - Layout names are usable path components
    /// - Request timeout is within 1..=600 seconds
    pub fn validate(&self) -> Result<()> {
        if !self.dry_run {
            if self.store_url.trim().is_empty() {
                return Err(Error::CapabilityMissing {
                    capability: "RecordStore".to_string(),
                    message: "No record store URL configured. \
                              Set SUPABASE_URL or pass --supabase-url."
                        .to_string(),
                });
            }
            if self.service_key.trim().is_empty() {
                return Err(Error::CapabilityMissing {
                    capability: "RecordStore".to_string(),
                    message: "No service key configured. \
                              Set SUPABASE_SERVICE_ROLE_KEY or pass --service-key."
                        .to_string(),
                });
            }
        }

        if !self.store_url.is_empty()
            && !(self.store_url.starts_with("http://") || self.store_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "Store URL must start with http:// or https://: {}",
                self.store_url
            )));
        }

        if self.novels_table.trim().is_empty() || self.episodes_table.trim().is_empty() {
            return Err(Error::Config("Table names cannot be empty".to_string()));
        }

        self.layout.validate()?;

        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than 0 seconds".to_string(),
            ));
        }

        if self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "Request timeout exceeds maximum of {} seconds",
                MAX_REQUEST_TIMEOUT_SECS
            )));
        }

        Ok(())
    }

    /// Store URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.store_url.trim_end_matches('/')
    }
}

/// Builder for constructing [`SyncConfig`] instances.
#[derive(Default)]
pub struct SyncConfigBuilder {
    store_url: Option<String>,
    service_key: Option<String>,
    novels_table: Option<String>,
    episodes_table: Option<String>,
    layout: Option<ContentLayout>,
    require_publication_flag: bool,
    stripped_episode_fields: Vec<String>,
    request_timeout_secs: Option<u64>,
    dry_run: bool,
}

impl SyncConfigBuilder {
    /// Sets the record store base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::SyncConfig;
    ///
    /// let builder = SyncConfig::builder()
    ///     .store_url("https://project.supabase.co");
    /// ```
    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = Some(url.into());
        self
    }

    /// Sets the service credential.
    pub fn service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    /// Sets the works table name. Default: `novels`
    pub fn novels_table(mut self, table: impl Into<String>) -> Self {
        self.novels_table = Some(table.into());
        self
    }

    /// Sets the episodes table name. Default: `episodes`
    pub fn episodes_table(mut self, table: impl Into<String>) -> Self {
        self.episodes_table = Some(table.into());
        self
    }

    /// Sets the content tree layout.
    pub fn layout(mut self, layout: ContentLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Requires every work to declare `published`.
    pub fn require_publication_flag(mut self, required: bool) -> Self {
        self.require_publication_flag = required;
        self
    }

    /// Adds an episode metadata field that must never reach the store.
    ///
    /// `status` is always stripped.
    pub fn strip_episode_field(mut self, field: impl Into<String>) -> Self {
        self.stripped_episode_fields.push(field.into());
        self
    }

    /// Sets the per-request timeout in seconds. Default: 30
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Enables planning without remote calls.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds the final `SyncConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if required settings are missing or any value fails
    /// [`SyncConfig::validate`].
    pub fn build(self) -> Result<SyncConfig> {
        let mut stripped_episode_fields = vec!["status".to_string()];
        for field in self.stripped_episode_fields {
            if !stripped_episode_fields.contains(&field) {
                stripped_episode_fields.push(field);
            }
        }

        let config = SyncConfig {
            store_url: self.store_url.unwrap_or_default().trim().to_string(),
            service_key: self.service_key.unwrap_or_default(),
            novels_table: self.novels_table.unwrap_or_else(|| "novels".to_string()),
            episodes_table: self
                .episodes_table
                .unwrap_or_else(|| "episodes".to_string()),
            layout: self.layout.unwrap_or_default(),
            require_publication_flag: self.require_publication_flag,
            stripped_episode_fields,
            request_timeout_secs: self.request_timeout_secs.unwrap_or(30),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}
