//! Reconcile a content tree with the Supabase tables.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use novel_sync_workspace::bridge_desktop::ReqwestHttpClient;
use novel_sync_workspace::core_runtime::config::SyncConfig;
use novel_sync_workspace::core_sync::SyncCoordinator;
use novel_sync_workspace::provider_supabase::SupabaseConnector;
use novel_sync_workspace::LogArgs;

/// Push works and episodes from a content tree to Supabase.
#[derive(Parser)]
#[command(name = "sync-content", version, about)]
struct Cli {
    /// Root of the content tree
    data_dir: PathBuf,

    /// Plan and log the run without calling the store
    #[arg(long)]
    dry_run: bool,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", default_value = "")]
    supabase_url: String,

    /// Supabase service role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", default_value = "", hide_env_values = true)]
    service_key: String,

    /// Works table
    #[arg(long, default_value = "novels")]
    novels_table: String,

    /// Episodes table
    #[arg(long, default_value = "episodes")]
    episodes_table: String,

    /// Require every work to declare `published`
    #[arg(long)]
    require_published: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.log.init() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let config = SyncConfig::builder()
        .store_url(cli.supabase_url)
        .service_key(cli.service_key)
        .novels_table(cli.novels_table)
        .episodes_table(cli.episodes_table)
        .require_publication_flag(cli.require_published)
        .request_timeout_secs(cli.timeout_secs)
        .dry_run(cli.dry_run)
        .build()
        .context("Invalid configuration")?;

    let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(
        config.request_timeout_secs,
    ))
    .context("Failed to build HTTP client")?;
    let store = SupabaseConnector::new(Arc::new(http_client), &config);

    let coordinator = SyncCoordinator::new(config, Arc::new(store));
    let report = coordinator
        .run(&cli.data_dir)
        .await
        .with_context(|| format!("Cannot sync {}", cli.data_dir.display()))?;

    if report.is_success() {
        if report.stats().total_mutations() == 0 && !report.run.dry_run {
            info!("Nothing to sync");
        }
        Ok(true)
    } else {
        if let Some(e) = &report.error {
            error!(phase = %report.run.phase, "Sync aborted: {}", e);
        }
        Ok(false)
    }
}
