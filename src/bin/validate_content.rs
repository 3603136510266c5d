//! Check a content tree offline.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use novel_sync_workspace::core_sync::{ContentValidator, ValidationReport};
use novel_sync_workspace::LogArgs;

/// Validate works and episodes without contacting the store.
#[derive(Parser)]
#[command(name = "validate-content", version, about)]
struct Cli {
    /// Root of the content tree
    data_dir: PathBuf,

    /// Require every work to declare `published`
    #[arg(long)]
    require_published: bool,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.log.init() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(report) if report.is_valid() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ValidationReport> {
    let report = ContentValidator::default()
        .require_publication_flag(cli.require_published)
        .validate(&cli.data_dir)
        .with_context(|| format!("Cannot validate {}", cli.data_dir.display()))?;

    print_report(&report);
    Ok(report)
}

fn print_report(report: &ValidationReport) {
    println!(
        "Checked {} works, {} episodes",
        report.works_checked, report.episodes_checked
    );

    if !report.errors.is_empty() {
        println!("\nErrors ({}):", report.errors.len());
        for finding in &report.errors {
            println!("  {}", finding);
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for finding in &report.warnings {
            println!("  {}", finding);
        }
    }

    if report.is_valid() {
        info!("Content is valid");
    } else {
        error!(errors = report.errors.len(), "Content is invalid");
    }
}
