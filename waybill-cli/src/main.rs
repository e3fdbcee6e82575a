//! waybill - Stamp, lay out and bundle railway waybill PDFs.

mod cli;

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use waybill::config::Config;
use waybill::error::WaybillError;
use waybill::output::{OutputFormatter, display_report};
use waybill::report::RunReport;
use waybill::scenario;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "waybill=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialisation (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), WaybillError> {
    let config = cli.to_config()?;
    let formatter = OutputFormatter::from_config(&config);

    if cli.command == Command::Backgrounds {
        list_backgrounds(&config, &formatter)?;
        return Ok(());
    }

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", waybill::NAME, waybill::VERSION));
        if let Some(background) = config.background.path() {
            formatter.detail("Background", &background.display().to_string());
        }
        if config.dry_run {
            formatter.info("Dry run: nothing will be written");
        }
    }

    let report = run_scenario(cli.command, &config).await?;

    if cli.json {
        let json = report.to_json().map_err(anyhow::Error::from)?;
        println!("{json}");
    } else {
        display_report(&formatter, &report);
    }

    Ok(())
}

async fn run_scenario(command: Command, config: &Config) -> Result<RunReport, WaybillError> {
    match command {
        Command::TwoSided => scenario::run_two_sided(config).await,
        Command::OneSided => scenario::run_one_sided(config).await,
        Command::Merge => scenario::run_merge(config).await,
        Command::Backgrounds => Err(WaybillError::other("backgrounds is not a scenario")),
    }
}

fn list_backgrounds(config: &Config, formatter: &OutputFormatter) -> Result<(), WaybillError> {
    let candidates = config.background_candidates()?;
    if candidates.is_empty() {
        formatter.warning(&format!(
            "No backgrounds found in {}",
            config.template_dir.display()
        ));
        return Ok(());
    }

    formatter.section(&format!("Backgrounds in {}", config.template_dir.display()));
    for (index, path) in candidates.iter().enumerate() {
        formatter.list_item(index + 1, &waybill::utils::file_name_of(path));
    }
    Ok(())
}
