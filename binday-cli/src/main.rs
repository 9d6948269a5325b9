//! Command line tool that looks up household bin collections and writes them to an iCalendar file.
//!
//! Exits with a failure status when the lookup fails or yields no dates, so a scheduled job
//! only commits the calendar after a good run.

mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use binday_core::{
    AddressQuery, BinCollection, BindayService, CalendarOptions, plugin::PluginRegistry,
    render_calendar, write_calendar,
};
use binday_provider_bolton as bolton;
use chrono::Utc;
use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .init();

    match run(&cli).await {
        Ok(0) => {
            log::error!("No dates found.");
            ExitCode::FAILURE
        }
        Ok(count) => {
            log::info!("Exported {count} collection(s)");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Look up the household and write the calendar; returns the number of events written.
async fn run(cli: &Cli) -> Result<usize> {
    let query = AddressQuery::new(&cli.postcode, &cli.house_number)?;

    let plugins = vec![bolton::plugin(cli.browser_options())];
    let registry = Arc::new(PluginRegistry::new(plugins));
    let service = BindayService::new(registry);

    let council = cli.council_id();
    if !service.councils().iter().any(|(id, _name)| *id == council) {
        let known: Vec<String> = service
            .councils()
            .into_iter()
            .map(|(id, _name)| id.to_string())
            .collect();
        bail!(
            "Unsupported council '{council}' (available: {})",
            known.join(", ")
        );
    }

    let collections = service
        .collections_for(&council, &query)
        .await
        .context("Failed to read collection dates")?;

    if collections.is_empty() {
        return Ok(0);
    }

    export(&collections, &cli.calendar_options(), &cli.output)?;
    Ok(collections.len())
}

fn export(collections: &[BinCollection], options: &CalendarOptions, path: &Path) -> Result<()> {
    let ics = render_calendar(collections, options, Utc::now());
    write_calendar(path, &ics)
        .with_context(|| format!("Failed to write calendar to {}", path.display()))?;

    log::info!("Calendar file saved to: {}", path.display());
    Ok(())
}
