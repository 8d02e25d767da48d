mod scrape;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use palmira_core::{load_zones, BusinessStatus, Environment, ZoneRegistry};
use palmira_scraper::Source;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "palmira-cli")]
#[command(about = "Palmira business registry aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate every registry and print the result as JSON
    Scrape(ScrapeArgs),
    /// List the zone registry used for address resolution
    Zones,
}

#[derive(Debug, Args)]
struct ScrapeArgs {
    /// Only report records whose id is not in the --existing file
    #[arg(long, requires = "existing")]
    incremental: bool,
    /// JSON file with known businesses: an array, or a saved result
    #[arg(long, requires = "incremental")]
    existing: Option<PathBuf>,
    /// Replace `combined` with one registry's raw records
    #[arg(long, value_parser = clap::value_parser!(Source))]
    source: Option<Source>,
    /// Keep only businesses in this zone id (exact match)
    #[arg(long)]
    zone: Option<String>,
    /// Keep only businesses whose category contains this text
    #[arg(long)]
    category: Option<String>,
    /// Keep only businesses with this status
    #[arg(long)]
    status: Option<BusinessStatus>,
    /// Persist the result under the configured output directory
    #[arg(long)]
    save: bool,
    /// File name for --save (default: palmira-businesses-<epoch-ms>.json)
    #[arg(long, requires = "save")]
    output: Option<String>,
}

/// Production logs go to collectors that do not render ANSI escapes.
fn ansi_logs(env: &Environment) -> bool {
    *env != Environment::Production
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = palmira_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi_logs(&config.env))
        .init();
    tracing::debug!(env = %config.env, "configuration loaded");

    let zones = Arc::new(match &config.zones_path {
        Some(path) => load_zones(path)?,
        None => ZoneRegistry::palmira(),
    });

    match cli.command {
        Some(Commands::Scrape(args)) => scrape::run_scrape(&config, zones, &args).await?,
        Some(Commands::Zones) => print!("{}", render_zones(&zones)),
        None => println!("palmira-cli ready; run `palmira-cli scrape` or `palmira-cli zones`"),
    }

    Ok(())
}

fn render_zones(zones: &ZoneRegistry) -> String {
    let fallback = zones.fallback().id.as_str();
    let mut out = String::new();
    for zone in zones.zones() {
        let marker = if zone.id == fallback { " (fallback)" } else { "" };
        out.push_str(&format!(
            "{:<16} {:<12} {:>9.4} {:>10.4}  hints: {}{marker}\n",
            zone.id,
            zone.name,
            zone.latitude,
            zone.longitude,
            zone.hints.join(", ")
        ));
    }
    out
}
