//! `scrape` command handler.
//!
//! Runs a full or incremental aggregation, then applies the requested source
//! projection and filters before printing or persisting the result.

use std::path::Path;
use std::sync::Arc;

use palmira_core::{AppConfig, Business, ZoneRegistry};
use palmira_scraper::{persist, serialize, BusinessFilter, PalmiraAggregator, ScrapingResult};
use serde::Deserialize;

use crate::store::DirectoryStore;
use crate::ScrapeArgs;

/// Shapes accepted for the `--existing` file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExistingFile {
    Businesses(Vec<Business>),
    Snapshot(Box<ScrapingResult>),
}

/// Reads known businesses from a JSON array or from a previously saved
/// result (its `combined` list).
pub(crate) fn load_existing(path: &Path) -> anyhow::Result<Vec<Business>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let parsed: ExistingFile = serde_json::from_str(&raw).map_err(|e| {
        anyhow::anyhow!(
            "{} is neither a business array nor a saved result: {e}",
            path.display()
        )
    })?;
    Ok(match parsed {
        ExistingFile::Businesses(businesses) => businesses,
        ExistingFile::Snapshot(result) => result.combined,
    })
}

/// Source projection first, then filters, matching the order the route layer
/// applied them.
pub(crate) fn shape_result(result: ScrapingResult, args: &ScrapeArgs) -> ScrapingResult {
    let result = match args.source {
        Some(source) => result.project_source(source),
        None => result,
    };
    BusinessFilter {
        zone: args.zone.clone(),
        category: args.category.clone(),
        status: args.status,
    }
    .apply(result)
}

/// # Errors
///
/// Returns an error if the existing file cannot be read, any source fails
/// normalization, or persistence fails. Source fetch failures are logged and
/// leave that source's bucket empty.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    zones: Arc<ZoneRegistry>,
    args: &ScrapeArgs,
) -> anyhow::Result<()> {
    let aggregator = PalmiraAggregator::from_config(config, zones)?;

    let result = match (&args.existing, args.incremental) {
        (Some(path), true) => {
            let existing = load_existing(path)?;
            aggregator.scrape_new_data(&existing).await?
        }
        _ => aggregator.scrape_all_sources().await?,
    };
    let result = shape_result(result, args);

    tracing::info!(
        mode = if args.incremental { "incremental" } else { "full" },
        source = %args.source.map_or_else(|| "all".to_owned(), |s| s.to_string()),
        total = result.combined.len(),
        "scrape finished"
    );

    if args.save {
        let store = DirectoryStore::new(&config.output_dir);
        let filename = persist(&store, &result, args.output.as_deref())?;
        eprintln!("saved {}", config.output_dir.join(&filename).display());
    }

    println!("{}", serialize(&result)?);
    Ok(())
}
