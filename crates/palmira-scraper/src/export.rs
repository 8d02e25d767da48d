//! JSON export of scraping results.

use chrono::{DateTime, Utc};

use crate::aggregator::ScrapingResult;
use crate::error::ScraperError;

/// Pretty-printed JSON with fields in schema order and an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`ScraperError::Serialize`] if serialization fails.
pub fn serialize(result: &ScrapingResult) -> Result<String, ScraperError> {
    serde_json::to_string_pretty(result).map_err(ScraperError::Serialize)
}

/// `palmira-businesses-<epoch-ms>.json`.
#[must_use]
pub fn default_filename(now: DateTime<Utc>) -> String {
    format!("palmira-businesses-{}.json", now.timestamp_millis())
}

/// Storage that receives serialized results. Writing is the store's concern;
/// the exporter only chooses the name and produces the bytes.
pub trait ResultStore {
    /// # Errors
    ///
    /// Returns [`ScraperError::Persist`] when the contents cannot be stored.
    fn store(&self, filename: &str, contents: &str) -> Result<(), ScraperError>;
}

/// Serializes `result` and hands it to `store`. Returns the name used.
///
/// A blank `filename` counts as absent.
///
/// # Errors
///
/// Returns [`ScraperError::Serialize`] or whatever the store reports.
pub fn persist<S: ResultStore + ?Sized>(
    store: &S,
    result: &ScrapingResult,
    filename: Option<&str>,
) -> Result<String, ScraperError> {
    let filename = filename
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| default_filename(Utc::now()), str::to_owned);
    let contents = serialize(result)?;
    store.store(&filename, &contents)?;
    tracing::info!(
        filename = %filename,
        companies = result.combined.len(),
        "scraping result persisted"
    );
    Ok(filename)
}
