//! Source adapters: one per external business registry.
//!
//! Each adapter reads its registry's native record shape and converts it into
//! the common [`Business`] schema. Fetch failures are fail-soft (logged, empty
//! list); normalization failures propagate.

mod alcaldia;
mod camara_comercio;
mod dane;

pub use alcaldia::{AlcaldiaAdapter, AlcaldiaLicenseRecord};
pub use camara_comercio::{CamaraComercioAdapter, CamaraComercioRecord};
pub use dane::{DaneAdapter, DaneCompanyRecord, DaneCoordinates};

use std::future::Future;

use palmira_core::Business;

use crate::error::ScraperError;

/// The three registries the pipeline aggregates, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// DANE statistical business directory (registry A).
    Dane,
    /// Cámara de Comercio de Palmira (registry B).
    CamaraComercio,
    /// Alcaldía de Palmira operating licenses (registry C).
    Alcaldia,
}

impl Source {
    /// Prefix used in [`Business::id`].
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Source::Dane => "dane",
            Source::CamaraComercio => "cc",
            Source::Alcaldia => "alc",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Source::Dane => "dane",
            Source::CamaraComercio => "camara-comercio",
            Source::Alcaldia => "alcaldia",
        })
    }
}

/// Accepts the registry route names, case-insensitively.
impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dane" => Ok(Source::Dane),
            "camara" | "camara-comercio" => Ok(Source::CamaraComercio),
            "alcaldia" => Ok(Source::Alcaldia),
            other => Err(format!(
                "invalid source '{other}'; valid sources: dane, camara, camara-comercio, alcaldia"
            )),
        }
    }
}

/// Access to one registry plus conversion to [`Business`].
pub trait SourceAdapter: Send + Sync {
    /// The registry's native record shape.
    type Record: Send;

    fn source(&self) -> Source;

    /// Reads the registry's raw records.
    fn fetch_raw(&self) -> impl Future<Output = Result<Vec<Self::Record>, ScraperError>> + Send;

    /// Converts native records to [`Business`] values, preserving order.
    /// Pure: the same input always yields the same output.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Normalization`] for a malformed record.
    fn normalize(&self, records: &[Self::Record]) -> Result<Vec<Business>, ScraperError>;

    /// Fetches and normalizes. A fetch error is logged and treated as an
    /// empty source; a normalization error propagates.
    fn update_company_data(
        &self,
    ) -> impl Future<Output = Result<Vec<Business>, ScraperError>> + Send {
        async move {
            let source = self.source();
            tracing::info!(source = %source, "updating company data");

            let records = match self.fetch_raw().await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(
                        source = %source,
                        error = %e,
                        "source fetch failed; continuing without its records"
                    );
                    Vec::new()
                }
            };

            let businesses = self.normalize(&records)?;
            tracing::debug!(source = %source, count = businesses.len(), "normalized records");
            Ok(businesses)
        }
    }
}

/// `<tag>_<native id>`; a native id that already carries the tag is kept as-is.
pub(crate) fn prefixed_id(source: Source, native_id: &str) -> String {
    let prefix = format!("{}_", source.tag());
    if native_id.starts_with(&prefix) {
        native_id.to_owned()
    } else {
        format!("{prefix}{native_id}")
    }
}

/// Fails normalization when a required text field is blank.
pub(crate) fn require(
    source: Source,
    record_id: &str,
    field: &str,
    value: &str,
) -> Result<(), ScraperError> {
    if value.trim().is_empty() {
        return Err(ScraperError::Normalization {
            source_tag: source.tag().to_owned(),
            record_id: record_id.to_owned(),
            reason: format!("{field} is empty"),
        });
    }
    Ok(())
}

/// Treats blank strings as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Returns the label of the first rule with a keyword contained in `text`
/// (case-insensitive), or `default`.
pub(crate) fn classify(
    text: &str,
    rules: &[(&[&str], &'static str)],
    default: &'static str,
) -> &'static str {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(default, |(_, label)| *label)
}
