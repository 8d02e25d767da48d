//! Fan-out over the three registries and the combined, deduplicated view.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use palmira_core::{AppConfig, Business, BusinessStatus, ZoneRegistry};
use serde::{Deserialize, Serialize};

use crate::client::{Feed, SourceClient};
use crate::dedup::{dedup_key, merge_businesses};
use crate::error::ScraperError;
use crate::sources::{AlcaldiaAdapter, CamaraComercioAdapter, DaneAdapter, Source, SourceAdapter};

/// Raw (pre-dedup) record counts per registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BySource {
    pub dane: usize,
    pub camara_comercio: usize,
    pub alcaldia: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingStats {
    pub total_companies: usize,
    pub active_companies: usize,
    pub new_companies: usize,
    pub closed_companies: usize,
    pub by_source: BySource,
}

impl ScrapingStats {
    /// Status counts over `combined`; `by_source` is taken as given.
    #[must_use]
    pub fn compute(combined: &[Business], by_source: BySource) -> Self {
        let count = |status: BusinessStatus| combined.iter().filter(|b| b.status == status).count();
        Self {
            total_companies: combined.len(),
            active_companies: count(BusinessStatus::Active),
            new_companies: count(BusinessStatus::New),
            closed_companies: count(BusinessStatus::Closed),
            by_source,
        }
    }
}

/// Snapshot of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult {
    pub dane: Vec<Business>,
    pub camara_comercio: Vec<Business>,
    pub alcaldia: Vec<Business>,
    pub combined: Vec<Business>,
    pub timestamp: DateTime<Utc>,
    pub stats: ScrapingStats,
}

impl ScrapingResult {
    /// Merges the three raw buckets and computes stats.
    #[must_use]
    pub fn from_buckets(
        dane: Vec<Business>,
        camara_comercio: Vec<Business>,
        alcaldia: Vec<Business>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let combined = combine_and_deduplicate([
            dane.as_slice(),
            camara_comercio.as_slice(),
            alcaldia.as_slice(),
        ]);
        let by_source = BySource {
            dane: dane.len(),
            camara_comercio: camara_comercio.len(),
            alcaldia: alcaldia.len(),
        };
        let stats = ScrapingStats::compute(&combined, by_source);
        Self {
            dane,
            camara_comercio,
            alcaldia,
            combined,
            timestamp,
            stats,
        }
    }

    /// The raw bucket collected from `source`.
    #[must_use]
    pub fn bucket(&self, source: Source) -> &[Business] {
        match source {
            Source::Dane => &self.dane,
            Source::CamaraComercio => &self.camara_comercio,
            Source::Alcaldia => &self.alcaldia,
        }
    }

    /// Replaces `combined` and recounts the status totals over it. The raw
    /// buckets and `by_source` are left alone.
    #[must_use]
    pub fn with_combined(mut self, combined: Vec<Business>) -> Self {
        self.stats = ScrapingStats::compute(&combined, self.stats.by_source);
        self.combined = combined;
        self
    }

    /// Drops every record whose `id` appears in `existing`, from every bucket
    /// and from `combined`. Stats are recomputed from what remains.
    #[must_use]
    pub fn without_ids(self, existing: &[Business]) -> Self {
        let known: HashSet<&str> = existing.iter().map(|b| b.id.as_str()).collect();
        let keep = |bucket: Vec<Business>| -> Vec<Business> {
            bucket
                .into_iter()
                .filter(|b| !known.contains(b.id.as_str()))
                .collect()
        };

        let dane = keep(self.dane);
        let camara_comercio = keep(self.camara_comercio);
        let alcaldia = keep(self.alcaldia);
        let combined = keep(self.combined);
        let by_source = BySource {
            dane: dane.len(),
            camara_comercio: camara_comercio.len(),
            alcaldia: alcaldia.len(),
        };
        let stats = ScrapingStats::compute(&combined, by_source);

        Self {
            dane,
            camara_comercio,
            alcaldia,
            combined,
            timestamp: self.timestamp,
            stats,
        }
    }
}

/// Merges buckets in iteration order. The first record seen for a dedup key
/// fixes its position; later duplicates are merged into it in place.
#[must_use]
pub fn combine_and_deduplicate<'a>(
    buckets: impl IntoIterator<Item = &'a [Business]>,
) -> Vec<Business> {
    let mut combined: Vec<Business> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for business in buckets.into_iter().flatten() {
        match positions.entry(dedup_key(business)) {
            Entry::Occupied(slot) => {
                let stored = &mut combined[*slot.get()];
                tracing::debug!(
                    kept = %stored.id,
                    merged = %business.id,
                    key = %slot.key(),
                    "merging duplicate business"
                );
                *stored = merge_businesses(stored, business);
            }
            Entry::Vacant(slot) => {
                slot.insert(combined.len());
                combined.push(business.clone());
            }
        }
    }

    combined
}

/// Runs the three source adapters concurrently and merges their output.
pub struct Aggregator<D, C, A> {
    dane: D,
    camara_comercio: C,
    alcaldia: A,
    source_timeout: Option<Duration>,
}

/// The aggregator over the production registry adapters.
pub type PalmiraAggregator = Aggregator<DaneAdapter, CamaraComercioAdapter, AlcaldiaAdapter>;

impl PalmiraAggregator {
    /// Builds the three adapters from `config`'s feeds, sharing one client
    /// and zone registry.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, zones: Arc<ZoneRegistry>) -> Result<Self, ScraperError> {
        let client = SourceClient::from_config(config)?;
        let aggregator = Self::new(
            DaneAdapter::new(
                client.clone(),
                Feed::parse(&config.dane_feed),
                Arc::clone(&zones),
            ),
            CamaraComercioAdapter::new(
                client.clone(),
                Feed::parse(&config.camara_feed),
                Arc::clone(&zones),
            ),
            AlcaldiaAdapter::new(client, Feed::parse(&config.alcaldia_feed), zones),
        );
        Ok(aggregator.with_source_timeout(config.source_timeout_secs.map(Duration::from_secs)))
    }
}

impl<D, C, A> Aggregator<D, C, A>
where
    D: SourceAdapter,
    C: SourceAdapter,
    A: SourceAdapter,
{
    /// No per-source timeout: a source that never answers stalls the run.
    #[must_use]
    pub fn new(dane: D, camara_comercio: C, alcaldia: A) -> Self {
        Self {
            dane,
            camara_comercio,
            alcaldia,
            source_timeout: None,
        }
    }

    /// Bounds each source's `update_company_data`. A source that exceeds the
    /// limit contributes an empty bucket.
    #[must_use]
    pub fn with_source_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.source_timeout = timeout;
        self
    }

    #[must_use]
    pub fn source_timeout(&self) -> Option<Duration> {
        self.source_timeout
    }

    /// Collects every source concurrently, waits for all of them, then merges.
    ///
    /// # Errors
    ///
    /// Any error returned by a source's `update_company_data` (in practice
    /// [`ScraperError::Normalization`]) fails the whole run; nothing partial
    /// is returned.
    pub async fn scrape_all_sources(&self) -> Result<ScrapingResult, ScraperError> {
        tracing::info!("scraping all sources");

        let (dane, camara_comercio, alcaldia) = tokio::join!(
            collect(&self.dane, self.source_timeout),
            collect(&self.camara_comercio, self.source_timeout),
            collect(&self.alcaldia, self.source_timeout),
        );
        let (dane, camara_comercio, alcaldia) = (dane?, camara_comercio?, alcaldia?);

        let result = ScrapingResult::from_buckets(dane, camara_comercio, alcaldia, Utc::now());
        tracing::info!(
            dane = result.stats.by_source.dane,
            camara_comercio = result.stats.by_source.camara_comercio,
            alcaldia = result.stats.by_source.alcaldia,
            combined = result.stats.total_companies,
            "scrape complete"
        );
        Ok(result)
    }

    /// A full run restricted to records whose `id` is not in `existing`.
    ///
    /// Identity here is the `id`, not the dedup key: a fuzzy duplicate of an
    /// existing business under a new `id` is still reported.
    ///
    /// # Errors
    ///
    /// See [`Self::scrape_all_sources`].
    pub async fn scrape_new_data(
        &self,
        existing: &[Business],
    ) -> Result<ScrapingResult, ScraperError> {
        tracing::info!(existing = existing.len(), "running incremental scrape");
        let result = self.scrape_all_sources().await?.without_ids(existing);
        tracing::info!(new = result.combined.len(), "incremental scrape complete");
        Ok(result)
    }
}

async fn collect<S: SourceAdapter>(
    adapter: &S,
    timeout: Option<Duration>,
) -> Result<Vec<Business>, ScraperError> {
    let Some(limit) = timeout else {
        return adapter.update_company_data().await;
    };

    if let Ok(result) = tokio::time::timeout(limit, adapter.update_company_data()).await {
        result
    } else {
        tracing::warn!(
            source = %adapter.source(),
            timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            "source timed out; continuing without its records"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn business(id: &str, name: &str, address: &str, status: BusinessStatus) -> Business {
        Business {
            id: id.to_owned(),
            name: name.to_owned(),
            address: address.to_owned(),
            phone: String::new(),
            website: String::new(),
            category: "Comercio".to_owned(),
            rating: 0.0,
            reviews: 0,
            description: format!("registro {id}"),
            tags: BTreeSet::new(),
            owner_name: None,
            founding_date: None,
            employee_count: None,
            annual_revenue: None,
            products_services: BTreeSet::new(),
            status,
            zone_id: "zone-centro".to_owned(),
            latitude: 3.5395,
            longitude: -76.3034,
        }
    }

    #[test]
    fn combine_keeps_first_seen_position() {
        let a = vec![
            business("dane_1", "Uno", "Calle 1", BusinessStatus::Active),
            business("dane_2", "Dos", "Calle 2", BusinessStatus::Active),
        ];
        let b = vec![
            business("cc_1", "Tres", "Calle 3", BusinessStatus::Active),
            business("cc_2", "Dos S.A.S.", "2", BusinessStatus::Closed),
        ];
        let combined = combine_and_deduplicate([a.as_slice(), b.as_slice()]);
        let ids: Vec<&str> = combined.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["dane_1", "dane_2", "cc_1"]);
        assert!(combined[1].description.ends_with("| Fuente adicional: CC"));
    }

    #[test]
    fn combine_merges_repeated_duplicates_into_one_entry() {
        let a = vec![business("dane_1", "Acme", "Calle 10", BusinessStatus::Active)];
        let b = vec![business("cc_1", "ACME LTDA", "calle 10", BusinessStatus::Active)];
        let c = vec![business("alc_1", "acme", "10", BusinessStatus::Active)];
        let combined = combine_and_deduplicate([a.as_slice(), b.as_slice(), c.as_slice()]);
        assert_eq!(combined.len(), 1);
        assert_eq!(
            combined[0].description,
            "registro dane_1 | Fuente adicional: CC | Fuente adicional: ALC"
        );
    }

    #[test]
    fn stats_count_combined_by_status_and_raw_buckets_by_source() {
        let result = ScrapingResult::from_buckets(
            vec![
                business("dane_1", "Acme", "Calle 10", BusinessStatus::Active),
                business("dane_2", "Beta", "Calle 11", BusinessStatus::Active),
            ],
            vec![business("cc_1", "Acme", "Calle 10", BusinessStatus::Closed)],
            vec![business("alc_1", "Gamma", "Calle 12", BusinessStatus::Closed)],
            Utc::now(),
        );
        assert_eq!(result.combined.len(), 3);
        assert_eq!(result.stats.total_companies, 3);
        assert_eq!(result.stats.active_companies, 2);
        assert_eq!(result.stats.closed_companies, 1);
        assert_eq!(result.stats.new_companies, 0);
        assert_eq!(
            result.stats.by_source,
            BySource {
                dane: 2,
                camara_comercio: 1,
                alcaldia: 1
            }
        );
    }

    #[test]
    fn without_ids_filters_every_bucket_and_recounts() {
        let result = ScrapingResult::from_buckets(
            vec![business("dane_1", "Acme", "Calle 10", BusinessStatus::Active)],
            vec![business("cc_1", "Beta", "Calle 11", BusinessStatus::Active)],
            vec![business("alc_1", "Gamma", "Calle 12", BusinessStatus::Closed)],
            Utc::now(),
        );
        let existing = vec![business("cc_1", "x", "y", BusinessStatus::Active)];
        let filtered = result.clone().without_ids(&existing);

        assert!(filtered.camara_comercio.is_empty());
        assert_eq!(filtered.combined.len(), 2);
        assert!(filtered.combined.iter().all(|b| b.id != "cc_1"));
        assert_eq!(filtered.stats.total_companies, 2);
        assert_eq!(filtered.stats.by_source.camara_comercio, 0);
        assert_eq!(filtered.timestamp, result.timestamp);

        assert_eq!(result.clone().without_ids(&[]), result);
    }

    #[test]
    fn serializes_with_camel_case_buckets_and_stats() {
        let result = ScrapingResult::from_buckets(Vec::new(), Vec::new(), Vec::new(), Utc::now());
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("camaraComercio").is_some());
        assert_eq!(value["stats"]["totalCompanies"], 0);
        assert_eq!(value["stats"]["bySource"]["camaraComercio"], 0);
        assert!(value["timestamp"].is_string());
    }
}
