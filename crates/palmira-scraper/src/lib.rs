//! Multi-registry business aggregation for Palmira.
//!
//! Three source adapters (DANE, Cámara de Comercio, Alcaldía) read their
//! registry's native records and normalize them into the common
//! [`palmira_core::Business`] schema. The [`Aggregator`] runs them
//! concurrently, merges cross-source duplicates by a fuzzy name and address
//! key, and returns an immutable [`ScrapingResult`].

pub mod aggregator;
pub mod client;
pub mod dedup;
pub mod error;
pub mod export;
pub mod filter;
pub mod geo;
pub mod sources;

mod rate_limit;

pub use aggregator::{
    combine_and_deduplicate, Aggregator, BySource, PalmiraAggregator, ScrapingResult,
    ScrapingStats,
};
pub use client::{Feed, SourceClient};
pub use dedup::{dedup_key, merge_businesses};
pub use error::ScraperError;
pub use export::{default_filename, persist, serialize, ResultStore};
pub use filter::BusinessFilter;
pub use sources::{
    AlcaldiaAdapter, AlcaldiaLicenseRecord, CamaraComercioAdapter, CamaraComercioRecord,
    DaneAdapter, DaneCompanyRecord, Source, SourceAdapter,
};
