//! Cámara de Comercio de Palmira mercantile registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use palmira_core::{Business, BusinessStatus, ZoneRegistry};
use serde::Deserialize;

use super::{classify, non_blank, prefixed_id, require, Source, SourceAdapter};
use crate::client::{Feed, SourceClient};
use crate::error::ScraperError;
use crate::geo::approximate_coordinates;

const ACTIVITY_CATEGORIES: &[(&[&str], &str)] = &[
    (&["distribu", "comercio"], "Comercio"),
    (&["turístic", "turistic", "alojamiento"], "Turismo"),
    (&["panader", "aliment"], "Alimentación"),
    (&["servicio"], "Servicios"),
];

/// One company from the mercantile registry, as published.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CamaraComercioRecord {
    pub id: String,
    pub razon_social: String,
    pub direccion: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sitio_web: Option<String>,
    pub actividad_economica: String,
    #[serde(default)]
    pub fecha_matricula: Option<String>,
    /// `ACTIVA`, `INACTIVA` or `CANCELADA`.
    pub estado_matricula: String,
}

pub struct CamaraComercioAdapter {
    client: SourceClient,
    feed: Feed,
    zones: Arc<ZoneRegistry>,
}

impl CamaraComercioAdapter {
    #[must_use]
    pub fn new(client: SourceClient, feed: Feed, zones: Arc<ZoneRegistry>) -> Self {
        Self {
            client,
            feed,
            zones,
        }
    }

    /// Registered companies whose economic activity contains `sector`
    /// (case-insensitive). A fetch failure yields an empty list.
    pub async fn companies_by_sector(&self, sector: &str) -> Vec<CamaraComercioRecord> {
        let needle = sector.to_lowercase();
        self.fetch_or_empty()
            .await
            .into_iter()
            .filter(|c| c.actividad_economica.to_lowercase().contains(&needle))
            .collect()
    }

    async fn fetch_or_empty(&self) -> Vec<CamaraComercioRecord> {
        self.fetch_raw().await.unwrap_or_else(|e| {
            tracing::warn!(source = %Source::CamaraComercio, error = %e, "registry fetch failed");
            Vec::new()
        })
    }

    fn normalize_one(&self, record: &CamaraComercioRecord) -> Result<Business, ScraperError> {
        let id = prefixed_id(Source::CamaraComercio, record.id.trim());
        require(Source::CamaraComercio, &id, "id", &record.id)?;
        require(Source::CamaraComercio, &id, "razonSocial", &record.razon_social)?;

        let zone = self.zones.resolve_or_fallback(&record.direccion);
        let (latitude, longitude) =
            approximate_coordinates(zone, Source::CamaraComercio.tag(), &id);

        let activity = record.actividad_economica.trim();
        let mut tags = BTreeSet::from(["camara-comercio".to_owned(), "registrada".to_owned()]);
        let mut products_services = BTreeSet::new();
        if let Some(activity) = non_blank(Some(activity)) {
            if let Some(first_word) = activity.split_whitespace().next() {
                tags.insert(first_word.to_lowercase());
            }
            products_services.insert(activity);
        }

        Ok(Business {
            id,
            name: record.razon_social.trim().to_owned(),
            address: record.direccion.trim().to_owned(),
            phone: non_blank(record.telefono.as_deref()).unwrap_or_default(),
            website: non_blank(record.sitio_web.as_deref()).unwrap_or_default(),
            category: classify(activity, ACTIVITY_CATEGORIES, "Otros").to_owned(),
            rating: 0.0,
            reviews: 0,
            description: format!("Empresa registrada en Cámara de Comercio - {activity}"),
            tags,
            owner_name: None,
            founding_date: non_blank(record.fecha_matricula.as_deref()),
            employee_count: None,
            annual_revenue: None,
            products_services,
            status: registration_status(&record.estado_matricula),
            zone_id: zone.id.clone(),
            latitude,
            longitude,
        })
    }
}

impl SourceAdapter for CamaraComercioAdapter {
    type Record = CamaraComercioRecord;

    fn source(&self) -> Source {
        Source::CamaraComercio
    }

    async fn fetch_raw(&self) -> Result<Vec<CamaraComercioRecord>, ScraperError> {
        self.client.fetch_records(&self.feed).await
    }

    fn normalize(&self, records: &[CamaraComercioRecord]) -> Result<Vec<Business>, ScraperError> {
        records.iter().map(|r| self.normalize_one(r)).collect()
    }
}

/// Only an `ACTIVA` registration counts as active; `INACTIVA`, `CANCELADA`
/// and anything unrecognised are closed.
fn registration_status(estado: &str) -> BusinessStatus {
    if estado.trim().eq_ignore_ascii_case("ACTIVA") {
        BusinessStatus::Active
    } else {
        BusinessStatus::Closed
    }
}
