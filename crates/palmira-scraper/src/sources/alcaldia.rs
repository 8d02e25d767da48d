//! Alcaldía de Palmira operating-license registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use palmira_core::{Business, BusinessStatus, ZoneRegistry};
use serde::Deserialize;

use super::{classify, non_blank, prefixed_id, require, Source, SourceAdapter};
use crate::client::{Feed, SourceClient};
use crate::error::ScraperError;
use crate::geo::approximate_coordinates;

const ACTIVITY_CATEGORIES: &[(&[&str], &str)] = &[
    (&["alimenticio", "supermercado"], "Supermercado"),
    (&["restaurante", "bar"], "Restaurante"),
    (&["ferretería", "ferreteria", "construcción", "construccion"], "Ferretería"),
    (&["peluquería", "peluqueria", "estética", "estetica"], "Servicios de Belleza"),
    (&["servicio"], "Servicios"),
];

const ACTIVITY_TAGS: &[(&[&str], &str)] = &[
    (&["alimenticio"], "alimenticio"),
    (&["restaurante"], "restaurante"),
    (&["ferretería", "ferreteria"], "ferreteria"),
    (&["belleza", "peluquería", "peluqueria", "estética", "estetica"], "belleza"),
];

/// One operating license, as published.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlcaldiaLicenseRecord {
    pub id: String,
    pub nombre_establecimiento: String,
    #[serde(default)]
    pub propietario: Option<String>,
    pub direccion: String,
    #[serde(default)]
    pub telefono: Option<String>,
    pub actividad_comercial: String,
    pub numero_licencia: String,
    #[serde(default)]
    pub fecha_expedicion: Option<String>,
    #[serde(default)]
    pub fecha_vencimiento: Option<String>,
    /// `VIGENTE`, `VENCIDA` or `SUSPENDIDA`.
    pub estado: String,
    /// Free-text neighbourhood, e.g. `"La Italia"`.
    #[serde(default)]
    pub zona: String,
}

pub struct AlcaldiaAdapter {
    client: SourceClient,
    feed: Feed,
    zones: Arc<ZoneRegistry>,
}

impl AlcaldiaAdapter {
    #[must_use]
    pub fn new(client: SourceClient, feed: Feed, zones: Arc<ZoneRegistry>) -> Self {
        Self {
            client,
            feed,
            zones,
        }
    }

    /// Licenses whose `zona` contains `zone` (case-insensitive).
    /// A fetch failure yields an empty list.
    pub async fn licenses_by_zone(&self, zone: &str) -> Vec<AlcaldiaLicenseRecord> {
        let needle = zone.to_lowercase();
        self.fetch_or_empty()
            .await
            .into_iter()
            .filter(|l| l.zona.to_lowercase().contains(&needle))
            .collect()
    }

    /// Licenses with exactly the native status `status` (e.g. `"VENCIDA"`).
    /// A fetch failure yields an empty list.
    pub async fn licenses_by_status(&self, status: &str) -> Vec<AlcaldiaLicenseRecord> {
        self.fetch_or_empty()
            .await
            .into_iter()
            .filter(|l| l.estado == status)
            .collect()
    }

    async fn fetch_or_empty(&self) -> Vec<AlcaldiaLicenseRecord> {
        self.fetch_raw().await.unwrap_or_else(|e| {
            tracing::warn!(source = %Source::Alcaldia, error = %e, "registry fetch failed");
            Vec::new()
        })
    }

    fn normalize_one(&self, license: &AlcaldiaLicenseRecord) -> Result<Business, ScraperError> {
        let id = prefixed_id(Source::Alcaldia, license.id.trim());
        require(Source::Alcaldia, &id, "id", &license.id)?;
        require(
            Source::Alcaldia,
            &id,
            "nombreEstablecimiento",
            &license.nombre_establecimiento,
        )?;

        // The declared zone wins over the address; both fall back together.
        let zone = self
            .zones
            .resolve(&license.zona)
            .or_else(|| self.zones.resolve(&license.direccion))
            .unwrap_or_else(|| self.zones.fallback());
        let (latitude, longitude) = approximate_coordinates(zone, Source::Alcaldia.tag(), &id);

        let activity = license.actividad_comercial.trim();
        let estado = license.estado.trim();
        let mut tags = BTreeSet::from([
            "alcaldia".to_owned(),
            "licenciado".to_owned(),
            classify(activity, ACTIVITY_TAGS, "comercio").to_owned(),
        ]);
        if !estado.is_empty() {
            tags.insert(estado.to_lowercase());
        }
        let mut products_services = BTreeSet::new();
        if let Some(activity) = non_blank(Some(activity)) {
            products_services.insert(activity);
        }

        Ok(Business {
            id,
            name: license.nombre_establecimiento.trim().to_owned(),
            address: license.direccion.trim().to_owned(),
            phone: non_blank(license.telefono.as_deref()).unwrap_or_default(),
            website: String::new(),
            category: classify(activity, ACTIVITY_CATEGORIES, "Comercio").to_owned(),
            rating: 0.0,
            reviews: 0,
            description: format!(
                "Establecimiento con licencia municipal {} - {activity}",
                license.numero_licencia.trim()
            ),
            tags,
            owner_name: non_blank(license.propietario.as_deref()),
            founding_date: non_blank(license.fecha_expedicion.as_deref()),
            employee_count: None,
            annual_revenue: None,
            products_services,
            status: license_status(estado),
            zone_id: zone.id.clone(),
            latitude,
            longitude,
        })
    }
}

impl SourceAdapter for AlcaldiaAdapter {
    type Record = AlcaldiaLicenseRecord;

    fn source(&self) -> Source {
        Source::Alcaldia
    }

    async fn fetch_raw(&self) -> Result<Vec<AlcaldiaLicenseRecord>, ScraperError> {
        self.client.fetch_records(&self.feed).await
    }

    fn normalize(&self, records: &[AlcaldiaLicenseRecord]) -> Result<Vec<Business>, ScraperError> {
        records.iter().map(|r| self.normalize_one(r)).collect()
    }
}

/// `VIGENTE` is active; expired, suspended, inactive or cancelled licenses are
/// closed. Unknown values keep the license active.
fn license_status(estado: &str) -> BusinessStatus {
    match estado.to_uppercase().as_str() {
        "VENCIDA" | "SUSPENDIDA" | "INACTIVA" | "CANCELADA" => BusinessStatus::Closed,
        _ => BusinessStatus::Active,
    }
}
