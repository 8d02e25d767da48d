//! DANE statistical business directory (geoportal).
//!
//! Records carry a CIIU activity code and, usually, real coordinates. There is
//! no phone, website, owner or lifecycle status; every listed company is
//! treated as active.

use std::collections::BTreeSet;
use std::sync::Arc;

use palmira_core::{Business, BusinessStatus, ZoneRegistry};
use serde::Deserialize;

use super::{non_blank, prefixed_id, require, Source, SourceAdapter};
use crate::client::{Feed, SourceClient};
use crate::error::ScraperError;
use crate::geo::approximate_coordinates;

/// CIIU rev. 4 classes seen in Palmira, mapped to dashboard categories.
const CIIU_CATEGORIES: &[(&str, &str)] = &[
    ("1071", "Industria Alimentaria"),
    ("4631", "Comercio al por Mayor"),
    ("5611", "Restaurante"),
    ("4711", "Comercio al por Menor"),
    ("6820", "Inmobiliaria"),
    ("7820", "Servicios"),
];

/// Downtown streets (Calle 20–29) are addressed without a neighbourhood in
/// DANE data.
const CENTRO_STREET_HINT: &str = "calle 2";
const CENTRO_ZONE_ID: &str = "zone-centro";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DaneCoordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One company from the DANE directory, as published.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaneCompanyRecord {
    pub id: String,
    pub nombre: String,
    pub direccion: String,
    pub ciiu: String,
    pub descripcion_ciiu: String,
    #[serde(default)]
    pub coordenadas: Option<DaneCoordinates>,
    #[serde(default)]
    pub departamento: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
}

pub struct DaneAdapter {
    client: SourceClient,
    feed: Feed,
    zones: Arc<ZoneRegistry>,
}

impl DaneAdapter {
    #[must_use]
    pub fn new(client: SourceClient, feed: Feed, zones: Arc<ZoneRegistry>) -> Self {
        Self {
            client,
            feed,
            zones,
        }
    }

    fn zone_id(&self, address: &str) -> &str {
        if address.to_lowercase().contains(CENTRO_STREET_HINT) {
            if let Some(zone) = self.zones.get(CENTRO_ZONE_ID) {
                return &zone.id;
            }
        }
        &self.zones.resolve_or_fallback(address).id
    }

    fn normalize_one(&self, record: &DaneCompanyRecord) -> Result<Business, ScraperError> {
        let id = prefixed_id(Source::Dane, record.id.trim());
        require(Source::Dane, &id, "id", &record.id)?;
        require(Source::Dane, &id, "nombre", &record.nombre)?;

        let zone_id = self.zone_id(&record.direccion).to_owned();
        let (latitude, longitude) = match &record.coordenadas {
            Some(c) => {
                if !valid_coordinates(c) {
                    return Err(ScraperError::Normalization {
                        source_tag: Source::Dane.tag().to_owned(),
                        record_id: id,
                        reason: format!("coordinates out of range: ({}, {})", c.lat, c.lng),
                    });
                }
                (c.lat, c.lng)
            }
            None => {
                let zone = self
                    .zones
                    .get(&zone_id)
                    .unwrap_or_else(|| self.zones.fallback());
                approximate_coordinates(zone, Source::Dane.tag(), &id)
            }
        };

        let activity = record.descripcion_ciiu.trim();
        let mut tags = BTreeSet::from(["dane".to_owned(), "oficial".to_owned()]);
        let mut products_services = BTreeSet::new();
        if let Some(activity) = non_blank(Some(activity)) {
            tags.insert(activity.to_lowercase());
            products_services.insert(activity);
        }

        Ok(Business {
            id,
            name: record.nombre.trim().to_owned(),
            address: record.direccion.trim().to_owned(),
            phone: String::new(),
            website: String::new(),
            category: ciiu_category(&record.ciiu).to_owned(),
            rating: 0.0,
            reviews: 0,
            description: format!("Empresa registrada en DANE - {activity}"),
            tags,
            owner_name: None,
            founding_date: None,
            employee_count: None,
            annual_revenue: None,
            products_services,
            status: BusinessStatus::Active,
            zone_id,
            latitude,
            longitude,
        })
    }
}

impl SourceAdapter for DaneAdapter {
    type Record = DaneCompanyRecord;

    fn source(&self) -> Source {
        Source::Dane
    }

    async fn fetch_raw(&self) -> Result<Vec<DaneCompanyRecord>, ScraperError> {
        self.client.fetch_records(&self.feed).await
    }

    fn normalize(&self, records: &[DaneCompanyRecord]) -> Result<Vec<Business>, ScraperError> {
        records.iter().map(|r| self.normalize_one(r)).collect()
    }
}

fn ciiu_category(ciiu: &str) -> &'static str {
    let code = ciiu.trim();
    CIIU_CATEGORIES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or("Otros", |(_, category)| *category)
}

fn valid_coordinates(c: &DaneCoordinates) -> bool {
    c.lat.is_finite()
        && c.lng.is_finite()
        && (-90.0..=90.0).contains(&c.lat)
        && (-180.0..=180.0).contains(&c.lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> DaneAdapter {
        DaneAdapter::new(
            SourceClient::new(5, "palmira-test/0.1", 0, 0).unwrap(),
            Feed::File("unused.json".into()),
            Arc::new(ZoneRegistry::palmira()),
        )
    }

    fn record(id: &str, direccion: &str, ciiu: &str) -> DaneCompanyRecord {
        DaneCompanyRecord {
            id: id.to_owned(),
            nombre: "Ingenio Manuelita S.A.".to_owned(),
            direccion: direccion.to_owned(),
            ciiu: ciiu.to_owned(),
            descripcion_ciiu: "Elaboración de azúcar".to_owned(),
            coordenadas: Some(DaneCoordinates {
                lat: 3.5389,
                lng: -76.3089,
            }),
            departamento: Some("Valle del Cauca".to_owned()),
            municipio: Some("Palmira".to_owned()),
        }
    }

    #[test]
    fn normalize_maps_core_fields() {
        let businesses = adapter()
            .normalize(&[record("001", "Km 15 Vía Palmira - Candelaria", "1071")])
            .unwrap();
        let b = &businesses[0];
        assert_eq!(b.id, "dane_001");
        assert_eq!(b.category, "Industria Alimentaria");
        assert_eq!(b.status, BusinessStatus::Active);
        assert_eq!(b.description, "Empresa registrada en DANE - Elaboración de azúcar");
        assert!(b.phone.is_empty() && b.website.is_empty());
        assert!(b.tags.contains("dane") && b.tags.contains("oficial"));
        assert!(b.tags.contains("elaboración de azúcar"));
        assert!(b.products_services.contains("Elaboración de azúcar"));
        assert_eq!(b.zone_id, "zone-sur");
    }

    #[test]
    fn normalize_passes_real_coordinates_through() {
        let b = &adapter()
            .normalize(&[record("001", "Calle 30 #29-50", "4631")])
            .unwrap()[0];
        assert!((b.latitude - 3.5389).abs() < f64::EPSILON);
        assert!((b.longitude + 76.3089).abs() < f64::EPSILON);
    }

    #[test]
    fn normalize_synthesizes_coordinates_when_missing() {
        let mut r = record("002", "Carrera 28 #20-08, Norte", "4711");
        r.coordenadas = None;
        let b = &adapter().normalize(&[r]).unwrap()[0];
        assert_eq!(b.zone_id, "zone-norte");
        assert!((b.latitude - 3.5450).abs() <= 0.005 + f64::EPSILON);
        assert!((b.longitude + 76.3020).abs() <= 0.005 + f64::EPSILON);
    }

    #[test]
    fn downtown_street_numbers_map_to_centro() {
        let b = &adapter()
            .normalize(&[record("003", "Calle 24 #29-12", "5611")])
            .unwrap()[0];
        assert_eq!(b.zone_id, "zone-centro");
        assert_eq!(b.category, "Restaurante");
    }

    #[test]
    fn unknown_ciiu_is_otros() {
        assert_eq!(ciiu_category("9999"), "Otros");
        assert_eq!(ciiu_category(" 6820 "), "Inmobiliaria");
    }

    #[test]
    fn normalize_rejects_out_of_range_coordinates() {
        let mut r = record("004", "Centro", "1071");
        r.coordenadas = Some(DaneCoordinates {
            lat: f64::NAN,
            lng: -76.3,
        });
        let err = adapter().normalize(&[r]).unwrap_err();
        assert!(matches!(err, ScraperError::Normalization { ref record_id, .. } if record_id == "dane_004"));
    }

    #[test]
    fn normalize_rejects_blank_name() {
        let mut r = record("005", "Centro", "1071");
        r.nombre = " ".to_owned();
        assert!(adapter().normalize(&[r]).is_err());
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut r = record("006", "Calle 30 #29-50", "4631");
        r.coordenadas = None;
        let records = vec![r];
        let a = adapter();
        assert_eq!(a.normalize(&records).unwrap(), a.normalize(&records).unwrap());
    }

    #[test]
    fn deserializes_native_shape() {
        let raw = r#"{
            "id": "dane_002",
            "nombre": "Comercializadora Internacional C.I. Expofruit S.A.",
            "direccion": "Calle 30 #29-50",
            "ciiu": "4631",
            "descripcionCiiu": "Comercio al por mayor de productos alimenticios",
            "coordenadas": {"lat": 3.5395, "lng": -76.3034},
            "departamento": "Valle del Cauca",
            "municipio": "Palmira"
        }"#;
        let r: DaneCompanyRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(r.descripcion_ciiu, "Comercio al por mayor de productos alimenticios");
        let b = &adapter().normalize(&[r]).unwrap()[0];
        assert_eq!(b.id, "dane_002");
    }
}
