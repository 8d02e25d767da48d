use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A named area of Palmira with the base coordinates used for approximate
/// geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Lower-case substrings that identify this zone in free-text zone names
    /// or addresses (e.g. `"italia"`).
    pub hints: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Fixed lookup table from free-text hints to zone ids.
///
/// Always holds a valid fallback zone, so lookups never fail.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    fallback: usize,
}

#[derive(Debug, Deserialize)]
struct ZonesFile {
    fallback: String,
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    /// Builds a registry from `zones`, using the zone with id `fallback` for
    /// unmatched hints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if zone ids are empty or duplicated,
    /// a zone has no hints, or `fallback` names no zone.
    pub fn new(zones: Vec<Zone>, fallback: &str) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for zone in &zones {
            if zone.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "zone id must be non-empty".to_string(),
                ));
            }
            if !seen.insert(zone.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate zone id: '{}'",
                    zone.id
                )));
            }
            if zone.hints.iter().all(|h| h.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "zone '{}' has no hints",
                    zone.id
                )));
            }
        }

        let fallback = zones
            .iter()
            .position(|z| z.id == fallback)
            .ok_or_else(|| {
                ConfigError::Validation(format!("fallback zone '{fallback}' is not defined"))
            })?;

        // Hints are matched against lower-cased text.
        let zones = zones
            .into_iter()
            .map(|mut z| {
                z.hints = z
                    .hints
                    .into_iter()
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect();
                z
            })
            .collect();

        Ok(Self { zones, fallback })
    }

    /// The built-in Palmira registry. `zone-sur` is the fallback.
    #[must_use]
    pub fn palmira() -> Self {
        let zone = |id: &str, name: &str, hint: &str, latitude: f64, longitude: f64| Zone {
            id: id.to_string(),
            name: name.to_string(),
            hints: vec![hint.to_string()],
            latitude,
            longitude,
        };
        Self {
            zones: vec![
                zone("zone-centro", "Centro", "centro", 3.5395, -76.3034),
                zone("zone-la-italia", "La Italia", "italia", 3.5310, -76.3089),
                zone("zone-norte", "Norte", "norte", 3.5450, -76.3020),
                zone("zone-sur", "Sur", "sur", 3.5280, -76.3100),
            ],
            fallback: 3,
        }
    }

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub fn fallback(&self) -> &Zone {
        &self.zones[self.fallback]
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Returns the first zone (in registry order) with a hint contained in
    /// `text`, compared case-insensitively.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Option<&Zone> {
        let lower = text.to_lowercase();
        self.zones
            .iter()
            .find(|z| z.hints.iter().any(|h| lower.contains(h.as_str())))
    }

    /// Like [`Self::resolve`], falling back to the registry's fallback zone.
    #[must_use]
    pub fn resolve_or_fallback(&self, text: &str) -> &Zone {
        self.resolve(text).unwrap_or_else(|| self.fallback())
    }
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::palmira()
    }
}

/// Load and validate a zone registry from a YAML file.
///
/// ```yaml
/// fallback: zone-sur
/// zones:
///   - id: zone-centro
///     name: Centro
///     hints: [centro]
///     latitude: 3.5395
///     longitude: -76.3034
/// ```
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_zones(path: &Path) -> Result<ZoneRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ZonesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: ZonesFile = serde_yaml::from_str(&content)?;
    ZoneRegistry::new(file.zones, &file.fallback)
}
