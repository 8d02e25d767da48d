use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a business, common to every source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStatus {
    Active,
    Closed,
    New,
}

impl BusinessStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessStatus::Active => "active",
            BusinessStatus::Closed => "closed",
            BusinessStatus::New => "new",
        }
    }
}

impl std::fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusinessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BusinessStatus::Active),
            "closed" => Ok(BusinessStatus::Closed),
            "new" => Ok(BusinessStatus::New),
            other => Err(format!(
                "unknown business status '{other}'; expected active, closed or new"
            )),
        }
    }
}

/// One commercial establishment, normalized from any source.
///
/// Field order matches the serialized layout consumed by the dashboard, so
/// do not reorder fields without updating persisted fixtures.
///
/// `tags` and `products_services` are sets: ordering carries no meaning and
/// duplicates are impossible. They serialize as sorted JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    /// `<source tag>_<native id>`, e.g. `dane_001`. Unique within a source only.
    pub id: String,
    pub name: String,
    pub address: String,
    /// Empty when the source has no phone number.
    #[serde(default)]
    pub phone: String,
    /// Empty when the source has no website.
    #[serde(default)]
    pub website: String,
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub founding_date: Option<String>,
    #[serde(default)]
    pub employee_count: Option<u32>,
    /// Annual revenue in USD.
    #[serde(default)]
    pub annual_revenue: Option<f64>,
    #[serde(default)]
    pub products_services: BTreeSet<String>,
    pub status: BusinessStatus,
    pub zone_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Business {
    /// The source tag embedded in the id: everything before the first `_`.
    ///
    /// Returns the whole id when it has no `_`.
    #[must_use]
    pub fn source_tag(&self) -> &str {
        self.id.split('_').next().unwrap_or(&self.id)
    }
}
