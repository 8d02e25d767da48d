//! Post-hoc projections of a finished [`ScrapingResult`]. None of these take
//! part in merging; they only narrow what a caller sees in `combined`.

use palmira_core::{Business, BusinessStatus};

use crate::aggregator::ScrapingResult;
use crate::sources::Source;

/// Conjunction of optional predicates over [`Business`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessFilter {
    /// Exact zone id, e.g. `zone-centro`.
    pub zone: Option<String>,
    /// Case-insensitive substring of the category.
    pub category: Option<String>,
    pub status: Option<BusinessStatus>,
}

impl BusinessFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zone.is_none() && self.category.is_none() && self.status.is_none()
    }

    #[must_use]
    pub fn matches(&self, business: &Business) -> bool {
        if self.zone.as_deref().is_some_and(|zone| business.zone_id != zone) {
            return false;
        }
        if let Some(category) = &self.category {
            if !business
                .category
                .to_lowercase()
                .contains(&category.to_lowercase())
            {
                return false;
            }
        }
        self.status.is_none_or(|status| business.status == status)
    }

    /// Narrows `result.combined` to matching records; see
    /// [`ScrapingResult::with_combined`] for how stats follow.
    #[must_use]
    pub fn apply(&self, result: ScrapingResult) -> ScrapingResult {
        if self.is_empty() {
            return result;
        }
        let combined = result
            .combined
            .iter()
            .filter(|b| self.matches(b))
            .cloned()
            .collect();
        result.with_combined(combined)
    }
}

impl ScrapingResult {
    /// Replaces `combined` with the raw bucket of `source`, so
    /// `stats.total_companies` becomes that bucket's length.
    #[must_use]
    pub fn project_source(self, source: Source) -> ScrapingResult {
        let bucket = self.bucket(source).to_vec();
        self.with_combined(bucket)
    }
}
