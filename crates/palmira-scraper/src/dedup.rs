//! Fuzzy identity for businesses reported by more than one registry.
//!
//! The key is a string normalization of name and address, not entity
//! resolution: distinct businesses can collide and the same business can be
//! missed. Both outcomes are accepted.

use std::sync::LazyLock;

use palmira_core::Business;
use regex::Regex;

/// Legal-entity suffix tokens: S.A., S.A.S., SAS, SA, LTDA.
static LEGAL_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:s\.?a\.?s?\.?|ltda\.?)$").expect("valid legal suffix regex")
});

/// Street-type tokens: calle, carrera and the cl/cr abbreviations.
static STREET_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:calle|carrera|cl|cr)\.?$").expect("valid street type regex"));

/// Separator between the normalized name and address in a key.
const KEY_SEPARATOR: char = '_';

/// Derives the dedup key for `business` from its name and address.
///
/// `dedup_key` of `"Acme S.A.S."` at `"Calle 10 #5-20"` equals that of
/// `"Acme"` at `"10 5-20"`.
#[must_use]
pub fn dedup_key(business: &Business) -> String {
    format!(
        "{}{KEY_SEPARATOR}{}",
        normalize_name(&business.name),
        normalize_address(&business.address)
    )
}

/// Lower-cases, drops legal suffix tokens and periods, collapses whitespace.
fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(','))
        .filter(|token| !LEGAL_SUFFIX_RE.is_match(token))
        .map(|token| token.replace('.', ""))
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cases, drops street-type tokens and `#`, collapses whitespace.
fn normalize_address(address: &str) -> String {
    address
        .to_lowercase()
        .replace('#', " ")
        .split_whitespace()
        .filter(|token| !STREET_TYPE_RE.is_match(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Combines a stored business with a later duplicate into a new value.
///
/// `existing` wins for every field except:
/// - `phone`, `website`, `owner_name`, `founding_date`: taken from
///   `duplicate` only when blank in `existing`;
/// - `employee_count`: the larger of the two;
/// - `tags`, `products_services`: union;
/// - `description`: gains a note naming the duplicate's source tag.
#[must_use]
pub fn merge_businesses(existing: &Business, duplicate: &Business) -> Business {
    let mut merged = existing.clone();

    if merged.phone.trim().is_empty() {
        merged.phone.clone_from(&duplicate.phone);
    }
    if merged.website.trim().is_empty() {
        merged.website.clone_from(&duplicate.website);
    }
    merged.owner_name = first_present(
        existing.owner_name.as_deref(),
        duplicate.owner_name.as_deref(),
    );
    merged.founding_date = first_present(
        existing.founding_date.as_deref(),
        duplicate.founding_date.as_deref(),
    );
    merged.employee_count = match (existing.employee_count, duplicate.employee_count) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    merged.tags.extend(duplicate.tags.iter().cloned());
    merged
        .products_services
        .extend(duplicate.products_services.iter().cloned());
    merged.description = format!(
        "{} | Fuente adicional: {}",
        existing.description,
        duplicate.source_tag().to_uppercase()
    );

    merged
}

fn first_present(existing: Option<&str>, duplicate: Option<&str>) -> Option<String> {
    fn present(v: Option<&str>) -> Option<&str> {
        v.filter(|s| !s.trim().is_empty())
    }
    present(existing)
        .or_else(|| present(duplicate))
        .map(str::to_owned)
}
