//! Approximate coordinates for records without real geocoding.
//!
//! The jitter is derived from a SHA-256 seed of the record's identity, so the
//! same record always lands on the same point while records in one zone are
//! still spread around the zone's base coordinates.

use palmira_core::Zone;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Maximum offset, in degrees, applied on each axis.
pub const JITTER_DEGREES: f64 = 0.005;

/// Returns `(latitude, longitude)` within [`JITTER_DEGREES`] of `zone`'s
/// base point, seeded by `source_tag` and `record_id`.
#[must_use]
pub fn approximate_coordinates(zone: &Zone, source_tag: &str, record_id: &str) -> (f64, f64) {
    let mut hasher = Sha256::new();
    hasher.update(source_tag.as_bytes());
    hasher.update([0u8]);
    hasher.update(record_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(zone.id.as_bytes());

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hasher.finalize());
    let mut rng = StdRng::from_seed(seed);

    let lat = zone.latitude + rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES);
    let lng = zone.longitude + rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES);
    (lat, lng)
}
