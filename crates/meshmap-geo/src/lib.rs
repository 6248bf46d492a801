//! Meshmap Geospatial Indexing
//!
//! Base-32 geohash encoding at fixed precisions.
//!
//! # Cell keys
//!
//! A geohash compresses a (latitude, longitude) pair into a string whose
//! shared prefixes imply spatial proximity. Coverage samples are grouped at
//! [`CELL_PRECISION`] (a cell of roughly 38m x 19m at the equator); daily
//! contributor tracking is grouped at the coarser [`REGION_PRECISION`]
//! (roughly 1.2km x 0.6km).
//!
//! Encoding is a pure function of its inputs. Out-of-range coordinates are
//! the caller's problem (the measurement validator clamps them before they
//! reach this crate).

mod geohash;

pub use geohash::{decode, encode};

/// Geohash precision for per-cell sample aggregation.
pub const CELL_PRECISION: usize = 8;

/// Geohash precision for daily contributor tracking.
pub const REGION_PRECISION: usize = 6;

/// Encode a position at the fine per-cell precision.
pub fn cell_key(lat: f64, lon: f64) -> String {
    encode(lat, lon, CELL_PRECISION)
}

/// Encode a position at the coarse contributor-tracking precision.
pub fn region_key(lat: f64, lon: f64) -> String {
    encode(lat, lon, REGION_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_uses_fine_precision() {
        assert_eq!(cell_key(40.0, -105.0).len(), CELL_PRECISION);
    }

    #[test]
    fn region_key_is_prefix_of_cell_key() {
        let cell = cell_key(40.0, -105.0);
        let region = region_key(40.0, -105.0);
        assert_eq!(region.len(), REGION_PRECISION);
        assert!(cell.starts_with(&region));
    }
}
