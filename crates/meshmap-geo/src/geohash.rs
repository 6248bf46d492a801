//! Base-32 geohash encoding and decoding.
//!
//! A geohash interleaves longitude and latitude range bisections, five bits
//! per output character, starting with longitude. Truncating a hash widens
//! the cell, so a coarser hash is always a prefix of a finer one for the
//! same point.

/// The geohash base-32 alphabet (digits plus lowercase letters, minus
/// the ambiguous a, i, l, o).
const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a position into a geohash of the given precision (in characters).
///
/// Pure and deterministic: the same inputs always produce the same hash,
/// and any two positions inside the same cell produce identical hashes.
/// Coordinates are assumed to be in range; callers clamp first.
pub fn encode(lat: f64, lon: f64, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut bits = 0usize;
    let mut bit_count = 0u8;
    let mut bisect_lon = true;

    while hash.len() < precision {
        let (range, value) = if bisect_lon {
            (&mut lon_range, lon)
        } else {
            (&mut lat_range, lat)
        };

        let mid = (range.0 + range.1) / 2.0;
        bits <<= 1;
        if value >= mid {
            bits |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }

        bisect_lon = !bisect_lon;
        bit_count += 1;
        if bit_count == 5 {
            hash.push(ALPHABET[bits] as char);
            bits = 0;
            bit_count = 0;
        }
    }

    hash
}

/// Decode a geohash to the center point of its cell.
///
/// Returns `None` if the hash contains a character outside the geohash
/// alphabet. An empty hash decodes to the center of the full range (0, 0).
pub fn decode(hash: &str) -> Option<(f64, f64)> {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut bisect_lon = true;

    for ch in hash.bytes() {
        let value = ALPHABET.iter().position(|&c| c == ch)?;
        for shift in (0..5).rev() {
            let bit = (value >> shift) & 1;
            let range = if bisect_lon {
                &mut lon_range
            } else {
                &mut lat_range
            };
            let mid = (range.0 + range.1) / 2.0;
            if bit == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            bisect_lon = !bisect_lon;
        }
    }

    let lat = (lat_range.0 + lat_range.1) / 2.0;
    let lon = (lon_range.0 + lon_range.1) / 2.0;
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_hashes() {
        assert_eq!(encode(57.64911, 10.40744, 11), "u4pruydqqvj");
        assert_eq!(encode(42.6, -5.6, 5), "ezs42");
    }

    #[test]
    fn deterministic() {
        let a = encode(40.0, -105.0, 8);
        let b = encode(40.0, -105.0, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn same_cell_same_hash() {
        // Points separated by far less than the cell size collapse to one key.
        let a = encode(40.0, -105.0, 8);
        let b = encode(40.0 + 1e-9, -105.0 + 1e-9, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn nearby_points_share_prefix() {
        let a = encode(40.0000, -105.0000, 8);
        let b = encode(40.0001, -105.0001, 8);
        assert_eq!(a[..5], b[..5]);
    }

    #[test]
    fn decode_known_cell() {
        let (lat, lon) = decode("ezs42").unwrap();
        assert!((lat - 42.605).abs() < 0.01);
        assert!((lon + 5.603).abs() < 0.01);
    }

    #[test]
    fn decode_rejects_invalid_alphabet() {
        assert!(decode("ezs4a").is_none());
        assert!(decode("EZS42").is_none());
    }

    #[test]
    fn decode_empty_is_origin() {
        assert_eq!(decode(""), Some((0.0, 0.0)));
    }

    proptest! {
        #[test]
        fn truncation_is_prefix(
            lat in -90.0_f64..90.0,
            lon in -180.0_f64..180.0,
        ) {
            let fine = encode(lat, lon, 8);
            let coarse = encode(lat, lon, 6);
            prop_assert!(fine.starts_with(&coarse));
        }

        #[test]
        fn decode_reencodes_to_same_cell(
            lat in -90.0_f64..90.0,
            lon in -180.0_f64..180.0,
        ) {
            let hash = encode(lat, lon, 8);
            let (clat, clon) = decode(&hash).unwrap();
            prop_assert_eq!(encode(clat, clon, 8), hash);
        }

        #[test]
        fn decode_center_stays_in_cell(
            lat in -90.0_f64..90.0,
            lon in -180.0_f64..180.0,
        ) {
            let (clat, clon) = decode(&encode(lat, lon, 8)).unwrap();
            // Precision 8 cells are under 40m across; the center cannot be
            // further from the input than one cell diagonal.
            prop_assert!((clat - lat).abs() < 0.001);
            prop_assert!((clon - lon).abs() < 0.001);
        }
    }
}
