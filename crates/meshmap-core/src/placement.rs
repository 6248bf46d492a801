//! Node placement records for fixed infrastructure (repeaters, gateways).

use serde::{Deserialize, Serialize};

/// How long a placement record stays fresh after its last report, in ms.
///
/// Within this window, repeated reports for the same node and location
/// accumulate routing paths; after it, the record is considered stale and
/// a new report replaces it wholesale. Without the reset, a long-lived
/// node would permanently accrete path data from unrelated sessions.
pub const FRESH_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// A physical repeater or gateway pinned to a location.
///
/// Keyed by node id plus coordinates rounded to four decimal places, so a
/// node that physically moves gets a distinct record per site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    /// Stable node identifier.
    pub id: String,
    /// Human-readable node name.
    #[serde(default)]
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Elevation in meters.
    #[serde(default)]
    pub elev: f64,
    /// Epoch milliseconds of the most recent report.
    #[serde(default)]
    pub time: i64,
    /// Routing path accumulated across reports within the fresh window.
    #[serde(default)]
    pub path: Vec<String>,
}

impl NodePlacement {
    /// The storage key suffix for this placement.
    pub fn storage_key(&self) -> String {
        format!("{}|{:.4}|{:.4}", self.id, self.lat, self.lon)
    }

    /// Whether this record was reported within the fresh window as of
    /// `now_ms`.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms - self.time < FRESH_WINDOW_MS
    }

    /// Apply a new report for the same node-location key.
    ///
    /// A fresh record keeps its accumulated path, appending any incoming
    /// hops not already present in first-seen order. A stale record is
    /// replaced outright. Every other field takes the incoming value and
    /// the timestamp moves to `now_ms`.
    pub fn absorb_report(&mut self, incoming: &NodePlacement, now_ms: i64) {
        let path = if self.is_fresh(now_ms) {
            let mut path = self.path.clone();
            for hop in &incoming.path {
                if !path.contains(hop) {
                    path.push(hop.clone());
                }
            }
            path
        } else {
            incoming.path.clone()
        };

        *self = incoming.clone();
        self.path = path;
        self.time = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(path: &[&str], time: i64) -> NodePlacement {
        NodePlacement {
            id: "ab12".to_string(),
            name: "Ridge Repeater".to_string(),
            lat: 40.01234,
            lon: -105.04321,
            elev: 2400.0,
            time,
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn storage_key_rounds_coordinates() {
        let p = placement(&[], 0);
        assert_eq!(p.storage_key(), "ab12|40.0123|-105.0432");
    }

    #[test]
    fn same_rounded_site_same_key() {
        let mut a = placement(&[], 0);
        let mut b = placement(&[], 0);
        a.lat = 40.01231;
        b.lat = 40.01229;
        assert_eq!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn fresh_record_accumulates_path() {
        let mut existing = placement(&["n1", "n2"], 1_000);
        let incoming = placement(&["n2", "n3"], 0);
        existing.absorb_report(&incoming, 2_000);
        assert_eq!(existing.path, vec!["n1", "n2", "n3"]);
        assert_eq!(existing.time, 2_000);
    }

    #[test]
    fn stale_record_is_overwritten() {
        let mut existing = placement(&["n1", "n2"], 1_000);
        let incoming = placement(&["n9"], 0);
        existing.absorb_report(&incoming, 1_000 + FRESH_WINDOW_MS);
        assert_eq!(existing.path, vec!["n9"]);
    }

    #[test]
    fn fresh_boundary_is_exclusive() {
        let mut existing = placement(&["n1"], 1_000);
        // One ms inside the window still accumulates.
        assert!(existing.is_fresh(1_000 + FRESH_WINDOW_MS - 1));
        assert!(!existing.is_fresh(1_000 + FRESH_WINDOW_MS));
        let incoming = placement(&["n2"], 0);
        existing.absorb_report(&incoming, 1_000 + FRESH_WINDOW_MS - 1);
        assert_eq!(existing.path, vec!["n1", "n2"]);
    }

    #[test]
    fn non_path_fields_take_incoming() {
        let mut existing = placement(&["n1"], 1_000);
        let mut incoming = placement(&[], 0);
        incoming.name = "Renamed".to_string();
        incoming.elev = 2500.0;
        existing.absorb_report(&incoming, 2_000);
        assert_eq!(existing.name, "Renamed");
        assert_eq!(existing.elev, 2500.0);
        assert_eq!(existing.path, vec!["n1"]);
    }
}
