//! Raw coverage observations as reported by untrusted clients.

use serde::{Deserialize, Serialize};

use crate::measure::{clamp_location, is_plausible_rssi};

/// Maximum length of a reporter name kept in activity records.
pub const MAX_SENDER_LEN: usize = 32;

/// A single coverage report from a field device.
///
/// Everything beyond the coordinates is optional; reporters range from
/// full wardriving rigs down to firmware that only knows where it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Latitude in degrees, clamped to [-90, 90] during sanitization.
    pub lat: f64,
    /// Longitude in degrees, clamped to [-180, 180] during sanitization.
    pub lon: f64,
    /// Received signal strength in dBm, if the radio reported one.
    #[serde(default)]
    pub rssi: Option<i32>,
    /// Signal-to-noise ratio in dB, if the radio reported one.
    #[serde(default)]
    pub snr: Option<f64>,
    /// Identifier of the mesh the packet was heard on.
    #[serde(default)]
    pub mesh: Option<String>,
    /// Node IDs the packet traversed, in hop order.
    #[serde(default)]
    pub path: Vec<String>,
    /// Whether the reporter directly observed the transmission.
    #[serde(default)]
    pub observed: bool,
    /// Self-declared reporter name.
    #[serde(default)]
    pub sender: Option<String>,
}

impl Observation {
    /// Normalize an untrusted observation into canonical form.
    ///
    /// Coordinates are clamped onto the globe. Mesh identifiers are
    /// uppercased and hop IDs lowercased so that case variations from
    /// different firmware collapse to one spelling. Reporter names are
    /// truncated to [`MAX_SENDER_LEN`] characters.
    ///
    /// An implausible RSSI taints the whole signal reading: rssi, snr and
    /// path are dropped together, since firmware that fabricates one tends
    /// to fabricate the rest. The location is kept; a bad radio can still
    /// say where it was.
    pub fn sanitized(&self) -> Observation {
        let (lat, lon) = clamp_location(self.lat, self.lon);
        let plausible = is_plausible_rssi(self.rssi);

        Observation {
            lat,
            lon,
            rssi: if plausible { self.rssi } else { None },
            snr: if plausible { self.snr } else { None },
            mesh: self.mesh.as_ref().map(|m| m.to_uppercase()),
            path: if plausible {
                self.path.iter().map(|h| h.to_lowercase()).collect()
            } else {
                Vec::new()
            },
            observed: self.observed,
            sender: self
                .sender
                .as_ref()
                .map(|s| s.chars().take(MAX_SENDER_LEN).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Observation {
        Observation {
            lat: 40.0,
            lon: -105.0,
            rssi: Some(-80),
            snr: Some(5.5),
            mesh: Some("lora".to_string()),
            path: vec!["AB12".to_string(), "Cd34".to_string()],
            observed: true,
            sender: Some("alice".to_string()),
        }
    }

    #[test]
    fn sanitize_normalizes_identifiers() {
        let clean = base().sanitized();
        assert_eq!(clean.mesh.as_deref(), Some("LORA"));
        assert_eq!(clean.path, vec!["ab12".to_string(), "cd34".to_string()]);
    }

    #[test]
    fn sanitize_clamps_coordinates() {
        let mut obs = base();
        obs.lat = 95.0;
        obs.lon = -200.0;
        let clean = obs.sanitized();
        assert_eq!(clean.lat, 90.0);
        assert_eq!(clean.lon, -180.0);
    }

    #[test]
    fn implausible_rssi_taints_signal_fields() {
        let mut obs = base();
        obs.rssi = Some(0);
        let clean = obs.sanitized();
        assert_eq!(clean.rssi, None);
        assert_eq!(clean.snr, None);
        assert!(clean.path.is_empty());
        // Location survives even when the radio is lying.
        assert_eq!(clean.lat, 40.0);
        assert_eq!(clean.lon, -105.0);
    }

    #[test]
    fn missing_rssi_keeps_snr_and_path() {
        let mut obs = base();
        obs.rssi = None;
        let clean = obs.sanitized();
        assert_eq!(clean.snr, Some(5.5));
        assert_eq!(clean.path.len(), 2);
    }

    #[test]
    fn sender_truncated_to_limit() {
        let mut obs = base();
        obs.sender = Some("x".repeat(50));
        let clean = obs.sanitized();
        assert_eq!(clean.sender.as_deref(), Some("x".repeat(32).as_str()));
    }

    #[test]
    fn deserializes_minimal_payload() {
        let obs: Observation = serde_json::from_str(r#"{"lat": 1.0, "lon": 2.0}"#).unwrap();
        assert_eq!(obs.rssi, None);
        assert!(obs.path.is_empty());
        assert!(!obs.observed);
    }
}
