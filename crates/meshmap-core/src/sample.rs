//! Per-cell coverage aggregates and the merge rules that govern them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::observation::Observation;

/// The persisted aggregate for one fine-precision spatial cell.
///
/// Aside from the timestamp, every field only ever widens under
/// [`SampleAggregate::absorb`]: signal readings take the maximum, the
/// observed flag latches, and the identifier sets grow by union. Folding
/// the same observation twice, or two observations in either order,
/// therefore converges to the same record. That property is what lets
/// concurrent ingests share a key with no locking.
///
/// The identifier sets are `BTreeSet`s so that serialization is
/// canonical: two equal aggregates always produce byte-identical JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAggregate {
    /// Epoch milliseconds of the most recent contribution.
    pub time: i64,
    /// Best signal strength ever seen at this cell, in dBm.
    pub rssi: Option<i32>,
    /// Best signal-to-noise ratio ever seen at this cell, in dB.
    pub snr: Option<f64>,
    /// Whether any contributor directly observed a transmission here.
    pub observed: bool,
    /// Every mesh identifier reported at this cell.
    pub mesh_ids: BTreeSet<String>,
    /// Every hop identifier reported at this cell.
    pub hops: BTreeSet<String>,
}

impl SampleAggregate {
    /// Build the initial record from a sanitized observation.
    pub fn from_observation(obs: &Observation, now_ms: i64) -> SampleAggregate {
        SampleAggregate {
            time: now_ms,
            rssi: obs.rssi,
            snr: obs.snr,
            observed: obs.observed,
            mesh_ids: obs.mesh.iter().cloned().collect(),
            hops: obs.path.iter().cloned().collect(),
        }
    }

    /// Fold a sanitized observation into this record.
    ///
    /// The timestamp always moves to the merge time so that freshness
    /// reflects the latest contribution. Signal readings keep the maximum
    /// seen, with a missing side deferring to the present one. Best
    /// reception is the meaningful ceiling for a location; reporters vary
    /// too much in antenna and sensitivity for an average to mean anything.
    pub fn absorb(&mut self, obs: &Observation, now_ms: i64) {
        self.time = now_ms;
        self.rssi = max_option(self.rssi, obs.rssi);
        self.snr = match (self.snr, obs.snr) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.observed |= obs.observed;
        if let Some(mesh) = &obs.mesh {
            self.mesh_ids.insert(mesh.clone());
        }
        for hop in &obs.path {
            self.hops.insert(hop.clone());
        }
    }
}

fn max_option(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
