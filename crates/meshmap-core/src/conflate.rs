//! Read-merge-write conflation of observations into per-cell aggregates.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::error::Result;
use crate::observation::Observation;
use crate::placement::NodePlacement;
use crate::sample::SampleAggregate;
use crate::store::KvStore;

/// Key prefix for per-cell sample aggregates.
pub const SAMPLE_PREFIX: &str = "sample:";

/// Key prefix for node placement records.
pub const NODE_PREFIX: &str = "node:";

/// What an ingest produced, for callers that record secondary effects.
///
/// The coarse region key and the sanitized sender name are what the
/// contributor-activity writer needs; the engine itself does not touch
/// the relational store.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// Fine-precision cell the observation was merged into.
    pub cell: String,
    /// Coarse-precision region for contributor tracking.
    pub region: String,
    /// Sanitized sender name, if the reporter identified itself.
    pub sender: Option<String>,
}

/// Tally of a legacy-key migration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    /// Records re-keyed from the legacy scheme.
    pub migrated: usize,
    /// Records already under the current scheme.
    pub skipped: usize,
    /// Records that could not be migrated; details are logged.
    pub failed: usize,
}

/// Validates, keys and merges incoming reports against a key/value store.
///
/// The store handle is injected rather than ambient so the engine can run
/// against any [`KvStore`] implementation. All writes are plain
/// read-modify-write; the merge rules in [`SampleAggregate`] make that
/// safe without cross-process coordination.
pub struct ConflationEngine {
    store: Arc<dyn KvStore>,
}

impl ConflationEngine {
    pub fn new(store: Arc<dyn KvStore>) -> ConflationEngine {
        ConflationEngine { store }
    }

    /// Sanitize an observation and fold it into its cell's aggregate.
    ///
    /// An absent record means the observation becomes the record verbatim.
    /// The write replaces the whole record, never a partial update.
    pub fn ingest(&self, raw: &Observation, now_ms: i64) -> Result<IngestOutcome> {
        let obs = raw.sanitized();
        let cell = meshmap_geo::cell_key(obs.lat, obs.lon);
        let region = meshmap_geo::region_key(obs.lat, obs.lon);
        let key = format!("{}{}", SAMPLE_PREFIX, cell);

        let record = match self.store.get(&key)? {
            Some(bytes) => {
                let mut existing: SampleAggregate = serde_json::from_slice(&bytes)?;
                existing.absorb(&obs, now_ms);
                existing
            }
            None => SampleAggregate::from_observation(&obs, now_ms),
        };

        self.store.put(&key, &serde_json::to_vec(&record)?)?;
        debug!("Merged observation into cell {}", cell);

        Ok(IngestOutcome {
            cell,
            region,
            sender: obs.sender,
        })
    }

    /// Fetch the aggregate for a fine-precision cell, if one exists.
    pub fn get_sample(&self, cell: &str) -> Result<Option<SampleAggregate>> {
        let key = format!("{}{}", SAMPLE_PREFIX, cell);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List every sample aggregate as (cell key, record) pairs.
    pub fn list_samples(&self) -> Result<Vec<(String, SampleAggregate)>> {
        let mut samples = Vec::new();
        for (key, bytes) in self.store.list(SAMPLE_PREFIX)? {
            let cell = key
                .strip_prefix(SAMPLE_PREFIX)
                .unwrap_or(key.as_str())
                .to_string();
            let record: SampleAggregate = serde_json::from_slice(&bytes)?;
            samples.push((cell, record));
        }
        Ok(samples)
    }

    /// Record a node placement report, returning the storage key used.
    pub fn place_node(&self, report: &NodePlacement, now_ms: i64) -> Result<String> {
        let key = format!("{}{}", NODE_PREFIX, report.storage_key());

        let record = match self.store.get(&key)? {
            Some(bytes) => {
                let mut existing: NodePlacement = serde_json::from_slice(&bytes)?;
                existing.absorb_report(report, now_ms);
                existing
            }
            None => {
                let mut fresh = report.clone();
                fresh.time = now_ms;
                fresh
            }
        };

        self.store.put(&key, &serde_json::to_vec(&record)?)?;
        debug!("Recorded placement for node {}", record.id);
        Ok(key)
    }

    /// List every node placement record.
    pub fn list_placements(&self) -> Result<Vec<NodePlacement>> {
        let mut placements = Vec::new();
        for (_, bytes) in self.store.list(NODE_PREFIX)? {
            placements.push(serde_json::from_slice(&bytes)?);
        }
        Ok(placements)
    }

    /// Re-key sample records stored under the legacy `lat|lon` scheme.
    ///
    /// Legacy keys embed raw coordinates; the replacement key is the
    /// geohash of those coordinates. Record bytes move unchanged, the
    /// legacy key is removed afterwards, and keys already in the current
    /// scheme are skipped, so the operation can be re-run at any time and
    /// interleave with live writes. A failure on one key is logged and
    /// counted without stopping the rest of the sweep.
    pub fn migrate_legacy_keys(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for (key, bytes) in self.store.list(SAMPLE_PREFIX)? {
            let suffix = key.strip_prefix(SAMPLE_PREFIX).unwrap_or(key.as_str());
            let parts: Vec<&str> = suffix.split('|').collect();
            if parts.len() != 2 {
                report.skipped += 1;
                continue;
            }

            let coords = match (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
                (Ok(lat), Ok(lon)) => (lat, lon),
                _ => {
                    error!("Legacy key {} does not parse as coordinates", key);
                    report.failed += 1;
                    continue;
                }
            };

            let new_key = format!(
                "{}{}",
                SAMPLE_PREFIX,
                meshmap_geo::cell_key(coords.0, coords.1)
            );
            let moved = self
                .store
                .put(&new_key, &bytes)
                .and_then(|_| self.store.delete(&key));
            match moved {
                Ok(()) => report.migrated += 1,
                Err(e) => {
                    error!("Failed to migrate legacy record {}: {}", key, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
