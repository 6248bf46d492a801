//! Meshmap Conflation Core
//!
//! Validation and conflation of crowd-sourced radio coverage samples.
//!
//! Incoming observations arrive from untrusted reporters and pass through
//! three stages:
//!
//! 1. **Sanitization** ([`Observation::sanitized`]): coordinates are clamped,
//!    implausible signal readings are nulled, identifiers are normalized.
//! 2. **Conflation** ([`ConflationEngine::ingest`]): the observation is folded
//!    into the per-cell [`SampleAggregate`] under a geohash key. The merge is
//!    commutative and idempotent, so replays and races only ever widen the
//!    aggregate.
//! 3. **Persistence**: aggregates live behind the [`KvStore`] trait so the
//!    engine can run against RocksDB in production and an in-memory map in
//!    tests.
//!
//! Node placement records ([`NodePlacement`]) follow a different rule: recent
//! re-reports accumulate routing paths, stale ones are overwritten.

pub mod conflate;
pub mod error;
pub mod measure;
pub mod observation;
pub mod placement;
pub mod sample;
pub mod store;

pub use conflate::{ConflationEngine, IngestOutcome, MigrationReport};
pub use error::{Error, Result};
pub use observation::Observation;
pub use placement::NodePlacement;
pub use sample::SampleAggregate;
pub use store::{KvStore, MemoryKvStore};
