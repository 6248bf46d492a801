//! Meshmap Node - Coverage Map Aggregator
//!
//! A daemon that ingests crowd-sourced radio coverage reports and serves
//! the conflated map over HTTP.
//!
//! # Architecture
//!
//! - **Storage**: RocksDB-backed key/value store for aggregates and
//!   placements, SQLite for daily contributor activity
//! - **Reports**: read-only snapshots for map rendering and contributor
//!   digests
//! - **API**: HTTP endpoints for ingest and queries
//! - **Admin Socket**: Unix socket for local maintenance (map-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use meshmap_node::{MapConfig, MapNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MapConfig::default();
//!     let node = MapNode::new(config).await?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod admin_socket;
pub mod api;
pub mod error;
pub mod node;
pub mod reports;
pub mod storage;

pub use error::{Error, Result};
pub use node::{MapConfig, MapNode, MapState};
pub use reports::ActivityStore;
pub use storage::RocksKvStore;
