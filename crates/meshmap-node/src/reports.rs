//! Read-only reporting over aggregates, placements and sender activity.

use chrono::{TimeZone, Utc};
use meshmap_core::measure::{lerp, path_entry_at, RSSI_CEILING, RSSI_FLOOR};
use meshmap_core::ConflationEngine;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// One aggregate record prepared for map rendering.
///
/// Positions are decoded from the cell key rather than stored in the
/// record, so a row always renders at its cell center.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRow {
    pub cell: String,
    pub lat: f64,
    pub lon: f64,
    pub time: i64,
    pub rssi: Option<i32>,
    pub snr: Option<f64>,
    pub observed: bool,
    pub mesh_ids: Vec<String>,
    pub hops: Vec<String>,
    /// Signal quality on a 0..1 scale, derived from the best RSSI.
    pub quality: Option<f64>,
}

/// One node placement prepared for map rendering.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRow {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elev: f64,
    pub time: i64,
    pub path: Vec<String>,
    /// The hop the node most recently reported through.
    pub last_hop: Option<String>,
}

/// A contributor digest row: sender name and distinct cells reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub sender: String,
    pub cells: i64,
}

/// Snapshot every sample aggregate into renderable rows.
///
/// Records still stored under a legacy key are skipped here; they become
/// visible once `migrate-keys` has re-keyed them.
pub fn sample_rows(engine: &ConflationEngine) -> Result<Vec<SampleRow>> {
    let mut rows = Vec::new();
    for (cell, record) in engine.list_samples()? {
        let Some((lat, lon)) = meshmap_geo::decode(&cell) else {
            continue;
        };
        let quality = record
            .rssi
            .map(|r| lerp(r as f64, RSSI_FLOOR as f64, RSSI_CEILING as f64));
        rows.push(SampleRow {
            cell,
            lat,
            lon,
            time: record.time,
            rssi: record.rssi,
            snr: record.snr,
            observed: record.observed,
            mesh_ids: record.mesh_ids.into_iter().collect(),
            hops: record.hops.into_iter().collect(),
            quality,
        });
    }
    Ok(rows)
}

/// Snapshot every node placement into renderable rows.
pub fn node_rows(engine: &ConflationEngine) -> Result<Vec<NodeRow>> {
    let mut rows = Vec::new();
    for placement in engine.list_placements()? {
        let last_hop = path_entry_at(&placement.path, -1).map(|h| h.to_string());
        rows.push(NodeRow {
            id: placement.id,
            name: placement.name,
            lat: placement.lat,
            lon: placement.lon,
            elev: placement.elev,
            time: placement.time,
            path: placement.path,
            last_hop,
        });
    }
    Ok(rows)
}

/// Truncate an epoch-milliseconds timestamp to the start of its UTC day.
pub fn day_start_ms(now_ms: i64) -> i64 {
    let dt = Utc.timestamp_millis_opt(now_ms).single().unwrap_or_default();
    let midnight = dt
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default();
    Utc.from_utc_datetime(&midnight).timestamp_millis()
}

/// SQLite-backed store for daily contributor sightings.
///
/// One row per (region cell, sender, UTC day), written once and never
/// updated. Feeds the contributor digests only; signal aggregation never
/// reads this table.
pub struct ActivityStore {
    pool: SqlitePool,
}

impl ActivityStore {
    /// Open the activity database, creating file and schema if needed.
    pub async fn open(db_path: &Path) -> Result<ActivityStore> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized activity database: {}", db_path.display());
        } else {
            info!("Opened activity database: {}", db_path.display());
        }

        // WAL keeps concurrent ingest writers from starving readers.
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sender_activity (
                cell TEXT NOT NULL,
                sender TEXT NOT NULL,
                day INTEGER NOT NULL,
                PRIMARY KEY (cell, sender, day)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sender_activity_day ON sender_activity(day)")
            .execute(&pool)
            .await?;

        Ok(ActivityStore { pool })
    }

    /// Record that a sender reported near a region cell on a given day.
    ///
    /// Insert-if-absent: replays of the same (cell, sender, day) tuple are
    /// no-ops.
    pub async fn record_sighting(&self, cell: &str, sender: &str, day_ms: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO sender_activity (cell, sender, day) VALUES (?, ?, ?)",
        )
        .bind(cell)
        .bind(sender)
        .bind(day_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Top contributors since `after_ms`, by distinct cells reported.
    pub async fn top_contributors(&self, after_ms: i64) -> Result<Vec<Contributor>> {
        let rows = sqlx::query(
            r#"
            SELECT sender, COUNT(DISTINCT cell) AS cells
            FROM sender_activity
            WHERE day >= ?
            GROUP BY sender
            ORDER BY cells DESC
            "#,
        )
        .bind(after_ms)
        .fetch_all(&self.pool)
        .await?;

        let mut contributors = Vec::with_capacity(rows.len());
        for row in rows {
            contributors.push(Contributor {
                sender: row.try_get("sender")?,
                cells: row.try_get("cells")?,
            });
        }
        Ok(contributors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmap_core::{MemoryKvStore, Observation};
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn open_store() -> (tempfile::TempDir, ActivityStore) {
        let dir = tempdir().unwrap();
        let store = ActivityStore::open(&dir.path().join("activity.db"))
            .await
            .unwrap();
        (dir, store)
    }

    #[test]
    fn day_start_truncates_to_utc_midnight() {
        // 2024-03-15T17:45:30Z.
        let ms = 1_710_524_730_000;
        let start = day_start_ms(ms);
        assert_eq!(start, 1_710_460_800_000);
        assert_eq!(start % 86_400_000, 0);
        // Already-midnight input is a fixed point.
        assert_eq!(day_start_ms(start), start);
    }

    #[test]
    fn sample_rows_decode_cell_positions() {
        let engine = ConflationEngine::new(Arc::new(MemoryKvStore::new()));
        let obs = Observation {
            lat: 40.0,
            lon: -105.0,
            rssi: Some(-60),
            snr: None,
            mesh: None,
            path: Vec::new(),
            observed: false,
            sender: None,
        };
        engine.ingest(&obs, 1_000).unwrap();

        let rows = sample_rows(&engine).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].lat - 40.0).abs() < 0.001);
        assert!((rows[0].lon + 105.0).abs() < 0.001);

        let quality = rows[0].quality.unwrap();
        assert!(quality > 0.0 && quality < 1.0);
    }

    #[test]
    fn sample_rows_skip_legacy_keys() {
        let store = Arc::new(MemoryKvStore::new());
        let engine = ConflationEngine::new(store.clone());
        use meshmap_core::KvStore;
        store
            .put(
                "sample:40|-105",
                br#"{"time":1,"rssi":null,"snr":null,"observed":false,"mesh_ids":[],"hops":[]}"#,
            )
            .unwrap();

        assert!(sample_rows(&engine).unwrap().is_empty());
    }

    #[test]
    fn node_rows_carry_last_hop() {
        let engine = ConflationEngine::new(Arc::new(MemoryKvStore::new()));
        let placement = meshmap_core::NodePlacement {
            id: "ab12".to_string(),
            name: "Ridge".to_string(),
            lat: 40.0,
            lon: -105.0,
            elev: 0.0,
            time: 0,
            path: vec!["n1".to_string(), "n2".to_string()],
        };
        engine.place_node(&placement, 1_000).unwrap();

        let rows = node_rows(&engine).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].last_hop.as_deref(), Some("n2"));
    }

    #[tokio::test]
    async fn sighting_insert_is_idempotent() {
        let (_dir, store) = open_store().await;
        store.record_sighting("9xj6kp", "alice", 0).await.unwrap();
        store.record_sighting("9xj6kp", "alice", 0).await.unwrap();

        let contributors = store.top_contributors(0).await.unwrap();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].cells, 1);
    }

    #[tokio::test]
    async fn contributors_ranked_by_distinct_cells() {
        let (_dir, store) = open_store().await;
        store.record_sighting("cell-a", "alice", 0).await.unwrap();
        store.record_sighting("cell-b", "alice", 0).await.unwrap();
        store.record_sighting("cell-a", "bob", 0).await.unwrap();

        let contributors = store.top_contributors(0).await.unwrap();
        assert_eq!(contributors[0].sender, "alice");
        assert_eq!(contributors[0].cells, 2);
        assert_eq!(contributors[1].sender, "bob");
        assert_eq!(contributors[1].cells, 1);
    }

    #[tokio::test]
    async fn contributors_respect_time_window() {
        let (_dir, store) = open_store().await;
        let yesterday = 0;
        let today = 86_400_000;
        store
            .record_sighting("cell-a", "alice", yesterday)
            .await
            .unwrap();
        store.record_sighting("cell-b", "bob", today).await.unwrap();

        let contributors = store.top_contributors(today).await.unwrap();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].sender, "bob");
    }

    #[tokio::test]
    async fn empty_window_returns_empty_list() {
        let (_dir, store) = open_store().await;
        assert!(store.top_contributors(0).await.unwrap().is_empty());
    }
}
