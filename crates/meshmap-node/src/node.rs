//! Map node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with RocksDB aggregates and a SQLite activity db
//! - HTTP API for reporters and map clients
//! - Unix admin socket for local maintenance ops (map-admin CLI)

use crate::admin_socket::AdminSocket;
use crate::api;
use crate::error::Result;
use crate::reports::ActivityStore;
use crate::storage::RocksKvStore;
use meshmap_core::ConflationEngine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a map node.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Path to the SQLite activity database
    pub db_path: PathBuf,

    /// Admin socket path (for map-admin CLI)
    pub admin_socket: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl MapConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(
            std::env::var("MESHMAP_DATA_DIR").unwrap_or_else(|_| "./meshmap-data".to_string()),
        );

        let api_addr = std::env::var("MESHMAP_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid MESHMAP_API_ADDR");

        let db_path = std::env::var("MESHMAP_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("activity.db"));

        let admin_socket = std::env::var("MESHMAP_ADMIN_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("admin.sock"));

        Self {
            data_dir,
            api_addr,
            db_path,
            admin_socket,
        }
    }
}

/// Shared state for the map node; one engine and one activity store used
/// by the API handlers and the admin socket alike.
pub struct MapState {
    pub engine: ConflationEngine,
    pub activity: ActivityStore,
    pub config: MapConfig,
}

/// A map node instance.
pub struct MapNode {
    state: Arc<MapState>,
    config: MapConfig,
}

impl MapNode {
    /// Create a new map node.
    pub async fn new(config: MapConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = Arc::new(RocksKvStore::open(config.data_dir.join("kv"))?);
        let engine = ConflationEngine::new(store);
        let activity = ActivityStore::open(&config.db_path).await?;

        let state = Arc::new(MapState {
            engine,
            activity,
            config: config.clone(),
        });

        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<MapState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts HTTP server and admin socket).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Map node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Admin: {:?}", self.config.admin_socket);
        tracing::info!("  Data: {:?}", self.config.data_dir);

        let admin_socket = AdminSocket::new(
            self.state(),
            self.config
                .admin_socket
                .to_str()
                .unwrap_or("./meshmap-data/admin.sock"),
        );
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        let app = api::build_router(self.state());

        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
