//! Unix socket server for admin commands.
//!
//! Provides a local IPC interface for maintenance operations that should
//! not be reachable over HTTP.

use crate::error::Result;
use crate::node::MapState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Admin command sent over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Re-key legacy-keyed sample records to the geohash scheme
    MigrateKeys,
    /// Report record counts
    Stats,
    /// Ping (health check)
    Ping,
}

/// Response from admin command.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Error {
        error: String,
    },
    Migration {
        migrated: usize,
        skipped: usize,
        failed: usize,
    },
    Stats {
        samples: usize,
        nodes: usize,
    },
    Pong,
}

/// Admin socket server.
pub struct AdminSocket {
    state: Arc<MapState>,
    socket_path: String,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(state: Arc<MapState>, socket_path: &str) -> Self {
        Self {
            state,
            socket_path: socket_path.to_string(),
        }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove existing socket file if present
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }
}

async fn handle_connection(stream: UnixStream, state: Arc<MapState>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &state),
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

fn execute_command(cmd: AdminCommand, state: &Arc<MapState>) -> AdminResponse {
    match cmd {
        AdminCommand::MigrateKeys => match state.engine.migrate_legacy_keys() {
            Ok(report) => {
                tracing::info!(
                    "Key migration: {} migrated, {} skipped, {} failed",
                    report.migrated,
                    report.skipped,
                    report.failed
                );
                AdminResponse::Migration {
                    migrated: report.migrated,
                    skipped: report.skipped,
                    failed: report.failed,
                }
            }
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Stats => {
            let samples = match state.engine.list_samples() {
                Ok(samples) => samples.len(),
                Err(e) => {
                    return AdminResponse::Error {
                        error: e.to_string(),
                    }
                }
            };
            let nodes = match state.engine.list_placements() {
                Ok(nodes) => nodes.len(),
                Err(e) => {
                    return AdminResponse::Error {
                        error: e.to_string(),
                    }
                }
            };
            AdminResponse::Stats { samples, nodes }
        }

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

/// Default socket path.
pub fn default_socket_path() -> String {
    let data_dir =
        std::env::var("MESHMAP_DATA_DIR").unwrap_or_else(|_| "./meshmap-data".to_string());
    format!("{}/admin.sock", data_dir)
}
