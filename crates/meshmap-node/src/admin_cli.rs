//! map-admin CLI tool
//!
//! Local maintenance operations for a running map node.
//!
//! Usage:
//!   map-admin migrate-keys
//!   map-admin stats
//!   map-admin ping

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Admin command sent over the socket.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum AdminCommand {
    MigrateKeys,
    Stats,
    Ping,
}

/// Response from admin command.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AdminResponse {
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

fn print_usage() {
    eprintln!("map-admin - Maintenance operations for a map node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  map-admin migrate-keys   Re-key legacy sample records");
    eprintln!("  map-admin stats          Show record counts");
    eprintln!("  map-admin ping           Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MESHMAP_SOCKET  Path to admin socket (default: ./meshmap-data/admin.sock)");
}

fn get_socket_path() -> PathBuf {
    std::env::var("MESHMAP_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./meshmap-data/admin.sock"))
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to map-node at {:?}: {}\n\
             Is the map-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "migrate-keys" => AdminCommand::MigrateKeys,
        "stats" => AdminCommand::Stats,
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::Migration {
                migrated,
                skipped,
                failed,
            } => {
                println!("migrated: {}", migrated);
                println!("skipped:  {}", skipped);
                println!("failed:   {}", failed);
                if failed > 0 {
                    std::process::exit(1);
                }
            }
            AdminResponse::Stats { samples, nodes } => {
                println!("samples: {}", samples);
                println!("nodes:   {}", nodes);
            }
            AdminResponse::Pong => {
                println!("pong - map-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
