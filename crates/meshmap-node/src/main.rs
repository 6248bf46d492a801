//! Map node binary
//!
//! A coverage map aggregation node for mesh radio networks.

use meshmap_node::{MapConfig, MapNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "map_node=info,meshmap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting map node");

    let config = MapConfig::default();

    let node = MapNode::new(config).await?;
    node.run().await?;

    Ok(())
}
