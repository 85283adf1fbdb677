//! OrgChart HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin orgchart-server
//!
//! # Custom port and database
//! ORGCHART_PORT=3002 ORGCHART_DB_PATH=/tmp/org.db cargo run --bin orgchart-server
//! ```
//!
//! See `orgchart_server::config` for every environment variable.

use orgchart_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("OrgChart HTTP Server");

    let config = ServerConfig::from_env()?;
    tracing::info!("Port: {}", config.port);
    tracing::info!("Store: {:?}", config.store);
    tracing::info!("Policy: {:?}", config.policy);

    orgchart_server::start_server(config).await?;

    Ok(())
}
