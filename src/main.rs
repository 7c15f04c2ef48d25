//! Main entry point for the EMR server.
//!
//! Resolves configuration from the environment (a `.env` file is honoured)
//! and runs the FHIR REST API until it fails or is shut down.
//!
//! # Environment Variables
//! - `EMR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
//! - `EMR_DB_PATH`: SQLite database file (default: "emr.db")
//! - `EMR_PUBLIC_BASE_URL`: URL prefix for `Location` headers and bundle
//!   `fullUrl`s (default: "http://localhost:3000")

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    api_rest::serve().await
}
