//! # API REST
//!
//! FHIR-flavoured REST API for the EMR server.
//!
//! Handles:
//! - HTTP endpoints with axum under `/fhir/{Patient,Appointment,Encounter}`
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//! - searchset `Bundle` envelopes for multi-record responses
//!
//! Wire translation lives in the `fhir` crate; persistence in `emr-core`.
//! Handlers only glue the two together: parse body, call the store, render
//! the persisted record back out.

#![warn(rust_2018_idioms)]

pub mod appointments;
pub mod encounters;
pub mod error;
pub mod patients;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use emr_core::{CoreConfig, EmrStore};
use fhir::{BundleEntryWire, BundleWire};

pub use error::ApiError;

/// Application state shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: EmrStore,
    base_url: Arc<str>,
}

impl AppState {
    /// `public_base_url` must not carry a trailing slash; [`CoreConfig`]
    /// normalizes it.
    pub fn new(store: EmrStore, public_base_url: &str) -> Self {
        Self {
            store,
            base_url: Arc::from(public_base_url),
        }
    }

    /// Absolute URL of one resource, used for `Location` headers and bundle
    /// entry `fullUrl`s.
    pub(crate) fn resource_url(&self, kind: &str, id: &str) -> String {
        format!("{}/fhir/{kind}/{id}", self.base_url)
    }

    /// Render records into a searchset bundle with one entry per record.
    pub(crate) fn searchset<R, W, F>(
        &self,
        kind: &str,
        records: &[R],
        render: F,
    ) -> Result<BundleWire, ApiError>
    where
        W: serde::Serialize,
        F: Fn(&R) -> (String, W),
    {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let (id, wire) = render(record);
            let resource =
                serde_json::to_value(wire).map_err(|e| ApiError::Internal(e.to_string()))?;
            entries.push(BundleEntryWire::new(self.resource_url(kind, &id), resource));
        }
        Ok(BundleWire::searchset(entries))
    }
}

/// Build the application router. Separate from [`serve`] so integration tests
/// can drive the router directly.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/fhir/Patient", get(patients::list).post(patients::create))
        .route(
            "/fhir/Patient/:id",
            get(patients::read)
                .put(patients::update)
                .delete(patients::delete),
        )
        .route(
            "/fhir/Patient/:id/Appointment",
            get(appointments::for_patient),
        )
        .route("/fhir/Patient/:id/Encounter", get(encounters::for_patient))
        .route(
            "/fhir/Appointment",
            get(appointments::list).post(appointments::create),
        )
        .route("/fhir/Appointment/search", get(appointments::search))
        .route(
            "/fhir/Appointment/:id",
            get(appointments::read)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route(
            "/fhir/Encounter",
            get(encounters::list).post(encounters::create),
        )
        .route("/fhir/Encounter/search", get(encounters::search))
        .route(
            "/fhir/Encounter/:id",
            get(encounters::read)
                .put(encounters::update)
                .delete(encounters::delete),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve configuration from the environment, open the store and run the
/// HTTP server until it fails or is shut down.
///
/// # Environment Variables
/// - `EMR_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `EMR_DB_PATH`: SQLite database file (default: "emr.db")
/// - `EMR_PUBLIC_BASE_URL`: URL prefix for `Location` headers and bundle
///   `fullUrl`s (default: "http://localhost:3000")
///
/// # Errors
/// Returns an error if the database cannot be opened, the address cannot be
/// bound, or the server fails while running.
pub async fn serve() -> anyhow::Result<()> {
    let addr = std::env::var("EMR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let db_path = std::env::var("EMR_DB_PATH").unwrap_or_else(|_| "emr.db".into());
    let base_url =
        std::env::var("EMR_PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

    let cfg = CoreConfig::new(PathBuf::from(db_path), base_url);
    let store = EmrStore::open(cfg.db_path())?;
    let state = AppState::new(store, cfg.public_base_url());

    tracing::info!("-- Starting EMR REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
