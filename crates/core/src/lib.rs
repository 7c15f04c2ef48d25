//! # EMR Core
//!
//! Persistence and configuration for the EMR server.
//!
//! This crate contains the relational resource store and startup
//! configuration:
//! - SQLite-backed storage for patients, appointments and encounters
//! - Foreign keys from child records to patients with cascade delete
//! - Store error taxonomy shared with the HTTP layer
//!
//! **No API concerns**: HTTP routing, wire parsing and status-code mapping
//! belong in `api-rest`; wire translation belongs in the `fhir` crate.

pub mod config;
pub mod error;
pub mod store;

pub use config::CoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::EmrStore;
