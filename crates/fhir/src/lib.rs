//! FHIR wire/boundary support for the EMR server.
//!
//! This crate provides **wire models** and **translation helpers** for the JSON
//! resources exchanged with clients:
//! - `Patient`, `Appointment` and `Encounter` resources
//! - `Bundle` (searchset) envelopes
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the subset of fields this system supports
//! - serialisation/deserialisation
//! - translation between flat entity records and the nested wire structs
//!
//! Translation is deterministic and performs no I/O. Missing optional wire
//! fields never raise; they resolve to documented defaults. Only the first
//! element of multi-valued wire arrays (name, telecom per system, address,
//! participant) is ever consulted.

pub mod address;
pub mod appointment;
pub mod bundle;
pub mod encounter;
pub mod patient;
pub mod records;

// Re-export facades
pub use appointment::Appointment;
pub use bundle::{BundleEntryWire, BundleWire};
pub use encounter::Encounter;
pub use patient::Patient;

// Re-export flat entity records
pub use records::{AppointmentRecord, EncounterRecord, PatientRecord};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Wire representation of resource metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MetaWire {
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Wire representation of a literal resource reference (e.g. `Patient/{id}`).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReferenceWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Deserialize a wire struct from a JSON value, surfacing a best-effort
/// "path" (e.g. `name.0.given`) to the failing field when the body does not
/// match the wire schema.
pub(crate) fn deserialize_wire<T>(value: serde_json::Value, kind: &str) -> FhirResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() {
            "<root>".to_string()
        } else {
            path
        };
        FhirError::Translation(format!("{kind} schema mismatch at {path}: {source}"))
    })
}

/// Parse a wire instant, accepting RFC 3339 strings with or without a zone
/// designator. Naive timestamps are taken as UTC.
pub(crate) fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| Utc.from_utc_datetime(&n))
}

/// `Some(s)` when `s` is non-empty, otherwise `None`.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zoned_and_naive_instants() {
        let zoned = parse_instant("2025-06-01T10:30:00.000Z").expect("zoned instant");
        assert_eq!(zoned.to_rfc3339(), "2025-06-01T10:30:00+00:00");

        let naive = parse_instant("2025-06-01T10:30:00").expect("naive instant");
        assert_eq!(naive, zoned);

        assert!(parse_instant("not-a-date").is_none());
    }
}
