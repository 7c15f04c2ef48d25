//! FHIR-aligned appointment wire model and translation helpers.
//!
//! The owning patient travels on the wire as a single participant whose actor
//! reference is the literal string `Patient/{id}`.
//!
//! Status handling is deliberately asymmetric: rendering maps the stored
//! status through the fixed code table (unrecognized values become `booked`),
//! while parsing keeps an unrecognized wire status as its raw lower-cased
//! string.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::AppointmentRecord;
use crate::{
    deserialize_wire, non_empty, parse_instant, FhirError, FhirResult, MetaWire, ReferenceWire,
};

/// Appointment status codes recognized by this system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
    Fulfilled,
    Noshow,
}

impl AppointmentStatus {
    fn to_wire(self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Fulfilled => "fulfilled",
            AppointmentStatus::Noshow => "noshow",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(AppointmentStatus::Booked),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "fulfilled" => Some(AppointmentStatus::Fulfilled),
            "noshow" => Some(AppointmentStatus::Noshow),
            _ => None,
        }
    }
}

/// Appointment resource operations.
pub struct Appointment;

impl Appointment {
    /// Parse an `Appointment` wire resource into a flat [`AppointmentRecord`].
    ///
    /// Missing `start`/`end` instants default to now and now + 1 hour; the
    /// owning patient id is taken from the first participant whose actor
    /// reference starts with `Patient/` (empty when none matches).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not match the wire schema or
    /// `resourceType` is not `"Appointment"`.
    pub fn parse(value: serde_json::Value) -> FhirResult<AppointmentRecord> {
        let wire: AppointmentWire = deserialize_wire(value, "Appointment")?;

        if wire.resource_type != "Appointment" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Appointment', got '{}'",
                wire.resource_type
            )));
        }

        let record = wire_to_record(wire);
        tracing::debug!(
            appointment_id = %record.id,
            patient_id = %record.patient_id,
            "parsed Appointment resource"
        );
        Ok(record)
    }

    /// Render a flat [`AppointmentRecord`] as an `Appointment` wire resource.
    pub fn render(record: &AppointmentRecord) -> AppointmentWire {
        AppointmentWire {
            resource_type: "Appointment".to_string(),
            id: record.id.clone(),
            meta: Some(MetaWire {
                last_updated: Some(record.updated_at.to_rfc3339()),
            }),
            status: Some(
                AppointmentStatus::from_wire(&record.status)
                    .unwrap_or(AppointmentStatus::Booked)
                    .to_wire()
                    .to_string(),
            ),
            start: Some(record.start.to_rfc3339()),
            end: Some(record.end.to_rfc3339()),
            description: non_empty(&record.description),
            participant: vec![ParticipantWire {
                actor: Some(ReferenceWire {
                    reference: Some(format!("Patient/{}", record.patient_id)),
                }),
            }],
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of an appointment resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppointmentWire {
    #[serde(rename = "resourceType", default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<ParticipantWire>,
}

/// Wire representation of an appointment participant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParticipantWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ReferenceWire>,
}

// ============================================================================
// Translation helpers
// ============================================================================

fn wire_to_record(wire: AppointmentWire) -> AppointmentRecord {
    let now = Utc::now();

    // Unrecognized wire statuses are kept verbatim (lower-cased), not forced
    // back through the code table.
    let status = wire
        .status
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "booked".to_string());

    let start = wire
        .start
        .as_deref()
        .and_then(parse_instant)
        .unwrap_or(now);
    let end = wire
        .end
        .as_deref()
        .and_then(parse_instant)
        .unwrap_or_else(|| now + Duration::hours(1));

    let patient_id = wire
        .participant
        .iter()
        .filter_map(|p| p.actor.as_ref().and_then(|a| a.reference.as_deref()))
        .find_map(|r| r.strip_prefix("Patient/"))
        .unwrap_or_default()
        .to_string();

    AppointmentRecord {
        id: if wire.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            wire.id
        },
        patient_id,
        start,
        end,
        status,
        description: wire.description.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use serde_json::json;

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid instant")
    }

    #[test]
    fn renders_appointment_with_participant_reference() {
        let record = AppointmentRecord {
            id: "appointment-id".to_string(),
            patient_id: "patient-id".to_string(),
            start: instant("2025-06-01T10:00:00Z"),
            end: instant("2025-06-01T11:00:00Z"),
            status: "fulfilled".to_string(),
            description: "Annual checkup".to_string(),
            ..AppointmentRecord::default()
        };

        let wire = Appointment::render(&record);
        assert_eq!(wire.resource_type, "Appointment");
        assert_eq!(wire.status.as_deref(), Some("fulfilled"));
        assert_eq!(wire.start.as_deref(), Some("2025-06-01T10:00:00+00:00"));
        assert_eq!(wire.end.as_deref(), Some("2025-06-01T11:00:00+00:00"));
        assert_eq!(wire.description.as_deref(), Some("Annual checkup"));
        assert_eq!(wire.participant.len(), 1);
        assert_eq!(
            wire.participant[0]
                .actor
                .as_ref()
                .and_then(|a| a.reference.as_deref()),
            Some("Patient/patient-id")
        );
    }

    #[test]
    fn unrecognized_stored_status_renders_as_booked() {
        let record = AppointmentRecord {
            status: "confirmed".to_string(),
            ..AppointmentRecord::default()
        };
        assert_eq!(
            Appointment::render(&record).status.as_deref(),
            Some("booked")
        );
    }

    #[test]
    fn parses_appointment_and_strips_patient_prefix() {
        let record = Appointment::parse(json!({
            "resourceType": "Appointment",
            "id": "fhir-appointment-id",
            "status": "Cancelled",
            "start": "2025-06-02T09:00:00Z",
            "end": "2025-06-02T09:30:00Z",
            "description": "Follow-up visit",
            "participant": [
                {"actor": {"reference": "Practitioner/doc-1"}},
                {"actor": {"reference": "Patient/patient-7"}}
            ]
        }))
        .expect("parse appointment");

        assert_eq!(record.id, "fhir-appointment-id");
        assert_eq!(record.status, "cancelled");
        assert_eq!(record.start, instant("2025-06-02T09:00:00Z"));
        assert_eq!(record.end, instant("2025-06-02T09:30:00Z"));
        assert_eq!(record.description, "Follow-up visit");
        // First participant with a Patient/ reference wins.
        assert_eq!(record.patient_id, "patient-7");
    }

    #[test]
    fn unrecognized_wire_status_is_kept_verbatim() {
        let record = Appointment::parse(json!({
            "resourceType": "Appointment",
            "status": "Proposed"
        }))
        .expect("parse appointment");
        assert_eq!(record.status, "proposed");

        // The asymmetry: rendering it back goes through the code table.
        let rendered = Appointment::render(&record);
        assert_eq!(rendered.status.as_deref(), Some("booked"));
    }

    #[test]
    fn recognized_status_round_trips_exactly() {
        for status in ["booked", "cancelled", "fulfilled", "noshow"] {
            let record = Appointment::parse(json!({
                "resourceType": "Appointment",
                "status": status
            }))
            .expect("parse appointment");
            let wire = Appointment::render(&record);
            assert_eq!(wire.status.as_deref(), Some(status));
        }
    }

    #[test]
    fn missing_times_default_to_a_one_hour_slot() {
        let before = Utc::now();
        let record = Appointment::parse(json!({"resourceType": "Appointment"}))
            .expect("parse appointment");
        let after = Utc::now();

        assert!(record.start >= before && record.start <= after);
        assert_eq!(record.end - record.start, Duration::hours(1));
        assert_eq!(record.status, "booked");
        assert_eq!(record.patient_id, "");
    }

    #[test]
    fn rejects_wrong_resource_type() {
        let err = Appointment::parse(json!({"resourceType": "Patient"}))
            .expect_err("should reject resourceType");
        assert!(matches!(err, FhirError::InvalidInput(_)));
    }
}
