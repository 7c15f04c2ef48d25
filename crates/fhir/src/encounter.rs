//! FHIR-aligned encounter wire model and translation helpers.
//!
//! Only the encounter start instant is stored; the wire period end is always
//! derived as start + exactly 1 hour. Clinical notes travel as a narrative
//! block wrapped in a fixed XHTML envelope, which is matched by literal
//! substring removal on the way back in (not XML parsing) for compatibility
//! with the existing wire contract.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::EncounterRecord;
use crate::{deserialize_wire, parse_instant, FhirError, FhirResult, MetaWire, ReferenceWire};

/// Wire timestamp format for the encounter period.
const PERIOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Fixed XHTML envelope around narrative notes.
const NARRATIVE_DIV_OPEN: &str = r#"<div xmlns="http://www.w3.org/1999/xhtml">"#;
const NARRATIVE_DIV_CLOSE: &str = "</div>";

/// Encounter status codes recognized by this system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterStatus {
    Planned,
    Arrived,
    InProgress,
    Finished,
    Cancelled,
}

impl EncounterStatus {
    fn to_wire(self) -> &'static str {
        match self {
            EncounterStatus::Planned => "planned",
            EncounterStatus::Arrived => "arrived",
            EncounterStatus::InProgress => "in-progress",
            EncounterStatus::Finished => "finished",
            EncounterStatus::Cancelled => "cancelled",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(EncounterStatus::Planned),
            "arrived" => Some(EncounterStatus::Arrived),
            "in-progress" => Some(EncounterStatus::InProgress),
            "finished" => Some(EncounterStatus::Finished),
            "cancelled" => Some(EncounterStatus::Cancelled),
            _ => None,
        }
    }
}

/// Encounter resource operations.
pub struct Encounter;

impl Encounter {
    /// Parse an `Encounter` wire resource into a flat [`EncounterRecord`].
    ///
    /// The start instant comes from `period.start` (now when missing or
    /// unparseable); any wire `period.end` is ignored. Notes are recovered by
    /// stripping the fixed XHTML envelope from the narrative div.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not match the wire schema or
    /// `resourceType` is not `"Encounter"`.
    pub fn parse(value: serde_json::Value) -> FhirResult<EncounterRecord> {
        let wire: EncounterWire = deserialize_wire(value, "Encounter")?;

        if wire.resource_type != "Encounter" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Encounter', got '{}'",
                wire.resource_type
            )));
        }

        let record = wire_to_record(wire);
        tracing::debug!(
            encounter_id = %record.id,
            patient_id = %record.patient_id,
            "parsed Encounter resource"
        );
        Ok(record)
    }

    /// Render a flat [`EncounterRecord`] as an `Encounter` wire resource.
    pub fn render(record: &EncounterRecord) -> EncounterWire {
        EncounterWire {
            resource_type: "Encounter".to_string(),
            id: record.id.clone(),
            meta: Some(MetaWire {
                last_updated: Some(record.updated_at.to_rfc3339()),
            }),
            status: Some(
                EncounterStatus::from_wire(&record.status)
                    .unwrap_or(EncounterStatus::InProgress)
                    .to_wire()
                    .to_string(),
            ),
            subject: Some(ReferenceWire {
                reference: Some(format!("Patient/{}", record.patient_id)),
            }),
            period: Some(PeriodWire {
                start: Some(record.date.format(PERIOD_FORMAT).to_string()),
                end: Some((record.date + Duration::hours(1)).format(PERIOD_FORMAT).to_string()),
            }),
            text: if record.notes.is_empty() {
                None
            } else {
                Some(NarrativeWire {
                    status: Some("generated".to_string()),
                    div: Some(format!(
                        "{NARRATIVE_DIV_OPEN}{}{NARRATIVE_DIV_CLOSE}",
                        record.notes
                    )),
                })
            },
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of an encounter resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct EncounterWire {
    #[serde(rename = "resourceType", default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ReferenceWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<NarrativeWire>,
}

/// Wire representation of a time period.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PeriodWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Wire representation of a narrative block.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NarrativeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div: Option<String>,
}

// ============================================================================
// Translation helpers
// ============================================================================

fn wire_to_record(wire: EncounterWire) -> EncounterRecord {
    let now = Utc::now();

    let status = wire
        .status
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "in-progress".to_string());

    let date = wire
        .period
        .as_ref()
        .and_then(|p| p.start.as_deref())
        .and_then(parse_instant)
        .unwrap_or(now);

    let patient_id = wire
        .subject
        .as_ref()
        .and_then(|s| s.reference.as_deref())
        .and_then(|r| r.strip_prefix("Patient/"))
        .unwrap_or_default()
        .to_string();

    // Literal substring removal, all occurrences. Notes that themselves
    // contain the envelope text are corrupted here; kept for wire
    // compatibility.
    let notes = wire
        .text
        .and_then(|t| t.div)
        .map(|div| div.replace(NARRATIVE_DIV_OPEN, "").replace(NARRATIVE_DIV_CLOSE, ""))
        .unwrap_or_default();

    EncounterRecord {
        id: if wire.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            wire.id
        },
        patient_id,
        date,
        status,
        notes,
        created_at: now,
        updated_at: now,
    }
}
