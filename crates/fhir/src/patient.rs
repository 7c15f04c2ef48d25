//! FHIR-aligned patient wire model and translation helpers.
//!
//! Responsibilities:
//! - Define the wire model for the `Patient` resource subset this system
//!   supports
//! - Translate between [`PatientRecord`] rows and the wire model in both
//!   directions
//! - Normalize gender codes and address use/type codes at the boundary
//!
//! Notes:
//! - Only the first name, first phone-system telecom entry, first
//!   email-system telecom entry and first address are ever consulted when
//!   parsing; additional elements are silently dropped.
//! - Absent wire fields never raise; they resolve to documented defaults.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::format_address_text;
use crate::records::PatientRecord;
use crate::{deserialize_wire, non_empty, FhirError, FhirResult, MetaWire};

/// Calendar-date format used for the wire `birthDate` string.
const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Administrative gender codes recognized by this system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

/// Purpose of a postal address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressUse {
    Home,
    Work,
    Temp,
    Old,
    Billing,
}

impl AddressUse {
    fn to_wire(self) -> &'static str {
        match self {
            AddressUse::Home => "home",
            AddressUse::Work => "work",
            AddressUse::Temp => "temp",
            AddressUse::Old => "old",
            AddressUse::Billing => "billing",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "home" => Some(AddressUse::Home),
            "work" => Some(AddressUse::Work),
            "temp" => Some(AddressUse::Temp),
            "old" => Some(AddressUse::Old),
            "billing" => Some(AddressUse::Billing),
            _ => None,
        }
    }
}

/// Form of a postal address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressType {
    Postal,
    Physical,
    Both,
}

impl AddressType {
    fn to_wire(self) -> &'static str {
        match self {
            AddressType::Postal => "postal",
            AddressType::Physical => "physical",
            AddressType::Both => "both",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "postal" => Some(AddressType::Postal),
            "physical" => Some(AddressType::Physical),
            "both" => Some(AddressType::Both),
            _ => None,
        }
    }
}

/// Patient resource operations.
///
/// Zero-sized type used for namespacing; all methods are associated
/// functions.
pub struct Patient;

impl Patient {
    /// Parse a `Patient` wire resource into a flat [`PatientRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not match the wire schema or
    /// `resourceType` is not `"Patient"`. Absent fields are not errors; they
    /// resolve to the documented defaults (empty strings, gender `unknown`,
    /// birth date sentinel `1970-01-01`).
    pub fn parse(value: serde_json::Value) -> FhirResult<PatientRecord> {
        let wire: PatientWire = deserialize_wire(value, "Patient")?;

        if wire.resource_type != "Patient" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Patient', got '{}'",
                wire.resource_type
            )));
        }

        let record = wire_to_record(wire);
        tracing::debug!(patient_id = %record.id, "parsed Patient resource");
        Ok(record)
    }

    /// Render a flat [`PatientRecord`] as a `Patient` wire resource.
    pub fn render(record: &PatientRecord) -> PatientWire {
        record_to_wire(record)
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of a patient resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PatientWire {
    #[serde(rename = "resourceType", default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<AddressWire>,
}

/// Wire representation of a human name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HumanNameWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// Wire representation of a telecom contact point.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContactPointWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_code: Option<String>,
}

/// Wire representation of a postal address.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AddressWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_code: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// ============================================================================
// Translation helpers
// ============================================================================

fn wire_to_record(wire: PatientWire) -> PatientRecord {
    let name = wire.name.first();
    let family_name = name
        .and_then(|n| n.family.clone())
        .unwrap_or_default();
    let given_name = name
        .and_then(|n| n.given.first().cloned())
        .unwrap_or_default();

    let birth_date = wire
        .birth_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, BIRTH_DATE_FORMAT).ok())
        .unwrap_or_default();

    let gender = wire
        .gender
        .as_deref()
        .map(str::to_lowercase)
        .filter(|g| AdministrativeGender::from_wire(g).is_some())
        .unwrap_or_else(|| "unknown".to_string());

    let phone = first_telecom_value(&wire.telecom, "phone");
    let email = first_telecom_value(&wire.telecom, "email");

    let address = wire.address.into_iter().next().unwrap_or_default();
    let lines: Vec<String> = address
        .line
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect();
    let address_lines = if lines.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&lines).unwrap_or_default()
    };

    PatientRecord {
        id: if wire.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            wire.id
        },
        family_name,
        given_name,
        birth_date,
        gender,
        phone,
        email,
        // Use/type codes are stored verbatim; defaulting happens on render.
        address_use: address.use_code.unwrap_or_default(),
        address_type: address.type_code.unwrap_or_default(),
        address_text: address.text.unwrap_or_default(),
        address_lines,
        address_city: address.city.unwrap_or_default(),
        address_district: address.district.unwrap_or_default(),
        address_state: address.state.unwrap_or_default(),
        address_postal_code: address.postal_code.unwrap_or_default(),
        address_country: address.country.unwrap_or_default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn record_to_wire(record: &PatientRecord) -> PatientWire {
    let mut telecom = Vec::new();
    if !record.phone.is_empty() {
        telecom.push(ContactPointWire {
            system: Some("phone".to_string()),
            value: Some(record.phone.clone()),
            use_code: Some("mobile".to_string()),
        });
    }
    if !record.email.is_empty() {
        telecom.push(ContactPointWire {
            system: Some("email".to_string()),
            value: Some(record.email.clone()),
            use_code: Some("home".to_string()),
        });
    }

    PatientWire {
        resource_type: "Patient".to_string(),
        id: record.id.clone(),
        meta: Some(MetaWire {
            last_updated: Some(record.updated_at.to_rfc3339()),
        }),
        name: vec![HumanNameWire {
            use_code: Some("official".to_string()),
            family: non_empty(&record.family_name),
            given: if record.given_name.is_empty() {
                Vec::new()
            } else {
                vec![record.given_name.clone()]
            },
        }],
        birth_date: Some(record.birth_date.format(BIRTH_DATE_FORMAT).to_string()),
        gender: AdministrativeGender::from_wire(&record.gender)
            .map(|g| g.to_wire().to_string()),
        telecom,
        address: render_address(record).into_iter().collect(),
    }
}

fn first_telecom_value(telecom: &[ContactPointWire], system: &str) -> String {
    telecom
        .iter()
        .find(|t| t.system.as_deref() == Some(system))
        .and_then(|t| t.value.clone())
        .unwrap_or_default()
}

/// Decode the stored JSON-array line representation. A non-empty stored value
/// that is not valid JSON is treated as a single line rather than dropped.
fn stored_lines(stored: &str) -> Vec<String> {
    if stored.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(stored) {
        Ok(lines) => lines.into_iter().filter(|l| !l.is_empty()).collect(),
        Err(_) => vec![stored.to_string()],
    }
}

/// Build the single wire address element, or `None` when every structured
/// field and the free-text rendering are empty.
fn render_address(record: &PatientRecord) -> Option<AddressWire> {
    let lines = stored_lines(&record.address_lines);

    let has_content = !record.address_text.is_empty()
        || !lines.is_empty()
        || !record.address_city.is_empty()
        || !record.address_district.is_empty()
        || !record.address_state.is_empty()
        || !record.address_postal_code.is_empty()
        || !record.address_country.is_empty();
    if !has_content {
        return None;
    }

    let text = if record.address_text.is_empty() {
        format_address_text(
            &lines,
            &record.address_city,
            &record.address_state,
            &record.address_postal_code,
            &record.address_country,
        )
    } else {
        record.address_text.clone()
    };

    Some(AddressWire {
        use_code: Some(
            AddressUse::from_wire(&record.address_use)
                .unwrap_or(AddressUse::Home)
                .to_wire()
                .to_string(),
        ),
        type_code: Some(
            AddressType::from_wire(&record.address_type)
                .unwrap_or(AddressType::Physical)
                .to_wire()
                .to_string(),
        ),
        text: non_empty(&text),
        line: lines,
        city: non_empty(&record.address_city),
        district: non_empty(&record.address_district),
        state: non_empty(&record.address_state),
        postal_code: non_empty(&record.address_postal_code),
        country: non_empty(&record.address_country),
    })
}
