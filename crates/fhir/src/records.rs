//! Flat entity records persisted by the resource store.
//!
//! These are the relational counterparts of the wire resources: one row per
//! record, multi-valued wire structures flattened to single columns. The
//! stored `address_lines` column holds a JSON-serialized array of strings
//! (empty string when no lines are present).
//!
//! Status and gender columns are plain strings rather than enums because the
//! store may hold values that arrived from the wire unrecognized; the enum
//! tables live at the wire boundary (see [`crate::patient`],
//! [`crate::appointment`], [`crate::encounter`]).

use chrono::{DateTime, NaiveDate, Utc};

/// Flat patient demographics record.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientRecord {
    /// Opaque identifier; assigned by the store when empty.
    pub id: String,
    pub family_name: String,
    /// Single given name; the wire format carries a list but only the first
    /// value is kept.
    pub given_name: String,
    /// Calendar date, no time component. Missing or unparseable wire input
    /// stores the `1970-01-01` sentinel.
    pub birth_date: NaiveDate,
    /// Always lower-case, one of `male|female|other|unknown`.
    pub gender: String,
    pub phone: String,
    pub email: String,
    /// Raw address use code (`home | work | temp | old | billing`).
    pub address_use: String,
    /// Raw address type code (`postal | physical | both`).
    pub address_type: String,
    /// Free-text rendering of the address.
    pub address_text: String,
    /// JSON-serialized array of street lines, e.g. `["123 Main St","Apt 4B"]`.
    pub address_lines: String,
    pub address_city: String,
    pub address_district: String,
    pub address_state: String,
    pub address_postal_code: String,
    pub address_country: String,
    /// Set by the store on create.
    pub created_at: DateTime<Utc>,
    /// Set by the store on every write.
    pub updated_at: DateTime<Utc>,
}

impl Default for PatientRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            family_name: String::new(),
            given_name: String::new(),
            birth_date: NaiveDate::default(),
            gender: "unknown".to_string(),
            phone: String::new(),
            email: String::new(),
            address_use: String::new(),
            address_type: String::new(),
            address_text: String::new(),
            address_lines: String::new(),
            address_city: String::new(),
            address_district: String::new(),
            address_state: String::new(),
            address_postal_code: String::new(),
            address_country: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Flat appointment record, owned by a patient.
#[derive(Clone, Debug, PartialEq)]
pub struct AppointmentRecord {
    pub id: String,
    /// Owning patient id; must reference an existing patient.
    pub patient_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `booked|cancelled|fulfilled|noshow`, or an unrecognized lower-cased
    /// wire value kept verbatim.
    pub status: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AppointmentRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            patient_id: String::new(),
            start: now,
            end: now,
            status: "booked".to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Flat encounter record, owned by a patient.
///
/// Only the start instant is stored; the wire period end is always derived as
/// start + 1 hour.
#[derive(Clone, Debug, PartialEq)]
pub struct EncounterRecord {
    pub id: String,
    /// Owning patient id; must reference an existing patient.
    pub patient_id: String,
    /// Encounter start instant.
    pub date: DateTime<Utc>,
    /// `planned|arrived|in-progress|finished|cancelled`, or an unrecognized
    /// lower-cased wire value kept verbatim.
    pub status: String,
    /// Plain-text clinical notes; wrapped in an XHTML envelope on the wire.
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for EncounterRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            patient_id: String::new(),
            date: now,
            status: "in-progress".to_string(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
