//! SQLite-backed resource store.
//!
//! One table per record kind, flat columns matching the record structs in the
//! `fhir` crate. Child tables carry a foreign key to `patients` with
//! `ON DELETE CASCADE`, so deleting a patient removes its appointments and
//! encounters in the same statement.
//!
//! The store owns id assignment and the `created_at`/`updated_at` stamps:
//! creates assign a fresh UUID when the record id is empty and set both
//! stamps; updates preserve the original id and `created_at` and refresh
//! `updated_at`. Every operation takes the connection lock once, so each call
//! is atomic with respect to other callers.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use fhir::{AppointmentRecord, EncounterRecord, PatientRecord};

use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS patients (
    id                  TEXT PRIMARY KEY,
    family_name         TEXT NOT NULL DEFAULT '',
    given_name          TEXT NOT NULL DEFAULT '',
    birth_date          TEXT NOT NULL DEFAULT '1970-01-01',
    gender              TEXT NOT NULL DEFAULT 'unknown',
    phone               TEXT NOT NULL DEFAULT '',
    email               TEXT NOT NULL DEFAULT '',
    address_use         TEXT NOT NULL DEFAULT '',
    address_type        TEXT NOT NULL DEFAULT '',
    address_text        TEXT NOT NULL DEFAULT '',
    address_lines       TEXT NOT NULL DEFAULT '',
    address_city        TEXT NOT NULL DEFAULT '',
    address_district    TEXT NOT NULL DEFAULT '',
    address_state       TEXT NOT NULL DEFAULT '',
    address_postal_code TEXT NOT NULL DEFAULT '',
    address_country     TEXT NOT NULL DEFAULT '',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    id          TEXT PRIMARY KEY,
    patient_id  TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    start_time  TEXT NOT NULL,
    end_time    TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'booked',
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS encounters (
    id         TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date       TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'in-progress',
    notes      TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_encounters_patient ON encounters(patient_id);
";

const PATIENT_COLUMNS: &str = "id, family_name, given_name, birth_date, gender, phone, email, \
    address_use, address_type, address_text, address_lines, address_city, address_district, \
    address_state, address_postal_code, address_country, created_at, updated_at";

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, start_time, end_time, status, description, created_at, updated_at";

const ENCOUNTER_COLUMNS: &str =
    "id, patient_id, date, status, notes, created_at, updated_at";

/// Cloneable handle to the shared SQLite connection.
#[derive(Clone)]
pub struct EmrStore {
    conn: Arc<Mutex<Connection>>,
}

impl EmrStore {
    /// Open (creating if necessary) a file-backed store.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open a fresh in-memory store. Used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------

    /// Persist a new patient, assigning an id when absent and stamping both
    /// timestamps.
    pub fn create_patient(&self, mut record: PatientRecord) -> StoreResult<PatientRecord> {
        assign_identity(&mut record.id, &mut record.created_at, &mut record.updated_at);

        self.conn().execute(
            &format!(
                "INSERT INTO patients ({PATIENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                record.id,
                record.family_name,
                record.given_name,
                record.birth_date,
                record.gender,
                record.phone,
                record.email,
                record.address_use,
                record.address_type,
                record.address_text,
                record.address_lines,
                record.address_city,
                record.address_district,
                record.address_state,
                record.address_postal_code,
                record.address_country,
                record.created_at,
                record.updated_at,
            ],
        )?;

        tracing::debug!(patient_id = %record.id, "created patient");
        Ok(record)
    }

    pub fn get_patient(&self, id: &str) -> StoreResult<PatientRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
                params![id],
                row_to_patient,
            )
            .map_err(|e| map_not_found(e, "Patient", id))
    }

    pub fn patient_exists(&self, id: &str) -> StoreResult<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn list_patients(&self) -> StoreResult<Vec<PatientRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients"))?;
        let records = stmt
            .query_map([], row_to_patient)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Full replace of the patient's mutable fields, preserving the original
    /// id and `created_at` and refreshing `updated_at`.
    pub fn update_patient(&self, id: &str, mut record: PatientRecord) -> StoreResult<PatientRecord> {
        let conn = self.conn();

        record.created_at = created_at_of(&conn, "patients", "Patient", id)?;
        record.id = id.to_string();
        record.updated_at = Utc::now();

        conn.execute(
            "UPDATE patients SET family_name = ?2, given_name = ?3, birth_date = ?4, \
             gender = ?5, phone = ?6, email = ?7, address_use = ?8, address_type = ?9, \
             address_text = ?10, address_lines = ?11, address_city = ?12, \
             address_district = ?13, address_state = ?14, address_postal_code = ?15, \
             address_country = ?16, updated_at = ?17 WHERE id = ?1",
            params![
                record.id,
                record.family_name,
                record.given_name,
                record.birth_date,
                record.gender,
                record.phone,
                record.email,
                record.address_use,
                record.address_type,
                record.address_text,
                record.address_lines,
                record.address_city,
                record.address_district,
                record.address_state,
                record.address_postal_code,
                record.address_country,
                record.updated_at,
            ],
        )?;

        Ok(record)
    }

    /// Delete a patient; the foreign-key referential action removes its
    /// appointments and encounters in the same call.
    pub fn delete_patient(&self, id: &str) -> StoreResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM patients WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("Patient/{id}")));
        }
        tracing::debug!(patient_id = %id, "deleted patient and owned records");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------

    /// Persist a new appointment. Fails with [`StoreError::UnknownPatient`]
    /// before writing anything when the owning patient does not exist.
    pub fn create_appointment(
        &self,
        mut record: AppointmentRecord,
    ) -> StoreResult<AppointmentRecord> {
        assign_identity(&mut record.id, &mut record.created_at, &mut record.updated_at);

        let conn = self.conn();
        require_patient(&conn, &record.patient_id)?;

        conn.execute(
            &format!(
                "INSERT INTO appointments ({APPOINTMENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                record.id,
                record.patient_id,
                record.start,
                record.end,
                record.status,
                record.description,
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(record)
    }

    pub fn get_appointment(&self, id: &str) -> StoreResult<AppointmentRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
                params![id],
                row_to_appointment,
            )
            .map_err(|e| map_not_found(e, "Appointment", id))
    }

    pub fn list_appointments(&self) -> StoreResult<Vec<AppointmentRecord>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments"))?;
        let records = stmt
            .query_map([], row_to_appointment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> StoreResult<Vec<AppointmentRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1"
        ))?;
        let records = stmt
            .query_map(params![patient_id], row_to_appointment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn update_appointment(
        &self,
        id: &str,
        mut record: AppointmentRecord,
    ) -> StoreResult<AppointmentRecord> {
        let conn = self.conn();

        record.created_at = created_at_of(&conn, "appointments", "Appointment", id)?;
        require_patient(&conn, &record.patient_id)?;
        record.id = id.to_string();
        record.updated_at = Utc::now();

        conn.execute(
            "UPDATE appointments SET patient_id = ?2, start_time = ?3, end_time = ?4, \
             status = ?5, description = ?6, updated_at = ?7 WHERE id = ?1",
            params![
                record.id,
                record.patient_id,
                record.start,
                record.end,
                record.status,
                record.description,
                record.updated_at,
            ],
        )?;

        Ok(record)
    }

    pub fn delete_appointment(&self, id: &str) -> StoreResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("Appointment/{id}")));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Encounters
    // ------------------------------------------------------------------

    /// Persist a new encounter. Fails with [`StoreError::UnknownPatient`]
    /// before writing anything when the owning patient does not exist.
    pub fn create_encounter(&self, mut record: EncounterRecord) -> StoreResult<EncounterRecord> {
        assign_identity(&mut record.id, &mut record.created_at, &mut record.updated_at);

        let conn = self.conn();
        require_patient(&conn, &record.patient_id)?;

        conn.execute(
            &format!(
                "INSERT INTO encounters ({ENCOUNTER_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                record.id,
                record.patient_id,
                record.date,
                record.status,
                record.notes,
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(record)
    }

    pub fn get_encounter(&self, id: &str) -> StoreResult<EncounterRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE id = ?1"),
                params![id],
                row_to_encounter,
            )
            .map_err(|e| map_not_found(e, "Encounter", id))
    }

    /// All encounters, most recent first.
    pub fn list_encounters(&self) -> StoreResult<Vec<EncounterRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENCOUNTER_COLUMNS} FROM encounters ORDER BY date DESC"
        ))?;
        let records = stmt
            .query_map([], row_to_encounter)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Encounters owned by a patient, most recent first.
    pub fn encounters_for_patient(&self, patient_id: &str) -> StoreResult<Vec<EncounterRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE patient_id = ?1 ORDER BY date DESC"
        ))?;
        let records = stmt
            .query_map(params![patient_id], row_to_encounter)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn update_encounter(
        &self,
        id: &str,
        mut record: EncounterRecord,
    ) -> StoreResult<EncounterRecord> {
        let conn = self.conn();

        record.created_at = created_at_of(&conn, "encounters", "Encounter", id)?;
        require_patient(&conn, &record.patient_id)?;
        record.id = id.to_string();
        record.updated_at = Utc::now();

        conn.execute(
            "UPDATE encounters SET patient_id = ?2, date = ?3, status = ?4, notes = ?5, \
             updated_at = ?6 WHERE id = ?1",
            params![
                record.id,
                record.patient_id,
                record.date,
                record.status,
                record.notes,
                record.updated_at,
            ],
        )?;

        Ok(record)
    }

    pub fn delete_encounter(&self, id: &str) -> StoreResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM encounters WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("Encounter/{id}")));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

/// Assign a fresh id when absent and stamp both timestamps for a create.
fn assign_identity(id: &mut String, created_at: &mut DateTime<Utc>, updated_at: &mut DateTime<Utc>) {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
    let now = Utc::now();
    *created_at = now;
    *updated_at = now;
}

fn require_patient(conn: &Connection, patient_id: &str) -> StoreResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![patient_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownPatient {
            patient_id: patient_id.to_string(),
        })
    }
}

fn created_at_of(
    conn: &Connection,
    table: &str,
    kind: &str,
    id: &str,
) -> StoreResult<DateTime<Utc>> {
    conn.query_row(
        &format!("SELECT created_at FROM {table} WHERE id = ?1"),
        params![id],
        |row| row.get(0),
    )
    .map_err(|e| map_not_found(e, kind, id))
}

fn map_not_found(err: rusqlite::Error, kind: &str, id: &str) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("{kind}/{id}")),
        other => StoreError::Persistence(other),
    }
}

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.get(0)?,
        family_name: row.get(1)?,
        given_name: row.get(2)?,
        birth_date: row.get(3)?,
        gender: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address_use: row.get(7)?,
        address_type: row.get(8)?,
        address_text: row.get(9)?,
        address_lines: row.get(10)?,
        address_city: row.get(11)?,
        address_district: row.get(12)?,
        address_state: row.get(13)?,
        address_postal_code: row.get(14)?,
        address_country: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn row_to_appointment(row: &Row<'_>) -> rusqlite::Result<AppointmentRecord> {
    Ok(AppointmentRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        start: row.get(2)?,
        end: row.get(3)?,
        status: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_encounter(row: &Row<'_>) -> rusqlite::Result<EncounterRecord> {
    Ok(EncounterRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        status: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
