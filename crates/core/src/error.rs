//! Store error taxonomy.

/// Errors returned by the resource store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Id lookup miss; surfaced as 404 by the HTTP layer.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A child record references a patient that does not exist; surfaced as
    /// 400 with the offending foreign key.
    #[error("referenced patient not found: {patient_id}")]
    UnknownPatient { patient_id: String },

    /// Datastore unreachable or failed; surfaced as 500. Not retried here.
    #[error("database failure: {0}")]
    Persistence(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
