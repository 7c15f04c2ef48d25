//! HTTP error mapping for the REST API.
//!
//! Every handler returns `Result<_, ApiError>`; this module owns the mapping
//! from store and translation failures to status codes and JSON error bodies:
//!
//! | variant           | status | body                                         |
//! |-------------------|--------|----------------------------------------------|
//! | `NotFound`        | 404    | empty                                        |
//! | `InvalidResource` | 400    | `{"error", "details"}`                       |
//! | `UnknownPatient`  | 400    | `{"error": "Patient not found", "patientId"}`|
//! | `Internal`        | 500    | `{"error"}`                                  |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use emr_core::StoreError;
use fhir::FhirError;

/// Errors a REST handler can surface to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Id lookup miss. Rendered with an empty body.
    NotFound,

    /// Request body did not parse as the expected resource kind.
    InvalidResource {
        kind: &'static str,
        details: String,
    },

    /// A child resource referenced a patient that does not exist.
    UnknownPatient { patient_id: String },

    /// Datastore or serialization failure.
    Internal(String),
}

impl ApiError {
    /// Wrap a translation failure for a request body of the given kind.
    pub fn invalid(kind: &'static str, err: FhirError) -> Self {
        ApiError::InvalidResource {
            kind,
            details: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::UnknownPatient { patient_id } => ApiError::UnknownPatient { patient_id },
            StoreError::Persistence(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::InvalidResource { kind, details } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("Invalid FHIR {kind} resource"),
                    "details": details,
                })),
            )
                .into_response(),
            ApiError::UnknownPatient { patient_id } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Patient not found",
                    "patientId": patient_id,
                })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}
