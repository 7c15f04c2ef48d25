//! `/fhir/Patient` handlers.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use fhir::patient::PatientWire;
use fhir::{BundleWire, Patient};

use crate::{ApiError, AppState};

/// `GET /fhir/Patient` - all patients as a searchset bundle.
#[axum::debug_handler]
pub async fn list(State(state): State<AppState>) -> Result<Json<BundleWire>, ApiError> {
    let records = state.store.list_patients()?;
    let bundle = state.searchset("Patient", &records, |r| (r.id.clone(), Patient::render(r)))?;
    Ok(Json(bundle))
}

/// `POST /fhir/Patient` - create from a wire resource. Any client-supplied id
/// is discarded; the store assigns one. Responds `201` with a `Location`
/// header pointing at the new resource.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let mut record = Patient::parse(body).map_err(|e| ApiError::invalid("Patient", e))?;
    record.id = String::new();

    let created = state.store.create_patient(record)?;
    let location = state.resource_url("Patient", &created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Patient::render(&created)),
    ))
}

/// `GET /fhir/Patient/:id`
#[axum::debug_handler]
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientWire>, ApiError> {
    let record = state.store.get_patient(&id)?;
    Ok(Json(Patient::render(&record)))
}

/// `PUT /fhir/Patient/:id` - full replace. The path id wins over any id in
/// the body.
#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<PatientWire>, ApiError> {
    let record = Patient::parse(body).map_err(|e| ApiError::invalid("Patient", e))?;
    let updated = state.store.update_patient(&id, record)?;
    Ok(Json(Patient::render(&updated)))
}

/// `DELETE /fhir/Patient/:id` - removes the patient and, via the store's
/// referential action, all of its appointments and encounters.
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_patient(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
