//! `/fhir/Encounter` handlers.
//!
//! Same shape as the appointment handlers; encounter listings are ordered
//! most recent first by the store.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use fhir::encounter::EncounterWire;
use fhir::{BundleWire, Encounter};

use crate::{ApiError, AppState};

/// Query parameters accepted by `GET /fhir/Encounter/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Owning patient id. Absent or empty means no filter.
    pub patient: Option<String>,
}

/// `GET /fhir/Encounter` - all encounters, most recent first.
#[axum::debug_handler]
pub async fn list(State(state): State<AppState>) -> Result<Json<BundleWire>, ApiError> {
    let records = state.store.list_encounters()?;
    let bundle = state.searchset("Encounter", &records, |r| {
        (r.id.clone(), Encounter::render(r))
    })?;
    Ok(Json(bundle))
}

/// `GET /fhir/Encounter/search?patient={id}` - encounters filtered by owning
/// patient. An unknown patient id yields an empty bundle, not an error.
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<BundleWire>, ApiError> {
    let records = match params.patient.as_deref().filter(|p| !p.is_empty()) {
        Some(patient_id) => state.store.encounters_for_patient(patient_id)?,
        None => state.store.list_encounters()?,
    };
    let bundle = state.searchset("Encounter", &records, |r| {
        (r.id.clone(), Encounter::render(r))
    })?;
    Ok(Json(bundle))
}

/// `GET /fhir/Patient/:id/Encounter` - encounters owned by one patient,
/// most recent first. Responds `404` when the patient does not exist.
#[axum::debug_handler]
pub async fn for_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<BundleWire>, ApiError> {
    if !state.store.patient_exists(&patient_id)? {
        return Err(ApiError::NotFound);
    }
    let records = state.store.encounters_for_patient(&patient_id)?;
    let bundle = state.searchset("Encounter", &records, |r| {
        (r.id.clone(), Encounter::render(r))
    })?;
    Ok(Json(bundle))
}

/// `POST /fhir/Encounter` - create from a wire resource. Responds `400` with
/// the offending id when the referenced patient does not exist.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let mut record = Encounter::parse(body).map_err(|e| ApiError::invalid("Encounter", e))?;
    record.id = String::new();

    let created = state.store.create_encounter(record)?;
    let location = state.resource_url("Encounter", &created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Encounter::render(&created)),
    ))
}

/// `GET /fhir/Encounter/:id`
#[axum::debug_handler]
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EncounterWire>, ApiError> {
    let record = state.store.get_encounter(&id)?;
    Ok(Json(Encounter::render(&record)))
}

/// `PUT /fhir/Encounter/:id` - full replace; the path id wins over any id in
/// the body.
#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<EncounterWire>, ApiError> {
    let record = Encounter::parse(body).map_err(|e| ApiError::invalid("Encounter", e))?;
    let updated = state.store.update_encounter(&id, record)?;
    Ok(Json(Encounter::render(&updated)))
}

/// `DELETE /fhir/Encounter/:id`
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_encounter(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
