//! `/fhir/Appointment` handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use fhir::appointment::AppointmentWire;
use fhir::{Appointment, BundleWire};

use crate::{ApiError, AppState};

/// Query parameters accepted by `GET /fhir/Appointment/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Owning patient id. Absent or empty means no filter.
    pub patient: Option<String>,
}

/// `GET /fhir/Appointment` - all appointments as a searchset bundle.
#[axum::debug_handler]
pub async fn list(State(state): State<AppState>) -> Result<Json<BundleWire>, ApiError> {
    let records = state.store.list_appointments()?;
    let bundle = state.searchset("Appointment", &records, |r| {
        (r.id.clone(), Appointment::render(r))
    })?;
    Ok(Json(bundle))
}

/// `GET /fhir/Appointment/search?patient={id}` - appointments filtered by
/// owning patient. An unknown patient id yields an empty bundle, not an
/// error; without the parameter this matches the unfiltered list.
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<BundleWire>, ApiError> {
    let records = match params.patient.as_deref().filter(|p| !p.is_empty()) {
        Some(patient_id) => state.store.appointments_for_patient(patient_id)?,
        None => state.store.list_appointments()?,
    };
    let bundle = state.searchset("Appointment", &records, |r| {
        (r.id.clone(), Appointment::render(r))
    })?;
    Ok(Json(bundle))
}

/// `GET /fhir/Patient/:id/Appointment` - appointments owned by one patient.
/// Unlike [`search`], this is a sub-resource of the patient and responds
/// `404` when the patient itself does not exist.
#[axum::debug_handler]
pub async fn for_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<BundleWire>, ApiError> {
    if !state.store.patient_exists(&patient_id)? {
        return Err(ApiError::NotFound);
    }
    let records = state.store.appointments_for_patient(&patient_id)?;
    let bundle = state.searchset("Appointment", &records, |r| {
        (r.id.clone(), Appointment::render(r))
    })?;
    Ok(Json(bundle))
}

/// `POST /fhir/Appointment` - create from a wire resource. Responds `400`
/// with the offending id when the referenced patient does not exist.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let mut record = Appointment::parse(body).map_err(|e| ApiError::invalid("Appointment", e))?;
    record.id = String::new();

    let created = state.store.create_appointment(record)?;
    let location = state.resource_url("Appointment", &created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Appointment::render(&created)),
    ))
}

/// `GET /fhir/Appointment/:id`
#[axum::debug_handler]
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentWire>, ApiError> {
    let record = state.store.get_appointment(&id)?;
    Ok(Json(Appointment::render(&record)))
}

/// `PUT /fhir/Appointment/:id` - full replace; the path id wins over any id
/// in the body.
#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AppointmentWire>, ApiError> {
    let record = Appointment::parse(body).map_err(|e| ApiError::invalid("Appointment", e))?;
    let updated = state.store.update_appointment(&id, record)?;
    Ok(Json(Appointment::render(&updated)))
}

/// `DELETE /fhir/Appointment/:id`
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_appointment(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
