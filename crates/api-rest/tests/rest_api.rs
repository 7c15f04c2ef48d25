//! End-to-end tests driving the router directly with `tower::ServiceExt`.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_rest::{app, AppState};
use emr_core::EmrStore;

const BASE: &str = "http://localhost:3000";

fn test_app() -> Router {
    let store = EmrStore::open_in_memory().expect("open in-memory store");
    app(AppState::new(store, BASE))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, headers, value)
}

fn patient_json() -> Value {
    json!({
        "resourceType": "Patient",
        "name": [{"family": "Doe", "given": ["John"]}],
        "birthDate": "1990-05-15",
        "gender": "male",
        "telecom": [
            {"system": "phone", "value": "+1234567890"},
            {"system": "email", "value": "john.doe@example.com"}
        ],
        "address": [{
            "line": ["123 Main St", "Apt 4B"],
            "city": "New York",
            "state": "NY",
            "postalCode": "10001",
            "country": "US"
        }]
    })
}

fn appointment_json(patient_id: &str) -> Value {
    json!({
        "resourceType": "Appointment",
        "status": "booked",
        "description": "Annual checkup",
        "start": "2025-06-01T10:30:00Z",
        "end": "2025-06-01T11:00:00Z",
        "participant": [{"actor": {"reference": format!("Patient/{patient_id}")}}]
    })
}

fn encounter_json(patient_id: &str, start: &str) -> Value {
    json!({
        "resourceType": "Encounter",
        "status": "finished",
        "subject": {"reference": format!("Patient/{patient_id}")},
        "period": {"start": start},
        "text": {
            "status": "generated",
            "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\">Routine visit</div>"
        }
    })
}

async fn create_patient(app: &Router) -> String {
    let (status, _, body) = send(app, "POST", "/fhir/Patient", Some(patient_json())).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("patient id").to_string()
}

#[tokio::test]
async fn create_patient_returns_201_with_location_and_rendered_resource() {
    let app = test_app();
    let (status, headers, body) =
        send(&app, "POST", "/fhir/Patient", Some(patient_json())).await;

    assert_eq!(status, StatusCode::CREATED);

    let id = body["id"].as_str().expect("patient id");
    assert!(!id.is_empty());
    assert_eq!(
        headers[header::LOCATION],
        format!("{BASE}/fhir/Patient/{id}")
    );

    assert_eq!(body["resourceType"], "Patient");
    assert_eq!(body["name"][0]["family"], "Doe");
    assert_eq!(body["name"][0]["given"][0], "John");
    assert_eq!(body["birthDate"], "1990-05-15");
    assert_eq!(body["gender"], "male");
    // Address text is derived from the structured parts.
    assert_eq!(
        body["address"][0]["text"],
        "123 Main St, Apt 4B, New York, NY 10001, US"
    );
}

#[tokio::test]
async fn read_missing_patient_is_404_with_empty_body() {
    let app = test_app();
    let (status, _, body) = send(&app, "GET", "/fhir/Patient/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn wrong_resource_type_is_400_with_details() {
    let app = test_app();
    let (status, _, body) = send(
        &app,
        "POST",
        "/fhir/Patient",
        Some(json!({"resourceType": "Observation"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid FHIR Patient resource");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn schema_mismatch_reports_failing_path() {
    let app = test_app();
    let (status, _, body) = send(
        &app,
        "POST",
        "/fhir/Patient",
        Some(json!({"resourceType": "Patient", "name": "not-an-array"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid FHIR Patient resource");
    assert!(body["details"]
        .as_str()
        .is_some_and(|d| d.contains("name")));
}

#[tokio::test]
async fn update_patient_keeps_path_id_over_body_id() {
    let app = test_app();
    let id = create_patient(&app).await;

    let mut replacement = patient_json();
    replacement["id"] = json!("spoofed-id");
    replacement["name"][0]["family"] = json!("Doe-Smith");

    let (status, _, body) = send(
        &app,
        "PUT",
        &format!("/fhir/Patient/{id}"),
        Some(replacement),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["name"][0]["family"], "Doe-Smith");

    let (_, _, fetched) = send(&app, "GET", &format!("/fhir/Patient/{id}"), None).await;
    assert_eq!(fetched["name"][0]["family"], "Doe-Smith");
}

#[tokio::test]
async fn update_missing_patient_is_404() {
    let app = test_app();
    let (status, _, _) = send(&app, "PUT", "/fhir/Patient/nope", Some(patient_json())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn appointment_referencing_unknown_patient_is_400_with_patient_id() {
    let app = test_app();
    let (status, _, body) = send(
        &app,
        "POST",
        "/fhir/Appointment",
        Some(appointment_json("ghost")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Patient not found");
    assert_eq!(body["patientId"], "ghost");
}

#[tokio::test]
async fn appointment_round_trips_through_the_api() {
    let app = test_app();
    let patient_id = create_patient(&app).await;

    let (status, headers, created) = send(
        &app,
        "POST",
        "/fhir/Appointment",
        Some(appointment_json(&patient_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = created["id"].as_str().expect("appointment id");
    assert_eq!(
        headers[header::LOCATION],
        format!("{BASE}/fhir/Appointment/{id}")
    );
    assert_eq!(created["status"], "booked");
    assert_eq!(created["description"], "Annual checkup");
    assert_eq!(
        created["participant"][0]["actor"]["reference"],
        format!("Patient/{patient_id}")
    );

    let (status, _, fetched) =
        send(&app, "GET", &format!("/fhir/Appointment/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["status"], "booked");
}

#[tokio::test]
async fn encounter_period_end_is_one_hour_after_start() {
    let app = test_app();
    let patient_id = create_patient(&app).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/fhir/Encounter",
        Some(encounter_json(&patient_id, "2025-03-10T14:45:30.000Z")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["period"]["start"], "2025-03-10T14:45:30.000Z");
    assert_eq!(body["period"]["end"], "2025-03-10T15:45:30.000Z");
    assert_eq!(body["status"], "finished");
    assert_eq!(
        body["text"]["div"],
        "<div xmlns=\"http://www.w3.org/1999/xhtml\">Routine visit</div>"
    );
}

#[tokio::test]
async fn deleting_a_patient_cascades_to_owned_resources() {
    let app = test_app();
    let patient_id = create_patient(&app).await;

    let (_, _, appointment) = send(
        &app,
        "POST",
        "/fhir/Appointment",
        Some(appointment_json(&patient_id)),
    )
    .await;
    let appointment_id = appointment["id"].as_str().expect("appointment id");

    let (_, _, encounter) = send(
        &app,
        "POST",
        "/fhir/Encounter",
        Some(encounter_json(&patient_id, "2025-03-10T14:45:30.000Z")),
    )
    .await;
    let encounter_id = encounter["id"].as_str().expect("encounter id");

    let (status, _, _) = send(&app, "DELETE", &format!("/fhir/Patient/{patient_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for uri in [
        format!("/fhir/Patient/{patient_id}"),
        format!("/fhir/Appointment/{appointment_id}"),
        format!("/fhir/Encounter/{encounter_id}"),
    ] {
        let (status, _, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "expected {uri} to be gone");
    }
}

#[tokio::test]
async fn delete_missing_appointment_is_404() {
    let app = test_app();
    let (status, _, _) = send(&app, "DELETE", "/fhir/Appointment/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patient_subresource_listing_requires_the_patient() {
    let app = test_app();
    let (status, _, _) = send(&app, "GET", "/fhir/Patient/nope/Appointment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "GET", "/fhir/Patient/nope/Encounter", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patient_encounters_are_listed_most_recent_first() {
    let app = test_app();
    let patient_id = create_patient(&app).await;

    for start in [
        "2025-01-01T09:00:00.000Z",
        "2025-06-01T09:00:00.000Z",
        "2025-03-01T09:00:00.000Z",
    ] {
        let (status, _, _) = send(
            &app,
            "POST",
            "/fhir/Encounter",
            Some(encounter_json(&patient_id, start)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, bundle) = send(
        &app,
        "GET",
        &format!("/fhir/Patient/{patient_id}/Encounter"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(bundle["resourceType"], "Bundle");
    assert_eq!(bundle["type"], "searchset");
    assert_eq!(bundle["total"], 3);

    let starts: Vec<&str> = bundle["entry"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|e| e["resource"]["period"]["start"].as_str().expect("start"))
        .collect();
    assert_eq!(
        starts,
        vec![
            "2025-06-01T09:00:00.000Z",
            "2025-03-01T09:00:00.000Z",
            "2025-01-01T09:00:00.000Z",
        ]
    );

    for entry in bundle["entry"].as_array().expect("entries") {
        let id = entry["resource"]["id"].as_str().expect("id");
        assert_eq!(
            entry["fullUrl"].as_str().expect("fullUrl"),
            format!("{BASE}/fhir/Encounter/{id}")
        );
    }
}

#[tokio::test]
async fn appointment_search_filters_by_patient() {
    let app = test_app();
    let first = create_patient(&app).await;
    let second = create_patient(&app).await;

    send(&app, "POST", "/fhir/Appointment", Some(appointment_json(&first))).await;
    send(&app, "POST", "/fhir/Appointment", Some(appointment_json(&first))).await;
    send(&app, "POST", "/fhir/Appointment", Some(appointment_json(&second))).await;

    let (status, _, all) = send(&app, "GET", "/fhir/Appointment/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total"], 3);

    let (status, _, filtered) = send(
        &app,
        "GET",
        &format!("/fhir/Appointment/search?patient={first}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered["total"], 2);

    // An unknown patient id is a valid search with no matches, not an error.
    let (status, _, empty) = send(
        &app,
        "GET",
        "/fhir/Appointment/search?patient=ghost",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["total"], 0);
    assert!(empty.get("entry").is_none());
}

#[tokio::test]
async fn list_endpoints_return_searchset_bundles() {
    let app = test_app();
    let patient_id = create_patient(&app).await;
    send(&app, "POST", "/fhir/Appointment", Some(appointment_json(&patient_id))).await;
    send(
        &app,
        "POST",
        "/fhir/Encounter",
        Some(encounter_json(&patient_id, "2025-03-10T14:45:30.000Z")),
    )
    .await;

    for (uri, expected_kind) in [
        ("/fhir/Patient", "Patient"),
        ("/fhir/Appointment", "Appointment"),
        ("/fhir/Encounter", "Encounter"),
    ] {
        let (status, _, bundle) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bundle["resourceType"], "Bundle");
        assert_eq!(bundle["type"], "searchset");
        assert_eq!(bundle["total"], 1);
        assert_eq!(
            bundle["entry"][0]["resource"]["resourceType"],
            expected_kind
        );
    }
}
