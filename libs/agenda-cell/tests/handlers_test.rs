use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use agenda_cell::directory::StaticDirectories;
use agenda_cell::handlers::AgendaState;
use agenda_cell::repository::InMemoryAppointmentRepository;
use agenda_cell::router::agenda_routes;
use agenda_cell::services::booking::BookingEngine;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_app(config: &TestConfig) -> Router {
    let repository = Arc::new(InMemoryAppointmentRepository::new());
    let directories = Arc::new(StaticDirectories::new(
        &["Ana Ruiz", "Marta Vidal"],
        &["Facial", "Peeling"],
        &["Centro", "Norte"],
    ));
    let state = Arc::new(AgendaState {
        engine: BookingEngine::new(repository, directories),
    });
    agenda_routes(state, config.to_arc())
}

fn booking_body(patient: &str) -> Value {
    json!({
        "date": "2025-03-11",
        "time": "10:00",
        "office": "Centro",
        "patient": patient,
        "treatment": "Facial"
    })
}

fn authed_request(method: &str, uri: &str, auth: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let config = TestConfig::default();
    let app = test_app(&config);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(booking_body("Ana Ruiz").to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn book_then_conflict_over_http() {
    let config = TestConfig::default();
    let app = test_app(&config);
    let auth = JwtTestUtils::auth_header(&TestUser::default(), &config.jwt_secret);

    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", &auth, Some(booking_body("Ana Ruiz"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["status"], "confirmed");

    let response = app
        .oneshot(authed_request("POST", "/", &auth, Some(booking_body("Marta Vidal"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_without_reason_is_a_validation_error() {
    let config = TestConfig::default();
    let app = test_app(&config);
    let auth = JwtTestUtils::auth_header(&TestUser::default(), &config.jwt_secret);

    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", &auth, Some(booking_body("Ana Ruiz"))))
        .await
        .unwrap();
    let booked = response_json(response).await;
    let id = booked["appointment"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(authed_request(
            "POST",
            &format!("/{}/cancel", id),
            &auth,
            Some(json!({ "reason": "" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_transitions_are_flagged_as_logic_faults() {
    let config = TestConfig::default();
    let app = test_app(&config);
    let auth = JwtTestUtils::auth_header(&TestUser::default(), &config.jwt_secret);

    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", &auth, Some(booking_body("Ana Ruiz"))))
        .await
        .unwrap();
    let booked = response_json(response).await;
    let id = booked["appointment"]["id"].as_str().unwrap().to_string();

    // Reassigning a confirmed appointment is a programming/UI error
    let response = app
        .oneshot(authed_request(
            "POST",
            &format!("/{}/reassign", id),
            &auth,
            Some(json!({
                "office": "Centro",
                "patient": "Marta Vidal",
                "treatment": "Peeling"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["logic_fault"], true);
}

#[tokio::test]
async fn delete_requires_explicit_confirmation() {
    let config = TestConfig::default();
    let app = test_app(&config);
    let auth = JwtTestUtils::auth_header(&TestUser::default(), &config.jwt_secret);

    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", &auth, Some(booking_body("Ana Ruiz"))))
        .await
        .unwrap();
    let booked = response_json(response).await;
    let id = booked["appointment"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(authed_request("DELETE", &format!("/{}", id), &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/{}?confirm=true", id),
            &auth,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(authed_request("GET", &format!("/{}", id), &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn week_view_exposes_the_full_grid() {
    let config = TestConfig::default();
    let app = test_app(&config);
    let auth = JwtTestUtils::auth_header(&TestUser::default(), &config.jwt_secret);

    app.clone()
        .oneshot(authed_request("POST", "/", &auth, Some(booking_body("Ana Ruiz"))))
        .await
        .unwrap();

    let response = app
        .oneshot(authed_request("GET", "/week?anchor=2025-03-13", &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["days"].as_array().unwrap().len(), 6);
    assert_eq!(body["days"][0], "2025-03-10");
    assert_eq!(body["times"].as_array().unwrap().len(), 22);
    assert_eq!(body["appointments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn day_view_lists_appointments_in_time_order() {
    let config = TestConfig::default();
    let app = test_app(&config);
    let auth = JwtTestUtils::auth_header(&TestUser::default(), &config.jwt_secret);

    for (time, patient) in [("12:30", "Ana Ruiz"), ("09:00", "Marta Vidal")] {
        let body = json!({
            "date": "2025-03-11",
            "time": time,
            "office": "Centro",
            "patient": patient,
            "treatment": "Facial"
        });
        let response = app
            .clone()
            .oneshot(authed_request("POST", "/", &auth, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(authed_request("GET", "/days/2025-03-11", &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let times: Vec<&str> = body["appointments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["time"].as_str().unwrap())
        .collect();
    assert_eq!(times, vec!["09:00", "12:30"]);
}
