use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agenda_cell::models::{AgendaError, AppointmentFields, AppointmentStatus};
use agenda_cell::repository::{AppointmentRepository, DocStoreAppointmentRepository};
use shared_database::DocStoreClient;
use shared_utils::test_utils::TestConfig;

fn store_for(mock_server: &MockServer) -> Arc<DocStoreClient> {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    Arc::new(DocStoreClient::new(&config))
}

fn appointment_doc(id: &str, time: &str, office: &str) -> serde_json::Value {
    json!({
        "id": id,
        "date": "2025-03-11",
        "time": time,
        "officeRef": office,
        "patientRef": "Ana Ruiz",
        "treatmentRef": "Facial",
        "status": "confirmed",
        "notes": "",
        "photos": []
    })
}

fn fields(time: &str, office: &str) -> AppointmentFields {
    AppointmentFields {
        date: "2025-03-11".parse().unwrap(),
        time: time.parse().unwrap(),
        office_ref: office.to_string(),
        patient_ref: "Ana Ruiz".to_string(),
        treatment_ref: "Facial".to_string(),
        status: AppointmentStatus::Confirmed,
        cancel_reason: None,
        notes: String::new(),
        photos: vec![],
    }
}

#[tokio::test]
async fn connect_loads_the_current_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_doc("t-1", "10:00", "Centro"),
            appointment_doc("t-2", "10:30", "Norte"),
        ])))
        .mount(&mock_server)
        .await;

    let repository = DocStoreAppointmentRepository::connect(store_for(&mock_server))
        .await
        .unwrap();

    let snapshot = repository.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].office_ref, "Centro");
}

#[tokio::test]
async fn create_sends_the_document_and_returns_the_stored_one() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_doc("t-9", "10:00", "Centro"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/appointments"))
        .and(body_partial_json(json!({
            "officeRef": "Centro",
            "status": "confirmed"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(appointment_doc("t-9", "10:00", "Centro")),
        )
        .mount(&mock_server)
        .await;

    let repository = DocStoreAppointmentRepository::new(store_for(&mock_server));
    let created = repository.create(fields("10:00", "Centro")).await.unwrap();

    assert_eq!(created.id, "t-9");
    // the post-write reload is visible in the snapshot
    assert_eq!(repository.snapshot().len(), 1);
}

#[tokio::test]
async fn store_conflict_surfaces_as_slot_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "active appointment already occupies this slot"
        })))
        .mount(&mock_server)
        .await;

    let repository = DocStoreAppointmentRepository::new(store_for(&mock_server));
    let result = repository.create(fields("10:00", "Centro")).await;

    assert_matches!(result, Err(AgendaError::SlotConflict));
}

#[tokio::test]
async fn removing_a_missing_document_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/appointments/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let repository = DocStoreAppointmentRepository::new(store_for(&mock_server));
    let result = repository.remove("ghost").await;

    assert_matches!(result, Err(AgendaError::NotFound));
}

#[tokio::test]
async fn refresh_publishes_to_subscribers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_doc("t-1", "10:00", "Centro"),
        ])))
        .mount(&mock_server)
        .await;

    let repository = DocStoreAppointmentRepository::new(store_for(&mock_server));
    let mut updates = repository.subscribe();

    repository.refresh().await.unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().len(), 1);
}
