use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::models::{CreatePatientRequest, PatientError};
use patient_cell::services::patient::PatientService;
use shared_utils::test_utils::TestConfig;

fn service_for(mock_server: &MockServer) -> PatientService {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    PatientService::new(&config)
}

fn patient_doc(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "phone": "555-0100",
        "email": "someone@example.com"
    })
}

#[tokio::test]
async fn list_patients_is_sorted_by_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_doc("p-2", "Marta Vidal"),
            patient_doc("p-1", "Ana Ruiz"),
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let patients = service.list_patients().await.unwrap();

    let names: Vec<&str> = patients.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ana Ruiz", "Marta Vidal"]);
}

#[tokio::test]
async fn search_matches_name_substrings_case_insensitively() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_doc("p-1", "Ana Ruiz"),
            patient_doc("p-2", "Marta Vidal"),
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let matches = service.search_by_name("ruiz").await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Ana Ruiz");
}

#[tokio::test]
async fn create_rejects_duplicate_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/patients"))
        .and(query_param("name", "eq.Ana Ruiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_doc("p-1", "Ana Ruiz"),
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let result = service
        .create_patient(CreatePatientRequest {
            name: "Ana Ruiz".to_string(),
            phone: String::new(),
            email: String::new(),
            photo: None,
        })
        .await;

    assert_matches!(result, Err(PatientError::NameAlreadyExists { .. }));
}

#[tokio::test]
async fn create_requires_a_name() {
    let mock_server = MockServer::start().await;
    let service = service_for(&mock_server);

    let result = service
        .create_patient(CreatePatientRequest {
            name: "   ".to_string(),
            phone: String::new(),
            email: String::new(),
            photo: None,
        })
        .await;

    assert_matches!(result, Err(PatientError::ValidationError(_)));
}

#[tokio::test]
async fn create_persists_the_trimmed_document() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/patients"))
        .and(query_param("name", "eq.Ana Ruiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(patient_doc("p-9", "Ana Ruiz")))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let patient = service
        .create_patient(CreatePatientRequest {
            name: "  Ana Ruiz  ".to_string(),
            phone: "555-0100".to_string(),
            email: "someone@example.com".to_string(),
            photo: None,
        })
        .await
        .unwrap();

    assert_eq!(patient.id, "p-9");
    assert_eq!(patient.name, "Ana Ruiz");
}
