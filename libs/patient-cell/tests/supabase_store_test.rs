use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::services::{PatientStore, SupabasePatientStore};
use shared_database::SupabaseClient;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

async fn store_for(server: &MockServer) -> SupabasePatientStore {
    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    SupabasePatientStore::new(Arc::new(SupabaseClient::new(&config)))
}

#[tokio::test]
async fn get_parses_the_date_of_birth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_row(4, "John Smith", "john@example.com")
        ])))
        .mount(&server)
        .await;

    let patient = store_for(&server).await.get(4).await.unwrap().unwrap();
    assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 12));
    assert_eq!(patient.emergency_contact.as_deref(), Some("0111111111"));
}

#[tokio::test]
async fn email_lookup_excludes_the_patient_being_updated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.john@example.com"))
        .and(query_param("id", "neq.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let taken = store_for(&server)
        .await
        .email_taken("john@example.com", Some(4))
        .await
        .unwrap();
    assert!(!taken);
}
