use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde_json::{json, Value};

use shared_config::{AppConfig, StorageBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            redis_url: None,
            storage_backend: StorageBackend::Supabase,
            server_port: 0,
        }
    }
}

/// A UTC timestamp `days_ahead` days from today at `hour:minute`.
pub fn days_from_now_at(days_ahead: i64, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).expect("valid wall-clock time");
    (Utc::now().date_naive() + Duration::days(days_ahead))
        .and_time(time)
        .and_utc()
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_row(id: i64, name: &str, specialty: &str, available_times: &[&str]) -> Value {
        json!({
            "id": id,
            "name": name,
            "specialty": specialty,
            "email": format!("doctor{}@example.com", id),
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g",
            "phone": "0123456789",
            "available_times": available_times,
            "years_of_experience": 12,
            "clinic_address": "1 Main Street",
            "rating": 4
        })
    }

    pub fn patient_row(id: i64, name: &str, email: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g",
            "phone": "0987654321",
            "address": "2 Side Road",
            "date_of_birth": "1990-04-12",
            "emergency_contact": "0111111111",
            "insurance_provider": "Acme Health"
        })
    }

    pub fn appointment_row(
        id: i64,
        doctor_id: i64,
        patient_id: i64,
        appointment_time: DateTime<Utc>,
        status: i32,
    ) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "appointment_time": appointment_time.to_rfc3339(),
            "status": status,
            "reason_for_visit": "Annual checkup"
        })
    }
}
