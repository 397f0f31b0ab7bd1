use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use shared_database::{MemoryTable, SupabaseClient};

use crate::models::Patient;

#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Stores a new patient; the incoming id is replaced by the store's.
    async fn insert(&self, patient: Patient) -> Result<Patient>;

    async fn get(&self, id: i64) -> Result<Option<Patient>>;

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool>;

    async fn update(&self, patient: Patient) -> Result<Option<Patient>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

fn row_payload(patient: &Patient) -> Value {
    json!({
        "name": patient.name,
        "email": patient.email,
        "password_hash": patient.password_hash,
        "phone": patient.phone,
        "address": patient.address,
        "date_of_birth": patient.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
        "emergency_contact": patient.emergency_contact,
        "insurance_provider": patient.insurance_provider,
    })
}

pub struct SupabasePatientStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePatientStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn write(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Patient>> {
        let rows: Vec<Patient> = self
            .supabase
            .request_with_headers(method, path, body, Some(SupabaseClient::representation_headers()))
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl PatientStore for SupabasePatientStore {
    async fn insert(&self, patient: Patient) -> Result<Patient> {
        self.write(Method::POST, "/rest/v1/patients", Some(row_payload(&patient)))
            .await?
            .ok_or_else(|| anyhow!("Failed to create patient profile"))
    }

    async fn get(&self, id: i64) -> Result<Option<Patient>> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let rows: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let mut path = format!(
            "/rest/v1/patients?select=id&email=eq.{}",
            urlencoding::encode(email)
        );
        if let Some(id) = except_id {
            path.push_str(&format!("&id=neq.{}", id));
        }
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn update(&self, patient: Patient) -> Result<Option<Patient>> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient.id);
        self.write(Method::PATCH, &path, Some(row_payload(&patient))).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        Ok(self.write(Method::DELETE, &path, None).await?.is_some())
    }
}

#[derive(Default)]
pub struct MemoryPatientStore {
    table: MemoryTable<Patient>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn insert(&self, patient: Patient) -> Result<Patient> {
        Ok(self.table.insert_with(|id| Patient { id, ..patient }).await)
    }

    async fn get(&self, id: i64) -> Result<Option<Patient>> {
        Ok(self.table.get(id).await)
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        Ok(self
            .table
            .any(|patient| patient.email == email && Some(patient.id) != except_id)
            .await)
    }

    async fn update(&self, patient: Patient) -> Result<Option<Patient>> {
        Ok(self.table.replace(patient.id, patient).await)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.remove(id).await.is_some())
    }
}
