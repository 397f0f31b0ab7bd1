use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use shared_database::{MemoryTable, SupabaseClient};

use crate::models::Doctor;

/// Persistence seam for doctors. `insert` ignores the incoming id; the
/// store assigns one.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn insert(&self, doctor: Doctor) -> Result<Doctor>;

    async fn get(&self, id: i64) -> Result<Option<Doctor>>;

    /// All doctors ordered by id, optionally narrowed to a specialty
    /// (case-insensitive exact match).
    async fn list(&self, specialty: Option<&str>) -> Result<Vec<Doctor>>;

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool>;

    /// Overwrites the stored row. `None` when the id does not exist.
    async fn update(&self, doctor: Doctor) -> Result<Option<Doctor>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

fn row_payload(doctor: &Doctor) -> Value {
    json!({
        "name": doctor.name,
        "specialty": doctor.specialty,
        "email": doctor.email,
        "password_hash": doctor.password_hash,
        "phone": doctor.phone,
        "available_times": doctor.available_times,
        "years_of_experience": doctor.years_of_experience,
        "clinic_address": doctor.clinic_address,
        "rating": doctor.rating,
    })
}

pub struct SupabaseDoctorStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDoctorStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn first(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Doctor>> {
        let rows: Vec<Doctor> = self
            .supabase
            .request_with_headers(method, path, body, Some(SupabaseClient::representation_headers()))
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl DoctorStore for SupabaseDoctorStore {
    async fn insert(&self, doctor: Doctor) -> Result<Doctor> {
        self.first(Method::POST, "/rest/v1/doctors", Some(row_payload(&doctor)))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create doctor"))
    }

    async fn get(&self, id: i64) -> Result<Option<Doctor>> {
        let path = format!("/rest/v1/doctors?id=eq.{}", id);
        let rows: Vec<Doctor> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn list(&self, specialty: Option<&str>) -> Result<Vec<Doctor>> {
        let mut path = "/rest/v1/doctors?order=id.asc".to_string();
        if let Some(specialty) = specialty {
            // Anchored case-insensitive regex, so `*`, `%` and `_` stay literal.
            let pattern = format!("^{}$", regex::escape(specialty));
            path.push_str(&format!("&specialty=imatch.{}", urlencoding::encode(&pattern)));
        }
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let mut path = format!(
            "/rest/v1/doctors?select=id&email=eq.{}",
            urlencoding::encode(email)
        );
        if let Some(id) = except_id {
            path.push_str(&format!("&id=neq.{}", id));
        }
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn update(&self, doctor: Doctor) -> Result<Option<Doctor>> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor.id);
        self.first(Method::PATCH, &path, Some(row_payload(&doctor))).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let path = format!("/rest/v1/doctors?id=eq.{}", id);
        Ok(self.first(Method::DELETE, &path, None).await?.is_some())
    }
}

#[derive(Default)]
pub struct MemoryDoctorStore {
    table: MemoryTable<Doctor>,
}

impl MemoryDoctorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DoctorStore for MemoryDoctorStore {
    async fn insert(&self, doctor: Doctor) -> Result<Doctor> {
        Ok(self.table.insert_with(|id| Doctor { id, ..doctor }).await)
    }

    async fn get(&self, id: i64) -> Result<Option<Doctor>> {
        Ok(self.table.get(id).await)
    }

    async fn list(&self, specialty: Option<&str>) -> Result<Vec<Doctor>> {
        Ok(self
            .table
            .find(|doctor| match specialty {
                Some(wanted) => doctor.specialty.eq_ignore_ascii_case(wanted),
                None => true,
            })
            .await)
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        Ok(self
            .table
            .any(|doctor| doctor.email == email && Some(doctor.id) != except_id)
            .await)
    }

    async fn update(&self, doctor: Doctor) -> Result<Option<Doctor>> {
        Ok(self.table.replace(doctor.id, doctor).await)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.remove(id).await.is_some())
    }
}
