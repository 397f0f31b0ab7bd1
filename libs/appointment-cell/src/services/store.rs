use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::{MemoryTable, SupabaseClient};

use crate::models::{Appointment, AppointmentStatus};

/// Persistence seam for appointments. `insert` ignores the incoming id.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment>;

    async fn get(&self, id: i64) -> Result<Option<Appointment>>;

    /// A doctor's appointments starting in `[from, to)`, ordered
    /// by start time, optionally narrowed to one status.
    async fn list_for_doctor(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>>;

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>>;

    /// Overwrites the stored row. `None` when the id does not exist.
    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

fn row_payload(appointment: &Appointment) -> Value {
    json!({
        "doctor_id": appointment.doctor_id,
        "patient_id": appointment.patient_id,
        "appointment_time": appointment.appointment_time.to_rfc3339(),
        "status": appointment.status,
        "reason_for_visit": appointment.reason_for_visit,
    })
}

fn timestamp_param(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339()).into_owned()
}

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn first(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Appointment>> {
        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(method, path, body, Some(SupabaseClient::representation_headers()))
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment> {
        self.first(Method::POST, "/rest/v1/appointments", Some(row_payload(&appointment)))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create appointment"))
    }

    async fn get(&self, id: i64) -> Result<Option<Appointment>> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_for_doctor(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>> {
        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_time=gte.{}&appointment_time=lt.{}",
            doctor_id,
            timestamp_param(from),
            timestamp_param(to)
        );
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status.code()));
        }
        path.push_str("&order=appointment_time.asc");

        debug!("Querying appointments for doctor {}", doctor_id);
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_time.asc",
            patient_id
        );
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        self.first(Method::PATCH, &path, Some(row_payload(&appointment))).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        Ok(self.first(Method::DELETE, &path, None).await?.is_some())
    }
}

#[derive(Default)]
pub struct MemoryAppointmentStore {
    table: MemoryTable<Appointment>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment> {
        Ok(self
            .table
            .insert_with(|id| Appointment { id, ..appointment })
            .await)
    }

    async fn get(&self, id: i64) -> Result<Option<Appointment>> {
        Ok(self.table.get(id).await)
    }

    async fn list_for_doctor(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>> {
        let mut rows = self
            .table
            .find(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_time >= from
                    && a.appointment_time < to
                    && status.is_none_or(|s| a.status == s)
            })
            .await;
        rows.sort_by_key(|a| (a.appointment_time, a.id));
        Ok(rows)
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>> {
        let mut rows = self.table.find(|a| a.patient_id == patient_id).await;
        rows.sort_by_key(|a| (a.appointment_time, a.id));
        Ok(rows)
    }

    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>> {
        Ok(self.table.replace(appointment.id, appointment).await)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.remove(id).await.is_some())
    }
}
