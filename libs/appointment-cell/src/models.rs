// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{AppError, ValidationError};

/// Every appointment occupies exactly one hour from its start.
pub const APPOINTMENT_DURATION_MINUTES: i64 = 60;

pub fn appointment_duration() -> Duration {
    Duration::minutes(APPOINTMENT_DURATION_MINUTES)
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason_for_visit: String,
}

impl Appointment {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.appointment_time
            .checked_add_signed(appointment_duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn appointment_date(&self) -> NaiveDate {
        self.appointment_time.date_naive()
    }

    pub fn appointment_time_only(&self) -> NaiveTime {
        self.appointment_time.time()
    }

    pub fn interval(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.appointment_time, self.end_time())
    }
}

/// Stored and sent as an integer: 0 = scheduled, 1 = completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
}

impl AppointmentStatus {
    pub fn code(self) -> i32 {
        match self {
            AppointmentStatus::Scheduled => 0,
            AppointmentStatus::Completed => 1,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed)
    }
}

impl TryFrom<i32> for AppointmentStatus {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AppointmentStatus::Scheduled),
            1 => Ok(AppointmentStatus::Completed),
            other => Err(ValidationError::new(
                "status",
                format!("status must be 0 (scheduled) or 1 (completed), got {}", other),
            )),
        }
    }
}

impl From<AppointmentStatus> for i32 {
    fn from(status: AppointmentStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Request timestamps: RFC 3339, or an ISO-8601 date-time without offset read as UTC.
pub mod request_time {
    use super::*;
    use serde::{de::Error, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        raw.parse::<DateTime<Utc>>()
            .ok()
            .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc()))
    }

    fn parse_or_reject<E: Error>(raw: &str) -> Result<DateTime<Utc>, E> {
        parse(raw).ok_or_else(|| {
            E::custom(format!(
                "invalid date-time `{}`, expected e.g. 2030-01-05T09:30:00Z",
                raw
            ))
        })
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_or_reject(&raw))
            .transpose()
    }

    pub fn required<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_or_reject(&String::deserialize(deserializer)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    #[serde(alias = "startTime", default, deserialize_with = "request_time::optional")]
    pub appointment_time: Option<DateTime<Utc>>,
    #[serde(alias = "reason")]
    pub reason_for_visit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCreated {
    pub appointment_id: i64,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub new_status: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    #[serde(alias = "startTime", default, deserialize_with = "request_time::optional")]
    pub appointment_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckQuery {
    pub doctor_id: i64,
    #[serde(deserialize_with = "request_time::required")]
    pub appointment_time: DateTime<Utc>,
    pub exclude_appointment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<AppointmentView>,
}

/// Outward view of an appointment, with the derived temporal fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub appointment_date: NaiveDate,
    pub appointment_time_only: NaiveTime,
    pub status: AppointmentStatus,
    pub reason_for_visit: String,
}

impl From<Appointment> for AppointmentView {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            appointment_time: appointment.appointment_time,
            end_time: appointment.end_time(),
            appointment_date: appointment.appointment_date(),
            appointment_time_only: appointment.appointment_time_only(),
            status: appointment.status,
            reason_for_visit: appointment.reason_for_visit,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Doctor {0} does not exist")]
    DoctorNotFound(i64),

    #[error("Patient {0} does not exist")]
    PatientNotFound(i64),

    #[error("{resource} {id} not found")]
    ResourceNotFound { resource: &'static str, id: i64 },

    #[error("Doctor {doctor_id} already has an appointment overlapping {start}")]
    ConflictDetected { doctor_id: i64, start: DateTime<Utc> },

    #[error("Doctor {doctor_id} is not available at {time}")]
    DoctorNotAvailable { doctor_id: i64, time: NaiveTime },

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment cannot be modified in current status: {0}")]
    NotModifiable(AppointmentStatus),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound | AppointmentError::ResourceNotFound { .. } => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::Validation(e) => AppError::Validation(e),
            AppointmentError::DoctorNotFound(_) | AppointmentError::PatientNotFound(_) => {
                AppError::Reference(err.to_string())
            }
            AppointmentError::ConflictDetected { .. }
            | AppointmentError::DoctorNotAvailable { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::NotModifiable(_) => {
                AppError::Validation(ValidationError::new("status", err.to_string()))
            }
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
