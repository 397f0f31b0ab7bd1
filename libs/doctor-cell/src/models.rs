use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{AppError, ValidationError};
use shared_utils::validation;

// ==============================================================================
// ENTITY
// ==============================================================================

/// Row shape of the `doctors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub email: String,
    /// Write-only credential. Never leaves the service in any response.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    #[serde(default)]
    pub available_times: Vec<String>,
    pub years_of_experience: Option<i32>,
    pub clinic_address: Option<String>,
    #[serde(default)]
    pub rating: i32,
}

impl Doctor {
    /// Checks every field constraint except the password, which only exists
    /// in hashed form here and is validated on the way in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::length_between("name", &self.name, 3, 100)?;
        validation::length_between("specialty", &self.specialty, 3, 50)?;
        validation::email("email", &self.email)?;
        validation::ten_digits("phone", &self.phone, "Phone number must be 10 digits")?;

        for slot in &self.available_times {
            slot.parse::<TimeSlot>()
                .map_err(|e| ValidationError::new("availableTimes", e))?;
        }

        if let Some(years) = self.years_of_experience {
            validation::in_range("yearsOfExperience", years, 0, 100)?;
        }
        if let Some(address) = &self.clinic_address {
            validation::max_length("clinicAddress", address, 255)?;
        }
        validation::in_range("rating", self.rating, 0, 5)?;

        Ok(())
    }

    /// Declared slots that parse; malformed legacy entries are skipped.
    pub fn time_slots(&self) -> Vec<TimeSlot> {
        self.available_times
            .iter()
            .filter_map(|slot| match slot.parse() {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("Ignoring slot {:?} of doctor {}: {}", slot, self.id, e);
                    None
                }
            })
            .collect()
    }
}

// ==============================================================================
// TIME SLOTS
// ==============================================================================

/// A daily availability window such as `"09:00-10:00"`, half-open at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| format!("time slot {:?} must look like HH:MM-HH:MM", value))?;

        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M")
                .map_err(|_| format!("time slot {:?} must look like HH:MM-HH:MM", value))
        };
        let (start, end) = (parse(start)?, parse(end)?);

        if start >= end {
            return Err(format!("time slot {:?} must end after it starts", value));
        }

        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// One declared slot on a concrete date and whether it is still free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub slot: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available: bool,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Outward view of a doctor. Has no password field by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub phone: String,
    pub available_times: Vec<String>,
    pub years_of_experience: Option<i32>,
    pub clinic_address: Option<String>,
    pub rating: i32,
}

impl From<Doctor> for DoctorProfile {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            specialty: doctor.specialty,
            email: doctor.email,
            phone: doctor.phone,
            available_times: doctor.available_times,
            years_of_experience: doctor.years_of_experience,
            clinic_address: doctor.clinic_address,
            rating: doctor.rating,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub available_times: Vec<String>,
    pub years_of_experience: Option<i32>,
    pub clinic_address: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub available_times: Option<Vec<String>>,
    pub years_of_experience: Option<i32>,
    pub clinic_address: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialty: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor with email {email} already exists")]
    EmailAlreadyExists { email: String },

    #[error("Current password does not match")]
    InvalidCredentials,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
            DoctorError::InvalidCredentials => {
                AppError::Validation(ValidationError::new("currentPassword", err.to_string()))
            }
            DoctorError::Validation(e) => AppError::Validation(e),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
            DoctorError::PasswordHashing(msg) => AppError::Internal(msg),
        }
    }
}
