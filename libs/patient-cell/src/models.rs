use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::{AppError, ValidationError};
use shared_utils::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
}

impl Patient {
    /// Field constraints other than the password. `today` anchors the
    /// date-of-birth check.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validation::length_between("name", &self.name, 3, 100)?;
        validation::email("email", &self.email)?;
        validation::ten_digits("phone", &self.phone, "Phone number must be 10 digits")?;

        if let Some(address) = &self.address {
            validation::max_length("address", address, 255)?;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            validation::past_date(
                "dateOfBirth",
                date_of_birth,
                today,
                "Date of birth must be in the past",
            )?;
        }
        if let Some(contact) = &self.emergency_contact {
            validation::ten_digits(
                "emergencyContact",
                contact,
                "Emergency contact must be 10 digits",
            )?;
        }
        if let Some(provider) = &self.insurance_provider {
            validation::length_between("insuranceProvider", provider, 3, 100)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
}

impl From<Patient> for PatientProfile {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
            address: patient.address,
            date_of_birth: patient.date_of_birth,
            emergency_contact: patient.emergency_contact,
            insurance_provider: patient.insurance_provider,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient with email {email} already exists")]
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

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
            PatientError::InvalidCredentials => {
                AppError::Validation(ValidationError::new("currentPassword", err.to_string()))
            }
            PatientError::Validation(e) => AppError::Validation(e),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
            PatientError::PasswordHashing(msg) => AppError::Internal(msg),
        }
    }
}
