use serde::{Deserialize, Serialize};

use shared_models::{AppError, ValidationError};
use shared_utils::validation;

use appointment_cell::AppointmentStatus;

/// A prescription document. The JSON shape here is also the stored shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub patient_name: String,
    pub appointment_id: i64,
    pub medication: String,
    pub dosage: String,
    pub doctor_notes: String,
    pub pharmacy_name: Option<String>,
}

impl Prescription {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::length_between("patientName", &self.patient_name, 3, 100)?;
        validation::length_between("medication", &self.medication, 3, 100)?;
        validation::length_between("dosage", &self.dosage, 3, 20)?;
        validation::max_length("doctorNotes", &self.doctor_notes, 200)?;
        if let Some(pharmacy) = &self.pharmacy_name {
            validation::length_between("pharmacyName", pharmacy, 3, 100)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_name: Option<String>,
    pub appointment_id: Option<i64>,
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub doctor_notes: Option<String>,
    pub pharmacy_name: Option<String>,
}

/// Mutable fields only; the patient and appointment stay fixed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrescriptionRequest {
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub doctor_notes: Option<String>,
    pub pharmacy_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionCreated {
    pub prescription_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PrescriptionError {
    #[error("Prescription not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Appointment {0} does not exist")]
    AppointmentNotFound(i64),

    #[error("Appointment {appointment_id} is {status}, prescriptions need a completed appointment")]
    AppointmentNotCompleted {
        appointment_id: i64,
        status: AppointmentStatus,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PrescriptionError> for AppError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::NotFound => AppError::NotFound(err.to_string()),
            PrescriptionError::Validation(e) => AppError::Validation(e),
            PrescriptionError::AppointmentNotFound(_)
            | PrescriptionError::AppointmentNotCompleted { .. } => {
                AppError::Reference(err.to_string())
            }
            PrescriptionError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
