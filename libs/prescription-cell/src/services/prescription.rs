use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use appointment_cell::{AppointmentStatus, AppointmentStore};
use shared_database::DocumentStore;
use shared_utils::validation;

use crate::models::{
    CreatePrescriptionRequest, Prescription, PrescriptionError, UpdatePrescriptionRequest,
};
use crate::services::store::PrescriptionStore;

pub struct PrescriptionService {
    store: PrescriptionStore,
    appointments: Arc<dyn AppointmentStore>,
}

impl PrescriptionService {
    pub fn new(documents: Arc<dyn DocumentStore>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self {
            store: PrescriptionStore::new(documents),
            appointments,
        }
    }

    /// Prescriptions live apart from appointments, so the reference is
    /// checked here: the appointment must exist and be completed.
    #[instrument(skip(self, request), fields(appointment_id = ?request.appointment_id))]
    pub async fn create_prescription(
        &self,
        request: CreatePrescriptionRequest,
    ) -> Result<Prescription, PrescriptionError> {
        let patient_name = validation::required("patientName", "Patient name", request.patient_name)?;
        let appointment_id =
            validation::required("appointmentId", "Appointment id", request.appointment_id)?;
        let medication = validation::required("medication", "Medication name", request.medication)?;
        let dosage = validation::required("dosage", "Dosage", request.dosage)?;
        let doctor_notes = validation::required("doctorNotes", "Doctor notes", request.doctor_notes)?;

        let prescription = Prescription {
            id: Uuid::new_v4().to_string(),
            patient_name,
            appointment_id,
            medication,
            dosage,
            doctor_notes,
            pharmacy_name: request.pharmacy_name,
        };
        prescription.validate()?;

        self.ensure_completed_appointment(appointment_id).await?;

        self.store
            .save(&prescription)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        info!(
            "Prescription {} issued for appointment {}",
            prescription.id, appointment_id
        );
        Ok(prescription)
    }

    pub async fn get_prescription(&self, prescription_id: &str) -> Result<Prescription, PrescriptionError> {
        debug!("Fetching prescription: {}", prescription_id);
        self.store
            .load(prescription_id)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?
            .ok_or(PrescriptionError::NotFound)
    }

    pub async fn list_for_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<Vec<Prescription>, PrescriptionError> {
        self.store
            .list_for_appointment(appointment_id)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))
    }

    pub async fn update_prescription(
        &self,
        prescription_id: &str,
        request: UpdatePrescriptionRequest,
    ) -> Result<Prescription, PrescriptionError> {
        let mut prescription = self.get_prescription(prescription_id).await?;

        if let Some(medication) = request.medication {
            prescription.medication = medication;
        }
        if let Some(dosage) = request.dosage {
            prescription.dosage = dosage;
        }
        if let Some(notes) = request.doctor_notes {
            prescription.doctor_notes = notes;
        }
        if let Some(pharmacy) = request.pharmacy_name {
            prescription.pharmacy_name = Some(pharmacy);
        }
        prescription.validate()?;

        self.store
            .save(&prescription)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        info!("Prescription {} updated", prescription.id);
        Ok(prescription)
    }

    pub async fn delete_prescription(&self, prescription_id: &str) -> Result<(), PrescriptionError> {
        let prescription = self.get_prescription(prescription_id).await?;

        let removed = self
            .store
            .remove(&prescription)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;
        if !removed {
            return Err(PrescriptionError::NotFound);
        }

        info!("Prescription {} deleted", prescription_id);
        Ok(())
    }

    async fn ensure_completed_appointment(&self, appointment_id: i64) -> Result<(), PrescriptionError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?
            .ok_or(PrescriptionError::AppointmentNotFound(appointment_id))?;

        if appointment.status != AppointmentStatus::Completed {
            warn!(
                "Refusing prescription for appointment {} in status {}",
                appointment_id, appointment.status
            );
            return Err(PrescriptionError::AppointmentNotCompleted {
                appointment_id,
                status: appointment.status,
            });
        }
        Ok(())
    }
}
