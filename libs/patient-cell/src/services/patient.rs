use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use shared_utils::{password, validation};

use crate::models::{
    ChangePasswordRequest, CreatePatientRequest, Patient, PatientError, UpdatePatientRequest,
};
use crate::services::store::PatientStore;

pub struct PatientService {
    store: Arc<dyn PatientStore>,
    // Serialises the email uniqueness check with the write that claims the email.
    registrations: Mutex<()>,
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self {
            store,
            registrations: Mutex::new(()),
        }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let name = validation::required("name", "Name", request.name)?;
        let email = validation::required("email", "Email", request.email)?;
        let plain_password = validation::required("password", "Password", request.password)?;
        let phone = validation::required("phone", "Phone", request.phone)?;
        password::validate_password("password", &plain_password)?;

        let mut patient = Patient {
            id: 0,
            name,
            email: email.trim().to_lowercase(),
            password_hash: String::new(),
            phone,
            address: request.address,
            date_of_birth: request.date_of_birth,
            emergency_contact: request.emergency_contact,
            insurance_provider: request.insurance_provider,
        };
        patient.validate(Utc::now().date_naive())?;

        debug!("Creating new patient profile for: {}", patient.email);

        patient.password_hash = password::hash_password_blocking(plain_password)
            .await
            .map_err(|e| PatientError::PasswordHashing(e.to_string()))?;

        let _registration = self.registrations.lock().await;
        if self.email_taken(&patient.email, None).await? {
            return Err(PatientError::EmailAlreadyExists { email: patient.email });
        }

        let patient = self
            .store
            .insert(patient)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        info!("Patient profile created successfully with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn find_patient(&self, patient_id: i64) -> Result<Option<Patient>, PatientError> {
        debug!("Fetching patient profile: {}", patient_id);
        self.store
            .get(patient_id)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        self.find_patient(patient_id).await?.ok_or(PatientError::NotFound)
    }

    pub async fn update_patient(
        &self,
        patient_id: i64,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient profile: {}", patient_id);
        let mut patient = self.get_patient(patient_id).await?;

        if let Some(name) = request.name {
            patient.name = name;
        }
        if let Some(email) = request.email {
            patient.email = email.trim().to_lowercase();
        }
        if let Some(phone) = request.phone {
            patient.phone = phone;
        }
        if let Some(address) = request.address {
            patient.address = Some(address);
        }
        if let Some(date_of_birth) = request.date_of_birth {
            patient.date_of_birth = Some(date_of_birth);
        }
        if let Some(contact) = request.emergency_contact {
            patient.emergency_contact = Some(contact);
        }
        if let Some(provider) = request.insurance_provider {
            patient.insurance_provider = Some(provider);
        }
        patient.validate(Utc::now().date_naive())?;

        let _registration = self.registrations.lock().await;
        if self.email_taken(&patient.email, Some(patient.id)).await? {
            return Err(PatientError::EmailAlreadyExists { email: patient.email });
        }

        let updated = self
            .store
            .update(patient)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?
            .ok_or(PatientError::NotFound)?;

        info!("Patient {} updated", updated.id);
        Ok(updated)
    }

    pub async fn change_password(
        &self,
        patient_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<(), PatientError> {
        let mut patient = self.get_patient(patient_id).await?;

        let matches = password::verify_password_blocking(
            request.current_password,
            patient.password_hash.clone(),
        )
        .await
        .map_err(|e| PatientError::PasswordHashing(e.to_string()))?;
        if !matches {
            return Err(PatientError::InvalidCredentials);
        }

        password::validate_password("newPassword", &request.new_password)?;
        patient.password_hash = password::hash_password_blocking(request.new_password)
            .await
            .map_err(|e| PatientError::PasswordHashing(e.to_string()))?;

        self.store
            .update(patient)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?
            .ok_or(PatientError::NotFound)?;

        info!("Password changed for patient {}", patient_id);
        Ok(())
    }

    pub async fn delete_patient(&self, patient_id: i64) -> Result<(), PatientError> {
        let removed = self
            .store
            .delete(patient_id)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if !removed {
            return Err(PatientError::NotFound);
        }

        info!("Patient {} deleted", patient_id);
        Ok(())
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool, PatientError> {
        self.store
            .email_taken(email, except_id)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }
}
