use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use shared_utils::{password, validation};

use crate::models::{
    ChangePasswordRequest, CreateDoctorRequest, Doctor, DoctorError, DoctorSearchQuery,
    UpdateDoctorRequest,
};
use crate::services::store::DoctorStore;

pub struct DoctorService {
    store: Arc<dyn DoctorStore>,
    // Serialises the email uniqueness check with the write that claims the email.
    registrations: Mutex<()>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn DoctorStore>) -> Self {
        Self {
            store,
            registrations: Mutex::new(()),
        }
    }

    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        let name = validation::required("name", "Name", request.name)?;
        let specialty = validation::required("specialty", "Specialty", request.specialty)?;
        let email = validation::required("email", "Email", request.email)?;
        let plain_password = validation::required("password", "Password", request.password)?;
        let phone = validation::required("phone", "Phone", request.phone)?;
        password::validate_password("password", &plain_password)?;

        let mut doctor = Doctor {
            id: 0,
            name,
            specialty,
            email: email.trim().to_lowercase(),
            password_hash: String::new(),
            phone,
            available_times: request.available_times,
            years_of_experience: request.years_of_experience,
            clinic_address: request.clinic_address,
            rating: request.rating.unwrap_or(0),
        };
        doctor.validate()?;

        doctor.password_hash = password::hash_password_blocking(plain_password)
            .await
            .map_err(|e| DoctorError::PasswordHashing(e.to_string()))?;

        let _registration = self.registrations.lock().await;
        if self.email_taken(&doctor.email, None).await? {
            return Err(DoctorError::EmailAlreadyExists { email: doctor.email });
        }

        let doctor = self
            .store
            .insert(doctor)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        info!("Doctor created with ID: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn find_doctor(&self, doctor_id: i64) -> Result<Option<Doctor>, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);
        self.store
            .get(doctor_id)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        self.find_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)
    }

    pub async fn list_doctors(&self, query: DoctorSearchQuery) -> Result<Vec<Doctor>, DoctorError> {
        let specialty = query
            .specialty
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        self.store
            .list(specialty)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }

    pub async fn update_doctor(
        &self,
        doctor_id: i64,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        let mut doctor = self.get_doctor(doctor_id).await?;

        if let Some(name) = request.name {
            doctor.name = name;
        }
        if let Some(specialty) = request.specialty {
            doctor.specialty = specialty;
        }
        if let Some(email) = request.email {
            doctor.email = email.trim().to_lowercase();
        }
        if let Some(phone) = request.phone {
            doctor.phone = phone;
        }
        if let Some(available_times) = request.available_times {
            doctor.available_times = available_times;
        }
        if let Some(years) = request.years_of_experience {
            doctor.years_of_experience = Some(years);
        }
        if let Some(address) = request.clinic_address {
            doctor.clinic_address = Some(address);
        }
        if let Some(rating) = request.rating {
            doctor.rating = rating;
        }
        doctor.validate()?;

        let _registration = self.registrations.lock().await;
        if self.email_taken(&doctor.email, Some(doctor.id)).await? {
            return Err(DoctorError::EmailAlreadyExists { email: doctor.email });
        }

        let updated = self
            .store
            .update(doctor)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?
            .ok_or(DoctorError::NotFound)?;

        info!("Doctor {} updated", updated.id);
        Ok(updated)
    }

    /// The only path through which a stored password changes.
    pub async fn change_password(
        &self,
        doctor_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<(), DoctorError> {
        let mut doctor = self.get_doctor(doctor_id).await?;

        let matches = password::verify_password_blocking(
            request.current_password,
            doctor.password_hash.clone(),
        )
        .await
        .map_err(|e| DoctorError::PasswordHashing(e.to_string()))?;
        if !matches {
            return Err(DoctorError::InvalidCredentials);
        }

        password::validate_password("newPassword", &request.new_password)?;
        doctor.password_hash = password::hash_password_blocking(request.new_password)
            .await
            .map_err(|e| DoctorError::PasswordHashing(e.to_string()))?;

        self.store
            .update(doctor)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?
            .ok_or(DoctorError::NotFound)?;

        info!("Password changed for doctor {}", doctor_id);
        Ok(())
    }

    pub async fn delete_doctor(&self, doctor_id: i64) -> Result<(), DoctorError> {
        let removed = self
            .store
            .delete(doctor_id)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if !removed {
            return Err(DoctorError::NotFound);
        }

        info!("Doctor {} deleted", doctor_id);
        Ok(())
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool, DoctorError> {
        self.store
            .email_taken(email, except_id)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }
}
