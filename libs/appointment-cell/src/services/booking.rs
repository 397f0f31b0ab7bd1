// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, instrument, warn};

use doctor_cell::{AvailabilityService, Doctor, DoctorService, SlotAvailability};
use patient_cell::PatientService;
use shared_models::ValidationError;
use shared_utils::validation;

use crate::models::{
    appointment_duration, Appointment, AppointmentError, AppointmentStatus,
    ConflictCheckQuery, ConflictCheckResponse, CreateAppointmentRequest,
    RescheduleAppointmentRequest, UpdateStatusRequest,
};
use crate::services::conflict::{occupied_intervals, ConflictDetectionService};
use crate::services::lifecycle::{AppointmentLifecycleService, StatusChange};
use crate::services::locks::BookingLocks;
use crate::services::store::AppointmentStore;

pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    doctors: Arc<DoctorService>,
    patients: Arc<PatientService>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    locks: BookingLocks,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        doctors: Arc<DoctorService>,
        patients: Arc<PatientService>,
    ) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&store)),
            lifecycle_service: AppointmentLifecycleService::new(),
            locks: BookingLocks::new(),
            store,
            doctors,
            patients,
        }
    }

    #[instrument(skip(self, request), fields(doctor_id = ?request.doctor_id, patient_id = ?request.patient_id))]
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let doctor_id = validation::required("doctorId", "Doctor", request.doctor_id)?;
        let patient_id = validation::required("patientId", "Patient", request.patient_id)?;
        let appointment_time =
            validation::required("appointmentTime", "Appointment time", request.appointment_time)?;
        let reason_for_visit =
            validation::required("reasonForVisit", "Reason for visit", request.reason_for_visit)?;

        self.lifecycle_service
            .validate_appointment_timing(appointment_time, Utc::now())?;
        self.lifecycle_service.validate_reason(&reason_for_visit)?;

        let doctor = self
            .find_doctor(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound(doctor_id))?;
        if !self.patient_exists(patient_id).await? {
            return Err(AppointmentError::PatientNotFound(patient_id));
        }

        // Held across the policy check and the insert.
        let _guard = self.locks.acquire(doctor_id).await;
        self.conflict_service
            .ensure_bookable(&doctor, appointment_time, None)
            .await?;

        let appointment = self
            .store
            .insert(Appointment {
                id: 0,
                doctor_id,
                patient_id,
                appointment_time,
                status: AppointmentStatus::Scheduled,
                reason_for_visit,
            })
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!(
            "Appointment {} booked with doctor {} at {}",
            appointment.id, doctor_id, appointment_time
        );
        Ok(appointment)
    }

    pub async fn find_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);
        self.store
            .get(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn get_appointment(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    #[instrument(skip(self, request))]
    pub async fn update_status(
        &self,
        appointment_id: i64,
        request: UpdateStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        let new_status = self.lifecycle_service.parse_status(request.new_status)?;
        let mut appointment = self.get_appointment(appointment_id).await?;

        let _guard = self.locks.acquire(appointment.doctor_id).await;
        // Re-read under the lock so the transition applies to the latest row.
        appointment = self.get_appointment(appointment.id).await?;

        match self
            .lifecycle_service
            .validate_status_transition(appointment.status, new_status)?
        {
            StatusChange::Unchanged => {
                debug!("Appointment {} already {}", appointment.id, new_status);
                Ok(appointment)
            }
            StatusChange::Transition(status) => {
                appointment.status = status;
                let updated = self.persist(appointment).await?;
                info!("Appointment {} is now {}", updated.id, updated.status);
                Ok(updated)
            }
        }
    }

    #[instrument(skip(self, request))]
    pub async fn reschedule_appointment(
        &self,
        appointment_id: i64,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let new_time =
            validation::required("appointmentTime", "Appointment time", request.appointment_time)?;
        self.lifecycle_service
            .validate_appointment_timing(new_time, Utc::now())?;

        let current = self.get_appointment(appointment_id).await?;
        let doctor = self
            .find_doctor(current.doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound(current.doctor_id))?;

        let _guard = self.locks.acquire(doctor.id).await;
        let mut appointment = self.get_appointment(appointment_id).await?;
        if appointment.status != AppointmentStatus::Scheduled {
            warn!(
                "Refusing to reschedule appointment {} in status {}",
                appointment.id, appointment.status
            );
            return Err(AppointmentError::NotModifiable(appointment.status));
        }

        self.conflict_service
            .ensure_bookable(&doctor, new_time, Some(appointment.id))
            .await?;

        let previous = appointment.appointment_time;
        appointment.appointment_time = new_time;
        let updated = self.persist(appointment).await?;

        info!(
            "Appointment {} moved from {} to {}",
            updated.id, previous, updated.appointment_time
        );
        Ok(updated)
    }

    pub async fn delete_appointment(&self, appointment_id: i64) -> Result<(), AppointmentError> {
        let removed = self
            .store
            .delete(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if !removed {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    /// Every appointment, in any status, starting on `date`.
    pub async fn doctor_schedule(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.listed_doctor(doctor_id).await?;
        let (from, to) = day_bounds(date)?;

        let appointments = self
            .store
            .list_for_doctor(doctor_id, from, to, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        Ok(appointments)
    }

    pub async fn patient_appointments(
        &self,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !self.patient_exists(patient_id).await? {
            return Err(AppointmentError::ResourceNotFound {
                resource: "Patient",
                id: patient_id,
            });
        }
        self.store
            .list_for_patient(patient_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// The doctor's declared slots laid onto `date`, each marked free or taken
    /// by a scheduled appointment.
    pub async fn doctor_availability(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, AppointmentError> {
        let doctor = self.listed_doctor(doctor_id).await?;
        let (from, to) = day_bounds(date)?;
        // An appointment starting late the previous day can spill into this one.
        let lookback = from
            .checked_sub_signed(appointment_duration())
            .ok_or_else(|| out_of_range(date))?;

        let booked = self
            .store
            .list_for_doctor(
                doctor_id,
                lookback,
                to,
                Some(AppointmentStatus::Scheduled),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(AvailabilityService::slots_on(
            &doctor,
            date,
            &occupied_intervals(&booked),
        ))
    }

    pub async fn check_conflicts(
        &self,
        query: ConflictCheckQuery,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        self.conflict_service
            .check_conflicts(
                query.doctor_id,
                query.appointment_time,
                query.exclude_appointment_id,
            )
            .await
    }

    async fn find_doctor(&self, doctor_id: i64) -> Result<Option<Doctor>, AppointmentError> {
        self.doctors
            .find_doctor(doctor_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// Doctor lookup for read endpoints, where a missing doctor is a 404.
    async fn listed_doctor(&self, doctor_id: i64) -> Result<Doctor, AppointmentError> {
        self.find_doctor(doctor_id)
            .await?
            .ok_or(AppointmentError::ResourceNotFound {
                resource: "Doctor",
                id: doctor_id,
            })
    }

    async fn patient_exists(&self, patient_id: i64) -> Result<bool, AppointmentError> {
        let patient = self
            .patients
            .find_patient(patient_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        Ok(patient.is_some())
    }

    async fn persist(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        self.store
            .update(appointment)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)
    }
}

fn day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AppointmentError> {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| out_of_range(date))?;
    Ok((start, end))
}

fn out_of_range(date: NaiveDate) -> AppointmentError {
    ValidationError::new("date", format!("Date {} is outside the supported range", date)).into()
}
