use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use doctor_cell::{intervals_overlap, AvailabilityService, Doctor};
use shared_models::ValidationError;

use crate::models::{
    appointment_duration, Appointment, AppointmentError, AppointmentStatus, AppointmentView,
    ConflictCheckResponse,
};
use crate::services::store::AppointmentStore;

/// Applies the booking policy: a doctor may take a one-hour appointment only
/// inside a declared slot and only where no scheduled appointment overlaps it.
pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Check for appointment conflicts for a doctor at a specific time
    pub async fn check_conflicts(
        &self,
        doctor_id: i64,
        start_time: DateTime<Utc>,
        exclude_appointment_id: Option<i64>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let (lookback, end_time) = start_time
            .checked_sub_signed(appointment_duration())
            .zip(start_time.checked_add_signed(appointment_duration()))
            .ok_or_else(|| {
                ValidationError::new(
                    "appointmentTime",
                    "Appointment time is outside the supported range",
                )
            })?;
        debug!(
            "Checking conflicts for doctor {} from {} to {}",
            doctor_id, start_time, end_time
        );

        // Any overlapping appointment must start within one duration of ours.
        let candidates = self
            .store
            .list_for_doctor(
                doctor_id,
                lookback,
                end_time,
                Some(AppointmentStatus::Scheduled),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let conflicting_appointments: Vec<AppointmentView> = candidates
            .into_iter()
            .filter(|a| Some(a.id) != exclude_appointment_id)
            .filter(|a| self.is_active_appointment(a.status))
            .filter(|a| {
                let (s2, e2) = a.interval();
                intervals_overlap(start_time, end_time, s2, e2)
            })
            .map(AppointmentView::from)
            .collect();

        let has_conflict = !conflicting_appointments.is_empty();
        if has_conflict {
            warn!(
                "Conflict detected for doctor {} - {} conflicting appointments",
                doctor_id,
                conflicting_appointments.len()
            );
        }

        Ok(ConflictCheckResponse {
            has_conflict,
            conflicting_appointments,
        })
    }

    /// The full policy for placing `start_time` on `doctor`'s calendar.
    pub async fn ensure_bookable(
        &self,
        doctor: &Doctor,
        start_time: DateTime<Utc>,
        exclude_appointment_id: Option<i64>,
    ) -> Result<(), AppointmentError> {
        if AvailabilityService::slot_containing(doctor, start_time).is_none() {
            warn!(
                "Doctor {} has no declared slot at {}",
                doctor.id,
                start_time.time()
            );
            return Err(AppointmentError::DoctorNotAvailable {
                doctor_id: doctor.id,
                time: start_time.time(),
            });
        }

        let check = self
            .check_conflicts(doctor.id, start_time, exclude_appointment_id)
            .await?;
        if check.has_conflict {
            return Err(AppointmentError::ConflictDetected {
                doctor_id: doctor.id,
                start: start_time,
            });
        }

        Ok(())
    }

    /// Only scheduled appointments hold a doctor's time.
    fn is_active_appointment(&self, status: AppointmentStatus) -> bool {
        matches!(status, AppointmentStatus::Scheduled)
    }
}

/// The intervals a set of appointments occupies.
pub fn occupied_intervals(appointments: &[Appointment]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    appointments.iter().map(Appointment::interval).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryAppointmentStore;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    fn doctor(slots: &[&str]) -> Doctor {
        Doctor {
            id: 1,
            name: "Dr. Ada Lovelace".to_string(),
            specialty: "Cardiology".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            phone: "0123456789".to_string(),
            available_times: slots.iter().map(|s| s.to_string()).collect(),
            years_of_experience: Some(10),
            clinic_address: None,
            rating: 0,
        }
    }

    async fn seeded(start: DateTime<Utc>, status: AppointmentStatus) -> Arc<MemoryAppointmentStore> {
        let store = Arc::new(MemoryAppointmentStore::new());
        store
            .insert(Appointment {
                id: 0,
                doctor_id: 1,
                patient_id: 1,
                appointment_time: start,
                status,
                reason_for_visit: "Follow-up".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn overlapping_scheduled_appointment_conflicts() {
        let nine = Utc.with_ymd_and_hms(2031, 5, 6, 9, 0, 0).unwrap();
        let service = ConflictDetectionService::new(seeded(nine, AppointmentStatus::Scheduled).await);

        let check = service
            .check_conflicts(1, nine + Duration::minutes(30), None)
            .await
            .unwrap();
        assert!(check.has_conflict);
        assert_eq!(check.conflicting_appointments.len(), 1);

        let back_to_back = service
            .check_conflicts(1, nine + Duration::hours(1), None)
            .await
            .unwrap();
        assert!(!back_to_back.has_conflict);
    }

    #[tokio::test]
    async fn completed_appointments_free_the_time() {
        let nine = Utc.with_ymd_and_hms(2031, 5, 6, 9, 0, 0).unwrap();
        let service = ConflictDetectionService::new(seeded(nine, AppointmentStatus::Completed).await);

        let check = service.check_conflicts(1, nine, None).await.unwrap();
        assert!(!check.has_conflict);
    }

    #[tokio::test]
    async fn excluded_appointment_is_ignored() {
        let nine = Utc.with_ymd_and_hms(2031, 5, 6, 9, 0, 0).unwrap();
        let service = ConflictDetectionService::new(seeded(nine, AppointmentStatus::Scheduled).await);

        let check = service.check_conflicts(1, nine, Some(1)).await.unwrap();
        assert!(!check.has_conflict);
    }

    #[tokio::test]
    async fn start_outside_declared_slots_is_refused() {
        let service = ConflictDetectionService::new(Arc::new(MemoryAppointmentStore::new()));
        let at = Utc.with_ymd_and_hms(2031, 5, 6, 11, 0, 0).unwrap();

        assert_matches!(
            service.ensure_bookable(&doctor(&["09:00-10:00"]), at, None).await,
            Err(AppointmentError::DoctorNotAvailable { .. })
        );
        assert_matches!(
            service.ensure_bookable(&doctor(&[]), at, None).await,
            Err(AppointmentError::DoctorNotAvailable { .. })
        );
        assert!(service
            .ensure_bookable(&doctor(&["10:00-12:00"]), at, None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn times_at_the_calendar_edges_are_validation_errors() {
        let service = ConflictDetectionService::new(Arc::new(MemoryAppointmentStore::new()));

        for edge in [DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MIN_UTC] {
            assert_matches!(
                service.check_conflicts(1, edge, None).await,
                Err(AppointmentError::Validation(e)) if e.field == "appointmentTime"
            );
        }
    }
}
