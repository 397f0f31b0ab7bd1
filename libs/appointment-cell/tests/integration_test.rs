use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use futures::future::join_all;

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, CreateAppointmentRequest, RescheduleAppointmentRequest,
    UpdateStatusRequest,
};
use appointment_cell::services::{BookingService, MemoryAppointmentStore};
use doctor_cell::models::CreateDoctorRequest;
use doctor_cell::services::{DoctorService, MemoryDoctorStore};
use patient_cell::models::CreatePatientRequest;
use patient_cell::services::{MemoryPatientStore, PatientService};
use shared_models::AppError;
use shared_utils::test_utils::days_from_now_at;

struct Clinic {
    booking: Arc<BookingService>,
    doctors: Arc<DoctorService>,
    patients: Arc<PatientService>,
}

impl Clinic {
    fn new() -> Self {
        let doctors = Arc::new(DoctorService::new(Arc::new(MemoryDoctorStore::new())));
        let patients = Arc::new(PatientService::new(Arc::new(MemoryPatientStore::new())));
        let booking = Arc::new(BookingService::new(
            Arc::new(MemoryAppointmentStore::new()),
            doctors.clone(),
            patients.clone(),
        ));
        Self { booking, doctors, patients }
    }

    async fn doctor(&self, email: &str, slots: &[&str]) -> i64 {
        self.doctors
            .create_doctor(CreateDoctorRequest {
                name: Some("Dr. Jane Doe".to_string()),
                specialty: Some("Cardiology".to_string()),
                email: Some(email.to_string()),
                password: Some("secret123".to_string()),
                phone: Some("5551234567".to_string()),
                available_times: slots.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn patient(&self, email: &str) -> i64 {
        self.patients
            .create_patient(CreatePatientRequest {
                name: Some("John Smith".to_string()),
                email: Some(email.to_string()),
                password: Some("secret123".to_string()),
                phone: Some("5559876543".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }
}

fn request(doctor_id: i64, patient_id: i64, at: chrono::DateTime<Utc>) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        doctor_id: Some(doctor_id),
        patient_id: Some(patient_id),
        appointment_time: Some(at),
        reason_for_visit: Some("Annual checkup".to_string()),
    }
}

#[tokio::test]
async fn booking_inside_a_slot_is_scheduled_for_one_hour() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-10:00"]).await;
    let patient = clinic.patient("john@example.com").await;
    let start = days_from_now_at(3, 9, 30);

    let appointment = clinic
        .booking
        .create_appointment(request(doctor, patient, start))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.status.code(), 0);
    assert_eq!(appointment.end_time(), start + Duration::hours(1));
    assert_eq!(
        appointment
            .appointment_date()
            .and_time(appointment.appointment_time_only())
            .and_utc(),
        appointment.appointment_time
    );

    let stored = clinic.booking.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored, appointment);
}

#[tokio::test]
async fn past_start_time_is_a_validation_error() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["00:00-23:59"]).await;
    let patient = clinic.patient("john@example.com").await;

    let result = clinic
        .booking
        .create_appointment(request(doctor, patient, Utc::now() - Duration::hours(1)))
        .await;

    assert_matches!(result, Err(AppointmentError::Validation(e)) if e.field == "appointmentTime");
}

#[tokio::test]
async fn request_fields_are_validated_before_lookups() {
    let clinic = Clinic::new();
    let start = days_from_now_at(3, 9, 30);

    let mut missing_doctor = request(1, 1, start);
    missing_doctor.doctor_id = None;
    assert_matches!(
        clinic.booking.create_appointment(missing_doctor).await,
        Err(AppointmentError::Validation(e)) if e.field == "doctorId"
    );

    let mut short_reason = request(1, 1, start);
    short_reason.reason_for_visit = Some("Hi".to_string());
    assert_matches!(
        clinic.booking.create_appointment(short_reason).await,
        Err(AppointmentError::Validation(e)) if e.field == "reasonForVisit"
    );
}

#[tokio::test]
async fn unknown_doctor_or_patient_is_a_reference_error() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-10:00"]).await;
    let patient = clinic.patient("john@example.com").await;
    let start = days_from_now_at(3, 9, 30);

    let err = clinic
        .booking
        .create_appointment(request(99, patient, start))
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::DoctorNotFound(99));
    assert_matches!(AppError::from(err), AppError::Reference(_));

    assert_matches!(
        clinic.booking.create_appointment(request(doctor, 42, start)).await,
        Err(AppointmentError::PatientNotFound(42))
    );
}

#[tokio::test]
async fn start_outside_declared_slots_conflicts() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-10:00"]).await;
    let idle = clinic.doctor("idle@example.com", &[]).await;
    let patient = clinic.patient("john@example.com").await;

    let err = clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 10, 0)))
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::DoctorNotAvailable { .. });
    assert_matches!(AppError::from(err), AppError::Conflict(_));

    assert_matches!(
        clinic
            .booking
            .create_appointment(request(idle, patient, days_from_now_at(3, 9, 30)))
            .await,
        Err(AppointmentError::DoctorNotAvailable { .. })
    );
}

#[tokio::test]
async fn overlapping_booking_conflicts_but_adjacent_does_not() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["13:00-17:00"]).await;
    let patient = clinic.patient("john@example.com").await;

    clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 13, 0)))
        .await
        .unwrap();

    assert_matches!(
        clinic
            .booking
            .create_appointment(request(doctor, patient, days_from_now_at(3, 13, 30)))
            .await,
        Err(AppointmentError::ConflictDetected { .. })
    );

    assert!(clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 14, 0)))
        .await
        .is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_bookings_admit_exactly_one() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["13:00-17:00"]).await;
    let patient = clinic.patient("john@example.com").await;

    let attempts = [
        days_from_now_at(4, 14, 0),
        days_from_now_at(4, 14, 30),
    ];

    let results = join_all(attempts.into_iter().map(|start| {
        let booking = clinic.booking.clone();
        tokio::spawn(async move { booking.create_appointment(request(doctor, patient, start)).await })
    }))
    .await;

    let results: Vec<_> = results.into_iter().map(|joined| joined.unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppointmentError::ConflictDetected { .. })))
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_requests_for_one_time_admit_exactly_one() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["13:00-17:00"]).await;
    let patient = clinic.patient("john@example.com").await;
    let start = days_from_now_at(5, 15, 0);

    let results = join_all((0..8).map(|_| {
        let booking = clinic.booking.clone();
        tokio::spawn(async move { booking.create_appointment(request(doctor, patient, start)).await })
    }))
    .await;

    let successes = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1);
    assert_eq!(clinic.booking.patient_appointments(patient).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_doctors_book_the_same_time_independently() {
    let clinic = Clinic::new();
    let first = clinic.doctor("first@example.com", &["09:00-10:00"]).await;
    let second = clinic.doctor("second@example.com", &["09:00-10:00"]).await;
    let patient = clinic.patient("john@example.com").await;
    let start = days_from_now_at(3, 9, 0);

    let results = join_all([first, second].into_iter().map(|doctor| {
        let booking = clinic.booking.clone();
        tokio::spawn(async move { booking.create_appointment(request(doctor, patient, start)).await })
    }))
    .await;

    assert!(results.into_iter().all(|joined| joined.unwrap().is_ok()));
}

#[tokio::test]
async fn status_moves_only_from_scheduled_to_completed() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-10:00"]).await;
    let patient = clinic.patient("john@example.com").await;
    let appointment = clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 9, 0)))
        .await
        .unwrap();

    assert_matches!(
        clinic
            .booking
            .update_status(appointment.id, UpdateStatusRequest { new_status: Some(2) })
            .await,
        Err(AppointmentError::Validation(_))
    );

    let completed = clinic
        .booking
        .update_status(appointment.id, UpdateStatusRequest { new_status: Some(1) })
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let again = clinic
        .booking
        .update_status(appointment.id, UpdateStatusRequest { new_status: Some(1) })
        .await
        .unwrap();
    assert_eq!(again.status, AppointmentStatus::Completed);

    let err = clinic
        .booking
        .update_status(appointment.id, UpdateStatusRequest { new_status: Some(0) })
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::InvalidStatusTransition { .. });
    assert_matches!(AppError::from(err), AppError::Validation(_));

    assert_matches!(
        clinic
            .booking
            .update_status(999, UpdateStatusRequest { new_status: Some(1) })
            .await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn completed_appointment_no_longer_blocks_the_slot() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-10:00"]).await;
    let patient = clinic.patient("john@example.com").await;
    let start = days_from_now_at(3, 9, 0);

    let first = clinic
        .booking
        .create_appointment(request(doctor, patient, start))
        .await
        .unwrap();
    clinic
        .booking
        .update_status(first.id, UpdateStatusRequest { new_status: Some(1) })
        .await
        .unwrap();

    assert!(clinic
        .booking
        .create_appointment(request(doctor, patient, start))
        .await
        .is_ok());
}

#[tokio::test]
async fn reschedule_reruns_the_booking_policy() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["13:00-17:00"]).await;
    let patient = clinic.patient("john@example.com").await;

    let first = clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 13, 0)))
        .await
        .unwrap();
    let second = clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 15, 0)))
        .await
        .unwrap();

    // Overlapping its own old interval is fine.
    let moved = clinic
        .booking
        .reschedule_appointment(
            first.id,
            RescheduleAppointmentRequest {
                appointment_time: Some(days_from_now_at(3, 13, 30)),
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.appointment_time, days_from_now_at(3, 13, 30));

    assert_matches!(
        clinic
            .booking
            .reschedule_appointment(
                first.id,
                RescheduleAppointmentRequest {
                    appointment_time: Some(days_from_now_at(3, 14, 30)),
                },
            )
            .await,
        Err(AppointmentError::ConflictDetected { .. })
    );

    assert_matches!(
        clinic
            .booking
            .reschedule_appointment(
                first.id,
                RescheduleAppointmentRequest {
                    appointment_time: Some(days_from_now_at(3, 8, 0)),
                },
            )
            .await,
        Err(AppointmentError::DoctorNotAvailable { .. })
    );

    clinic
        .booking
        .update_status(second.id, UpdateStatusRequest { new_status: Some(1) })
        .await
        .unwrap();
    assert_matches!(
        clinic
            .booking
            .reschedule_appointment(
                second.id,
                RescheduleAppointmentRequest {
                    appointment_time: Some(days_from_now_at(4, 15, 0)),
                },
            )
            .await,
        Err(AppointmentError::NotModifiable(AppointmentStatus::Completed))
    );
}

#[tokio::test]
async fn availability_marks_booked_slots() {
    let clinic = Clinic::new();
    let doctor = clinic
        .doctor("jane@example.com", &["13:00-14:00", "09:00-10:00"])
        .await;
    let patient = clinic.patient("john@example.com").await;
    let start = days_from_now_at(3, 9, 30);

    clinic
        .booking
        .create_appointment(request(doctor, patient, start))
        .await
        .unwrap();

    let slots = clinic
        .booking
        .doctor_availability(doctor, start.date_naive())
        .await
        .unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].slot, "09:00-10:00");
    assert!(!slots[0].available);
    assert_eq!(slots[1].slot, "13:00-14:00");
    assert!(slots[1].available);

    let next_day = clinic
        .booking
        .doctor_availability(doctor, start.date_naive() + Duration::days(1))
        .await
        .unwrap();
    assert!(next_day.iter().all(|slot| slot.available));
}

#[tokio::test]
async fn listings_and_deletion() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-12:00"]).await;
    let patient = clinic.patient("john@example.com").await;

    let later = clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 11, 0)))
        .await
        .unwrap();
    let earlier = clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(3, 9, 0)))
        .await
        .unwrap();
    clinic
        .booking
        .create_appointment(request(doctor, patient, days_from_now_at(4, 9, 0)))
        .await
        .unwrap();

    let day = clinic
        .booking
        .doctor_schedule(doctor, days_from_now_at(3, 0, 0).date_naive())
        .await
        .unwrap();
    assert_eq!(
        day.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![earlier.id, later.id]
    );

    assert_eq!(clinic.booking.patient_appointments(patient).await.unwrap().len(), 3);
    assert_matches!(
        clinic.booking.patient_appointments(77).await,
        Err(AppointmentError::ResourceNotFound { resource: "Patient", id: 77 })
    );

    clinic.booking.delete_appointment(later.id).await.unwrap();
    assert_matches!(
        clinic.booking.get_appointment(later.id).await,
        Err(AppointmentError::NotFound)
    );
    assert_matches!(
        clinic.booking.delete_appointment(later.id).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn reads_for_unknown_owners_are_not_found() {
    let clinic = Clinic::new();
    let date = days_from_now_at(3, 0, 0).date_naive();

    let err = clinic.booking.doctor_schedule(9, date).await.unwrap_err();
    assert_matches!(err, AppointmentError::ResourceNotFound { resource: "Doctor", id: 9 });
    assert_matches!(AppError::from(err), AppError::NotFound(_));

    assert_matches!(
        clinic.booking.doctor_availability(9, date).await,
        Err(AppointmentError::ResourceNotFound { resource: "Doctor", id: 9 })
    );
    assert_matches!(
        AppError::from(clinic.booking.patient_appointments(77).await.unwrap_err()),
        AppError::NotFound(_)
    );
}

#[tokio::test]
async fn calendar_edge_dates_are_validation_errors() {
    let clinic = Clinic::new();
    let doctor = clinic.doctor("jane@example.com", &["09:00-10:00"]).await;

    for date in [chrono::NaiveDate::MAX, chrono::NaiveDate::MIN] {
        assert_matches!(
            clinic.booking.doctor_availability(doctor, date).await,
            Err(AppointmentError::Validation(e)) if e.field == "date"
        );
    }
    assert_matches!(
        clinic.booking.doctor_schedule(doctor, chrono::NaiveDate::MAX).await,
        Err(AppointmentError::Validation(e)) if e.field == "date"
    );
    assert!(clinic
        .booking
        .doctor_schedule(doctor, chrono::NaiveDate::MIN)
        .await
        .unwrap()
        .is_empty());
}
