// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, JsonBody};

use crate::models::{
    AppointmentCreated, AppointmentView, ConflictCheckQuery, CreateAppointmentRequest, DateQuery,
    RescheduleAppointmentRequest, UpdateStatusRequest,
};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<BookingService>>,
    JsonBody(request): JsonBody<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentCreated>), AppError> {
    let appointment = service.create_appointment(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(AppointmentCreated {
            appointment_id: appointment.id,
            status: appointment.status,
        }),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentView>, AppError> {
    let appointment = service.get_appointment(appointment_id).await?;

    Ok(Json(appointment.into()))
}

#[axum::debug_handler]
pub async fn update_status(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<i64>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> Result<Json<AppointmentView>, AppError> {
    let appointment = service.update_status(appointment_id, request).await?;

    Ok(Json(appointment.into()))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<i64>,
    JsonBody(request): JsonBody<RescheduleAppointmentRequest>,
) -> Result<Json<AppointmentView>, AppError> {
    let appointment = service.reschedule_appointment(appointment_id, request).await?;

    Ok(Json(appointment.into()))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_appointment(appointment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(service): State<Arc<BookingService>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments: Vec<AppointmentView> = service
        .doctor_schedule(doctor_id, query.date)
        .await?
        .into_iter()
        .map(AppointmentView::from)
        .collect();

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(service): State<Arc<BookingService>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = service.doctor_availability(doctor_id, query.date).await?;

    Ok(Json(json!({
        "doctorId": doctor_id,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(service): State<Arc<BookingService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let appointments: Vec<AppointmentView> = service
        .patient_appointments(patient_id)
        .await?
        .into_iter()
        .map(AppointmentView::from)
        .collect();

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn check_appointment_conflicts(
    State(service): State<Arc<BookingService>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let response = service.check_conflicts(query).await?;

    Ok(Json(json!(response)))
}
