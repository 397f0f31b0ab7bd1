use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, JsonBody};

use crate::models::{
    ChangePasswordRequest, CreateDoctorRequest, DoctorProfile, DoctorSearchQuery,
    UpdateDoctorRequest,
};
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn create_doctor(
    State(service): State<Arc<DoctorService>>,
    JsonBody(request): JsonBody<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = service.create_doctor(request).await?;

    Ok((StatusCode::CREATED, Json(json!(DoctorProfile::from(doctor)))))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = service.get_doctor(doctor_id).await?;

    Ok(Json(json!(DoctorProfile::from(doctor))))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(service): State<Arc<DoctorService>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors: Vec<DoctorProfile> = service
        .list_doctors(query)
        .await?
        .into_iter()
        .map(DoctorProfile::from)
        .collect();

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<i64>,
    JsonBody(request): JsonBody<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = service.update_doctor(doctor_id, request).await?;

    Ok(Json(json!(DoctorProfile::from(doctor))))
}

#[axum::debug_handler]
pub async fn change_password(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<i64>,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    service.change_password(doctor_id, request).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_doctor(doctor_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
