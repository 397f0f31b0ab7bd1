use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, JsonBody};

use crate::models::{ChangePasswordRequest, CreatePatientRequest, PatientProfile, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(service): State<Arc<PatientService>>,
    JsonBody(request): JsonBody<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient = service.create_patient(request).await?;

    Ok((StatusCode::CREATED, Json(json!(PatientProfile::from(patient)))))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let patient = service.get_patient(patient_id).await?;

    Ok(Json(json!(PatientProfile::from(patient))))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
    JsonBody(request): JsonBody<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = service.update_patient(patient_id, request).await?;

    Ok(Json(json!(PatientProfile::from(patient))))
}

#[axum::debug_handler]
pub async fn change_password(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    service.change_password(patient_id, request).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_patient(patient_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
