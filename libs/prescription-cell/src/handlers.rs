use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, JsonBody};

use crate::models::{
    CreatePrescriptionRequest, Prescription, PrescriptionCreated, UpdatePrescriptionRequest,
};
use crate::services::PrescriptionService;

#[axum::debug_handler]
pub async fn create_prescription(
    State(service): State<Arc<PrescriptionService>>,
    JsonBody(request): JsonBody<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<PrescriptionCreated>), AppError> {
    let prescription = service.create_prescription(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PrescriptionCreated {
            prescription_id: prescription.id,
        }),
    ))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(service): State<Arc<PrescriptionService>>,
    Path(prescription_id): Path<String>,
) -> Result<Json<Prescription>, AppError> {
    Ok(Json(service.get_prescription(&prescription_id).await?))
}

#[axum::debug_handler]
pub async fn get_appointment_prescriptions(
    State(service): State<Arc<PrescriptionService>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let prescriptions = service.list_for_appointment(appointment_id).await?;

    Ok(Json(json!({
        "prescriptions": prescriptions,
        "total": prescriptions.len()
    })))
}

#[axum::debug_handler]
pub async fn update_prescription(
    State(service): State<Arc<PrescriptionService>>,
    Path(prescription_id): Path<String>,
    JsonBody(request): JsonBody<UpdatePrescriptionRequest>,
) -> Result<Json<Prescription>, AppError> {
    Ok(Json(service.update_prescription(&prescription_id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_prescription(
    State(service): State<Arc<PrescriptionService>>,
    Path(prescription_id): Path<String>,
) -> Result<StatusCode, AppError> {
    service.delete_prescription(&prescription_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
