use std::sync::Arc;

use axum::{routing::{get, post, put}, Router};

use crate::handlers::*;
use crate::services::PatientService;

pub fn patient_routes(service: Arc<PatientService>) -> Router {
    Router::new()
        .route("/", post(create_patient))
        .route("/{patient_id}", get(get_patient).put(update_patient).delete(delete_patient))
        .route("/{patient_id}/password", put(change_password))
        .with_state(service)
}
