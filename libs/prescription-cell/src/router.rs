use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::PrescriptionService;

pub fn prescription_routes(service: Arc<PrescriptionService>) -> Router {
    Router::new()
        .route("/", post(handlers::create_prescription))
        .route(
            "/{prescription_id}",
            get(handlers::get_prescription)
                .put(handlers::update_prescription)
                .delete(handlers::delete_prescription),
        )
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment_prescriptions),
        )
        .with_state(service)
}
