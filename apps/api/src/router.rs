use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use doctor_cell::doctor_routes;
use patient_cell::patient_routes;
use prescription_cell::prescription_routes;

use crate::state::AppServices;

pub fn create_router(services: AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/doctors", doctor_routes(services.doctors))
        .nest("/patients", patient_routes(services.patients))
        .nest("/appointments", appointment_routes(services.booking))
        .nest("/prescriptions", prescription_routes(services.prescriptions))
}
