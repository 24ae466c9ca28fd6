use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use booking_cell::router::booking_routes;
use content_cell::router::content_routes;
use patient_cell::router::patient_routes;
use payer_cell::router::payer_routes;
use provider_cell::router::provider_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Ops API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/providers", provider_routes(state.clone()))
        .nest("/payers", payer_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/content", content_routes(state.clone()))
}
