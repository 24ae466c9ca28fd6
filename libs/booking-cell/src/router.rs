use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}/cancel", patch(handlers::cancel_appointment))
        .route("/slots", get(handlers::list_bookable_slots))

        // Practice-management system lookups
        .route("/practiceq/locations", get(handlers::get_practiceq_locations))
        .route("/practiceq/services", get(handlers::get_practiceq_services))
        .route("/practiceq/practitioners", get(handlers::get_practiceq_practitioners))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
