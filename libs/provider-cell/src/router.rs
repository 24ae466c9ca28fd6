use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn provider_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required) - booking widget reads
    let public_routes = Router::new()
        .route("/{provider_id}/available-slots", get(handlers::get_available_slots_public));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        // Roster management
        .route("/", post(handlers::create_provider))
        .route("/", get(handlers::search_providers))
        .route("/export.csv", get(handlers::export_providers_csv))
        .route("/{provider_id}", get(handlers::get_provider))
        .route("/{provider_id}", put(handlers::update_provider))

        // Weekly schedule management
        .route("/{provider_id}/availability", post(handlers::create_weekly_availability))
        .route("/{provider_id}/availability", get(handlers::get_weekly_availability))
        .route("/{provider_id}/availability/{availability_id}", put(handlers::update_weekly_availability))
        .route("/{provider_id}/availability/{availability_id}", delete(handlers::delete_weekly_availability))

        // Date-specific exceptions
        .route("/{provider_id}/exceptions", post(handlers::create_exception))
        .route("/{provider_id}/exceptions/{exception_id}", delete(handlers::delete_exception))

        // Authenticated slot listing
        .route("/auth/{provider_id}/available-slots", get(handlers::get_available_slots))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
