use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn payer_routes(state: Arc<AppConfig>) -> Router {
    // Everything here is staff-facing; admin checks happen per handler.
    let protected_routes = Router::new()
        // Payer management
        .route("/", post(handlers::create_payer))
        .route("/", get(handlers::list_payers))
        .route("/{payer_id}", get(handlers::get_payer))
        .route("/{payer_id}", put(handlers::update_payer))

        // Credentialing contracts
        .route("/{payer_id}/contracts", post(handlers::create_contract))
        .route("/{payer_id}/contracts", get(handlers::list_contracts))
        .route("/{payer_id}/contracts/{contract_id}", put(handlers::update_contract))

        // Supervision relationships
        .route("/{payer_id}/supervision", post(handlers::create_supervision))
        .route("/{payer_id}/supervision", get(handlers::list_supervisions))
        .route("/{payer_id}/supervision/{supervision_id}/end", patch(handlers::end_supervision))

        // Bookability + diagnostics
        .route("/{payer_id}/bookable-providers", get(handlers::get_bookable_providers))
        .route("/{payer_id}/sanity-check", get(handlers::run_sanity_check))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
