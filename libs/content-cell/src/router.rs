use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn content_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/articles", get(handlers::list_articles))
        .route("/articles", post(handlers::create_article))
        .route("/articles/draft", post(handlers::draft_article))
        .route("/articles/{article_id}", get(handlers::get_article))
        .route("/articles/{article_id}", put(handlers::update_article))
        .route("/articles/{article_id}", delete(handlers::delete_article))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
