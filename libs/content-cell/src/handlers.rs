use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::services::{
    article::ArticleService,
    drafting::ArticleDraftingService,
};
use crate::models::{
    ArticleStatus, ContentError, CreateArticleRequest, UpdateArticleRequest,
    DraftConversationRequest, DraftResponse,
};

#[derive(Debug, Deserialize)]
pub struct ArticleListQuery {
    pub status: Option<ArticleStatus>,
}

fn map_article_error(e: anyhow::Error) -> AppError {
    let msg = e.to_string();
    if msg.contains("not found") {
        AppError::NotFound("Article not found".to_string())
    } else if msg.contains("already exists") {
        AppError::Conflict(msg)
    } else {
        AppError::Internal(msg)
    }
}

fn map_content_error(e: ContentError) -> AppError {
    match e {
        ContentError::NotConfigured => {
            AppError::Internal("Article drafting is not configured".to_string())
        }
        ContentError::EmptyConversation => AppError::BadRequest(e.to_string()),
        ContentError::MalformedResponse(_) => AppError::ExternalService(e.to_string()),
        ContentError::ApiError { .. } => AppError::ExternalService(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn list_articles(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ArticleListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let article_service = ArticleService::new(&state);

    let articles = article_service.list_articles(query.status, token).await
        .map_err(map_article_error)?;

    Ok(Json(json!({
        "total": articles.len(),
        "articles": articles
    })))
}

#[axum::debug_handler]
pub async fn get_article(
    State(state): State<Arc<AppConfig>>,
    Path(article_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let article_service = ArticleService::new(&state);

    let article = article_service.get_article(&article_id, token).await
        .map_err(|_| AppError::NotFound("Article not found".to_string()))?;

    Ok(Json(json!(article)))
}

#[axum::debug_handler]
pub async fn create_article(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateArticleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let article_service = ArticleService::new(&state);

    let article = article_service.create_article(request, token).await
        .map_err(map_article_error)?;

    Ok(Json(json!(article)))
}

#[axum::debug_handler]
pub async fn update_article(
    State(state): State<Arc<AppConfig>>,
    Path(article_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let article_service = ArticleService::new(&state);

    let article = article_service.update_article(&article_id, request, token).await
        .map_err(map_article_error)?;

    Ok(Json(json!(article)))
}

#[axum::debug_handler]
pub async fn delete_article(
    State(state): State<Arc<AppConfig>>,
    Path(article_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let article_service = ArticleService::new(&state);

    article_service.delete_article(&article_id, token).await
        .map_err(map_article_error)?;

    Ok(Json(json!({ "success": true })))
}

/// Run a drafting conversation through the model and persist the result as
/// a draft article.
#[axum::debug_handler]
pub async fn draft_article(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<DraftConversationRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let drafting_service = ArticleDraftingService::new(&state)
        .map_err(map_content_error)?;

    let draft = drafting_service.draft_article(&request).await
        .map_err(map_content_error)?;

    let article_service = ArticleService::new(&state);
    let article = article_service.save_draft(&draft, token).await
        .map_err(map_article_error)?;

    Ok(Json(DraftResponse { draft, article }))
}
