use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;
use chrono::{NaiveDate, Utc};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::services::{
    payer::PayerService,
    bookability::BookabilityService,
    sanity::SanityCheckService,
};
use crate::models::{
    CreatePayerRequest, UpdatePayerRequest,
    CreateContractRequest, UpdateContractRequest, CreateSupervisionRequest,
    BookableProvidersResponse,
};

#[derive(Debug, Deserialize)]
pub struct ServiceDateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SanityCheckQuery {
    pub as_of: Option<NaiveDate>,
    pub format: Option<String>,
}

fn map_payer_error(e: anyhow::Error) -> AppError {
    let msg = e.to_string();
    if msg.contains("not found") {
        AppError::NotFound("Payer not found".to_string())
    } else if msg.contains("already exists") {
        AppError::Conflict(msg)
    } else if msg.contains("cannot supervise") {
        AppError::BadRequest(msg)
    } else {
        AppError::Internal(msg)
    }
}

// ==============================================================================
// PAYER CRUD
// ==============================================================================

#[axum::debug_handler]
pub async fn create_payer(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePayerRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let payer_service = PayerService::new(&state);

    let payer = payer_service.create_payer(request, token).await
        .map_err(map_payer_error)?;

    Ok(Json(json!(payer)))
}

#[axum::debug_handler]
pub async fn get_payer(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let payer_service = PayerService::new(&state);

    let payer = payer_service.get_payer(&payer_id, token).await
        .map_err(|_| AppError::NotFound("Payer not found".to_string()))?;

    Ok(Json(json!(payer)))
}

#[axum::debug_handler]
pub async fn list_payers(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let payer_service = PayerService::new(&state);

    let payers = payer_service.list_payers(token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "total": payers.len(),
        "payers": payers
    })))
}

#[axum::debug_handler]
pub async fn update_payer(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePayerRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let payer_service = PayerService::new(&state);

    let updated = payer_service.update_payer(&payer_id, request, token).await
        .map_err(map_payer_error)?;

    Ok(Json(json!(updated)))
}

// ==============================================================================
// CONTRACTS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_contract(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateContractRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let payer_service = PayerService::new(&state);

    let contract = payer_service.create_contract(&payer_id, request, token).await
        .map_err(map_payer_error)?;

    Ok(Json(json!(contract)))
}

#[axum::debug_handler]
pub async fn update_contract(
    State(state): State<Arc<AppConfig>>,
    Path((_payer_id, contract_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateContractRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let payer_service = PayerService::new(&state);

    let updated = payer_service.update_contract(&contract_id, request, token).await
        .map_err(map_payer_error)?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn list_contracts(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let payer_service = PayerService::new(&state);

    let contracts = payer_service.list_contracts(&payer_id, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "payer_id": payer_id,
        "total": contracts.len(),
        "contracts": contracts
    })))
}

// ==============================================================================
// SUPERVISION
// ==============================================================================

#[axum::debug_handler]
pub async fn create_supervision(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSupervisionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let payer_service = PayerService::new(&state);

    let supervision = payer_service.create_supervision(&payer_id, request, token).await
        .map_err(map_payer_error)?;

    Ok(Json(json!(supervision)))
}

#[axum::debug_handler]
pub async fn end_supervision(
    State(state): State<Arc<AppConfig>>,
    Path((_payer_id, supervision_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let payer_service = PayerService::new(&state);

    payer_service.end_supervision(&supervision_id, token).await
        .map_err(map_payer_error)?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn list_supervisions(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let payer_service = PayerService::new(&state);

    let supervisions = payer_service.list_supervisions(&payer_id, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "payer_id": payer_id,
        "total": supervisions.len(),
        "supervision_relationships": supervisions
    })))
}

// ==============================================================================
// BOOKABILITY + SANITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_bookable_providers(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    Query(query): Query<ServiceDateQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<BookableProvidersResponse>, AppError> {
    let token = auth.token();
    let bookability_service = BookabilityService::new(&state);

    let service_date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let (payer, resolution) = bookability_service
        .resolve_for_payer(&payer_id, service_date, token)
        .await
        .map_err(|e| {
            if e.to_string().contains("not found") {
                AppError::NotFound("Payer not found".to_string())
            } else {
                AppError::Internal(e.to_string())
            }
        })?;

    Ok(Json(BookableProvidersResponse {
        payer_id: payer.id,
        service_date,
        total: resolution.bookable.len(),
        providers: resolution.bookable,
        blocked_by_flags: resolution.blocked_by_flags,
    }))
}

#[axum::debug_handler]
pub async fn run_sanity_check(
    State(state): State<Arc<AppConfig>>,
    Path(payer_id): Path<String>,
    Query(query): Query<SanityCheckQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<axum::response::Response, AppError> {
    use axum::response::IntoResponse;

    let token = auth.token();
    let sanity_service = SanityCheckService::new(&state);

    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let report = sanity_service.run_payer_checks(&payer_id, as_of, token).await
        .map_err(|e| {
            if e.to_string().contains("not found") {
                AppError::NotFound("Payer not found".to_string())
            } else {
                AppError::Internal(e.to_string())
            }
        })?;

    if query.format.as_deref() == Some("text") {
        return Ok(report.render_text_summary().into_response());
    }

    Ok(Json(report).into_response())
}
