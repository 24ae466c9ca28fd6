use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    http::header,
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;
use chrono::NaiveDate;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::services::{
    provider::ProviderService,
    availability::AvailabilityService,
};
use crate::models::{
    CreateProviderRequest, UpdateProviderRequest, ProviderSearchFilters, ProviderRole,
    CreateWeeklyAvailabilityRequest, UpdateWeeklyAvailabilityRequest,
    CreateExceptionRequest, SlotRangeRequest, SlotListResponse,
};

// Query parameters for different endpoints
#[derive(Debug, Deserialize)]
pub struct ProviderSearchQuery {
    pub role: Option<ProviderRole>,
    pub is_active: Option<bool>,
    pub is_bookable: Option<bool>,
    pub accepts_new_patients: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub buffer_minutes: Option<i32>,
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots_public(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotListResponse>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let request = SlotRangeRequest {
        start_date: query.start_date,
        end_date: query.end_date.unwrap_or(query.start_date),
        duration_minutes: query.duration_minutes,
        buffer_minutes: query.buffer_minutes,
    };
    let end_date = request.end_date;

    let slots = availability_service
        .get_available_slots(&provider_id, request, &state.supabase_anon_key)
        .await
        .map_err(|e| {
            if e.to_string().contains("not found") {
                AppError::NotFound("Provider not found".to_string())
            } else {
                AppError::Internal(e.to_string())
            }
        })?;

    let provider_id = uuid::Uuid::parse_str(&provider_id)
        .map_err(|_| AppError::BadRequest("Invalid provider ID".to_string()))?;

    Ok(Json(SlotListResponse {
        provider_id,
        start_date: query.start_date,
        end_date,
        total_slots: slots.len(),
        slots,
    }))
}

// ==============================================================================
// PROTECTED PROVIDER ROSTER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_provider(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateProviderRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Only admins touch the roster
    require_admin(&user, &state)?;

    let provider_service = ProviderService::new(&state);

    let provider = provider_service.create_provider(request, token).await
        .map_err(|e| {
            if e.to_string().contains("already exists") {
                AppError::Conflict(e.to_string())
            } else {
                AppError::Internal(e.to_string())
            }
        })?;

    Ok(Json(json!(provider)))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let provider_service = ProviderService::new(&state);

    let provider = provider_service.get_provider(&provider_id, token).await
        .map_err(|_| AppError::NotFound("Provider not found".to_string()))?;

    Ok(Json(json!(provider)))
}

#[axum::debug_handler]
pub async fn update_provider(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProviderRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    require_admin(&user, &state)?;

    let provider_service = ProviderService::new(&state);

    let updated = provider_service.update_provider(&provider_id, request, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn search_providers(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ProviderSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let provider_service = ProviderService::new(&state);

    let filters = ProviderSearchFilters {
        role: query.role,
        is_active: query.is_active,
        is_bookable: query.is_bookable,
        accepts_new_patients: query.accepts_new_patients,
    };

    let providers = provider_service.search_providers(filters, token, query.limit, query.offset).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "total": providers.len(),
        "providers": providers
    })))
}

#[axum::debug_handler]
pub async fn export_providers_csv(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<impl IntoResponse, AppError> {
    let token = auth.token();
    let provider_service = ProviderService::new(&state);

    let csv = provider_service.export_providers_csv(token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"providers.csv\""),
        ],
        csv,
    ))
}

// ==============================================================================
// AVAILABILITY HANDLERS (Schedule Configuration)
// ==============================================================================

#[axum::debug_handler]
pub async fn create_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateWeeklyAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let availability = availability_service
        .create_weekly_availability(&provider_id, request, token)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("conflicts") || msg.contains("must be") {
                AppError::BadRequest(msg)
            } else {
                AppError::Internal(msg)
            }
        })?;

    Ok(Json(json!(availability)))
}

#[axum::debug_handler]
pub async fn get_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let availability = availability_service.get_weekly_availability(&provider_id, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(availability)))
}

#[axum::debug_handler]
pub async fn update_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path((_provider_id, availability_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateWeeklyAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let updated = availability_service
        .update_weekly_availability(&availability_id, request, token)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn delete_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path((_provider_id, availability_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    availability_service.delete_weekly_availability(&availability_id, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn create_exception(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateExceptionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let exception = availability_service.create_exception(&provider_id, request, token).await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("requires a valid") {
                AppError::BadRequest(msg)
            } else {
                AppError::Internal(msg)
            }
        })?;

    Ok(Json(json!(exception)))
}

#[axum::debug_handler]
pub async fn delete_exception(
    State(state): State<Arc<AppConfig>>,
    Path((_provider_id, exception_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    availability_service.delete_exception(&exception_id, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<String>,
    Query(query): Query<SlotQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let request = SlotRangeRequest {
        start_date: query.start_date,
        end_date: query.end_date.unwrap_or(query.start_date),
        duration_minutes: query.duration_minutes,
        buffer_minutes: query.buffer_minutes,
    };

    let slots = availability_service.get_available_slots(&provider_id, request, token).await
        .map_err(|e| {
            if e.to_string().contains("not found") {
                AppError::NotFound("Provider not found".to_string())
            } else {
                AppError::Internal(e.to_string())
            }
        })?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "start_date": query.start_date,
        "total_slots": slots.len(),
        "available_slots": slots
    })))
}
