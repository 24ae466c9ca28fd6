use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::services::{
    patient::PatientService,
    engagement::EngagementService,
};
use crate::models::{
    CreatePatientRequest, UpdatePatientRequest, UpdateEngagementStatusRequest,
    EngagementStatusResponse, RosterResponse,
};

fn map_patient_error(e: anyhow::Error) -> AppError {
    let msg = e.to_string();
    if msg.contains("not found") {
        AppError::NotFound("Patient not found".to_string())
    } else if msg.contains("already exists") {
        AppError::Conflict(msg)
    } else if msg.contains("timed out") {
        AppError::Internal(msg)
    } else if msg.contains("required") || msg.contains("Invalid patient ID") {
        AppError::ValidationError(msg)
    } else {
        AppError::Internal(msg)
    }
}

#[axum::debug_handler]
pub async fn list_roster(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<RosterResponse>, AppError> {
    let token = auth.token();
    let patient_service = PatientService::new(&state);

    let patients = patient_service.list_roster(token).await
        .map_err(map_patient_error)?;

    Ok(Json(RosterResponse {
        total: patients.len(),
        patients,
    }))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_service = PatientService::new(&state);

    let patient = patient_service.create_patient(request, token).await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_service = PatientService::new(&state);

    let patient = patient_service.get_patient(&patient_id, token).await
        .map_err(|_| AppError::NotFound("Patient not found".to_string()))?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_service = PatientService::new(&state);

    let patient = patient_service.update_patient(&patient_id, request, token).await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_engagement_status(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // 404 for unknown patients rather than reporting an implicit status
    let patient_service = PatientService::new(&state);
    patient_service.get_patient(&patient_id, token).await
        .map_err(|_| AppError::NotFound("Patient not found".to_string()))?;

    let engagement_service = EngagementService::new(&state);
    let status = engagement_service.get_current_status(&patient_id, token).await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "patient_id": patient_id,
        "status": status
    })))
}

#[axum::debug_handler]
pub async fn update_engagement_status(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateEngagementStatusRequest>,
) -> Result<Json<EngagementStatusResponse>, AppError> {
    let token = auth.token();

    let patient_service = PatientService::new(&state);
    patient_service.get_patient(&patient_id, token).await
        .map_err(|_| AppError::NotFound("Patient not found".to_string()))?;

    let actor_is_admin = user.email.as_deref()
        .map(|email| state.is_admin_email(email))
        .unwrap_or(false);

    let engagement_service = EngagementService::new(&state);
    let response = engagement_service
        .update_status(&patient_id, request, actor_is_admin, token)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(response))
}
