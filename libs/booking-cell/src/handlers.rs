use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;
use chrono::NaiveDate;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::{
    booking::BookingService,
    practiceq::{PracticeDirectory, PracticeQClient},
};
use crate::models::{
    BookAppointmentRequest, BookingError, CancelAppointmentRequest, PayerSlotListing,
    PracticeQError,
};

#[derive(Debug, Deserialize)]
pub struct PayerSlotQuery {
    pub payer_id: String,
    pub date: NaiveDate,
    pub duration_minutes: Option<i32>,
}

/// Booking failures carry a stable code next to the message so callers can
/// branch without string matching.
fn booking_error_response(e: BookingError) -> Response {
    let code = e.code();
    let (status, body) = match &e {
        BookingError::Validation(fields) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": e.to_string(), "code": code, "fields": fields }),
        ),
        BookingError::NoActivePolicy | BookingError::NoIntakeInstance => (
            StatusCode::BAD_REQUEST,
            json!({ "error": e.to_string(), "code": code }),
        ),
        BookingError::ProviderNotBookable | BookingError::SlotUnavailable => (
            StatusCode::CONFLICT,
            json!({ "error": e.to_string(), "code": code }),
        ),
        BookingError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            json!({ "error": format!("{} not found", what), "code": code }),
        ),
        BookingError::Upstream(inner) => {
            tracing::error!("Booking failed: {}", inner);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error", "code": code }),
            )
        }
    };

    (status, Json(body)).into_response()
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Response {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    match booking_service.book_appointment(request, token).await {
        Ok(appointment) => Json(json!(appointment)).into_response(),
        Err(e) => booking_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Response {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    match booking_service.cancel_appointment(&appointment_id, request.reason, token).await {
        Ok(appointment) => Json(json!(appointment)).into_response(),
        Err(e) => booking_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn list_bookable_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PayerSlotQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<PayerSlotListing>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let listing = booking_service
        .list_bookable_slots_for_payer(&query.payer_id, query.date, query.duration_minutes, token)
        .await
        .map_err(|e| match e {
            BookingError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(listing))
}

fn map_practiceq_error(e: PracticeQError) -> AppError {
    match e {
        PracticeQError::NotConfigured => {
            AppError::Internal("PracticeQ integration is not configured".to_string())
        }
        other => AppError::ExternalService(other.to_string()),
    }
}

#[axum::debug_handler]
pub async fn get_practiceq_locations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(_auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let client = PracticeQClient::new(&state).map_err(map_practiceq_error)?;

    let locations = client.get_locations().await.map_err(map_practiceq_error)?;

    Ok(Json(json!({
        "total": locations.len(),
        "locations": locations
    })))
}

#[axum::debug_handler]
pub async fn get_practiceq_services(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(_auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let client = PracticeQClient::new(&state).map_err(map_practiceq_error)?;

    let services = client.get_services().await.map_err(map_practiceq_error)?;

    Ok(Json(json!({
        "total": services.len(),
        "services": services
    })))
}

#[axum::debug_handler]
pub async fn get_practiceq_practitioners(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(_auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let client = PracticeQClient::new(&state).map_err(map_practiceq_error)?;

    let practitioners = client.get_practitioners().await.map_err(map_practiceq_error)?;

    Ok(Json(json!({
        "total": practitioners.len(),
        "practitioners": practitioners
    })))
}
