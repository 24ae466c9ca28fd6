use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime};

use payer_cell::models::BookableProvider;
use provider_cell::models::AvailableSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub payer_id: Uuid,
    pub billing_provider_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub payer_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub timezone: Option<String>,
    pub notes: Option<String>,
    // Accepted for forward compatibility with retry-safe booking; nothing
    // reads it yet.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking request failed validation")]
    Validation(Vec<FieldError>),

    #[error("Provider is not bookable for this payer on the requested date")]
    ProviderNotBookable,

    #[error("Requested time is not an open slot for this provider")]
    SlotUnavailable,

    #[error("Patient has no active policy for this payer")]
    NoActivePolicy,

    #[error("Payer has no intake instance configured")]
    NoIntakeInstance,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl BookingError {
    /// Stable error codes surfaced to API callers alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "VALIDATION_FAILED",
            BookingError::ProviderNotBookable => "PROVIDER_NOT_BOOKABLE",
            BookingError::SlotUnavailable => "SLOT_UNAVAILABLE",
            BookingError::NoActivePolicy => "NO_ACTIVE_POLICY",
            BookingError::NoIntakeInstance => "NO_INTAKE_INSTANCE_FOR_PAYER",
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::Upstream(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSlots {
    pub provider: BookableProvider,
    pub slots: Vec<AvailableSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayerSlotListing {
    pub payer_id: Uuid,
    pub date: NaiveDate,
    pub providers: Vec<ProviderSlots>,
    pub total_slots: usize,
}

// PracticeQ API shapes (external practice-management system)

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQLocation {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQService {
    pub id: String,
    pub name: String,
    pub duration_minutes: Option<i32>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQPractitioner {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum PracticeQError {
    #[error("PracticeQ integration is not configured")]
    NotConfigured,

    #[error("PracticeQ API error: {message}")]
    ApiError { message: String },

    #[error("Failed to parse PracticeQ response: {0}")]
    ParseError(String),
}
