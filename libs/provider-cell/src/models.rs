use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    Psychiatrist,
    Attending,
    Resident,
    Therapist,
    NursePractitioner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: ProviderRole,
    pub npi: Option<String>,
    pub is_active: bool,
    pub is_bookable: bool,
    pub accepts_new_patients: bool,
    pub offers_telehealth: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// A provider only shows up in booking flows when all three flags hold.
    pub fn is_open_for_booking(&self) -> bool {
        self.is_active && self.is_bookable && self.accepts_new_patients
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionType {
    Unavailable,
    Vacation,
    CustomHours,
    PartialBlock,
    RecurringChange,
}

impl ExceptionType {
    /// Whether the exception wipes out the whole day.
    pub fn suppresses_day(&self) -> bool {
        matches!(self, ExceptionType::Unavailable | ExceptionType::Vacation)
    }

    /// Whether the exception's own window replaces the weekly template.
    pub fn replaces_hours(&self) -> bool {
        matches!(self, ExceptionType::CustomHours | ExceptionType::RecurringChange)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub exception_date: NaiveDate,
    pub exception_type: ExceptionType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal appointment view used only to knock booked times out of
/// generated slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedTime {
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub duration_minutes: i32,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProviderRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: ProviderRole,
    pub npi: Option<String>,
    pub is_bookable: Option<bool>,
    pub accepts_new_patients: Option<bool>,
    pub offers_telehealth: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProviderRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<ProviderRole>,
    pub npi: Option<String>,
    pub is_active: Option<bool>,
    pub is_bookable: Option<bool>,
    pub accepts_new_patients: Option<bool>,
    pub offers_telehealth: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWeeklyAvailabilityRequest {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_recurring: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWeeklyAvailabilityRequest {
    pub day_of_week: Option<i32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_recurring: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExceptionRequest {
    pub exception_date: NaiveDate,
    pub exception_type: ExceptionType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRangeRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_minutes: Option<i32>,
    pub buffer_minutes: Option<i32>,
}

// DTO for the slot listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListResponse {
    pub provider_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub slots: Vec<AvailableSlot>,
    pub total_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSearchFilters {
    pub role: Option<ProviderRole>,
    pub is_active: Option<bool>,
    pub is_bookable: Option<bool>,
    pub accepts_new_patients: Option<bool>,
}

// Error types specific to provider operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProviderError {
    NotFound,
    DuplicateEmail,
    InvalidTimeRange,
    ScheduleConflict,
    ValidationError(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::NotFound => write!(f, "Provider not found"),
            ProviderError::DuplicateEmail => write!(f, "A provider with this email already exists"),
            ProviderError::InvalidTimeRange => write!(f, "Start time must be before end time"),
            ProviderError::ScheduleConflict => write!(f, "Availability conflicts with existing schedule"),
            ProviderError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}
