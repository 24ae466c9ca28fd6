use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    Active,
    Unresponsive,
    Discharged,
    Transferred,
    Inactive,
    Deceased,
}

impl Default for EngagementStatus {
    /// A patient without a status row is implicitly active.
    fn default() -> Self {
        EngagementStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementStatusRecord {
    pub patient_id: Uuid,
    pub status: EngagementStatus,
    pub changed_by_email: String,
    pub change_reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEngagementStatusRequest {
    pub status: EngagementStatus,
    pub changed_by_email: String,
    pub change_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementStatusResponse {
    pub patient_id: Uuid,
    pub status: EngagementStatus,
    pub previous_status: EngagementStatus,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Roster row as the list views consume it, with the current engagement
/// status folded in by the materialized view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub engagement_status: EngagementStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub total: usize,
    pub patients: Vec<RosterEntry>,
}

// Error types specific to patient operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PatientError {
    NotFound,
    DuplicateEmail,
    MissingChangeReason,
    RosterTimeout,
    ValidationError(String),
}

impl std::fmt::Display for PatientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatientError::NotFound => write!(f, "Patient not found"),
            PatientError::DuplicateEmail => write!(f, "A patient with this email already exists"),
            PatientError::MissingChangeReason => {
                write!(f, "A change reason is required when moving a patient out of active status")
            }
            PatientError::RosterTimeout => write!(f, "Patient roster fetch timed out"),
            PatientError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for PatientError {}
