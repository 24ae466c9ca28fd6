use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayerStatus {
    Approved,
    Pending,
    Denied,
    NotStarted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payer {
    pub id: Uuid,
    pub name: String,
    pub payer_type: Option<String>,
    pub state: Option<String>,
    pub status_code: PayerStatus,
    pub effective_date: Option<NaiveDate>,
    pub requires_attending: bool,
    pub allows_supervised: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payer {
    /// Supervised billing is only a legal path when the payer both demands
    /// an attending and permits residents to bill under one.
    pub fn supports_supervised_billing(&self) -> bool {
        self.requires_attending && self.allows_supervised
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    InNetwork,
    Pending,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPayerContract {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub payer_id: Uuid,
    pub status: ContractStatus,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub bookable_from_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderPayerContract {
    /// The effective window is inclusive at both ends. A contract with no
    /// effective date has not started.
    pub fn covers(&self, service_date: NaiveDate) -> bool {
        let started = match self.effective_date {
            Some(effective) => service_date >= effective,
            None => false,
        };
        let not_expired = match self.expiration_date {
            Some(expiration) => service_date <= expiration,
            None => true,
        };
        started && not_expired
    }

    /// `bookable_from_date` delays booking past the credentialing effective
    /// date; when unset the effective window alone governs.
    pub fn bookable_on(&self, service_date: NaiveDate) -> bool {
        match self.bookable_from_date {
            Some(from) => service_date >= from,
            None => true,
        }
    }

    pub fn is_effective_on(&self, service_date: NaiveDate) -> bool {
        self.status == ContractStatus::InNetwork
            && self.covers(service_date)
            && self.bookable_on(service_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisionRelationship {
    pub id: Uuid,
    pub supervisor_id: Uuid,
    pub supervisee_id: Uuid,
    pub payer_id: Uuid,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl SupervisionRelationship {
    pub fn active_on(&self, service_date: NaiveDate) -> bool {
        if !self.is_active {
            return false;
        }
        let started = match self.start_date {
            Some(start) => service_date >= start,
            None => true,
        };
        let not_ended = match self.end_date {
            Some(end) => service_date <= end,
            None => true,
        };
        started && not_ended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    InNetwork,
    Supervised,
}

/// One row of the "who can be booked under this payer" answer, including the
/// legal billing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookableProvider {
    pub provider_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub network_status: NetworkStatus,
    pub billing_provider_id: Uuid,
    pub rendering_provider_id: Uuid,
    pub supervising_attendings: Vec<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub bookable_from_date: Option<NaiveDate>,
}

impl BookableProvider {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Contractually covered but excluded by the provider's own flags. Surfaced
/// as a diagnostic instead of being silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedProvider {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub is_active: bool,
    pub is_bookable: bool,
    pub accepts_new_patients: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookabilityResolution {
    pub bookable: Vec<BookableProvider>,
    pub blocked_by_flags: Vec<BlockedProvider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookableProvidersResponse {
    pub payer_id: Uuid,
    pub service_date: NaiveDate,
    pub total: usize,
    pub providers: Vec<BookableProvider>,
    pub blocked_by_flags: Vec<BlockedProvider>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckLevel {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanityFinding {
    pub level: CheckLevel,
    pub category: String,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDiagnostic {
    pub contract_id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub effective_date: Option<NaiveDate>,
    pub bookable_from_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorDiagnostic {
    pub supervisor_id: Uuid,
    pub supervisor_name: String,
    pub active_supervisee_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentDiagnostic {
    pub provider_id: Uuid,
    pub provider_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayerSanityReport {
    pub payer_id: Uuid,
    pub payer_name: String,
    pub as_of: NaiveDate,
    pub findings: Vec<SanityFinding>,
    pub bookable_today: Vec<BookableProvider>,
    pub supervisors_missing_contract: Vec<SupervisorDiagnostic>,
    pub residents_without_supervision: Vec<ResidentDiagnostic>,
    pub blocked_by_flags: Vec<BlockedProvider>,
    pub contracts_not_yet_effective: Vec<ContractDiagnostic>,
    pub has_errors: bool,
    pub has_warnings: bool,
}

impl PayerSanityReport {
    /// Plain-text rendering for humans reading the report in a terminal or
    /// a pasted Slack message.
    pub fn render_text_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Payer sanity check: {} (as of {})\n",
            self.payer_name, self.as_of
        ));
        out.push_str(&format!(
            "Bookable providers today: {}\n",
            self.bookable_today.len()
        ));

        if self.findings.is_empty() {
            out.push_str("No findings.\n");
            return out;
        }

        for finding in &self.findings {
            let label = match finding.level {
                CheckLevel::Error => "ERROR",
                CheckLevel::Warning => "WARN",
                CheckLevel::Info => "INFO",
            };
            out.push_str(&format!("[{}] {}: {}\n", label, finding.category, finding.message));
        }

        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayerRequest {
    pub name: String,
    pub payer_type: Option<String>,
    pub state: Option<String>,
    pub status_code: Option<PayerStatus>,
    pub effective_date: Option<NaiveDate>,
    pub requires_attending: Option<bool>,
    pub allows_supervised: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePayerRequest {
    pub name: Option<String>,
    pub payer_type: Option<String>,
    pub state: Option<String>,
    pub status_code: Option<PayerStatus>,
    pub effective_date: Option<NaiveDate>,
    pub requires_attending: Option<bool>,
    pub allows_supervised: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContractRequest {
    pub provider_id: Uuid,
    pub status: Option<ContractStatus>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub bookable_from_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContractRequest {
    pub status: Option<ContractStatus>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub bookable_from_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSupervisionRequest {
    pub supervisor_id: Uuid,
    pub supervisee_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// Error types specific to payer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PayerError {
    NotFound,
    DuplicateName,
    SelfSupervision,
    ValidationError(String),
}

impl std::fmt::Display for PayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayerError::NotFound => write!(f, "Payer not found"),
            PayerError::DuplicateName => write!(f, "A payer with this name already exists"),
            PayerError::SelfSupervision => write!(f, "A provider cannot supervise themselves"),
            PayerError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for PayerError {}
