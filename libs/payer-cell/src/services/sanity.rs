use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use provider_cell::models::{Provider, ProviderRole};

use crate::models::{
    CheckLevel, ContractDiagnostic, ContractStatus, Payer, PayerSanityReport, PayerStatus,
    ProviderPayerContract, ResidentDiagnostic, SanityFinding, SupervisionRelationship,
    SupervisorDiagnostic,
};
use crate::services::bookability::{resolve_bookable_providers, BookabilityService};

/// Run the fixed diagnostic battery for one payer against in-memory rows.
/// Every check is advisory and read-only; the report never mutates state.
pub fn build_payer_report(
    payer: &Payer,
    providers: &[Provider],
    contracts: &[ProviderPayerContract],
    supervisions: &[SupervisionRelationship],
    as_of: NaiveDate,
) -> PayerSanityReport {
    let providers_by_id: HashMap<Uuid, &Provider> =
        providers.iter().map(|p| (p.id, p)).collect();

    let resolution = resolve_bookable_providers(payer, providers, contracts, supervisions, as_of);

    let mut findings: Vec<SanityFinding> = Vec::new();

    // Supervisors carrying active supervisees but no effective contract.
    // Their residents look configured and are silently unbookable.
    let active_supervisions: Vec<&SupervisionRelationship> = supervisions.iter()
        .filter(|s| s.payer_id == payer.id && s.active_on(as_of))
        .collect();

    let mut supervisee_counts: HashMap<Uuid, usize> = HashMap::new();
    for link in &active_supervisions {
        *supervisee_counts.entry(link.supervisor_id).or_insert(0) += 1;
    }

    let mut supervisors_missing_contract: Vec<SupervisorDiagnostic> = supervisee_counts.iter()
        .filter(|(supervisor_id, _)| {
            !contracts.iter().any(|c| {
                c.provider_id == **supervisor_id
                    && c.payer_id == payer.id
                    && c.is_effective_on(as_of)
            })
        })
        .map(|(supervisor_id, count)| SupervisorDiagnostic {
            supervisor_id: *supervisor_id,
            supervisor_name: providers_by_id.get(supervisor_id)
                .map(|p| p.full_name())
                .unwrap_or_else(|| supervisor_id.to_string()),
            active_supervisee_count: *count,
        })
        .collect();
    supervisors_missing_contract.sort_by(|a, b| a.supervisor_name.cmp(&b.supervisor_name));

    if !supervisors_missing_contract.is_empty() {
        findings.push(SanityFinding {
            level: CheckLevel::Error,
            category: "supervisors_missing_contract".to_string(),
            message: format!(
                "{} supervisor(s) have active supervisees but no effective in-network contract",
                supervisors_missing_contract.len()
            ),
            details: json!(supervisors_missing_contract),
        });
    }

    // Residents who are live on the roster but have no supervision link, so
    // they can never appear in the bookable set for this payer.
    let mut residents_without_supervision: Vec<ResidentDiagnostic> = providers.iter()
        .filter(|p| p.role == ProviderRole::Resident && p.is_open_for_booking())
        .filter(|p| !active_supervisions.iter().any(|s| s.supervisee_id == p.id))
        .map(|p| ResidentDiagnostic {
            provider_id: p.id,
            provider_name: p.full_name(),
        })
        .collect();
    residents_without_supervision.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));

    if !residents_without_supervision.is_empty() {
        findings.push(SanityFinding {
            level: CheckLevel::Warning,
            category: "residents_without_supervision".to_string(),
            message: format!(
                "{} active, bookable resident(s) have no active supervision link for this payer",
                residents_without_supervision.len()
            ),
            details: json!(residents_without_supervision),
        });
    }

    if !resolution.blocked_by_flags.is_empty() {
        findings.push(SanityFinding {
            level: CheckLevel::Info,
            category: "blocked_by_flags".to_string(),
            message: format!(
                "{} provider(s) hold a valid contract but are blocked by their own flags",
                resolution.blocked_by_flags.len()
            ),
            details: json!(resolution.blocked_by_flags),
        });
    }

    // Contracts that exist but cannot produce bookings yet: a future
    // effective date, or a bookable_from_date gating a window that already
    // covers today.
    let mut contracts_not_yet_effective: Vec<ContractDiagnostic> = contracts.iter()
        .filter(|c| c.payer_id == payer.id && c.status == ContractStatus::InNetwork)
        .filter(|c| {
            let future_start = matches!(c.effective_date, Some(effective) if effective > as_of);
            let gated = c.covers(as_of) && !c.bookable_on(as_of);
            future_start || gated
        })
        .map(|c| ContractDiagnostic {
            contract_id: c.id,
            provider_id: c.provider_id,
            provider_name: providers_by_id.get(&c.provider_id)
                .map(|p| p.full_name())
                .unwrap_or_else(|| c.provider_id.to_string()),
            effective_date: c.effective_date,
            bookable_from_date: c.bookable_from_date,
        })
        .collect();
    contracts_not_yet_effective.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));

    if !contracts_not_yet_effective.is_empty() {
        findings.push(SanityFinding {
            level: CheckLevel::Info,
            category: "contracts_not_yet_effective".to_string(),
            message: format!(
                "{} in-network contract(s) are not yet effective for booking",
                contracts_not_yet_effective.len()
            ),
            details: json!(contracts_not_yet_effective),
        });
    }

    // Payer-level configuration inconsistencies.
    if payer.requires_attending && !payer.allows_supervised {
        findings.push(SanityFinding {
            level: CheckLevel::Warning,
            category: "payer_config".to_string(),
            message: "Payer requires an attending but does not allow supervised billing; residents cannot be booked".to_string(),
            details: json!({
                "requires_attending": payer.requires_attending,
                "allows_supervised": payer.allows_supervised
            }),
        });
    }
    if payer.effective_date.is_none() {
        findings.push(SanityFinding {
            level: CheckLevel::Warning,
            category: "payer_config".to_string(),
            message: "Payer has no effective date".to_string(),
            details: json!({ "effective_date": null }),
        });
    }
    if payer.status_code != PayerStatus::Approved {
        findings.push(SanityFinding {
            level: CheckLevel::Info,
            category: "payer_config".to_string(),
            message: format!("Payer status is {:?}, not approved", payer.status_code),
            details: json!({ "status_code": payer.status_code }),
        });
    }

    let has_errors = findings.iter().any(|f| f.level == CheckLevel::Error);
    let has_warnings = findings.iter().any(|f| f.level == CheckLevel::Warning);

    PayerSanityReport {
        payer_id: payer.id,
        payer_name: payer.name.clone(),
        as_of,
        findings,
        bookable_today: resolution.bookable,
        supervisors_missing_contract,
        residents_without_supervision,
        blocked_by_flags: resolution.blocked_by_flags,
        contracts_not_yet_effective,
        has_errors,
        has_warnings,
    }
}

pub struct SanityCheckService {
    bookability: BookabilityService,
}

impl SanityCheckService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bookability: BookabilityService::new(config),
        }
    }

    /// Run the battery for one payer. Each fetch failure is logged and
    /// treated as an empty set so the report is best-effort rather than
    /// all-or-nothing; only an unknown payer fails the request.
    pub async fn run_payer_checks(
        &self,
        payer_id: &str,
        as_of: NaiveDate,
        auth_token: &str,
    ) -> Result<PayerSanityReport> {
        debug!("Running sanity checks for payer {} as of {}", payer_id, as_of);

        let payer = self.bookability.get_payer(payer_id, auth_token).await?;

        let providers = match self.bookability.get_providers(auth_token).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Provider fetch failed during sanity check: {}", e);
                Vec::new()
            }
        };

        let contracts = match self.bookability.get_contracts_for_payer(payer_id, auth_token).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Contract fetch failed during sanity check: {}", e);
                Vec::new()
            }
        };

        let supervisions = match self.bookability.get_supervisions_for_payer(payer_id, auth_token).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Supervision fetch failed during sanity check: {}", e);
                Vec::new()
            }
        };

        Ok(build_payer_report(&payer, &providers, &contracts, &supervisions, as_of))
    }
}
