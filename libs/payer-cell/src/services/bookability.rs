use std::collections::HashMap;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use provider_cell::models::Provider;

use crate::models::{
    BlockedProvider, BookableProvider, BookabilityResolution, NetworkStatus, Payer,
    ProviderPayerContract, SupervisionRelationship,
};

/// Enumerate the providers legally bookable under a payer on a service date,
/// classifying each as directly in-network or billing through supervision.
///
/// The inputs are plain rows; everything date-dependent goes through the
/// named predicates on the contract and supervision types so the windowing
/// rules live in exactly one place.
pub fn resolve_bookable_providers(
    payer: &Payer,
    providers: &[Provider],
    contracts: &[ProviderPayerContract],
    supervisions: &[SupervisionRelationship],
    service_date: NaiveDate,
) -> BookabilityResolution {
    let providers_by_id: HashMap<Uuid, &Provider> =
        providers.iter().map(|p| (p.id, p)).collect();

    // Effective contract per provider for this payer on this date.
    let effective_contracts: HashMap<Uuid, &ProviderPayerContract> = contracts.iter()
        .filter(|c| c.payer_id == payer.id && c.is_effective_on(service_date))
        .map(|c| (c.provider_id, c))
        .collect();

    let active_supervisions: Vec<&SupervisionRelationship> = supervisions.iter()
        .filter(|s| s.payer_id == payer.id && s.active_on(service_date))
        .collect();

    let supervisor_ids: Vec<Uuid> = active_supervisions.iter()
        .map(|s| s.supervisor_id)
        .collect();

    let mut bookable: HashMap<Uuid, BookableProvider> = HashMap::new();

    // Direct candidates: a covered provider is bookable in their own right
    // unless the payer requires an attending, in which case only providers
    // who themselves supervise someone qualify directly.
    for provider in providers {
        if !provider.is_open_for_booking() {
            continue;
        }
        let Some(contract) = effective_contracts.get(&provider.id) else {
            continue;
        };
        if payer.requires_attending && !supervisor_ids.contains(&provider.id) {
            continue;
        }

        bookable.insert(provider.id, BookableProvider {
            provider_id: provider.id,
            first_name: provider.first_name.clone(),
            last_name: provider.last_name.clone(),
            network_status: NetworkStatus::InNetwork,
            billing_provider_id: provider.id,
            rendering_provider_id: provider.id,
            supervising_attendings: Vec::new(),
            effective_date: contract.effective_date,
            expiration_date: contract.expiration_date,
            bookable_from_date: contract.bookable_from_date,
        });
    }

    // Supervised candidates: a resident bills under an attending's contract,
    // only where the payer both requires and allows it.
    if payer.supports_supervised_billing() {
        for provider in providers {
            if !provider.is_open_for_booking() {
                continue;
            }
            if bookable.contains_key(&provider.id) {
                // Direct wins over supervised for the same provider.
                continue;
            }

            let mut qualifying: Vec<(&Provider, &ProviderPayerContract)> = active_supervisions.iter()
                .filter(|s| s.supervisee_id == provider.id)
                .filter_map(|s| {
                    let supervisor = providers_by_id.get(&s.supervisor_id)?;
                    let contract = effective_contracts.get(&s.supervisor_id)?;
                    Some((*supervisor, *contract))
                })
                .collect();

            if qualifying.is_empty() {
                continue;
            }

            qualifying.sort_by(|a, b| {
                (&a.0.last_name, &a.0.first_name).cmp(&(&b.0.last_name, &b.0.first_name))
            });

            let supervising_attendings: Vec<String> = qualifying.iter()
                .map(|(supervisor, _)| supervisor.full_name())
                .collect();

            let (billing_supervisor, billing_contract) = qualifying[0];

            bookable.insert(provider.id, BookableProvider {
                provider_id: provider.id,
                first_name: provider.first_name.clone(),
                last_name: provider.last_name.clone(),
                network_status: NetworkStatus::Supervised,
                billing_provider_id: billing_supervisor.id,
                rendering_provider_id: provider.id,
                supervising_attendings,
                effective_date: billing_contract.effective_date,
                expiration_date: billing_contract.expiration_date,
                bookable_from_date: billing_contract.bookable_from_date,
            });
        }
    }

    let mut bookable: Vec<BookableProvider> = bookable.into_values().collect();
    bookable.sort_by(|a, b| {
        (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
    });

    // Contractually covered providers excluded by their own flags are a
    // configuration problem, not a silent drop.
    let mut blocked_by_flags: Vec<BlockedProvider> = providers.iter()
        .filter(|p| !p.is_open_for_booking())
        .filter(|p| effective_contracts.contains_key(&p.id))
        .map(|p| BlockedProvider {
            provider_id: p.id,
            provider_name: p.full_name(),
            is_active: p.is_active,
            is_bookable: p.is_bookable,
            accepts_new_patients: p.accepts_new_patients,
        })
        .collect();
    blocked_by_flags.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));

    BookabilityResolution { bookable, blocked_by_flags }
}

pub struct BookabilityService {
    supabase: SupabaseClient,
}

impl BookabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_payer(&self, payer_id: &str, auth_token: &str) -> Result<Payer> {
        let path = format!("/rest/v1/payers?id=eq.{}", payer_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Payer not found"));
        }

        let payer: Payer = serde_json::from_value(result[0].clone())?;
        Ok(payer)
    }

    pub async fn get_providers(&self, auth_token: &str) -> Result<Vec<Provider>> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            "/rest/v1/providers?order=last_name.asc,first_name.asc",
            Some(auth_token),
            None,
        ).await?;

        let providers: Vec<Provider> = result.into_iter()
            .map(|p| serde_json::from_value(p))
            .collect::<std::result::Result<Vec<Provider>, _>>()?;

        Ok(providers)
    }

    pub async fn get_contracts_for_payer(
        &self,
        payer_id: &str,
        auth_token: &str,
    ) -> Result<Vec<ProviderPayerContract>> {
        let path = format!("/rest/v1/provider_payer_contracts?payer_id=eq.{}", payer_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let contracts: Vec<ProviderPayerContract> = result.into_iter()
            .map(|c| serde_json::from_value(c))
            .collect::<std::result::Result<Vec<ProviderPayerContract>, _>>()?;

        Ok(contracts)
    }

    pub async fn get_supervisions_for_payer(
        &self,
        payer_id: &str,
        auth_token: &str,
    ) -> Result<Vec<SupervisionRelationship>> {
        let path = format!("/rest/v1/supervision_relationships?payer_id=eq.{}", payer_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let supervisions: Vec<SupervisionRelationship> = result.into_iter()
            .map(|s| serde_json::from_value(s))
            .collect::<std::result::Result<Vec<SupervisionRelationship>, _>>()?;

        Ok(supervisions)
    }

    /// Resolve the full bookable set for a payer on a service date.
    pub async fn resolve_for_payer(
        &self,
        payer_id: &str,
        service_date: NaiveDate,
        auth_token: &str,
    ) -> Result<(Payer, BookabilityResolution)> {
        debug!("Resolving bookable providers for payer {} on {}", payer_id, service_date);

        let payer = self.get_payer(payer_id, auth_token).await?;
        let providers = self.get_providers(auth_token).await?;
        let contracts = self.get_contracts_for_payer(payer_id, auth_token).await?;
        let supervisions = self.get_supervisions_for_payer(payer_id, auth_token).await?;

        let resolution = resolve_bookable_providers(
            &payer, &providers, &contracts, &supervisions, service_date,
        );

        debug!(
            "Payer {}: {} bookable, {} blocked by flags",
            payer.name,
            resolution.bookable.len(),
            resolution.blocked_by_flags.len()
        );

        Ok((payer, resolution))
    }
}
