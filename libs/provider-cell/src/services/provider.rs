use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::csv;

use crate::models::{
    Provider, CreateProviderRequest, UpdateProviderRequest, ProviderSearchFilters,
};

pub struct ProviderService {
    supabase: SupabaseClient,
}

impl ProviderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_provider(
        &self,
        request: CreateProviderRequest,
        auth_token: &str,
    ) -> Result<Provider> {
        debug!("Creating provider profile for: {}", request.email);

        // Check if a provider with this email already exists
        let existing_path = format!("/rest/v1/providers?email=eq.{}", request.email);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            return Err(anyhow!("Provider with email {} already exists", request.email));
        }

        let provider_data = json!({
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "role": request.role,
            "npi": request.npi,
            "is_active": true,
            "is_bookable": request.is_bookable.unwrap_or(false),
            "accepts_new_patients": request.accepts_new_patients.unwrap_or(false),
            "offers_telehealth": request.offers_telehealth.unwrap_or(true),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/providers",
            Some(auth_token),
            Some(provider_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create provider"));
        }

        let provider: Provider = serde_json::from_value(result[0].clone())?;
        debug!("Provider created with ID: {}", provider.id);

        Ok(provider)
    }

    pub async fn get_provider(
        &self,
        provider_id: &str,
        auth_token: &str,
    ) -> Result<Provider> {
        debug!("Fetching provider: {}", provider_id);

        let path = format!("/rest/v1/providers?id=eq.{}", provider_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Provider not found"));
        }

        let provider: Provider = serde_json::from_value(result[0].clone())?;
        Ok(provider)
    }

    pub async fn update_provider(
        &self,
        provider_id: &str,
        request: UpdateProviderRequest,
        auth_token: &str,
    ) -> Result<Provider> {
        debug!("Updating provider: {}", provider_id);

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(role) = request.role {
            update_data.insert("role".to_string(), json!(role));
        }
        if let Some(npi) = request.npi {
            update_data.insert("npi".to_string(), json!(npi));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }
        if let Some(is_bookable) = request.is_bookable {
            update_data.insert("is_bookable".to_string(), json!(is_bookable));
        }
        if let Some(accepts) = request.accepts_new_patients {
            update_data.insert("accepts_new_patients".to_string(), json!(accepts));
        }
        if let Some(telehealth) = request.offers_telehealth {
            update_data.insert("offers_telehealth".to_string(), json!(telehealth));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/providers?id=eq.{}", provider_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update provider"));
        }

        let updated: Provider = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    pub async fn search_providers(
        &self,
        filters: ProviderSearchFilters,
        auth_token: &str,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Provider>> {
        let mut path = "/rest/v1/providers?order=last_name.asc,first_name.asc".to_string();

        if let Some(role) = filters.role {
            path.push_str(&format!("&role=eq.{}", json!(role).as_str().unwrap_or_default()));
        }
        if let Some(is_active) = filters.is_active {
            path.push_str(&format!("&is_active=eq.{}", is_active));
        }
        if let Some(is_bookable) = filters.is_bookable {
            path.push_str(&format!("&is_bookable=eq.{}", is_bookable));
        }
        if let Some(accepts) = filters.accepts_new_patients {
            path.push_str(&format!("&accepts_new_patients=eq.{}", accepts));
        }
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }
        if let Some(offset) = offset {
            path.push_str(&format!("&offset={}", offset));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let providers: Vec<Provider> = result.into_iter()
            .map(|p| serde_json::from_value(p))
            .collect::<std::result::Result<Vec<Provider>, _>>()?;

        Ok(providers)
    }

    /// Roster export for the credentialing spreadsheet crowd.
    pub async fn export_providers_csv(&self, auth_token: &str) -> Result<String> {
        let providers = self.search_providers(
            ProviderSearchFilters {
                role: None,
                is_active: None,
                is_bookable: None,
                accepts_new_patients: None,
            },
            auth_token,
            None,
            None,
        ).await?;

        let header = [
            "last_name", "first_name", "email", "role", "npi",
            "is_active", "is_bookable", "accepts_new_patients", "offers_telehealth",
        ];

        let rows: Vec<Vec<String>> = providers.iter().map(|p| {
            vec![
                p.last_name.clone(),
                p.first_name.clone(),
                p.email.clone(),
                json!(p.role).as_str().unwrap_or_default().to_string(),
                p.npi.clone().unwrap_or_default(),
                p.is_active.to_string(),
                p.is_bookable.to_string(),
                p.accepts_new_patients.to_string(),
                p.offers_telehealth.to_string(),
            ]
        }).collect();

        Ok(csv::write_document(&header, &rows))
    }
}
