use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Payer, CreatePayerRequest, UpdatePayerRequest,
    ProviderPayerContract, CreateContractRequest, UpdateContractRequest,
    SupervisionRelationship, CreateSupervisionRequest,
};

pub struct PayerService {
    supabase: SupabaseClient,
}

impl PayerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_payer(
        &self,
        request: CreatePayerRequest,
        auth_token: &str,
    ) -> Result<Payer> {
        debug!("Creating payer: {}", request.name);

        let existing_path = format!("/rest/v1/payers?name=eq.{}", request.name);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            return Err(anyhow!("Payer with name {} already exists", request.name));
        }

        let payer_data = json!({
            "name": request.name,
            "payer_type": request.payer_type,
            "state": request.state,
            "status_code": request.status_code.unwrap_or(crate::models::PayerStatus::NotStarted),
            "effective_date": request.effective_date,
            "requires_attending": request.requires_attending.unwrap_or(false),
            "allows_supervised": request.allows_supervised.unwrap_or(false),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/payers",
            Some(auth_token),
            Some(payer_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create payer"));
        }

        let payer: Payer = serde_json::from_value(result[0].clone())?;
        debug!("Payer created with ID: {}", payer.id);

        Ok(payer)
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

    pub async fn list_payers(&self, auth_token: &str) -> Result<Vec<Payer>> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            "/rest/v1/payers?order=name.asc",
            Some(auth_token),
            None,
        ).await?;

        let payers: Vec<Payer> = result.into_iter()
            .map(|p| serde_json::from_value(p))
            .collect::<std::result::Result<Vec<Payer>, _>>()?;

        Ok(payers)
    }

    pub async fn update_payer(
        &self,
        payer_id: &str,
        request: UpdatePayerRequest,
        auth_token: &str,
    ) -> Result<Payer> {
        debug!("Updating payer: {}", payer_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(payer_type) = request.payer_type {
            update_data.insert("payer_type".to_string(), json!(payer_type));
        }
        if let Some(state) = request.state {
            update_data.insert("state".to_string(), json!(state));
        }
        if let Some(status_code) = request.status_code {
            update_data.insert("status_code".to_string(), json!(status_code));
        }
        if let Some(effective_date) = request.effective_date {
            update_data.insert("effective_date".to_string(), json!(effective_date));
        }
        if let Some(requires_attending) = request.requires_attending {
            update_data.insert("requires_attending".to_string(), json!(requires_attending));
        }
        if let Some(allows_supervised) = request.allows_supervised {
            update_data.insert("allows_supervised".to_string(), json!(allows_supervised));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/payers?id=eq.{}", payer_id);
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
            return Err(anyhow!("Failed to update payer"));
        }

        let updated: Payer = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    // Contract management

    pub async fn create_contract(
        &self,
        payer_id: &str,
        request: CreateContractRequest,
        auth_token: &str,
    ) -> Result<ProviderPayerContract> {
        debug!("Creating contract for provider {} under payer {}", request.provider_id, payer_id);

        let contract_data = json!({
            "provider_id": request.provider_id,
            "payer_id": payer_id,
            "status": request.status.unwrap_or(crate::models::ContractStatus::Pending),
            "effective_date": request.effective_date,
            "expiration_date": request.expiration_date,
            "bookable_from_date": request.bookable_from_date,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/provider_payer_contracts",
            Some(auth_token),
            Some(contract_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create contract"));
        }

        let contract: ProviderPayerContract = serde_json::from_value(result[0].clone())?;
        Ok(contract)
    }

    pub async fn update_contract(
        &self,
        contract_id: &str,
        request: UpdateContractRequest,
        auth_token: &str,
    ) -> Result<ProviderPayerContract> {
        debug!("Updating contract: {}", contract_id);

        let mut update_data = serde_json::Map::new();

        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(effective_date) = request.effective_date {
            update_data.insert("effective_date".to_string(), json!(effective_date));
        }
        if let Some(expiration_date) = request.expiration_date {
            update_data.insert("expiration_date".to_string(), json!(expiration_date));
        }
        if let Some(bookable_from_date) = request.bookable_from_date {
            update_data.insert("bookable_from_date".to_string(), json!(bookable_from_date));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/provider_payer_contracts?id=eq.{}", contract_id);
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
            return Err(anyhow!("Failed to update contract"));
        }

        let updated: ProviderPayerContract = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    pub async fn list_contracts(
        &self,
        payer_id: &str,
        auth_token: &str,
    ) -> Result<Vec<ProviderPayerContract>> {
        let path = format!("/rest/v1/provider_payer_contracts?payer_id=eq.{}&order=created_at.asc", payer_id);
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

    // Supervision management

    pub async fn create_supervision(
        &self,
        payer_id: &str,
        request: CreateSupervisionRequest,
        auth_token: &str,
    ) -> Result<SupervisionRelationship> {
        debug!(
            "Creating supervision link {} -> {} for payer {}",
            request.supervisor_id, request.supervisee_id, payer_id
        );

        if request.supervisor_id == request.supervisee_id {
            return Err(anyhow!("A provider cannot supervise themselves"));
        }

        let supervision_data = json!({
            "supervisor_id": request.supervisor_id,
            "supervisee_id": request.supervisee_id,
            "payer_id": payer_id,
            "is_active": true,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/supervision_relationships",
            Some(auth_token),
            Some(supervision_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create supervision relationship"));
        }

        let supervision: SupervisionRelationship = serde_json::from_value(result[0].clone())?;
        Ok(supervision)
    }

    pub async fn end_supervision(
        &self,
        supervision_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Deactivating supervision link: {}", supervision_id);

        let path = format!("/rest/v1/supervision_relationships?id=eq.{}", supervision_id);
        let update = json!({ "is_active": false });

        self.supabase.execute(Method::PATCH, &path, Some(auth_token), Some(update)).await?;

        Ok(())
    }

    pub async fn list_supervisions(
        &self,
        payer_id: &str,
        auth_token: &str,
    ) -> Result<Vec<SupervisionRelationship>> {
        let path = format!("/rest/v1/supervision_relationships?payer_id=eq.{}&order=created_at.asc", payer_id);
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
}
