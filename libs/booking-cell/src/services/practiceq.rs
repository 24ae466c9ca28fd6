use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{
    PracticeQError, PracticeQLocation, PracticeQPractitioner, PracticeQService,
};

/// What the booking flow needs from the practice-management system. The
/// trait is the seam for swapping the live client out in tests.
#[async_trait]
pub trait PracticeDirectory {
    async fn get_locations(&self) -> Result<Vec<PracticeQLocation>, PracticeQError>;
    async fn get_services(&self) -> Result<Vec<PracticeQService>, PracticeQError>;
    async fn get_practitioners(&self) -> Result<Vec<PracticeQPractitioner>, PracticeQError>;
}

/// PracticeQ (IntakeQ) API client. Auth is a static `X-Auth-Key` header.
pub struct PracticeQClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PracticeQClient {
    pub fn new(config: &AppConfig) -> Result<Self, PracticeQError> {
        if !config.is_practiceq_configured() {
            return Err(PracticeQError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.practiceq_api_key.clone(),
            base_url: config.practiceq_base_url.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, PracticeQError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PracticeQ request: {}", url);

        let response = self.client
            .get(&url)
            .header("X-Auth-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| PracticeQError::ApiError { message: e.to_string() })?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| PracticeQError::ApiError { message: e.to_string() })?;

        if !status.is_success() {
            error!("PracticeQ API error: {} - {}", status, response_text);
            return Err(PracticeQError::ApiError {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        serde_json::from_str(&response_text)
            .map_err(|e| PracticeQError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl PracticeDirectory for PracticeQClient {
    async fn get_locations(&self) -> Result<Vec<PracticeQLocation>, PracticeQError> {
        info!("Fetching PracticeQ locations");
        self.get_json("/locations").await
    }

    async fn get_services(&self) -> Result<Vec<PracticeQService>, PracticeQError> {
        info!("Fetching PracticeQ services");
        self.get_json("/services").await
    }

    async fn get_practitioners(&self) -> Result<Vec<PracticeQPractitioner>, PracticeQError> {
        info!("Fetching PracticeQ practitioners");
        self.get_json("/practitioners").await
    }
}
