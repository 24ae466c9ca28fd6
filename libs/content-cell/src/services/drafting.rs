use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{ArticleDraft, ContentError, DraftConversationRequest, DraftRole};

const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DRAFTING_MODEL: &str = "claude-opus-5";
const MAX_TOKENS: u32 = 4096;
const DRAFT_TOOL_NAME: &str = "save_article_draft";

const DRAFTING_SYSTEM_PROMPT: &str = "You are a clinical content editor for a psychiatry \
practice's patient-education blog. Work with the author through the conversation, then save \
the current state of the article. Write at a general reading level, avoid diagnostic claims, \
and never include patient-identifying details. Slugs are lowercase kebab-case.";

/// Chat-style article drafting against the Anthropic Messages API. The model
/// is forced onto a single tool whose input schema is the draft shape, so
/// the reply is parsed structurally instead of fishing JSON out of prose.
pub struct ArticleDraftingService {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl ArticleDraftingService {
    pub fn new(config: &AppConfig) -> Result<Self, ContentError> {
        Self::with_base_url(config, DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(config: &AppConfig, base_url: &str) -> Result<Self, ContentError> {
        if !config.is_content_drafting_configured() {
            return Err(ContentError::NotConfigured);
        }

        Ok(Self {
            http_client: Client::new(),
            api_key: config.anthropic_api_key.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn draft_article(
        &self,
        request: &DraftConversationRequest,
    ) -> Result<ArticleDraft, ContentError> {
        if request.messages.is_empty() {
            return Err(ContentError::EmptyConversation);
        }

        let messages: Vec<Value> = request.messages.iter()
            .map(|m| json!({
                "role": match m.role {
                    DraftRole::User => "user",
                    DraftRole::Assistant => "assistant",
                },
                "content": m.content,
            }))
            .collect();

        let body = json!({
            "model": DRAFTING_MODEL,
            "max_tokens": MAX_TOKENS,
            "system": DRAFTING_SYSTEM_PROMPT,
            "messages": messages,
            "tools": [draft_tool_definition()],
            "tool_choice": { "type": "tool", "name": DRAFT_TOOL_NAME }
        });

        debug!("Requesting article draft ({} conversation messages)", request.messages.len());

        let response = self.http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentError::ApiError { message: e.to_string() })?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| ContentError::ApiError { message: e.to_string() })?;

        if !status.is_success() {
            error!("Drafting API error ({}): {}", status, response_text);
            return Err(ContentError::ApiError {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| ContentError::MalformedResponse(e.to_string()))?;

        extract_draft(&response_json)
    }
}

fn draft_tool_definition() -> Value {
    json!({
        "name": DRAFT_TOOL_NAME,
        "description": "Save the current state of the article draft being worked on in this conversation.",
        "input_schema": {
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Article title" },
                "slug": { "type": "string", "description": "URL slug, lowercase kebab-case" },
                "excerpt": { "type": "string", "description": "One-to-two sentence summary for listing pages" },
                "body_markdown": { "type": "string", "description": "Full article body in Markdown" },
                "category": { "type": "string", "description": "Single blog category" },
                "tags": { "type": "array", "items": { "type": "string" }, "description": "Topic tags" }
            },
            "required": ["title", "slug", "excerpt", "body_markdown", "category", "tags"]
        }
    })
}

/// Pull the forced tool call out of a Messages API response. The contract is
/// structural: the draft is the `input` of the `save_article_draft` tool_use
/// block, never free text.
pub fn extract_draft(response: &Value) -> Result<ArticleDraft, ContentError> {
    if response["stop_reason"].as_str() == Some("refusal") {
        return Err(ContentError::MalformedResponse(
            "model declined to produce a draft".to_string(),
        ));
    }

    let blocks = response["content"].as_array()
        .ok_or_else(|| ContentError::MalformedResponse("missing content array".to_string()))?;

    let tool_use = blocks.iter()
        .find(|block| {
            block["type"].as_str() == Some("tool_use")
                && block["name"].as_str() == Some(DRAFT_TOOL_NAME)
        })
        .ok_or_else(|| ContentError::MalformedResponse(
            format!("no {} tool_use block in response", DRAFT_TOOL_NAME),
        ))?;

    serde_json::from_value(tool_use["input"].clone())
        .map_err(|e| ContentError::MalformedResponse(e.to_string()))
}
