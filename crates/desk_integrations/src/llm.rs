//! LLM adapter for ticket classification.
//!
//! Supports OpenAI and Anthropic APIs, selected via environment variables.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use desk_agents::{AgentRole, Complexity, TicketPriority, MAX_CONFIDENCE};
use desk_core::{AiTextGenerationService, IntegrationError, IntegrationResult, TicketAnalysis, Urgency};

pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ANTHROPIC_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_MODEL: &str = "DESKFLOW_LLM_MODEL";

/// Attempts per request, transient failures only.
const MAX_RETRIES: u32 = 3;

const SYSTEM_PROMPT: &str = "You classify customer support tickets. \
Reply with a single JSON object and nothing else, using these keys: \
\"category\" (short string), \
\"urgency\" (one of low, medium, high, critical), \
\"priority\" (one of low, normal, high, urgent), \
\"recommended_role\" (one of coordinator, implementer, infra, tester, analyst, platform_specialist), \
\"action_items\" (array of short strings), \
\"confidence_score\" (integer 0-100).";

/// LLM provider type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    fn service(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        let default_model = match provider {
            LlmProvider::OpenAI => "gpt-4o-mini".to_string(),
            LlmProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
        };

        Self {
            provider,
            api_key,
            model: model.unwrap_or(default_model),
            client: reqwest::Client::new(),
        }
    }

    /// Create an LLM adapter from environment variables
    ///
    /// Checks in order:
    /// 1. OPENAI_API_KEY
    /// 2. ANTHROPIC_API_KEY
    pub fn from_env() -> IntegrationResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IntegrationResult<Self> {
        let custom_model = lookup(ENV_MODEL).filter(|m| !m.is_empty());

        if let Some(api_key) = lookup(ENV_OPENAI_KEY).filter(|k| !k.is_empty()) {
            return Ok(Self::new(LlmProvider::OpenAI, api_key, custom_model));
        }
        if let Some(api_key) = lookup(ENV_ANTHROPIC_KEY).filter(|k| !k.is_empty()) {
            return Ok(Self::new(LlmProvider::Anthropic, api_key, custom_model));
        }

        Err(IntegrationError::NotConfigured("LLM provider".to_string()))
    }

    /// Get the current provider
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn completion.
    pub async fn complete(&self, system: &str, user: &str) -> IntegrationResult<String> {
        match self.provider {
            LlmProvider::OpenAI => self.complete_openai(system, user).await,
            LlmProvider::Anthropic => self.complete_anthropic(system, user).await,
        }
    }

    async fn complete_openai(&self, system: &str, user: &str) -> IntegrationResult<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", user),
            ],
            max_completion_tokens: Some(1024),
        };

        let response = self
            .send_with_retry(|| {
                self.client
                    .post("https://api.openai.com/v1/chat/completions")
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .json(&request)
            })
            .await?;

        let result: OpenAIResponse = response.json().await.map_err(|e| {
            IntegrationError::invalid_response("openai", format!("Failed to parse response: {}", e))
        })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| IntegrationError::invalid_response("openai", "No choices returned"))
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> IntegrationResult<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            system: Some(system.to_string()),
            messages: vec![ChatMessage::new("user", user)],
        };

        let response = self
            .send_with_retry(|| {
                self.client
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&request)
            })
            .await?;

        let result: AnthropicResponse = response.json().await.map_err(|e| {
            IntegrationError::invalid_response("anthropic", format!("Failed to parse response: {}", e))
        })?;

        result
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| IntegrationError::invalid_response("anthropic", "Empty content"))
    }

    /// Send a request, retrying network errors, 5xx and 429 with backoff.
    async fn send_with_retry<F>(&self, build: F) -> IntegrationResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let service = self.provider.service();
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 2s, 4s
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
            }

            let response = match build().send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("{} request failed (attempt {}/{}): {}", service, attempt + 1, MAX_RETRIES, e);
                    last_error = Some(IntegrationError::request(service, format!("Network error: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                warn!("{} returned {} (attempt {}/{})", service, status, attempt + 1, MAX_RETRIES);
                last_error = Some(IntegrationError::request(service, format!("{}: {}", status, body)));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(IntegrationError::rejected(service, format!("{}: {}", status, body)));
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| IntegrationError::request(service, "Max retries exceeded")))
    }
}

#[async_trait]
impl AiTextGenerationService for LlmAdapter {
    async fn analyze_ticket(&self, ticket_text: &str) -> IntegrationResult<TicketAnalysis> {
        debug!("Classifying ticket with {} ({})", self.provider.service(), self.model);
        let content = self.complete(SYSTEM_PROMPT, ticket_text).await?;
        parse_analysis(&content)
            .ok_or_else(|| IntegrationError::invalid_response(self.provider.service(), "No JSON object in reply"))
    }
}

fn json_object_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").ok())
        .as_ref()
}

/// Extract a [`TicketAnalysis`] from a model reply.
///
/// The reply may wrap the JSON in prose or code fences. Fields with
/// unexpected types or values are dropped rather than failing the parse.
pub fn parse_analysis(content: &str) -> Option<TicketAnalysis> {
    let json = json_object_pattern()?.find(content)?.as_str();
    let value: Value = serde_json::from_str(json).ok()?;
    let object = value.as_object()?;

    let string = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    };

    Some(TicketAnalysis {
        category: string("category"),
        urgency: string("urgency").and_then(|s| enum_from_str::<Urgency>(&s)),
        priority: string("priority").and_then(|s| enum_from_str::<TicketPriority>(&s)),
        recommended_role: string("recommended_role").and_then(|s| s.parse::<AgentRole>().ok()),
        action_items: object
            .get("action_items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        confidence_score: object
            .get("confidence_score")
            .and_then(Value::as_f64)
            .map(|c| c.round().clamp(0.0, MAX_CONFIDENCE as f64) as u8),
        complexity: string("complexity").and_then(|s| enum_from_str::<Complexity>(&s)),
        estimated_resolution_hours: None,
        business_impact: None,
    })
}

fn enum_from_str<T: for<'de> Deserialize<'de>>(value: &str) -> Option<T> {
    serde_json::from_value(Value::String(value.to_string())).ok()
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}
