//! Slack Web API messenger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use desk_core::{IntegrationError, IntegrationResult, MessageReceipt, MessagingService};

pub const ENV_SLACK_TOKEN: &str = "SLACK_BOT_TOKEN";

const DEFAULT_BASE_URL: &str = "https://slack.com/api";
const SERVICE: &str = "slack";

/// Posts messages with `chat.postMessage`.
pub struct SlackMessenger {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl SlackMessenger {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Read the bot token from `SLACK_BOT_TOKEN`.
    pub fn from_env() -> IntegrationResult<Self> {
        std::env::var(ENV_SLACK_TOKEN)
            .ok()
            .filter(|t| !t.is_empty())
            .map(Self::new)
            .ok_or_else(|| IntegrationError::NotConfigured(ENV_SLACK_TOKEN.to_string()))
    }

    /// Point at another API root, e.g. a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

impl PostMessageResponse {
    fn into_receipt(self, requested_channel: &str) -> IntegrationResult<MessageReceipt> {
        if !self.ok {
            return Err(IntegrationError::rejected(
                SERVICE,
                self.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(MessageReceipt {
            channel: self.channel.unwrap_or_else(|| requested_channel.to_string()),
            message_ts: self.ts,
        })
    }
}

#[async_trait]
impl MessagingService for SlackMessenger {
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<String>,
    ) -> IntegrationResult<MessageReceipt> {
        let request = PostMessageRequest {
            channel,
            text,
            thread_ts,
        };

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntegrationError::request(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntegrationError::request(SERVICE, format!("HTTP {}", status)));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| IntegrationError::invalid_response(SERVICE, e.to_string()))?;

        let receipt = body.into_receipt(channel)?;
        debug!("Posted to {} (ts={:?})", receipt.channel, receipt.message_ts);
        Ok(receipt)
    }
}
