use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use tally_core::config::TelegramConfig;
use tally_core::domain::account::ChatId;

const BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("telegram api rejected `{method}`: {description}")]
    Api { method: &'static str, description: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    pub fn with_base_url(config: &TelegramConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        }
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        self.call("sendMessage", &[("chat_id", chat_id.to_string()), ("text", text.to_string())])
            .await
    }

    /// Shows the "typing..." indicator while a reply is being prepared.
    pub async fn send_chat_action(&self, chat_id: ChatId) -> Result<(), TelegramError> {
        self.call(
            "sendChatAction",
            &[("chat_id", chat_id.to_string()), ("action", "typing".to_string())],
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        self.call("setWebhook", &[("url", url.to_string())]).await
    }

    async fn call(
        &self,
        method: &'static str,
        params: &[(&str, String)],
    ) -> Result<(), TelegramError> {
        let endpoint =
            method_endpoint(&self.base_url, self.bot_token.expose_secret(), method);
        let response = self.http.post(endpoint).form(params).send().await?;

        let status = response.status();
        let body = response.json::<ApiResponse>().await.unwrap_or(ApiResponse {
            ok: status.is_success(),
            description: Some(format!("undecodable response body (http {status})")),
        });
        if !body.ok {
            return Err(TelegramError::Api {
                method,
                description: body
                    .description
                    .unwrap_or_else(|| format!("no description (http {status})")),
            });
        }

        debug!(method, "telegram call succeeded");
        Ok(())
    }
}

fn method_endpoint(base_url: &str, bot_token: &str, method: &str) -> String {
    format!("{base_url}/bot{bot_token}/{method}")
}

#[cfg(test)]
mod tests {
    use super::{method_endpoint, ApiResponse};

    #[test]
    fn endpoint_embeds_the_bot_token() {
        assert_eq!(
            method_endpoint("https://api.telegram.org", "42:secret", "sendMessage"),
            "https://api.telegram.org/bot42:secret/sendMessage"
        );
    }

    #[test]
    fn api_error_payload_decodes() {
        let response: ApiResponse = serde_json::from_str(
            r#"{ "ok": false, "error_code": 401, "description": "Unauthorized" }"#,
        )
        .expect("response should decode");
        assert!(!response.ok);
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }
}
