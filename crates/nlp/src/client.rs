use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

use tally_core::config::NlpConfig;
use tally_core::extraction::EntityExtraction;

/// Pinned wit.ai API version; the response shape is version-dependent.
const API_VERSION: &str = "20200513";

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("nlp transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("nlp service returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Clone)]
pub struct NlpClient {
    http: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl NlpClient {
    pub fn new(config: &NlpConfig) -> Result<Self, NlpError> {
        let http =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    /// Runs the message through wit.ai and decodes the extracted entities.
    /// Unknown entity kinds in the payload are ignored.
    pub async fn parse_message(&self, text: &str) -> Result<EntityExtraction, NlpError> {
        let response = self
            .http
            .get(message_endpoint(&self.base_url))
            .query(&[("v", API_VERSION), ("q", text)])
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Api { status, body });
        }

        let extraction = response.json::<EntityExtraction>().await?;
        debug!(text_len = text.len(), "nlp extraction decoded");
        Ok(extraction)
    }
}

fn message_endpoint(base_url: &str) -> String {
    format!("{base_url}/message")
}
