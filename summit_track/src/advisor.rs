use std::time::Duration;

use serde::{Deserialize, Serialize};
use summit_track_lib::advisory::{AdvisoryStats, FALLBACK_ADVICE};

use crate::error::AdvisoryError;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Produces a short piece of advice for the current hike.
#[async_trait::async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, stats: &AdvisoryStats) -> Result<String, AdvisoryError>;
}

/// Asks the Gemini text generation API for advice.
pub struct GeminiAdvisor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: String, model: String) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_API_URL.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl Advisor for GeminiAdvisor {
    async fn advise(&self, stats: &AdvisoryStats) -> Result<String, AdvisoryError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest::from_prompt(stats.prompt());

        tracing::debug!("Requesting advice from {}", url);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryError::Status(status.as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| AdvisoryError::Malformed(err.to_string()))?;

        Ok(body.advice())
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Text of the first candidate, or the stock advice if the model said nothing.
    fn advice(&self) -> String {
        let text: String = self
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter().filter_map(|part| part.text.as_deref()).collect())
            .unwrap_or_default();

        match text.trim() {
            "" => FALLBACK_ADVICE.to_string(),
            text => text.to_string(),
        }
    }
}
