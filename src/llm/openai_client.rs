use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::client::EndpointClassifier;
use crate::error::{Error, Result};
use crate::models::{EndpointAnalysis, EndpointGroup};

const SYSTEM_PROMPT: &str = "You are an API analysis assistant. Your task is to identify API endpoints that fetch valuable data. These could include:\n\
- User data and metadata\n\
- Analytics and tracking\n\
- Search and recommendation results\n\
- Logs, system events, or behavioral data\n\n\
Analyze the provided endpoints and determine which ones are likely to contain valuable data. For each endpoint you identify:\n\
1. Provide a clear explanation of why it's valuable\n\
2. Assign a usefulness score from 0-100 where:\n\
   - 0-20: Minimal value, mostly static or basic data\n\
   - 21-40: Some value but limited utility\n\
   - 41-60: Moderately useful data\n\
   - 61-80: High-value data with clear utility\n\
   - 81-100: Critical data with significant strategic value\n\n\
If no endpoints are found valuable, include at least one as a potential candidate with a reason why it might be useful and a corresponding score.\n\n\
Respond strictly with a JSON object holding an 'endpoints' array of {url, explanation, usefulness_score} objects.";

/// Endpoint classifier backed by the OpenAI chat-completions API.
pub struct OpenAiClassifier {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClassifier {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Points the classifier at a different API host. Used in tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisEnvelope {
    endpoints: Vec<EndpointAnalysis>,
}

#[async_trait]
impl EndpointClassifier for OpenAiClassifier {
    async fn classify(&self, endpoints: &[EndpointGroup]) -> Result<Vec<EndpointAnalysis>> {
        info!(
            "classifying batch of {} endpoint(s) with model {}",
            endpoints.len(),
            self.model
        );

        let batch = serde_json::to_string_pretty(&json!({ "endpoints": endpoints }))
            .map_err(|e| Error::Oracle(e.to_string()))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT
                    },
                    {
                        "role": "user",
                        "content": format!("Here is a batch of API endpoints to analyze:\n\n{}", batch)
                    }
                ],
                "max_tokens": 1500,
                "temperature": 0.1,
                "response_format": {"type": "json_object"}
            }))
            .send()
            .await
            .map_err(|e| Error::Oracle(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!(
                "classifier API error: {error_text}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Oracle(e.to_string()))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim();

        let envelope: AnalysisEnvelope = serde_json::from_str(content)
            .map_err(|e| Error::Oracle(format!("unparseable classifier reply: {e}")))?;

        let mut verdicts = envelope.endpoints;
        for verdict in &mut verdicts {
            verdict.usefulness_score = verdict.usefulness_score.min(100);
        }

        Ok(verdicts)
    }
}
