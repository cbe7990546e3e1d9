use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{OracleError, RelevanceOracle};
use crate::presentation::config::OracleSettings;

const SYSTEM_PROMPT: &str =
    "You are a keyword analyzer. Respond ONLY with \"true\" or \"false\".";

/// Chat-completion oracle for OpenRouter and other OpenAI-compatible endpoints.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    referer: Option<String>,
    title: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenRouterClient {
    fn build_messages(keyword: &str, topic: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: Some(SYSTEM_PROMPT.to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: Some(format!(
                    "Is this keyword relevant for the given topic? Answer only with true or false.\nTopic: \"{}\"\nKeyword: \"{}\"",
                    topic, keyword
                )),
            },
        ]
    }

    fn apply_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", &self.title);
        match &self.referer {
            Some(referer) => request.header("HTTP-Referer", referer),
            None => request,
        }
    }
}

#[async_trait]
impl RelevanceOracle for OpenRouterClient {
    async fn ask(&self, keyword: &str, topic: &str) -> Result<String, OracleError> {
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(keyword, topic),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request_body);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(|e| OracleError::TransportError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "Oracle returned error status");
            return Err(OracleError::ApiError {
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::MalformedResponse("missing message content".to_string()))
    }

    fn preflight(&self) -> Result<(), OracleError> {
        if self.api_key.trim().is_empty() {
            return Err(OracleError::NotConfigured(
                "API key is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn create_openrouter_client(
    settings: &OracleSettings,
    call_timeout: Duration,
) -> Result<OpenRouterClient, OracleError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(call_timeout)
        .build()
        .map_err(|e| OracleError::NotConfigured(e.to_string()))?;

    Ok(OpenRouterClient {
        client,
        base_url: settings.base_url.trim_end_matches('/').to_string(),
        api_key: settings.api_key.clone(),
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        referer: settings.referer.clone().filter(|r| !r.is_empty()),
        title: settings.title.clone(),
    })
}
