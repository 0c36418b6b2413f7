// ABOUTME: Google Gemini LLM provider implementation over the Generative AI API
// ABOUTME: Non-streaming generateContent calls with a hard per-request timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Gemini Provider
//!
//! Implementation of [`LlmProvider`] for Google's Gemini models. The import
//! pipeline issues at most one `generateContent` call per job; the request
//! carries the system instruction separately (Gemini's `system_instruction`
//! field) and bounds generation via `generation_config`.
//!
//! ## Configuration
//!
//! The API key comes from the `GEMINI_API_KEY` environment variable via
//! [`crate::config::LlmConfig::from_env`]; model, temperature, output cap,
//! and timeout are part of the same config surface.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, MessageRole, TokenUsage};
use crate::config::{LlmConfig, GEMINI_API_KEY_ENV};
use crate::errors::{AppError, ErrorCode};

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Content structure for the Gemini API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

/// Text part of a content block
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

/// Generation configuration
#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    candidate_count: u32,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    error: Option<GeminiError>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

/// Usage metadata from the Gemini API response
#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total: Option<u32>,
}

/// API error response from Gemini
#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    default_model: String,
}

impl GeminiProvider {
    /// Create a provider from an extraction service configuration.
    ///
    /// The HTTP client carries the configured hard timeout, so a hung
    /// extraction call surfaces as a timeout error rather than blocking the
    /// worker indefinitely.
    ///
    /// # Errors
    ///
    /// Returns a config error when the API key is empty or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        if config.api_key.is_empty() {
            return Err(AppError::config(format!(
                "{GEMINI_API_KEY_ENV} environment variable not set"
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: config.api_key.clone(),
            client,
            default_model: config.model.clone(),
        })
    }

    /// Build the API URL for a model and method
    fn build_url(&self, model: &str, method: &str) -> String {
        format!(
            "{API_BASE_URL}/models/{model}:{method}?key={}",
            self.api_key
        )
    }

    /// Convert chat messages to Gemini format.
    ///
    /// System messages map onto Gemini's separate `system_instruction` field.
    fn convert_messages(messages: &[ChatMessage]) -> (Vec<GeminiContent>, Option<GeminiContent>) {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for message in messages {
            let part = ContentPart {
                text: message.content.clone(),
            };
            match message.role {
                MessageRole::System => {
                    system_instruction = Some(GeminiContent {
                        role: None,
                        parts: vec![part],
                    });
                }
                MessageRole::User => {
                    contents.push(GeminiContent {
                        role: Some("user".to_owned()),
                        parts: vec![part],
                    });
                }
            }
        }

        (contents, system_instruction)
    }

    /// Build a Gemini API request from a [`ChatRequest`]
    fn build_gemini_request(request: &ChatRequest) -> GeminiRequest {
        let (contents, system_instruction) = Self::convert_messages(&request.messages);

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                candidate_count: 1,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }

    /// Extract text content from a Gemini response
    fn extract_content(response: &GeminiResponse) -> Result<String, AppError> {
        let part = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .ok_or_else(|| AppError::extraction("no content in Gemini response"))?;
        Ok(part.text.clone())
    }

    /// Convert usage metadata to our token usage format
    fn convert_usage(metadata: &UsageMetadata) -> TokenUsage {
        TokenUsage {
            prompt_tokens: metadata.prompt.unwrap_or(0),
            completion_tokens: metadata.candidates.unwrap_or(0),
            total_tokens: metadata.total.unwrap_or(0),
        }
    }

    /// Map a transport error onto the pipeline taxonomy
    fn map_transport_error(error: &reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::timeout("Gemini API call exceeded the configured deadline")
        } else {
            AppError::extraction(format!("HTTP request failed: {error}"))
        }
    }

    /// Map a non-2xx API status to an appropriate error
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<GeminiResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_owned(), |e| e.message);

        match status {
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                "AI service quota exceeded, try again shortly",
            ),
            _ => AppError::extraction(format!("Gemini API error ({status}): {message}")),
        }
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key intentionally omitted
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(self.default_model.as_str())))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let url = self.build_url(model, "generateContent");
        let gemini_request = Self::build_gemini_request(request);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::extraction(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(error = %e, "Failed to parse Gemini response");
                AppError::extraction(format!("failed to parse Gemini response: {e}"))
            })?;

        if let Some(api_error) = gemini_response.error {
            return Err(AppError::extraction(format!(
                "Gemini API error: {}",
                api_error.message
            )));
        }

        let content = Self::extract_content(&gemini_response)?;
        let usage = gemini_response
            .usage_metadata
            .as_ref()
            .map(Self::convert_usage);
        let finish_reason = gemini_response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.clone());

        debug!("Received response from Gemini");

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            usage,
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let request = ChatRequest::new(vec![ChatMessage::user("ping")]).with_max_tokens(1);
        match self.complete(&request).await {
            Ok(_) => Ok(true),
            Err(err) if err.code == ErrorCode::ExternalTimeout => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> LlmConfig {
        LlmConfig {
            api_key: "test-key".to_owned(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = LlmConfig::default();
        let result = GeminiProvider::new(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_system_message_becomes_system_instruction() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("You are a parser."),
            ChatMessage::user("Squat 5x5"),
        ]);
        let gemini_request = GeminiProvider::build_gemini_request(&request);
        assert!(gemini_request.system_instruction.is_some());
        assert_eq!(gemini_request.contents.len(), 1);
        assert_eq!(gemini_request.contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn test_generation_config_carries_bounds() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.1)
            .with_max_tokens(4000);
        let gemini_request = GeminiProvider::build_gemini_request(&request);
        let config = gemini_request.generation_config.expect("config");
        assert_eq!(config.temperature, Some(0.1));
        assert_eq!(config.max_output_tokens, Some(4000));
    }

    #[test]
    fn test_url_embeds_model_and_key() {
        let provider = GeminiProvider::new(&config_with_key()).unwrap();
        let url = provider.build_url("gemini-2.5-flash", "generateContent");
        assert!(url.contains("models/gemini-2.5-flash:generateContent"));
        assert!(url.contains("key=test-key"));
    }
}
