// ABOUTME: Extraction adapter bridging raw workout text and the LLM provider
// ABOUTME: Prompt assembly, robust JSON location, and strict draft validation at the boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Extraction Adapter
//!
//! Converts raw workout-plan text into a typed [`ExtractionDraft`] by calling
//! the configured LLM provider. The adapter owns the full boundary: it builds
//! the instruction prompt with a serialized catalog summary, enforces a hard
//! timeout on the call, locates JSON in the free-form response (stripping
//! code fences when present), and strictly validates the decoded draft before
//! anything flows deeper into the pipeline.
//!
//! The adapter never retries: a failed extraction fails the job, and a fresh
//! import is the only recovery path.

mod draft;
mod prompts;

pub use draft::{DraftExercise, DraftSet, DraftWorkout, ExtractionDraft, SetSpec};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::catalog::CatalogExercise;
use crate::config::{LlmConfig, TextLimits};
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// Adapter over the external extraction service
pub struct ExtractionAdapter {
    provider: Arc<dyn LlmProvider>,
    config: LlmConfig,
    limits: TextLimits,
}

impl ExtractionAdapter {
    /// Create an adapter over an LLM provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: LlmConfig, limits: TextLimits) -> Self {
        Self {
            provider,
            config,
            limits,
        }
    }

    /// Extract a draft plan from raw text against a catalog snapshot.
    ///
    /// Performs exactly one completion call. Network failures, timeouts,
    /// unparsable JSON, and shape mismatches all surface as a single
    /// extraction error with a descriptive message.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the text is out of bounds (checked
    /// before the expensive call), a timeout error when the provider misses
    /// the configured deadline, and an extraction error for every other
    /// failure mode.
    pub async fn extract(
        &self,
        raw_text: &str,
        catalog: &[CatalogExercise],
    ) -> AppResult<ExtractionDraft> {
        self.check_length(raw_text)?;

        let request = ChatRequest::new(vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompts::build_user_prompt(raw_text, catalog)),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_output_tokens);

        debug!(
            provider = self.provider.name(),
            catalog_size = catalog.len(),
            "Requesting plan extraction"
        );

        let deadline = Duration::from_secs(self.config.timeout_secs);
        let response = timeout(deadline, self.provider.complete(&request))
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "extraction call exceeded {}s deadline",
                    self.config.timeout_secs
                ))
            })??;

        let json = Self::locate_json(&response.content)?;
        let parsed: ExtractionDraft = serde_json::from_str(json).map_err(|e| {
            AppError::extraction(format!("extraction service returned invalid JSON: {e}"))
        })?;
        parsed.validate()?;

        let total_exercises: usize = parsed.workouts.iter().map(|w| w.exercises.len()).sum();
        info!(
            workouts = parsed.workouts.len(),
            exercises = total_exercises,
            "Extracted draft plan"
        );

        Ok(parsed)
    }

    /// Validate the raw-text length bounds
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the text is shorter or longer
    /// than the configured bounds.
    pub fn check_length(&self, raw_text: &str) -> AppResult<()> {
        let len = raw_text.chars().count();
        if len < self.limits.min_chars {
            return Err(AppError::invalid_input(format!(
                "workout text must be at least {} characters",
                self.limits.min_chars
            )));
        }
        if len > self.limits.max_chars {
            return Err(AppError::invalid_input(format!(
                "workout text must be at most {} characters",
                self.limits.max_chars
            )));
        }
        Ok(())
    }

    /// Locate the JSON object inside a free-form model response.
    ///
    /// Handles fenced code blocks (```json ... ``` or ``` ... ```) and, as a
    /// fallback, slices from the first `{` to the last `}`.
    fn locate_json(content: &str) -> AppResult<&str> {
        let mut candidate = content.trim();

        for fence in ["```json", "```"] {
            if let Some(start) = candidate.find(fence) {
                let after = &candidate[start + fence.len()..];
                if let Some(end) = after.find("```") {
                    candidate = after[..end].trim();
                    break;
                }
            }
        }

        if !candidate.starts_with('{') {
            let start = candidate.find('{');
            let end = candidate.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => candidate = &candidate[s..=e],
                _ => {
                    return Err(AppError::extraction(
                        "extraction service response contains no JSON object",
                    ))
                }
            }
        }

        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_json_plain_object() {
        let json = ExtractionAdapter::locate_json(r#"{"name": "Plan"}"#).unwrap();
        assert_eq!(json, r#"{"name": "Plan"}"#);
    }

    #[test]
    fn test_locate_json_strips_json_fence() {
        let content = "Here you go:\n```json\n{\"name\": \"Plan\"}\n```\nEnjoy!";
        let json = ExtractionAdapter::locate_json(content).unwrap();
        assert_eq!(json, "{\"name\": \"Plan\"}");
    }

    #[test]
    fn test_locate_json_strips_bare_fence() {
        let content = "```\n{\"workouts\": []}\n```";
        let json = ExtractionAdapter::locate_json(content).unwrap();
        assert_eq!(json, "{\"workouts\": []}");
    }

    #[test]
    fn test_locate_json_slices_embedded_object() {
        let content = "The parsed plan is {\"name\": \"Plan\", \"workouts\": []} as requested.";
        let json = ExtractionAdapter::locate_json(content).unwrap();
        assert_eq!(json, "{\"name\": \"Plan\", \"workouts\": []}");
    }

    #[test]
    fn test_locate_json_rejects_prose() {
        let result = ExtractionAdapter::locate_json("Sorry, I can't parse that plan.");
        assert!(result.is_err());
    }
}
