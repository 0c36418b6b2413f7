// ABOUTME: Environment-driven configuration for the import pipeline
// ABOUTME: Covers the extraction service, matcher thresholds, input limits, and housekeeping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! Environment-based configuration.
//!
//! All tunables are supplied through environment variables with production
//! defaults. Nothing here is hardcoded at call sites: the extraction endpoint
//! configuration, the matcher's confidence thresholds, and the input length
//! bounds all flow in from [`ImportConfig`].

use std::env;

use tracing::warn;

use crate::errors::{AppError, AppResult};

/// Environment variable for the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

mod defaults {
    pub const LLM_MODEL: &str = "gemini-2.5-flash";
    pub const LLM_TEMPERATURE: f32 = 0.1;
    pub const LLM_MAX_OUTPUT_TOKENS: u32 = 4000;
    pub const LLM_TIMEOUT_SECS: u64 = 60;

    pub const MATCH_HIGH_THRESHOLD: f64 = 0.90;
    pub const MATCH_MEDIUM_THRESHOLD: f64 = 0.80;
    pub const MATCH_LOW_THRESHOLD: f64 = 0.70;
    pub const MATCH_MAX_ALTERNATIVES: usize = 5;

    pub const IMPORT_MIN_CHARS: usize = 10;
    pub const IMPORT_MAX_CHARS: usize = 50_000;

    pub const STALE_JOB_GRACE_SECS: u64 = 600;
}

/// Parse an environment variable, falling back to a default on absence or
/// parse failure (parse failures are logged, not fatal)
fn env_parse<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {name}: {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Extraction service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key for the extraction service (empty until supplied)
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output size in tokens
    pub max_output_tokens: u32,
    /// Hard deadline for one extraction call
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: defaults::LLM_MODEL.to_owned(),
            temperature: defaults::LLM_TEMPERATURE,
            max_output_tokens: defaults::LLM_MAX_OUTPUT_TOKENS,
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Load from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: env::var(GEMINI_API_KEY_ENV).unwrap_or_default(),
            model: env::var("REPFORGE_LLM_MODEL")
                .unwrap_or_else(|_| defaults::LLM_MODEL.to_owned()),
            temperature: env_parse("REPFORGE_LLM_TEMPERATURE", defaults::LLM_TEMPERATURE),
            max_output_tokens: env_parse(
                "REPFORGE_LLM_MAX_OUTPUT_TOKENS",
                defaults::LLM_MAX_OUTPUT_TOKENS,
            ),
            timeout_secs: env_parse("REPFORGE_LLM_TIMEOUT_SECS", defaults::LLM_TIMEOUT_SECS),
        }
    }
}

/// Matcher confidence thresholds and alternative count
#[derive(Debug, Clone, Copy)]
pub struct MatcherConfig {
    /// Scores at or above this are high confidence
    pub high_threshold: f64,
    /// Scores at or above this (below high) are medium confidence
    pub medium_threshold: f64,
    /// Scores below this are discarded entirely
    pub low_threshold: f64,
    /// Total candidates returned per lookup (best + alternatives)
    pub max_alternatives: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            high_threshold: defaults::MATCH_HIGH_THRESHOLD,
            medium_threshold: defaults::MATCH_MEDIUM_THRESHOLD,
            low_threshold: defaults::MATCH_LOW_THRESHOLD,
            max_alternatives: defaults::MATCH_MAX_ALTERNATIVES,
        }
    }
}

impl MatcherConfig {
    /// Load from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            high_threshold: env_parse(
                "REPFORGE_MATCH_HIGH_THRESHOLD",
                defaults::MATCH_HIGH_THRESHOLD,
            ),
            medium_threshold: env_parse(
                "REPFORGE_MATCH_MEDIUM_THRESHOLD",
                defaults::MATCH_MEDIUM_THRESHOLD,
            ),
            low_threshold: env_parse(
                "REPFORGE_MATCH_LOW_THRESHOLD",
                defaults::MATCH_LOW_THRESHOLD,
            ),
            max_alternatives: env_parse(
                "REPFORGE_MATCH_MAX_ALTERNATIVES",
                defaults::MATCH_MAX_ALTERNATIVES,
            ),
        }
    }

    /// Validate threshold ordering: high > medium > low, all in (0, 1]
    ///
    /// # Errors
    ///
    /// Returns a config error when thresholds are out of range or unordered.
    pub fn validate(&self) -> AppResult<()> {
        let ordered = self.high_threshold > self.medium_threshold
            && self.medium_threshold > self.low_threshold;
        let in_range = self.low_threshold > 0.0 && self.high_threshold <= 1.0;
        if !ordered || !in_range {
            return Err(AppError::config(format!(
                "match thresholds must satisfy 0 < low < medium < high <= 1, got \
                 high={}, medium={}, low={}",
                self.high_threshold, self.medium_threshold, self.low_threshold
            )));
        }
        Ok(())
    }
}

/// Accepted raw-text length bounds, checked before any job is created
#[derive(Debug, Clone, Copy)]
pub struct TextLimits {
    /// Minimum accepted input length in characters
    pub min_chars: usize,
    /// Maximum accepted input length in characters
    pub max_chars: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            min_chars: defaults::IMPORT_MIN_CHARS,
            max_chars: defaults::IMPORT_MAX_CHARS,
        }
    }
}

impl TextLimits {
    /// Load from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            min_chars: env_parse("REPFORGE_IMPORT_MIN_CHARS", defaults::IMPORT_MIN_CHARS),
            max_chars: env_parse("REPFORGE_IMPORT_MAX_CHARS", defaults::IMPORT_MAX_CHARS),
        }
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Extraction service settings
    pub llm: LlmConfig,
    /// Matcher thresholds
    pub matcher: MatcherConfig,
    /// Input length bounds
    pub limits: TextLimits,
    /// Grace period before a stuck `processing` job is swept to `failed`
    pub stale_job_grace_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            matcher: MatcherConfig::default(),
            limits: TextLimits::default(),
            stale_job_grace_secs: defaults::STALE_JOB_GRACE_SECS,
        }
    }
}

impl ImportConfig {
    /// Load the full pipeline configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns a config error when the matcher thresholds are inconsistent
    /// or the text limits are inverted.
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            llm: LlmConfig::from_env(),
            matcher: MatcherConfig::from_env(),
            limits: TextLimits::from_env(),
            stale_job_grace_secs: env_parse(
                "REPFORGE_STALE_JOB_GRACE_SECS",
                defaults::STALE_JOB_GRACE_SECS,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns a config error for unordered thresholds or inverted limits.
    pub fn validate(&self) -> AppResult<()> {
        self.matcher.validate()?;
        if self.limits.min_chars >= self.limits.max_chars {
            return Err(AppError::config(format!(
                "import text limits inverted: min_chars={} max_chars={}",
                self.limits.min_chars, self.limits.max_chars
            )));
        }
        Ok(())
    }
}
