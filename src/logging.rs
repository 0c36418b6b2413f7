// ABOUTME: Structured logging setup for the import pipeline
// ABOUTME: tracing-subscriber with env-filter and selectable output format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! Structured logging configuration.
//!
//! The hosting process calls [`init_logging`] once at startup. Filtering
//! follows `RUST_LOG` (default `info`); the output format comes from
//! `REPFORGE_LOG_FORMAT`.

use std::env;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Machine-readable JSON lines (production default)
    Json,
    /// Human-readable multi-line output
    Pretty,
    /// Single-line human-readable output
    #[default]
    Compact,
}

impl LogFormat {
    /// Parse from string with fallback to the default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }

    /// Read from `REPFORGE_LOG_FORMAT`
    #[must_use]
    pub fn from_env() -> Self {
        env::var("REPFORGE_LOG_FORMAT")
            .map(|raw| Self::from_str_or_default(&raw))
            .unwrap_or_default()
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error when a subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()?,
    }

    Ok(())
}
