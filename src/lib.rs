// ABOUTME: Main library entry point for the Repforge import pipeline
// ABOUTME: Turns free-form workout-plan text into validated, catalog-matched draft plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

#![deny(unsafe_code)]

//! # Repforge Import
//!
//! Asynchronous import pipeline that converts free-form workout-plan text
//! (pasted coach notes, spreadsheet exports, forum posts) into a validated,
//! structured draft plan with every exercise resolved against a reference
//! exercise catalog.
//!
//! ## Pipeline
//!
//! 1. A caller submits raw text via [`services::ImportService::start_import`]
//!    and immediately receives a job id.
//! 2. A detached worker extracts a draft structure through an LLM provider
//!    ([`extraction::ExtractionAdapter`]), resolves exercise names against the
//!    catalog with tiered fuzzy-match confidence ([`matching::ExerciseMatcher`]),
//!    and writes the terminal outcome to the job store.
//! 3. The caller polls [`services::ImportService::get_status`] until the job
//!    reaches `completed` or `failed`, then consumes the draft exactly once
//!    via [`services::ImportService::consume_result`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use repforge_import::catalog::StaticCatalog;
//! use repforge_import::config::ImportConfig;
//! use repforge_import::errors::AppResult;
//! use repforge_import::extraction::ExtractionAdapter;
//! use repforge_import::llm::GeminiProvider;
//! use repforge_import::services::ImportService;
//! use repforge_import::store::memory::MemoryJobStore;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ImportConfig::from_env()?;
//!     let provider = Arc::new(GeminiProvider::new(&config.llm)?);
//!     let adapter = ExtractionAdapter::new(provider, config.llm.clone(), config.limits);
//!     let service = ImportService::new(
//!         Arc::new(MemoryJobStore::new()),
//!         Arc::new(StaticCatalog::new(Vec::new())),
//!         adapter,
//!         config,
//!     );
//!
//!     let owner = uuid::Uuid::new_v4();
//!     let job_id = service
//!         .start_import(owner, "Day 1\nSquat 5x5\nBench Press 3x8-10")
//!         .await?;
//!     let status = service.get_status(job_id, owner).await?;
//!     println!("job {job_id}: {}", status.status);
//!     Ok(())
//! }
//! ```

/// Exercise catalog abstraction consumed by the matching engine
pub mod catalog;

/// Environment-driven configuration for the pipeline
pub mod config;

/// Unified error handling with standard error codes
pub mod errors;

/// Extraction adapter: prompt assembly, JSON location, draft validation
pub mod extraction;

/// LLM provider abstraction and Gemini implementation
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Fuzzy exercise matching with tiered confidence
pub mod matching;

/// Import-domain data model: jobs, draft plans, matches
pub mod models;

/// Import orchestration service layer
pub mod services;

/// Durable job store with in-memory and SQLite backends
pub mod store;
