// ABOUTME: Shared fixtures for import pipeline integration tests
// ABOUTME: Scripted LLM provider, synthetic catalogs, and polling helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

#![allow(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use repforge_import::catalog::{CatalogExercise, StaticCatalog};
use repforge_import::config::ImportConfig;
use repforge_import::errors::AppError;
use repforge_import::extraction::ExtractionAdapter;
use repforge_import::llm::{ChatRequest, ChatResponse, LlmProvider};
use repforge_import::models::MuscleGroup;
use repforge_import::services::{ImportService, ImportStatusView};
use repforge_import::store::memory::MemoryJobStore;

/// One scripted reply from the fake extraction service
pub enum ScriptedReply {
    /// Return this content blob
    Content(String),
    /// Fail the call with an extraction error
    Failure(String),
    /// Never answer; lets the adapter's deadline fire
    Hang,
}

/// LLM provider test double that replays scripted replies in order
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Content(content.into())])
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Test Provider"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedReply::Failure("no scripted reply left".into()));
        match reply {
            ScriptedReply::Content(content) => Ok(ChatResponse {
                content,
                model: "scripted-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            ScriptedReply::Failure(message) => Err(AppError::extraction(message)),
            ScriptedReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AppError::timeout("scripted hang elapsed"))
            }
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Catalog snapshot used across the suite
pub fn fixture_catalog() -> Vec<CatalogExercise> {
    vec![
        CatalogExercise::new("Squat", vec![MuscleGroup::Legs, MuscleGroup::Glutes]),
        CatalogExercise::new("Bench Press", vec![MuscleGroup::Chest])
            .with_secondary(vec![MuscleGroup::Triceps]),
        CatalogExercise::new("Deadlift", vec![MuscleGroup::Back, MuscleGroup::Legs]),
        CatalogExercise::new("Overhead Press", vec![MuscleGroup::Shoulders]),
        CatalogExercise::new("Barbell Row", vec![MuscleGroup::Back]),
    ]
}

/// Pipeline configuration with a short extraction deadline and zero sweep grace
pub fn test_config() -> ImportConfig {
    let mut config = ImportConfig::default();
    config.llm.timeout_secs = 1;
    config.stale_job_grace_secs = 0;
    config
}

/// Wire a full service over the in-memory store and a scripted provider
pub fn build_service(
    provider: ScriptedProvider,
    catalog: Vec<CatalogExercise>,
) -> (ImportService, Arc<MemoryJobStore>) {
    let config = test_config();
    let store = Arc::new(MemoryJobStore::new());
    let adapter = ExtractionAdapter::new(Arc::new(provider), config.llm.clone(), config.limits);
    let service = ImportService::new(
        store.clone(),
        Arc::new(StaticCatalog::new(catalog)),
        adapter,
        config,
    );
    (service, store)
}

/// Poll until the job reaches a terminal state
pub async fn wait_for_terminal(
    service: &ImportService,
    job_id: Uuid,
    owner: Uuid,
) -> ImportStatusView {
    for _ in 0..500 {
        let view = service.get_status(job_id, owner).await.unwrap();
        if view.status.is_terminal() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

/// Draft reply used by the happy-path scenarios: two exact-name exercises
/// on one day, no pre-resolved ids, so both run through the local matcher
pub fn two_exercise_draft() -> String {
    r#"{
        "name": "Strength Block",
        "description": "Lower/upper base work",
        "workouts": [
            {
                "name": "Day 1",
                "day_number": 1,
                "order_index": 0,
                "exercises": [
                    {
                        "original_text": "Squat",
                        "sequence": 0,
                        "sets": 5,
                        "reps": 5,
                        "rest_seconds": 180
                    },
                    {
                        "original_text": "Bench Press",
                        "sequence": 1,
                        "sets": [
                            {"reps_min": 8, "reps_max": 10},
                            {"reps_min": 8, "reps_max": 10},
                            {"reps_min": 8, "reps_max": 10}
                        ]
                    }
                ]
            }
        ]
    }"#
    .to_owned()
}
