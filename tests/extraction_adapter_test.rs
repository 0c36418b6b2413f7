// ABOUTME: Integration tests for the extraction adapter boundary
// ABOUTME: JSON location, strict draft validation, length bounds, and the hard deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use repforge_import::errors::ErrorCode;
use repforge_import::extraction::ExtractionAdapter;

use common::{fixture_catalog, test_config, ScriptedProvider, ScriptedReply};

fn adapter(provider: ScriptedProvider) -> ExtractionAdapter {
    let config = test_config();
    ExtractionAdapter::new(Arc::new(provider), config.llm, config.limits)
}

const RAW_TEXT: &str = "Day 1\nSquat 5x5\nBench Press 3x8-10";

#[tokio::test]
async fn fenced_json_response_is_parsed() {
    let reply = format!("```json\n{}\n```", common::two_exercise_draft());
    let adapter = adapter(ScriptedProvider::with_content(reply));
    let draft = adapter.extract(RAW_TEXT, &fixture_catalog()).await.unwrap();
    assert_eq!(draft.name, "Strength Block");
    assert_eq!(draft.workouts.len(), 1);
    assert_eq!(draft.workouts[0].exercises.len(), 2);
}

#[tokio::test]
async fn bare_json_response_is_parsed() {
    let adapter = adapter(ScriptedProvider::with_content(common::two_exercise_draft()));
    let draft = adapter.extract(RAW_TEXT, &fixture_catalog()).await.unwrap();
    assert_eq!(draft.workouts[0].name, "Day 1");
}

#[tokio::test]
async fn prose_without_json_is_an_extraction_error() {
    let adapter = adapter(ScriptedProvider::with_content(
        "I could not find a workout plan in that text.",
    ));
    let err = adapter
        .extract(RAW_TEXT, &fixture_catalog())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
}

#[tokio::test]
async fn malformed_json_is_an_extraction_error() {
    let adapter = adapter(ScriptedProvider::with_content(
        "```json\n{\"name\": \"Plan\", \"workouts\": [}\n```",
    ));
    let err = adapter
        .extract(RAW_TEXT, &fixture_catalog())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert!(!err.message.is_empty());
}

#[tokio::test]
async fn missing_workouts_field_is_rejected() {
    let adapter = adapter(ScriptedProvider::with_content(r#"{"name": "Plan"}"#));
    let err = adapter
        .extract(RAW_TEXT, &fixture_catalog())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
}

#[tokio::test]
async fn duplicate_order_index_is_rejected() {
    let draft = r#"{"workouts": [
        {"name": "Day 1", "order_index": 0, "exercises": []},
        {"name": "Day 2", "order_index": 0, "exercises": []}
    ]}"#;
    let adapter = adapter(ScriptedProvider::with_content(draft));
    let err = adapter
        .extract(RAW_TEXT, &fixture_catalog())
        .await
        .unwrap_err();
    assert!(err.message.contains("order_index"));
}

#[tokio::test]
async fn provider_failure_surfaces_as_extraction_error() {
    let adapter = adapter(ScriptedProvider::new(vec![ScriptedReply::Failure(
        "upstream 500".into(),
    )]));
    let err = adapter
        .extract(RAW_TEXT, &fixture_catalog())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert!(err.message.contains("upstream 500"));
}

#[tokio::test(start_paused = true)]
async fn hung_provider_hits_the_deadline() {
    let adapter = adapter(ScriptedProvider::new(vec![ScriptedReply::Hang]));
    let err = adapter
        .extract(RAW_TEXT, &fixture_catalog())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalTimeout);
}

#[tokio::test]
async fn too_short_input_is_rejected_before_the_call() {
    let adapter = adapter(ScriptedProvider::new(vec![]));
    let err = adapter.extract("ab", &fixture_catalog()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn oversized_input_is_rejected_before_the_call() {
    let adapter = adapter(ScriptedProvider::new(vec![]));
    let huge = "x".repeat(60_000);
    let err = adapter.extract(&huge, &fixture_catalog()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}
