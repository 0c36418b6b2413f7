// ABOUTME: End-to-end tests for the import orchestrator over the in-memory store
// ABOUTME: Covers the polled state machine, confidence statistics, and one-shot consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use uuid::Uuid;

use repforge_import::errors::ErrorCode;
use repforge_import::models::{ConfidenceLevel, ImportStatus};
use repforge_import::store::JobStore;

use common::{
    build_service, fixture_catalog, two_exercise_draft, wait_for_terminal, ScriptedProvider,
    ScriptedReply,
};

const RAW_TEXT: &str = "Day 1\nSquat 5x5\nBench Press 3x8-10";

#[tokio::test]
async fn exact_names_complete_with_high_confidence() {
    let (service, _) = build_service(
        ScriptedProvider::with_content(two_exercise_draft()),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    assert_eq!(view.status, ImportStatus::Completed);
    assert!(view.error.is_none());

    let result = view.result.unwrap();
    assert_eq!(result.total_exercises, 2);
    assert_eq!(result.high_confidence_count, 2);
    assert_eq!(result.unmatched_count, 0);

    let plan = &result.parsed_plan;
    assert_eq!(plan.raw_text, RAW_TEXT);
    assert_eq!(plan.source_job_id, job_id);
    assert_eq!(plan.workouts.len(), 1);

    let exercises = &plan.workouts[0].exercises;
    for exercise in exercises {
        let matched = exercise.matched_exercise.as_ref().unwrap();
        assert_eq!(matched.confidence_level, ConfidenceLevel::High);
        assert!(!exercise.set_configurations.is_empty());
    }
    // "Squat 5x5" expands a bare count into five identical sets
    let squat = &exercises[0];
    assert_eq!(squat.set_configurations.len(), 5);
    assert!(squat
        .set_configurations
        .iter()
        .all(|s| s.reps_min == 5 && s.reps_max == 5));
    assert_eq!(squat.rest_seconds, Some(180));
}

#[tokio::test]
async fn typo_matches_at_reduced_confidence_never_unmatched() {
    let draft = r#"{
        "name": "Typo Plan",
        "workouts": [{
            "name": "Day 1", "order_index": 0,
            "exercises": [{
                "original_text": "Bnech Pres",
                "sequence": 0,
                "sets": [{"reps_min": 8, "reps_max": 10}]
            }]
        }]
    }"#;
    let (service, _) = build_service(ScriptedProvider::with_content(draft), fixture_catalog());
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    let result = view.result.unwrap();
    assert_eq!(result.unmatched_count, 0);
    assert_eq!(result.medium_confidence_count + result.low_confidence_count, 1);

    let matched = result.parsed_plan.workouts[0].exercises[0]
        .matched_exercise
        .as_ref()
        .unwrap();
    assert_eq!(matched.exercise_name, "Bench Press");
    assert!(matched.confidence >= 0.70 && matched.confidence < 0.90);
}

#[tokio::test]
async fn unknown_exercise_counts_as_unmatched() {
    let draft = r#"{
        "workouts": [{
            "name": "Day 1", "order_index": 0,
            "exercises": [{
                "original_text": "Zzyx Machine Curl 3x10",
                "sequence": 0,
                "sets": 3, "reps_min": 10, "reps_max": 10
            }]
        }]
    }"#;
    let (service, _) = build_service(ScriptedProvider::with_content(draft), fixture_catalog());
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    let result = view.result.unwrap();
    assert_eq!(result.unmatched_count, 1);

    let exercise = &result.parsed_plan.workouts[0].exercises[0];
    assert!(exercise.matched_exercise.is_none());
    assert!(exercise.alternatives.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_extraction_fails_the_job_within_the_deadline() {
    let (service, _) = build_service(
        ScriptedProvider::new(vec![ScriptedReply::Hang]),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    assert_eq!(view.status, ImportStatus::Failed);
    assert!(view.result.is_none());
    let error = view.error.unwrap();
    assert!(!error.is_empty());
    assert!(error.to_lowercase().contains("time"));
}

#[tokio::test]
async fn extraction_failure_lands_in_failed_with_message() {
    let (service, _) = build_service(
        ScriptedProvider::new(vec![ScriptedReply::Failure("upstream 502".into())]),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    assert_eq!(view.status, ImportStatus::Failed);
    assert!(view.error.unwrap().contains("upstream 502"));
}

#[tokio::test]
async fn adapter_resolved_ids_skip_local_matching() {
    let catalog = fixture_catalog();
    let deadlift = &catalog[2];
    let draft = format!(
        r#"{{
            "workouts": [{{
                "name": "Day 1", "order_index": 0,
                "exercises": [{{
                    "original_text": "heavy pulls",
                    "exercise_id": "{}",
                    "confidence": 0.85,
                    "sequence": 0,
                    "sets": [{{"reps_min": 3, "reps_max": 5}}]
                }}]
            }}]
        }}"#,
        deadlift.id
    );
    let (service, _) = build_service(ScriptedProvider::with_content(draft), catalog.clone());
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    let result = view.result.unwrap();
    assert_eq!(result.medium_confidence_count, 1);

    let exercise = &result.parsed_plan.workouts[0].exercises[0];
    let matched = exercise.matched_exercise.as_ref().unwrap();
    assert_eq!(matched.exercise_id, deadlift.id);
    assert_eq!(matched.exercise_name, "Deadlift");
    assert_eq!(matched.confidence_level, ConfidenceLevel::Medium);
    // "heavy pulls" scores nowhere near "Deadlift"; the adapter-supplied id won
    assert!(exercise.alternatives.is_empty());
}

#[tokio::test]
async fn confidence_counts_partition_the_exercises() {
    let catalog = fixture_catalog();
    let draft = r#"{
        "workouts": [{
            "name": "Day 1", "order_index": 0,
            "exercises": [
                {"original_text": "Squat", "sequence": 0, "sets": 3},
                {"original_text": "Bnech Pres", "sequence": 1, "sets": 3},
                {"original_text": "Zzyx Machine", "sequence": 2, "sets": 3}
            ]
        }]
    }"#;
    let (service, _) = build_service(ScriptedProvider::with_content(draft), catalog);
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let view = wait_for_terminal(&service, job_id, owner).await;
    let result = view.result.unwrap();
    assert_eq!(result.total_exercises, 3);
    assert_eq!(
        result.high_confidence_count
            + result.medium_confidence_count
            + result.low_confidence_count
            + result.unmatched_count,
        result.total_exercises
    );
}

#[tokio::test]
async fn out_of_bounds_input_is_rejected_synchronously() {
    let (service, store) = build_service(
        ScriptedProvider::with_content(two_exercise_draft()),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();

    let err = service.start_import(owner, "ab").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = service
        .start_import(owner, &"x".repeat(60_000))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // No job record was created for either rejection
    let swept = store.sweep_stale(chrono::Duration::zero()).await.unwrap();
    assert_eq!(swept, 0);
}

#[tokio::test]
async fn foreign_jobs_read_as_not_found() {
    let (service, _) = build_service(
        ScriptedProvider::with_content(two_exercise_draft()),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let err = service.get_status(job_id, stranger).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = service
        .get_status(Uuid::new_v4(), stranger)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn terminal_status_reads_are_idempotent() {
    let (service, _) = build_service(
        ScriptedProvider::with_content(two_exercise_draft()),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();

    let first = wait_for_terminal(&service, job_id, owner).await;
    let second = service.get_status(job_id, owner).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn concurrent_consumption_links_exactly_once() {
    let (service, _) = build_service(
        ScriptedProvider::with_content(two_exercise_draft()),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();
    wait_for_terminal(&service, job_id, owner).await;

    let (a, b) = tokio::join!(
        service.consume_result(job_id, owner, Uuid::new_v4()),
        service.consume_result(job_id, owner, Uuid::new_v4()),
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.code == ErrorCode::ResourceAlreadyExists))
            .count(),
        1
    );

    // Later attempts keep failing the same way
    let err = service
        .consume_result(job_id, owner, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
}

#[tokio::test]
async fn consuming_a_foreign_job_is_not_found() {
    let (service, _) = build_service(
        ScriptedProvider::with_content(two_exercise_draft()),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();
    let job_id = service.start_import(owner, RAW_TEXT).await.unwrap();
    wait_for_terminal(&service, job_id, owner).await;

    let err = service
        .consume_result(job_id, Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn stale_sweep_fails_abandoned_processing_jobs() {
    let (service, store) = build_service(
        ScriptedProvider::new(vec![]),
        fixture_catalog(),
    );
    let owner = Uuid::new_v4();

    // Simulate a worker lost to a process restart: the job is stuck in
    // processing with no task attached
    let job = store.create_job(owner, RAW_TEXT).await.unwrap();
    store.mark_processing(job.id).await.unwrap();

    let swept = service.sweep_stale_jobs().await.unwrap();
    assert_eq!(swept, 1);

    let view = service.get_status(job.id, owner).await.unwrap();
    assert_eq!(view.status, ImportStatus::Failed);
    assert!(!view.error.unwrap().is_empty());
}
