// ABOUTME: Import orchestrator owning the asynchronous job pipeline end to end
// ABOUTME: Creates jobs, runs the detached worker, serves polling reads, links drafts once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Import Orchestrator
//!
//! [`ImportService::start_import`] validates the input, creates a `pending`
//! job, spawns a detached worker, and returns the job id without waiting.
//! The worker walks the pipeline — mark processing, load a catalog snapshot,
//! extract, reconcile matches, assemble statistics — and writes the terminal
//! state back to the store. Every worker-side error is caught at the worker
//! boundary and recorded as the job's `failed` state: by the time it occurs
//! the caller is no longer on the stack, so nothing is ever thrown upward,
//! and a job is never left in `processing` by a surviving worker.
//!
//! Callers learn the outcome only by polling
//! [`ImportService::get_status`]; there is no push channel.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogExercise, CatalogProvider};
use crate::config::ImportConfig;
use crate::errors::{AppError, AppResult};
use crate::extraction::{DraftExercise, ExtractionAdapter, ExtractionDraft};
use crate::matching::ExerciseMatcher;
use crate::models::{
    ConfidenceLevel, ExerciseMatch, ImportResult, ImportStatus, ParsedExerciseItem,
    ParsedWorkoutItem, ParsedWorkoutPlan,
};
use crate::store::{JobStore, LinkOutcome};

/// Polling view of one import job
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportStatusView {
    /// The job id
    pub job_id: Uuid,
    /// Current state-machine position
    pub status: ImportStatus,
    /// Present iff the job completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ImportResult>,
    /// Present iff the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Running tally of match quality over one job
#[derive(Debug, Default, Clone, Copy)]
struct MatchStats {
    high: usize,
    medium: usize,
    low: usize,
    unmatched: usize,
}

impl MatchStats {
    fn bump(&mut self, level: ConfidenceLevel) {
        match level {
            ConfidenceLevel::High => self.high += 1,
            ConfidenceLevel::Medium => self.medium += 1,
            ConfidenceLevel::Low => self.low += 1,
        }
    }
}

/// Orchestrates the asynchronous import pipeline
#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn JobStore>,
    catalog: Arc<dyn CatalogProvider>,
    adapter: Arc<ExtractionAdapter>,
    matcher: ExerciseMatcher,
    stale_grace: Duration,
}

impl ImportService {
    /// Wire the pipeline together
    #[must_use]
    pub fn new(
        store: Arc<dyn JobStore>,
        catalog: Arc<dyn CatalogProvider>,
        adapter: ExtractionAdapter,
        config: ImportConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            adapter: Arc::new(adapter),
            matcher: ExerciseMatcher::new(config.matcher),
            stale_grace: Duration::seconds(i64::try_from(config.stale_job_grace_secs).unwrap_or(0)),
        }
    }

    /// Start an import: validate, create the job, schedule the worker.
    ///
    /// Returns the job id immediately; the caller polls [`Self::get_status`]
    /// until the job reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the text is out of bounds (no job
    /// is created) or a database error when the job record cannot be
    /// inserted.
    pub async fn start_import(&self, owner: Uuid, raw_text: &str) -> AppResult<Uuid> {
        self.adapter.check_length(raw_text)?;

        let job = self.store.create_job(owner, raw_text).await?;
        info!(job_id = %job.id, "Import job created");

        let service = self.clone();
        let job_id = job.id;
        let text = raw_text.to_owned();
        tokio::spawn(async move {
            service.run_import(job_id, text).await;
        });

        Ok(job_id)
    }

    /// Worker routine; runs off the request path and never returns an error.
    ///
    /// Every failure inside the pipeline is converted into the job's
    /// terminal `failed` state with a sanitized message.
    async fn run_import(&self, job_id: Uuid, raw_text: String) {
        if let Err(err) = self.execute_pipeline(job_id, &raw_text).await {
            warn!(%job_id, error = %err, "Import job failed");
            if let Err(store_err) = self.store.mark_failed(job_id, &err.to_string()).await {
                error!(%job_id, error = %store_err, "Could not record import failure");
            }
        }
    }

    async fn execute_pipeline(&self, job_id: Uuid, raw_text: &str) -> AppResult<()> {
        self.store.mark_processing(job_id).await?;

        let catalog = self
            .catalog
            .list_exercises()
            .await
            .map_err(|e| AppError::database(format!("exercise catalog unavailable: {e}")))?;

        let draft = self.adapter.extract(raw_text, &catalog).await?;

        let result = self.reconcile_draft(job_id, raw_text, &draft, &catalog);
        if !result.counts_are_consistent() {
            return Err(AppError::internal(
                "confidence counts do not partition the extracted exercises",
            ));
        }

        self.store.mark_completed(job_id, &result).await?;

        info!(
            %job_id,
            workouts = result.parsed_plan.workouts.len(),
            exercises = result.total_exercises,
            high = result.high_confidence_count,
            medium = result.medium_confidence_count,
            low = result.low_confidence_count,
            unmatched = result.unmatched_count,
            "Import job completed"
        );
        Ok(())
    }

    /// Reconcile the extracted draft against the catalog snapshot
    fn reconcile_draft(
        &self,
        job_id: Uuid,
        raw_text: &str,
        draft: &ExtractionDraft,
        catalog: &[CatalogExercise],
    ) -> ImportResult {
        let mut stats = MatchStats::default();
        let mut total_exercises = 0;

        let mut workouts = Vec::with_capacity(draft.workouts.len());
        for workout in &draft.workouts {
            let mut exercises = Vec::with_capacity(workout.exercises.len());
            for exercise in &workout.exercises {
                total_exercises += 1;
                let (matched, alternatives) = self.resolve_match(exercise, catalog, &mut stats);
                exercises.push(ParsedExerciseItem {
                    original_text: exercise.original_text.clone(),
                    sequence: exercise.sequence,
                    set_configurations: exercise.set_configurations(),
                    rest_seconds: exercise.rest_seconds,
                    notes: exercise.notes.clone(),
                    matched_exercise: matched,
                    alternatives,
                });
            }
            workouts.push(ParsedWorkoutItem {
                name: workout.name.clone(),
                day_number: workout.day_number,
                order_index: workout.order_index,
                exercises,
            });
        }

        ImportResult {
            parsed_plan: ParsedWorkoutPlan {
                name: draft.name.clone(),
                description: draft.description.clone(),
                workouts,
                raw_text: raw_text.to_owned(),
                source_job_id: job_id,
            },
            total_exercises,
            high_confidence_count: stats.high,
            medium_confidence_count: stats.medium,
            low_confidence_count: stats.low,
            unmatched_count: stats.unmatched,
        }
    }

    /// Resolve one extracted exercise to a catalog match plus alternatives.
    ///
    /// An adapter-supplied id is authoritative when it names a real catalog
    /// entry and its self-reported confidence clears the low floor; such
    /// items skip local matching entirely. Everything else runs through the
    /// matcher.
    fn resolve_match(
        &self,
        exercise: &DraftExercise,
        catalog: &[CatalogExercise],
        stats: &mut MatchStats,
    ) -> (Option<ExerciseMatch>, Vec<ExerciseMatch>) {
        if let (Some(id), Some(confidence)) = (exercise.exercise_id, exercise.confidence) {
            if let Some(level) = self.matcher.confidence_level(confidence) {
                if let Some(entry) = catalog.iter().find(|e| e.id == id) {
                    stats.bump(level);
                    let matched =
                        build_match(entry, &exercise.original_text, confidence, level);
                    return (Some(matched), Vec::new());
                }
            }
        }

        let outcome = self.matcher.match_exercise(
            &exercise.original_text,
            catalog,
            self.matcher.config().max_alternatives,
        );

        let matched = outcome.best.and_then(|candidate| {
            let level = self.matcher.confidence_level(candidate.score)?;
            stats.bump(level);
            Some(build_match(
                &candidate.exercise,
                &exercise.original_text,
                candidate.score,
                level,
            ))
        });
        if matched.is_none() {
            stats.unmatched += 1;
        }

        let alternatives = outcome
            .alternatives
            .into_iter()
            .filter_map(|candidate| {
                let level = self.matcher.confidence_level(candidate.score)?;
                Some(build_match(
                    &candidate.exercise,
                    &exercise.original_text,
                    candidate.score,
                    level,
                ))
            })
            .collect();

        (matched, alternatives)
    }

    /// Poll one job's status.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for missing jobs and for jobs belonging to
    /// another owner (the two are indistinguishable by design).
    pub async fn get_status(&self, job_id: Uuid, owner: Uuid) -> AppResult<ImportStatusView> {
        let job = self
            .store
            .get_job(job_id, owner)
            .await?
            .ok_or_else(|| AppError::not_found("Import job"))?;

        Ok(ImportStatusView {
            job_id: job.id,
            status: job.status,
            result: job.result,
            error: job.error,
        })
    }

    /// Consume a completed draft into a persisted plan, exactly once.
    ///
    /// # Errors
    ///
    /// Returns an already-exists error when the job was consumed before and
    /// a not-found error for missing or foreign jobs.
    pub async fn consume_result(
        &self,
        job_id: Uuid,
        owner: Uuid,
        plan_id: Uuid,
    ) -> AppResult<()> {
        match self.store.link_plan(job_id, owner, plan_id).await? {
            LinkOutcome::Linked => {
                info!(%job_id, %plan_id, "Import draft consumed into plan");
                Ok(())
            }
            LinkOutcome::AlreadyLinked => Err(AppError::already_linked(
                "a plan was already created from this import",
            )),
            LinkOutcome::NotFound => Err(AppError::not_found("Import job")),
        }
    }

    /// Fail `processing` jobs abandoned by a lost worker.
    ///
    /// The worker converts its own failures into terminal states, but a
    /// process restart mid-job leaves the record stuck in `processing`. The
    /// host schedules this sweep as it sees fit.
    ///
    /// # Errors
    ///
    /// Returns a database error when the sweep cannot run.
    pub async fn sweep_stale_jobs(&self) -> AppResult<u64> {
        let swept = self.store.sweep_stale(self.stale_grace).await?;
        if swept > 0 {
            warn!(swept, "Swept stale import jobs to failed");
        }
        Ok(swept)
    }
}

fn build_match(
    entry: &CatalogExercise,
    original_text: &str,
    confidence: f64,
    level: ConfidenceLevel,
) -> ExerciseMatch {
    ExerciseMatch {
        exercise_id: entry.id,
        exercise_name: entry.name.clone(),
        original_text: original_text.to_owned(),
        confidence,
        confidence_level: level,
        primary_muscle_groups: entry.primary_muscle_groups.clone(),
        secondary_muscle_groups: entry.secondary_muscle_groups.clone(),
    }
}
