// ABOUTME: Durable job store abstraction for the import state machine
// ABOUTME: Plugin architecture with in-memory and SQLite backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Import Job Store
//!
//! One durable record per import attempt, mutated only through the state
//! machine transitions below. All reads are owner-scoped: a job belonging to
//! another owner behaves exactly like a missing job, so no existence leaks
//! across users.
//!
//! Backends guarantee per-record atomicity — a status transition and its
//! payload land together, so a poller can never observe `processing` with a
//! result already attached. Terminal states (`completed`, `failed`) are
//! final; attempting to overwrite one is an error, never a silent regression.

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::models::{ImportJob, ImportResult};

/// Outcome of a one-shot plan linkage attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// This call performed the linkage
    Linked,
    /// The job was already consumed by an earlier call
    AlreadyLinked,
    /// No such job for this owner
    NotFound,
}

/// Durable store for import jobs
///
/// All backends must implement this trait; the orchestrator is written
/// against it and the integration suite runs against every backend.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job in `pending` and return it
    async fn create_job(&self, owner: Uuid, raw_text: &str) -> Result<ImportJob>;

    /// Owner-scoped lookup; `None` for missing and foreign jobs alike
    async fn get_job(&self, job_id: Uuid, owner: Uuid) -> Result<Option<ImportJob>>;

    /// Transition `pending -> processing`
    ///
    /// Fails when the job is missing or not in `pending`.
    async fn mark_processing(&self, job_id: Uuid) -> Result<()>;

    /// Transition to terminal `completed` with the result attached
    ///
    /// Fails when the job is missing or already terminal.
    async fn mark_completed(&self, job_id: Uuid, result: &ImportResult) -> Result<()>;

    /// Transition to terminal `failed` with the error message attached
    ///
    /// Fails when the job is missing or already terminal.
    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// One-shot linkage of the parsed draft to a persisted plan.
    ///
    /// Safe under concurrent attempts: the first writer wins, later callers
    /// observe [`LinkOutcome::AlreadyLinked`].
    async fn link_plan(&self, job_id: Uuid, owner: Uuid, plan_id: Uuid) -> Result<LinkOutcome>;

    /// Fail `processing` jobs whose last transition is older than `grace`.
    ///
    /// Housekeeping for workers lost to a process restart; returns the
    /// number of jobs swept.
    async fn sweep_stale(&self, grace: Duration) -> Result<u64>;
}

/// Error message attached to jobs failed by the stale sweep
pub(crate) const STALE_SWEEP_ERROR: &str =
    "import worker did not finish in time; the job was abandoned";
