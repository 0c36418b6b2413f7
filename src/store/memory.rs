// ABOUTME: In-memory job store backed by DashMap for tests and single-process deployments
// ABOUTME: Shard locks give per-record atomicity for transitions and one-shot linkage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{JobStore, LinkOutcome, STALE_SWEEP_ERROR};
use crate::models::{ImportJob, ImportResult, ImportStatus};

/// In-memory job store.
///
/// Each mutation holds the DashMap shard lock for its record, so status
/// transitions and linkage are atomic with respect to concurrent readers
/// and writers of the same job.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: DashMap<Uuid, ImportJob>,
}

impl MemoryJobStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, owner: Uuid, raw_text: &str) -> Result<ImportJob> {
        let now = Utc::now();
        let job = ImportJob {
            id: Uuid::new_v4(),
            owner,
            raw_text: raw_text.to_owned(),
            status: ImportStatus::Pending,
            result: None,
            error: None,
            linked_plan_id: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid, owner: Uuid) -> Result<Option<ImportJob>> {
        Ok(self
            .jobs
            .get(&job_id)
            .filter(|job| job.owner == owner)
            .map(|job| job.value().clone()))
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<()> {
        let Some(mut job) = self.jobs.get_mut(&job_id) else {
            bail!("import job {job_id} not found");
        };
        if job.status != ImportStatus::Pending {
            bail!(
                "import job {job_id} cannot start processing from {}",
                job.status
            );
        }
        job.status = ImportStatus::Processing;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_completed(&self, job_id: Uuid, result: &ImportResult) -> Result<()> {
        let Some(mut job) = self.jobs.get_mut(&job_id) else {
            bail!("import job {job_id} not found");
        };
        if job.status.is_terminal() {
            bail!("import job {job_id} is already terminal ({})", job.status);
        }
        job.status = ImportStatus::Completed;
        job.result = Some(result.clone());
        job.error = None;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<()> {
        let Some(mut job) = self.jobs.get_mut(&job_id) else {
            bail!("import job {job_id} not found");
        };
        if job.status.is_terminal() {
            bail!("import job {job_id} is already terminal ({})", job.status);
        }
        job.status = ImportStatus::Failed;
        job.error = Some(error.to_owned());
        job.result = None;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn link_plan(&self, job_id: Uuid, owner: Uuid, plan_id: Uuid) -> Result<LinkOutcome> {
        let Some(mut job) = self.jobs.get_mut(&job_id) else {
            return Ok(LinkOutcome::NotFound);
        };
        if job.owner != owner {
            return Ok(LinkOutcome::NotFound);
        }
        if job.linked_plan_id.is_some() {
            return Ok(LinkOutcome::AlreadyLinked);
        }
        job.linked_plan_id = Some(plan_id);
        job.updated_at = Utc::now();
        Ok(LinkOutcome::Linked)
    }

    async fn sweep_stale(&self, grace: Duration) -> Result<u64> {
        let cutoff = Utc::now() - grace;
        let mut swept = 0;
        for mut entry in self.jobs.iter_mut() {
            if entry.status == ImportStatus::Processing && entry.updated_at < cutoff {
                entry.status = ImportStatus::Failed;
                entry.error = Some(STALE_SWEEP_ERROR.to_owned());
                entry.updated_at = Utc::now();
                swept += 1;
            }
        }
        Ok(swept)
    }
}
