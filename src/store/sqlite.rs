// ABOUTME: SQLite job store backend over sqlx with single-statement state transitions
// ABOUTME: Conditional UPDATEs make transitions and one-shot linkage first-writer-wins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{JobStore, LinkOutcome, STALE_SWEEP_ERROR};
use crate::models::{ImportJob, ImportResult, ImportStatus};

/// SQLite-backed job store
#[derive(Debug, Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

// Timestamps are stored as fixed-width RFC 3339 UTC text so that string
// comparison in SQL matches chronological order.
fn ts_to_str(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn str_to_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid stored timestamp: {raw}"))?
        .with_timezone(&Utc))
}

fn row_to_job(row: &SqliteRow) -> Result<ImportJob> {
    let id: String = row.try_get("id")?;
    let owner: String = row.try_get("owner")?;
    let raw_text: String = row.try_get("raw_text")?;
    let status: String = row.try_get("status")?;
    let result_json: Option<String> = row.try_get("result")?;
    let error: Option<String> = row.try_get("error")?;
    let linked_plan_id: Option<String> = row.try_get("linked_plan_id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let result = result_json
        .as_deref()
        .map(serde_json::from_str::<ImportResult>)
        .transpose()
        .context("invalid stored import result")?;

    Ok(ImportJob {
        id: Uuid::parse_str(&id)?,
        owner: Uuid::parse_str(&owner)?,
        raw_text,
        status: status.parse::<ImportStatus>().map_err(|e| anyhow!(e))?,
        result,
        error,
        linked_plan_id: linked_plan_id.as_deref().map(Uuid::parse_str).transpose()?,
        created_at: str_to_ts(&created_at)?,
        updated_at: str_to_ts(&updated_at)?,
    })
}

impl SqliteJobStore {
    /// Open a connection pool for the given database URL
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is malformed or the database cannot
    /// be opened.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid SQLite URL: {database_url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Create the schema if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error when the DDL fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS import_jobs (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                status TEXT NOT NULL,
                result TEXT,
                error TEXT,
                linked_plan_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_import_jobs_owner_created
             ON import_jobs (owner, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn current_status(&self, job_id: Uuid) -> Result<Option<ImportStatus>> {
        let row = sqlx::query("SELECT status FROM import_jobs WHERE id = ?")
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            let status: String = r.try_get("status")?;
            status.parse::<ImportStatus>().map_err(|e| anyhow!(e))
        })
        .transpose()
    }

    /// Explain why a conditional transition touched no rows
    async fn transition_failure(&self, job_id: Uuid, target: ImportStatus) -> anyhow::Error {
        match self.current_status(job_id).await {
            Ok(Some(status)) => anyhow!(
                "import job {job_id} cannot transition to {target} from {status}"
            ),
            Ok(None) => anyhow!("import job {job_id} not found"),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
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

        sqlx::query(
            r#"
            INSERT INTO import_jobs (id, owner, raw_text, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id.to_string())
        .bind(job.owner.to_string())
        .bind(&job.raw_text)
        .bind(job.status.as_str())
        .bind(ts_to_str(job.created_at))
        .bind(ts_to_str(job.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid, owner: Uuid) -> Result<Option<ImportJob>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, raw_text, status, result, error, linked_plan_id,
                   created_at, updated_at
            FROM import_jobs
            WHERE id = ? AND owner = ?
            "#,
        )
        .bind(job_id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_job).transpose()
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE import_jobs SET status = 'processing', updated_at = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(ts_to_str(Utc::now()))
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self
                .transition_failure(job_id, ImportStatus::Processing)
                .await);
        }
        Ok(())
    }

    async fn mark_completed(&self, job_id: Uuid, result: &ImportResult) -> Result<()> {
        let payload = serde_json::to_string(result)?;
        let updated = sqlx::query(
            "UPDATE import_jobs SET status = 'completed', result = ?, error = NULL, updated_at = ?
             WHERE id = ? AND status IN ('pending', 'processing')",
        )
        .bind(payload)
        .bind(ts_to_str(Utc::now()))
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self
                .transition_failure(job_id, ImportStatus::Completed)
                .await);
        }
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE import_jobs SET status = 'failed', error = ?, result = NULL, updated_at = ?
             WHERE id = ? AND status IN ('pending', 'processing')",
        )
        .bind(error)
        .bind(ts_to_str(Utc::now()))
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.transition_failure(job_id, ImportStatus::Failed).await);
        }
        Ok(())
    }

    async fn link_plan(&self, job_id: Uuid, owner: Uuid, plan_id: Uuid) -> Result<LinkOutcome> {
        // First writer wins: the conditional UPDATE is atomic, later callers
        // fall through to the SELECT to distinguish AlreadyLinked from NotFound.
        let updated = sqlx::query(
            "UPDATE import_jobs SET linked_plan_id = ?, updated_at = ?
             WHERE id = ? AND owner = ? AND linked_plan_id IS NULL",
        )
        .bind(plan_id.to_string())
        .bind(ts_to_str(Utc::now()))
        .bind(job_id.to_string())
        .bind(owner.to_string())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 1 {
            return Ok(LinkOutcome::Linked);
        }

        let row = sqlx::query("SELECT linked_plan_id FROM import_jobs WHERE id = ? AND owner = ?")
            .bind(job_id.to_string())
            .bind(owner.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(_) => Ok(LinkOutcome::AlreadyLinked),
            None => Ok(LinkOutcome::NotFound),
        }
    }

    async fn sweep_stale(&self, grace: Duration) -> Result<u64> {
        let cutoff = Utc::now()
            .checked_sub_signed(grace)
            .ok_or_else(|| anyhow!("stale-job grace period out of range"))?;
        let swept = sqlx::query(
            "UPDATE import_jobs SET status = 'failed', error = ?, updated_at = ?
             WHERE status = 'processing' AND updated_at < ?",
        )
        .bind(STALE_SWEEP_ERROR)
        .bind(ts_to_str(Utc::now()))
        .bind(ts_to_str(cutoff))
        .execute(&self.pool)
        .await?;

        Ok(swept.rows_affected())
    }
}
