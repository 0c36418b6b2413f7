// ABOUTME: Import-domain data model: jobs, draft plans, set configurations, matches
// ABOUTME: Serde-serializable types shared by the store, matcher, and orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Import Data Model
//!
//! Core types for the import pipeline. An [`ImportJob`] tracks one import
//! attempt through its state machine; a completed job carries an
//! [`ImportResult`] holding the [`ParsedWorkoutPlan`] draft plus the
//! confidence statistics over its exercise matches.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MatcherConfig;

/// Muscle group taxonomy used by the exercise catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Legs,
    Glutes,
    Core,
    Traps,
    Lats,
}

/// Confidence tier derived from a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Exact or near-exact match
    High,
    /// Good match with minor variations
    Medium,
    /// Plausible match with notable differences
    Low,
}

impl ConfidenceLevel {
    /// Classify a similarity score against the configured thresholds.
    ///
    /// Returns `None` when the score falls below the low floor; such
    /// candidates are discarded entirely, not even offered as alternatives.
    #[must_use]
    pub fn from_score(score: f64, thresholds: &MatcherConfig) -> Option<Self> {
        if score >= thresholds.high_threshold {
            Some(Self::High)
        } else if score >= thresholds.medium_threshold {
            Some(Self::Medium)
        } else if score >= thresholds.low_threshold {
            Some(Self::Low)
        } else {
            None
        }
    }
}

/// Lifecycle status of an import job
///
/// Transitions are monotonic: `pending -> processing -> {completed | failed}`.
/// Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Created, worker not yet started
    Pending,
    /// Worker is running the pipeline
    Processing,
    /// Finished with a result attached
    Completed,
    /// Finished with an error message attached
    Failed,
}

impl ImportStatus {
    /// Whether this status is terminal (no transition leaves it)
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Stable string form used for persistence
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown import status: {other}")),
        }
    }
}

/// One durable record per import attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    /// Opaque unique identifier, generated at creation
    pub id: Uuid,
    /// Identity of the requesting user; all access is scoped to this value
    pub owner: Uuid,
    /// Original input, immutable after creation
    pub raw_text: String,
    /// Current state-machine position
    pub status: ImportStatus,
    /// Present iff `status == Completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ImportResult>,
    /// Present iff `status == Failed`; a human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set exactly once when the draft is consumed into a persisted plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_plan_id: Option<Uuid>,
    /// Immutable creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status transition
    pub updated_at: DateTime<Utc>,
}

/// Completed-job payload: the draft plan plus match-quality statistics
///
/// The counts always partition the exercises:
/// `high + medium + low + unmatched == total_exercises`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    /// The parsed draft plan, pending user review
    pub parsed_plan: ParsedWorkoutPlan,
    /// Total exercises across all workouts
    pub total_exercises: usize,
    /// Exercises matched at high confidence
    pub high_confidence_count: usize,
    /// Exercises matched at medium confidence
    pub medium_confidence_count: usize,
    /// Exercises matched at low confidence
    pub low_confidence_count: usize,
    /// Exercises with no candidate above the low floor
    pub unmatched_count: usize,
}

impl ImportResult {
    /// Check the confidence partition invariant
    #[must_use]
    pub const fn counts_are_consistent(&self) -> bool {
        self.high_confidence_count
            + self.medium_confidence_count
            + self.low_confidence_count
            + self.unmatched_count
            == self.total_exercises
    }
}

/// Draft plan produced by one successful import job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedWorkoutPlan {
    /// Plan name (defaulted when the source text names none)
    pub name: String,
    /// Optional plan description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered workouts
    pub workouts: Vec<ParsedWorkoutItem>,
    /// Echo of the original input, for audit
    pub raw_text: String,
    /// Back-reference to the producing import job
    pub source_job_id: Uuid,
}

/// One workout (day/session) within a draft plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedWorkoutItem {
    /// Workout name ("Day 1", "Push Day", ...)
    pub name: String,
    /// Optional 1-based day number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_number: Option<u32>,
    /// Display/storage order, unique within the plan
    pub order_index: u32,
    /// Ordered exercises
    pub exercises: Vec<ParsedExerciseItem>,
}

/// One exercise within a draft workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedExerciseItem {
    /// Verbatim extracted phrase
    pub original_text: String,
    /// 0-based position within its workout
    pub sequence: u32,
    /// Per-set rep ranges; never empty
    pub set_configurations: Vec<SetConfig>,
    /// Optional rest between sets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<u32>,
    /// Tempo, RPE, special instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Best catalog match, `None` when nothing cleared the low floor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_exercise: Option<ExerciseMatch>,
    /// Ranked runner-up candidates, never containing the best match
    pub alternatives: Vec<ExerciseMatch>,
}

/// One configured set within an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfig {
    /// Strictly increasing from 1 within an exercise
    pub set_number: u32,
    /// Lower bound of the rep range
    pub reps_min: u32,
    /// Upper bound of the rep range (`reps_min <= reps_max`)
    pub reps_max: u32,
}

/// A catalog candidate resolved for an extracted exercise name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMatch {
    /// Catalog id of the matched exercise
    pub exercise_id: Uuid,
    /// Canonical catalog name
    pub exercise_name: String,
    /// The extracted phrase this match was resolved from
    pub original_text: String,
    /// Similarity score in [0, 1]
    pub confidence: f64,
    /// Tier derived from the score
    pub confidence_level: ConfidenceLevel,
    /// Primary muscle groups from the catalog entry
    pub primary_muscle_groups: Vec<MuscleGroup>,
    /// Secondary muscle groups from the catalog entry
    pub secondary_muscle_groups: Vec<MuscleGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> MatcherConfig {
        MatcherConfig::default()
    }

    #[test]
    fn test_confidence_level_boundaries() {
        let t = thresholds();
        assert_eq!(
            ConfidenceLevel::from_score(1.0, &t),
            Some(ConfidenceLevel::High)
        );
        assert_eq!(
            ConfidenceLevel::from_score(0.90, &t),
            Some(ConfidenceLevel::High)
        );
        assert_eq!(
            ConfidenceLevel::from_score(0.85, &t),
            Some(ConfidenceLevel::Medium)
        );
        assert_eq!(
            ConfidenceLevel::from_score(0.80, &t),
            Some(ConfidenceLevel::Medium)
        );
        assert_eq!(
            ConfidenceLevel::from_score(0.70, &t),
            Some(ConfidenceLevel::Low)
        );
        assert_eq!(ConfidenceLevel::from_score(0.699, &t), None);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!ImportStatus::Pending.is_terminal());
        assert!(!ImportStatus::Processing.is_terminal());
        assert!(ImportStatus::Completed.is_terminal());
        assert!(ImportStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            ImportStatus::Pending,
            ImportStatus::Processing,
            ImportStatus::Completed,
            ImportStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ImportStatus>(), Ok(status));
        }
        assert!("stalled".parse::<ImportStatus>().is_err());
    }
}
