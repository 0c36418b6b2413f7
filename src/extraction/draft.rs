// ABOUTME: Strictly validated draft structure decoded from the extraction service response
// ABOUTME: Loose model output is rejected at this boundary, never propagated as untyped maps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! Draft types for decoded extraction output.
//!
//! The extraction service returns free-form JSON. These types pin down the
//! accepted shape and [`ExtractionDraft::validate`] enforces the structural
//! invariants (unique workout order, sane rep ranges, bounded confidence)
//! before the draft enters the matching stage.

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::SetConfig;

/// Fallback set scheme when the service omits set data entirely
const DEFAULT_SET_COUNT: u32 = 3;
const DEFAULT_REPS_MIN: u32 = 8;
const DEFAULT_REPS_MAX: u32 = 12;

fn default_plan_name() -> String {
    "Workout Plan".to_owned()
}

/// Top-level draft decoded from the extraction response
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionDraft {
    /// Plan name, defaulted when the text names none
    #[serde(default = "default_plan_name")]
    pub name: String,
    /// Optional plan description
    #[serde(default)]
    pub description: Option<String>,
    /// Extracted workouts
    pub workouts: Vec<DraftWorkout>,
}

/// One extracted workout
#[derive(Debug, Clone, Deserialize)]
pub struct DraftWorkout {
    /// Workout name
    pub name: String,
    /// Optional 1-based day number
    #[serde(default)]
    pub day_number: Option<u32>,
    /// Display order, unique across the plan
    pub order_index: u32,
    /// Extracted exercises
    #[serde(default)]
    pub exercises: Vec<DraftExercise>,
}

/// One extracted exercise
#[derive(Debug, Clone, Deserialize)]
pub struct DraftExercise {
    /// Verbatim phrase from the source text
    pub original_text: String,
    /// Catalog id when the service resolved the exercise itself
    #[serde(default)]
    pub exercise_id: Option<Uuid>,
    /// Self-reported match confidence accompanying `exercise_id`
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Either detailed per-set entries or a bare set count
    #[serde(default)]
    pub sets: Option<SetSpec>,
    /// Exercise-level rep range, used with a bare set count
    #[serde(default)]
    pub reps_min: Option<u32>,
    #[serde(default)]
    pub reps_max: Option<u32>,
    /// Single rep figure (min == max), used with a bare set count
    #[serde(default)]
    pub reps: Option<u32>,
    /// Optional rest between sets
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    /// Tempo, RPE, special instructions
    #[serde(default)]
    pub notes: Option<String>,
    /// 0-based position within the workout
    #[serde(default)]
    pub sequence: u32,
}

/// Set data in either accepted form
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SetSpec {
    /// One entry per set with explicit rep ranges
    Detailed(Vec<DraftSet>),
    /// A bare count, expanded into N identical sets
    Count(u32),
}

/// One explicit set entry
#[derive(Debug, Clone, Deserialize)]
pub struct DraftSet {
    pub reps_min: u32,
    pub reps_max: u32,
}

impl ExtractionDraft {
    /// Enforce structural invariants on the decoded draft.
    ///
    /// # Errors
    ///
    /// Returns an extraction error when `order_index` values collide, a rep
    /// range is inverted, an original text is blank, or a self-reported
    /// confidence leaves [0, 1].
    pub fn validate(&self) -> AppResult<()> {
        let mut seen_order = std::collections::HashSet::new();
        for workout in &self.workouts {
            if !seen_order.insert(workout.order_index) {
                return Err(AppError::extraction(format!(
                    "duplicate workout order_index {} in extracted plan",
                    workout.order_index
                )));
            }
            for exercise in &workout.exercises {
                exercise.validate(&workout.name)?;
            }
        }
        Ok(())
    }
}

impl DraftExercise {
    fn validate(&self, workout_name: &str) -> AppResult<()> {
        if self.original_text.trim().is_empty() {
            return Err(AppError::extraction(format!(
                "exercise with empty original_text in workout {workout_name:?}"
            )));
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(AppError::extraction(format!(
                    "confidence {confidence} out of range for {:?}",
                    self.original_text
                )));
            }
        }
        match &self.sets {
            Some(SetSpec::Detailed(sets)) => {
                for set in sets {
                    if set.reps_min > set.reps_max {
                        return Err(AppError::extraction(format!(
                            "inverted rep range {}-{} for {:?}",
                            set.reps_min, set.reps_max, self.original_text
                        )));
                    }
                }
            }
            Some(SetSpec::Count(_)) | None => {
                let (reps_min, reps_max) = self.rep_range();
                if reps_min > reps_max {
                    return Err(AppError::extraction(format!(
                        "inverted rep range {reps_min}-{reps_max} for {:?}",
                        self.original_text
                    )));
                }
            }
        }
        Ok(())
    }

    /// Exercise-level rep range used to expand a bare set count
    fn rep_range(&self) -> (u32, u32) {
        if let Some(reps) = self.reps {
            (reps, reps)
        } else {
            (
                self.reps_min.unwrap_or(DEFAULT_REPS_MIN),
                self.reps_max.unwrap_or(DEFAULT_REPS_MAX),
            )
        }
    }

    /// Expand the set data into numbered [`SetConfig`] entries.
    ///
    /// A bare count becomes N identical sets; missing or empty set data
    /// falls back to the default scheme so every exercise carries at least
    /// one set.
    #[must_use]
    pub fn set_configurations(&self) -> Vec<SetConfig> {
        let expand = |count: u32, reps_min: u32, reps_max: u32| {
            (1..=count)
                .map(|set_number| SetConfig {
                    set_number,
                    reps_min,
                    reps_max,
                })
                .collect::<Vec<_>>()
        };

        match &self.sets {
            Some(SetSpec::Detailed(sets)) if !sets.is_empty() => (1u32..)
                .zip(sets.iter())
                .map(|(set_number, set)| SetConfig {
                    set_number,
                    reps_min: set.reps_min,
                    reps_max: set.reps_max,
                })
                .collect(),
            Some(SetSpec::Count(count)) if *count > 0 => {
                let (reps_min, reps_max) = self.rep_range();
                expand(*count, reps_min, reps_max)
            }
            _ => expand(DEFAULT_SET_COUNT, DEFAULT_REPS_MIN, DEFAULT_REPS_MAX),
        }
    }
}
