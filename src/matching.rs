// ABOUTME: Fuzzy exercise matcher resolving extracted names against a catalog snapshot
// ABOUTME: Token-sort similarity with tiered confidence thresholds and ranked alternatives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Exercise Matcher
//!
//! Resolves a free-text exercise name against a catalog snapshot using
//! token-order-insensitive string similarity: both names are lowercased,
//! split into tokens, sorted, rejoined, and compared with normalized
//! Levenshtein similarity. "press bench" therefore scores identically to
//! "bench press".
//!
//! The scan is O(catalog x name length), which is fine at catalog scale
//! (tens to low thousands of rows); no index structure is kept.
//!
//! Three fixed thresholds order the outcome: scores at or above the high
//! threshold are high confidence, then medium, then low; candidates below
//! the low floor are discarded entirely and never offered as alternatives.

use std::cmp::Ordering;

use crate::catalog::CatalogExercise;
use crate::config::MatcherConfig;
use crate::models::ConfidenceLevel;

/// One scored catalog candidate
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// The catalog entry
    pub exercise: CatalogExercise,
    /// Similarity score in [0, 1]
    pub score: f64,
}

/// Outcome of one lookup
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Top candidate, present only when it cleared the low floor
    pub best: Option<ScoredCandidate>,
    /// Score of the top candidate regardless of whether it cleared the floor
    pub best_score: f64,
    /// Next-best candidates above the floor, descending score
    pub alternatives: Vec<ScoredCandidate>,
}

/// Fuzzy exercise matcher
#[derive(Debug, Clone)]
pub struct ExerciseMatcher {
    config: MatcherConfig,
}

impl ExerciseMatcher {
    /// Create a matcher with the given thresholds
    #[must_use]
    pub const fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// The configured thresholds
    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match an exercise name against a catalog snapshot.
    ///
    /// Returns the best candidate (when it clears the low floor), its raw
    /// score, and up to `top_n - 1` alternatives above the floor. Ties are
    /// broken by catalog order; an empty catalog yields no candidates.
    #[must_use]
    pub fn match_exercise(
        &self,
        text: &str,
        catalog: &[CatalogExercise],
        top_n: usize,
    ) -> MatchOutcome {
        let mut scored: Vec<(usize, f64)> = catalog
            .iter()
            .enumerate()
            .map(|(index, exercise)| (index, token_sort_ratio(text, &exercise.name)))
            .collect();

        // Stable sort keeps catalog order for equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let Some(&(best_index, best_score)) = scored.first() else {
            return MatchOutcome {
                best: None,
                best_score: 0.0,
                alternatives: Vec::new(),
            };
        };

        let best = (best_score >= self.config.low_threshold).then(|| ScoredCandidate {
            exercise: catalog[best_index].clone(),
            score: best_score,
        });

        // When the best candidate missed the floor every later one did too
        let skip = usize::from(best.is_some());
        let alternatives = scored
            .iter()
            .skip(skip)
            .take(top_n.saturating_sub(1))
            .filter(|&&(_, score)| score >= self.config.low_threshold)
            .map(|&(index, score)| ScoredCandidate {
                exercise: catalog[index].clone(),
                score,
            })
            .collect();

        MatchOutcome {
            best,
            best_score,
            alternatives,
        }
    }

    /// Classify a score against the configured thresholds
    #[must_use]
    pub fn confidence_level(&self, score: f64) -> Option<ConfidenceLevel> {
        ConfidenceLevel::from_score(score, &self.config)
    }
}

/// Token-order-insensitive similarity in [0, 1].
///
/// Lowercase, split on non-alphanumeric characters, sort tokens, rejoin,
/// then normalized Levenshtein similarity over the sorted forms.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&token_sort_key(a), &token_sort_key(b))
}

fn token_sort_key(text: &str) -> String {
    let mut tokens: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
