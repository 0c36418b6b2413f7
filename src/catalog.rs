// ABOUTME: Read-only exercise catalog abstraction consumed by the import pipeline
// ABOUTME: The catalog is an external collaborator; a static snapshot backs tests and embedding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! # Exercise Catalog
//!
//! The reference set of known exercises used as the matching target. The
//! pipeline never mutates the catalog: it takes an immutable snapshot once
//! per job and passes it into the matcher as a parameter, keeping the matcher
//! trivially unit-testable with synthetic catalogs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MuscleGroup;

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogExercise {
    /// Stable catalog id
    pub id: Uuid,
    /// Canonical exercise name
    pub name: String,
    /// Primary muscle groups
    pub primary_muscle_groups: Vec<MuscleGroup>,
    /// Secondary muscle groups
    pub secondary_muscle_groups: Vec<MuscleGroup>,
}

impl CatalogExercise {
    /// Create a catalog entry with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>, primary: Vec<MuscleGroup>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            primary_muscle_groups: primary,
            secondary_muscle_groups: Vec::new(),
        }
    }

    /// Add secondary muscle groups
    #[must_use]
    pub fn with_secondary(mut self, secondary: Vec<MuscleGroup>) -> Self {
        self.secondary_muscle_groups = secondary;
        self
    }
}

/// Source of catalog snapshots, called once per import job at matching time
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// List all known exercises
    async fn list_exercises(&self) -> anyhow::Result<Vec<CatalogExercise>>;
}

/// Fixed in-memory catalog snapshot
pub struct StaticCatalog {
    exercises: Vec<CatalogExercise>,
}

impl StaticCatalog {
    /// Create a catalog from a fixed set of entries
    #[must_use]
    pub fn new(exercises: Vec<CatalogExercise>) -> Self {
        Self { exercises }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn list_exercises(&self) -> anyhow::Result<Vec<CatalogExercise>> {
        Ok(self.exercises.clone())
    }
}
