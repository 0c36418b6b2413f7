// ABOUTME: Domain service layer for the import pipeline
// ABOUTME: Protocol-agnostic orchestration reusable behind any hosting API surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

//! Domain service layer.
//!
//! The hosting application wires these services behind its own routing and
//! auth; the pipeline itself is transport-agnostic.

/// Import orchestration: job creation, the detached worker, polling, linkage
pub mod import_pipeline;

pub use import_pipeline::{ImportService, ImportStatusView};
