// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fatal error conditions and the diagnostics counters that stand in for
//! exceptions on recoverable geometric anomalies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only conditions that actually abort a pipeline call: programming
/// errors, not geometry. Everything else recoverable is folded into
/// [`Diagnostics`] instead of raised.
#[derive(Debug, Error, PartialEq)]
pub enum IntersectionError {
    #[error("triangle list is empty")]
    EmptyTriangleList,
    #[error("tolerance field `{field}` must be > 0, got {value}")]
    InvalidTolerance { field: &'static str, value: f64 },
}

/// Counters for recoverable anomalies encountered while running a stage.
/// Every stage's output carries one of these next to its data, per the
/// "no exceptions for geometric anomalies" propagation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Input triangle was zero-area and was skipped.
    pub degenerate_triangles: u64,
    /// A barycentric computation hit a zero denominator; the candidate
    /// sample was discarded.
    pub degenerate_barycentric: u64,
    /// A pair was classified Segment/Area but produced fewer unique points
    /// than required, so its kind was degraded.
    pub degraded_pairs: u64,
    /// A StrongLoopCandidate component could not yield an Eulerian cycle
    /// and was downgraded to Ambiguous.
    pub unregularizable_components: u64,
}

impl Diagnostics {
    pub fn merge(&mut self, other: &Diagnostics) {
        self.degenerate_triangles += other.degenerate_triangles;
        self.degenerate_barycentric += other.degenerate_barycentric;
        self.degraded_pairs += other.degraded_pairs;
        self.unregularizable_components += other.unregularizable_components;
    }
}
