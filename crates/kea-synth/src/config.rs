//! Search configuration supplied by the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds and policy for one synthesis request.
///
/// Missing fields take their defaults when deserialized, so a host config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of rule applications before the search is cut off.
    pub max_nodes: usize,
    /// Wall-clock budget in milliseconds. `None`, the default, leaves the
    /// node budget as the only bound, so results do not depend on load.
    pub timeout_ms: Option<u64>,
    /// Multiplier for the recursion penalty in the default ranking.
    pub recursion_weight: u32,
    /// Whether case analysis on hypotheses may fire at the root.
    pub enable_destruct: bool,
    /// Whether the goal may be split into data constructors at the root.
    pub enable_split: bool,
    /// Bound on the number of ranked solutions returned.
    pub max_solutions: usize,
    /// Bound on the number of distinct pruning reasons retained.
    pub max_errors: usize,
    /// Seed for the unique-id source.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_nodes: 10_000,
            timeout_ms: None,
            recursion_weight: 1,
            enable_destruct: true,
            enable_split: true,
            max_solutions: 20,
            max_errors: 50,
            seed: 0,
        }
    }
}

impl SearchConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    pub fn with_recursion_weight(mut self, weight: u32) -> Self {
        self.recursion_weight = weight;
        self
    }

    pub fn with_destruct(mut self, enabled: bool) -> Self {
        self.enable_destruct = enabled;
        self
    }

    pub fn with_split(mut self, enabled: bool) -> Self {
        self.enable_split = enabled;
        self
    }

    pub fn with_max_solutions(mut self, max_solutions: usize) -> Self {
        self.max_solutions = max_solutions;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
