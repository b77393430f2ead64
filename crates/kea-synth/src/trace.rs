//! Explanation traces and the opt-in search step log.
//!
//! A [`Trace`] records which tactics produced an extract. It is a monoid
//! (see [`Trace::combine`]) and is purely observational: the search never
//! branches on it.
//!
//! The step log is the search-level analogue of Kea's unifier tracing. It
//! is opt-in via `Synthesizer::enable_step_log()` and costs nothing when
//! disabled.

use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Explanation trace
// ---------------------------------------------------------------------------

/// A rose tree of tactic labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub label: String,
    pub children: Vec<Trace>,
}

impl Trace {
    /// The identity: no label, no children.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Build a node, splicing in a lone unlabelled child.
    pub fn rose(label: impl Into<String>, mut children: Vec<Trace>) -> Self {
        if children.len() == 1 && children[0].label.is_empty() {
            children = std::mem::take(&mut children[0].children);
        }
        Self {
            label: label.into(),
            children,
        }
    }

    /// Concatenate labels and child lists.
    pub fn combine(mut self, other: Trace) -> Self {
        self.label.push_str(&other.label);
        self.children.extend(other.children);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.children.is_empty()
    }

    /// Number of labelled nodes.
    pub fn size(&self) -> usize {
        usize::from(!self.label.is_empty()) + self.children.iter().map(Trace::size).sum::<usize>()
    }

    /// Labels in pre-order, unlabelled nodes skipped.
    pub fn labels(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels<'a>(&'a self, out: &mut Vec<&'a str>) {
        if !self.label.is_empty() {
            out.push(&self.label);
        }
        for child in &self.children {
            child.collect_labels(out);
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let depth = if self.label.is_empty() {
            depth
        } else {
            writeln!(f, "{:indent$}{}", "", self.label, indent = depth * 2)?;
            depth + 1
        };
        for child in &self.children {
            child.render(f, depth)?;
        }
        Ok(())
    }
}

impl Sum for Trace {
    fn sum<I: Iterator<Item = Trace>>(iter: I) -> Self {
        iter.fold(Trace::empty(), Trace::combine)
    }
}

/// One labelled line per node, children indented two spaces.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

// ---------------------------------------------------------------------------
// Step log
// ---------------------------------------------------------------------------

/// A single step in a search log.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStep {
    pub step: usize,
    pub action: SearchAction,
    /// The goal the step worked on, rendered.
    pub goal: String,
    pub detail: String,
}

/// What happened at a search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchAction {
    /// A rule proposed a continuation.
    Apply,
    /// An alternative failed and was abandoned.
    Prune,
    /// The budget ran out; the goal was left open.
    Cutoff,
    /// A solution was extracted at the root.
    Extract,
}
