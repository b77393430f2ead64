//! Ordering completed solutions.
//!
//! Ranking is a comparator over solutions, supplied by the host. The
//! search sorts with a stable sort, so ties keep exploration order.

use std::cmp::{Ordering, Reverse};

use kea_types::Type;

use crate::config::SearchConfig;
use crate::judgment::Judgment;
use crate::search::Solution;

pub trait Ranking<E> {
    /// `Less` means `a` is the better solution for `root`.
    fn compare(&self, root: &Judgment<Type>, a: &Solution<E>, b: &Solution<E>) -> Ordering;
}

impl<E, F> Ranking<E> for F
where
    F: Fn(&Judgment<Type>, &Solution<E>, &Solution<E>) -> Ordering,
{
    fn compare(&self, root: &Judgment<Type>, a: &Solution<E>, b: &Solution<E>) -> Ordering {
        self(root, a, b)
    }
}

/// The lexicographic score used by [`DefaultRanking`]. Lower is better.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SolutionScore {
    pub holes: usize,
    /// Top-level parameters the solution never touches.
    pub unused_top: usize,
    pub recursion: u64,
    pub ambient_used: usize,
    pub local_used: Reverse<usize>,
    /// Values bound by the solution but never used.
    pub unused_introduced: usize,
    pub trace_size: usize,
}

/// Prefers complete solutions that use every parameter, recurse little,
/// lean on local values over module functions, and explain themselves in
/// few steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRanking {
    pub recursion_weight: u32,
}

impl Default for DefaultRanking {
    fn default() -> Self {
        Self {
            recursion_weight: 1,
        }
    }
}

impl DefaultRanking {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            recursion_weight: config.recursion_weight,
        }
    }

    pub fn score<E>(&self, root: &Judgment<Type>, solution: &Solution<E>) -> SolutionScore {
        let state = &solution.state;
        let ambient_used = state
            .used_vals()
            .iter()
            .filter(|name| root.is_ambient(name))
            .count();
        SolutionScore {
            holes: solution.unsolved.len(),
            unused_top: if root.is_top_hole() {
                state.unused_top_vals().len()
            } else {
                0
            },
            recursion: u64::from(state.recursion_penalty()) * u64::from(self.recursion_weight),
            ambient_used,
            local_used: Reverse(state.used_vals().len() - ambient_used),
            unused_introduced: state.intro_vals().difference(state.used_vals()).count(),
            trace_size: solution.trace.size(),
        }
    }
}

impl<E> Ranking<E> for DefaultRanking {
    fn compare(&self, root: &Judgment<Type>, a: &Solution<E>, b: &Solution<E>) -> Ordering {
        self.score(root, a).cmp(&self.score(root, b))
    }
}
