//! Tactic-based hole synthesis for Kea.
//!
//! Given a typed hole (a goal type and the bindings in scope) the engine
//! searches backwards for a program fragment that inhabits it. Search is
//! driven by [`Tactic`]s, explicit trees of primitive [`Rule`]s and
//! combinators. Each rule application replaces one [`Judgment`] with zero
//! or more smaller ones; the [`Synthesizer`] explores alternatives
//! depth-first with a forked [`SearchState`] per branch, prunes failures,
//! and extracts every surviving derivation into a fragment plus an
//! explanation [`Trace`].
//!
//! The concrete rule library lives in `kea-tactics`. This crate only knows
//! the substrate those rules run on.

pub mod config;
pub mod context;
pub mod error;
pub mod judgment;
pub mod ranking;
pub mod recursion;
pub mod search;
pub mod state;
pub mod tactic;
pub mod trace;

pub use config::SearchConfig;
pub use context::Context;
pub use error::{SynthError, TacticError};
pub use judgment::{Judgment, JudgmentParts};
pub use ranking::{DefaultRanking, Ranking, SolutionScore};
pub use recursion::{RECURSION_COST, RecursiveCall};
pub use search::{
    RunResult, SearchOutcome, Solution, Synthesizer, exploration_order, synthesize,
    synthesize_with,
};
pub use state::{SearchState, Unique, UniqueSource};
pub use tactic::{Alternative, Assemble, Fragment, JudgmentMap, Proposal, Rule, Tactic};
pub use trace::{SearchAction, SearchStep, Trace};
