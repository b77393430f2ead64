//! The search driver.
//!
//! [`Synthesizer`] walks a [`Tactic`] tree depth-first. Every choice point
//! produces an ordered list of outcomes, each carrying its own forked
//! [`SearchState`]; backtracking is just moving on to the next element.
//! Rule failures are recorded and pruned. Only malformed judgments abort
//! the walk, as [`SynthError`].
//!
//! A node budget and an optional deadline bound the walk. Once either is
//! spent, every goal not yet explored is left open, so whatever partial
//! derivations exist still extract (with holes) and the result is flagged
//! as timed out.

use std::cmp::Ordering;
use std::time::Instant;

use kea_diag::{Category, Diagnostic};
use kea_types::{Name, Type, free_type_vars};

use crate::config::SearchConfig;
use crate::context::Context;
use crate::error::{SynthError, TacticError};
use crate::judgment::Judgment;
use crate::ranking::{DefaultRanking, Ranking};
use crate::state::SearchState;
use crate::tactic::{Derivation, Fragment, Rule, Tactic};
use crate::trace::{SearchAction, SearchStep, Trace};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A completed root derivation, extracted.
#[derive(Debug, Clone)]
pub struct Solution<E> {
    pub trace: Trace,
    pub extract: E,
    pub state: SearchState,
    /// Goals left open, in left-to-right order. Each became a hole.
    pub unsolved: Vec<Judgment<Type>>,
}

/// The best solution of a root search and the ranked alternatives.
#[derive(Debug, Clone)]
pub struct RunResult<E> {
    pub trace: Trace,
    pub extract: E,
    pub state: SearchState,
    pub unsolved: Vec<Judgment<Type>>,
    /// Remaining solutions, best first, distinct from `extract` and each
    /// other.
    pub other_solutions: Vec<(Trace, E)>,
    pub timed_out: bool,
    /// Rule applications performed.
    pub nodes: usize,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome<E> {
    Found(RunResult<E>),
    /// The search space was exhausted (or the budget ran out) without any
    /// derivation surviving. `errors` holds the distinct pruning reasons in
    /// the order they were first seen.
    NoSolution {
        errors: Vec<TacticError>,
        timed_out: bool,
        nodes: usize,
    },
}

impl<E> SearchOutcome<E> {
    pub fn found(&self) -> Option<&RunResult<E>> {
        match self {
            SearchOutcome::Found(result) => Some(result),
            SearchOutcome::NoSolution { .. } => None,
        }
    }

    pub fn into_found(self) -> Option<RunResult<E>> {
        match self {
            SearchOutcome::Found(result) => Some(result),
            SearchOutcome::NoSolution { .. } => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        match self {
            SearchOutcome::Found(result) => result.timed_out,
            SearchOutcome::NoSolution { timed_out, .. } => *timed_out,
        }
    }

    /// What a host should tell the user about this outcome. A complete
    /// solution found within budget produces nothing.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        match self {
            SearchOutcome::Found(result) => {
                if result.timed_out {
                    out.push(
                        Diagnostic::warning(
                            Category::SearchCutoff,
                            format!("search stopped after {} nodes", result.nodes),
                        )
                        .with_note("the result may be partial"),
                    );
                }
                if !result.unsolved.is_empty() {
                    let diag = Diagnostic::info(
                        Category::UnsolvedGoal,
                        format!("{} hole(s) left in the result", result.unsolved.len()),
                    );
                    out.push(result.unsolved.iter().fold(diag, |diag, goal| {
                        diag.with_note(format!("open goal: {}", goal.goal()))
                    }));
                }
            }
            SearchOutcome::NoSolution {
                errors, timed_out, ..
            } => {
                let message = if *timed_out {
                    "no solution found before the search budget ran out"
                } else {
                    "no program fragment fills this hole"
                };
                let diag = errors
                    .iter()
                    .fold(Diagnostic::error(Category::NoSolution, message), |diag, err| {
                        diag.with_note(err.to_string())
                    });
                out.push(match errors.first() {
                    Some(first) => diag.with_help(help_for(first.category())),
                    None => diag,
                });
            }
        }
        out
    }
}

fn help_for(category: Category) -> &'static str {
    match category {
        Category::UndefinedName => "bring the missing name into scope",
        Category::TypeMismatch | Category::NoProgress => {
            "add a hypothesis or function that produces the goal type"
        }
        Category::Termination => "recurse on a value obtained by case analysis",
        Category::TooPolymorphic => "annotate the hole with a more specific type",
        Category::SearchCutoff => "raise the node or time budget",
        _ => "try a different tactic or fill part of the hole by hand",
    }
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

struct Budget {
    max_nodes: usize,
    deadline: Option<Instant>,
    nodes: usize,
    spent: bool,
}

impl Budget {
    fn new(config: &SearchConfig) -> Self {
        Self {
            max_nodes: config.max_nodes,
            deadline: config.timeout().and_then(|t| Instant::now().checked_add(t)),
            nodes: 0,
            spent: false,
        }
    }

    /// Latches: once spent, stays spent.
    fn is_spent(&mut self) -> bool {
        if !self.spent {
            self.spent = self.nodes >= self.max_nodes
                || self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        }
        self.spent
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// One surviving branch: its state and its partial derivation.
struct Outcome<E> {
    state: SearchState,
    derivation: Derivation<E>,
}

impl<E> Outcome<E> {
    fn open(state: SearchState, goal: &Judgment<Type>) -> Self {
        Self {
            state,
            derivation: Derivation::Open(goal.clone()),
        }
    }
}

/// Drives one root search. Not reusable across requests: the budget and
/// the pruning record belong to a single root.
pub struct Synthesizer<'a> {
    context: &'a Context,
    config: &'a SearchConfig,
    budget: Budget,
    errors: Vec<TacticError>,
    cutoff_reported: bool,
    steps: Option<Vec<SearchStep>>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(context: &'a Context, config: &'a SearchConfig) -> Self {
        Self {
            context,
            config,
            budget: Budget::new(config),
            errors: Vec::new(),
            cutoff_reported: false,
            steps: None,
        }
    }

    /// Record every search step. Off by default.
    pub fn enable_step_log(&mut self) {
        self.steps = Some(Vec::new());
    }

    pub fn steps(&self) -> &[SearchStep] {
        self.steps.as_deref().unwrap_or_default()
    }

    pub fn nodes(&self) -> usize {
        self.budget.nodes
    }

    /// Apply the configured structural policy to `root`, run `tactic` on it,
    /// and rank what survives.
    pub fn search<E, R>(
        &mut self,
        root: Judgment<Type>,
        tactic: &Tactic<E>,
        ranking: &R,
    ) -> Result<SearchOutcome<E>, SynthError>
    where
        E: Fragment,
        R: Ranking<E> + ?Sized,
    {
        let root = self.apply_policy(root);
        root.validate()?;

        // Variables of the goal and the local hypothesis are rigid. Ambient
        // and context functions are instantiated afresh at each use.
        let mut skolems: Vec<_> = free_type_vars(root.goal()).into_iter().collect();
        for (_, ty) in root.local_hypothesis() {
            skolems.extend(free_type_vars(ty));
        }
        let mut mentioned: Vec<_> = root.hypothesis().values().flat_map(free_type_vars).collect();
        for (_, ty) in self.context.defining_funcs().iter().chain(self.context.module_funcs()) {
            mentioned.extend(free_type_vars(ty));
        }
        let unused_top: std::collections::BTreeSet<Name> = if root.is_top_hole() {
            root.local_hypothesis().map(|(name, _)| name.clone()).collect()
        } else {
            Default::default()
        };
        let state = SearchState::initial(self.config.seed)
            .with_skolems(skolems.iter().copied())
            .reserve_type_vars(skolems.into_iter().chain(mentioned))
            .with_unused_top_vals(|_| unused_top);

        let outcomes = self.run(tactic, &root, state)?;
        let timed_out = self.budget.spent;
        let nodes = self.budget.nodes;

        let mut solutions: Vec<Solution<E>> = outcomes
            .into_iter()
            .map(|outcome| {
                let (trace, extract, unsolved) = outcome.derivation.extract();
                Solution {
                    trace,
                    extract,
                    state: outcome.state,
                    unsolved,
                }
            })
            .collect();
        solutions.sort_by(|a, b| ranking.compare(&root, a, b));
        let mut distinct: Vec<Solution<E>> = Vec::new();
        for solution in solutions {
            if distinct.len() >= self.config.max_solutions.max(1) {
                break;
            }
            if !distinct.iter().any(|kept| kept.extract == solution.extract) {
                distinct.push(solution);
            }
        }

        let mut ranked = distinct.into_iter();
        let Some(best) = ranked.next() else {
            tracing::debug!(nodes, timed_out, errors = self.errors.len(), "no solution");
            return Ok(SearchOutcome::NoSolution {
                errors: std::mem::take(&mut self.errors),
                timed_out,
                nodes,
            });
        };
        self.record(SearchAction::Extract, &root, || format!("{} hole(s)", best.unsolved.len()));
        let other_solutions: Vec<(Trace, E)> = ranked.map(|s| (s.trace, s.extract)).collect();
        tracing::debug!(
            nodes,
            timed_out,
            alternatives = other_solutions.len(),
            holes = best.unsolved.len(),
            "search complete"
        );
        Ok(SearchOutcome::Found(RunResult {
            trace: best.trace,
            extract: best.extract,
            state: best.state,
            unsolved: best.unsolved,
            other_solutions,
            timed_out,
            nodes,
        }))
    }

    fn apply_policy(&self, root: Judgment<Type>) -> Judgment<Type> {
        let root = if self.config.enable_destruct {
            root
        } else {
            root.disallow_destruct()
        };
        if self.config.enable_split {
            root
        } else {
            root.restrict_split()
        }
    }

    fn run<E: Fragment>(
        &mut self,
        tactic: &Tactic<E>,
        goal: &Judgment<Type>,
        state: SearchState,
    ) -> Result<Vec<Outcome<E>>, SynthError> {
        if self.budget.is_spent() {
            self.cutoff(goal);
            return Ok(vec![Outcome::open(state, goal)]);
        }
        match tactic {
            Tactic::Skip => Ok(vec![Outcome::open(state, goal)]),
            Tactic::Fail(err) => {
                self.prune(goal, err.clone());
                Ok(Vec::new())
            }
            Tactic::Rule(rule) => self.apply_rule(rule.as_ref(), goal, state),
            Tactic::Then(first, next) => self.run_then(first, next, goal, state),
            Tactic::Or(left, right) => {
                let mut out = self.run(left, goal, state.clone())?;
                out.extend(self.run(right, goal, state)?);
                Ok(out)
            }
            Tactic::First(left, right) => {
                let out = self.run(left, goal, state.clone())?;
                if out.is_empty() {
                    self.run(right, goal, state)
                } else {
                    Ok(out)
                }
            }
            Tactic::Choice(tactics) => {
                if tactics.is_empty() {
                    self.prune(goal, TacticError::NoApplicableTactic);
                    return Ok(Vec::new());
                }
                let mut out = Vec::new();
                for tactic in tactics {
                    out.extend(self.run(tactic, goal, state.clone())?);
                }
                Ok(out)
            }
            Tactic::Repeat { fuel, body } => {
                if *fuel == 0 {
                    self.prune(goal, TacticError::NoProgress);
                    return Ok(Vec::new());
                }
                let rest = Tactic::Repeat {
                    fuel: fuel - 1,
                    body: body.clone(),
                };
                self.run_then(body, &rest, goal, state)
            }
            Tactic::Complete(inner) => {
                let mut out = Vec::new();
                for outcome in self.run(inner, goal, state)? {
                    let open = outcome.derivation.open_goals();
                    if open.is_empty() {
                        out.push(outcome);
                    } else {
                        self.prune(goal, TacticError::UnsolvedSubgoals(open));
                    }
                }
                Ok(out)
            }
            Tactic::Local(f, inner) => {
                let local = f(goal.clone());
                local.validate()?;
                self.run(inner, &local, state)
            }
            Tactic::Traced(label, inner) => Ok(self
                .run(inner, goal, state)?
                .into_iter()
                .map(|outcome| Outcome {
                    state: outcome.state,
                    derivation: outcome.derivation.labelled(label),
                })
                .collect()),
        }
    }

    /// `first`, then `next` on every goal it leaves open.
    fn run_then<E: Fragment>(
        &mut self,
        first: &Tactic<E>,
        next: &Tactic<E>,
        goal: &Judgment<Type>,
        state: SearchState,
    ) -> Result<Vec<Outcome<E>>, SynthError> {
        let mut out = Vec::new();
        for outcome in self.run(first, goal, state)? {
            let open = outcome.derivation.open_goals();
            for (state, leaves) in self.run_each(next, &open, outcome.state)? {
                out.push(Outcome {
                    state,
                    derivation: outcome.derivation.clone().fill(&mut leaves.into_iter()),
                });
            }
        }
        Ok(out)
    }

    /// Solve `goals` left to right, threading state from each goal's
    /// solution into the next. Returns one entry per combination of
    /// alternatives, in exploration order.
    fn run_each<E: Fragment>(
        &mut self,
        tactic: &Tactic<E>,
        goals: &[Judgment<Type>],
        state: SearchState,
    ) -> Result<Vec<(SearchState, Vec<Derivation<E>>)>, SynthError> {
        let mut partial = vec![(state, Vec::with_capacity(goals.len()))];
        for goal in goals {
            let mut extended = Vec::new();
            for (state, done) in partial {
                for outcome in self.run(tactic, goal, state)? {
                    let mut done = done.clone();
                    done.push(outcome.derivation);
                    extended.push((outcome.state, done));
                }
            }
            if extended.is_empty() {
                return Ok(Vec::new());
            }
            partial = extended;
        }
        Ok(partial)
    }

    fn apply_rule<E: Fragment>(
        &mut self,
        rule: &dyn Rule<E>,
        goal: &Judgment<Type>,
        state: SearchState,
    ) -> Result<Vec<Outcome<E>>, SynthError> {
        self.budget.nodes += 1;
        let mut out = Vec::new();
        for alternative in rule.apply(self.context, goal, &state) {
            match alternative {
                Ok(proposal) => {
                    for subgoal in &proposal.subgoals {
                        subgoal.validate()?;
                    }
                    tracing::debug!(
                        rule = rule.name(),
                        label = %proposal.label,
                        subgoals = proposal.subgoals.len(),
                        "rule applied"
                    );
                    self.record(SearchAction::Apply, goal, || proposal.label.clone());
                    out.push(Outcome {
                        state: proposal.state,
                        derivation: Derivation::Step {
                            label: proposal.label,
                            assemble: proposal.assemble,
                            children: proposal.subgoals.into_iter().map(Derivation::Open).collect(),
                        },
                    });
                }
                Err(err) => self.prune(goal, err),
            }
        }
        Ok(out)
    }

    fn prune(&mut self, goal: &Judgment<Type>, err: TacticError) {
        tracing::trace!(goal = %goal.goal(), reason = %err, "alternative pruned");
        self.record(SearchAction::Prune, goal, || err.to_string());
        if self.errors.len() < self.config.max_errors && !self.errors.contains(&err) {
            self.errors.push(err);
        }
    }

    fn cutoff(&mut self, goal: &Judgment<Type>) {
        if !self.cutoff_reported {
            self.cutoff_reported = true;
            tracing::warn!(
                nodes = self.budget.nodes,
                "search budget exhausted; remaining goals left open"
            );
        }
        self.record(SearchAction::Cutoff, goal, || "left open".to_string());
    }

    fn record(&mut self, action: SearchAction, goal: &Judgment<Type>, detail: impl FnOnce() -> String) {
        if let Some(steps) = &mut self.steps {
            steps.push(SearchStep {
                step: steps.len(),
                action,
                goal: goal.goal().to_string(),
                detail: detail(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Fill `root` with `tactic`, ranking with [`DefaultRanking`].
pub fn synthesize<E: Fragment>(
    context: &Context,
    config: &SearchConfig,
    root: Judgment<Type>,
    tactic: &Tactic<E>,
) -> Result<SearchOutcome<E>, SynthError> {
    synthesize_with(context, config, root, tactic, &DefaultRanking::from_config(config))
}

pub fn synthesize_with<E, R>(
    context: &Context,
    config: &SearchConfig,
    root: Judgment<Type>,
    tactic: &Tactic<E>,
    ranking: &R,
) -> Result<SearchOutcome<E>, SynthError>
where
    E: Fragment,
    R: Ranking<E> + ?Sized,
{
    Synthesizer::new(context, config).search(root, tactic, ranking)
}

/// Ranking that keeps exploration order.
pub fn exploration_order<E>(_: &Judgment<Type>, _: &Solution<E>, _: &Solution<E>) -> Ordering {
    Ordering::Equal
}
