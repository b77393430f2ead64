//! Rules, tactics, and the derivations they build.
//!
//! A [`Rule`] is the primitive step: given one judgment it proposes zero or
//! more ways to make progress, each a [`Proposal`] carrying the state after
//! the step, the sub-goals left to solve, and how to assemble their
//! fragments into the parent's. A [`Tactic`] is an explicit tree of rules
//! and combinators that the search walks; nothing here runs on its own.

use std::fmt;
use std::sync::Arc;

use kea_ast::Expr;
use kea_types::Type;

use crate::context::Context;
use crate::error::TacticError;
use crate::judgment::Judgment;
use crate::state::SearchState;

/// A program fragment the search can produce. The engine only clones,
/// compares, and assembles fragments; it never looks inside.
pub trait Fragment: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The placeholder extracted for a goal left open.
    fn hole() -> Self;
}

impl Fragment for Expr {
    fn hole() -> Self {
        Expr::Hole
    }
}

/// Builds a parent fragment from its sub-goals' fragments, in order.
pub type Assemble<E> = Arc<dyn Fn(Vec<E>) -> E + Send + Sync>;

/// Rewrites the judgment an inner tactic sees.
pub type JudgmentMap = Arc<dyn Fn(Judgment<Type>) -> Judgment<Type> + Send + Sync>;

/// One way a rule can make progress on a goal.
pub struct Proposal<E> {
    pub label: String,
    pub state: SearchState,
    pub subgoals: Vec<Judgment<Type>>,
    pub assemble: Assemble<E>,
}

impl<E: Fragment> Proposal<E> {
    pub fn new(
        label: impl Into<String>,
        state: SearchState,
        subgoals: Vec<Judgment<Type>>,
        assemble: impl Fn(Vec<E>) -> E + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            state,
            subgoals,
            assemble: Arc::new(assemble),
        }
    }

    /// A proposal that discharges the goal outright.
    pub fn closed(label: impl Into<String>, state: SearchState, extract: E) -> Self {
        Self::new(label, state, Vec::new(), move |_| extract.clone())
    }
}

impl<E> fmt::Debug for Proposal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proposal")
            .field("label", &self.label)
            .field("subgoals", &self.subgoals.len())
            .finish_non_exhaustive()
    }
}

/// The outcome of one rule alternative.
pub type Alternative<E> = Result<Proposal<E>, TacticError>;

/// A primitive, possibly nondeterministic, reasoning step.
///
/// `apply` returns its alternatives in the order the search should try
/// them. A failed alternative prunes only itself. Rules must not keep
/// state of their own: everything they learn goes into the proposal's
/// [`SearchState`].
pub trait Rule<E>: Send + Sync {
    fn name(&self) -> &str;

    fn apply(
        &self,
        context: &Context,
        goal: &Judgment<Type>,
        state: &SearchState,
    ) -> Vec<Alternative<E>>;
}

type RuleFn<E> = dyn Fn(&Context, &Judgment<Type>, &SearchState) -> Vec<Alternative<E>> + Send + Sync;

struct FnRule<E> {
    name: String,
    apply: Box<RuleFn<E>>,
}

impl<E> Rule<E> for FnRule<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        context: &Context,
        goal: &Judgment<Type>,
        state: &SearchState,
    ) -> Vec<Alternative<E>> {
        (self.apply)(context, goal, state)
    }
}

/// A tactic: an explicit search tree over rules.
pub enum Tactic<E> {
    /// Leave the goal open.
    Skip,
    /// Prune with the given reason.
    Fail(TacticError),
    Rule(Arc<dyn Rule<E>>),
    /// Run the second tactic on every goal the first leaves open.
    Then(Box<Tactic<E>>, Box<Tactic<E>>),
    /// Every alternative of the left, then every alternative of the right.
    Or(Box<Tactic<E>>, Box<Tactic<E>>),
    /// The right only if the left produced nothing.
    First(Box<Tactic<E>>, Box<Tactic<E>>),
    Choice(Vec<Tactic<E>>),
    /// Apply `body` to each open goal, up to `fuel` times deep. Running out
    /// of fuel with a goal still open fails with `NoProgress`.
    Repeat { fuel: usize, body: Box<Tactic<E>> },
    /// Drop outcomes that leave goals open.
    Complete(Box<Tactic<E>>),
    Local(JudgmentMap, Box<Tactic<E>>),
    Traced(String, Box<Tactic<E>>),
}

impl<E> Clone for Tactic<E> {
    fn clone(&self) -> Self {
        match self {
            Tactic::Skip => Tactic::Skip,
            Tactic::Fail(err) => Tactic::Fail(err.clone()),
            Tactic::Rule(rule) => Tactic::Rule(Arc::clone(rule)),
            Tactic::Then(a, b) => Tactic::Then(a.clone(), b.clone()),
            Tactic::Or(a, b) => Tactic::Or(a.clone(), b.clone()),
            Tactic::First(a, b) => Tactic::First(a.clone(), b.clone()),
            Tactic::Choice(ts) => Tactic::Choice(ts.clone()),
            Tactic::Repeat { fuel, body } => Tactic::Repeat {
                fuel: *fuel,
                body: body.clone(),
            },
            Tactic::Complete(t) => Tactic::Complete(t.clone()),
            Tactic::Local(f, t) => Tactic::Local(Arc::clone(f), t.clone()),
            Tactic::Traced(label, t) => Tactic::Traced(label.clone(), t.clone()),
        }
    }
}

impl<E> fmt::Debug for Tactic<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tactic::Skip => write!(f, "skip"),
            Tactic::Fail(err) => write!(f, "fail({err})"),
            Tactic::Rule(rule) => write!(f, "{}", rule.name()),
            Tactic::Then(a, b) => write!(f, "({a:?} ; {b:?})"),
            Tactic::Or(a, b) => write!(f, "({a:?} <|> {b:?})"),
            Tactic::First(a, b) => write!(f, "first({a:?}, {b:?})"),
            Tactic::Choice(ts) => f.debug_list().entries(ts).finish(),
            Tactic::Repeat { fuel, body } => write!(f, "repeat[{fuel}]({body:?})"),
            Tactic::Complete(t) => write!(f, "complete({t:?})"),
            Tactic::Local(_, t) => write!(f, "local({t:?})"),
            Tactic::Traced(label, t) => write!(f, "traced({label:?}, {t:?})"),
        }
    }
}

impl<E: 'static> Tactic<E> {
    pub fn rule(rule: impl Rule<E> + 'static) -> Self {
        Tactic::Rule(Arc::new(rule))
    }

    /// A rule from a closure, for one-off steps and tests.
    pub fn rule_fn(
        name: impl Into<String>,
        apply: impl Fn(&Context, &Judgment<Type>, &SearchState) -> Vec<Alternative<E>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Tactic::Rule(Arc::new(FnRule {
            name: name.into(),
            apply: Box::new(apply),
        }))
    }

    pub fn choice(tactics: Vec<Tactic<E>>) -> Self {
        Tactic::Choice(tactics)
    }

    pub fn repeat(fuel: usize, body: Tactic<E>) -> Self {
        Tactic::Repeat {
            fuel,
            body: Box::new(body),
        }
    }

    pub fn local(
        f: impl Fn(Judgment<Type>) -> Judgment<Type> + Send + Sync + 'static,
        inner: Tactic<E>,
    ) -> Self {
        Tactic::Local(Arc::new(f), Box::new(inner))
    }

    pub fn then(self, next: Tactic<E>) -> Self {
        Tactic::Then(Box::new(self), Box::new(next))
    }

    pub fn or(self, other: Tactic<E>) -> Self {
        Tactic::Or(Box::new(self), Box::new(other))
    }

    pub fn or_else(self, fallback: Tactic<E>) -> Self {
        Tactic::First(Box::new(self), Box::new(fallback))
    }

    /// This tactic's alternatives, then the goal left untouched.
    pub fn attempt(self) -> Self {
        self.or(Tactic::Skip)
    }

    pub fn complete(self) -> Self {
        Tactic::Complete(Box::new(self))
    }

    pub fn traced(self, label: impl Into<String>) -> Self {
        Tactic::Traced(label.into(), Box::new(self))
    }
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// A partial proof: rule applications with open leaves.
pub(crate) enum Derivation<E> {
    Open(Judgment<Type>),
    Step {
        label: String,
        assemble: Assemble<E>,
        children: Vec<Derivation<E>>,
    },
}

impl<E> Clone for Derivation<E> {
    fn clone(&self) -> Self {
        match self {
            Derivation::Open(goal) => Derivation::Open(goal.clone()),
            Derivation::Step {
                label,
                assemble,
                children,
            } => Derivation::Step {
                label: label.clone(),
                assemble: Arc::clone(assemble),
                children: children.clone(),
            },
        }
    }
}

impl<E: Fragment> Derivation<E> {
    /// Open leaves, left to right.
    pub(crate) fn open_goals(&self) -> Vec<Judgment<Type>> {
        let mut out = Vec::new();
        self.collect_open(&mut out);
        out
    }

    fn collect_open(&self, out: &mut Vec<Judgment<Type>>) {
        match self {
            Derivation::Open(goal) => out.push(goal.clone()),
            Derivation::Step { children, .. } => {
                for child in children {
                    child.collect_open(out);
                }
            }
        }
    }

    /// Replace open leaves, left to right, with the given derivations.
    pub(crate) fn fill(self, leaves: &mut impl Iterator<Item = Derivation<E>>) -> Self {
        match self {
            Derivation::Open(goal) => leaves.next().unwrap_or(Derivation::Open(goal)),
            Derivation::Step {
                label,
                assemble,
                children,
            } => Derivation::Step {
                label,
                assemble,
                children: children.into_iter().map(|child| child.fill(leaves)).collect(),
            },
        }
    }

    /// Wrap in a labelled node that passes its only child's fragment through.
    pub(crate) fn labelled(self, label: &str) -> Self {
        Derivation::Step {
            label: label.to_string(),
            assemble: Arc::new(|children: Vec<E>| children.into_iter().next().unwrap_or_else(E::hole)),
            children: vec![self],
        }
    }

    /// Fold into an explanation, a fragment, and the goals left open.
    pub(crate) fn extract(&self) -> (crate::trace::Trace, E, Vec<Judgment<Type>>) {
        use crate::trace::Trace;
        match self {
            Derivation::Open(goal) => (Trace::empty(), E::hole(), vec![goal.clone()]),
            Derivation::Step {
                label,
                assemble,
                children,
            } => {
                let mut traces = Vec::with_capacity(children.len());
                let mut fragments = Vec::with_capacity(children.len());
                let mut unsolved = Vec::new();
                for child in children {
                    let (trace, fragment, open) = child.extract();
                    traces.push(trace);
                    fragments.push(fragment);
                    unsolved.extend(open);
                }
                let joined: Trace = traces
                    .into_iter()
                    .map(|trace| Trace::rose("", vec![trace]))
                    .sum();
                (Trace::rose(label.as_str(), vec![joined]), assemble(fragments), unsolved)
            }
        }
    }
}
