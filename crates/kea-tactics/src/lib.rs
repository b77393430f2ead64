//! The standard tactic library for Kea hole synthesis.
//!
//! Every rule here produces `kea_ast::Expr` fragments and runs on the
//! `kea-synth` engine:
//!
//! - [`Assumption`], [`UseValue`], [`Apply`]: close or reduce a goal with
//!   a value in scope
//! - [`Intro`]: bind the parameters of a function goal
//! - [`Destruct`], [`DestructAll`]: case analysis on a hypothesis
//! - [`Split`], [`SplitWith`]: build the goal from a data constructor
//! - [`Recursion`], [`RecursiveCallRule`]: guarded calls to the function
//!   being defined
//!
//! [`auto`] combines them into the default strategy; [`TacticRegistry`]
//! makes them available by name.

mod recursion;
mod registry;
mod structural;
mod values;

use kea_ast::Expr;
use kea_synth::{SearchState, Tactic};
use kea_types::{Name, Type};

pub use recursion::{Recursion, RecursiveCallRule};
pub use registry::TacticRegistry;
pub use structural::{Destruct, DestructAll, Intro, Split, SplitWith};
pub use values::{Apply, Assumption, UseValue};

/// Depth used by [`TacticRegistry::standard`] for its `auto` entry.
pub const DEFAULT_AUTO_DEPTH: usize = 5;

/// Repeatedly introduce parameters when the goal is a function, otherwise
/// try every other rule, until no goal is left or `depth` runs out.
pub fn auto(depth: usize) -> Tactic<Expr> {
    let step = Tactic::rule(Intro).or_else(Tactic::choice(vec![
        Tactic::rule(Assumption),
        Tactic::rule(Recursion),
        Tactic::rule(Apply),
        Tactic::rule(Split),
        Tactic::rule(DestructAll),
    ]));
    Tactic::repeat(depth, step)
}

/// A name stem suggested by a binding's type.
fn hint_for(ty: &Type) -> &'static str {
    match ty {
        Type::Function(_) => "f",
        Type::Tuple(_) => "p",
        Type::Con(name, _) => match name.as_str() {
            "List" => "xs",
            "Option" => "opt",
            "Bool" => "b",
            "Int" => "n",
            _ => "x",
        },
        Type::Var(_) => "x",
    }
}

/// One fresh name per type, none of them already bound in `hypothesis`.
fn fresh_names<T>(
    state: SearchState,
    hypothesis: &kea_synth::Judgment<T>,
    types: &[Type],
) -> (Vec<Name>, SearchState) {
    let mut state = state;
    let mut names = Vec::with_capacity(types.len());
    for ty in types {
        let (name, next) = state.fresh_name(hint_for(ty), |n| hypothesis.lookup(n).is_some());
        state = next;
        names.push(name);
    }
    (names, state)
}

fn record_introduced(state: SearchState, names: &[Name]) -> SearchState {
    state.with_introduced_vals(|mut intro| {
        intro.extend(names.iter().cloned());
        intro
    })
}
