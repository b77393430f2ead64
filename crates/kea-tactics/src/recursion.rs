//! Calls to the functions being defined.
//!
//! Every candidate call goes through [`RecursiveCall::check`], so a call
//! that does not pass a structurally smaller argument in the position it
//! was matched from never reaches an extract.

use kea_ast::Expr;
use kea_synth::{Alternative, Context, Judgment, Proposal, RecursiveCall, Rule, SearchState, TacticError};
use kea_types::{Name, Type};

use crate::values::type_at_use;

/// Try every well-typed call to every function being defined, with
/// hypothesis values as arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recursion;

impl Rule<Expr> for Recursion {
    fn name(&self) -> &str {
        "recursion"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        let mut out = Vec::new();
        for (func, ty) in context.defining_funcs() {
            let (ty, state) = state.clone().instantiate(ty);
            let Some(ft) = ty.as_function() else {
                continue;
            };
            let state = match state.unify(goal.goal(), &ft.ret) {
                Ok(state) => state,
                Err(err) => {
                    out.push(Err(err));
                    continue;
                }
            };
            let mut calls = Vec::new();
            arguments(context, goal, &ft.params, state, Vec::new(), &mut calls);
            for (args, state) in calls {
                let call = RecursiveCall::new(func.clone(), args);
                let result = finish_call(goal, &call, state);
                if let Err(err) = &result {
                    tracing::trace!(callee = %func, args = ?call.args(), %err, "recursive call rejected");
                }
                out.push(result);
            }
        }
        if out.is_empty() {
            out.push(Err(TacticError::NoApplicableTactic));
        }
        out
    }
}

/// Every way to fill `params` left to right with hypothesis values whose
/// types unify, each with the state after those unifications.
fn arguments(
    context: &Context,
    goal: &Judgment<Type>,
    params: &[Type],
    state: SearchState,
    chosen: Vec<Name>,
    out: &mut Vec<(Vec<Name>, SearchState)>,
) {
    let Some((param, rest)) = params.split_first() else {
        out.push((chosen, state));
        return;
    };
    for (name, ty) in goal.hypothesis() {
        if context.is_defining(name) {
            continue;
        }
        let (ty, next) = type_at_use(goal, state.clone(), name, ty);
        let expected = next.apply(param);
        if let Ok(next) = next.unify(&expected, &ty) {
            let mut chosen = chosen.clone();
            chosen.push(name.clone());
            arguments(context, goal, rest, next, chosen, out);
        }
    }
}

fn finish_call(goal: &Judgment<Type>, call: &RecursiveCall, state: SearchState) -> Alternative<Expr> {
    let state = call
        .check(goal, state)?
        .with_used_vals(|mut used| {
            used.extend(call.args().iter().cloned());
            used
        })
        .with_unused_top_vals(|mut unused| {
            unused.retain(|name| !call.args().contains(name));
            unused
        });
    let label = format!(
        "recursion {}({})",
        call.callee(),
        call.args().iter().map(Name::as_str).collect::<Vec<_>>().join(", ")
    );
    let expr = Expr::app(
        Expr::Var(call.callee().clone()),
        call.args().iter().cloned().map(Expr::Var).collect(),
    );
    Ok(Proposal::closed(label, state, expr))
}

/// One explicit call to a function being defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveCallRule {
    pub callee: Name,
    pub args: Vec<Name>,
}

impl RecursiveCallRule {
    pub fn new(callee: impl Into<Name>, args: impl IntoIterator<Item = Name>) -> Self {
        Self {
            callee: callee.into(),
            args: args.into_iter().collect(),
        }
    }

    fn call(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Alternative<Expr> {
        let declared = context
            .defining_func(&self.callee)
            .ok_or_else(|| TacticError::UndefinedHypothesis(self.callee.clone()))?;
        let (ty, mut state) = state.clone().instantiate(declared);
        let ft = match ty.as_function() {
            Some(ft) if ft.params.len() == self.args.len() => ft,
            _ => return Err(TacticError::GoalMismatch("recursive_call".into(), ty.clone())),
        };
        state = state.unify(goal.goal(), &ft.ret)?;
        for (param, arg) in ft.params.iter().zip(&self.args) {
            let arg_ty = goal
                .lookup(arg)
                .ok_or_else(|| TacticError::UndefinedHypothesis(arg.clone()))?;
            let (arg_ty, next) = type_at_use(goal, state, arg, arg_ty);
            let expected = next.apply(param);
            state = next.unify(&expected, &arg_ty)?;
        }
        let call = RecursiveCall::new(self.callee.clone(), self.args.clone());
        finish_call(goal, &call, state)
    }
}

impl Rule<Expr> for RecursiveCallRule {
    fn name(&self) -> &str {
        "recursive_call"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        vec![self.call(context, goal, state)]
    }
}
