//! Rules that close or reduce a goal with a value already in scope.

use kea_ast::Expr;
use kea_synth::{Alternative, Context, Judgment, Proposal, Rule, SearchState, TacticError};
use kea_types::{Name, Type};

/// The type of `name` as seen from `goal`. Module functions are
/// instantiated afresh at every use.
pub(crate) fn type_at_use(goal: &Judgment<Type>, state: SearchState, name: &Name, ty: &Type) -> (Type, SearchState) {
    if goal.is_ambient(name) {
        state.instantiate(ty)
    } else {
        let ty = state.apply(ty);
        (ty, state)
    }
}

/// Consuming a pattern-bound value inside an open recursive call counts as
/// structural progress for that call.
fn note_use(goal: &Judgment<Type>, state: SearchState, name: &Name) -> SearchState {
    let state = state.use_value(name);
    if !goal.is_pattern_val(name) {
        return state;
    }
    state.with_recursion_stack(|mut stack| {
        if let Some(top) = stack.last_mut() {
            *top = true;
        }
        stack
    })
}

fn use_value(goal: &Judgment<Type>, state: &SearchState, name: &Name, ty: &Type) -> Alternative<Expr> {
    let (ty, state) = type_at_use(goal, state.clone(), name, ty);
    let state = state.unify(goal.goal(), &ty)?;
    Ok(Proposal::closed(
        format!("use {name}"),
        note_use(goal, state, name),
        Expr::Var(name.clone()),
    ))
}

/// Close the goal with any hypothesis of a matching type. Functions being
/// defined are left to the recursion rules. Each mismatched hypothesis is
/// kept as a failed alternative so its unification error can be reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assumption;

impl Rule<Expr> for Assumption {
    fn name(&self) -> &str {
        "assumption"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        let mut out: Vec<_> = goal
            .hypothesis()
            .iter()
            .filter(|(name, _)| !context.is_defining(name))
            .map(|(name, ty)| use_value(goal, state, name, ty))
            .collect();
        if out.is_empty() {
            out.push(Err(TacticError::NoApplicableTactic));
        }
        out
    }
}

/// Close the goal with one named hypothesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseValue(pub Name);

impl Rule<Expr> for UseValue {
    fn name(&self) -> &str {
        "use"
    }

    fn apply(&self, _: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        let result = match goal.lookup(&self.0) {
            Some(ty) => use_value(goal, state, &self.0, ty),
            None => Err(TacticError::UndefinedHypothesis(self.0.clone())),
        };
        vec![result]
    }
}

/// Call a function in scope whose result matches the goal, leaving one
/// sub-goal per argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apply;

impl Rule<Expr> for Apply {
    fn name(&self) -> &str {
        "apply"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        let mut out = Vec::new();
        for (name, ty) in goal.hypothesis() {
            if context.is_defining(name) {
                continue;
            }
            let (ty, state) = type_at_use(goal, state.clone(), name, ty);
            let Some(ft) = ty.as_function() else {
                continue;
            };
            let state = match state.unify(goal.goal(), &ft.ret) {
                Ok(state) => note_use(goal, state, name),
                Err(err) => {
                    out.push(Err(err));
                    continue;
                }
            };
            let subgoals = ft
                .params
                .iter()
                .map(|param| goal.clone().with_goal(state.apply(param)).unset_top_hole())
                .collect();
            let func = name.clone();
            out.push(Ok(Proposal::new(
                format!("apply {name}"),
                state,
                subgoals,
                move |args: Vec<Expr>| Expr::app(Expr::Var(func.clone()), args),
            )));
        }
        if out.is_empty() {
            out.push(Err(TacticError::NoApplicableTactic));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kea_types::DataTypeRegistry;
    use proptest::prelude::*;

    fn n(name: &str) -> Name {
        Name::new(name)
    }

    fn ctx() -> Context {
        Context::new(
            vec![(n("length"), Type::function(vec![Type::list(Type::var(0))], Type::int()))],
            vec![],
            DataTypeRegistry::with_builtins(),
        )
    }

    fn closed(alt: &Alternative<Expr>) -> Option<Expr> {
        alt.as_ref().ok().map(|p| (p.assemble)(vec![]))
    }

    #[test]
    fn assumption_offers_every_match_in_order() {
        let jdg = Judgment::top_hole(
            [(n("a"), Type::int()), (n("b"), Type::bool()), (n("c"), Type::int())],
            [],
            Type::int(),
        );
        let alts = Assumption.apply(&ctx(), &jdg, &SearchState::initial(0));
        let exprs: Vec<_> = alts.iter().filter_map(closed).collect();
        assert_eq!(exprs, vec![Expr::var("a"), Expr::var("c")]);
    }

    #[test]
    fn assumption_keeps_mismatches_as_errors() {
        let jdg = Judgment::new(Type::int()).introduce_local([(n("b"), Type::bool()), (n("k"), Type::int())]);
        let alts = Assumption.apply(&ctx(), &jdg, &SearchState::initial(0));
        assert!(matches!(
            alts.as_slice(),
            [Err(TacticError::UnificationError(expected, actual)), Ok(_)]
                if *expected == Type::int() && *actual == Type::bool()
        ));
    }

    #[test]
    fn assumption_skips_defining_functions() {
        let length = Type::function(vec![Type::list(Type::var(0))], Type::int());
        let jdg = Judgment::new(length.clone()).introduce_local([(n("length"), length)]);
        let alts = Assumption.apply(&ctx(), &jdg, &SearchState::initial(0));
        assert!(matches!(alts.as_slice(), [Err(TacticError::NoApplicableTactic)]));
    }

    #[test]
    fn using_a_pattern_value_marks_open_frame() {
        let jdg = Judgment::new(Type::int())
            .introduce_local([(n("xs"), Type::list(Type::int()))])
            .introduce_pattern_vals(&n("xs"), [(n("y"), Type::int())]);
        let state = SearchState::initial(0).with_recursion_stack(|_| vec![false]);
        let alts = UseValue(n("y")).apply(&ctx(), &jdg, &state);
        let Some(Ok(proposal)) = alts.into_iter().next() else {
            panic!("expected a proposal");
        };
        assert_eq!(proposal.state.recursion_stack(), &[true]);
        assert!(proposal.state.used_vals().contains(&n("y")));
    }

    #[test]
    fn use_value_reports_missing_and_mismatched_names() {
        let jdg = Judgment::new(Type::int()).introduce_local([(n("b"), Type::bool())]);
        let state = SearchState::initial(0);
        let missing = UseValue(n("q")).apply(&ctx(), &jdg, &state);
        assert!(matches!(&missing[..], [Err(TacticError::UndefinedHypothesis(name))] if name == &n("q")));
        let mismatched = UseValue(n("b")).apply(&ctx(), &jdg, &state);
        assert!(matches!(
            &mismatched[..],
            [Err(TacticError::UnificationError(expected, actual))]
                if *expected == Type::int() && *actual == Type::bool()
        ));
    }

    #[test]
    fn apply_instantiates_module_functions() {
        // `id : t0 -> t0` from the module, used at Int.
        let jdg = Judgment::top_hole(
            [(n("x"), Type::int())],
            [(n("id"), Type::function(vec![Type::var(0)], Type::var(0)))],
            Type::int(),
        );
        let state = SearchState::initial(0).reserve_type_vars([kea_types::TypeVarId(0)]);
        let alts = Apply.apply(&ctx(), &jdg, &state);
        let Some(Ok(proposal)) = alts.into_iter().next() else {
            panic!("expected a proposal");
        };
        assert_eq!(proposal.label, "apply id");
        assert_eq!(proposal.subgoals.len(), 1);
        assert_eq!(proposal.subgoals[0].goal(), &Type::int());
        assert!(!proposal.subgoals[0].is_top_hole());
        assert_eq!(
            (proposal.assemble)(vec![Expr::var("x")]),
            Expr::app(Expr::var("id"), vec![Expr::var("x")])
        );
    }

    #[test]
    fn apply_without_functions_is_inapplicable() {
        let jdg = Judgment::new(Type::int()).introduce_local([(n("x"), Type::int())]);
        let alts = Apply.apply(&ctx(), &jdg, &SearchState::initial(0));
        assert!(matches!(alts.as_slice(), [Err(TacticError::NoApplicableTactic)]));
    }

    proptest! {
        #[test]
        fn assumption_only_offers_well_typed_names(
            hyps in prop::collection::btree_map(
                "[a-e]",
                prop_oneof![Just(Type::int()), Just(Type::bool()), Just(Type::unit())],
                0..6,
            ),
            goal in prop_oneof![Just(Type::int()), Just(Type::bool()), Just(Type::unit())],
        ) {
            let jdg = Judgment::top_hole(hyps.iter().map(|(k, v)| (n(k), v.clone())), [], goal.clone());
            let alts = Assumption.apply(&ctx(), &jdg, &SearchState::initial(0));
            let offered: Vec<Expr> = alts.iter().filter_map(closed).collect();
            let expected: Vec<Expr> = hyps
                .iter()
                .filter(|(_, ty)| **ty == goal)
                .map(|(k, _)| Expr::var(k.as_str()))
                .collect();
            prop_assert_eq!(offered, expected);
        }
    }
}
