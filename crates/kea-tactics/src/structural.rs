//! Rules that follow the shape of types: lambda introduction, case
//! analysis on a hypothesis, and constructor splits of the goal.

use kea_ast::{CaseArm, Expr};
use kea_synth::{Alternative, Context, Judgment, Proposal, Rule, SearchState, TacticError};
use kea_types::{DataCon, Name, Type};

use crate::{fresh_names, record_introduced};

// ---------------------------------------------------------------------------
// Intro
// ---------------------------------------------------------------------------

/// Bind every parameter of a function goal.
///
/// Parameters bound at the top hole join the state's unused top-level
/// values, so solutions that ignore them rank lower. They also become the
/// positional parameters of every function being defined with that arity,
/// which is what the termination guard compares call arguments against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Intro;

impl Rule<Expr> for Intro {
    fn name(&self) -> &str {
        "intro"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        vec![intro(context, goal, state)]
    }
}

fn intro(context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Alternative<Expr> {
    let ft = match state.apply(goal.goal()) {
        Type::Function(ft) => ft,
        Type::Var(_) => return Err(TacticError::TooPolymorphic),
        other => return Err(TacticError::GoalMismatch("intro".into(), other)),
    };
    let (params, state) = fresh_names(state.clone(), goal, &ft.params);
    let mut state = record_introduced(state, &params);
    if goal.is_top_hole() {
        state = state.with_unused_top_vals(|mut unused| {
            unused.extend(params.iter().cloned());
            unused
        });
    }
    let mut body = goal
        .clone()
        .introduce_local(params.iter().cloned().zip(ft.params.iter().cloned()))
        .with_goal(*ft.ret);
    if goal.is_top_hole() {
        for (func, ty) in context.defining_funcs() {
            if ty.as_function().is_some_and(|declared| declared.params.len() == params.len()) {
                let positions = params.iter().map(|param| vec![param.clone()]).collect();
                body = body.record_position_map(func, positions);
            }
        }
    }
    let label = format!(
        "intro {}",
        params.iter().map(Name::as_str).collect::<Vec<_>>().join(" ")
    );
    Ok(Proposal::new(label, state, vec![body], move |mut children: Vec<Expr>| {
        Expr::lambda(params.clone(), children.pop().unwrap_or(Expr::Hole))
    }))
}

// ---------------------------------------------------------------------------
// Destruct
// ---------------------------------------------------------------------------

/// Case analysis on one hypothesis: one sub-goal per constructor, with the
/// constructor's fields bound as pattern values descending from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destruct(pub Name);

impl Rule<Expr> for Destruct {
    fn name(&self) -> &str {
        "destruct"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        vec![destruct(context, goal, state, &self.0)]
    }
}

/// Case analysis on any local hypothesis of a data type not yet destructed,
/// one alternative per candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DestructAll;

impl Rule<Expr> for DestructAll {
    fn name(&self) -> &str {
        "destruct_all"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        let mut out: Vec<_> = goal
            .local_hypothesis()
            .filter(|(name, ty)| {
                !goal.has_destructed(name)
                    && !context.is_defining(name)
                    && context.data_types().constructors_of(&state.apply(ty)).is_some()
            })
            .map(|(name, _)| destruct(context, goal, state, name))
            .collect();
        if out.is_empty() {
            out.push(Err(TacticError::NoApplicableTactic));
        }
        out
    }
}

fn destruct(context: &Context, goal: &Judgment<Type>, state: &SearchState, name: &Name) -> Alternative<Expr> {
    if goal.blacklist_destruct() {
        return Err(TacticError::UnhelpfulDestruct(name.clone()));
    }
    let ty = goal
        .lookup(name)
        .ok_or_else(|| TacticError::UndefinedHypothesis(name.clone()))?;
    if goal.has_destructed(name) {
        return Err(TacticError::AlreadyDestructed(name.clone()));
    }
    let ty = state.apply(ty);
    if ty.is_var() {
        return Err(TacticError::TooPolymorphic);
    }
    let constructors = context
        .data_types()
        .constructors_of(&ty)
        .ok_or_else(|| TacticError::UnhelpfulDestruct(name.clone()))?;
    if let [only] = constructors.as_slice()
        && only.fields.is_empty()
    {
        return Err(TacticError::UnhelpfulDestruct(name.clone()));
    }

    let mut state = state.clone().use_value(name);
    let mut positions = Vec::with_capacity(constructors.len());
    for con in &constructors {
        let (fields, next) = fresh_names(state, goal, &con.fields);
        state = record_introduced(next, &fields);
        positions.push(fields);
    }
    let subgoals = constructors
        .iter()
        .zip(&positions)
        .map(|(con, fields)| {
            goal.clone()
                .mark_destructed(name)
                .introduce_pattern_vals(name, fields.iter().cloned().zip(con.fields.iter().cloned()))
                .unset_top_hole()
        })
        .collect();
    tracing::trace!(%name, constructors = constructors.len(), "destruct");

    let scrutinee = name.clone();
    let patterns: Vec<(String, Vec<Name>)> = constructors
        .into_iter()
        .map(|con| con.name)
        .zip(positions)
        .collect();
    Ok(Proposal::new(
        format!("destruct {name}"),
        state,
        subgoals,
        move |bodies: Vec<Expr>| {
            let arms = patterns
                .iter()
                .zip(bodies)
                .map(|((constructor, binders), body)| CaseArm {
                    constructor: constructor.clone(),
                    binders: binders.clone(),
                    body,
                })
                .collect();
            Expr::case(Expr::Var(scrutinee.clone()), arms)
        },
    ))
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// Build the goal from each of its data constructors in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct Split;

impl Rule<Expr> for Split {
    fn name(&self) -> &str {
        "split"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        match goal_constructors(context, goal, state) {
            Ok((goal_ty, constructors)) => constructors
                .iter()
                .map(|con| split_into(goal, &goal_ty, state, con))
                .collect(),
            Err(err) => vec![Err(err)],
        }
    }
}

/// Build the goal from one named constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitWith(pub String);

impl Rule<Expr> for SplitWith {
    fn name(&self) -> &str {
        "split_with"
    }

    fn apply(&self, context: &Context, goal: &Judgment<Type>, state: &SearchState) -> Vec<Alternative<Expr>> {
        let result = goal_constructors(context, goal, state).and_then(|(goal_ty, constructors)| {
            let con = constructors
                .iter()
                .find(|con| con.name == self.0)
                .ok_or_else(|| TacticError::IncorrectDataConstructor(self.0.clone()))?;
            split_into(goal, &goal_ty, state, con)
        });
        vec![result]
    }
}

fn goal_constructors(
    context: &Context,
    goal: &Judgment<Type>,
    state: &SearchState,
) -> Result<(Type, Vec<DataCon>), TacticError> {
    let goal_ty = state.apply(goal.goal());
    if goal_ty.is_var() {
        return Err(TacticError::TooPolymorphic);
    }
    match context.data_types().constructors_of(&goal_ty) {
        Some(constructors) => Ok((goal_ty, constructors)),
        None => Err(TacticError::GoalMismatch("split".into(), goal_ty)),
    }
}

/// A constructor whose only field is the goal itself would just hand the
/// same goal back.
fn split_into(goal: &Judgment<Type>, goal_ty: &Type, state: &SearchState, con: &DataCon) -> Alternative<Expr> {
    if !goal.whitelist_split() || matches!(con.fields.as_slice(), [field] if field == goal_ty) {
        return Err(TacticError::UnhelpfulSplit(con.name.clone()));
    }
    let subgoals = con
        .fields
        .iter()
        .map(|field| goal.clone().with_goal(field.clone()).unset_top_hole())
        .collect();
    let name = con.name.clone();
    Ok(Proposal::new(
        format!("split {name}"),
        state.clone(),
        subgoals,
        move |args: Vec<Expr>| Expr::con(name.clone(), args),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kea_types::{DataDecl, DataTypeRegistry, TypeVarId};

    fn n(name: &str) -> Name {
        Name::new(name)
    }

    fn ctx() -> Context {
        let mut data = DataTypeRegistry::with_builtins();
        data.register(DataDecl::new("Unit", vec![], vec![DataCon::new("Unit", vec![])]));
        data.register(DataDecl::new(
            "Box",
            vec![TypeVarId(0)],
            vec![DataCon::new("Box", vec![Type::app("Box", vec![Type::var(0)])])],
        ));
        Context::new(vec![], vec![], data)
    }

    fn proposal(alts: Vec<Alternative<Expr>>) -> Proposal<Expr> {
        match alts.into_iter().next() {
            Some(Ok(p)) => p,
            other => panic!("expected a proposal, got {other:?}"),
        }
    }

    fn error(alts: Vec<Alternative<Expr>>) -> TacticError {
        match alts.into_iter().next() {
            Some(Err(err)) => err,
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn intro_binds_parameters() {
        let goal = Type::function(vec![Type::int(), Type::list(Type::int())], Type::bool());
        let jdg = Judgment::top_hole([], [], goal);
        let p = proposal(Intro.apply(&ctx(), &jdg, &SearchState::initial(0)));
        assert_eq!(p.label, "intro n0 xs1");
        let body = &p.subgoals[0];
        assert_eq!(body.goal(), &Type::bool());
        assert_eq!(body.lookup(&n("xs1")), Some(&Type::list(Type::int())));
        assert!(body.is_top_hole());
        assert_eq!(p.state.unused_top_vals().len(), 2);
        assert_eq!(
            (p.assemble)(vec![Expr::var("b")]),
            Expr::lambda(vec![n("n0"), n("xs1")], Expr::var("b"))
        );
    }

    #[test]
    fn intro_at_top_hole_records_parameter_positions() {
        let ft = Type::function(vec![Type::list(Type::int()), Type::int()], Type::int());
        let context = Context::new(
            vec![(n("f"), ft.clone()), (n("g"), Type::function(vec![Type::int()], Type::int()))],
            vec![],
            DataTypeRegistry::with_builtins(),
        );
        let p = proposal(Intro.apply(&context, &Judgment::top_hole([], [], ft.clone()), &SearchState::initial(0)));
        let body = &p.subgoals[0];
        assert_eq!(body.position_map(&n("f")), Some(&[vec![n("xs0")], vec![n("n1")]][..]));
        assert_eq!(body.position_map(&n("g")), None);

        let inner = proposal(Intro.apply(&context, &Judgment::new(ft), &SearchState::initial(0)));
        assert_eq!(inner.subgoals[0].position_map(&n("f")), None);
    }

    #[test]
    fn intro_rejects_non_functions() {
        let jdg = Judgment::new(Type::int());
        let err = error(Intro.apply(&ctx(), &jdg, &SearchState::initial(0)));
        assert_eq!(err, TacticError::GoalMismatch("intro".into(), Type::int()));
        let err = error(Intro.apply(&ctx(), &Judgment::new(Type::var(0)), &SearchState::initial(0)));
        assert_eq!(err, TacticError::TooPolymorphic);
    }

    #[test]
    fn destruct_list_binds_pattern_values() {
        let jdg = Judgment::top_hole([(n("xs"), Type::list(Type::int()))], [], Type::int());
        let p = proposal(Destruct(n("xs")).apply(&ctx(), &jdg, &SearchState::initial(0)));
        assert_eq!(p.label, "destruct xs");
        assert_eq!(p.subgoals.len(), 2);

        let cons = &p.subgoals[1];
        assert!(cons.has_destructed(&n("xs")));
        assert!(cons.is_pattern_val(&n("n0")));
        assert!(cons.is_pattern_val(&n("xs1")));
        assert_eq!(cons.lookup(&n("xs1")), Some(&Type::list(Type::int())));
        assert_eq!(cons.position_map(&n("xs")), None);
        assert!(!cons.is_top_hole());
        assert!(p.state.used_vals().contains(&n("xs")));

        let expr = (p.assemble)(vec![Expr::var("zero"), Expr::var("n0")]);
        assert_eq!(
            expr,
            Expr::case(
                Expr::var("xs"),
                vec![
                    CaseArm { constructor: "Nil".into(), binders: vec![], body: Expr::var("zero") },
                    CaseArm {
                        constructor: "Cons".into(),
                        binders: vec![n("n0"), n("xs1")],
                        body: Expr::var("n0"),
                    },
                ],
            )
        );
    }

    #[test]
    fn destruct_refusals() {
        let state = SearchState::initial(0);
        let jdg = Judgment::new(Type::int())
            .introduce_local([
                (n("u"), Type::named("Unit")),
                (n("a"), Type::var(0)),
                (n("xs"), Type::list(Type::int())),
                (n("i"), Type::int()),
            ])
            .mark_destructed(&n("xs"));
        let refuse = |name: &str| error(Destruct(n(name)).apply(&ctx(), &jdg, &state));
        assert_eq!(refuse("u"), TacticError::UnhelpfulDestruct(n("u")));
        assert_eq!(refuse("a"), TacticError::TooPolymorphic);
        assert_eq!(refuse("xs"), TacticError::AlreadyDestructed(n("xs")));
        assert_eq!(refuse("i"), TacticError::UnhelpfulDestruct(n("i")));
        assert_eq!(refuse("zz"), TacticError::UndefinedHypothesis(n("zz")));

        let blocked = Judgment::new(Type::int())
            .introduce_local([(n("ys"), Type::list(Type::int()))])
            .disallow_destruct();
        let err = error(Destruct(n("ys")).apply(&ctx(), &blocked, &state));
        assert_eq!(err, TacticError::UnhelpfulDestruct(n("ys")));
    }

    #[test]
    fn destruct_all_picks_local_data_values() {
        let jdg = Judgment::top_hole(
            [(n("b"), Type::bool()), (n("i"), Type::int()), (n("o"), Type::option(Type::int()))],
            [(n("m"), Type::bool())],
            Type::int(),
        );
        let alts = DestructAll.apply(&ctx(), &jdg, &SearchState::initial(0));
        let labels: Vec<_> = alts.iter().filter_map(|a| a.as_ref().ok()).map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["destruct b", "destruct o"]);
    }

    #[test]
    fn split_offers_each_constructor() {
        let jdg = Judgment::new(Type::option(Type::int()));
        let alts = Split.apply(&ctx(), &jdg, &SearchState::initial(0));
        let labels: Vec<_> = alts.iter().filter_map(|a| a.as_ref().ok()).map(|p| p.label.clone()).collect();
        assert_eq!(labels, vec!["split None", "split Some"]);
        let some = proposal(alts.into_iter().skip(1).collect());
        assert_eq!(some.subgoals[0].goal(), &Type::int());
    }

    #[test]
    fn split_refusals() {
        let state = SearchState::initial(0);
        let err = error(Split.apply(&ctx(), &Judgment::new(Type::int()), &state));
        assert_eq!(err, TacticError::GoalMismatch("split".into(), Type::int()));

        let restricted = Judgment::new(Type::bool()).restrict_split();
        let errs: Vec<_> = Split
            .apply(&ctx(), &restricted, &state)
            .into_iter()
            .filter_map(Result::err)
            .collect();
        assert_eq!(
            errs,
            vec![
                TacticError::UnhelpfulSplit("True".into()),
                TacticError::UnhelpfulSplit("False".into())
            ]
        );

        let boxed = Judgment::new(Type::app("Box", vec![Type::int()]));
        let err = error(Split.apply(&ctx(), &boxed, &state));
        assert_eq!(err, TacticError::UnhelpfulSplit("Box".into()));
    }

    #[test]
    fn split_with_names_a_constructor() {
        let state = SearchState::initial(0);
        let jdg = Judgment::new(Type::list(Type::int()));
        let cons = proposal(SplitWith("Cons".into()).apply(&ctx(), &jdg, &state));
        assert_eq!(cons.subgoals.len(), 2);
        assert_eq!(
            (cons.assemble)(vec![Expr::var("x"), Expr::var("xs")]),
            Expr::con("Cons", vec![Expr::var("x"), Expr::var("xs")])
        );
        let err = error(SplitWith("Some".into()).apply(&ctx(), &jdg, &state));
        assert_eq!(err, TacticError::IncorrectDataConstructor("Some".into()));
    }
}
