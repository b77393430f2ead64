//! Termination guard for recursive calls.
//!
//! Each open recursive call owns one frame of the state's recursion stack.
//! A frame is marked once the call passes, at some parameter position, a
//! value obtained by pattern matching on what was bound to that same
//! parameter (see [`Judgment::is_smaller_at`]). A call whose frame and every
//! enclosing frame are unmarked is rejected with `RecursionOnWrongParam`
//! before it can produce an extract.

use kea_types::Name;

use crate::error::TacticError;
use crate::judgment::Judgment;
use crate::state::SearchState;

/// Penalty charged for each accepted recursive call.
pub const RECURSION_COST: u32 = 1;

/// A call to a function being defined, with hypothesis names as arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveCall {
    callee: Name,
    args: Vec<Name>,
}

impl RecursiveCall {
    pub fn new(callee: Name, args: Vec<Name>) -> Self {
        Self { callee, args }
    }

    pub fn callee(&self) -> &Name {
        &self.callee
    }

    pub fn args(&self) -> &[Name] {
        &self.args
    }

    /// Push a frame for this call, marking it if any argument is
    /// structurally smaller at its own position.
    pub fn open<T>(&self, goal: &Judgment<T>, state: SearchState) -> Result<SearchState, TacticError> {
        if let Some(missing) = self.args.iter().find(|arg| goal.lookup(arg).is_none()) {
            return Err(TacticError::UndefinedHypothesis(missing.clone()));
        }
        let shrinks = (0..self.args.len()).any(|index| self.shrinks_at(goal, index));
        Ok(state.with_recursion_stack(|mut stack| {
            stack.push(shrinks);
            stack
        }))
    }

    /// Pop this call's frame. Succeeds, charging [`RECURSION_COST`], when
    /// the frame or an enclosing one is marked.
    pub fn close<T>(&self, goal: &Judgment<T>, state: SearchState) -> Result<SearchState, TacticError> {
        let mut popped = None;
        let state = state.with_recursion_stack(|mut stack| {
            popped = stack.pop();
            stack
        });
        let enclosing_progress = state.recursion_stack().iter().any(|&marked| marked);
        if popped == Some(true) || enclosing_progress {
            return Ok(state.charge_recursion(RECURSION_COST));
        }
        Err(self.wrong_param(goal))
    }

    /// `open` followed by `close`, for calls with no nested sub-search.
    pub fn check<T>(&self, goal: &Judgment<T>, state: SearchState) -> Result<SearchState, TacticError> {
        let state = self.open(goal, state)?;
        self.close(goal, state)
    }

    fn shrinks_at<T>(&self, goal: &Judgment<T>, index: usize) -> bool {
        goal.is_smaller_at(&self.callee, index, &self.args[index])
    }

    fn wrong_param<T>(&self, goal: &Judgment<T>) -> TacticError {
        let (index, arg) = self
            .args
            .iter()
            .enumerate()
            .find(|(index, _)| !self.shrinks_at(goal, *index))
            .map(|(index, arg)| (index, arg.clone()))
            .unwrap_or_else(|| (0, self.callee.clone()));
        TacticError::RecursionOnWrongParam(self.callee.clone(), index, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kea_types::Type;

    fn n(name: &str) -> Name {
        Name::new(name)
    }

    fn after_destruct() -> Judgment<Type> {
        let list = Type::list(Type::var(0));
        Judgment::top_hole([(n("xs"), list.clone())], [], Type::int())
            .record_position_map(&n("f"), vec![vec![n("xs")]])
            .mark_destructed(&n("xs"))
            .introduce_pattern_vals(&n("xs"), [(n("y"), Type::var(0)), (n("ys"), list)])
    }

    /// `f(xs, o)` with `o : Option(List(Int))` matched as `Some(l)`.
    fn inside_some() -> Judgment<Type> {
        let list = Type::list(Type::int());
        Judgment::top_hole([(n("xs"), list.clone()), (n("o"), Type::option(list.clone()))], [], Type::int())
            .record_position_map(&n("f"), vec![vec![n("xs")], vec![n("o")]])
            .mark_destructed(&n("o"))
            .introduce_pattern_vals(&n("o"), [(n("l"), list)])
    }

    #[test]
    fn call_on_pattern_val_marks_frame() {
        let call = RecursiveCall::new(n("f"), vec![n("ys")]);
        let state = call.open(&after_destruct(), SearchState::initial(0)).unwrap();
        assert_eq!(state.recursion_stack(), &[true]);
        let state = call.close(&after_destruct(), state).unwrap();
        assert!(state.recursion_stack().is_empty());
        assert_eq!(state.recursion_penalty(), RECURSION_COST);
    }

    #[test]
    fn call_on_original_param_is_rejected() {
        let call = RecursiveCall::new(n("f"), vec![n("xs")]);
        let err = call.check(&after_destruct(), SearchState::initial(0)).unwrap_err();
        assert_eq!(err, TacticError::RecursionOnWrongParam(n("f"), 0, n("xs")));
    }

    #[test]
    fn pattern_value_at_another_position_is_rejected() {
        let jdg = inside_some();
        let swapped = RecursiveCall::new(n("f"), vec![n("l"), n("o")]);
        let err = swapped.check(&jdg, SearchState::initial(0)).unwrap_err();
        assert_eq!(err, TacticError::RecursionOnWrongParam(n("f"), 0, n("l")));

        let untouched = RecursiveCall::new(n("f"), vec![n("xs"), n("o")]);
        let err = untouched.check(&jdg, SearchState::initial(0)).unwrap_err();
        assert_eq!(err, TacticError::RecursionOnWrongParam(n("f"), 0, n("xs")));
    }

    #[test]
    fn smaller_argument_at_its_own_position_marks_the_frame() {
        let call = RecursiveCall::new(n("f"), vec![n("xs"), n("l")]);
        let state = call.open(&inside_some(), SearchState::initial(0)).unwrap();
        assert_eq!(state.recursion_stack(), &[true]);
        assert!(call.close(&inside_some(), state).is_ok());
    }

    #[test]
    fn call_without_recorded_positions_is_rejected() {
        let call = RecursiveCall::new(n("g"), vec![n("ys")]);
        let err = call.check(&after_destruct(), SearchState::initial(0)).unwrap_err();
        assert_eq!(err, TacticError::RecursionOnWrongParam(n("g"), 0, n("ys")));
    }

    #[test]
    fn enclosing_progress_licenses_inner_call() {
        let outer = RecursiveCall::new(n("f"), vec![n("ys")]);
        let inner = RecursiveCall::new(n("g"), vec![n("xs")]);
        let jdg = after_destruct();
        let state = outer.open(&jdg, SearchState::initial(0)).unwrap();
        let state = inner.check(&jdg, state).unwrap();
        assert_eq!(state.recursion_stack(), &[true]);
        assert_eq!(state.recursion_penalty(), RECURSION_COST);
    }

    #[test]
    fn unbound_argument_is_undefined() {
        let call = RecursiveCall::new(n("f"), vec![n("zs")]);
        let err = call.open(&after_destruct(), SearchState::initial(0)).unwrap_err();
        assert_eq!(err, TacticError::UndefinedHypothesis(n("zs")));
    }

    #[test]
    fn nullary_call_names_the_callee() {
        let call = RecursiveCall::new(n("loop"), vec![]);
        let err = call.check(&after_destruct(), SearchState::initial(0)).unwrap_err();
        assert_eq!(err, TacticError::RecursionOnWrongParam(n("loop"), 0, n("loop")));
    }
}
