//! Error taxonomy for tactic failures and engine faults.
//!
//! A [`TacticError`] is an ordinary search event: it prunes one branch and
//! is recorded so the host can explain an empty result. A [`SynthError`]
//! is a fault in the inputs or the engine itself and aborts the search.

use kea_diag::{Category, Diagnostic};
use kea_types::{Name, Type};

use crate::judgment::Judgment;

/// Why a tactic refused to make progress on a goal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TacticError {
    #[error("`{0}` is not in scope")]
    UndefinedHypothesis(Name),

    #[error("{0}: goal `{1}` has the wrong shape")]
    GoalMismatch(String, Type),

    #[error("{} sub-goal(s) left unsolved", .0.len())]
    UnsolvedSubgoals(Vec<Judgment<Type>>),

    #[error("cannot unify `{0}` with `{1}`")]
    UnificationError(Type, Type),

    #[error("no progress")]
    NoProgress,

    #[error("no applicable tactic")]
    NoApplicableTactic,

    #[error("`{0}` has already been destructed")]
    AlreadyDestructed(Name),

    #[error("`{0}` is not a constructor of the goal type")]
    IncorrectDataConstructor(String),

    #[error("recursive call to `{0}` does not shrink argument {1} (`{2}`)")]
    RecursionOnWrongParam(Name, usize, Name),

    #[error("destructing `{0}` would not help")]
    UnhelpfulDestruct(Name),

    #[error("splitting into `{0}` would not help")]
    UnhelpfulSplit(String),

    #[error("goal is too polymorphic to split or destruct")]
    TooPolymorphic,
}

impl TacticError {
    pub fn category(&self) -> Category {
        match self {
            TacticError::UndefinedHypothesis(_) => Category::UndefinedName,
            TacticError::GoalMismatch(..) | TacticError::UnificationError(..) => {
                Category::TypeMismatch
            }
            TacticError::UnsolvedSubgoals(_) => Category::UnsolvedGoal,
            TacticError::NoProgress | TacticError::NoApplicableTactic => Category::NoProgress,
            TacticError::AlreadyDestructed(_)
            | TacticError::IncorrectDataConstructor(_)
            | TacticError::UnhelpfulDestruct(_)
            | TacticError::UnhelpfulSplit(_) => Category::UnhelpfulStructure,
            TacticError::RecursionOnWrongParam(..) => Category::Termination,
            TacticError::TooPolymorphic => Category::TooPolymorphic,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::info(self.category(), self.to_string());
        match self {
            TacticError::UnsolvedSubgoals(goals) => goals.iter().fold(diag, |diag, goal| {
                diag.with_note(format!("open goal: {}", goal.goal()))
            }),
            _ => diag,
        }
    }
}

/// A fault that aborts synthesis instead of pruning a branch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// A judgment broke one of its structural invariants. Either the host
    /// built it by hand or a rule produced it.
    #[error("malformed judgment: {detail}")]
    MalformedJudgment { detail: String },

    #[error("tactic `{0}` is registered twice")]
    DuplicateRule(String),
}

impl SynthError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(Category::InternalFault, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kea_diag::Severity;

    #[test]
    fn categories_group_related_failures() {
        assert_eq!(
            TacticError::UnhelpfulSplit("Nil".into()).category(),
            TacticError::AlreadyDestructed(Name::new("xs")).category()
        );
        assert_eq!(
            TacticError::RecursionOnWrongParam(Name::new("f"), 0, Name::new("xs")).category(),
            Category::Termination
        );
    }

    #[test]
    fn unsolved_subgoals_note_each_goal() {
        let err = TacticError::UnsolvedSubgoals(vec![
            Judgment::new(Type::int()),
            Judgment::new(Type::bool()),
        ]);
        let diag = err.to_diagnostic();
        assert_eq!(diag.message, "2 sub-goal(s) left unsolved");
        assert_eq!(diag.notes, vec!["open goal: Int", "open goal: Bool"]);
        assert_eq!(diag.severity, Severity::Info);
    }

    #[test]
    fn synth_errors_are_internal_faults() {
        let diag = SynthError::MalformedJudgment {
            detail: "`x` is destructed but not in scope".into(),
        }
        .to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.code.as_deref(), Some("S0900"));
    }
}
