//! Named tactics, for hosts that pick strategies by name.

use kea_ast::Expr;
use kea_synth::{Fragment, SynthError, Tactic};

use crate::{Apply, Assumption, DEFAULT_AUTO_DEPTH, DestructAll, Intro, Recursion, Split, auto};

/// Tactics in registration order. Names are unique.
#[derive(Debug, Clone)]
pub struct TacticRegistry<E> {
    entries: Vec<(String, Tactic<E>)>,
}

impl<E> Default for TacticRegistry<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: Fragment> TacticRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, tactic: Tactic<E>) -> Result<(), SynthError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(SynthError::DuplicateRule(name));
        }
        self.entries.push((name, tactic));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tactic<E>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, tactic)| tactic)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every registered tactic as one choice, in registration order.
    pub fn choice(&self) -> Tactic<E> {
        Tactic::choice(self.entries.iter().map(|(_, tactic)| tactic.clone()).collect())
    }
}

impl TacticRegistry<Expr> {
    /// The rules of this crate plus `auto` at [`DEFAULT_AUTO_DEPTH`].
    pub fn standard() -> Self {
        let entries = vec![
            ("assumption", Tactic::rule(Assumption)),
            ("intro", Tactic::rule(Intro)),
            ("split", Tactic::rule(Split)),
            ("destruct_all", Tactic::rule(DestructAll)),
            ("apply", Tactic::rule(Apply)),
            ("recursion", Tactic::rule(Recursion)),
            ("auto", auto(DEFAULT_AUTO_DEPTH)),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(name, tactic)| (name.to_string(), tactic))
                .collect(),
        }
    }
}
