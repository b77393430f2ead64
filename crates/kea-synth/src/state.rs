//! Search state threaded through one root synthesis request.
//!
//! The state is a plain value. Every transition consumes it and returns the
//! updated copy; the search clones it at each choice point, so an alternative
//! only ever sees the state as of its own entry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use kea_types::{Name, Substitution, Type, TypeVarId, free_type_vars};

use crate::error::TacticError;

/// A fresh identifier handed out by [`SearchState::fresh_unique`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unique(pub u64);

impl fmt::Display for Unique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic source of [`Unique`]s. Seeded explicitly; there is no
/// process-wide default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueSource {
    next: u64,
}

impl UniqueSource {
    pub fn seeded(seed: u64) -> Self {
        Self { next: seed }
    }

    fn take(self) -> (Unique, Self) {
        let id = Unique(self.next);
        (
            id,
            Self {
                next: self.next.wrapping_add(1),
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    skolems: Vec<TypeVarId>,
    unifier: Substitution,
    used_vals: BTreeSet<Name>,
    intro_vals: BTreeSet<Name>,
    unused_top_vals: BTreeSet<Name>,
    recursion_stack: Vec<bool>,
    recursion_penalty: u32,
    unique_source: UniqueSource,
    next_type_var: u32,
}

impl SearchState {
    /// Empty bookkeeping, identity substitution, zero penalty, and a unique
    /// source seeded with `seed`.
    pub fn initial(seed: u64) -> Self {
        Self {
            skolems: Vec::new(),
            unifier: Substitution::new(),
            used_vals: BTreeSet::new(),
            intro_vals: BTreeSet::new(),
            unused_top_vals: BTreeSet::new(),
            recursion_stack: Vec::new(),
            recursion_penalty: 0,
            unique_source: UniqueSource::seeded(seed),
            next_type_var: 0,
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn skolems(&self) -> &[TypeVarId] {
        &self.skolems
    }

    pub fn unifier(&self) -> &Substitution {
        &self.unifier
    }

    pub fn used_vals(&self) -> &BTreeSet<Name> {
        &self.used_vals
    }

    pub fn intro_vals(&self) -> &BTreeSet<Name> {
        &self.intro_vals
    }

    pub fn unused_top_vals(&self) -> &BTreeSet<Name> {
        &self.unused_top_vals
    }

    pub fn recursion_stack(&self) -> &[bool] {
        &self.recursion_stack
    }

    pub fn recursion_penalty(&self) -> u32 {
        self.recursion_penalty
    }

    // -- transitions ---------------------------------------------------------

    pub fn fresh_unique(self) -> (Unique, Self) {
        let (id, unique_source) = self.unique_source.clone().take();
        (
            id,
            Self {
                unique_source,
                ..self
            },
        )
    }

    /// A name built from `hint` and a fresh unique that `taken` rejects.
    pub fn fresh_name(self, hint: &str, taken: impl Fn(&Name) -> bool) -> (Name, Self) {
        let mut state = self;
        loop {
            let (id, next) = state.fresh_unique();
            state = next;
            let candidate = Name::new(format!("{hint}{id}"));
            if !taken(&candidate) {
                return (candidate, state);
            }
        }
    }

    /// Skolems are append-only; duplicates are dropped.
    pub fn with_skolems(mut self, vars: impl IntoIterator<Item = TypeVarId>) -> Self {
        for var in vars {
            if !self.skolems.contains(&var) {
                self.skolems.push(var);
            }
        }
        self
    }

    pub fn with_unifier(mut self, f: impl FnOnce(Substitution) -> Substitution) -> Self {
        self.unifier = f(self.unifier);
        self
    }

    pub fn with_used_vals(mut self, f: impl FnOnce(BTreeSet<Name>) -> BTreeSet<Name>) -> Self {
        self.used_vals = f(self.used_vals);
        self
    }

    pub fn with_introduced_vals(
        mut self,
        f: impl FnOnce(BTreeSet<Name>) -> BTreeSet<Name>,
    ) -> Self {
        self.intro_vals = f(self.intro_vals);
        self
    }

    pub fn with_unused_top_vals(
        mut self,
        f: impl FnOnce(BTreeSet<Name>) -> BTreeSet<Name>,
    ) -> Self {
        self.unused_top_vals = f(self.unused_top_vals);
        self
    }

    pub fn with_recursion_stack(mut self, f: impl FnOnce(Vec<bool>) -> Vec<bool>) -> Self {
        self.recursion_stack = f(self.recursion_stack);
        self
    }

    /// Record that `name` was consumed by a fragment.
    pub fn use_value(self, name: &Name) -> Self {
        self.with_used_vals(|mut used| {
            used.insert(name.clone());
            used
        })
        .with_unused_top_vals(|mut unused| {
            unused.remove(name);
            unused
        })
    }

    pub fn charge_recursion(mut self, cost: u32) -> Self {
        self.recursion_penalty = self.recursion_penalty.saturating_add(cost);
        self
    }

    /// Unify under the current substitution, treating skolems as rigid.
    pub fn unify(mut self, expected: &Type, actual: &Type) -> Result<Self, TacticError> {
        let skolems: BTreeSet<TypeVarId> = self.skolems.iter().copied().collect();
        match kea_types::unify(&self.unifier, &skolems, expected, actual) {
            Ok(unifier) => {
                self.unifier = unifier;
                Ok(self)
            }
            Err(_) => Err(TacticError::UnificationError(
                self.unifier.apply(expected),
                self.unifier.apply(actual),
            )),
        }
    }

    /// Make sure fresh type variables never collide with `vars`.
    pub fn reserve_type_vars(mut self, vars: impl IntoIterator<Item = TypeVarId>) -> Self {
        for var in vars {
            self.next_type_var = self.next_type_var.max(var.0.saturating_add(1));
        }
        self
    }

    pub fn fresh_type_var(mut self) -> (TypeVarId, Self) {
        let var = TypeVarId(self.next_type_var);
        self.next_type_var = self.next_type_var.saturating_add(1);
        (var, self)
    }

    /// Replace every free variable of `ty` that is not a skolem with a fresh
    /// one. Meant for the declared type of a function used from outside the
    /// definition; types already in play keep their variables.
    pub fn instantiate(self, ty: &Type) -> (Type, Self) {
        let ty = self.apply(ty);
        let mut state = self;
        let mut mapping = BTreeMap::new();
        for var in free_type_vars(&ty) {
            if state.skolems.contains(&var) {
                continue;
            }
            let (fresh, next) = state.fresh_type_var();
            state = next;
            mapping.insert(var, Type::Var(fresh));
        }
        (kea_types::instantiate(&ty, &mapping), state)
    }

    /// Resolve `ty` through the accumulated substitution.
    pub fn apply(&self, ty: &Type) -> Type {
        self.unifier.apply(ty)
    }
}
