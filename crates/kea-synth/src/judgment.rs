//! Judgments: one synthesis obligation.
//!
//! A [`Judgment`] pairs a goal with the hypothesis visible at that point and
//! the provenance the structural tactics need (what came from outside the
//! definition, what has been case-split, what was bound by a pattern and
//! where it came from). Judgments are values: every operation here returns
//! a new judgment and preserves the structural invariants checked by
//! [`Judgment::validate`].

use std::collections::{BTreeMap, BTreeSet};

use kea_types::{Name, Substitution, Type};

use crate::error::SynthError;

/// One synthesis obligation over goal representation `T`.
///
/// Ordering and equality are structural so duplicate sub-goals can be
/// recognised and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Judgment<T> {
    hypothesis: BTreeMap<Name, T>,
    ambient: BTreeSet<Name>,
    destructed: BTreeSet<Name>,
    pattern_vals: BTreeSet<Name>,
    blacklist_destruct: bool,
    whitelist_split: bool,
    position_maps: BTreeMap<Name, Vec<Vec<Name>>>,
    ancestry: BTreeMap<Name, BTreeSet<Name>>,
    is_top_hole: bool,
    goal: T,
}

/// Every field of a [`Judgment`], for hosts that assemble one field by
/// field. Nothing is checked until [`Judgment::validate`] runs, which the
/// search does on every judgment it sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentParts<T> {
    pub hypothesis: BTreeMap<Name, T>,
    pub ambient: BTreeSet<Name>,
    pub destructed: BTreeSet<Name>,
    pub pattern_vals: BTreeSet<Name>,
    pub blacklist_destruct: bool,
    pub whitelist_split: bool,
    pub position_maps: BTreeMap<Name, Vec<Vec<Name>>>,
    pub ancestry: BTreeMap<Name, BTreeSet<Name>>,
    pub is_top_hole: bool,
    pub goal: T,
}

impl<T> Judgment<T> {
    /// An obligation with an empty hypothesis and permissive policy flags.
    pub fn new(goal: T) -> Self {
        Self {
            hypothesis: BTreeMap::new(),
            ambient: BTreeSet::new(),
            destructed: BTreeSet::new(),
            pattern_vals: BTreeSet::new(),
            blacklist_destruct: false,
            whitelist_split: true,
            position_maps: BTreeMap::new(),
            ancestry: BTreeMap::new(),
            is_top_hole: false,
            goal,
        }
    }

    /// The hole the user asked to fill. Local bindings shadow ambient ones
    /// of the same name.
    pub fn top_hole(
        local: impl IntoIterator<Item = (Name, T)>,
        ambient: impl IntoIterator<Item = (Name, T)>,
        goal: T,
    ) -> Self {
        let mut jdg = Self::new(goal)
            .introduce_ambient(ambient)
            .introduce_local(local);
        jdg.is_top_hole = true;
        jdg
    }

    pub fn from_parts(parts: JudgmentParts<T>) -> Self {
        Self {
            hypothesis: parts.hypothesis,
            ambient: parts.ambient,
            destructed: parts.destructed,
            pattern_vals: parts.pattern_vals,
            blacklist_destruct: parts.blacklist_destruct,
            whitelist_split: parts.whitelist_split,
            position_maps: parts.position_maps,
            ancestry: parts.ancestry,
            is_top_hole: parts.is_top_hole,
            goal: parts.goal,
        }
    }

    pub fn into_parts(self) -> JudgmentParts<T> {
        JudgmentParts {
            hypothesis: self.hypothesis,
            ambient: self.ambient,
            destructed: self.destructed,
            pattern_vals: self.pattern_vals,
            blacklist_destruct: self.blacklist_destruct,
            whitelist_split: self.whitelist_split,
            position_maps: self.position_maps,
            ancestry: self.ancestry,
            is_top_hole: self.is_top_hole,
            goal: self.goal,
        }
    }

    // -- queries -------------------------------------------------------------

    pub fn goal(&self) -> &T {
        &self.goal
    }

    pub fn hypothesis(&self) -> &BTreeMap<Name, T> {
        &self.hypothesis
    }

    pub fn lookup(&self, name: &Name) -> Option<&T> {
        self.hypothesis.get(name)
    }

    /// Bindings that came from outside the definition under construction.
    pub fn ambient_hypothesis(&self) -> impl Iterator<Item = (&Name, &T)> {
        self.hypothesis
            .iter()
            .filter(|(name, _)| self.ambient.contains(*name))
    }

    /// Bindings introduced while building this definition.
    pub fn local_hypothesis(&self) -> impl Iterator<Item = (&Name, &T)> {
        self.hypothesis
            .iter()
            .filter(|(name, _)| !self.ambient.contains(*name))
    }

    pub fn is_ambient(&self, name: &Name) -> bool {
        self.ambient.contains(name)
    }

    pub fn is_pattern_val(&self, name: &Name) -> bool {
        self.pattern_vals.contains(name)
    }

    pub fn pattern_vals(&self) -> &BTreeSet<Name> {
        &self.pattern_vals
    }

    pub fn has_destructed(&self, name: &Name) -> bool {
        self.destructed.contains(name)
    }

    pub fn destructed(&self) -> &BTreeSet<Name> {
        &self.destructed
    }

    /// The names `name` was (transitively) derived from by pattern matching.
    pub fn ancestry_of(&self, name: &Name) -> Option<&BTreeSet<Name>> {
        self.ancestry.get(name)
    }

    /// For a function being defined, the names standing for each of its
    /// parameters, by position.
    pub fn position_map(&self, func: &Name) -> Option<&[Vec<Name>]> {
        self.position_maps.get(func).map(Vec::as_slice)
    }

    /// Whether `arg` was obtained by pattern matching on the value bound to
    /// parameter `index` of `func`.
    pub fn is_smaller_at(&self, func: &Name, index: usize, arg: &Name) -> bool {
        let Some(params) = self.position_maps.get(func).and_then(|map| map.get(index)) else {
            return false;
        };
        self.is_pattern_val(arg)
            && self
                .ancestry_of(arg)
                .is_some_and(|lineage| params.iter().any(|param| lineage.contains(param)))
    }

    pub fn blacklist_destruct(&self) -> bool {
        self.blacklist_destruct
    }

    pub fn whitelist_split(&self) -> bool {
        self.whitelist_split
    }

    pub fn is_top_hole(&self) -> bool {
        self.is_top_hole
    }

    // -- updates -------------------------------------------------------------

    pub fn with_goal(mut self, goal: T) -> Self {
        self.goal = goal;
        self
    }

    /// Map the goal representation, and with it every hypothesis type. Name
    /// bookkeeping is carried over untouched.
    pub fn map_goal<U>(self, mut f: impl FnMut(T) -> U) -> Judgment<U> {
        Judgment {
            hypothesis: self
                .hypothesis
                .into_iter()
                .map(|(name, ty)| (name, f(ty)))
                .collect(),
            ambient: self.ambient,
            destructed: self.destructed,
            pattern_vals: self.pattern_vals,
            blacklist_destruct: self.blacklist_destruct,
            whitelist_split: self.whitelist_split,
            position_maps: self.position_maps,
            ancestry: self.ancestry,
            is_top_hole: self.is_top_hole,
            goal: f(self.goal),
        }
    }

    /// Bind new local names. A rebound name loses whatever provenance the
    /// binding it shadows had.
    pub fn introduce_local(mut self, bindings: impl IntoIterator<Item = (Name, T)>) -> Self {
        for (name, ty) in bindings {
            self.forget(&name);
            self.hypothesis.insert(name, ty);
        }
        self
    }

    pub fn introduce_ambient(mut self, bindings: impl IntoIterator<Item = (Name, T)>) -> Self {
        for (name, ty) in bindings {
            self.forget(&name);
            self.ambient.insert(name.clone());
            self.hypothesis.insert(name, ty);
        }
        self
    }

    /// Bind the fields of a constructor pattern matched against `from`.
    /// Each new name descends from `from` and everything `from` descends
    /// from.
    pub fn introduce_pattern_vals(
        mut self,
        from: &Name,
        bindings: impl IntoIterator<Item = (Name, T)>,
    ) -> Self {
        let mut lineage = self.ancestry.get(from).cloned().unwrap_or_default();
        lineage.insert(from.clone());
        for (name, ty) in bindings {
            self.forget(&name);
            self.pattern_vals.insert(name.clone());
            self.ancestry.insert(name.clone(), lineage.clone());
            self.hypothesis.insert(name, ty);
        }
        self
    }

    /// Names outside the hypothesis are ignored.
    pub fn mark_destructed(mut self, name: &Name) -> Self {
        if self.hypothesis.contains_key(name) {
            self.destructed.insert(name.clone());
        }
        self
    }

    /// Record which names stand for each parameter of `func`.
    pub fn record_position_map(mut self, func: &Name, positions: Vec<Vec<Name>>) -> Self {
        self.position_maps.insert(func.clone(), positions);
        self
    }

    pub fn disallow_destruct(mut self) -> Self {
        self.blacklist_destruct = true;
        self
    }

    pub fn restrict_split(mut self) -> Self {
        self.whitelist_split = false;
        self
    }

    pub fn unset_top_hole(mut self) -> Self {
        self.is_top_hole = false;
        self
    }

    /// Keep only the bindings `keep` accepts, dropping their provenance too.
    pub fn filter_hypothesis(mut self, mut keep: impl FnMut(&Name, &T) -> bool) -> Self {
        let dropped: Vec<Name> = self
            .hypothesis
            .iter()
            .filter(|(name, ty)| !keep(name, ty))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &dropped {
            self.forget(name);
            self.hypothesis.remove(name);
        }
        self
    }

    fn forget(&mut self, name: &Name) {
        self.ambient.remove(name);
        self.destructed.remove(name);
        self.pattern_vals.remove(name);
        self.ancestry.remove(name);
    }

    /// Check the structural invariants: destructed names, pattern values,
    /// and ambient names must all be bound in the hypothesis.
    pub fn validate(&self) -> Result<(), SynthError> {
        let sets = [
            ("destructed", &self.destructed),
            ("pattern-bound", &self.pattern_vals),
            ("ambient", &self.ambient),
        ];
        for (what, names) in sets {
            if let Some(stray) = names.iter().find(|n| !self.hypothesis.contains_key(*n)) {
                return Err(SynthError::MalformedJudgment {
                    detail: format!("`{stray}` is {what} but not in the hypothesis"),
                });
            }
        }
        Ok(())
    }
}

impl Judgment<Type> {
    /// Apply `subst` to the goal and every hypothesis type.
    pub fn resolve(self, subst: &Substitution) -> Self {
        if subst.is_empty() {
            return self;
        }
        self.map_goal(|ty| subst.apply(&ty))
    }
}
