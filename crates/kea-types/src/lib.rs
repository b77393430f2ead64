//! Type representations for Kea hole synthesis.
//!
//! This crate defines the goal types the synthesis engine reasons about,
//! the substitution accumulated by unification, and the algebraic data type
//! declarations that case-splitting and constructor tactics consult. These
//! are distinct from the program fragments synthesis produces (which live in
//! `kea-ast`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a type variable.
///
/// Whether a variable is rigid (a skolem) or unifiable is decided by the
/// caller of [`unify`], not by the identifier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub u32);

/// A value-level name: a hypothesis binding, a function, or a pattern binder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A goal type.
///
/// Structural equality and the derived total order are what the synthesis
/// engine relies on for deduplicating judgments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// A type variable, rigid or unifiable depending on context.
    Var(TypeVarId),
    /// A nominal type constructor applied to arguments: `Int`, `List(a)`.
    Con(String, Vec<Type>),
    Function(FunctionType),
    Tuple(Vec<Type>),
}

/// Function type: `(params) -> ret`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }
}

impl Type {
    /// A nullary nominal type such as `Int`.
    pub fn named(name: impl Into<String>) -> Self {
        Type::Con(name.into(), Vec::new())
    }

    pub fn app(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Con(name.into(), args)
    }

    pub fn var(id: u32) -> Self {
        Type::Var(TypeVarId(id))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(FunctionType::new(params, ret))
    }

    pub fn int() -> Self {
        Type::named("Int")
    }

    pub fn bool() -> Self {
        Type::named("Bool")
    }

    pub fn list(element: Type) -> Self {
        Type::app("List", vec![element])
    }

    pub fn option(inner: Type) -> Self {
        Type::app("Option", vec![inner])
    }

    pub fn unit() -> Self {
        Type::Tuple(Vec::new())
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(ft) => Some(ft),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Type::Var(_))
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Var(v) => write!(f, "t{}", v.0),
            Type::Con(name, args) if args.is_empty() => f.write_str(name),
            Type::Con(name, args) => {
                write!(f, "{name}(")?;
                write_comma_separated(f, args)?;
                write!(f, ")")
            }
            Type::Function(ft) => {
                write!(f, "(")?;
                write_comma_separated(f, &ft.params)?;
                write!(f, ") -> {}", ft.ret)
            }
            Type::Tuple(elems) => {
                write!(f, "(")?;
                write_comma_separated(f, elems)?;
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_comma_separated(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Free variable computation
// ---------------------------------------------------------------------------

/// Collect all free type variables in a type.
pub fn free_type_vars(ty: &Type) -> BTreeSet<TypeVarId> {
    let mut vars = BTreeSet::new();
    collect_free_type_vars(ty, &mut vars);
    vars
}

fn collect_free_type_vars(ty: &Type, vars: &mut BTreeSet<TypeVarId>) {
    match ty {
        Type::Var(v) => {
            vars.insert(*v);
        }
        Type::Con(_, args) | Type::Tuple(args) => {
            for arg in args {
                collect_free_type_vars(arg, vars);
            }
        }
        Type::Function(ft) => {
            for param in &ft.params {
                collect_free_type_vars(param, vars);
            }
            collect_free_type_vars(&ft.ret, vars);
        }
    }
}

fn occurs_in(var: TypeVarId, ty: &Type) -> bool {
    match ty {
        Type::Var(v) => *v == var,
        Type::Con(_, args) | Type::Tuple(args) => args.iter().any(|arg| occurs_in(var, arg)),
        Type::Function(ft) => {
            ft.params.iter().any(|param| occurs_in(var, param)) || occurs_in(var, &ft.ret)
        }
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Maps unification variables to their resolved types.
///
/// Bindings are only ever added; a branch of the search that needs a
/// different answer works on its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    type_map: BTreeMap<TypeVarId, Type>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `var` to `ty`. Identity bindings are dropped so that
    /// [`Substitution::apply`] always terminates.
    pub fn bind_type(&mut self, var: TypeVarId, ty: Type) {
        if ty == Type::Var(var) {
            return;
        }
        self.type_map.insert(var, ty);
    }

    pub fn lookup_type(&self, var: TypeVarId) -> Option<&Type> {
        self.type_map.get(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.type_map.len()
    }

    /// Apply this substitution to a type, replacing all bound variables.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(v) => match self.lookup_type(*v) {
                Some(resolved) => self.apply(resolved),
                None => ty.clone(),
            },
            Type::Con(name, args) => {
                Type::Con(name.clone(), args.iter().map(|arg| self.apply(arg)).collect())
            }
            Type::Function(ft) => Type::Function(FunctionType {
                params: ft.params.iter().map(|param| self.apply(param)).collect(),
                ret: Box::new(self.apply(&ft.ret)),
            }),
            Type::Tuple(elems) => Type::Tuple(elems.iter().map(|elem| self.apply(elem)).collect()),
        }
    }
}

/// Replace variables in `ty` according to `mapping` in a single pass.
///
/// Unlike [`Substitution::apply`] the replacement is not re-resolved, so a
/// mapping may safely send a variable to a type mentioning that variable.
pub fn instantiate(ty: &Type, mapping: &BTreeMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::Var(v) => mapping.get(v).cloned().unwrap_or_else(|| ty.clone()),
        Type::Con(name, args) => Type::Con(
            name.clone(),
            args.iter().map(|arg| instantiate(arg, mapping)).collect(),
        ),
        Type::Function(ft) => Type::Function(FunctionType {
            params: ft
                .params
                .iter()
                .map(|param| instantiate(param, mapping))
                .collect(),
            ret: Box::new(instantiate(&ft.ret, mapping)),
        }),
        Type::Tuple(elems) => Type::Tuple(
            elems
                .iter()
                .map(|elem| instantiate(elem, mapping))
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Unification
// ---------------------------------------------------------------------------

/// Why two types failed to unify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    /// Structurally different types.
    Mismatch { expected: Type, actual: Type },
    /// Binding would create an infinite type.
    OccursCheck { var: TypeVarId, ty: Type },
    /// A rigid variable cannot be bound to anything but itself.
    RigidVariable { var: TypeVarId, ty: Type },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyError::Mismatch { expected, actual } => {
                write!(f, "expected `{expected}`, got `{actual}`")
            }
            UnifyError::OccursCheck { var, ty } => {
                write!(f, "infinite type: `t{}` occurs in `{ty}`", var.0)
            }
            UnifyError::RigidVariable { var, ty } => {
                write!(f, "rigid type variable `t{}` cannot be `{ty}`", var.0)
            }
        }
    }
}

/// Unify `expected` with `actual` on top of `subst`.
///
/// Variables in `skolems` are rigid: they may only be equated with
/// themselves or have a unifiable variable bound to them. On success the
/// refined substitution is returned; `subst` itself is never modified.
pub fn unify(
    subst: &Substitution,
    skolems: &BTreeSet<TypeVarId>,
    expected: &Type,
    actual: &Type,
) -> Result<Substitution, UnifyError> {
    let mut refined = subst.clone();
    unify_into(&mut refined, skolems, expected, actual)?;
    Ok(refined)
}

fn unify_into(
    subst: &mut Substitution,
    skolems: &BTreeSet<TypeVarId>,
    expected: &Type,
    actual: &Type,
) -> Result<(), UnifyError> {
    let expected = subst.apply(expected);
    let actual = subst.apply(actual);

    match (&expected, &actual) {
        _ if expected == actual => Ok(()),

        (Type::Var(v), other) | (other, Type::Var(v)) if !skolems.contains(v) => {
            bind_var(subst, *v, other)
        }
        (Type::Var(v), other) | (other, Type::Var(v)) => Err(UnifyError::RigidVariable {
            var: *v,
            ty: other.clone(),
        }),

        (Type::Con(left_name, left_args), Type::Con(right_name, right_args))
            if left_name == right_name && left_args.len() == right_args.len() =>
        {
            for (left, right) in left_args.iter().zip(right_args) {
                unify_into(subst, skolems, left, right)?;
            }
            Ok(())
        }
        (Type::Function(left), Type::Function(right))
            if left.params.len() == right.params.len() =>
        {
            for (left_param, right_param) in left.params.iter().zip(&right.params) {
                unify_into(subst, skolems, left_param, right_param)?;
            }
            unify_into(subst, skolems, &left.ret, &right.ret)
        }
        (Type::Tuple(left), Type::Tuple(right)) if left.len() == right.len() => {
            for (left_elem, right_elem) in left.iter().zip(right) {
                unify_into(subst, skolems, left_elem, right_elem)?;
            }
            Ok(())
        }

        _ => Err(UnifyError::Mismatch {
            expected: expected.clone(),
            actual: actual.clone(),
        }),
    }
}

fn bind_var(subst: &mut Substitution, var: TypeVarId, ty: &Type) -> Result<(), UnifyError> {
    if occurs_in(var, ty) {
        return Err(UnifyError::OccursCheck {
            var,
            ty: ty.clone(),
        });
    }
    subst.bind_type(var, ty.clone());
    Ok(())
}

// ---------------------------------------------------------------------------
// Algebraic data types
// ---------------------------------------------------------------------------

/// One constructor of a data type, with positional field types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCon {
    pub name: String,
    pub fields: Vec<Type>,
}

impl DataCon {
    pub fn new(name: impl Into<String>, fields: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// A nominal algebraic data type: `type List(a) = Nil | Cons(a, List(a))`.
///
/// Field types refer to the declaration's parameters through `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDecl {
    pub name: String,
    pub params: Vec<TypeVarId>,
    pub constructors: Vec<DataCon>,
}

impl DataDecl {
    pub fn new(name: impl Into<String>, params: Vec<TypeVarId>, constructors: Vec<DataCon>) -> Self {
        Self {
            name: name.into(),
            params,
            constructors,
        }
    }
}

/// Data types visible to synthesis, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct DataTypeRegistry {
    types: BTreeMap<String, DataDecl>,
}

impl DataTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with `Bool`, `Option(a)`, `List(a)` and
    /// `Result(a, e)`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let a = TypeVarId(0);
        let e = TypeVarId(1);
        registry.register(DataDecl::new(
            "Bool",
            vec![],
            vec![DataCon::new("True", vec![]), DataCon::new("False", vec![])],
        ));
        registry.register(DataDecl::new(
            "Option",
            vec![a],
            vec![
                DataCon::new("None", vec![]),
                DataCon::new("Some", vec![Type::Var(a)]),
            ],
        ));
        registry.register(DataDecl::new(
            "List",
            vec![a],
            vec![
                DataCon::new("Nil", vec![]),
                DataCon::new("Cons", vec![Type::Var(a), Type::list(Type::Var(a))]),
            ],
        ));
        registry.register(DataDecl::new(
            "Result",
            vec![a, e],
            vec![
                DataCon::new("Ok", vec![Type::Var(a)]),
                DataCon::new("Err", vec![Type::Var(e)]),
            ],
        ));
        registry
    }

    /// Register a declaration, returning the one it replaced.
    pub fn register(&mut self, decl: DataDecl) -> Option<DataDecl> {
        self.types.insert(decl.name.clone(), decl)
    }

    pub fn get(&self, name: &str) -> Option<&DataDecl> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataDecl> {
        self.types.values()
    }

    /// The constructors of `ty` with field types instantiated at `ty`'s
    /// arguments, in declaration order.
    ///
    /// Returns `None` when `ty` is not a registered nominal type or is
    /// applied to the wrong number of arguments.
    pub fn constructors_of(&self, ty: &Type) -> Option<Vec<DataCon>> {
        let Type::Con(name, args) = ty else {
            return None;
        };
        let decl = self.get(name)?;
        if decl.params.len() != args.len() {
            return None;
        }
        let mapping: BTreeMap<TypeVarId, Type> =
            decl.params.iter().copied().zip(args.iter().cloned()).collect();
        Some(
            decl.constructors
                .iter()
                .map(|con| DataCon {
                    name: con.name.clone(),
                    fields: con
                        .fields
                        .iter()
                        .map(|field| instantiate(field, &mapping))
                        .collect(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_skolems() -> BTreeSet<TypeVarId> {
        BTreeSet::new()
    }

    #[test]
    fn display_uses_kea_syntax() {
        let ty = Type::function(vec![Type::list(Type::var(0)), Type::int()], Type::bool());
        assert_eq!(ty.to_string(), "(List(t0), Int) -> Bool");
        assert_eq!(Type::unit().to_string(), "()");
        assert_eq!(Type::Tuple(vec![Type::int()]).to_string(), "(Int,)");
    }

    #[test]
    fn unify_binds_flexible_variable() {
        let subst = unify(&Substitution::new(), &no_skolems(), &Type::var(0), &Type::int())
            .expect("variable should bind");
        assert_eq!(subst.apply(&Type::var(0)), Type::int());
    }

    #[test]
    fn unify_transitive() {
        let subst = unify(&Substitution::new(), &no_skolems(), &Type::var(0), &Type::var(1))
            .and_then(|s| unify(&s, &no_skolems(), &Type::var(1), &Type::bool()))
            .expect("chain should unify");
        assert_eq!(subst.apply(&Type::var(0)), Type::bool());
    }

    #[test]
    fn unify_rejects_binding_skolem() {
        let skolems = BTreeSet::from([TypeVarId(0)]);
        let err = unify(&Substitution::new(), &skolems, &Type::var(0), &Type::int())
            .expect_err("skolem must stay rigid");
        assert!(matches!(err, UnifyError::RigidVariable { var: TypeVarId(0), .. }));
    }

    #[test]
    fn unify_binds_flexible_variable_to_skolem() {
        let skolems = BTreeSet::from([TypeVarId(0)]);
        let subst = unify(&Substitution::new(), &skolems, &Type::var(0), &Type::var(1))
            .expect("flexible side should bind");
        assert_eq!(subst.apply(&Type::var(1)), Type::var(0));
    }

    #[test]
    fn unify_occurs_check() {
        let err = unify(
            &Substitution::new(),
            &no_skolems(),
            &Type::var(0),
            &Type::list(Type::var(0)),
        )
        .expect_err("infinite type");
        assert!(matches!(err, UnifyError::OccursCheck { .. }));
    }

    #[test]
    fn unify_does_not_touch_input_substitution() {
        let base = Substitution::new();
        let _ = unify(&base, &no_skolems(), &Type::var(3), &Type::int());
        assert!(base.is_empty());
    }

    #[test]
    fn constructors_are_instantiated_at_arguments() {
        let registry = DataTypeRegistry::with_builtins();
        let cons = registry
            .constructors_of(&Type::list(Type::int()))
            .expect("List is builtin");
        assert_eq!(cons.len(), 2);
        assert_eq!(cons[1].name, "Cons");
        assert_eq!(cons[1].fields, vec![Type::int(), Type::list(Type::int())]);
    }

    #[test]
    fn constructors_instantiate_without_looping_on_own_params() {
        let registry = DataTypeRegistry::with_builtins();
        let cons = registry
            .constructors_of(&Type::list(Type::var(0)))
            .expect("List is builtin");
        assert_eq!(cons[1].fields, vec![Type::var(0), Type::list(Type::var(0))]);
    }

    #[test]
    fn unknown_or_misapplied_types_have_no_constructors() {
        let registry = DataTypeRegistry::with_builtins();
        assert!(registry.constructors_of(&Type::int()).is_none());
        assert!(registry.constructors_of(&Type::named("List")).is_none());
        assert!(registry.constructors_of(&Type::var(0)).is_none());
    }

    fn arb_type(depth: u32) -> BoxedStrategy<Type> {
        let leaf = prop_oneof![
            Just(Type::int()),
            Just(Type::bool()),
            (0u32..4).prop_map(Type::var),
        ];
        if depth == 0 {
            return leaf.boxed();
        }
        let inner = arb_type(depth - 1);
        prop_oneof![
            2 => leaf,
            1 => inner.clone().prop_map(Type::list),
            1 => (inner.clone(), inner.clone())
                .prop_map(|(param, ret)| Type::function(vec![param], ret)),
            1 => prop::collection::vec(inner, 0..3).prop_map(Type::Tuple),
        ]
        .boxed()
    }

    proptest! {
        #[test]
        fn unify_is_reflexive(ty in arb_type(3)) {
            prop_assert!(unify(&Substitution::new(), &no_skolems(), &ty, &ty).is_ok());
        }

        #[test]
        fn unify_makes_sides_equal(left in arb_type(2), right in arb_type(2)) {
            if let Ok(subst) = unify(&Substitution::new(), &no_skolems(), &left, &right) {
                prop_assert_eq!(subst.apply(&left), subst.apply(&right));
            }
        }

        #[test]
        fn apply_is_idempotent(left in arb_type(2), right in arb_type(2), sample in arb_type(2)) {
            if let Ok(subst) = unify(&Substitution::new(), &no_skolems(), &left, &right) {
                let once = subst.apply(&sample);
                prop_assert_eq!(subst.apply(&once), once);
            }
        }
    }
}
