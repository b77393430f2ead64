//! Synthesis problems shared by the benchmarks.

use kea_synth::{Context, Judgment};
use kea_types::{DataTypeRegistry, Name, Type};

/// A `Bool` hole with `width` unrelated `Int` values and one `Bool` in
/// scope.
pub fn wide_scope(width: usize) -> (Context, Judgment<Type>) {
    let mut locals: Vec<(Name, Type)> = (0..width)
        .map(|i| (Name::new(format!("n{i}")), Type::int()))
        .collect();
    locals.push((Name::new("flag"), Type::bool()));
    let context = Context::new(vec![], vec![], DataTypeRegistry::with_builtins());
    (context, Judgment::top_hole(locals, [], Type::bool()))
}

/// `length : List(t0) -> Int` with `zero` and `succ` from the module.
pub fn list_length() -> (Context, Judgment<Type>) {
    let goal = Type::function(vec![Type::list(Type::var(0))], Type::int());
    let context = Context::new(
        vec![(Name::new("length"), goal.clone())],
        vec![
            (Name::new("zero"), Type::int()),
            (Name::new("succ"), Type::function(vec![Type::int()], Type::int())),
        ],
        DataTypeRegistry::with_builtins(),
    );
    let root = Judgment::top_hole([], context.ambient_hypothesis(), goal);
    (context, root)
}

/// `Int -> Option(Option(..Int..))`, `depth` options deep.
pub fn nested_option(depth: usize) -> (Context, Judgment<Type>) {
    let context = Context::new(vec![], vec![], DataTypeRegistry::with_builtins());
    let inner = (0..depth).fold(Type::int(), |ty, _| Type::option(ty));
    let goal = Type::function(vec![Type::int()], inner);
    (context, Judgment::top_hole([], [], goal))
}
