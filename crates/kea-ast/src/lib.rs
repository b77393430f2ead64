//! Program fragments produced by Kea hole synthesis.
//!
//! This crate defines the expression tree that tactics build when a hole is
//! filled. Only the shapes backward reasoning can produce are represented.
//! `Expr::Hole` marks a sub-goal that was left unsolved.

use kea_types::Name;

/// A synthesized expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expr {
    /// Reference to a hypothesis or top-level function.
    Var(Name),
    /// `|params| body`
    Lambda { params: Vec<Name>, body: Box<Expr> },
    /// `func(args)`
    App { func: Box<Expr>, args: Vec<Expr> },
    /// Data constructor application: `Cons(x, xs)`.
    Con { name: String, args: Vec<Expr> },
    Tuple(Vec<Expr>),
    /// `case scrutinee` with one arm per constructor.
    Case {
        scrutinee: Box<Expr>,
        arms: Vec<CaseArm>,
    },
    /// An unsolved sub-goal.
    Hole,
}

/// One arm of a case split: `Cons(x, xs) -> body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseArm {
    pub constructor: String,
    pub binders: Vec<Name>,
    pub body: Expr,
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(Name::new(name))
    }

    pub fn lambda(params: Vec<Name>, body: Expr) -> Self {
        Expr::Lambda {
            params,
            body: Box::new(body),
        }
    }

    pub fn app(func: Expr, args: Vec<Expr>) -> Self {
        Expr::App {
            func: Box::new(func),
            args,
        }
    }

    pub fn con(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Con {
            name: name.into(),
            args,
        }
    }

    pub fn case(scrutinee: Expr, arms: Vec<CaseArm>) -> Self {
        Expr::Case {
            scrutinee: Box::new(scrutinee),
            arms,
        }
    }
}
