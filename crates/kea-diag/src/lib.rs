//! Diagnostics for Kea hole synthesis.
//!
//! Search failures are ordinary and frequent; most never reach a user. The
//! ones that do (a hole with no solution, a search that hit its budget, or
//! an internal fault) are turned into the structured diagnostics defined
//! here by `kea-synth` and rendered by the host.

use std::fmt;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// A tactic referred to a name that is not in scope.
    UndefinedName,
    /// A goal or hypothesis had the wrong shape or type for a tactic.
    TypeMismatch,
    /// A tactic finished but left goals open.
    UnsolvedGoal,
    /// No tactic could make progress on a goal.
    NoProgress,
    /// A case split or constructor split that would not help.
    UnhelpfulStructure,
    /// A recursive call that does not shrink its argument.
    Termination,
    /// A goal too polymorphic to split or destruct.
    TooPolymorphic,
    /// The search space was exhausted without a solution.
    NoSolution,
    /// The search stopped at its node or time budget.
    SearchCutoff,
    /// An engine invariant was violated.
    InternalFault,
}

impl Category {
    pub fn code(self) -> &'static str {
        match self {
            Category::UndefinedName => "S0001",
            Category::TypeMismatch => "S0002",
            Category::UnsolvedGoal => "S0003",
            Category::NoProgress => "S0004",
            Category::UnhelpfulStructure => "S0005",
            Category::Termination => "S0006",
            Category::TooPolymorphic => "S0007",
            Category::NoSolution => "S0100",
            Category::SearchCutoff => "S0101",
            Category::InternalFault => "S0900",
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. S0100).
    pub code: Option<String>,
    pub severity: Severity,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Supporting lines, e.g. the reasons individual branches were pruned.
    pub notes: Vec<String>,
    /// Suggested fix, if any.
    pub help: Option<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity,
            category,
            message: message.into(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, category, message)
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, category, message)
    }

    pub fn info(category: Category, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Info, category, message)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        if let Some(code) = &self.code {
            write!(f, "{prefix}[{code}]: {}", self.message)?;
        } else {
            write!(f, "{prefix}: {}", self.message)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }
}
