//! The rule abstraction applied to every resolved call site.

use crate::ast::CallExpr;
use crate::symbols::{ResolvedFunc, SymbolTable};
use crate::types::{Severity, Suggestion};

/// What a rule reports about one call; the dispatcher adds position,
/// severity and rule identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Human-readable message.
    pub message: String,
    /// Optional fix hint.
    pub suggestion: Option<Suggestion>,
}

impl Finding {
    /// Creates a finding with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attaches a fix hint.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(Suggestion::new(suggestion));
        self
    }
}

/// A call-site lint rule.
///
/// Rules are stateless and independent: the dispatcher hands each one every
/// call whose callee resolved to a function, together with the read-only
/// symbol table, and a rule answers with at most one [`Finding`].
///
/// # Example
///
/// ```ignore
/// use logstyle_core::{Finding, Linter, ResolvedFunc, SymbolTable};
/// use logstyle_core::ast::CallExpr;
///
/// pub struct NoPanic;
///
/// impl Linter for NoPanic {
///     fn name(&self) -> &'static str { "no-panic" }
///     fn code(&self) -> &'static str { "LS900" }
///
///     fn inspect(&self, _: &SymbolTable, _: &CallExpr, func: &ResolvedFunc<'_>) -> Option<Finding> {
///         (func.package.is_none() && func.name == "panic").then(|| Finding::new("panic call"))
///     }
/// }
/// ```
pub trait Linter: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "constant-message").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "LS001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Inspects one call whose callee resolved to `func`.
    fn inspect(
        &self,
        symbols: &SymbolTable,
        call: &CallExpr,
        func: &ResolvedFunc<'_>,
    ) -> Option<Finding>;
}

/// Type alias for boxed [`Linter`] trait objects.
pub type LinterBox = Box<dyn Linter>;

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedOnly;

    impl Linter for NamedOnly {
        fn name(&self) -> &'static str {
            "named-only"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }

        fn inspect(&self, _: &SymbolTable, _: &CallExpr, func: &ResolvedFunc<'_>) -> Option<Finding> {
            func.recv.is_none().then(|| Finding::new("plain function"))
        }
    }

    #[test]
    fn defaults() {
        let rule = NamedOnly;
        assert_eq!(rule.default_severity(), Severity::Error);
        assert_eq!(rule.description(), "");
    }

    #[test]
    fn finding_builder() {
        let finding = Finding::new("msg").with_suggestion("fix it");
        assert_eq!(finding.message, "msg");
        assert_eq!(finding.suggestion, Some(Suggestion::new("fix it")));
    }
}
