//! Call-site dispatcher: walks a checked package and runs every rule on
//! every resolved call.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::ast::{ExprKind, File};
use crate::config::{Config, ConfigError};
use crate::fileset::FileSet;
use crate::report::Reporter;
use crate::rule::{Linter, LinterBox};
use crate::source::{CheckedPackage, LoadError, TypedAstSource};
use crate::symbols::SymbolTable;
use crate::types::{Location, Violation};
use crate::utils::allowance::check_allow;
use crate::visit::{self, Visit};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The package could not be loaded or type-checked.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The reporter failed to write.
    #[error("failed to write diagnostics: {0}")]
    Report(#[from] io::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Two rules were registered under the same name.
    #[error("rule {0} registered twice")]
    DuplicateRule(String),
}

/// Counts for one analyzed package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files walked.
    pub files_checked: usize,
    /// Violations sent to the reporter.
    pub violations: usize,
    /// Violations suppressed by allow directives.
    pub suppressed: usize,
}

impl std::ops::AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        self.files_checked += other.files_checked;
        self.violations += other.violations;
        self.suppressed += other.suppressed;
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    rules: Vec<LinterBox>,
    config: Option<Config>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule<R: Linter + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule.
    #[must_use]
    pub fn rule_box(mut self, rule: LinterBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules, keeping their order.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = LinterBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the analyzer, dropping rules disabled in the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if two rules share a name.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(self.rules.len());

        for rule in self.rules {
            if !seen.insert(rule.name()) {
                return Err(AnalyzerError::DuplicateRule(rule.name().to_string()));
            }
            if config.is_rule_enabled(rule.name()) {
                rules.push(rule);
            } else {
                debug!("Skipping disabled rule: {}", rule.name());
            }
        }

        Ok(Analyzer { rules, config })
    }
}

/// The dispatcher. Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    rules: Vec<LinterBox>,
    config: Config,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the number of active rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the package in `dir` from `source` and analyzes it.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the reporter cannot be written.
    pub fn check(
        &self,
        source: &dyn TypedAstSource,
        dir: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary, AnalyzerError> {
        let package = source.load(dir)?;
        self.analyze(&package, reporter)
    }

    /// Walks every file of `package` in order and streams violations to
    /// `reporter` as they are found.
    ///
    /// # Errors
    ///
    /// Returns an error if the reporter cannot be written.
    pub fn analyze(
        &self,
        package: &CheckedPackage,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary, AnalyzerError> {
        info!(
            "Analyzing package {} ({} files)",
            package.path,
            package.files.len()
        );

        let mut summary = RunSummary::default();
        for file in &package.files {
            let mut walker = CallWalker {
                analyzer: self,
                symbols: &package.symbols,
                fset: &package.fset,
                reporter: &mut *reporter,
                summary: &mut summary,
                error: None,
            };
            walker.visit_file(file);
            if let Some(err) = walker.error {
                return Err(AnalyzerError::Report(err));
            }
            summary.files_checked += 1;
        }
        reporter.finish()?;

        info!(
            "Analysis complete: {} violations in {} files",
            summary.violations, summary.files_checked
        );
        Ok(summary)
    }

    /// Runs every rule on one resolved call and reports the results.
    fn dispatch(
        &self,
        walker: &mut CallWalker<'_, '_>,
        call: &crate::ast::CallExpr,
        func: &crate::symbols::ResolvedFunc<'_>,
        span: (crate::fileset::Pos, crate::fileset::Pos),
    ) {
        for rule in &self.rules {
            let Some(finding) = rule.inspect(walker.symbols, call, func) else {
                continue;
            };
            let (start, end) = span;
            let position = walker.fset.position(start);
            if let Some(file) = walker.fset.file(start) {
                let allow = check_allow(file, position.line, rule.name());
                if allow.is_allowed() {
                    debug!(
                        "{}: {} allowed{}",
                        position,
                        rule.name(),
                        allow.reason().map(|r| format!(": {r}")).unwrap_or_default()
                    );
                    walker.summary.suppressed += 1;
                    continue;
                }
            }

            let severity = self
                .config
                .rule_severity(rule.name())
                .unwrap_or_else(|| rule.default_severity());
            let length = end.0.saturating_sub(start.0) as usize;
            let location = Location::new(&position.filename, position.line, position.column)
                .with_span(position.offset, length);
            let mut violation =
                Violation::new(rule.code(), rule.name(), severity, location, finding.message);
            violation.suggestion = finding.suggestion;

            if let Err(err) = walker.reporter.report(&violation) {
                walker.error = Some(err);
                return;
            }
            walker.summary.violations += 1;
        }
    }
}

/// Pre-order walk over one file. A call expression ends the descent: its
/// arguments are never searched for further calls.
struct CallWalker<'a, 'r> {
    analyzer: &'a Analyzer,
    symbols: &'a SymbolTable,
    fset: &'a FileSet,
    reporter: &'r mut dyn Reporter,
    summary: &'r mut RunSummary,
    error: Option<io::Error>,
}

impl<'ast> Visit<'ast> for CallWalker<'_, '_> {
    fn visit_file(&mut self, file: &'ast File) {
        debug!("Walking {}", file.name);
        visit::walk_file(self, file);
    }

    fn visit_expr(&mut self, expr: &'ast crate::ast::Expr) {
        if self.error.is_some() {
            return;
        }
        let ExprKind::Call(call) = &expr.kind else {
            visit::walk_expr(self, expr);
            return;
        };
        let Some(callee) = call.callee_ident() else {
            return;
        };
        let symbols = self.symbols;
        let func = symbols
            .resolve(callee)
            .and_then(|id| symbols.resolved_func(id));
        if let Some(func) = func {
            let analyzer = self.analyzer;
            analyzer.dispatch(self, call, &func, (expr.pos, expr.end));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        Block, CallExpr, Decl, Expr, FuncDecl, FuncType, Ident, NodeId, SelectorExpr, Stmt,
    };
    use crate::fileset::Pos;
    use crate::rule::Finding;
    use crate::symbols::{Object, ObjectKind, ResolvedFunc};
    use crate::types::{LintResult, Severity};

    struct EveryCall;

    impl Linter for EveryCall {
        fn name(&self) -> &'static str {
            "every-call"
        }
        fn code(&self) -> &'static str {
            "T001"
        }
        fn inspect(&self, _: &SymbolTable, _: &CallExpr, func: &ResolvedFunc<'_>) -> Option<Finding> {
            Some(Finding::new(format!("call to {}", func.name)))
        }
    }

    struct Fixture {
        fset: FileSet,
        symbols: SymbolTable,
        next: u32,
        base: u32,
    }

    impl Fixture {
        fn new(source: &str) -> Self {
            let mut fset = FileSet::new();
            let base = fset.add_file("main.go", source).base();
            Self {
                fset,
                symbols: SymbolTable::new(),
                next: 0,
                base,
            }
        }

        fn id(&mut self) -> NodeId {
            self.next += 1;
            NodeId(self.next)
        }

        fn pos(&self, offset: u32) -> Pos {
            Pos(self.base + offset)
        }

        fn ident(&mut self, name: &str, offset: u32) -> Ident {
            Ident {
                id: self.id(),
                name: name.to_string(),
                pos: self.pos(offset),
            }
        }

        fn expr(&mut self, kind: ExprKind, offset: u32, len: u32) -> Expr {
            Expr {
                id: self.id(),
                pos: self.pos(offset),
                end: self.pos(offset + len),
                kind,
            }
        }

        fn func(&mut self, name: &str) -> crate::symbols::ObjectId {
            self.symbols.add_object(Object {
                name: name.to_string(),
                kind: ObjectKind::Func,
                pkg: None,
                ty: None,
                pos: Pos::NONE,
            })
        }

        fn call(&mut self, fun: Expr, args: Vec<Expr>, offset: u32, len: u32) -> Expr {
            self.expr(
                ExprKind::Call(CallExpr {
                    fun: Box::new(fun),
                    type_args: vec![],
                    args,
                    ellipsis: false,
                }),
                offset,
                len,
            )
        }

        fn package(self, stmts: Vec<Stmt>) -> CheckedPackage {
            let file = File {
                name: "main.go".into(),
                package: Ident {
                    id: NodeId(0),
                    name: "main".into(),
                    pos: Pos::NONE,
                },
                imports: vec![],
                decls: vec![Decl::Func(FuncDecl {
                    recv: None,
                    name: Ident {
                        id: NodeId(u32::MAX),
                        name: "main".into(),
                        pos: Pos::NONE,
                    },
                    type_params: vec![],
                    sig: FuncType {
                        params: vec![],
                        results: vec![],
                    },
                    body: Some(Block { stmts }),
                })],
            };
            CheckedPackage {
                path: "main".into(),
                name: "main".into(),
                dir: ".".into(),
                fset: self.fset,
                files: vec![file],
                symbols: self.symbols,
            }
        }
    }

    fn run(analyzer: &Analyzer, package: &CheckedPackage) -> (RunSummary, Vec<String>) {
        let mut result = LintResult::new();
        let summary = analyzer.analyze(package, &mut result).expect("analyze");
        let lines = result.violations.iter().map(ToString::to_string).collect();
        (summary, lines)
    }

    // source: "f(g())\n(h)()\nx.k()\n"
    const SOURCE: &str = "f(g())\n(h)()\nx.k()\n";

    #[test]
    fn call_arguments_are_not_searched() {
        let mut fx = Fixture::new(SOURCE);
        let f = fx.func("f");
        let g = fx.func("g");

        let g_ident = fx.ident("g", 2);
        fx.symbols.record_use(&g_ident, g);
        let g_fun = fx.expr(ExprKind::Ident(g_ident), 2, 1);
        let inner = fx.call(g_fun, vec![], 2, 3);

        let f_ident = fx.ident("f", 0);
        fx.symbols.record_use(&f_ident, f);
        let f_fun = fx.expr(ExprKind::Ident(f_ident), 0, 1);
        let outer = fx.call(f_fun, vec![inner], 0, 6);

        let package = fx.package(vec![Stmt::Expr(outer)]);
        let analyzer = Analyzer::builder().rule(EveryCall).build().expect("build");
        let (summary, lines) = run(&analyzer, &package);

        assert_eq!(lines, vec!["main.go:1:1: call to f"]);
        assert_eq!(summary.violations, 1);
        assert_eq!(summary.files_checked, 1);
    }

    #[test]
    fn does_not_descend_into_uninspectable_calls() {
        let mut fx = Fixture::new(SOURCE);
        let h = fx.func("h");
        let g = fx.func("g");

        // (h)(g()) : parenthesized callee, argument never visited
        let h_ident = fx.ident("h", 8);
        fx.symbols.record_use(&h_ident, h);
        let h_expr = fx.expr(ExprKind::Ident(h_ident), 8, 1);
        let paren = fx.expr(ExprKind::Paren(Box::new(h_expr)), 7, 3);
        let g_ident = fx.ident("g", 11);
        fx.symbols.record_use(&g_ident, g);
        let g_fun = fx.expr(ExprKind::Ident(g_ident), 11, 1);
        let g_call = fx.call(g_fun, vec![], 11, 3);
        let call = fx.call(paren, vec![g_call], 7, 5);

        let package = fx.package(vec![Stmt::Expr(call)]);
        let analyzer = Analyzer::builder().rule(EveryCall).build().expect("build");
        let (summary, lines) = run(&analyzer, &package);

        assert!(lines.is_empty());
        assert_eq!(summary.violations, 0);
    }

    #[test]
    fn unresolved_and_non_function_callees_are_skipped() {
        let mut fx = Fixture::new(SOURCE);
        let var = fx.symbols.add_object(Object {
            name: "x".into(),
            kind: ObjectKind::Var,
            pkg: None,
            ty: None,
            pos: Pos::NONE,
        });

        let x_ident = fx.ident("x", 13);
        fx.symbols.record_use(&x_ident, var);
        let x = fx.expr(ExprKind::Ident(x_ident), 13, 1);
        let k = fx.ident("k", 15);
        let sel = fx.expr(
            ExprKind::Selector(SelectorExpr {
                x: Box::new(x),
                sel: k,
            }),
            13,
            3,
        );
        let g = fx.func("g");
        let g_ident = fx.ident("g", 2);
        fx.symbols.record_use(&g_ident, g);
        let g_fun = fx.expr(ExprKind::Ident(g_ident), 2, 1);
        let g_call = fx.call(g_fun, vec![], 2, 3);
        let call = fx.call(sel, vec![g_call], 13, 5);

        let package = fx.package(vec![Stmt::Expr(call)]);
        let analyzer = Analyzer::builder().rule(EveryCall).build().expect("build");
        let (_, lines) = run(&analyzer, &package);
        assert!(lines.is_empty());
    }

    #[test]
    fn config_disables_and_overrides_severity() {
        let config = Config::parse("[rules.every-call]\nenabled = false\n").expect("config");
        let analyzer = Analyzer::builder()
            .rule(EveryCall)
            .config(config)
            .build()
            .expect("build");
        assert_eq!(analyzer.rule_count(), 0);

        let mut fx = Fixture::new(SOURCE);
        let f = fx.func("f");
        let f_ident = fx.ident("f", 0);
        fx.symbols.record_use(&f_ident, f);
        let f_fun = fx.expr(ExprKind::Ident(f_ident), 0, 1);
        let call = fx.call(f_fun, vec![], 0, 3);
        let package = fx.package(vec![Stmt::Expr(call)]);

        let config = Config::parse("[rules.every-call]\nseverity = \"warning\"\n").expect("config");
        let analyzer = Analyzer::builder()
            .rule(EveryCall)
            .config(config)
            .build()
            .expect("build");
        let mut result = LintResult::new();
        analyzer.analyze(&package, &mut result).expect("analyze");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, Severity::Warning);
        assert_eq!(result.violations[0].location.length, 3);
    }

    #[test]
    fn duplicate_rules_are_rejected() {
        let err = Analyzer::builder()
            .rule(EveryCall)
            .rule(EveryCall)
            .build()
            .err()
            .expect("duplicate");
        assert!(matches!(err, AnalyzerError::DuplicateRule(name) if name == "every-call"));
    }
}
