//! Rule requiring structured-log messages to be compile-time constants.
//!
//! # Rationale
//!
//! A structured logger indexes entries by their message. Building the message
//! with `fmt.Sprintf`, concatenation or a variable turns every entry into a
//! distinct message; dynamic values belong in fields.
//!
//! # Configuration
//!
//! - `targets`: list of `{ package, type, methods }` receivers to check
//!   (default: `go.uber.org/zap` `Logger` with `Debug`, `Info`, `Warn`, `Error`)
//!
//! # Suppression
//!
//! - `// logstyle:allow(constant-message)` comment

use logstyle_core::ast::{CallExpr, ExprKind};
use logstyle_core::symbols::Object;
use logstyle_core::{
    ConfigError, Finding, Linter, ResolvedFunc, RuleConfig, Severity, SymbolTable, TargetMethod,
};
use tracing::debug;

/// Rule code for constant-message.
pub const CODE: &str = "LS001";

/// Rule name for constant-message.
pub const NAME: &str = "constant-message";

/// The fixed violation message.
pub const MESSAGE: &str = "call must use a string literal or a constant";

/// Checks that the first argument of a targeted logging call is a literal or
/// names a constant.
#[derive(Debug, Clone)]
pub struct ConstantMessage {
    targets: Vec<TargetMethod>,
    severity: Severity,
}

impl Default for ConstantMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantMessage {
    /// Creates the rule targeting zap's `Logger` severity methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            targets: vec![zap_logger()],
            severity: Severity::Error,
        }
    }

    /// Replaces the targeted receivers.
    #[must_use]
    pub fn targets(mut self, targets: Vec<TargetMethod>) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// The receivers this rule checks.
    #[must_use]
    pub fn target_methods(&self) -> &[TargetMethod] {
        &self.targets
    }

    /// Builds the rule from its configuration block.
    ///
    /// # Errors
    ///
    /// Returns an error if `targets` is malformed.
    pub fn from_config(config: &RuleConfig) -> Result<Self, ConfigError> {
        let mut rule = Self::new();
        if let Some(severity) = config.severity {
            rule = rule.severity(severity);
        }
        if let Some(targets) = config.option::<Vec<TargetMethod>>(NAME, "targets")? {
            debug!("{NAME}: {} configured target(s)", targets.len());
            rule = rule.targets(targets);
        }
        Ok(rule)
    }

    fn is_target(&self, symbols: &SymbolTable, func: &ResolvedFunc<'_>) -> bool {
        self.targets.iter().any(|t| t.matches(symbols, func))
    }
}

/// zap's `*Logger` severity methods.
#[must_use]
pub fn zap_logger() -> TargetMethod {
    TargetMethod::new("go.uber.org/zap", "Logger", ["Debug", "Info", "Warn", "Error"])
}

impl Linter for ConstantMessage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Logging calls must use a string literal or a constant as the message"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn inspect(
        &self,
        symbols: &SymbolTable,
        call: &CallExpr,
        func: &ResolvedFunc<'_>,
    ) -> Option<Finding> {
        if !self.is_target(symbols, func) {
            return None;
        }
        let first = call.args.first()?;
        let compliant = match &first.kind {
            ExprKind::BasicLit(_) => true,
            ExprKind::Ident(ident) => symbols.object_of(ident).is_some_and(Object::is_const),
            _ => false,
        };
        (!compliant).then(|| {
            Finding::new(MESSAGE)
                .with_suggestion("use a constant message and attach dynamic values as fields")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logstyle_core::ast::{BasicLit, BinaryExpr, BinaryOp, Expr, Ident, LitKind, NodeId};
    use logstyle_core::symbols::{Named, ObjectKind, Package, Signature, Type};
    use logstyle_core::{ObjectId, Pos, TypeId};

    struct Fixture {
        table: SymbolTable,
        next: u32,
        logger: TypeId,
    }

    impl Fixture {
        fn new(zap_path: &str) -> Self {
            let mut table = SymbolTable::new();
            let zap = table.add_package(Package {
                path: zap_path.to_string(),
                name: "zap".to_string(),
            });
            let obj = table.add_object(Object {
                name: "Logger".into(),
                kind: ObjectKind::TypeName,
                pkg: Some(zap),
                ty: None,
                pos: Pos::NONE,
            });
            let logger = table.add_type(Type::Named(Named {
                obj,
                underlying: None,
                methods: vec![],
            }));
            Self {
                table,
                next: 0,
                logger,
            }
        }

        fn method(&mut self, recv: TypeId, name: &str) -> ObjectId {
            let sig = self.table.add_type(Type::Signature(Signature {
                recv: Some(recv),
                params: vec![],
                results: vec![],
                variadic: true,
            }));
            self.table.add_object(Object {
                name: name.into(),
                kind: ObjectKind::Func,
                pkg: None,
                ty: Some(sig),
                pos: Pos::NONE,
            })
        }

        fn value(&mut self, name: &str, kind: ObjectKind) -> Expr {
            let obj = self.table.add_object(Object {
                name: name.into(),
                kind,
                pkg: None,
                ty: None,
                pos: Pos::NONE,
            });
            let ident = self.ident(name);
            self.table.record_use(&ident, obj);
            self.expr(ExprKind::Ident(ident))
        }

        fn ident(&mut self, name: &str) -> Ident {
            self.next += 1;
            Ident {
                id: NodeId(self.next),
                name: name.into(),
                pos: Pos::NONE,
            }
        }

        fn expr(&mut self, kind: ExprKind) -> Expr {
            self.next += 1;
            Expr {
                id: NodeId(self.next),
                pos: Pos::NONE,
                end: Pos::NONE,
                kind,
            }
        }

        fn string(&mut self, text: &str) -> Expr {
            self.expr(ExprKind::BasicLit(BasicLit {
                kind: LitKind::String,
                value: format!("{text:?}"),
            }))
        }

        fn call(&mut self, args: Vec<Expr>) -> CallExpr {
            let fun = self.expr(ExprKind::Ident(Ident {
                id: NodeId(0),
                name: "Info".into(),
                pos: Pos::NONE,
            }));
            CallExpr {
                fun: Box::new(fun),
                type_args: vec![],
                args,
                ellipsis: false,
            }
        }

        fn inspect(&self, method: ObjectId, call: &CallExpr) -> Option<Finding> {
            let func = self.table.resolved_func(method).expect("function");
            ConstantMessage::new().inspect(&self.table, call, &func)
        }
    }

    #[test]
    fn literal_first_argument_is_compliant() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let info = fx.method(fx.logger, "Info");
        let lit = fx.string("Hello, World!");
        let call = fx.call(vec![lit]);
        assert!(fx.inspect(info, &call).is_none());
    }

    #[test]
    fn non_string_literal_is_compliant() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let info = fx.method(fx.logger, "Info");
        let lit = fx.expr(ExprKind::BasicLit(BasicLit {
            kind: LitKind::Int,
            value: "42".into(),
        }));
        let call = fx.call(vec![lit]);
        assert!(fx.inspect(info, &call).is_none());
    }

    #[test]
    fn constant_identifier_is_compliant() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let ptr = fx.table.add_type(Type::Pointer(fx.logger));
        let warn = fx.method(ptr, "Warn");
        let msg = fx.value("msg", ObjectKind::Const);
        let call = fx.call(vec![msg]);
        assert!(fx.inspect(warn, &call).is_none());
    }

    #[test]
    fn variable_identifier_is_a_violation() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let info = fx.method(fx.logger, "Info");
        let msg = fx.value("msg", ObjectKind::Var);
        let call = fx.call(vec![msg]);
        let finding = fx.inspect(info, &call).expect("violation");
        assert_eq!(finding.message, MESSAGE);
    }

    #[test]
    fn unresolved_identifier_is_a_violation() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let info = fx.method(fx.logger, "Info");
        let ident = fx.ident("mystery");
        let arg = fx.expr(ExprKind::Ident(ident));
        let call = fx.call(vec![arg]);
        assert!(fx.inspect(info, &call).is_some());
    }

    #[test]
    fn other_shapes_are_violations() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let error = fx.method(fx.logger, "Error");

        let a = fx.string("a");
        let b = fx.string("b");
        let concat = fx.expr(ExprKind::Binary(BinaryExpr {
            op: BinaryOp::Add,
            x: Box::new(a),
            y: Box::new(b),
        }));
        let call = fx.call(vec![concat]);
        assert!(fx.inspect(error, &call).is_some());

        let lit = fx.string("x");
        let paren = fx.expr(ExprKind::Paren(Box::new(lit)));
        let call = fx.call(vec![paren]);
        assert!(fx.inspect(error, &call).is_some());
    }

    #[test]
    fn zero_arguments_are_compliant() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let debug = fx.method(fx.logger, "Debug");
        let call = fx.call(vec![]);
        assert!(fx.inspect(debug, &call).is_none());
    }

    #[test]
    fn non_target_methods_are_ignored() {
        let mut fx = Fixture::new("go.uber.org/zap");
        let sync = fx.method(fx.logger, "Sync");
        let msg = fx.value("msg", ObjectKind::Var);
        let call = fx.call(vec![msg]);
        assert!(fx.inspect(sync, &call).is_none());

        let mut other = Fixture::new("example.com/log");
        let info = other.method(other.logger, "Info");
        let msg = other.value("msg", ObjectKind::Var);
        let call = other.call(vec![msg]);
        assert!(other.inspect(info, &call).is_none());
    }

    #[test]
    fn vendored_target_matches() {
        let mut fx = Fixture::new("_/work/app/vendor/go.uber.org/zap");
        let info = fx.method(fx.logger, "Info");
        let msg = fx.value("msg", ObjectKind::Var);
        let call = fx.call(vec![msg]);
        assert!(fx.inspect(info, &call).is_some());
    }

    #[test]
    fn configured_targets_replace_default() {
        let config = logstyle_core::Config::parse(
            r#"
[[rules.constant-message.targets]]
package = "example.com/log"
type = "Logger"
methods = ["Info"]
"#,
        )
        .expect("parse");
        let rule = ConstantMessage::from_config(config.rule(NAME).expect("rule")).expect("config");

        let mut fx = Fixture::new("example.com/log");
        let info = fx.method(fx.logger, "Info");
        let msg = fx.value("msg", ObjectKind::Var);
        let call = fx.call(vec![msg]);
        let func = fx.table.resolved_func(info).expect("function");
        assert!(rule.inspect(&fx.table, &call, &func).is_some());

        let mut zap = Fixture::new("go.uber.org/zap");
        let info = zap.method(zap.logger, "Info");
        let msg = zap.value("msg", ObjectKind::Var);
        let call = zap.call(vec![msg]);
        let func = zap.table.resolved_func(info).expect("function");
        assert!(rule.inspect(&zap.table, &call, &func).is_none());
    }

    #[test]
    fn configured_severity_becomes_the_default() {
        assert_eq!(ConstantMessage::new().default_severity(), Severity::Error);

        let config =
            logstyle_core::Config::parse("[rules.constant-message]\nseverity = \"warning\"\n")
                .expect("parse");
        let rule = ConstantMessage::from_config(config.rule(NAME).expect("rule")).expect("config");
        assert_eq!(rule.default_severity(), Severity::Warning);
        assert_eq!(rule.target_methods(), &[zap_logger()]);
    }

    #[test]
    fn malformed_targets_are_rejected() {
        let config = logstyle_core::Config::parse("[rules.constant-message]\ntargets = 3\n")
            .expect("parse");
        let err = ConstantMessage::from_config(config.rule(NAME).expect("rule"));
        assert!(matches!(err, Err(ConfigError::InvalidOption { .. })));
    }
}
