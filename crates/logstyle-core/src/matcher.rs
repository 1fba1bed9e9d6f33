//! Type identity matching for method receivers.

use serde::{Deserialize, Serialize};

use crate::symbols::{ResolvedFunc, SymbolTable, Type, TypeId};

/// Strips everything up to and including the last `vendor` path segment.
///
/// `a/vendor/b/vendor/go.uber.org/zap` becomes `go.uber.org/zap`; paths
/// without a `vendor` segment are returned unchanged. Applying it twice gives
/// the same result as applying it once.
#[must_use]
pub fn strip_vendor(path: &str) -> &str {
    if path == "vendor" {
        return "";
    }
    if let Some(rest) = path.strip_prefix("vendor/") {
        return strip_vendor(rest);
    }
    match path.rfind("/vendor/") {
        Some(index) => &path[index + "/vendor/".len()..],
        None if path.ends_with("/vendor") => "",
        None => path,
    }
}

/// A method set on a named type that a rule targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMethod {
    /// Import path of the declaring package, without any vendor prefix.
    pub package: String,
    /// Name of the receiver's named type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Method names to match.
    pub methods: Vec<String>,
}

impl TargetMethod {
    /// Creates a target.
    #[must_use]
    pub fn new<I, S>(package: impl Into<String>, type_name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            package: package.into(),
            type_name: type_name.into(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `func` is one of this target's methods.
    #[must_use]
    pub fn matches(&self, symbols: &SymbolTable, func: &ResolvedFunc<'_>) -> bool {
        is_target_method(symbols, func, &self.package, &self.type_name, &self.methods)
    }
}

/// Unwraps any number of pointer layers.
///
/// Stops at the first non-pointer type. A pointer cycle (which a well-formed
/// table never contains) ends the loop after visiting every type once.
#[must_use]
pub fn deref_all(symbols: &SymbolTable, ty: TypeId) -> TypeId {
    let mut current = ty;
    for _ in 0..symbols.type_count() {
        match symbols.ty(current) {
            Type::Pointer(elem) => current = *elem,
            _ => break,
        }
    }
    current
}

/// Decides whether `func` is a method named in `methods` on the named type
/// `type_name` declared in package `package`.
///
/// Receivers behind pointers are unwrapped; the declaring package path is
/// compared after [`strip_vendor`].
#[must_use]
pub fn is_target_method<S: AsRef<str>>(
    symbols: &SymbolTable,
    func: &ResolvedFunc<'_>,
    package: &str,
    type_name: &str,
    methods: &[S],
) -> bool {
    let Some(recv) = func.recv else {
        return false;
    };
    let Type::Named(named) = symbols.ty(deref_all(symbols, recv)) else {
        return false;
    };
    let type_obj = symbols.object(named.obj);
    let Some(pkg) = type_obj.pkg else {
        return false;
    };
    strip_vendor(&symbols.package(pkg).path) == package
        && type_obj.name == type_name
        && methods.iter().any(|m| m.as_ref() == func.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::Pos;
    use crate::symbols::{Named, Object, ObjectId, ObjectKind, Package, Signature};

    const LEVELS: [&str; 4] = ["Debug", "Info", "Warn", "Error"];

    struct Fixture {
        table: SymbolTable,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                table: SymbolTable::new(),
            }
        }

        fn named(&mut self, pkg_path: Option<&str>, name: &str) -> TypeId {
            let pkg = pkg_path.map(|path| {
                self.table.add_package(Package {
                    path: path.to_string(),
                    name: path.rsplit('/').next().unwrap_or(path).to_string(),
                })
            });
            let obj = self.table.add_object(Object {
                name: name.to_string(),
                kind: ObjectKind::TypeName,
                pkg,
                ty: None,
                pos: Pos::NONE,
            });
            self.table.add_type(Type::Named(Named {
                obj,
                underlying: None,
                methods: vec![],
            }))
        }

        fn method(&mut self, recv: Option<TypeId>, name: &str) -> ObjectId {
            let sig = self.table.add_type(Type::Signature(Signature {
                recv,
                params: vec![],
                results: vec![],
                variadic: false,
            }));
            self.table.add_object(Object {
                name: name.to_string(),
                kind: ObjectKind::Func,
                pkg: None,
                ty: Some(sig),
                pos: Pos::NONE,
            })
        }

        fn matches(&self, func: ObjectId) -> bool {
            let func = self.table.resolved_func(func).expect("function");
            is_target_method(&self.table, &func, "go.uber.org/zap", "Logger", &LEVELS)
        }
    }

    #[test]
    fn strips_through_last_vendor_segment() {
        assert_eq!(strip_vendor("go.uber.org/zap"), "go.uber.org/zap");
        assert_eq!(
            strip_vendor("github.com/x/app/vendor/go.uber.org/zap"),
            "go.uber.org/zap"
        );
        assert_eq!(
            strip_vendor("a/vendor/b/vendor/go.uber.org/zap"),
            "go.uber.org/zap"
        );
        assert_eq!(strip_vendor("vendor/go.uber.org/zap"), "go.uber.org/zap");
        assert_eq!(strip_vendor("example.com/vendors/zap"), "example.com/vendors/zap");
    }

    #[test]
    fn strip_vendor_is_idempotent() {
        for path in [
            "go.uber.org/zap",
            "_/tmp/x/vendor/go.uber.org/zap",
            "a/vendor/b/vendor/c",
            "vendor",
            "x/vendor",
        ] {
            let once = strip_vendor(path);
            assert_eq!(strip_vendor(once), once, "{path}");
        }
    }

    #[test]
    fn matches_value_and_pointer_receivers() {
        let mut fx = Fixture::new();
        let logger = fx.named(Some("go.uber.org/zap"), "Logger");
        let ptr = fx.table.add_type(Type::Pointer(logger));
        let ptr_ptr = fx.table.add_type(Type::Pointer(ptr));

        let by_value = fx.method(Some(logger), "Info");
        let by_pointer = fx.method(Some(ptr), "Warn");
        let double = fx.method(Some(ptr_ptr), "Error");
        assert!(fx.matches(by_value));
        assert!(fx.matches(by_pointer));
        assert!(fx.matches(double));
    }

    #[test]
    fn vendored_package_matches() {
        let mut fx = Fixture::new();
        let logger = fx.named(Some("_/work/app/vendor/go.uber.org/zap"), "Logger");
        let info = fx.method(Some(logger), "Info");
        assert!(fx.matches(info));
    }

    #[test]
    fn rejects_other_names_types_and_packages() {
        let mut fx = Fixture::new();
        let logger = fx.named(Some("go.uber.org/zap"), "Logger");
        let sugared = fx.named(Some("go.uber.org/zap"), "SugaredLogger");
        let other = fx.named(Some("example.com/log"), "Logger");

        let infof = fx.method(Some(logger), "Infof");
        let sugared_info = fx.method(Some(sugared), "Info");
        let other_info = fx.method(Some(other), "Info");
        assert!(!fx.matches(infof));
        assert!(!fx.matches(sugared_info));
        assert!(!fx.matches(other_info));
    }

    #[test]
    fn rejects_functions_and_universe_types() {
        let mut fx = Fixture::new();
        let plain = fx.method(None, "Info");
        let universe = fx.named(None, "Logger");
        let universe_info = fx.method(Some(universe), "Info");
        assert!(!fx.matches(plain));
        assert!(!fx.matches(universe_info));
    }

    #[test]
    fn pointer_cycle_terminates() {
        let mut table = SymbolTable::new();
        let a = table.add_type(Type::Invalid);
        let b = table.add_type(Type::Pointer(a));
        *table.ty_mut(a) = Type::Pointer(b);
        let end = deref_all(&table, a);
        assert!(matches!(table.ty(end), Type::Pointer(_)));
    }
}
