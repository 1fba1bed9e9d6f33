//! Program symbol table: objects, types and the bindings recorded by a
//! type checker.
//!
//! The table is filled by a typed-AST source and then borrowed read-only by
//! the dispatcher and rules. Objects and types live in arenas addressed by
//! [`ObjectId`] and [`TypeId`]; identifier and expression nodes are bound to
//! them through their [`NodeId`].

use std::collections::HashMap;

use crate::ast::{ChanDir, Ident, NodeId};
use crate::fileset::Pos;

/// Handle to an [`Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

/// Handle to a [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

/// Handle to a [`Package`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(pub u32);

/// A loaded (or referenced) package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Full import path, possibly including a `vendor/` prefix.
    pub path: String,
    /// Package clause name.
    pub name: String,
}

/// Built-in functions of the universe and of package `unsafe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
    Add,
    Alignof,
    Offsetof,
    Sizeof,
    Slice,
    SliceData,
    String,
    StringData,
}

/// What an [`Object`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Declared constant (including `true`, `false`, `iota`).
    Const,
    /// Variable, parameter or result.
    Var,
    /// Struct field.
    Field {
        /// Embedded (anonymous) field.
        embedded: bool,
    },
    /// Type name, including aliases and type parameters.
    TypeName,
    /// Function or method, including interface methods.
    Func,
    /// Imported package name.
    PkgName(PackageId),
    /// Built-in function.
    Builtin(Builtin),
    /// The predeclared `nil`.
    Nil,
}

/// A named language entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Declared name.
    pub name: String,
    /// Denotation.
    pub kind: ObjectKind,
    /// Declaring package; `None` for universe objects.
    pub pkg: Option<PackageId>,
    /// Type, once known.
    pub ty: Option<TypeId>,
    /// Declaration position.
    pub pos: Pos,
}

impl Object {
    /// Returns true for constants.
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.kind == ObjectKind::Const
    }

    /// Returns true for functions and methods.
    #[must_use]
    pub fn is_func(&self) -> bool {
        self.kind == ObjectKind::Func
    }
}

/// Predeclared basic types, including the untyped constant kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// Returns the type name as written in source.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::UnsafePointer => "unsafe.Pointer",
            Self::UntypedBool => "untyped bool",
            Self::UntypedInt => "untyped int",
            Self::UntypedRune => "untyped rune",
            Self::UntypedFloat => "untyped float",
            Self::UntypedComplex => "untyped complex",
            Self::UntypedString => "untyped string",
            Self::UntypedNil => "untyped nil",
        }
    }

    /// Returns true for the untyped constant kinds.
    #[must_use]
    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            Self::UntypedBool
                | Self::UntypedInt
                | Self::UntypedRune
                | Self::UntypedFloat
                | Self::UntypedComplex
                | Self::UntypedString
                | Self::UntypedNil
        )
    }
}

/// A defined type with its methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Named {
    /// The type name object.
    pub obj: ObjectId,
    /// Underlying type, filled in when the declaration is resolved.
    pub underlying: Option<TypeId>,
    /// Declared methods (not including promoted ones).
    pub methods: Vec<ObjectId>,
}

/// A function type; methods carry their receiver type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Receiver type, for methods.
    pub recv: Option<TypeId>,
    /// Parameter types.
    pub params: Vec<TypeId>,
    /// Result types.
    pub results: Vec<TypeId>,
    /// Last parameter is `...T` (stored as `[]T`).
    pub variadic: bool,
}

/// Type representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Type of an erroneous or unresolvable expression.
    Invalid,
    /// Predeclared basic type.
    Basic(BasicKind),
    /// Defined type.
    Named(Named),
    /// `*T`
    Pointer(TypeId),
    /// `[]T`
    Slice(TypeId),
    /// `[N]T`
    Array {
        /// Length, when it could be evaluated.
        len: Option<u64>,
        /// Element type.
        elem: TypeId,
    },
    /// `map[K]V`
    Map {
        /// Key type.
        key: TypeId,
        /// Value type.
        value: TypeId,
    },
    /// Channel type.
    Chan {
        /// Direction.
        dir: ChanDir,
        /// Element type.
        elem: TypeId,
    },
    /// Function type.
    Signature(Signature),
    /// Struct type; fields are [`ObjectKind::Field`] objects.
    Struct(Vec<ObjectId>),
    /// Interface type.
    Interface {
        /// Explicitly declared methods.
        methods: Vec<ObjectId>,
        /// Embedded interfaces and constraint terms.
        embedded: Vec<TypeId>,
    },
    /// Result list of a multi-value call.
    Tuple(Vec<TypeId>),
    /// Type parameter.
    TypeParam {
        /// The parameter's type name object.
        obj: ObjectId,
        /// Constraint interface, when resolved.
        constraint: Option<TypeId>,
    },
}

/// Function object resolved at a call site, as handed to rules.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFunc<'a> {
    /// The function object.
    pub id: ObjectId,
    /// Simple name.
    pub name: &'a str,
    /// Declaring package path; `None` for universe functions.
    pub package: Option<&'a str>,
    /// Receiver type, possibly behind pointers.
    pub recv: Option<TypeId>,
}

/// Symbol and type information for one loaded program.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    objects: Vec<Object>,
    types: Vec<Type>,
    packages: Vec<Package>,
    defs: HashMap<NodeId, ObjectId>,
    uses: HashMap<NodeId, ObjectId>,
    expr_types: HashMap<NodeId, TypeId>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object and returns its handle.
    pub fn add_object(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(u32::try_from(self.objects.len()).unwrap_or(u32::MAX));
        self.objects.push(object);
        id
    }

    /// Adds a type and returns its handle.
    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.types.push(ty);
        id
    }

    /// Adds a package and returns its handle.
    pub fn add_package(&mut self, package: Package) -> PackageId {
        let id = PackageId(u32::try_from(self.packages.len()).unwrap_or(u32::MAX));
        self.packages.push(package);
        id
    }

    /// Returns an object.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this table.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0 as usize]
    }

    /// Returns an object for modification.
    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0 as usize]
    }

    /// Returns a type.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this table.
    #[must_use]
    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Returns a type for modification.
    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    /// Returns a package.
    #[must_use]
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    /// Returns a package for modification.
    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.0 as usize]
    }

    /// Number of types in the table.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of objects in the table.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Records that `ident` declares `obj`.
    pub fn record_def(&mut self, ident: &Ident, obj: ObjectId) {
        self.defs.insert(ident.id, obj);
    }

    /// Records that `ident` refers to `obj`.
    pub fn record_use(&mut self, ident: &Ident, obj: ObjectId) {
        self.uses.insert(ident.id, obj);
    }

    /// Records the type of an expression node.
    pub fn record_type(&mut self, node: NodeId, ty: TypeId) {
        self.expr_types.insert(node, ty);
    }

    /// Returns the object an identifier refers to or declares.
    ///
    /// `None` means no binding is known, which is not an error: blank
    /// identifiers, package clause names and names the checker could not
    /// resolve all have no binding.
    #[must_use]
    pub fn resolve(&self, ident: &Ident) -> Option<ObjectId> {
        self.uses
            .get(&ident.id)
            .or_else(|| self.defs.get(&ident.id))
            .copied()
    }

    /// Like [`resolve`](Self::resolve), returning the object itself.
    #[must_use]
    pub fn object_of(&self, ident: &Ident) -> Option<&Object> {
        self.resolve(ident).map(|id| self.object(id))
    }

    /// Returns the recorded type of an expression node.
    #[must_use]
    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.expr_types.get(&node).copied()
    }

    /// Returns the function view of `id`, or `None` if it is not a function.
    #[must_use]
    pub fn resolved_func(&self, id: ObjectId) -> Option<ResolvedFunc<'_>> {
        let object = self.object(id);
        if !object.is_func() {
            return None;
        }
        let recv = object.ty.and_then(|ty| match self.ty(ty) {
            Type::Signature(sig) => sig.recv,
            _ => None,
        });
        Some(ResolvedFunc {
            id,
            name: &object.name,
            package: object.pkg.map(|pkg| self.package(pkg).path.as_str()),
            recv,
        })
    }

    /// Follows named types to their underlying type.
    ///
    /// Returns `ty` itself for unnamed types and for named types whose
    /// underlying type is not known.
    #[must_use]
    pub fn underlying(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..=self.types.len() {
            match self.ty(current) {
                Type::Named(Named {
                    underlying: Some(next),
                    ..
                }) if *next != current => current = *next,
                _ => return current,
            }
        }
        current
    }

    /// Renders a type for messages and debugging.
    #[must_use]
    pub fn type_string(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty, 0);
        out
    }

    fn write_type(&self, out: &mut String, ty: TypeId, depth: usize) {
        if depth > 16 {
            out.push_str("...");
            return;
        }
        match self.ty(ty) {
            Type::Invalid => out.push_str("invalid type"),
            Type::Basic(kind) => out.push_str(kind.name()),
            Type::Named(named) => {
                let obj = self.object(named.obj);
                if let Some(pkg) = obj.pkg {
                    out.push_str(&self.package(pkg).path);
                    out.push('.');
                }
                out.push_str(&obj.name);
            }
            Type::Pointer(elem) => {
                out.push('*');
                self.write_type(out, *elem, depth + 1);
            }
            Type::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem, depth + 1);
            }
            Type::Array { len, elem } => {
                out.push('[');
                if let Some(len) = len {
                    out.push_str(&len.to_string());
                }
                out.push(']');
                self.write_type(out, *elem, depth + 1);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                self.write_type(out, *key, depth + 1);
                out.push(']');
                self.write_type(out, *value, depth + 1);
            }
            Type::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.write_type(out, *elem, depth + 1);
            }
            Type::Signature(sig) => {
                out.push_str("func(");
                self.write_list(out, &sig.params, depth);
                out.push(')');
                match sig.results.as_slice() {
                    [] => {}
                    [single] => {
                        out.push(' ');
                        self.write_type(out, *single, depth + 1);
                    }
                    results => {
                        out.push_str(" (");
                        self.write_list(out, results, depth);
                        out.push(')');
                    }
                }
            }
            Type::Struct(fields) => {
                out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    let field = self.object(*field);
                    out.push_str(&field.name);
                    if let Some(ty) = field.ty {
                        out.push(' ');
                        self.write_type(out, ty, depth + 1);
                    }
                }
                out.push('}');
            }
            Type::Interface { methods, .. } => {
                out.push_str("interface{");
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    out.push_str(&self.object(*method).name);
                    out.push_str("()");
                }
                out.push('}');
            }
            Type::Tuple(items) => {
                out.push('(');
                self.write_list(out, items, depth);
                out.push(')');
            }
            Type::TypeParam { obj, .. } => out.push_str(&self.object(*obj).name),
        }
    }

    fn write_list(&self, out: &mut String, items: &[TypeId], depth: usize) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, *item, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: u32, name: &str) -> Ident {
        Ident {
            id: NodeId(id),
            name: name.to_string(),
            pos: Pos::NONE,
        }
    }

    fn object(name: &str, kind: ObjectKind, pkg: Option<PackageId>) -> Object {
        Object {
            name: name.to_string(),
            kind,
            pkg,
            ty: None,
            pos: Pos::NONE,
        }
    }

    #[test]
    fn resolve_prefers_uses_then_defs() {
        let mut table = SymbolTable::new();
        let msg = table.add_object(object("msg", ObjectKind::Const, None));
        let decl = ident(1, "msg");
        let usage = ident(2, "msg");
        table.record_def(&decl, msg);
        table.record_use(&usage, msg);

        assert_eq!(table.resolve(&decl), Some(msg));
        assert_eq!(table.resolve(&usage), Some(msg));
        assert!(table.object_of(&usage).is_some_and(Object::is_const));
        assert_eq!(table.resolve(&ident(3, "other")), None);
    }

    #[test]
    fn resolved_func_reports_receiver_and_package() {
        let mut table = SymbolTable::new();
        let zap = table.add_package(Package {
            path: "go.uber.org/zap".into(),
            name: "zap".into(),
        });
        let logger_obj = table.add_object(object("Logger", ObjectKind::TypeName, Some(zap)));
        let logger = table.add_type(Type::Named(Named {
            obj: logger_obj,
            underlying: None,
            methods: vec![],
        }));
        let ptr = table.add_type(Type::Pointer(logger));
        let sig = table.add_type(Type::Signature(Signature {
            recv: Some(ptr),
            params: vec![],
            results: vec![],
            variadic: false,
        }));
        let mut info = object("Info", ObjectKind::Func, Some(zap));
        info.ty = Some(sig);
        let info = table.add_object(info);

        let func = table.resolved_func(info).expect("function");
        assert_eq!(func.name, "Info");
        assert_eq!(func.package, Some("go.uber.org/zap"));
        assert_eq!(func.recv, Some(ptr));
        assert_eq!(table.type_string(ptr), "*go.uber.org/zap.Logger");
    }

    #[test]
    fn resolved_func_rejects_non_functions() {
        let mut table = SymbolTable::new();
        let var = table.add_object(object("x", ObjectKind::Var, None));
        assert!(table.resolved_func(var).is_none());
    }

    #[test]
    fn underlying_follows_named_chain() {
        let mut table = SymbolTable::new();
        let string = table.add_type(Type::Basic(BasicKind::String));
        let obj = table.add_object(object("Name", ObjectKind::TypeName, None));
        let named = table.add_type(Type::Named(Named {
            obj,
            underlying: Some(string),
            methods: vec![],
        }));
        assert_eq!(table.underlying(named), string);
        assert_eq!(table.underlying(string), string);
    }
}
