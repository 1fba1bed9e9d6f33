//! Type expressions and underlying types.

use std::rc::Rc;

use logstyle_core::ast::{
    Decl, Expr, ExprKind, Field, FuncType, Ident, InterfaceElem, LitKind, Spec, TypeExpr,
    TypeExprKind,
};
use logstyle_core::symbols::{BasicKind, ObjectKind, Signature, Type, TypeId};
use logstyle_core::ObjectId;

use super::Checker;

impl Checker {
    pub(super) fn resolve_type(&mut self, expr: &TypeExpr) -> TypeId {
        let ty = match &expr.kind {
            TypeExprKind::Name(name) => self.type_name(name),
            TypeExprKind::Qualified { pkg, name } => self.qualified_type(pkg, name),
            TypeExprKind::Pointer(elem) => {
                let elem = self.resolve_type(elem);
                self.pointer(elem)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type(elem);
                self.slice(elem)
            }
            TypeExprKind::Array { len, elem } => {
                let len = len.as_deref().and_then(|len| {
                    self.expr(len, None);
                    array_len(len)
                });
                let elem = self.resolve_type(elem);
                self.symbols.add_type(Type::Array { len, elem })
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type(key);
                let value = self.resolve_type(value);
                self.symbols.add_type(Type::Map { key, value })
            }
            TypeExprKind::Chan { dir, elem } => {
                let elem = self.resolve_type(elem);
                self.symbols.add_type(Type::Chan { dir: *dir, elem })
            }
            TypeExprKind::Func(sig) => self.signature(sig, None),
            TypeExprKind::Struct(fields) => self.struct_type(fields),
            TypeExprKind::Interface(elems) => self.interface_type(elems),
            TypeExprKind::Generic { base, args } => {
                let base = self.resolve_type(base);
                for arg in args {
                    self.resolve_type(arg);
                }
                base
            }
            TypeExprKind::Approx(inner) => self.resolve_type(inner),
        };
        self.symbols.record_type(expr.id, ty);
        ty
    }

    fn type_name(&mut self, name: &Ident) -> TypeId {
        if name.is_blank() {
            return self.invalid;
        }
        let Some(obj) = self.lookup(&name.name) else {
            self.error_at(name.pos, format!("undefined: {}", name.name));
            return self.invalid;
        };
        self.symbols.record_use(name, obj);
        self.object_as_type(obj)
    }

    fn qualified_type(&mut self, pkg: &Ident, name: &Ident) -> TypeId {
        let Some(obj) = self.lookup(&pkg.name) else {
            self.error_at(pkg.pos, format!("undefined: {}", pkg.name));
            return self.invalid;
        };
        self.symbols.record_use(pkg, obj);
        let ObjectKind::PkgName(imported) = self.symbols.object(obj).kind else {
            return self.invalid;
        };
        let Some(member) = self.package_member(imported, &pkg.name, name) else {
            return self.invalid;
        };
        self.symbols.record_use(name, member);
        self.object_as_type(member)
    }

    /// The type a type name denotes; aliases are resolved on demand.
    pub(super) fn object_as_type(&mut self, obj: ObjectId) -> TypeId {
        if self.symbols.object(obj).kind != ObjectKind::TypeName {
            return self.invalid;
        }
        self.resolve_object(obj).unwrap_or(self.invalid)
    }

    pub(super) fn signature(&mut self, sig: &FuncType, recv: Option<TypeId>) -> TypeId {
        let params = self.field_types(&sig.params);
        let results = self.field_types(&sig.results);
        self.symbols.add_type(Type::Signature(Signature {
            recv,
            params,
            results,
            variadic: sig.is_variadic(),
        }))
    }

    fn field_types(&mut self, fields: &[Field]) -> Vec<TypeId> {
        let mut types = Vec::new();
        for field in fields {
            let mut ty = self.resolve_type(&field.ty);
            if field.variadic {
                ty = self.slice(ty);
            }
            types.extend(std::iter::repeat(ty).take(field.names.len().max(1)));
        }
        types
    }

    fn struct_type(&mut self, fields: &[Field]) -> TypeId {
        let mut objects = Vec::new();
        for field in fields {
            let ty = self.resolve_type(&field.ty);
            if field.names.is_empty() {
                if let Some(name) = embedded_name(&field.ty) {
                    let kind = ObjectKind::Field { embedded: true };
                    objects.push(self.add_object(&name.name, kind, Some(ty), name.pos));
                }
                continue;
            }
            for name in &field.names {
                let kind = ObjectKind::Field { embedded: false };
                let obj = self.add_object(&name.name, kind, Some(ty), name.pos);
                self.symbols.record_def(name, obj);
                objects.push(obj);
            }
        }
        self.symbols.add_type(Type::Struct(objects))
    }

    /// Interface methods carry the interface as receiver: the enclosing
    /// named type when the literal is a type declaration's right-hand side,
    /// the literal itself otherwise.
    fn interface_type(&mut self, elems: &[InterfaceElem]) -> TypeId {
        let named = self.iface_recv.take();
        let id = self.symbols.add_type(Type::Interface {
            methods: Vec::new(),
            embedded: Vec::new(),
        });
        let recv = named.unwrap_or(id);

        let mut methods = Vec::new();
        let mut embedded = Vec::new();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig } => {
                    let sig = self.signature(sig, Some(recv));
                    let obj = self.add_object(&name.name, ObjectKind::Func, Some(sig), name.pos);
                    self.symbols.record_def(name, obj);
                    methods.push(obj);
                }
                InterfaceElem::Embedded(terms) => {
                    for term in terms {
                        embedded.push(self.resolve_type(term));
                    }
                }
            }
        }
        *self.symbols.ty_mut(id) = Type::Interface { methods, embedded };
        id
    }

    /// Declares type parameters in the current scope, then resolves their
    /// constraints so that constraints may mention any of them.
    pub(super) fn declare_type_params(&mut self, fields: &[Field]) {
        let mut params = Vec::new();
        for field in fields {
            for name in &field.names {
                let obj = self.add_object(&name.name, ObjectKind::TypeName, None, name.pos);
                let param = self.symbols.add_type(Type::TypeParam {
                    obj,
                    constraint: None,
                });
                self.symbols.object_mut(obj).ty = Some(param);
                self.declare_local(name, obj);
                params.push((param, &field.ty));
            }
        }
        for (param, bound) in params {
            let bound = self.resolve_type(bound);
            if let Type::TypeParam { constraint, .. } = self.symbols.ty_mut(param) {
                *constraint = Some(bound);
            }
        }
    }

    /// Returns the underlying type, resolving named type declarations on
    /// first use.
    pub(super) fn under(&mut self, ty: TypeId) -> TypeId {
        match self.symbols.ty(ty) {
            Type::Named(_) => self.named_underlying(ty),
            _ => ty,
        }
    }

    fn named_underlying(&mut self, named: TypeId) -> TypeId {
        let (obj, underlying) = match self.symbols.ty(named) {
            Type::Named(n) => (n.obj, n.underlying),
            _ => return named,
        };
        if let Some(underlying) = underlying {
            return underlying;
        }
        let Some(decl) = self.decls.get(&obj).copied() else {
            return self.invalid;
        };
        if !self.resolving.insert(obj) {
            return self.invalid;
        }
        let underlying = self.with_ctx(decl.pkg, decl.file, |c| {
            let ast = Rc::clone(&c.pkg(decl.pkg).files[decl.file].ast);
            let Decl::Gen(gen) = &ast.decls[decl.decl] else {
                return c.invalid;
            };
            let Spec::Type(spec) = &gen.specs[decl.spec] else {
                return c.invalid;
            };
            c.declared_underlying(named, &spec.type_params, &spec.ty)
        });
        self.resolving.remove(&obj);
        self.set_underlying(named, underlying)
    }

    /// Resolves the right-hand side of a type declaration for `named`.
    pub(super) fn declared_underlying(
        &mut self,
        named: TypeId,
        type_params: &[Field],
        rhs: &TypeExpr,
    ) -> TypeId {
        self.scopes.push();
        self.declare_type_params(type_params);
        if matches!(rhs.kind, TypeExprKind::Interface(_)) {
            self.iface_recv = Some(named);
        }
        let ty = self.resolve_type(rhs);
        self.iface_recv = None;
        self.scopes.pop();
        self.under(ty)
    }

    pub(super) fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> TypeId {
        let underlying = if underlying == named {
            self.invalid
        } else {
            underlying
        };
        if let Type::Named(n) = self.symbols.ty_mut(named) {
            n.underlying = Some(underlying);
        }
        underlying
    }

    /// The type an untyped constant takes when assigned to a variable.
    pub(super) fn default_type(&self, ty: TypeId) -> TypeId {
        let Type::Basic(kind) = self.symbols.ty(ty) else {
            return ty;
        };
        let kind = match kind {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            _ => return ty,
        };
        self.basic(kind)
    }

    pub(super) fn is_untyped(&self, ty: TypeId) -> bool {
        matches!(self.symbols.ty(ty), Type::Basic(kind) if kind.is_untyped())
    }

    pub(super) fn pointer_elem(&mut self, ty: TypeId) -> Option<TypeId> {
        let under = self.under(ty);
        match self.symbols.ty(under) {
            Type::Pointer(elem) => Some(*elem),
            _ => None,
        }
    }

    pub(super) fn slice_elem(&mut self, ty: TypeId) -> Option<TypeId> {
        let under = self.under(ty);
        match self.symbols.ty(under) {
            Type::Slice(elem) => Some(*elem),
            _ => None,
        }
    }

    pub(super) fn chan_elem(&mut self, ty: TypeId) -> Option<TypeId> {
        let under = self.under(ty);
        match self.symbols.ty(under) {
            Type::Chan { elem, .. } => Some(*elem),
            _ => None,
        }
    }
}

/// The field name an embedded field declares.
fn embedded_name(ty: &TypeExpr) -> Option<&Ident> {
    match &ty.kind {
        TypeExprKind::Name(name) | TypeExprKind::Qualified { name, .. } => Some(name),
        TypeExprKind::Pointer(inner) | TypeExprKind::Generic { base: inner, .. } => {
            embedded_name(inner)
        }
        _ => None,
    }
}

fn array_len(expr: &Expr) -> Option<u64> {
    let ExprKind::BasicLit(lit) = &expr.kind else {
        return None;
    };
    if lit.kind != LitKind::Int {
        return None;
    }
    let digits = lit.value.replace('_', "");
    match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}
