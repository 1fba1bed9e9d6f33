//! Package-level declarations: collection, lazy resolution and function
//! bodies.

use std::rc::Rc;

use logstyle_core::ast::{
    Decl, Field, File, FuncDecl, GenDecl, GenKind, Ident, Spec, TypeExpr, TypeExprKind, TypeSpec,
    ValueSpec,
};
use logstyle_core::symbols::{Named, ObjectKind, PackageId, Type, TypeId};
use logstyle_core::ObjectId;

use super::{Checker, DeclRef};

impl Checker {
    /// Creates objects for every package-level declaration of `pkg` and
    /// attaches methods to their receiver base types.
    pub(super) fn collect(&mut self, pkg: PackageId) {
        self.with_ctx(pkg, 0, |c| c.collect_files(pkg));
    }

    fn collect_files(&mut self, pkg: PackageId) {
        let mut methods = Vec::new();
        for file in 0..self.pkg(pkg).files.len() {
            self.cur.file = file;
            let ast = Rc::clone(&self.pkg(pkg).files[file].ast);
            for (index, decl) in ast.decls.iter().enumerate() {
                match decl {
                    Decl::Func(func) if func.recv.is_some() => methods.push((file, index)),
                    Decl::Func(func) => {
                        let obj = self.declare_package_object(
                            pkg,
                            &func.name,
                            ObjectKind::Func,
                            DeclRef::new(pkg, file, index),
                        );
                        if func.name.name != "init" {
                            self.declare_member(pkg, &func.name, obj);
                        }
                    }
                    Decl::Gen(gen) => self.collect_gen(pkg, file, index, gen),
                }
            }
        }

        for (file, index) in methods {
            self.cur.file = file;
            let ast = Rc::clone(&self.pkg(pkg).files[file].ast);
            if let Decl::Func(func) = &ast.decls[index] {
                self.collect_method(pkg, DeclRef::new(pkg, file, index), func);
            }
        }
    }

    fn collect_gen(&mut self, pkg: PackageId, file: usize, decl: usize, gen: &GenDecl) {
        let mut values_from = 0;
        for (spec_index, spec) in gen.specs.iter().enumerate() {
            match spec {
                Spec::Value(spec) => {
                    let kind = if gen.kind == GenKind::Const {
                        ObjectKind::Const
                    } else {
                        ObjectKind::Var
                    };
                    if kind == ObjectKind::Var || !spec.values.is_empty() || spec.ty.is_some() {
                        values_from = spec_index;
                    }
                    for (index, name) in spec.names.iter().enumerate() {
                        let at = DeclRef {
                            spec: spec_index,
                            index,
                            values_from,
                            ..DeclRef::new(pkg, file, decl)
                        };
                        let obj = self.declare_package_object(pkg, name, kind, at);
                        self.declare_member(pkg, name, obj);
                    }
                }
                Spec::Type(spec) => {
                    let at = DeclRef {
                        spec: spec_index,
                        values_from: spec_index,
                        ..DeclRef::new(pkg, file, decl)
                    };
                    let obj = self.declare_package_object(pkg, &spec.name, ObjectKind::TypeName, at);
                    if !spec.alias {
                        let named = self.symbols.add_type(Type::Named(Named {
                            obj,
                            underlying: None,
                            methods: Vec::new(),
                        }));
                        self.symbols.object_mut(obj).ty = Some(named);
                    }
                    self.declare_member(pkg, &spec.name, obj);
                }
            }
        }
    }

    fn collect_method(&mut self, pkg: PackageId, at: DeclRef, func: &FuncDecl) {
        let obj = self.declare_package_object(pkg, &func.name, ObjectKind::Func, at);
        if func.name.is_blank() {
            return;
        }
        let Some(base) = func.recv.as_ref().and_then(|recv| receiver_base(&recv.ty)) else {
            return;
        };
        let named = self
            .pkg(pkg)
            .members
            .get(&base.name)
            .and_then(|type_obj| self.symbols.object(*type_obj).ty);
        if let Some(named) = named {
            if let Type::Named(named) = self.symbols.ty_mut(named) {
                named.methods.push(obj);
            }
        }
    }

    fn declare_package_object(
        &mut self,
        pkg: PackageId,
        name: &Ident,
        kind: ObjectKind,
        at: DeclRef,
    ) -> ObjectId {
        let obj = self.add_object(&name.name, kind, None, name.pos);
        self.decls.insert(obj, at);
        self.symbols.record_def(name, obj);
        self.pkg_mut(pkg).objects.push(obj);
        obj
    }

    fn declare_member(&mut self, pkg: PackageId, name: &Ident, obj: ObjectId) {
        if name.is_blank() {
            return;
        }
        if self.pkg(pkg).members.contains_key(&name.name) {
            self.error_at(name.pos, format!("{} redeclared in this block", name.name));
            return;
        }
        self.pkg_mut(pkg).members.insert(name.name.clone(), obj);
    }

    /// Fully resolves one package-level object of the analyzed package.
    pub(super) fn resolve_declared(&mut self, obj: ObjectId) {
        let object = self.symbols.object(obj);
        match (object.kind, object.ty) {
            (ObjectKind::TypeName, Some(named)) => {
                self.under(named);
            }
            _ => {
                self.resolve_object(obj);
            }
        }
    }

    /// Returns the type of `obj`, resolving its declaration on first use.
    ///
    /// Returns `None` while the object's own declaration is being resolved
    /// and for objects whose type cannot be determined.
    pub(super) fn resolve_object(&mut self, obj: ObjectId) -> Option<TypeId> {
        if let Some(ty) = self.symbols.object(obj).ty {
            return (ty != self.invalid).then_some(ty);
        }
        let decl = self.decls.get(&obj).copied()?;
        if !self.resolving.insert(obj) {
            return None;
        }
        let ty = self.with_ctx(decl.pkg, decl.file, |c| c.declared_type(decl));
        self.resolving.remove(&obj);
        self.symbols.object_mut(obj).ty = Some(ty.unwrap_or(self.invalid));
        ty
    }

    fn declared_type(&mut self, at: DeclRef) -> Option<TypeId> {
        let ast = Rc::clone(&self.pkg(at.pkg).files[at.file].ast);
        match &ast.decls[at.decl] {
            Decl::Func(func) => Some(self.func_signature(func)),
            Decl::Gen(gen) => match (&gen.specs[at.spec], &gen.specs[at.values_from]) {
                (Spec::Type(spec), _) => Some(self.alias_type(spec)),
                (Spec::Value(spec), Spec::Value(source)) => {
                    self.value_type(spec, source, at.index, gen.kind == GenKind::Const)
                }
                (Spec::Value(_), Spec::Type(_)) => None,
            },
        }
    }

    /// Type of the `index`th name of `spec`, whose type and values come
    /// from `source`.
    fn value_type(
        &mut self,
        spec: &ValueSpec,
        source: &ValueSpec,
        index: usize,
        is_const: bool,
    ) -> Option<TypeId> {
        if let Some(declared) = &source.ty {
            let ty = self.resolve_type(declared);
            if self.in_target() {
                for value in &source.values {
                    self.expr_cached(value, Some(ty));
                }
            }
            return Some(ty);
        }
        if source.values.len() == spec.names.len() {
            let ty = self.expr_cached(&source.values[index], None).ty()?;
            return Some(if is_const { ty } else { self.default_type(ty) });
        }
        match source.values.as_slice() {
            [value] => self
                .unpack(value, spec.names.len())
                .get(index)
                .copied()
                .flatten(),
            _ => None,
        }
    }

    fn alias_type(&mut self, spec: &TypeSpec) -> TypeId {
        self.scopes.push();
        self.declare_type_params(&spec.type_params);
        let ty = self.resolve_type(&spec.ty);
        self.scopes.pop();
        ty
    }

    fn func_signature(&mut self, func: &FuncDecl) -> TypeId {
        self.scopes.push();
        self.declare_type_params(&func.type_params);
        let recv = func.recv.as_ref().map(|recv| {
            self.declare_receiver_type_params(&recv.ty);
            self.resolve_type(&recv.ty)
        });
        let sig = self.signature(&func.sig, recv);
        self.scopes.pop();
        sig
    }

    /// Declares the type parameters a generic receiver names, as in
    /// `func (l *List[T]) Push(v T)`.
    fn declare_receiver_type_params(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeExprKind::Pointer(inner) => self.declare_receiver_type_params(inner),
            TypeExprKind::Generic { args, .. } => {
                for arg in args {
                    if let TypeExprKind::Name(name) = &arg.kind {
                        let obj = self.add_object(&name.name, ObjectKind::TypeName, None, name.pos);
                        let param = self.symbols.add_type(Type::TypeParam {
                            obj,
                            constraint: None,
                        });
                        self.symbols.object_mut(obj).ty = Some(param);
                        self.declare_local(name, obj);
                    }
                }
            }
            _ => {}
        }
    }

    /// Checks the bodies of all functions and methods declared in `file`.
    pub(super) fn check_bodies(&mut self, file: &File) {
        for decl in &file.decls {
            let Decl::Func(func) = decl else { continue };
            if func.body.is_none() {
                continue;
            }
            if let Some(obj) = self.symbols.resolve(&func.name) {
                self.check_func_body(func, obj);
            }
        }
    }

    fn check_func_body(&mut self, func: &FuncDecl, obj: ObjectId) {
        let Some(body) = &func.body else { return };
        let sig = self
            .resolve_object(obj)
            .and_then(|ty| match self.symbols.ty(ty) {
                Type::Signature(sig) => Some(sig.clone()),
                _ => None,
            });

        self.scopes.push();
        self.declare_type_params(&func.type_params);
        if let Some(recv) = &func.recv {
            self.declare_receiver_type_params(&recv.ty);
            let recv_ty = sig.as_ref().and_then(|sig| sig.recv);
            for name in &recv.names {
                self.declare_var(name, recv_ty);
            }
        }
        let (params, results) = sig.map(|sig| (sig.params, sig.results)).unwrap_or_default();
        self.declare_params(&func.sig.params, &params);
        self.declare_params(&func.sig.results, &results);

        self.results.push(results);
        self.stmts(&body.stmts);
        self.results.pop();
        self.scopes.pop();
    }

    /// Declares named parameters or results with their resolved types.
    pub(super) fn declare_params(&mut self, fields: &[Field], types: &[TypeId]) {
        let mut next = 0;
        for field in fields {
            if field.names.is_empty() {
                next += 1;
                continue;
            }
            for name in &field.names {
                self.declare_var(name, types.get(next).copied());
                next += 1;
            }
        }
    }

    pub(super) fn declare_var(&mut self, name: &Ident, ty: Option<TypeId>) -> ObjectId {
        let obj = self.add_object(&name.name, ObjectKind::Var, ty, name.pos);
        self.declare_local(name, obj);
        obj
    }

    /// Declares `obj` in the innermost block scope.
    pub(super) fn declare_local(&mut self, name: &Ident, obj: ObjectId) {
        self.symbols.record_def(name, obj);
        if name.is_blank() {
            return;
        }
        if self.scopes.innermost(&name.name).is_some() {
            self.error_at(name.pos, format!("{} redeclared in this block", name.name));
        }
        self.scopes.insert(&name.name, obj);
    }
}

impl DeclRef {
    fn new(pkg: PackageId, file: usize, decl: usize) -> Self {
        Self {
            pkg,
            file,
            decl,
            spec: 0,
            index: 0,
            values_from: 0,
        }
    }
}

/// The type name a method receiver is declared on.
fn receiver_base(ty: &TypeExpr) -> Option<&Ident> {
    match &ty.kind {
        TypeExprKind::Name(name) => Some(name),
        TypeExprKind::Pointer(inner) | TypeExprKind::Generic { base: inner, .. } => {
            receiver_base(inner)
        }
        _ => None,
    }
}
