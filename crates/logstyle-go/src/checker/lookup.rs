//! Name lookup: scopes, imported packages and selectable members.

use std::collections::HashSet;

use logstyle_core::ast::{is_exported, Ident};
use logstyle_core::symbols::{ObjectKind, PackageId, Type, TypeId};
use logstyle_core::ObjectId;

use super::{Checker, Status};

impl Checker {
    /// Resolves an unqualified name: block scopes, then the file's
    /// imports, then the package, then dot-imported packages, then the
    /// universe.
    pub(super) fn lookup(&mut self, name: &str) -> Option<ObjectId> {
        if let Some(obj) = self.scopes.lookup(name) {
            return Some(obj);
        }
        let pkg = self.pkg(self.cur.pkg);
        let file = pkg.files.get(self.cur.file);
        if let Some(obj) = file.and_then(|f| f.imports.get(name)) {
            return Some(*obj);
        }
        if let Some(obj) = pkg.members.get(name) {
            return Some(*obj);
        }
        let dots = file.map(|f| f.dot_imports.clone()).unwrap_or_default();
        if is_exported(name) {
            for dot in dots {
                self.ensure_loaded(dot);
                if let Some(obj) = self.pkg(dot).members.get(name) {
                    return Some(*obj);
                }
            }
        }
        self.universe.get(name).copied()
    }

    /// Resolves `qualifier.name` in an imported package.
    ///
    /// Members of packages that could not be read completely resolve to
    /// nothing without an error.
    pub(super) fn package_member(
        &mut self,
        pkg: PackageId,
        qualifier: &str,
        name: &Ident,
    ) -> Option<ObjectId> {
        self.ensure_loaded(pkg);
        let state = self.pkg(pkg);
        if matches!(state.status, Status::Missing | Status::Opaque) {
            return None;
        }
        if let Some(obj) = state.members.get(&name.name).copied() {
            if !name.is_exported() && pkg != self.cur.pkg {
                let package = self.symbols.package(pkg).name.clone();
                self.error_at(
                    name.pos,
                    format!("name {} not exported by package {package}", name.name),
                );
                return None;
            }
            return Some(obj);
        }
        if !state.partial {
            self.error_at(name.pos, format!("undefined: {qualifier}.{}", name.name));
        }
        None
    }

    /// Finds the field or method `name` of `ty`, searching embedded fields
    /// breadth-first and looking through one pointer indirection.
    pub(super) fn lookup_member(&mut self, ty: TypeId, name: &str) -> Option<ObjectId> {
        let start = self.pointer_elem(ty).unwrap_or(ty);
        let mut seen = HashSet::new();
        let mut level = vec![start];
        while !level.is_empty() {
            let mut next = Vec::new();
            for ty in level {
                if !seen.insert(ty) {
                    continue;
                }
                if let Some(found) = self.direct_member(ty, name, &mut next) {
                    return Some(found);
                }
            }
            level = next;
        }
        None
    }

    /// Looks for `name` declared directly on `ty`; embedded field types are
    /// queued in `embedded` for the next depth.
    fn direct_member(
        &mut self,
        ty: TypeId,
        name: &str,
        embedded: &mut Vec<TypeId>,
    ) -> Option<ObjectId> {
        if let Type::Named(named) = self.symbols.ty(ty) {
            let method = named
                .methods
                .iter()
                .copied()
                .find(|m| self.symbols.object(*m).name == name);
            if method.is_some() {
                return method;
            }
        }
        let under = self.under(ty);
        match self.symbols.ty(under).clone() {
            Type::Struct(fields) => {
                for field in fields {
                    let object = self.symbols.object(field);
                    if object.name == name {
                        return Some(field);
                    }
                    if let (ObjectKind::Field { embedded: true }, Some(field_ty)) =
                        (object.kind, object.ty)
                    {
                        let target = self.pointer_elem(field_ty).unwrap_or(field_ty);
                        embedded.push(target);
                    }
                }
                None
            }
            Type::Interface { .. } => self.interface_method(under, name, &mut HashSet::new()),
            Type::TypeParam {
                constraint: Some(constraint),
                ..
            } => {
                let bound = self.under(constraint);
                self.interface_method(bound, name, &mut HashSet::new())
            }
            _ => None,
        }
    }

    fn interface_method(
        &mut self,
        iface: TypeId,
        name: &str,
        seen: &mut HashSet<TypeId>,
    ) -> Option<ObjectId> {
        if !seen.insert(iface) {
            return None;
        }
        let Type::Interface { methods, embedded } = self.symbols.ty(iface).clone() else {
            return None;
        };
        let method = methods
            .iter()
            .copied()
            .find(|m| self.symbols.object(*m).name == name);
        if method.is_some() {
            return method;
        }
        for inner in embedded {
            let inner = self.under(inner);
            if let Some(method) = self.interface_method(inner, name, seen) {
                return Some(method);
            }
        }
        None
    }
}
