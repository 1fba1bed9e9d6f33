//! Expressions.
//!
//! Every identifier reached is bound to its object and every value
//! expression with a known type has that type recorded. Types only need to
//! be precise enough to find methods and struct fields; constant values
//! are never computed.

use logstyle_core::ast::{
    BinaryExpr, BinaryOp, CallExpr, CompositeLit, Expr, ExprKind, FuncLit, Ident, IndexExpr,
    LitKind, SelectorExpr, SliceExpr, UnaryExpr, UnaryOp,
};
use logstyle_core::symbols::{BasicKind, Builtin, ObjectKind, Signature, Type, TypeId};
use logstyle_core::ObjectId;

use super::{Checker, Operand};

impl Checker {
    /// Like [`expr`](Self::expr), reusing a type recorded earlier for the
    /// same node.
    pub(super) fn expr_cached(&mut self, expr: &Expr, hint: Option<TypeId>) -> Operand {
        match self.symbols.type_of(expr.id) {
            Some(ty) => Operand::Value(Some(ty)),
            None => self.expr(expr, hint),
        }
    }

    /// Checks `expr`. `hint` is the type the context expects, used to type
    /// composite literals with elided types.
    pub(super) fn expr(&mut self, expr: &Expr, hint: Option<TypeId>) -> Operand {
        let operand = match &expr.kind {
            ExprKind::Ident(ident) => self.ident(ident),
            ExprKind::BasicLit(lit) => {
                let kind = match lit.kind {
                    LitKind::Int => BasicKind::UntypedInt,
                    LitKind::Float => BasicKind::UntypedFloat,
                    LitKind::Imag => BasicKind::UntypedComplex,
                    LitKind::Char => BasicKind::UntypedRune,
                    LitKind::String => BasicKind::UntypedString,
                };
                Operand::Value(Some(self.basic(kind)))
            }
            ExprKind::CompositeLit(lit) => self.composite_lit(lit, hint),
            ExprKind::FuncLit(lit) => self.func_lit(lit),
            ExprKind::Paren(inner) => self.expr(inner, hint),
            ExprKind::Selector(sel) => self.selector(sel),
            ExprKind::Index(index) => self.index(index),
            ExprKind::Slice(slice) => self.slice_expr(slice),
            ExprKind::TypeAssert(assert) => {
                self.expr(&assert.x, None);
                Operand::Value(assert.ty.as_ref().map(|ty| self.resolve_type(ty)))
            }
            ExprKind::Call(call) => self.call(call, hint),
            ExprKind::Star(inner) => match self.expr(inner, None) {
                Operand::Type(ty) => Operand::Type(self.pointer(ty)),
                operand => Operand::Value(operand.ty().and_then(|ty| self.pointer_elem(ty))),
            },
            ExprKind::Unary(unary) => self.unary(unary, hint),
            ExprKind::Binary(binary) => self.binary(binary),
            ExprKind::Type(ty) => Operand::Type(self.resolve_type(ty)),
        };
        if let Operand::Value(Some(ty)) = operand {
            self.symbols.record_type(expr.id, ty);
        }
        operand
    }

    fn ident(&mut self, ident: &Ident) -> Operand {
        if ident.is_blank() {
            return Operand::Value(None);
        }
        let Some(obj) = self.lookup(&ident.name) else {
            self.error_at(ident.pos, format!("undefined: {}", ident.name));
            return Operand::Value(None);
        };
        self.symbols.record_use(ident, obj);
        self.object_operand(obj, ident)
    }

    fn object_operand(&mut self, obj: ObjectId, ident: &Ident) -> Operand {
        match self.symbols.object(obj).kind {
            ObjectKind::PkgName(_) => {
                self.error_at(
                    ident.pos,
                    format!("use of package {} without selector", ident.name),
                );
                Operand::Package
            }
            ObjectKind::TypeName => Operand::Type(self.object_as_type(obj)),
            ObjectKind::Builtin(builtin) => Operand::Builtin(builtin),
            ObjectKind::Nil => Operand::Value(Some(self.basic(BasicKind::UntypedNil))),
            ObjectKind::Const | ObjectKind::Var | ObjectKind::Field { .. } | ObjectKind::Func => {
                Operand::Value(self.resolve_object(obj))
            }
        }
    }

    fn selector(&mut self, sel: &SelectorExpr) -> Operand {
        if let ExprKind::Ident(x) = &sel.x.kind {
            let imported = self
                .lookup(&x.name)
                .and_then(|obj| match self.symbols.object(obj).kind {
                    ObjectKind::PkgName(pkg) => Some((obj, pkg)),
                    _ => None,
                });
            if let Some((obj, pkg)) = imported {
                self.symbols.record_use(x, obj);
                let Some(member) = self.package_member(pkg, &x.name, &sel.sel) else {
                    return Operand::Value(None);
                };
                self.symbols.record_use(&sel.sel, member);
                return self.object_operand(member, &sel.sel);
            }
        }

        // Method expressions (T.M) and method values or fields (x.f).
        let base = match self.expr(&sel.x, None) {
            Operand::Type(ty) => ty,
            Operand::Value(Some(ty)) => ty,
            _ => return Operand::Value(None),
        };
        match self.lookup_member(base, &sel.sel.name) {
            Some(member) => {
                self.symbols.record_use(&sel.sel, member);
                Operand::Value(self.resolve_object(member))
            }
            None => Operand::Value(None),
        }
    }

    fn call(&mut self, call: &CallExpr, hint: Option<TypeId>) -> Operand {
        let callee = self.expr(&call.fun, None);
        for arg in &call.type_args {
            self.resolve_type(arg);
        }
        match callee {
            Operand::Type(ty) => {
                for arg in &call.args {
                    self.expr(arg, Some(ty));
                }
                Operand::Value(Some(ty))
            }
            Operand::Builtin(builtin) => self.builtin(builtin, call, hint),
            Operand::Value(Some(ty)) => {
                let under = self.under(ty);
                let Type::Signature(sig) = self.symbols.ty(under).clone() else {
                    self.untyped_args(call);
                    return Operand::Value(None);
                };
                self.call_args(call, &sig);
                match sig.results.as_slice() {
                    [] => Operand::NoValue,
                    [single] => Operand::Value(Some(*single)),
                    results => {
                        Operand::Value(Some(self.symbols.add_type(Type::Tuple(results.to_vec()))))
                    }
                }
            }
            _ => {
                self.untyped_args(call);
                Operand::Value(None)
            }
        }
    }

    fn untyped_args(&mut self, call: &CallExpr) {
        for arg in &call.args {
            self.expr(arg, None);
        }
    }

    fn call_args(&mut self, call: &CallExpr, sig: &Signature) {
        let last = sig.params.len().saturating_sub(1);
        for (i, arg) in call.args.iter().enumerate() {
            let hint = if sig.variadic && !call.ellipsis && i >= last {
                sig.params.last().and_then(|ty| self.slice_elem(*ty))
            } else {
                sig.params.get(i).copied()
            };
            self.expr(arg, hint);
        }
    }

    fn builtin(&mut self, builtin: Builtin, call: &CallExpr, hint: Option<TypeId>) -> Operand {
        let args = &call.args;
        match builtin {
            Builtin::Make | Builtin::New => {
                let ty = args.first().and_then(|arg| match self.expr(arg, None) {
                    Operand::Type(ty) => Some(ty),
                    operand => operand.ty(),
                });
                for arg in args.iter().skip(1) {
                    self.expr(arg, None);
                }
                let ty = match (builtin, ty) {
                    (Builtin::New, Some(ty)) => Some(self.pointer(ty)),
                    _ => ty,
                };
                return Operand::Value(ty);
            }
            Builtin::Append => {
                let slice = args
                    .first()
                    .and_then(|arg| self.expr(arg, hint).ty())
                    .or(hint);
                let elem = slice.and_then(|ty| self.slice_elem(ty));
                let rest_hint = if call.ellipsis { slice } else { elem };
                for arg in args.iter().skip(1) {
                    self.expr(arg, rest_hint);
                }
                return Operand::Value(slice);
            }
            _ => {}
        }

        let operands: Vec<Operand> = args.iter().map(|arg| self.expr(arg, None)).collect();
        let first = operands.first().and_then(|operand| operand.ty());
        let result = match builtin {
            Builtin::Cap | Builtin::Len | Builtin::Copy => Some(self.basic(BasicKind::Int)),
            Builtin::Complex => Some(self.basic(BasicKind::Complex128)),
            Builtin::Real | Builtin::Imag => Some(self.basic(BasicKind::Float64)),
            Builtin::Max | Builtin::Min => first,
            Builtin::Recover => Some(self.empty_interface),
            Builtin::Add => Some(self.basic(BasicKind::UnsafePointer)),
            Builtin::Alignof | Builtin::Offsetof | Builtin::Sizeof => {
                Some(self.basic(BasicKind::Uintptr))
            }
            Builtin::Slice => first
                .and_then(|ty| self.pointer_elem(ty))
                .map(|elem| self.slice(elem)),
            Builtin::SliceData => first
                .and_then(|ty| self.slice_elem(ty))
                .map(|elem| self.pointer(elem)),
            Builtin::String => Some(self.basic(BasicKind::String)),
            Builtin::StringData => {
                let byte = self.basic(BasicKind::Uint8);
                Some(self.pointer(byte))
            }
            Builtin::Clear
            | Builtin::Close
            | Builtin::Delete
            | Builtin::Panic
            | Builtin::Print
            | Builtin::Println => return Operand::NoValue,
            Builtin::Make | Builtin::New | Builtin::Append => None,
        };
        Operand::Value(result)
    }

    fn composite_lit(&mut self, lit: &CompositeLit, hint: Option<TypeId>) -> Operand {
        // An elided `&T{...}` element takes `T` from a `*T` hint.
        let (ty, result) = match (&lit.ty, hint) {
            (Some(ty), _) => {
                let ty = self.resolve_type(ty);
                (Some(ty), Some(ty))
            }
            (None, Some(hint)) => (Some(self.pointer_elem(hint).unwrap_or(hint)), Some(hint)),
            (None, None) => (None, None),
        };

        let shape = ty.map(|ty| {
            let under = self.under(ty);
            self.symbols.ty(under).clone()
        });
        match shape {
            Some(Type::Struct(fields)) => {
                for (i, elt) in lit.elts.iter().enumerate() {
                    let field = match &elt.key {
                        Some(key) => key.as_ident().and_then(|key| {
                            let field = fields
                                .iter()
                                .copied()
                                .find(|f| self.symbols.object(*f).name == key.name);
                            if let Some(field) = field {
                                self.symbols.record_use(key, field);
                            }
                            field
                        }),
                        None => fields.get(i).copied(),
                    };
                    let hint = field.and_then(|f| self.symbols.object(f).ty);
                    self.expr(&elt.value, hint);
                }
            }
            Some(Type::Slice(elem) | Type::Array { elem, .. }) => {
                for elt in &lit.elts {
                    if let Some(key) = &elt.key {
                        self.expr(key, None);
                    }
                    self.expr(&elt.value, Some(elem));
                }
            }
            Some(Type::Map { key, value }) => {
                for elt in &lit.elts {
                    if let Some(k) = &elt.key {
                        self.expr(k, Some(key));
                    }
                    self.expr(&elt.value, Some(value));
                }
            }
            _ => {
                // Bare keys may name fields of a type we could not resolve.
                for elt in &lit.elts {
                    if let Some(key) = elt.key.as_ref().filter(|k| k.as_ident().is_none()) {
                        self.expr(key, None);
                    }
                    self.expr(&elt.value, None);
                }
            }
        }
        Operand::Value(result)
    }

    fn func_lit(&mut self, lit: &FuncLit) -> Operand {
        let sig = self.signature(&lit.sig, None);
        let (params, results) = match self.symbols.ty(sig) {
            Type::Signature(s) => (s.params.clone(), s.results.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        self.scopes.push();
        self.declare_params(&lit.sig.params, &params);
        self.declare_params(&lit.sig.results, &results);
        self.results.push(results);
        self.stmts(&lit.body.stmts);
        self.results.pop();
        self.scopes.pop();
        Operand::Value(Some(sig))
    }

    fn index(&mut self, index: &IndexExpr) -> Operand {
        let base = self.expr(&index.x, None);
        let (key, result) = match base {
            // Instantiation of a generic type.
            Operand::Type(ty) => {
                for arg in &index.indices {
                    self.expr(arg, None);
                }
                return Operand::Type(ty);
            }
            Operand::Value(Some(ty)) => {
                let under = self.under(ty);
                match self.symbols.ty(under).clone() {
                    // Instantiation of a generic function.
                    Type::Signature(_) => (None, Some(ty)),
                    Type::Slice(elem) | Type::Array { elem, .. } => (None, Some(elem)),
                    Type::Pointer(target) => {
                        let target = self.under(target);
                        match self.symbols.ty(target) {
                            Type::Array { elem, .. } => (None, Some(*elem)),
                            _ => (None, None),
                        }
                    }
                    Type::Map { key, value } => (Some(key), Some(value)),
                    Type::Basic(BasicKind::String | BasicKind::UntypedString) => {
                        (None, Some(self.basic(BasicKind::Uint8)))
                    }
                    _ => (None, None),
                }
            }
            _ => (None, None),
        };
        for arg in &index.indices {
            self.expr(arg, key);
        }
        Operand::Value(result)
    }

    fn slice_expr(&mut self, slice: &SliceExpr) -> Operand {
        let base = self.expr(&slice.x, None).ty();
        for bound in [&slice.low, &slice.high, &slice.max].into_iter().flatten() {
            self.expr(bound, None);
        }
        let Some(base) = base else {
            return Operand::Value(None);
        };
        let under = self.under(base);
        let result = match self.symbols.ty(under).clone() {
            Type::Basic(BasicKind::UntypedString) => Some(self.basic(BasicKind::String)),
            Type::Basic(BasicKind::String) | Type::Slice(_) => Some(base),
            Type::Array { elem, .. } => Some(self.slice(elem)),
            Type::Pointer(target) => {
                let target = self.under(target);
                match self.symbols.ty(target).clone() {
                    Type::Array { elem, .. } => Some(self.slice(elem)),
                    _ => None,
                }
            }
            _ => None,
        };
        Operand::Value(result)
    }

    fn unary(&mut self, unary: &UnaryExpr, hint: Option<TypeId>) -> Operand {
        match unary.op {
            UnaryOp::Addr => {
                let inner = hint.and_then(|ty| self.pointer_elem(ty));
                let ty = self.expr(&unary.x, inner).ty();
                Operand::Value(ty.map(|ty| self.pointer(ty)))
            }
            UnaryOp::Recv => {
                let ty = self.expr(&unary.x, None).ty();
                Operand::Value(ty.and_then(|ty| self.chan_elem(ty)))
            }
            UnaryOp::Plus | UnaryOp::Neg | UnaryOp::Not | UnaryOp::Xor => {
                Operand::Value(self.expr(&unary.x, hint).ty())
            }
        }
    }

    fn binary(&mut self, binary: &BinaryExpr) -> Operand {
        let x = self.expr(&binary.x, None).ty();
        let y = self.expr(&binary.y, None).ty();
        let ty = match binary.op {
            BinaryOp::Compare => Some(self.basic(BasicKind::UntypedBool)),
            BinaryOp::Shift => x,
            BinaryOp::Add | BinaryOp::Arith | BinaryOp::Logical => match (x, y) {
                (Some(x), Some(y)) if self.is_untyped(x) && !self.is_untyped(y) => Some(y),
                (None, y) => y,
                (x, _) => x,
            },
        };
        Operand::Value(ty)
    }

    /// Types of the `n` values produced by a single right-hand side:
    /// a multi-value call, or a comma-ok form.
    pub(super) fn unpack(&mut self, value: &Expr, n: usize) -> Vec<Option<TypeId>> {
        let ty = self.expr_cached(value, None).ty();
        let mut types = match ty.map(|ty| self.symbols.ty(ty).clone()) {
            Some(Type::Tuple(items)) => items.into_iter().map(Some).collect(),
            _ => {
                let mut types = vec![ty.map(|ty| self.default_type(ty))];
                if n == 2 && is_comma_ok(value) {
                    types.push(Some(self.basic(BasicKind::Bool)));
                }
                types
            }
        };
        types.resize(n, None);
        types
    }
}

fn is_comma_ok(expr: &Expr) -> bool {
    match &expr.unparen().kind {
        ExprKind::Index(_) | ExprKind::TypeAssert(_) => true,
        ExprKind::Unary(unary) => unary.op == UnaryOp::Recv,
        _ => false,
    }
}
