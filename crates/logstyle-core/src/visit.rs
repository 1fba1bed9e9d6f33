//! Read-only traversal of the syntax tree.
//!
//! Implement [`Visit`] and override the `visit_*` methods for the nodes of
//! interest; call the matching `walk_*` function to continue into children.
//! Children are visited in source order.
//!
//! ```ignore
//! struct CallCounter(usize);
//!
//! impl<'ast> Visit<'ast> for CallCounter {
//!     fn visit_expr(&mut self, expr: &'ast Expr) {
//!         if matches!(expr.kind, ExprKind::Call(_)) {
//!             self.0 += 1;
//!         }
//!         visit::walk_expr(self, expr);
//!     }
//! }
//! ```

use crate::ast::{
    Block, CallExpr, Decl, Expr, ExprKind, Field, File, FuncDecl, FuncType, GenDecl,
    InterfaceElem, Spec, Stmt, TypeExpr, TypeExprKind,
};

/// Syntax tree visitor with default depth-first, pre-order traversal.
pub trait Visit<'ast> {
    /// Visits a file.
    fn visit_file(&mut self, file: &'ast File) {
        walk_file(self, file);
    }

    /// Visits a top-level declaration.
    fn visit_decl(&mut self, decl: &'ast Decl) {
        walk_decl(self, decl);
    }

    /// Visits a function declaration.
    fn visit_func_decl(&mut self, func: &'ast FuncDecl) {
        walk_func_decl(self, func);
    }

    /// Visits a `const`/`var`/`type` declaration.
    fn visit_gen_decl(&mut self, decl: &'ast GenDecl) {
        walk_gen_decl(self, decl);
    }

    /// Visits a statement.
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    /// Visits a block.
    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    /// Visits an expression.
    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    /// Visits a type expression.
    fn visit_type_expr(&mut self, ty: &'ast TypeExpr) {
        walk_type_expr(self, ty);
    }

    /// Visits a signature.
    fn visit_func_type(&mut self, sig: &'ast FuncType) {
        walk_func_type(self, sig);
    }
}

/// Visits the declarations of a file.
pub fn walk_file<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, file: &'ast File) {
    for decl in &file.decls {
        v.visit_decl(decl);
    }
}

/// Visits the contents of a declaration.
pub fn walk_decl<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, decl: &'ast Decl) {
    match decl {
        Decl::Func(func) => v.visit_func_decl(func),
        Decl::Gen(gen) => v.visit_gen_decl(gen),
    }
}

/// Visits receiver, type parameters, signature and body.
pub fn walk_func_decl<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, func: &'ast FuncDecl) {
    if let Some(recv) = &func.recv {
        walk_field(v, recv);
    }
    for field in &func.type_params {
        walk_field(v, field);
    }
    v.visit_func_type(&func.sig);
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

/// Visits the specs of a declaration.
pub fn walk_gen_decl<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, decl: &'ast GenDecl) {
    for spec in &decl.specs {
        match spec {
            Spec::Value(value) => {
                if let Some(ty) = &value.ty {
                    v.visit_type_expr(ty);
                }
                for expr in &value.values {
                    v.visit_expr(expr);
                }
            }
            Spec::Type(ty) => {
                for field in &ty.type_params {
                    walk_field(v, field);
                }
                v.visit_type_expr(&ty.ty);
            }
        }
    }
}

/// Visits the type of a field.
pub fn walk_field<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, field: &'ast Field) {
    v.visit_type_expr(&field.ty);
}

/// Visits parameter and result types.
pub fn walk_func_type<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, sig: &'ast FuncType) {
    for field in sig.params.iter().chain(&sig.results) {
        walk_field(v, field);
    }
}

/// Visits the statements of a block.
pub fn walk_block<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

fn walk_opt_stmt<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, stmt: Option<&'ast Stmt>) {
    if let Some(stmt) = stmt {
        v.visit_stmt(stmt);
    }
}

/// Visits the children of a statement.
pub fn walk_stmt<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Expr(expr) | Stmt::IncDec(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
            v.visit_expr(expr);
        }
        Stmt::Decl(decl) => v.visit_gen_decl(decl),
        Stmt::Assign(assign) => {
            for expr in assign.lhs.iter().chain(&assign.rhs) {
                v.visit_expr(expr);
            }
        }
        Stmt::Send { chan, value } => {
            v.visit_expr(chan);
            v.visit_expr(value);
        }
        Stmt::Return(results) => {
            for expr in results {
                v.visit_expr(expr);
            }
        }
        Stmt::Block(block) => v.visit_block(block),
        Stmt::If(if_stmt) => {
            walk_opt_stmt(v, if_stmt.init.as_deref());
            v.visit_expr(&if_stmt.cond);
            v.visit_block(&if_stmt.then);
            walk_opt_stmt(v, if_stmt.els.as_deref());
        }
        Stmt::For(for_stmt) => {
            walk_opt_stmt(v, for_stmt.init.as_deref());
            if let Some(cond) = &for_stmt.cond {
                v.visit_expr(cond);
            }
            walk_opt_stmt(v, for_stmt.post.as_deref());
            v.visit_block(&for_stmt.body);
        }
        Stmt::Range(range) => {
            for expr in range.key.iter().chain(&range.value) {
                v.visit_expr(expr);
            }
            v.visit_expr(&range.expr);
            v.visit_block(&range.body);
        }
        Stmt::Switch(switch) => {
            walk_opt_stmt(v, switch.init.as_deref());
            if let Some(tag) = &switch.tag {
                v.visit_expr(tag);
            }
            for clause in &switch.clauses {
                for expr in &clause.exprs {
                    v.visit_expr(expr);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::TypeSwitch(switch) => {
            walk_opt_stmt(v, switch.init.as_deref());
            v.visit_expr(&switch.subject);
            for clause in &switch.clauses {
                for ty in &clause.types {
                    v.visit_type_expr(ty);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Select(select) => {
            for clause in &select.clauses {
                walk_opt_stmt(v, clause.comm.as_deref());
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::Branch | Stmt::Empty => {}
    }
}

/// Visits callee, type arguments and arguments of a call.
pub fn walk_call<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, call: &'ast CallExpr) {
    v.visit_expr(&call.fun);
    for ty in &call.type_args {
        v.visit_type_expr(ty);
    }
    for arg in &call.args {
        v.visit_expr(arg);
    }
}

/// Visits the children of an expression.
pub fn walk_expr<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit(_) => {}
        ExprKind::CompositeLit(lit) => {
            if let Some(ty) = &lit.ty {
                v.visit_type_expr(ty);
            }
            for elt in &lit.elts {
                if let Some(key) = &elt.key {
                    v.visit_expr(key);
                }
                v.visit_expr(&elt.value);
            }
        }
        ExprKind::FuncLit(func) => {
            v.visit_func_type(&func.sig);
            v.visit_block(&func.body);
        }
        ExprKind::Paren(inner) | ExprKind::Star(inner) => v.visit_expr(inner),
        ExprKind::Selector(sel) => v.visit_expr(&sel.x),
        ExprKind::Index(index) => {
            v.visit_expr(&index.x);
            for expr in &index.indices {
                v.visit_expr(expr);
            }
        }
        ExprKind::Slice(slice) => {
            v.visit_expr(&slice.x);
            for bound in [&slice.low, &slice.high, &slice.max].into_iter().flatten() {
                v.visit_expr(bound);
            }
        }
        ExprKind::TypeAssert(assert) => {
            v.visit_expr(&assert.x);
            if let Some(ty) = &assert.ty {
                v.visit_type_expr(ty);
            }
        }
        ExprKind::Call(call) => walk_call(v, call),
        ExprKind::Unary(unary) => v.visit_expr(&unary.x),
        ExprKind::Binary(binary) => {
            v.visit_expr(&binary.x);
            v.visit_expr(&binary.y);
        }
        ExprKind::Type(ty) => v.visit_type_expr(ty),
    }
}

/// Visits the children of a type expression.
pub fn walk_type_expr<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, ty: &'ast TypeExpr) {
    match &ty.kind {
        TypeExprKind::Name(_) | TypeExprKind::Qualified { .. } => {}
        TypeExprKind::Pointer(elem) | TypeExprKind::Slice(elem) | TypeExprKind::Approx(elem) => {
            v.visit_type_expr(elem);
        }
        TypeExprKind::Array { len, elem } => {
            if let Some(len) = len {
                v.visit_expr(len);
            }
            v.visit_type_expr(elem);
        }
        TypeExprKind::Map { key, value } => {
            v.visit_type_expr(key);
            v.visit_type_expr(value);
        }
        TypeExprKind::Chan { elem, .. } => v.visit_type_expr(elem),
        TypeExprKind::Func(sig) => v.visit_func_type(sig),
        TypeExprKind::Struct(fields) => {
            for field in fields {
                walk_field(v, field);
            }
        }
        TypeExprKind::Interface(elems) => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { sig, .. } => v.visit_func_type(sig),
                    InterfaceElem::Embedded(terms) => {
                        for term in terms {
                            v.visit_type_expr(term);
                        }
                    }
                }
            }
        }
        TypeExprKind::Generic { base, args } => {
            v.visit_type_expr(base);
            for arg in args {
                v.visit_type_expr(arg);
            }
        }
    }
}
