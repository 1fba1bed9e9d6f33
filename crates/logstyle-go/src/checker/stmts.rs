//! Statements and local declarations.

use logstyle_core::ast::{
    AssignStmt, Block, Expr, ExprKind, GenDecl, GenKind, RangeStmt, Spec, Stmt, SwitchStmt,
    TypeSwitchStmt, ValueSpec,
};
use logstyle_core::symbols::{BasicKind, Named, ObjectKind, Type, TypeId};

use super::Checker;

impl Checker {
    pub(super) fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn block(&mut self, block: &Block) {
        self.scopes.push();
        self.stmts(&block.stmts);
        self.scopes.pop();
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) | Stmt::IncDec(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
                self.expr(expr, None);
            }
            Stmt::Decl(decl) => self.local_decl(decl),
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::Send { chan, value } => {
                let elem = self
                    .expr(chan, None)
                    .ty()
                    .and_then(|ty| self.chan_elem(ty));
                self.expr(value, elem);
            }
            Stmt::Return(values) => {
                let results = self.results.last().cloned().unwrap_or_default();
                for (i, value) in values.iter().enumerate() {
                    self.expr(value, results.get(i).copied());
                }
            }
            Stmt::Block(block) => self.block(block),
            Stmt::If(stmt) => {
                self.scopes.push();
                if let Some(init) = &stmt.init {
                    self.stmt(init);
                }
                self.expr(&stmt.cond, None);
                self.block(&stmt.then);
                if let Some(els) = &stmt.els {
                    self.stmt(els);
                }
                self.scopes.pop();
            }
            Stmt::For(stmt) => {
                self.scopes.push();
                if let Some(init) = &stmt.init {
                    self.stmt(init);
                }
                if let Some(cond) = &stmt.cond {
                    self.expr(cond, None);
                }
                if let Some(post) = &stmt.post {
                    self.stmt(post);
                }
                self.block(&stmt.body);
                self.scopes.pop();
            }
            Stmt::Range(stmt) => self.range(stmt),
            Stmt::Switch(stmt) => self.switch(stmt),
            Stmt::TypeSwitch(stmt) => self.type_switch(stmt),
            Stmt::Select(stmt) => {
                for clause in &stmt.clauses {
                    self.scopes.push();
                    if let Some(comm) = &clause.comm {
                        self.stmt(comm);
                    }
                    self.stmts(&clause.body);
                    self.scopes.pop();
                }
            }
            Stmt::Labeled { stmt, .. } => self.stmt(stmt),
            Stmt::Branch | Stmt::Empty => {}
        }
    }

    fn local_decl(&mut self, decl: &GenDecl) {
        let mut source: Option<&ValueSpec> = None;
        for spec in &decl.specs {
            match spec {
                Spec::Value(spec) => {
                    if decl.kind == GenKind::Var || !spec.values.is_empty() || spec.ty.is_some() {
                        source = Some(spec);
                    }
                    let from = source.unwrap_or(spec);
                    self.local_values(spec, from, decl.kind == GenKind::Const);
                }
                Spec::Type(spec) => {
                    let obj = self.add_object(&spec.name.name, ObjectKind::TypeName, None, spec.name.pos);
                    if spec.alias {
                        self.declare_local(&spec.name, obj);
                        self.scopes.push();
                        self.declare_type_params(&spec.type_params);
                        let ty = self.resolve_type(&spec.ty);
                        self.scopes.pop();
                        self.symbols.object_mut(obj).ty = Some(ty);
                        continue;
                    }
                    let named = self.symbols.add_type(Type::Named(Named {
                        obj,
                        underlying: None,
                        methods: Vec::new(),
                    }));
                    self.symbols.object_mut(obj).ty = Some(named);
                    // Declared first so the type may refer to itself.
                    self.declare_local(&spec.name, obj);
                    let underlying = self.declared_underlying(named, &spec.type_params, &spec.ty);
                    self.set_underlying(named, underlying);
                }
            }
        }
    }

    /// Declares the names of a local `var` or `const` spec. The values are
    /// checked before the names come into scope.
    fn local_values(&mut self, spec: &ValueSpec, source: &ValueSpec, is_const: bool) {
        let declared = source.ty.as_ref().map(|ty| self.resolve_type(ty));
        let n = spec.names.len();
        let types: Vec<Option<TypeId>> = if let Some(ty) = declared {
            for value in &source.values {
                self.expr_cached(value, Some(ty));
            }
            vec![Some(ty); n]
        } else if source.values.len() == n {
            source
                .values
                .iter()
                .map(|value| {
                    let ty = self.expr_cached(value, None).ty();
                    if is_const {
                        ty
                    } else {
                        ty.map(|ty| self.default_type(ty))
                    }
                })
                .collect()
        } else if let [value] = source.values.as_slice() {
            self.unpack(value, n)
        } else {
            for value in &source.values {
                self.expr_cached(value, None);
            }
            vec![None; n]
        };

        let kind = if is_const {
            ObjectKind::Const
        } else {
            ObjectKind::Var
        };
        for (name, ty) in spec.names.iter().zip(types) {
            let obj = self.add_object(&name.name, kind, ty, name.pos);
            self.declare_local(name, obj);
        }
    }

    fn assign(&mut self, assign: &AssignStmt) {
        if !assign.define {
            let targets: Vec<Option<TypeId>> = assign
                .lhs
                .iter()
                .map(|lhs| self.expr(lhs, None).ty())
                .collect();
            if assign.rhs.len() == targets.len() {
                for (rhs, hint) in assign.rhs.iter().zip(targets) {
                    self.expr(rhs, hint);
                }
            } else {
                for rhs in &assign.rhs {
                    self.expr(rhs, None);
                }
            }
            return;
        }

        let types = self.rhs_types(&assign.rhs, assign.lhs.len());
        for (lhs, ty) in assign.lhs.iter().zip(types) {
            let ExprKind::Ident(name) = &lhs.kind else {
                self.expr(lhs, None);
                continue;
            };
            if name.is_blank() {
                continue;
            }
            // `:=` reuses variables already declared in the same scope.
            if let Some(existing) = self.scopes.innermost(&name.name) {
                self.symbols.record_use(name, existing);
                continue;
            }
            self.declare_var(name, ty.map(|ty| self.default_type(ty)));
        }
    }

    fn rhs_types(&mut self, rhs: &[Expr], n: usize) -> Vec<Option<TypeId>> {
        if rhs.len() == n {
            return rhs.iter().map(|value| self.expr(value, None).ty()).collect();
        }
        if let [value] = rhs {
            return self.unpack(value, n);
        }
        for value in rhs {
            self.expr(value, None);
        }
        vec![None; n]
    }

    fn range(&mut self, stmt: &RangeStmt) {
        let ranged = self.expr(&stmt.expr, None).ty();
        let (key_ty, value_ty) = match ranged {
            Some(ty) => self.range_types(ty),
            None => (None, None),
        };

        self.scopes.push();
        for (target, ty) in [(&stmt.key, key_ty), (&stmt.value, value_ty)] {
            let Some(target) = target else { continue };
            match (&target.kind, stmt.define) {
                (ExprKind::Ident(name), true) => {
                    self.declare_var(name, ty.map(|ty| self.default_type(ty)));
                }
                _ => {
                    self.expr(target, None);
                }
            }
        }
        self.block(&stmt.body);
        self.scopes.pop();
    }

    /// Key and value types produced by ranging over `ty`.
    fn range_types(&mut self, ty: TypeId) -> (Option<TypeId>, Option<TypeId>) {
        let int = self.basic(BasicKind::Int);
        let under = self.under(ty);
        match self.symbols.ty(under).clone() {
            Type::Basic(BasicKind::String | BasicKind::UntypedString) => {
                (Some(int), Some(self.basic(BasicKind::Int32)))
            }
            Type::Basic(_) => (Some(ty), None),
            Type::Slice(elem) | Type::Array { elem, .. } => (Some(int), Some(elem)),
            Type::Pointer(target) => {
                let target = self.under(target);
                match self.symbols.ty(target) {
                    Type::Array { elem, .. } => (Some(int), Some(*elem)),
                    _ => (None, None),
                }
            }
            Type::Map { key, value } => (Some(key), Some(value)),
            Type::Chan { elem, .. } => (Some(elem), None),
            // Range-over-func: func(yield func(K, V) bool).
            Type::Signature(sig) => {
                let Some(yield_ty) = sig.params.first().copied() else {
                    return (None, None);
                };
                let yield_ty = self.under(yield_ty);
                match self.symbols.ty(yield_ty) {
                    Type::Signature(y) => (y.params.first().copied(), y.params.get(1).copied()),
                    _ => (None, None),
                }
            }
            _ => (None, None),
        }
    }

    fn switch(&mut self, stmt: &SwitchStmt) {
        self.scopes.push();
        if let Some(init) = &stmt.init {
            self.stmt(init);
        }
        let tag = stmt.tag.as_ref().and_then(|tag| self.expr(tag, None).ty());
        for clause in &stmt.clauses {
            for expr in &clause.exprs {
                self.expr(expr, tag);
            }
            self.scopes.push();
            self.stmts(&clause.body);
            self.scopes.pop();
        }
        self.scopes.pop();
    }

    /// Each clause declares its own copy of the bound variable, typed by the
    /// clause's single case type or else by the switch subject.
    fn type_switch(&mut self, stmt: &TypeSwitchStmt) {
        self.scopes.push();
        if let Some(init) = &stmt.init {
            self.stmt(init);
        }
        let subject = self.expr(&stmt.subject, None).ty();
        for (i, clause) in stmt.clauses.iter().enumerate() {
            let cases: Vec<TypeId> = clause.types.iter().map(|ty| self.resolve_type(ty)).collect();
            self.scopes.push();
            if let Some(binding) = stmt.binding.as_ref().filter(|b| !b.is_blank()) {
                let ty = match cases.as_slice() {
                    [single] if *single != self.invalid => Some(*single),
                    _ => subject,
                };
                let obj = self.add_object(&binding.name, ObjectKind::Var, ty, clause.pos);
                if i == 0 {
                    self.symbols.record_def(binding, obj);
                }
                self.scopes.insert(&binding.name, obj);
            }
            self.stmts(&clause.body);
            self.scopes.pop();
        }
        self.scopes.pop();
    }
}
