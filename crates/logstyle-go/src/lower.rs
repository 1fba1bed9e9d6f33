//! Lowering of tree-sitter-go concrete syntax trees into the core syntax
//! tree.

use logstyle_core::ast::{
    AssignStmt, BasicLit, BinaryExpr, BinaryOp, Block, CallExpr, CaseClause, ChanDir, CommClause,
    CompositeLit, Decl, Element, Expr, ExprKind, Field, File, ForStmt, FuncDecl, FuncLit,
    FuncType, GenDecl, GenKind, Ident, IfStmt, ImportSpec, IndexExpr, InterfaceElem, LitKind,
    NodeId, RangeStmt, SelectStmt, SelectorExpr, SliceExpr, Spec, Stmt, SwitchStmt,
    TypeAssertExpr, TypeCaseClause, TypeExpr, TypeExprKind, TypeSpec, TypeSwitchStmt, UnaryExpr,
    UnaryOp, ValueSpec,
};
use logstyle_core::fileset::SourceFile;
use logstyle_core::Pos;
use tree_sitter::Node;

/// Hands out [`NodeId`]s unique across every file of one load.
#[derive(Debug, Default)]
pub struct NodeIds(u32);

impl NodeIds {
    /// Returns a fresh id.
    pub fn next(&mut self) -> NodeId {
        self.0 += 1;
        NodeId(self.0)
    }
}

/// A construct the lowering does not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerError {
    /// Offending position.
    pub pos: Pos,
    /// Description.
    pub message: String,
}

type Result<T> = std::result::Result<T, LowerError>;

const TYPE_KINDS: &[&str] = &[
    "type_identifier",
    "qualified_type",
    "generic_type",
    "pointer_type",
    "slice_type",
    "array_type",
    "implicit_length_array_type",
    "map_type",
    "channel_type",
    "function_type",
    "struct_type",
    "interface_type",
    "negated_type",
    "parenthesized_type",
];

/// Lowers one parsed file.
pub struct Lowerer<'a> {
    file: &'a SourceFile,
    ids: &'a mut NodeIds,
    skip_bodies: bool,
}

impl<'a> Lowerer<'a> {
    /// Creates a lowerer for `file`. With `skip_bodies`, function bodies are
    /// dropped; dependency packages only need their declarations.
    pub fn new(file: &'a SourceFile, ids: &'a mut NodeIds, skip_bodies: bool) -> Self {
        Self {
            file,
            ids,
            skip_bodies,
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        let file: &'a SourceFile = self.file;
        file.content()
            .get(node.start_byte()..node.end_byte())
            .unwrap_or("")
    }

    fn pos(&self, node: Node<'_>) -> Pos {
        self.file.pos(node.start_byte())
    }

    fn error(&self, node: Node<'_>, message: impl Into<String>) -> LowerError {
        LowerError {
            pos: self.pos(node),
            message: message.into(),
        }
    }

    fn unexpected(&self, node: Node<'_>, what: &str) -> LowerError {
        self.error(node, format!("unexpected {} in {what}", node.kind()))
    }

    fn required<'t>(&self, node: Node<'t>, field: &str) -> Result<Node<'t>> {
        node.child_by_field_name(field)
            .ok_or_else(|| self.error(node, format!("missing {field} in {}", node.kind())))
    }

    fn ident(&mut self, node: Node<'_>) -> Ident {
        Ident {
            id: self.ids.next(),
            name: self.text(node).to_string(),
            pos: self.pos(node),
        }
    }

    fn expr_node(&mut self, node: Node<'_>, kind: ExprKind) -> Expr {
        Expr {
            id: self.ids.next(),
            pos: self.pos(node),
            end: self.file.pos(node.end_byte()),
            kind,
        }
    }

    fn type_node(&mut self, node: Node<'_>, kind: TypeExprKind) -> TypeExpr {
        TypeExpr {
            id: self.ids.next(),
            pos: self.pos(node),
            kind,
        }
    }

    /// Lowers a `source_file` node.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing package clause, statements outside
    /// function bodies, and node shapes the lowering does not know.
    pub fn lower_file(&mut self, root: Node<'_>) -> Result<File> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut decls = Vec::new();

        for child in named(root) {
            match child.kind() {
                "package_clause" => {
                    let name = named(child)
                        .into_iter()
                        .next()
                        .ok_or_else(|| self.error(child, "missing package name"))?;
                    package = Some(self.ident(name));
                }
                "import_declaration" => self.imports(child, &mut imports),
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.func_decl(child)?));
                }
                "const_declaration" | "var_declaration" | "type_declaration" => {
                    decls.push(Decl::Gen(self.gen_decl(child)?));
                }
                _ => {
                    return Err(self.error(
                        child,
                        "syntax error: non-declaration statement outside function body",
                    ))
                }
            }
        }

        let package = package.ok_or_else(|| LowerError {
            pos: self.file.pos(0),
            message: "expected 'package', found 'EOF'".into(),
        })?;
        Ok(File {
            name: self.file.name().to_string(),
            package,
            imports,
            decls,
        })
    }

    fn imports(&mut self, node: Node<'_>, out: &mut Vec<ImportSpec>) {
        for child in named(node) {
            match child.kind() {
                "import_spec" => {
                    let name = child.child_by_field_name("name").map(|n| self.ident(n));
                    if let Some(path) = child.child_by_field_name("path") {
                        out.push(ImportSpec {
                            name,
                            path: unquote(self.text(path)),
                            pos: self.pos(path),
                        });
                    }
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn func_decl(&mut self, node: Node<'_>) -> Result<FuncDecl> {
        let recv = match node.child_by_field_name("receiver") {
            Some(list) => self.params(list)?.into_iter().next(),
            None => None,
        };
        let name = self.ident(self.required(node, "name")?);
        let type_params = self.type_params(node)?;
        let sig = self.signature(node)?;
        let body = match node.child_by_field_name("body") {
            Some(body) if !self.skip_bodies => Some(self.block(body)?),
            _ => None,
        };
        Ok(FuncDecl {
            recv,
            name,
            type_params,
            sig,
            body,
        })
    }

    fn signature(&mut self, node: Node<'_>) -> Result<FuncType> {
        let params = self.params(self.required(node, "parameters")?)?;
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.params(result)?,
            Some(result) => vec![Field {
                names: vec![],
                ty: self.ty(result)?,
                variadic: false,
            }],
            None => vec![],
        };
        Ok(FuncType { params, results })
    }

    fn params(&mut self, list: Node<'_>) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for param in named(list) {
            let variadic = match param.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => return Err(self.unexpected(param, "parameter list")),
            };
            let names = by_field(param, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect();
            let ty = self.ty(self.required(param, "type")?)?;
            fields.push(Field {
                names,
                ty,
                variadic,
            });
        }
        Ok(fields)
    }

    fn type_params(&mut self, node: Node<'_>) -> Result<Vec<Field>> {
        let Some(list) = node.child_by_field_name("type_parameters") else {
            return Ok(vec![]);
        };
        let mut fields = Vec::new();
        for decl in named(list) {
            let names = by_field(decl, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect();
            let ty = self.constraint(self.required(decl, "type")?)?;
            fields.push(Field {
                names,
                ty,
                variadic: false,
            });
        }
        Ok(fields)
    }

    /// A `type_elem`: a single type, or a union of terms.
    fn constraint(&mut self, node: Node<'_>) -> Result<TypeExpr> {
        if !matches!(node.kind(), "type_elem" | "type_constraint") {
            return self.ty(node);
        }
        let terms = named(node)
            .into_iter()
            .map(|term| self.ty(term))
            .collect::<Result<Vec<_>>>()?;
        match <[TypeExpr; 1]>::try_from(terms) {
            Ok([single]) => Ok(single),
            Err(terms) => Ok(self.type_node(
                node,
                TypeExprKind::Interface(vec![InterfaceElem::Embedded(terms)]),
            )),
        }
    }

    fn gen_decl(&mut self, node: Node<'_>) -> Result<GenDecl> {
        let kind = match node.kind() {
            "const_declaration" => GenKind::Const,
            "var_declaration" => GenKind::Var,
            _ => GenKind::Type,
        };
        let mut specs = Vec::new();
        let mut nodes = Vec::new();
        for child in named(node) {
            if child.kind() == "var_spec_list" {
                nodes.extend(named(child));
            } else {
                nodes.push(child);
            }
        }
        for (iota, spec) in (0_u32..).zip(nodes) {
            specs.push(match spec.kind() {
                "const_spec" | "var_spec" => Spec::Value(self.value_spec(spec, iota)?),
                "type_spec" | "type_alias" => Spec::Type(self.type_spec(spec)?),
                _ => return Err(self.unexpected(spec, "declaration")),
            });
        }
        Ok(GenDecl { kind, specs })
    }

    fn value_spec(&mut self, node: Node<'_>, iota: u32) -> Result<ValueSpec> {
        let names = by_field(node, "name")
            .into_iter()
            .map(|n| self.ident(n))
            .collect();
        let ty = match node.child_by_field_name("type") {
            Some(ty) => Some(self.ty(ty)?),
            None => None,
        };
        let values = match node.child_by_field_name("value") {
            Some(list) => self.expr_list(list)?,
            None => vec![],
        };
        Ok(ValueSpec {
            names,
            ty,
            values,
            iota,
        })
    }

    fn type_spec(&mut self, node: Node<'_>) -> Result<TypeSpec> {
        Ok(TypeSpec {
            name: self.ident(self.required(node, "name")?),
            type_params: self.type_params(node)?,
            alias: node.kind() == "type_alias",
            ty: self.ty(self.required(node, "type")?)?,
        })
    }

    /// Lowers a type node.
    fn ty(&mut self, node: Node<'_>) -> Result<TypeExpr> {
        let kind = match node.kind() {
            "type_identifier" | "identifier" => TypeExprKind::Name(self.ident(node)),
            "qualified_type" => TypeExprKind::Qualified {
                pkg: self.ident(self.required(node, "package")?),
                name: self.ident(self.required(node, "name")?),
            },
            "generic_type" => {
                let base = self.ty(self.required(node, "type")?)?;
                let args = match node.child_by_field_name("type_arguments") {
                    Some(list) => named(list)
                        .into_iter()
                        .map(|arg| self.constraint(arg))
                        .collect::<Result<Vec<_>>>()?,
                    None => vec![],
                };
                TypeExprKind::Generic {
                    base: Box::new(base),
                    args,
                }
            }
            "pointer_type" => TypeExprKind::Pointer(Box::new(self.only_child_type(node)?)),
            "slice_type" => {
                TypeExprKind::Slice(Box::new(self.ty(self.required(node, "element")?)?))
            }
            "array_type" => TypeExprKind::Array {
                len: Some(Box::new(self.expr(self.required(node, "length")?)?)),
                elem: Box::new(self.ty(self.required(node, "element")?)?),
            },
            "implicit_length_array_type" => TypeExprKind::Array {
                len: None,
                elem: Box::new(self.ty(self.required(node, "element")?)?),
            },
            "map_type" => TypeExprKind::Map {
                key: Box::new(self.ty(self.required(node, "key")?)?),
                value: Box::new(self.ty(self.required(node, "value")?)?),
            },
            "channel_type" => TypeExprKind::Chan {
                dir: chan_dir(node),
                elem: Box::new(self.ty(self.required(node, "value")?)?),
            },
            "function_type" => TypeExprKind::Func(self.signature(node)?),
            "struct_type" => TypeExprKind::Struct(self.struct_fields(node)?),
            "interface_type" => TypeExprKind::Interface(self.interface_elems(node)?),
            "negated_type" => TypeExprKind::Approx(Box::new(self.only_child_type(node)?)),
            "parenthesized_type" => return self.only_child_type(node),
            "type_elem" | "type_constraint" => return self.constraint(node),
            _ => return Err(self.unexpected(node, "type")),
        };
        Ok(self.type_node(node, kind))
    }

    fn only_child_type(&mut self, node: Node<'_>) -> Result<TypeExpr> {
        let inner = named(node)
            .into_iter()
            .next()
            .ok_or_else(|| self.error(node, format!("empty {}", node.kind())))?;
        self.ty(inner)
    }

    fn struct_fields(&mut self, node: Node<'_>) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        let lists = named(node)
            .into_iter()
            .filter(|n| n.kind() == "field_declaration_list");
        for list in lists {
            for decl in named(list) {
                if decl.kind() != "field_declaration" {
                    return Err(self.unexpected(decl, "struct type"));
                }
                let names: Vec<Ident> = by_field(decl, "name")
                    .into_iter()
                    .map(|n| self.ident(n))
                    .collect();
                let mut ty = self.ty(self.required(decl, "type")?)?;
                if names.is_empty() && has_token(decl, "*") {
                    ty = self.type_node(decl, TypeExprKind::Pointer(Box::new(ty)));
                }
                fields.push(Field {
                    names,
                    ty,
                    variadic: false,
                });
            }
        }
        Ok(fields)
    }

    fn interface_elems(&mut self, node: Node<'_>) -> Result<Vec<InterfaceElem>> {
        let mut elems = Vec::new();
        for elem in named(node) {
            match elem.kind() {
                "method_elem" | "method_spec" => elems.push(InterfaceElem::Method {
                    name: self.ident(self.required(elem, "name")?),
                    sig: self.signature(elem)?,
                }),
                "type_elem" | "constraint_elem" => {
                    let terms = named(elem)
                        .into_iter()
                        .map(|term| self.ty(term))
                        .collect::<Result<Vec<_>>>()?;
                    elems.push(InterfaceElem::Embedded(terms));
                }
                _ => elems.push(InterfaceElem::Embedded(vec![self.ty(elem)?])),
            }
        }
        Ok(elems)
    }

    fn block(&mut self, node: Node<'_>) -> Result<Block> {
        Ok(Block {
            stmts: self.stmts(node)?,
        })
    }

    /// Statements among the unlabelled children of `node`, looking through
    /// `statement_list` wrappers.
    fn stmts(&mut self, node: Node<'_>) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        for child in unfielded(node) {
            if child.kind() == "statement_list" {
                for inner in named(child) {
                    stmts.push(self.stmt(inner)?);
                }
            } else {
                stmts.push(self.stmt(child)?);
            }
        }
        Ok(stmts)
    }

    fn opt_stmt(&mut self, node: Node<'_>, field: &str) -> Result<Option<Box<Stmt>>> {
        match node.child_by_field_name(field) {
            Some(child) => Ok(Some(Box::new(self.stmt(child)?))),
            None => Ok(None),
        }
    }

    fn stmt(&mut self, node: Node<'_>) -> Result<Stmt> {
        Ok(match node.kind() {
            "expression_statement" => Stmt::Expr(self.first_expr(node)?),
            "send_statement" => Stmt::Send {
                chan: self.expr(self.required(node, "channel")?)?,
                value: self.expr(self.required(node, "value")?)?,
            },
            "inc_statement" | "dec_statement" => Stmt::IncDec(self.first_expr(node)?),
            "assignment_statement" | "short_var_declaration" => Stmt::Assign(AssignStmt {
                lhs: self.expr_list(self.required(node, "left")?)?,
                rhs: self.expr_list(self.required(node, "right")?)?,
                define: node.kind() == "short_var_declaration",
            }),
            "receive_statement" => {
                let rhs = self.expr(self.required(node, "right")?)?;
                match node.child_by_field_name("left") {
                    Some(left) => Stmt::Assign(AssignStmt {
                        lhs: self.expr_list(left)?,
                        rhs: vec![rhs],
                        define: has_token(node, ":="),
                    }),
                    None => Stmt::Expr(rhs),
                }
            }
            "const_declaration" | "var_declaration" | "type_declaration" => {
                Stmt::Decl(self.gen_decl(node)?)
            }
            "return_statement" => Stmt::Return(match named(node).into_iter().next() {
                Some(list) if list.kind() == "expression_list" => self.expr_list(list)?,
                Some(single) => vec![self.expr(single)?],
                None => vec![],
            }),
            "go_statement" => Stmt::Go(self.first_expr(node)?),
            "defer_statement" => Stmt::Defer(self.first_expr(node)?),
            "block" => Stmt::Block(self.block(node)?),
            "if_statement" => Stmt::If(IfStmt {
                init: self.opt_stmt(node, "initializer")?,
                cond: self.expr(self.required(node, "condition")?)?,
                then: self.block(self.required(node, "consequence")?)?,
                els: self.opt_stmt(node, "alternative")?,
            }),
            "for_statement" => self.for_stmt(node)?,
            "expression_switch_statement" => {
                let mut clauses = Vec::new();
                for clause in unfielded(node) {
                    let exprs = match clause.child_by_field_name("value") {
                        Some(list) => self.expr_list(list)?,
                        None => vec![],
                    };
                    clauses.push(CaseClause {
                        exprs,
                        body: self.stmts(clause)?,
                    });
                }
                Stmt::Switch(SwitchStmt {
                    init: self.opt_stmt(node, "initializer")?,
                    tag: match node.child_by_field_name("value") {
                        Some(tag) => Some(self.expr(tag)?),
                        None => None,
                    },
                    clauses,
                })
            }
            "type_switch_statement" => self.type_switch(node)?,
            "select_statement" => {
                let mut clauses = Vec::new();
                for clause in unfielded(node) {
                    clauses.push(CommClause {
                        comm: self.opt_stmt(clause, "communication")?,
                        body: self.stmts(clause)?,
                    });
                }
                Stmt::Select(SelectStmt { clauses })
            }
            "labeled_statement" | "empty_labeled_statement" => {
                let label = self.ident(self.required(node, "label")?);
                let stmt = match unfielded(node).into_iter().next() {
                    Some(inner) => self.stmt(inner)?,
                    None => Stmt::Empty,
                };
                Stmt::Labeled {
                    label,
                    stmt: Box::new(stmt),
                }
            }
            "break_statement" | "continue_statement" | "goto_statement"
            | "fallthrough_statement" => Stmt::Branch,
            "empty_statement" => Stmt::Empty,
            _ => return Err(self.unexpected(node, "statement list")),
        })
    }

    fn for_stmt(&mut self, node: Node<'_>) -> Result<Stmt> {
        let body = self.block(self.required(node, "body")?)?;
        let header = unfielded(node).into_iter().next();
        Ok(match header {
            None => Stmt::For(ForStmt {
                init: None,
                cond: None,
                post: None,
                body,
            }),
            Some(clause) if clause.kind() == "for_clause" => Stmt::For(ForStmt {
                init: self.opt_stmt(clause, "initializer")?,
                cond: match clause.child_by_field_name("condition") {
                    Some(cond) => Some(self.expr(cond)?),
                    None => None,
                },
                post: self.opt_stmt(clause, "update")?,
                body,
            }),
            Some(clause) if clause.kind() == "range_clause" => {
                let mut lhs = match clause.child_by_field_name("left") {
                    Some(left) => self.expr_list(left)?.into_iter(),
                    None => Vec::new().into_iter(),
                };
                Stmt::Range(RangeStmt {
                    key: lhs.next(),
                    value: lhs.next(),
                    define: has_token(clause, ":="),
                    expr: self.expr(self.required(clause, "right")?)?,
                    body,
                })
            }
            Some(cond) => Stmt::For(ForStmt {
                init: None,
                cond: Some(self.expr(cond)?),
                post: None,
                body,
            }),
        })
    }

    fn type_switch(&mut self, node: Node<'_>) -> Result<Stmt> {
        let init = self.opt_stmt(node, "initializer")?;
        let binding = node
            .child_by_field_name("alias")
            .and_then(|list| {
                if list.kind() == "expression_list" {
                    named(list).into_iter().next()
                } else {
                    Some(list)
                }
            })
            .map(|ident| self.ident(ident));
        let subject = self.expr(self.required(node, "value")?)?;
        let mut clauses = Vec::new();
        for clause in unfielded(node) {
            let types = by_field(clause, "type")
                .into_iter()
                .map(|ty| self.ty(ty))
                .collect::<Result<Vec<_>>>()?;
            clauses.push(TypeCaseClause {
                types,
                body: self.stmts(clause)?,
                pos: self.pos(clause),
            });
        }
        Ok(Stmt::TypeSwitch(TypeSwitchStmt {
            init,
            binding,
            subject,
            clauses,
        }))
    }

    fn first_expr(&mut self, node: Node<'_>) -> Result<Expr> {
        let inner = named(node)
            .into_iter()
            .next()
            .ok_or_else(|| self.error(node, format!("empty {}", node.kind())))?;
        self.expr(inner)
    }

    fn expr_list(&mut self, node: Node<'_>) -> Result<Vec<Expr>> {
        if node.kind() != "expression_list" {
            return Ok(vec![self.expr(node)?]);
        }
        named(node).into_iter().map(|e| self.expr(e)).collect()
    }

    /// Lowers an expression node.
    fn expr(&mut self, node: Node<'_>) -> Result<Expr> {
        let kind = match node.kind() {
            "identifier" | "blank_identifier" | "field_identifier" | "package_identifier" | "nil"
            | "true" | "false" | "iota" => ExprKind::Ident(self.ident(node)),
            "int_literal" => self.lit(node, LitKind::Int),
            "float_literal" => self.lit(node, LitKind::Float),
            "imaginary_literal" => self.lit(node, LitKind::Imag),
            "rune_literal" => self.lit(node, LitKind::Char),
            "raw_string_literal" | "interpreted_string_literal" => self.lit(node, LitKind::String),
            "parenthesized_expression" => ExprKind::Paren(Box::new(self.first_expr(node)?)),
            "selector_expression" => ExprKind::Selector(SelectorExpr {
                x: Box::new(self.expr(self.required(node, "operand")?)?),
                sel: self.ident(self.required(node, "field")?),
            }),
            "index_expression" => ExprKind::Index(IndexExpr {
                x: Box::new(self.expr(self.required(node, "operand")?)?),
                indices: vec![self.expr(self.required(node, "index")?)?],
            }),
            "type_instantiation_expression" => {
                let base = self.required(node, "type")?;
                let x = self.type_as_expr(base)?;
                let indices = named(node)
                    .into_iter()
                    .filter(|n| n.id() != base.id())
                    .map(|n| self.type_as_expr(n))
                    .collect::<Result<Vec<_>>>()?;
                ExprKind::Index(IndexExpr {
                    x: Box::new(x),
                    indices,
                })
            }
            "slice_expression" => ExprKind::Slice(SliceExpr {
                x: Box::new(self.expr(self.required(node, "operand")?)?),
                low: self.opt_expr(node, "start")?,
                high: self.opt_expr(node, "end")?,
                max: self.opt_expr(node, "capacity")?,
            }),
            "type_assertion_expression" => ExprKind::TypeAssert(TypeAssertExpr {
                x: Box::new(self.expr(self.required(node, "operand")?)?),
                ty: Some(self.ty(self.required(node, "type")?)?),
            }),
            "type_conversion_expression" => ExprKind::Call(CallExpr {
                fun: Box::new(self.type_as_expr(self.required(node, "type")?)?),
                type_args: vec![],
                args: vec![self.expr(self.required(node, "operand")?)?],
                ellipsis: false,
            }),
            "call_expression" => ExprKind::Call(self.call(node)?),
            "composite_literal" => ExprKind::CompositeLit(CompositeLit {
                ty: Some(self.ty(self.required(node, "type")?)?),
                elts: self.elements(self.required(node, "body")?)?,
            }),
            "literal_value" => ExprKind::CompositeLit(CompositeLit {
                ty: None,
                elts: self.elements(node)?,
            }),
            "func_literal" => {
                let sig = self.signature(node)?;
                let body = if self.skip_bodies {
                    Block::default()
                } else {
                    self.block(self.required(node, "body")?)?
                };
                ExprKind::FuncLit(FuncLit { sig, body })
            }
            "unary_expression" => {
                let operator = self.required(node, "operator")?;
                let x = Box::new(self.expr(self.required(node, "operand")?)?);
                let op = match operator.kind() {
                    "*" => return Ok(self.expr_node(node, ExprKind::Star(x))),
                    "+" => UnaryOp::Plus,
                    "-" => UnaryOp::Neg,
                    "!" => UnaryOp::Not,
                    "^" => UnaryOp::Xor,
                    "&" => UnaryOp::Addr,
                    "<-" => UnaryOp::Recv,
                    _ => return Err(self.unexpected(operator, "unary expression")),
                };
                ExprKind::Unary(UnaryExpr { op, x })
            }
            "binary_expression" => {
                let operator = self.required(node, "operator")?;
                let op = match operator.kind() {
                    "+" => BinaryOp::Add,
                    "-" | "*" | "/" | "%" | "&" | "|" | "^" | "&^" => BinaryOp::Arith,
                    "<<" | ">>" => BinaryOp::Shift,
                    "==" | "!=" | "<" | "<=" | ">" | ">=" => BinaryOp::Compare,
                    "&&" | "||" => BinaryOp::Logical,
                    _ => return Err(self.unexpected(operator, "binary expression")),
                };
                ExprKind::Binary(BinaryExpr {
                    op,
                    x: Box::new(self.expr(self.required(node, "left")?)?),
                    y: Box::new(self.expr(self.required(node, "right")?)?),
                })
            }
            kind if TYPE_KINDS.contains(&kind) => return self.type_as_expr(node),
            _ => return Err(self.unexpected(node, "expression")),
        };
        Ok(self.expr_node(node, kind))
    }

    fn opt_expr(&mut self, node: Node<'_>, field: &str) -> Result<Option<Box<Expr>>> {
        match node.child_by_field_name(field) {
            Some(child) => Ok(Some(Box::new(self.expr(child)?))),
            None => Ok(None),
        }
    }

    fn lit(&self, node: Node<'_>, kind: LitKind) -> ExprKind {
        ExprKind::BasicLit(BasicLit {
            kind,
            value: self.text(node).to_string(),
        })
    }

    /// A type in expression position. Plain and qualified names become
    /// identifiers and selectors so the checker resolves them like any
    /// other operand.
    fn type_as_expr(&mut self, node: Node<'_>) -> Result<Expr> {
        let kind = match node.kind() {
            "type_identifier" | "identifier" => ExprKind::Ident(self.ident(node)),
            "qualified_type" => {
                let pkg = self.required(node, "package")?;
                let pkg_ident = self.ident(pkg);
                let x = self.expr_node(pkg, ExprKind::Ident(pkg_ident));
                ExprKind::Selector(SelectorExpr {
                    x: Box::new(x),
                    sel: self.ident(self.required(node, "name")?),
                })
            }
            "generic_type" => {
                let x = self.type_as_expr(self.required(node, "type")?)?;
                let indices = match node.child_by_field_name("type_arguments") {
                    Some(list) => named(list)
                        .into_iter()
                        .map(|arg| -> Result<Expr> {
                            let ty = self.constraint(arg)?;
                            Ok(self.expr_node(arg, ExprKind::Type(ty)))
                        })
                        .collect::<Result<Vec<_>>>()?,
                    None => vec![],
                };
                ExprKind::Index(IndexExpr {
                    x: Box::new(x),
                    indices,
                })
            }
            "parenthesized_type" => {
                let inner = named(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.error(node, "empty parenthesized type"))?;
                ExprKind::Paren(Box::new(self.type_as_expr(inner)?))
            }
            kind if TYPE_KINDS.contains(&kind) || kind == "type_elem" => {
                ExprKind::Type(self.constraint(node)?)
            }
            _ => return self.expr(node),
        };
        Ok(self.expr_node(node, kind))
    }

    fn call(&mut self, node: Node<'_>) -> Result<CallExpr> {
        let fun = self.expr(self.required(node, "function")?)?;
        let type_args = match node.child_by_field_name("type_arguments") {
            Some(list) => named(list)
                .into_iter()
                .map(|arg| self.constraint(arg))
                .collect::<Result<Vec<_>>>()?,
            None => vec![],
        };
        let mut args = Vec::new();
        let mut ellipsis = false;
        for arg in named(self.required(node, "arguments")?) {
            if arg.kind() == "variadic_argument" {
                ellipsis = true;
                args.push(self.first_expr(arg)?);
            } else {
                args.push(self.expr(arg)?);
            }
        }
        Ok(CallExpr {
            fun: Box::new(fun),
            type_args,
            args,
            ellipsis,
        })
    }

    fn elements(&mut self, node: Node<'_>) -> Result<Vec<Element>> {
        let mut elts = Vec::new();
        for child in named(node) {
            if child.kind() == "keyed_element" {
                let parts = named(child);
                let [key, value] = parts.as_slice() else {
                    return Err(self.unexpected(child, "composite literal"));
                };
                elts.push(Element {
                    key: Some(self.element(*key)?),
                    value: self.element(*value)?,
                });
            } else {
                elts.push(Element {
                    key: None,
                    value: self.element(child)?,
                });
            }
        }
        Ok(elts)
    }

    fn element(&mut self, node: Node<'_>) -> Result<Expr> {
        if node.kind() == "literal_element" {
            return self.first_expr(node);
        }
        self.expr(node)
    }
}

/// Named children other than comments.
fn named(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// Children stored under `field`.
fn by_field<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Named, non-comment children that are not stored under a field.
fn unfielded(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && child.kind() != "comment" && cursor.field_name().is_none() {
                out.push(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn chan_dir(node: Node<'_>) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| c.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        [_, "<-", ..] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

fn unquote(literal: &str) -> String {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(literal)
        .to_string()
}
