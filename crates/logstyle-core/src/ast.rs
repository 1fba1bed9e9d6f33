//! Syntax tree for Go source files.
//!
//! Produced by a typed-AST source (see [`crate::source`]) and consumed by the
//! dispatcher and rules. Every expression, type expression and identifier
//! carries a [`NodeId`] unique within one loaded program; the symbol table
//! is keyed by these ids.

use crate::fileset::Pos;

/// Identity of a syntax node, unique across all files of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    /// Node identity.
    pub id: NodeId,
    /// Identifier text.
    pub name: String,
    /// Start position.
    pub pos: Pos,
}

impl Ident {
    /// Returns true for the blank identifier `_`.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Returns true if the name starts with an upper-case letter.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// Returns true if `name` would be exported from its package.
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// File name as registered in the file set.
    pub name: String,
    /// Package clause name.
    pub package: Ident,
    /// Import declarations, in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations other than imports, in source order.
    pub decls: Vec<Decl>,
}

/// `import name "path"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit local name (`.`, `_`, or an identifier).
    pub name: Option<Ident>,
    /// Unquoted import path.
    pub path: String,
    /// Position of the path literal.
    pub pos: Pos,
}

/// Top-level or statement-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// `func` declaration (with or without receiver).
    Func(FuncDecl),
    /// `const`, `var` or `type` declaration.
    Gen(GenDecl),
}

/// Function or method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Receiver parameter, for methods.
    pub recv: Option<Field>,
    /// Function name.
    pub name: Ident,
    /// Type parameters.
    pub type_params: Vec<Field>,
    /// Signature.
    pub sig: FuncType,
    /// Body, absent for external (assembly) functions.
    pub body: Option<Block>,
}

/// Kind of a [`GenDecl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
    /// `const`
    Const,
    /// `var`
    Var,
    /// `type`
    Type,
}

/// `const`, `var` or `type` declaration group.
#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
    /// Declaration keyword.
    pub kind: GenKind,
    /// Specs in source order.
    pub specs: Vec<Spec>,
}

/// One spec of a [`GenDecl`].
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    /// `names [type] [= values]`
    Value(ValueSpec),
    /// `name [params] [=] type`
    Type(TypeSpec),
}

/// Constant or variable spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    /// Declared names.
    pub names: Vec<Ident>,
    /// Declared type.
    pub ty: Option<TypeExpr>,
    /// Initializer expressions.
    pub values: Vec<Expr>,
    /// Index within the enclosing `const` group (the value of `iota`).
    pub iota: u32,
}

/// Type spec.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    /// Declared name.
    pub name: Ident,
    /// Type parameters.
    pub type_params: Vec<Field>,
    /// `type A = B`
    pub alias: bool,
    /// Defining type.
    pub ty: TypeExpr,
}

/// Parameter, result, struct field or type parameter group.
///
/// An empty `names` list means an unnamed parameter or an embedded field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Names sharing `ty`.
    pub names: Vec<Ident>,
    /// Field type.
    pub ty: TypeExpr,
    /// `...T` parameter.
    pub variadic: bool,
}

/// Function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    /// Parameters.
    pub params: Vec<Field>,
    /// Results.
    pub results: Vec<Field>,
}

impl FuncType {
    /// Returns true if the last parameter is variadic.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|f| f.variadic)
    }
}

/// `{ stmts }`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Statements in source order.
    pub stmts: Vec<Stmt>,
}

/// Statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression statement.
    Expr(Expr),
    /// Declaration statement.
    Decl(GenDecl),
    /// `=`, `op=` or `:=`.
    Assign(AssignStmt),
    /// `x++` / `x--`
    IncDec(Expr),
    /// `ch <- v`
    Send {
        /// Channel.
        chan: Expr,
        /// Sent value.
        value: Expr,
    },
    /// `go f()`
    Go(Expr),
    /// `defer f()`
    Defer(Expr),
    /// `return results`
    Return(Vec<Expr>),
    /// Nested block.
    Block(Block),
    /// `if`
    If(IfStmt),
    /// Three-clause or condition-only `for`.
    For(ForStmt),
    /// `for k, v := range x`
    Range(RangeStmt),
    /// Expression switch.
    Switch(SwitchStmt),
    /// Type switch.
    TypeSwitch(TypeSwitchStmt),
    /// `select`
    Select(SelectStmt),
    /// `label: stmt`
    Labeled {
        /// Label.
        label: Ident,
        /// Labeled statement.
        stmt: Box<Stmt>,
    },
    /// `break`, `continue`, `goto`, `fallthrough`.
    Branch,
    /// `;`
    Empty,
}

/// Assignment or short variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    /// Left-hand side.
    pub lhs: Vec<Expr>,
    /// Right-hand side.
    pub rhs: Vec<Expr>,
    /// `:=`
    pub define: bool,
}

/// `if init; cond { then } else els`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// Condition.
    pub cond: Expr,
    /// Then branch.
    pub then: Block,
    /// Else branch: a block or another `if`.
    pub els: Option<Box<Stmt>>,
}

/// `for init; cond; post { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// Condition.
    pub cond: Option<Expr>,
    /// Post statement.
    pub post: Option<Box<Stmt>>,
    /// Body.
    pub body: Block,
}

/// `for key, value := range expr { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    /// Key operand.
    pub key: Option<Expr>,
    /// Value operand.
    pub value: Option<Expr>,
    /// `:=` rather than `=`.
    pub define: bool,
    /// Ranged expression.
    pub expr: Expr,
    /// Body.
    pub body: Block,
}

/// `switch init; tag { clauses }`
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// Tag expression.
    pub tag: Option<Expr>,
    /// Case clauses; `default` has no expressions.
    pub clauses: Vec<CaseClause>,
}

/// `case exprs: body`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    /// Case expressions; empty for `default`.
    pub exprs: Vec<Expr>,
    /// Clause body.
    pub body: Vec<Stmt>,
}

/// `switch init; x := subject.(type) { clauses }`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSwitchStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// Symbolic variable bound in every clause.
    pub binding: Option<Ident>,
    /// Expression whose dynamic type is switched on.
    pub subject: Expr,
    /// Type clauses; `default` has no types.
    pub clauses: Vec<TypeCaseClause>,
}

/// `case types: body`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCaseClause {
    /// Listed types; empty for `default`.
    pub types: Vec<TypeExpr>,
    /// Clause body.
    pub body: Vec<Stmt>,
    /// Start of the clause, used to declare its implicit binding.
    pub pos: Pos,
}

/// `select { clauses }`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    /// Communication clauses.
    pub clauses: Vec<CommClause>,
}

/// `case comm: body`
#[derive(Debug, Clone, PartialEq)]
pub struct CommClause {
    /// Send or receive statement; `None` for `default`.
    pub comm: Option<Box<Stmt>>,
    /// Clause body.
    pub body: Vec<Stmt>,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Node identity.
    pub id: NodeId,
    /// Start position.
    pub pos: Pos,
    /// End position (exclusive).
    pub end: Pos,
    /// Shape.
    pub kind: ExprKind,
}

/// Expression shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Identifier.
    Ident(Ident),
    /// Literal token.
    BasicLit(BasicLit),
    /// `T{elts}` or elided `{elts}`.
    CompositeLit(CompositeLit),
    /// `func(...) { ... }`
    FuncLit(FuncLit),
    /// `(x)`
    Paren(Box<Expr>),
    /// `x.sel`
    Selector(SelectorExpr),
    /// `x[i]` or generic instantiation `f[T1, T2]`.
    Index(IndexExpr),
    /// `x[lo:hi:max]`
    Slice(SliceExpr),
    /// `x.(T)`; `ty` is `None` for `x.(type)`.
    TypeAssert(TypeAssertExpr),
    /// Call or conversion.
    Call(CallExpr),
    /// `*x`
    Star(Box<Expr>),
    /// Unary operator other than `*`.
    Unary(UnaryExpr),
    /// Binary operator.
    Binary(BinaryExpr),
    /// A type used in expression position (conversions, `make`, `new`).
    Type(TypeExpr),
}

/// Literal token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    /// Integer.
    Int,
    /// Floating point.
    Float,
    /// Imaginary.
    Imag,
    /// Rune.
    Char,
    /// Interpreted or raw string.
    String,
}

/// Literal token.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    /// Kind.
    pub kind: LitKind,
    /// Source text, including quotes.
    pub value: String,
}

/// Composite literal.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    /// Literal type; `None` when elided inside an outer literal.
    pub ty: Option<TypeExpr>,
    /// Elements.
    pub elts: Vec<Element>,
}

/// Composite literal element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Key, field name or index.
    pub key: Option<Expr>,
    /// Value.
    pub value: Expr,
}

/// Function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    /// Signature.
    pub sig: FuncType,
    /// Body.
    pub body: Block,
}

/// `x.sel`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorExpr {
    /// Operand.
    pub x: Box<Expr>,
    /// Selected name.
    pub sel: Ident,
}

/// `x[indices]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    /// Operand.
    pub x: Box<Expr>,
    /// One index, or several type arguments.
    pub indices: Vec<Expr>,
}

/// `x[low:high:max]`
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    /// Operand.
    pub x: Box<Expr>,
    /// Lower bound.
    pub low: Option<Box<Expr>>,
    /// Upper bound.
    pub high: Option<Box<Expr>>,
    /// Capacity bound.
    pub max: Option<Box<Expr>>,
}

/// `x.(T)`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAssertExpr {
    /// Operand.
    pub x: Box<Expr>,
    /// Asserted type.
    pub ty: Option<TypeExpr>,
}

/// Call site: `fun[type_args](args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    /// Callee.
    pub fun: Box<Expr>,
    /// Explicit type arguments.
    pub type_args: Vec<TypeExpr>,
    /// Arguments in order.
    pub args: Vec<Expr>,
    /// Last argument spread with `...`.
    pub ellipsis: bool,
}

/// Unary operators other than dereference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `^x`
    Xor,
    /// `&x`
    Addr,
    /// `<-x`
    Recv,
}

/// Unary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    /// Operator.
    pub op: UnaryOp,
    /// Operand.
    pub x: Box<Expr>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`, `*`, `/`, `%`, `&`, `|`, `^`, `&^`
    Arith,
    /// `<<`, `>>`
    Shift,
    /// `==`, `!=`, `<`, `<=`, `>`, `>=`
    Compare,
    /// `&&`, `||`
    Logical,
}

/// Binary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    /// Operator class.
    pub op: BinaryOp,
    /// Left operand.
    pub x: Box<Expr>,
    /// Right operand.
    pub y: Box<Expr>,
}

/// Type expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    /// Node identity.
    pub id: NodeId,
    /// Start position.
    pub pos: Pos,
    /// Shape.
    pub kind: TypeExprKind,
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// Type expression shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// `T`
    Name(Ident),
    /// `pkg.T`
    Qualified {
        /// Package name.
        pkg: Ident,
        /// Type name.
        name: Ident,
    },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T` or `[...]T` (`len` is `None`).
    Array {
        /// Length expression.
        len: Option<Box<Expr>>,
        /// Element type.
        elem: Box<TypeExpr>,
    },
    /// `map[K]V`
    Map {
        /// Key type.
        key: Box<TypeExpr>,
        /// Value type.
        value: Box<TypeExpr>,
    },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan {
        /// Direction.
        dir: ChanDir,
        /// Element type.
        elem: Box<TypeExpr>,
    },
    /// `func(...) ...`
    Func(FuncType),
    /// `struct { fields }`
    Struct(Vec<Field>),
    /// `interface { elems }`
    Interface(Vec<InterfaceElem>),
    /// `T[args]`
    Generic {
        /// Generic type.
        base: Box<TypeExpr>,
        /// Type arguments.
        args: Vec<TypeExpr>,
    },
    /// `~T` in a constraint.
    Approx(Box<TypeExpr>),
}

/// Interface element.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    /// `Name(params) results`
    Method {
        /// Method name.
        name: Ident,
        /// Signature.
        sig: FuncType,
    },
    /// Embedded interface, or a union of terms in a constraint.
    Embedded(Vec<TypeExpr>),
}

impl Expr {
    /// Strips any number of enclosing parentheses.
    #[must_use]
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// Returns the identifier if this is a bare name.
    #[must_use]
    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}

impl CallExpr {
    /// Returns the identifier naming the callee: the name itself for `f(...)`,
    /// the selected name for `x.f(...)`, and `None` for any other callee shape.
    #[must_use]
    pub fn callee_ident(&self) -> Option<&Ident> {
        match &self.fun.kind {
            ExprKind::Ident(ident) => Some(ident),
            ExprKind::Selector(sel) => Some(&sel.sel),
            _ => None,
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

    fn expr(id: u32, kind: ExprKind) -> Expr {
        Expr {
            id: NodeId(id),
            pos: Pos::NONE,
            end: Pos::NONE,
            kind,
        }
    }

    #[test]
    fn callee_ident_for_plain_and_selector() {
        let plain = CallExpr {
            fun: Box::new(expr(1, ExprKind::Ident(ident(2, "f")))),
            type_args: vec![],
            args: vec![],
            ellipsis: false,
        };
        assert_eq!(plain.callee_ident().map(|i| i.name.as_str()), Some("f"));

        let selector = CallExpr {
            fun: Box::new(expr(
                3,
                ExprKind::Selector(SelectorExpr {
                    x: Box::new(expr(4, ExprKind::Ident(ident(5, "logger")))),
                    sel: ident(6, "Info"),
                }),
            )),
            type_args: vec![],
            args: vec![],
            ellipsis: false,
        };
        assert_eq!(
            selector.callee_ident().map(|i| i.name.as_str()),
            Some("Info")
        );
    }

    #[test]
    fn callee_ident_rejects_other_shapes() {
        let inner = CallExpr {
            fun: Box::new(expr(1, ExprKind::Ident(ident(2, "factory")))),
            type_args: vec![],
            args: vec![],
            ellipsis: false,
        };
        let outer = CallExpr {
            fun: Box::new(expr(3, ExprKind::Call(inner))),
            type_args: vec![],
            args: vec![],
            ellipsis: false,
        };
        assert!(outer.callee_ident().is_none());

        let paren = CallExpr {
            fun: Box::new(expr(
                4,
                ExprKind::Paren(Box::new(expr(5, ExprKind::Ident(ident(6, "f"))))),
            )),
            type_args: vec![],
            args: vec![],
            ellipsis: false,
        };
        assert!(paren.callee_ident().is_none());
    }

    #[test]
    fn exported_names() {
        assert!(is_exported("Logger"));
        assert!(!is_exported("logger"));
        assert!(!is_exported("_"));
        assert!(!is_exported(""));
    }
}
