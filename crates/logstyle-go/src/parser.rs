//! Tree-sitter parsing of Go files into the core syntax tree.

use logstyle_core::ast::File;
use logstyle_core::{FileSet, LoadError, Position};
use tree_sitter::{Language, Node, Parser};

use crate::lower::{Lowerer, NodeIds};

/// A reusable tree-sitter parser for Go.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Creates a parser.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled grammar is incompatible with the
    /// tree-sitter runtime.
    pub fn new() -> Result<Self, LoadError> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| LoadError::Parse {
                position: Position::default(),
                message: format!("loading the Go grammar: {e}"),
            })?;
        Ok(Self { parser })
    }

    /// Registers `content` in `fset` under `name`, parses it and lowers it.
    ///
    /// With `skip_bodies`, function bodies are not lowered.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] at the first syntax error.
    pub fn parse_file(
        &mut self,
        fset: &mut FileSet,
        ids: &mut NodeIds,
        name: &str,
        content: String,
        skip_bodies: bool,
    ) -> Result<File, LoadError> {
        let file = fset.add_file(name, content);
        let parse_error = |offset: usize, message: String| LoadError::Parse {
            position: position_in(file.name(), file.content(), offset),
            message,
        };

        let tree = self
            .parser
            .parse(file.content(), None)
            .ok_or_else(|| parse_error(0, "parsing was cancelled".into()))?;
        let root = tree.root_node();
        if let Some(node) = first_error(root) {
            return Err(parse_error(node.start_byte(), syntax_message(node, file.content())));
        }

        Lowerer::new(file, ids, skip_bodies)
            .lower_file(root)
            .map_err(|e| {
                let offset = (e.pos.0.saturating_sub(file.base())) as usize;
                parse_error(offset, e.message)
            })
    }
}

fn position_in(name: &str, content: &str, offset: usize) -> Position {
    let offset = offset.min(content.len());
    let before = &content[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Position {
        filename: name.to_string(),
        offset,
        line: before.matches('\n').count() + 1,
        column: offset - line_start + 1,
    }
}

/// The earliest `ERROR` or missing node, in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn syntax_message(node: Node<'_>, content: &str) -> String {
    if node.is_missing() {
        return format!("syntax error: missing {}", node.kind());
    }
    let text = content
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .split_whitespace()
        .next()
        .unwrap_or("");
    if text.is_empty() {
        "syntax error: unexpected EOF".to_string()
    } else {
        format!("syntax error: unexpected {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logstyle_core::ast::{Decl, ExprKind, GenKind, Spec, Stmt, TypeExprKind};

    fn parse(src: &str) -> Result<File, LoadError> {
        let mut parser = GoParser::new().expect("grammar");
        let mut fset = FileSet::new();
        let mut ids = NodeIds::default();
        parser.parse_file(&mut fset, &mut ids, "dir/main.go", src.to_string(), false)
    }

    fn body(file: &File, index: usize) -> &[Stmt] {
        match &file.decls[index] {
            Decl::Func(func) => &func.body.as_ref().expect("body").stmts,
            Decl::Gen(_) => panic!("not a function"),
        }
    }

    #[test]
    fn lowers_package_and_imports() {
        let file = parse(
            "package main\n\nimport (\n\t\"fmt\"\n\tz \"go.uber.org/zap\"\n\t_ \"embed\"\n)\n",
        )
        .expect("parse");
        assert_eq!(file.package.name, "main");
        let imports: Vec<_> = file
            .imports
            .iter()
            .map(|i| (i.name.as_ref().map(|n| n.name.as_str()), i.path.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                (None, "fmt"),
                (Some("z"), "go.uber.org/zap"),
                (Some("_"), "embed"),
            ]
        );
    }

    #[test]
    fn lowers_selector_call_with_position() {
        let src = "package main\n\nfunc main() {\n\tlogger.Info(\"hi\", x)\n}\n";
        let mut parser = GoParser::new().expect("grammar");
        let mut fset = FileSet::new();
        let mut ids = NodeIds::default();
        let file = parser
            .parse_file(&mut fset, &mut ids, "main.go", src.to_string(), false)
            .expect("parse");

        let Stmt::Expr(expr) = &body(&file, 0)[0] else {
            panic!("expression statement");
        };
        let ExprKind::Call(call) = &expr.kind else {
            panic!("call");
        };
        assert_eq!(call.callee_ident().map(|i| i.name.as_str()), Some("Info"));
        assert_eq!(call.args.len(), 2);
        assert!(matches!(call.args[0].kind, ExprKind::BasicLit(_)));
        assert_eq!(fset.position(expr.pos).to_string(), "main.go:4:2");
    }

    #[test]
    fn const_groups_carry_iota() {
        let file = parse("package p\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n").expect("parse");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("gen decl");
        };
        assert_eq!(decl.kind, GenKind::Const);
        let iotas: Vec<_> = decl
            .specs
            .iter()
            .map(|s| match s {
                Spec::Value(v) => (v.names[0].name.clone(), v.iota, v.values.len()),
                Spec::Type(_) => panic!("value spec"),
            })
            .collect();
        assert_eq!(
            iotas,
            vec![("A".into(), 0, 1), ("B".into(), 1, 0), ("C".into(), 2, 0)]
        );
    }

    #[test]
    fn lowers_types_and_methods() {
        let src = "package p\n\ntype Logger struct {\n\tname string\n\t*Core\n}\n\nfunc (l *Logger) Info(msg string, fields ...Field) {}\n";
        let file = parse(src).expect("parse");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("type decl");
        };
        let Spec::Type(spec) = &decl.specs[0] else {
            panic!("type spec");
        };
        let TypeExprKind::Struct(fields) = &spec.ty.kind else {
            panic!("struct");
        };
        assert_eq!(fields.len(), 2);
        assert!(fields[1].names.is_empty());
        assert!(matches!(fields[1].ty.kind, TypeExprKind::Pointer(_)));

        let Decl::Func(method) = &file.decls[1] else {
            panic!("method");
        };
        let recv = method.recv.as_ref().expect("receiver");
        assert_eq!(recv.names[0].name, "l");
        assert!(method.sig.is_variadic());
    }

    #[test]
    fn lowers_statements() {
        let src = "package p\n\nfunc f(m map[string]int) {\n\tfor k, v := range m {\n\t\t_ = k\n\t\t_ = v\n\t}\n\tswitch x := any(m).(type) {\n\tcase int:\n\tdefault:\n\t\t_ = x\n\t}\n\tif n := len(m); n > 0 {\n\t}\n}\n";
        let file = parse(src).expect("parse");
        let stmts = body(&file, 0);
        assert!(matches!(&stmts[0], Stmt::Range(r) if r.define && r.value.is_some()));
        assert!(
            matches!(&stmts[1], Stmt::TypeSwitch(s) if s.binding.is_some() && s.clauses.len() == 2)
        );
        assert!(matches!(&stmts[2], Stmt::If(i) if i.init.is_some()));
    }

    #[test]
    fn skipped_bodies() {
        let mut parser = GoParser::new().expect("grammar");
        let mut fset = FileSet::new();
        let mut ids = NodeIds::default();
        let file = parser
            .parse_file(
                &mut fset,
                &mut ids,
                "dep.go",
                "package dep\n\nfunc F() { panic(1) }\n".into(),
                true,
            )
            .expect("parse");
        assert!(matches!(&file.decls[0], Decl::Func(f) if f.body.is_none()));
    }

    #[test]
    fn syntax_errors_report_position() {
        let err = parse("package main\n\nfunc main() {\n\tx := \n}\n").expect_err("syntax error");
        let LoadError::Parse { position, message } = err else {
            panic!("parse error");
        };
        assert_eq!(position.filename, "dir/main.go");
        assert!(position.line >= 4, "{position}");
        assert!(message.starts_with("syntax error"), "{message}");
    }

    #[test]
    fn statements_outside_functions_are_rejected() {
        assert!(parse("package main\n\nx := 1\n").is_err());
    }

    #[test]
    fn missing_package_clause() {
        assert!(parse("func main() {}\n").is_err());
    }

    #[test]
    fn node_ids_are_unique_across_files() {
        let mut parser = GoParser::new().expect("grammar");
        let mut fset = FileSet::new();
        let mut ids = NodeIds::default();
        let a = parser
            .parse_file(&mut fset, &mut ids, "a.go", "package p\n".into(), false)
            .expect("parse");
        let b = parser
            .parse_file(&mut fset, &mut ids, "b.go", "package p\n".into(), false)
            .expect("parse");
        assert_ne!(a.package.id, b.package.id);
    }
}
