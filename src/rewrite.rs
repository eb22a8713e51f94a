//! Operator rewriting: dotted operators become method calls
//!
//! The classifier neutralized dialect glyphs without recording where they
//! were; its buffer is length-preserving precisely so this pass can find
//! them again. For every binary operator and compound assignment the
//! rewriter compares the *original* bytes around the operator's span with
//! the classified ones:
//!
//! - `+`/`-` whose preceding original byte is a `.` the classifier blanked
//!   was a dotted operator; the expression becomes `x.P_(y)` / `x.M_(y)`;
//! - `*` whose original bytes read `*.` with the `.` blanked was a scalar
//!   multiply; the expression becomes `y._mul_dot(x)`, with the *right*
//!   operand as the receiver;
//! - `+=` after a blanked `.` becomes the statement `x.PE_(y)`;
//! - a method declared with the stand-in name spliced over `*.` is renamed
//!   to `_mul_dot`.
//!
//! Requiring the classifier's blank is what keeps the oracle honest: the
//! `.` of a trailing-dot float literal (`2.+x`) also sits right before an
//! operator, but it survives classification and so is never mistaken for
//! a dialect glyph.

use crate::ast::*;
use crate::classify::method;
use crate::fold::{self, Folder};
use crate::span::Span;

/// Rewrite every dialect operator in `file` into a method call. `source`
/// is the original text; `classified` is the neutralized buffer the file
/// was parsed from.
pub fn rewrite(file: SourceFile, source: &str, classified: &str) -> SourceFile {
    OperatorRewriter {
        src: source.as_bytes(),
        buf: classified.as_bytes(),
    }
    .fold_file(file)
}

struct OperatorRewriter<'src> {
    src: &'src [u8],
    buf: &'src [u8],
}

impl OperatorRewriter<'_> {
    /// A `.` immediately before this operator that the classifier blanked.
    fn dotted(&self, op_span: Span) -> bool {
        op_span.start > 0
            && self.src.get(op_span.start - 1) == Some(&b'.')
            && self.buf.get(op_span.start - 1) == Some(&b' ')
    }

    /// Original bytes read `*.` here and the classifier blanked the dot.
    fn star_dot(&self, op_span: Span) -> bool {
        self.src.get(op_span.start) == Some(&b'*')
            && self.src.get(op_span.start + 1) == Some(&b'.')
            && self.buf.get(op_span.start + 1) == Some(&b' ')
    }

    fn method_call(&self, recv: Expr, name: &str, name_span: Span, arg: Expr, span: Span) -> Expr {
        let fun = Expr {
            span: Span::new(recv.span.start, name_span.end),
            kind: ExprKind::Selector {
                x: Box::new(recv),
                sel: Ident::new(name, name_span),
            },
        };
        Expr {
            kind: ExprKind::Call {
                fun: Box::new(fun),
                args: vec![arg],
                spread: false,
            },
            span,
        }
    }
}

impl Folder for OperatorRewriter<'_> {
    fn fold_expr(&mut self, expr: Expr) -> Expr {
        let expr = fold::walk_expr(self, expr);
        let span = expr.span;
        match expr.kind {
            ExprKind::Binary {
                op: op @ (BinOp::Add | BinOp::Sub),
                op_span,
                x,
                y,
            } if self.dotted(op_span) => {
                let name = if op == BinOp::Add {
                    method::ADD
                } else {
                    method::SUB
                };
                self.method_call(*x, name, op_span, *y, span)
            }
            ExprKind::Binary {
                op: BinOp::Mul,
                op_span,
                x,
                y,
            } if self.star_dot(op_span) => {
                // Scalar multiply: the conventional receiver is the right
                // operand, so `2 *. x` calls `x._mul_dot(2)`.
                self.method_call(*y, method::SCALAR_MUL, op_span, *x, span)
            }
            kind => Expr { kind, span },
        }
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Stmt {
        let stmt = fold::walk_stmt(self, stmt);
        match stmt {
            Stmt::Assign(a)
                if a.op == AssignOp::Add
                    && self.dotted(a.op_span)
                    && a.lhs.len() == 1
                    && a.rhs.len() == 1 =>
            {
                let mut a = a;
                let rhs = a.rhs.remove(0);
                let lhs = a.lhs.remove(0);
                Stmt::Expr(self.method_call(
                    lhs,
                    method::ADD_ASSIGN,
                    a.op_span,
                    rhs,
                    a.span,
                ))
            }
            other => other,
        }
    }

    fn fold_decl(&mut self, decl: Decl) -> Decl {
        let decl = fold::walk_decl(self, decl);
        match decl {
            Decl::Func(mut d)
                if d.recv.is_some()
                    && d.name.name == method::SCALAR_MUL_STUB
                    && d.name.span.text_bytes(self.src) == b"*." =>
            {
                d.name.name = method::SCALAR_MUL.to_string();
                Decl::Func(d)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify, parser};

    fn pipeline(source: &str) -> SourceFile {
        let buf = classify::classify(source);
        let classified = String::from_utf8(buf).unwrap();
        let (file, errors) = parser::parse_file(&classified, false);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        rewrite(file, source, &classified)
    }

    fn first_func_body(file: &SourceFile) -> &Block {
        for decl in &file.decls {
            if let Decl::Func(f) = decl {
                return &f.body;
            }
        }
        panic!("no function in file");
    }

    fn call_parts(expr: &Expr) -> (&Expr, &str, &[Expr]) {
        let ExprKind::Call { fun, args, .. } = &expr.kind else {
            panic!("expected call, got {:?}", expr.kind);
        };
        let ExprKind::Selector { x, sel } = &fun.kind else {
            panic!("expected selector callee, got {:?}", fun.kind);
        };
        (x, &sel.name, args)
    }

    #[test]
    fn test_dotted_add_becomes_method_call() {
        let file = pipeline("package main\n\nfunc f(a, b Vec) Vec {\n\treturn a .+ b\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        let (recv, name, args) = call_parts(&results[0]);
        assert!(matches!(&recv.kind, ExprKind::Ident(id) if id.name == "a"));
        assert_eq!(name, "P_");
        assert!(matches!(&args[0].kind, ExprKind::Ident(id) if id.name == "b"));
    }

    #[test]
    fn test_dotted_sub_becomes_method_call() {
        let file = pipeline("package main\n\nfunc f(a, b Vec) Vec {\n\treturn a .- b\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        let (_, name, _) = call_parts(&results[0]);
        assert_eq!(name, "M_");
    }

    #[test]
    fn test_scalar_mul_swaps_operands() {
        let file = pipeline("package main\n\nfunc f(x Vec) Vec {\n\treturn 2 *. x\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        let (recv, name, args) = call_parts(&results[0]);
        assert!(matches!(&recv.kind, ExprKind::Ident(id) if id.name == "x"));
        assert_eq!(name, "_mul_dot");
        assert!(matches!(&args[0].kind, ExprKind::Lit { text, .. } if text == "2"));
    }

    #[test]
    fn test_dotted_add_assign_becomes_call_statement() {
        let file = pipeline("package main\n\nfunc f(x, y Vec) {\n\tx .+= y\n}\n");
        let Stmt::Expr(e) = &first_func_body(&file).stmts[0] else {
            panic!("expected expression statement");
        };
        let (recv, name, args) = call_parts(e);
        assert!(matches!(&recv.kind, ExprKind::Ident(id) if id.name == "x"));
        assert_eq!(name, "PE_");
        assert!(matches!(&args[0].kind, ExprKind::Ident(id) if id.name == "y"));
    }

    #[test]
    fn test_plain_operators_untouched() {
        let file = pipeline("package main\n\nfunc f(a, b int) int {\n\treturn a + b*2\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        assert!(matches!(
            results[0].kind,
            ExprKind::Binary { op: BinOp::Add, .. }
        ));
    }

    #[test]
    fn test_trailing_dot_float_before_plus_untouched() {
        // `2.+x` is plain Go: a float literal `2.` added to `x`. The dot
        // belongs to the literal and survives classification, so the
        // oracle must not treat the addition as a dotted operator.
        let file = pipeline("package main\n\nfunc f(x float64) float64 {\n\treturn 2.+x\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        let ExprKind::Binary { op: BinOp::Add, x, .. } = &results[0].kind else {
            panic!("expected plain addition, got {:?}", results[0].kind);
        };
        assert!(matches!(&x.kind, ExprKind::Lit { text, .. } if text == "2."));
    }

    #[test]
    fn test_trailing_dot_float_before_minus_untouched() {
        let file = pipeline("package main\n\nfunc f(x float64) float64 {\n\treturn 2.-x\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        assert!(matches!(
            results[0].kind,
            ExprKind::Binary { op: BinOp::Sub, .. }
        ));
    }

    #[test]
    fn test_trailing_dot_float_before_mul_untouched() {
        let file = pipeline("package main\n\nfunc f(x float64) float64 {\n\treturn 2.*x\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        assert!(matches!(
            results[0].kind,
            ExprKind::Binary { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn test_plain_add_assign_untouched() {
        let file = pipeline("package main\n\nfunc f(a int) {\n\ta += 1\n}\n");
        let Stmt::Assign(assign) = &first_func_body(&file).stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(assign.op, AssignOp::Add);
    }

    #[test]
    fn test_scalar_mul_declaration_renamed() {
        let file = pipeline(
            "package main\n\nfunc (a Vec) *. (b float64) Vec {\n\treturn a\n}\n",
        );
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.name.name, "_mul_dot");
    }

    #[test]
    fn test_dotted_declarations_keep_spliced_names() {
        let file = pipeline(
            "package main\n\nfunc (a Vec) .+ (b Vec) Vec {\n\treturn a\n}\n\nfunc (a Vec) .+= (b Vec) {\n}\n",
        );
        let names: Vec<_> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Func(f) => Some(f.name.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["P_", "PE_"]);
    }

    #[test]
    fn test_ordinary_function_named_like_stub_untouched() {
        // A user function genuinely called S_ must not be renamed; the
        // oracle sees ordinary bytes at its name.
        let file = pipeline("package main\n\nfunc (a Vec) S_(b Vec) Vec {\n\treturn a\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.name.name, "S_");
    }

    #[test]
    fn test_chained_dotted_operators_left_associative() {
        let file = pipeline("package main\n\nfunc f(a, b, c Vec) Vec {\n\treturn a .+ b .- c\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        // (a.P_(b)).M_(c)
        let (inner, outer_name, _) = call_parts(&results[0]);
        assert_eq!(outer_name, "M_");
        let (_, inner_name, _) = call_parts(inner);
        assert_eq!(inner_name, "P_");
    }

    #[test]
    fn test_dotted_mixed_with_plain_in_one_expression() {
        let file = pipeline("package main\n\nfunc f(a, b Vec, c int) int {\n\treturn (a .+ b)[0] + c\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        let ExprKind::Binary { op: BinOp::Add, x, .. } = &results[0].kind else {
            panic!("expected plain addition at the top");
        };
        let ExprKind::Index { x: indexed, .. } = &x.kind else {
            panic!("expected index");
        };
        let ExprKind::Paren(inner) = &indexed.kind else {
            panic!("expected parens");
        };
        let (_, name, _) = call_parts(inner);
        assert_eq!(name, "P_");
    }

    #[test]
    fn test_scalar_mul_with_expression_operand() {
        let file = pipeline("package main\n\nfunc f(x Vec, k float64) Vec {\n\treturn (k + 1) *. x\n}\n");
        let Stmt::Return { results, .. } = &first_func_body(&file).stmts[0] else {
            panic!("expected return");
        };
        let (recv, name, args) = call_parts(&results[0]);
        assert_eq!(name, "_mul_dot");
        assert!(matches!(&recv.kind, ExprKind::Ident(id) if id.name == "x"));
        assert!(matches!(args[0].kind, ExprKind::Paren(_)));
    }
}
