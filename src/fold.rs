//! Tree folding infrastructure shared by the rewrite passes
//!
//! A [`Folder`] consumes a node by value and returns its replacement. The
//! default methods call the matching `walk_*` function, which rebuilds the
//! node from its folded children; a pass overrides only the node kinds it
//! cares about. A node a pass substitutes wholesale is not re-descended;
//! walking the replacement is the override's own choice.

use crate::ast::*;

pub trait Folder {
    fn fold_file(&mut self, file: SourceFile) -> SourceFile {
        walk_file(self, file)
    }

    fn fold_decl(&mut self, decl: Decl) -> Decl {
        walk_decl(self, decl)
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Stmt {
        walk_stmt(self, stmt)
    }

    fn fold_block(&mut self, block: Block) -> Block {
        walk_block(self, block)
    }

    fn fold_expr(&mut self, expr: Expr) -> Expr {
        walk_expr(self, expr)
    }
}

pub fn walk_file<F: Folder + ?Sized>(f: &mut F, file: SourceFile) -> SourceFile {
    SourceFile {
        decls: file.decls.into_iter().map(|d| f.fold_decl(d)).collect(),
        ..file
    }
}

pub fn walk_decl<F: Folder + ?Sized>(f: &mut F, decl: Decl) -> Decl {
    match decl {
        Decl::Func(d) => Decl::Func(FuncDecl {
            body: f.fold_block(d.body),
            ..d
        }),
        Decl::Const(d) => Decl::Const(walk_value_decl(f, d)),
        Decl::Var(d) => Decl::Var(walk_value_decl(f, d)),
        other @ (Decl::Import(_) | Decl::Type(_)) => other,
    }
}

fn walk_value_decl<F: Folder + ?Sized>(f: &mut F, decl: ValueDecl) -> ValueDecl {
    ValueDecl {
        values: decl.values.into_iter().map(|e| f.fold_expr(e)).collect(),
        ..decl
    }
}

pub fn walk_block<F: Folder + ?Sized>(f: &mut F, block: Block) -> Block {
    Block {
        stmts: block.stmts.into_iter().map(|s| f.fold_stmt(s)).collect(),
        ..block
    }
}

pub fn walk_stmt<F: Folder + ?Sized>(f: &mut F, stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(e) => Stmt::Expr(f.fold_expr(e)),
        Stmt::Assign(a) => Stmt::Assign(AssignStmt {
            lhs: a.lhs.into_iter().map(|e| f.fold_expr(e)).collect(),
            rhs: a.rhs.into_iter().map(|e| f.fold_expr(e)).collect(),
            ..a
        }),
        Stmt::IncDec { target, inc, span } => Stmt::IncDec {
            target: f.fold_expr(target),
            inc,
            span,
        },
        Stmt::Return { results, span } => Stmt::Return {
            results: results.into_iter().map(|e| f.fold_expr(e)).collect(),
            span,
        },
        Stmt::If(s) => Stmt::If(IfStmt {
            init: s.init.map(|s| Box::new(f.fold_stmt(*s))),
            cond: f.fold_expr(s.cond),
            then: f.fold_block(s.then),
            els: s.els.map(|s| Box::new(f.fold_stmt(*s))),
            span: s.span,
        }),
        Stmt::For(s) => Stmt::For(ForStmt {
            init: s.init.map(|s| Box::new(f.fold_stmt(*s))),
            cond: s.cond.map(|e| f.fold_expr(e)),
            post: s.post.map(|s| Box::new(f.fold_stmt(*s))),
            body: f.fold_block(s.body),
            span: s.span,
        }),
        Stmt::Block(b) => Stmt::Block(f.fold_block(b)),
        Stmt::Go { call, span } => Stmt::Go {
            call: f.fold_expr(call),
            span,
        },
        Stmt::Defer { call, span } => Stmt::Defer {
            call: f.fold_expr(call),
            span,
        },
        Stmt::Decl(d) => Stmt::Decl(Box::new(f.fold_decl(*d))),
        branch @ Stmt::Branch { .. } => branch,
    }
}

pub fn walk_expr<F: Folder + ?Sized>(f: &mut F, expr: Expr) -> Expr {
    let span = expr.span;
    let kind = match expr.kind {
        ExprKind::Composite { ty, elems } => ExprKind::Composite {
            ty,
            elems: elems.into_iter().map(|e| f.fold_expr(e)).collect(),
        },
        ExprKind::KeyValue { key, value } => ExprKind::KeyValue {
            key: Box::new(f.fold_expr(*key)),
            value: Box::new(f.fold_expr(*value)),
        },
        ExprKind::Paren(inner) => ExprKind::Paren(Box::new(f.fold_expr(*inner))),
        ExprKind::Selector { x, sel } => ExprKind::Selector {
            x: Box::new(f.fold_expr(*x)),
            sel,
        },
        ExprKind::Index { x, index } => ExprKind::Index {
            x: Box::new(f.fold_expr(*x)),
            index: Box::new(f.fold_expr(*index)),
        },
        ExprKind::Call { fun, args, spread } => ExprKind::Call {
            fun: Box::new(f.fold_expr(*fun)),
            args: args.into_iter().map(|e| f.fold_expr(e)).collect(),
            spread,
        },
        ExprKind::Binary { op, op_span, x, y } => ExprKind::Binary {
            op,
            op_span,
            x: Box::new(f.fold_expr(*x)),
            y: Box::new(f.fold_expr(*y)),
        },
        ExprKind::Unary { op, x } => ExprKind::Unary {
            op,
            x: Box::new(f.fold_expr(*x)),
        },
        ExprKind::FuncLit { sig, body } => ExprKind::FuncLit {
            sig,
            body: f.fold_block(body),
        },
        leaf @ (ExprKind::Ident(_) | ExprKind::Lit { .. }) => leaf,
    };
    Expr { kind, span }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    /// Renames every identifier; exercises that the walkers reach leaves
    /// in every statement and expression position.
    struct Renamer;

    impl Folder for Renamer {
        fn fold_expr(&mut self, expr: Expr) -> Expr {
            let expr = walk_expr(self, expr);
            match expr.kind {
                ExprKind::Ident(id) => Expr {
                    span: expr.span,
                    kind: ExprKind::Ident(Ident::new(format!("r_{}", id.name), id.span)),
                },
                _ => expr,
            }
        }
    }

    #[test]
    fn test_fold_reaches_nested_expressions() {
        let source = "package main\n\nfunc f(n int) int {\n\tfor i := 0; i < n; i++ {\n\t\tif g(i) {\n\t\t\treturn h(i + n)\n\t\t}\n\t}\n\treturn 0\n}\n";
        let (file, errors) = parser::parse_file(source, false);
        assert!(errors.is_empty());

        let folded = Renamer.fold_file(file);
        let debug = format!("{:?}", folded);
        for name in ["r_i", "r_n", "r_g", "r_h"] {
            assert!(debug.contains(name), "missing {} in {}", name, debug);
        }
    }

    #[test]
    fn test_identity_fold_preserves_shape() {
        struct Identity;
        impl Folder for Identity {}

        let source = "package main\n\nvar x = Vec{1, 2}\n";
        let (file, errors) = parser::parse_file(source, false);
        assert!(errors.is_empty());
        let before = format!("{:?}", file);
        let after = format!("{:?}", Identity.fold_file(file));
        assert_eq!(before, after);
    }
}
