//! Source printer
//!
//! Renders a rewritten tree back to standard Go source. The output is
//! meant for a compiler, not an archive: formatting is canonical
//! (tab-indented, one statement per line, a blank line between top-level
//! declarations) rather than a faithful copy of the input layout.
//! Comments that precede a top-level declaration are re-emitted above it
//! when the parse retained them; interior comments are dropped.

use crate::ast::*;
use crate::lexer::Comment;

/// Print a file as compilable source text.
pub fn print(file: &SourceFile) -> String {
    let mut p = Printer {
        out: String::new(),
        indent: 0,
    };
    p.file(file);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    // ============ File ============

    fn file(&mut self, file: &SourceFile) {
        self.push("package ");
        self.push(&file.package.name);
        self.newline();

        let mut next_comment = 0usize;
        for decl in &file.decls {
            self.newline();
            next_comment = self.leading_comments(&file.comments, next_comment, decl);
            self.decl(decl);
        }
    }

    /// Emit comments that sit above `decl`, returning the new cursor.
    fn leading_comments(
        &mut self,
        comments: &[Comment],
        mut cursor: usize,
        decl: &Decl,
    ) -> usize {
        while cursor < comments.len() && comments[cursor].span.end <= decl.span().start {
            self.push(&comments[cursor].text);
            self.newline();
            cursor += 1;
        }
        cursor
    }

    // ============ Declarations ============

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Import(d) => self.import_decl(d),
            Decl::Func(d) => self.func_decl(d),
            Decl::Type(d) => {
                self.push("type ");
                self.push(&d.name.name);
                self.push(" ");
                self.type_expr(&d.ty);
                self.newline();
            }
            Decl::Const(d) | Decl::Var(d) => {
                self.line_start();
                self.value_decl(d);
                self.newline();
            }
        }
    }

    fn import_decl(&mut self, d: &ImportDecl) {
        if d.grouped {
            self.push("import (\n");
            for spec in &d.specs {
                self.push("\t");
                if let Some(alias) = &spec.alias {
                    self.push(&alias.name);
                    self.push(" ");
                }
                self.push(&spec.path);
                self.newline();
            }
            self.push(")\n");
        } else {
            self.push("import ");
            if let Some(alias) = &d.specs[0].alias {
                self.push(&alias.name);
                self.push(" ");
            }
            self.push(&d.specs[0].path);
            self.newline();
        }
    }

    fn value_decl(&mut self, d: &ValueDecl) {
        self.push(match d.kind {
            ValueKind::Const => "const ",
            ValueKind::Var => "var ",
        });
        for (i, name) in d.names.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&name.name);
        }
        if let Some(ty) = &d.ty {
            self.push(" ");
            self.type_expr(ty);
        }
        if !d.values.is_empty() {
            self.push(" = ");
            for (i, value) in d.values.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.expr(value);
            }
        }
    }

    fn func_decl(&mut self, d: &FuncDecl) {
        self.push("func ");
        if let Some(recv) = &d.recv {
            self.push("(");
            self.push(&recv.name.name);
            self.push(" ");
            self.type_expr(&recv.ty);
            self.push(") ");
        }
        self.push(&d.name.name);
        self.signature(&d.sig);
        self.push(" ");
        self.block(&d.body);
        self.newline();
    }

    fn signature(&mut self, sig: &FuncSig) {
        self.push("(");
        for (i, group) in sig.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            for (j, name) in group.names.iter().enumerate() {
                if j > 0 {
                    self.push(", ");
                }
                self.push(&name.name);
            }
            self.push(" ");
            self.type_expr(&group.ty);
        }
        self.push(")");
        match sig.results.len() {
            0 => {}
            1 => {
                self.push(" ");
                self.type_expr(&sig.results[0]);
            }
            _ => {
                self.push(" (");
                for (i, ty) in sig.results.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.type_expr(ty);
                }
                self.push(")");
            }
        }
    }

    // ============ Types ============

    fn type_expr(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeKind::Name(id) => self.push(&id.name),
            TypeKind::Qualified { pkg, name } => {
                self.push(&pkg.name);
                self.push(".");
                self.push(&name.name);
            }
            TypeKind::Slice(elem) => {
                self.push("[]");
                self.type_expr(elem);
            }
            TypeKind::Array { len, elem } => {
                self.push("[");
                self.expr(len);
                self.push("]");
                self.type_expr(elem);
            }
            TypeKind::Pointer(inner) => {
                self.push("*");
                self.type_expr(inner);
            }
            TypeKind::Map { key, value } => {
                self.push("map[");
                self.type_expr(key);
                self.push("]");
                self.type_expr(value);
            }
            TypeKind::Struct(fields) => {
                if fields.is_empty() {
                    self.push("struct{}");
                    return;
                }
                self.push("struct {\n");
                self.indent += 1;
                for group in fields {
                    self.line_start();
                    for (i, name) in group.names.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.push(&name.name);
                    }
                    self.push(" ");
                    self.type_expr(&group.ty);
                    self.newline();
                }
                self.indent -= 1;
                self.line_start();
                self.push("}");
            }
            TypeKind::Func(sig) => {
                self.push("func");
                self.signature(sig);
            }
        }
    }

    // ============ Statements ============

    fn block(&mut self, block: &Block) {
        self.push("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.line_start();
            self.stmt(stmt);
            self.newline();
        }
        self.indent -= 1;
        self.line_start();
        self.push("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => self.expr(e),
            Stmt::Assign(a) => self.assign(a),
            Stmt::IncDec { target, inc, .. } => {
                self.expr(target);
                self.push(if *inc { "++" } else { "--" });
            }
            Stmt::Return { results, .. } => {
                self.push("return");
                for (i, e) in results.iter().enumerate() {
                    self.push(if i == 0 { " " } else { ", " });
                    self.expr(e);
                }
            }
            Stmt::If(s) => self.if_stmt(s),
            Stmt::For(s) => self.for_stmt(s),
            Stmt::Block(b) => self.block(b),
            Stmt::Branch { kind, .. } => self.push(match kind {
                BranchKind::Break => "break",
                BranchKind::Continue => "continue",
            }),
            Stmt::Go { call, .. } => {
                self.push("go ");
                self.expr(call);
            }
            Stmt::Defer { call, .. } => {
                self.push("defer ");
                self.expr(call);
            }
            Stmt::Decl(d) => match d.as_ref() {
                Decl::Const(v) | Decl::Var(v) => self.value_decl(v),
                Decl::Type(t) => {
                    self.push("type ");
                    self.push(&t.name.name);
                    self.push(" ");
                    self.type_expr(&t.ty);
                }
                _ => {}
            },
        }
    }

    fn assign(&mut self, a: &AssignStmt) {
        for (i, e) in a.lhs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(e);
        }
        self.push(" ");
        self.push(a.op.symbol());
        self.push(" ");
        for (i, e) in a.rhs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(e);
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) {
        self.push("if ");
        if let Some(init) = &s.init {
            self.stmt(init);
            self.push("; ");
        }
        self.expr(&s.cond);
        self.push(" ");
        self.block(&s.then);
        if let Some(els) = &s.els {
            self.push(" else ");
            match els.as_ref() {
                Stmt::If(nested) => self.if_stmt(nested),
                Stmt::Block(b) => self.block(b),
                other => self.stmt(other),
            }
        }
    }

    fn for_stmt(&mut self, s: &ForStmt) {
        self.push("for ");
        match (&s.init, &s.cond, &s.post) {
            (None, None, None) => {}
            (None, Some(cond), None) => {
                self.expr(cond);
                self.push(" ");
            }
            (init, cond, post) => {
                if let Some(init) = init {
                    self.stmt(init);
                }
                self.push("; ");
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                self.push("; ");
                if let Some(post) = post {
                    self.stmt(post);
                }
                self.push(" ");
            }
        }
        self.block(&s.body);
    }

    // ============ Expressions ============

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(id) => self.push(&id.name),
            ExprKind::Lit { text, .. } => self.push(text),
            ExprKind::Composite { ty, elems } => {
                if let Some(ty) = ty {
                    self.type_expr(ty);
                }
                self.push("{");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(elem);
                }
                self.push("}");
            }
            ExprKind::KeyValue { key, value } => {
                self.expr(key);
                self.push(": ");
                self.expr(value);
            }
            ExprKind::Paren(inner) => {
                self.push("(");
                self.expr(inner);
                self.push(")");
            }
            ExprKind::Selector { x, sel } => {
                self.expr(x);
                self.push(".");
                self.push(&sel.name);
            }
            ExprKind::Index { x, index } => {
                self.expr(x);
                self.push("[");
                self.expr(index);
                self.push("]");
            }
            ExprKind::Call { fun, args, spread } => {
                self.expr(fun);
                self.push("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(arg);
                }
                if *spread {
                    self.push("...");
                }
                self.push(")");
            }
            ExprKind::Binary { op, x, y, .. } => {
                self.expr(x);
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.expr(y);
            }
            ExprKind::Unary { op, x } => {
                self.push(op.symbol());
                self.expr(x);
            }
            ExprKind::FuncLit { sig, body } => {
                self.push("func");
                self.signature(sig);
                self.push(" ");
                self.block(body);
            }
        }
    }
}
