//! Function inlining
//!
//! Given a function name, this pass removes the function's top-level
//! declaration and substitutes every call to it with an immediately
//! invoked function literal:
//!
//! ```text
//! hello(args)   ==>   (func(params) results { body })(args)
//! ```
//!
//! The removed declaration leaves a placeholder constant behind
//! (`const i_inlined_NAME = 0`) so the file keeps a visible record of
//! the inlining and the declaration count stays stable.
//!
//! A name that resolves to nothing is not an error: the file passes
//! through untouched and the caller is told via [`InlineOutcome::found`].
//! A duplicated or self-recursive target is an error: substitution would
//! be ambiguous in the first case and would never terminate in the second.

use crate::ast::*;
use crate::fold::{self, Folder};
use crate::span::Span;
use thiserror::Error;

/// Prefix of the placeholder constant left where the declaration was.
pub const PLACEHOLDER_PREFIX: &str = "i_inlined_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InlineError {
    #[error("cannot inline {name}: defined more than once")]
    DuplicateDefinition { name: String },

    #[error("cannot inline {name}: it calls itself")]
    Recursive { name: String },
}

/// Result of one inlining pass.
#[derive(Debug)]
pub struct InlineOutcome {
    pub file: SourceFile,
    /// False when no top-level function had the requested name.
    pub found: bool,
}

/// Inline every call to the top-level function `name` within `file`.
pub fn inline_function(file: SourceFile, name: &str) -> Result<InlineOutcome, InlineError> {
    let matches = file
        .decls
        .iter()
        .filter(|d| is_named_function(d, name))
        .count();
    if matches == 0 {
        return Ok(InlineOutcome { file, found: false });
    }
    if matches > 1 {
        return Err(InlineError::DuplicateDefinition {
            name: name.to_string(),
        });
    }

    let mut extracted = None;
    let mut decls = Vec::with_capacity(file.decls.len());
    for decl in file.decls {
        if is_named_function(&decl, name) {
            let Decl::Func(f) = decl else { unreachable!() };
            if block_calls(&f.body, name) {
                return Err(InlineError::Recursive {
                    name: name.to_string(),
                });
            }
            decls.push(placeholder(name, f.span));
            extracted = Some(f);
        } else {
            decls.push(decl);
        }
    }

    // matches == 1, so extraction succeeded
    let target = extracted.ok_or(InlineError::DuplicateDefinition {
        name: name.to_string(),
    })?;

    let mut substituter = CallSubstituter {
        name,
        sig: target.sig,
        body: target.body,
    };
    let file = substituter.fold_file(SourceFile { decls, ..file });
    Ok(InlineOutcome { file, found: true })
}

fn is_named_function(decl: &Decl, name: &str) -> bool {
    matches!(decl, Decl::Func(f) if f.recv.is_none() && f.name.name == name)
}

/// `const i_inlined_NAME = 0` standing where the declaration was.
fn placeholder(name: &str, span: Span) -> Decl {
    Decl::Const(ValueDecl {
        kind: ValueKind::Const,
        names: vec![Ident::new(format!("{}{}", PLACEHOLDER_PREFIX, name), span)],
        ty: None,
        values: vec![Expr {
            kind: ExprKind::Lit {
                kind: LitKind::Int,
                text: "0".to_string(),
            },
            span,
        }],
        span,
    })
}

struct CallSubstituter<'a> {
    name: &'a str,
    sig: FuncSig,
    body: Block,
}

impl Folder for CallSubstituter<'_> {
    fn fold_expr(&mut self, expr: Expr) -> Expr {
        let expr = fold::walk_expr(self, expr);
        let span = expr.span;
        match expr.kind {
            ExprKind::Call { fun, args, spread }
                if matches!(&fun.kind, ExprKind::Ident(id) if id.name == self.name) =>
            {
                // The target never calls itself, so the substituted body
                // needs no further descent.
                let lit = Expr {
                    kind: ExprKind::FuncLit {
                        sig: self.sig.clone(),
                        body: self.body.clone(),
                    },
                    span: fun.span,
                };
                let paren = Expr {
                    kind: ExprKind::Paren(Box::new(lit)),
                    span: fun.span,
                };
                Expr {
                    kind: ExprKind::Call {
                        fun: Box::new(paren),
                        args,
                        spread,
                    },
                    span,
                }
            }
            kind => Expr { kind, span },
        }
    }
}

// ============ Recursion detection ============

fn block_calls(block: &Block, name: &str) -> bool {
    block.stmts.iter().any(|s| stmt_calls(s, name))
}

fn stmt_calls(stmt: &Stmt, name: &str) -> bool {
    match stmt {
        Stmt::Expr(e) => expr_calls(e, name),
        Stmt::Assign(a) => {
            a.lhs.iter().any(|e| expr_calls(e, name))
                || a.rhs.iter().any(|e| expr_calls(e, name))
        }
        Stmt::IncDec { target, .. } => expr_calls(target, name),
        Stmt::Return { results, .. } => results.iter().any(|e| expr_calls(e, name)),
        Stmt::If(s) => {
            s.init.as_deref().is_some_and(|s| stmt_calls(s, name))
                || expr_calls(&s.cond, name)
                || block_calls(&s.then, name)
                || s.els.as_deref().is_some_and(|s| stmt_calls(s, name))
        }
        Stmt::For(s) => {
            s.init.as_deref().is_some_and(|s| stmt_calls(s, name))
                || s.cond.as_ref().is_some_and(|e| expr_calls(e, name))
                || s.post.as_deref().is_some_and(|s| stmt_calls(s, name))
                || block_calls(&s.body, name)
        }
        Stmt::Block(b) => block_calls(b, name),
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => expr_calls(call, name),
        Stmt::Decl(d) => match d.as_ref() {
            Decl::Const(v) | Decl::Var(v) => v.values.iter().any(|e| expr_calls(e, name)),
            _ => false,
        },
        Stmt::Branch { .. } => false,
    }
}

fn expr_calls(expr: &Expr, name: &str) -> bool {
    match &expr.kind {
        ExprKind::Call { fun, args, .. } => {
            matches!(&fun.kind, ExprKind::Ident(id) if id.name == name)
                || expr_calls(fun, name)
                || args.iter().any(|e| expr_calls(e, name))
        }
        ExprKind::Composite { elems, .. } => elems.iter().any(|e| expr_calls(e, name)),
        ExprKind::KeyValue { key, value } => {
            expr_calls(key, name) || expr_calls(value, name)
        }
        ExprKind::Paren(inner) => expr_calls(inner, name),
        ExprKind::Selector { x, .. } => expr_calls(x, name),
        ExprKind::Index { x, index } => expr_calls(x, name) || expr_calls(index, name),
        ExprKind::Binary { x, y, .. } => expr_calls(x, name) || expr_calls(y, name),
        ExprKind::Unary { x, .. } => expr_calls(x, name),
        ExprKind::FuncLit { body, .. } => block_calls(body, name),
        ExprKind::Ident(_) | ExprKind::Lit { .. } => false,
    }
}
