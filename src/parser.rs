//! Parser for the (classified) Go subset
//!
//! A recursive descent parser that turns the classifier's buffer into an
//! AST. It only understands the standard grammar: by the time source
//! reaches this stage every dialect glyph has been neutralized, so the
//! parser is deliberately ignorant of the dialect. Precedence and
//! associativity follow Go's five binary levels.
//!
//! Errors are collected rather than thrown: the driver treats a non-empty
//! error list as fatal, but collecting them lets the CLI report more than
//! the first problem.

use crate::ast::*;
use crate::lexer::{self, Comment};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: Span,
    },

    #[error("{message}")]
    Custom { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::Custom { span, .. } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a classified buffer into a [`SourceFile`].
///
/// `keep_comments` retains the comment list on the returned file so the
/// printer can re-emit declaration comments; when false the list is empty.
pub fn parse_file(source: &str, keep_comments: bool) -> (SourceFile, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let file = parser.parse_source_file(keep_comments);
    (file, parser.errors)
}

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    pos: usize,
    errors: Vec<ParseError>,
    /// True while parsing an `if`/`for` header, where `Ident{` starts the
    /// statement body rather than a composite literal.
    no_lit: bool,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let out = lexer::lex_stmts(source);
        let mut errors = Vec::new();
        for err in &out.errors {
            let lexer::LexerError::UnexpectedChar(offset) = err;
            errors.push(ParseError::Custom {
                message: err.to_string(),
                span: Span::point(*offset),
            });
        }
        Self {
            source,
            tokens: out.tokens,
            comments: out.comments,
            pos: 0,
            errors,
            no_lit: false,
        }
    }

    // ============ Token plumbing ============

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{}", kind),
                found: self.kind(),
                span: self.current().span,
            })
        }
    }

    /// End of a statement: an inserted or explicit `;`, or a `}`/EOF that
    /// closes the surrounding scope.
    fn expect_semi(&mut self) -> ParseResult<()> {
        if self.consume(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.is_at_end()
        {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: ";".to_string(),
                found: self.kind(),
                span: self.current().span,
            })
        }
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn text(&self, token: &Token) -> &'src str {
        token.text(self.source)
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident::new(self.text(&token), token.span))
    }

    // ============ File and declarations ============

    fn parse_source_file(&mut self, keep_comments: bool) -> SourceFile {
        let start = self.current().span.start;
        let package = self.parse_package_clause().unwrap_or_else(|e| {
            self.errors.push(e);
            Ident::new("", Span::default())
        });

        let mut decls = Vec::new();
        while !self.is_at_end() {
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        let comments = if keep_comments {
            std::mem::take(&mut self.comments)
        } else {
            Vec::new()
        };

        SourceFile {
            package,
            decls,
            comments,
            span: Span::new(start, self.prev_end()),
        }
    }

    fn parse_package_clause(&mut self) -> ParseResult<Ident> {
        self.expect(TokenKind::Package)?;
        let name = self.parse_ident()?;
        self.expect_semi()?;
        Ok(name)
    }

    /// Skip to the next declaration keyword after an error.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            match self.kind() {
                TokenKind::Func
                | TokenKind::Type
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Import => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.kind() {
            TokenKind::Import => self.parse_import().map(Decl::Import),
            TokenKind::Func => self.parse_func().map(Decl::Func),
            TokenKind::Type => self.parse_type_decl().map(Decl::Type),
            TokenKind::Const => self.parse_value_decl(ValueKind::Const).map(Decl::Const),
            TokenKind::Var => self.parse_value_decl(ValueKind::Var).map(Decl::Var),
            _ => Err(ParseError::UnexpectedToken {
                expected: "declaration".to_string(),
                found: self.kind(),
                span: self.current().span,
            }),
        }
    }

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let start = self.expect(TokenKind::Import)?.span.start;

        let mut specs = Vec::new();
        let grouped = self.consume(TokenKind::LParen);
        if grouped {
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                specs.push(self.parse_import_spec()?);
                self.expect_semi()?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_import_spec()?);
        }
        self.expect_semi()?;

        Ok(ImportDecl {
            specs,
            grouped,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_import_spec(&mut self) -> ParseResult<ImportSpec> {
        let alias = if self.check(TokenKind::Ident) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        let token = self.expect(TokenKind::StringLit)?;
        Ok(ImportSpec {
            alias,
            path: self.text(&token).to_string(),
            span: token.span,
        })
    }

    fn parse_func(&mut self) -> ParseResult<FuncDecl> {
        let start = self.expect(TokenKind::Func)?.span.start;

        // A `(` directly after `func` opens a method receiver.
        let recv = if self.check(TokenKind::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let name = self.parse_ident()?;
        let sig = self.parse_signature()?;
        let body = self.parse_block()?;
        self.expect_semi()?;

        Ok(FuncDecl {
            recv,
            name,
            sig,
            body,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_receiver(&mut self) -> ParseResult<Receiver> {
        let start = self.expect(TokenKind::LParen)?.span.start;
        let name = self.parse_ident()?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::RParen)?;
        Ok(Receiver {
            name,
            ty,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_signature(&mut self) -> ParseResult<FuncSig> {
        let start = self.expect(TokenKind::LParen)?.span.start;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;
        let results = self.parse_results()?;
        Ok(FuncSig {
            params,
            results,
            span: Span::new(start, self.prev_end()),
        })
    }

    /// Parameter groups: `a, b Vec, c float64`. Parameters must be named;
    /// anonymous types appear only in result lists and function types.
    fn parse_params(&mut self) -> ParseResult<Vec<ParamGroup>> {
        let mut groups = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            groups.push(self.parse_param_group()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(groups)
    }

    fn parse_param_group(&mut self) -> ParseResult<ParamGroup> {
        let start = self.current().span.start;
        let mut names = vec![self.parse_ident()?];
        while self.check(TokenKind::Comma) && self.peek_kind() == TokenKind::Ident {
            // Only a name list if the commas keep introducing identifiers
            // that are themselves followed by more names or a type.
            self.advance();
            names.push(self.parse_ident()?);
        }
        let ty = self.parse_type()?;
        Ok(ParamGroup {
            names,
            ty,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_results(&mut self) -> ParseResult<Vec<TypeExpr>> {
        if self.consume(TokenKind::LParen) {
            let mut results = Vec::new();
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                results.push(self.parse_type()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            return Ok(results);
        }
        if self.starts_type() {
            return Ok(vec![self.parse_type()?]);
        }
        Ok(Vec::new())
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Ident
                | TokenKind::LBracket
                | TokenKind::Star
                | TokenKind::Map
                | TokenKind::Struct
                | TokenKind::Func
        )
    }

    fn parse_type_decl(&mut self) -> ParseResult<TypeDecl> {
        let start = self.expect(TokenKind::Type)?.span.start;
        let name = self.parse_ident()?;
        let ty = self.parse_type()?;
        self.expect_semi()?;
        Ok(TypeDecl {
            name,
            ty,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_value_decl(&mut self, kind: ValueKind) -> ParseResult<ValueDecl> {
        let keyword = match kind {
            ValueKind::Const => TokenKind::Const,
            ValueKind::Var => TokenKind::Var,
        };
        let start = self.expect(keyword)?.span.start;

        let mut names = vec![self.parse_ident()?];
        while self.consume(TokenKind::Comma) {
            names.push(self.parse_ident()?);
        }

        let ty = if self.starts_type() && !self.check(TokenKind::Func) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let mut values = Vec::new();
        if self.consume(TokenKind::Eq) {
            values.push(self.parse_expr()?);
            while self.consume(TokenKind::Comma) {
                values.push(self.parse_expr()?);
            }
        }
        self.expect_semi()?;

        Ok(ValueDecl {
            kind,
            names,
            ty,
            values,
            span: Span::new(start, self.prev_end()),
        })
    }

    // ============ Types ============

    fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current().span.start;
        let kind = match self.kind() {
            TokenKind::Ident => {
                let name = self.parse_ident()?;
                if self.check(TokenKind::Dot) && self.peek_kind() == TokenKind::Ident {
                    self.advance();
                    let sel = self.parse_ident()?;
                    TypeKind::Qualified { pkg: name, name: sel }
                } else {
                    TypeKind::Name(name)
                }
            }
            TokenKind::LBracket => {
                self.advance();
                if self.consume(TokenKind::RBracket) {
                    TypeKind::Slice(Box::new(self.parse_type()?))
                } else {
                    let len = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    TypeKind::Array {
                        len: Box::new(len),
                        elem: Box::new(self.parse_type()?),
                    }
                }
            }
            TokenKind::Star => {
                self.advance();
                TypeKind::Pointer(Box::new(self.parse_type()?))
            }
            TokenKind::Map => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.parse_type()?;
                TypeKind::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                }
            }
            TokenKind::Struct => {
                self.advance();
                self.expect(TokenKind::LBrace)?;
                let mut fields = Vec::new();
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    fields.push(self.parse_param_group()?);
                    self.expect_semi()?;
                }
                self.expect(TokenKind::RBrace)?;
                TypeKind::Struct(fields)
            }
            TokenKind::Func => {
                self.advance();
                let sig = self.parse_signature()?;
                TypeKind::Func(Box::new(sig))
            }
            _ => {
                return Err(ParseError::UnexpectedToken {
                    expected: "type".to_string(),
                    found: self.kind(),
                    span: self.current().span,
                })
            }
        };
        Ok(TypeExpr {
            kind,
            span: Span::new(start, self.prev_end()),
        })
    }

    // ============ Statements ============

    fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.expect(TokenKind::LBrace)?.span.start;
        let saved = self.no_lit;
        self.no_lit = false;

        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.consume(TokenKind::Semicolon) {
                continue;
            }
            let stmt = self.parse_stmt()?;
            stmts.push(stmt);
        }
        self.expect(TokenKind::RBrace)?;

        self.no_lit = saved;
        Ok(Block {
            stmts,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.kind() {
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::For => self.parse_for().map(Stmt::For),
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                self.expect_semi()?;
                Ok(Stmt::Block(block))
            }
            TokenKind::Break | TokenKind::Continue => {
                let token = self.advance();
                let kind = if token.kind == TokenKind::Break {
                    BranchKind::Break
                } else {
                    BranchKind::Continue
                };
                self.expect_semi()?;
                Ok(Stmt::Branch {
                    kind,
                    span: token.span,
                })
            }
            TokenKind::Go | TokenKind::Defer => {
                let token = self.advance();
                let call = self.parse_expr()?;
                self.expect_semi()?;
                let span = Span::new(token.span.start, call.span.end);
                if token.kind == TokenKind::Go {
                    Ok(Stmt::Go { call, span })
                } else {
                    Ok(Stmt::Defer { call, span })
                }
            }
            TokenKind::Var => {
                let decl = self.parse_value_decl(ValueKind::Var)?;
                Ok(Stmt::Decl(Box::new(Decl::Var(decl))))
            }
            TokenKind::Const => {
                let decl = self.parse_value_decl(ValueKind::Const)?;
                Ok(Stmt::Decl(Box::new(Decl::Const(decl))))
            }
            TokenKind::Type => {
                let decl = self.parse_type_decl()?;
                Ok(Stmt::Decl(Box::new(Decl::Type(decl))))
            }
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.expect_semi()?;
                Ok(stmt)
            }
        }
    }

    /// Expression statement, assignment, short declaration, or `++`/`--`.
    /// Does not consume the trailing semicolon, since `if`/`for` headers need
    /// to see it.
    fn parse_simple_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span.start;
        let mut lhs = vec![self.parse_expr()?];
        while self.consume(TokenKind::Comma) {
            lhs.push(self.parse_expr()?);
        }

        if let Some(op) = self.assign_op() {
            let op_token = self.advance();
            let mut rhs = vec![self.parse_expr()?];
            while self.consume(TokenKind::Comma) {
                rhs.push(self.parse_expr()?);
            }
            return Ok(Stmt::Assign(AssignStmt {
                lhs,
                op,
                op_span: op_token.span,
                rhs,
                span: Span::new(start, self.prev_end()),
            }));
        }

        if self.check(TokenKind::Inc) || self.check(TokenKind::Dec) {
            let token = self.advance();
            let target = lhs.remove(0);
            if !lhs.is_empty() {
                return Err(ParseError::Custom {
                    message: "cannot ++/-- a list of expressions".to_string(),
                    span: token.span,
                });
            }
            return Ok(Stmt::IncDec {
                target,
                inc: token.kind == TokenKind::Inc,
                span: Span::new(start, token.span.end),
            });
        }

        if lhs.len() > 1 {
            return Err(ParseError::Custom {
                message: "expected assignment after expression list".to_string(),
                span: self.current().span,
            });
        }
        Ok(Stmt::Expr(lhs.remove(0)))
    }

    fn assign_op(&self) -> Option<AssignOp> {
        Some(match self.kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::ColonEq => AssignOp::Define,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Rem,
            TokenKind::AndEq => AssignOp::And,
            TokenKind::OrEq => AssignOp::Or,
            TokenKind::CaretEq => AssignOp::Xor,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            TokenKind::AndNotEq => AssignOp::AndNot,
            _ => return None,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let token = self.expect(TokenKind::Return)?;
        let mut results = Vec::new();
        if !self.check(TokenKind::Semicolon) && !self.check(TokenKind::RBrace) {
            results.push(self.parse_expr()?);
            while self.consume(TokenKind::Comma) {
                results.push(self.parse_expr()?);
            }
        }
        self.expect_semi()?;
        Ok(Stmt::Return {
            results,
            span: Span::new(token.span.start, self.prev_end()),
        })
    }

    fn parse_if(&mut self) -> ParseResult<IfStmt> {
        let start = self.expect(TokenKind::If)?.span.start;

        let saved = self.no_lit;
        self.no_lit = true;
        let first = self.parse_simple_stmt()?;
        let (init, cond) = if self.consume(TokenKind::Semicolon) {
            let second = self.parse_simple_stmt()?;
            (Some(Box::new(first)), self.stmt_to_expr(second)?)
        } else {
            (None, self.stmt_to_expr(first)?)
        };
        self.no_lit = saved;

        let then = self.parse_block()?;

        let els = if self.consume(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(Box::new(Stmt::If(self.parse_if()?)))
            } else {
                let block = self.parse_block()?;
                self.expect_semi()?;
                Some(Box::new(Stmt::Block(block)))
            }
        } else {
            self.expect_semi()?;
            None
        };

        Ok(IfStmt {
            init,
            cond,
            then,
            els,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn stmt_to_expr(&self, stmt: Stmt) -> ParseResult<Expr> {
        match stmt {
            Stmt::Expr(e) => Ok(e),
            other => Err(ParseError::Custom {
                message: "expected expression".to_string(),
                span: other.span(),
            }),
        }
    }

    fn parse_for(&mut self) -> ParseResult<ForStmt> {
        let start = self.expect(TokenKind::For)?.span.start;

        let saved = self.no_lit;
        self.no_lit = true;

        let (init, cond, post) = if self.check(TokenKind::LBrace) {
            (None, None, None)
        } else {
            let first = if self.check(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_simple_stmt()?)
            };
            if self.consume(TokenKind::Semicolon) {
                let cond = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semicolon)?;
                let post = if self.check(TokenKind::LBrace) {
                    None
                } else {
                    Some(Box::new(self.parse_simple_stmt()?))
                };
                (first.map(Box::new), cond, post)
            } else {
                // Single-clause form: `for cond { ... }`
                let first = first.ok_or_else(|| ParseError::Custom {
                    message: "expected loop condition".to_string(),
                    span: self.current().span,
                })?;
                (None, Some(self.stmt_to_expr(first)?), None)
            }
        };

        self.no_lit = saved;
        let body = self.parse_block()?;
        self.expect_semi()?;

        Ok(ForStmt {
            init,
            cond,
            post,
            body,
            span: Span::new(start, self.prev_end()),
        })
    }

    // ============ Expressions ============

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;
        while self.check(TokenKind::OrOr) {
            let op_token = self.advance();
            let right = self.parse_and()?;
            expr = self.binary(expr, BinOp::LOr, op_token.span, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_comparison()?;
        while self.check(TokenKind::AndAnd) {
            let op_token = self.advance();
            let right = self.parse_comparison()?;
            expr = self.binary(expr, BinOp::LAnd, op_token.span, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_additive()?;
            expr = self.binary(expr, op, op_token.span, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Or => BinOp::Or,
                TokenKind::Caret => BinOp::Xor,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_multiplicative()?;
            expr = self.binary(expr, op, op_token.span, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                TokenKind::And => BinOp::And,
                TokenKind::AndNot => BinOp::AndNot,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_unary()?;
            expr = self.binary(expr, op, op_token.span, right);
        }
        Ok(expr)
    }

    fn binary(&self, x: Expr, op: BinOp, op_span: Span, y: Expr) -> Expr {
        let span = x.span.merge(y.span);
        Expr {
            kind: ExprKind::Binary {
                op,
                op_span,
                x: Box::new(x),
                y: Box::new(y),
            },
            span,
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Plus => Some(UnOp::Pos),
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Star => Some(UnOp::Deref),
            TokenKind::And => Some(UnOp::Addr),
            TokenKind::Caret => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.advance();
            let x = self.parse_unary()?;
            let span = Span::new(token.span.start, x.span.end);
            return Ok(Expr {
                kind: ExprKind::Unary { op, x: Box::new(x) },
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    let sel = self.parse_ident()?;
                    let span = Span::new(expr.span.start, sel.span.end);
                    expr = Expr {
                        kind: ExprKind::Selector {
                            x: Box::new(expr),
                            sel,
                        },
                        span,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let saved = self.no_lit;
                    self.no_lit = false;
                    let mut args = Vec::new();
                    let mut spread = false;
                    while !self.check(TokenKind::RParen) && !self.is_at_end() {
                        args.push(self.parse_expr()?);
                        if self.consume(TokenKind::Ellipsis) {
                            spread = true;
                        }
                        if !self.consume(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.no_lit = saved;
                    self.expect(TokenKind::RParen)?;
                    let span = Span::new(expr.span.start, self.prev_end());
                    expr = Expr {
                        kind: ExprKind::Call {
                            fun: Box::new(expr),
                            args,
                            spread,
                        },
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let saved = self.no_lit;
                    self.no_lit = false;
                    let index = self.parse_expr()?;
                    self.no_lit = saved;
                    self.expect(TokenKind::RBracket)?;
                    let span = Span::new(expr.span.start, self.prev_end());
                    expr = Expr {
                        kind: ExprKind::Index {
                            x: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    };
                }
                TokenKind::LBrace if !self.no_lit && is_literal_type(&expr) => {
                    let ty = expr_to_type(&expr);
                    expr = self.parse_composite_body(Some(ty), expr.span.start)?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Ident(Ident::new(self.text(&token), token.span)),
                    span: token.span,
                })
            }
            TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StringLit
            | TokenKind::RawStringLit
            | TokenKind::CharLit => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::IntLit => LitKind::Int,
                    TokenKind::FloatLit => LitKind::Float,
                    TokenKind::CharLit => LitKind::Char,
                    _ => LitKind::String,
                };
                Ok(Expr {
                    kind: ExprKind::Lit {
                        kind,
                        text: self.text(&token).to_string(),
                    },
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let saved = self.no_lit;
                self.no_lit = false;
                let inner = self.parse_expr()?;
                self.no_lit = saved;
                self.expect(TokenKind::RParen)?;
                let span = Span::new(token.span.start, self.prev_end());
                Ok(Expr {
                    kind: ExprKind::Paren(Box::new(inner)),
                    span,
                })
            }
            TokenKind::LBracket | TokenKind::Map => {
                // Type-led composite literal: `[]float64{...}`, `map[K]V{...}`
                let ty = self.parse_type()?;
                self.parse_composite_body(Some(Box::new(ty)), token.span.start)
            }
            TokenKind::Func => {
                self.advance();
                let sig = self.parse_signature()?;
                let body = self.parse_block()?;
                let span = Span::new(token.span.start, self.prev_end());
                Ok(Expr {
                    kind: ExprKind::FuncLit { sig, body },
                    span,
                })
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: token.kind,
                span: token.span,
            }),
        }
    }

    fn parse_composite_body(
        &mut self,
        ty: Option<Box<TypeExpr>>,
        start: usize,
    ) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let saved = self.no_lit;
        self.no_lit = false;

        let mut elems = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let elem = self.parse_expr()?;
            let elem = if self.consume(TokenKind::Colon) {
                let value = self.parse_expr()?;
                let span = elem.span.merge(value.span);
                Expr {
                    kind: ExprKind::KeyValue {
                        key: Box::new(elem),
                        value: Box::new(value),
                    },
                    span,
                }
            } else {
                elem
            };
            elems.push(elem);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }

        self.no_lit = saved;
        self.expect(TokenKind::RBrace)?;
        Ok(Expr {
            kind: ExprKind::Composite { ty, elems },
            span: Span::new(start, self.prev_end()),
        })
    }
}

/// Whether an already-parsed expression can name the type of a composite
/// literal (`Vec{...}` or `pkg.Vec{...}`).
fn is_literal_type(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(_) => true,
        ExprKind::Selector { x, .. } => matches!(x.kind, ExprKind::Ident(_)),
        _ => false,
    }
}

fn expr_to_type(expr: &Expr) -> Box<TypeExpr> {
    let kind = match &expr.kind {
        ExprKind::Ident(id) => TypeKind::Name(id.clone()),
        ExprKind::Selector { x, sel } => match &x.kind {
            ExprKind::Ident(pkg) => TypeKind::Qualified {
                pkg: pkg.clone(),
                name: sel.clone(),
            },
            _ => unreachable!("checked by is_literal_type"),
        },
        _ => unreachable!("checked by is_literal_type"),
    };
    Box::new(TypeExpr {
        kind,
        span: expr.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> SourceFile {
        let (file, errors) = parse_file(source, false);
        assert!(errors.is_empty(), "Parse errors: {:?}", errors);
        file
    }

    fn parse_err(source: &str) -> Vec<ParseError> {
        let (_, errors) = parse_file(source, false);
        errors
    }

    #[test]
    fn test_empty_package() {
        let file = parse_ok("package main\n");
        assert_eq!(file.package.name, "main");
        assert!(file.decls.is_empty());
    }

    #[test]
    fn test_simple_function() {
        let file = parse_ok("package main\n\nfunc main() {\n}\n");
        assert_eq!(file.decls.len(), 1);
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.name.name, "main");
        assert!(f.recv.is_none());
        assert!(f.sig.params.is_empty());
    }

    #[test]
    fn test_method_declaration() {
        let file = parse_ok("package main\n\nfunc (a Vec) P_ (b Vec) Vec {\n\treturn a\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let recv = f.recv.as_ref().unwrap();
        assert_eq!(recv.name.name, "a");
        assert_eq!(f.name.name, "P_");
        assert_eq!(f.sig.params.len(), 1);
        assert_eq!(f.sig.results.len(), 1);
    }

    #[test]
    fn test_grouped_parameters() {
        let file = parse_ok("package main\n\nfunc test(a, b, c Vec) Vec {\n\treturn a\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.sig.params.len(), 1);
        assert_eq!(f.sig.params[0].names.len(), 3);
    }

    #[test]
    fn test_type_declaration() {
        let file = parse_ok("package main\n\ntype Vec []float64\n");
        let Decl::Type(t) = &file.decls[0] else {
            panic!("expected type decl");
        };
        assert_eq!(t.name.name, "Vec");
        assert!(matches!(t.ty.kind, TypeKind::Slice(_)));
    }

    #[test]
    fn test_imports() {
        let file = parse_ok("package main\n\nimport (\n\t\"os\"\n\t\"fmt\"\n)\n");
        let Decl::Import(imp) = &file.decls[0] else {
            panic!("expected import");
        };
        assert_eq!(imp.specs.len(), 2);
        assert_eq!(imp.specs[0].path, "\"os\"");
    }

    #[test]
    fn test_short_var_decl() {
        let file = parse_ok("package main\n\nfunc main() {\n\tx := Vec{1, 2, 3}\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::Assign(a) = &f.body.stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(a.op, AssignOp::Define);
        assert!(matches!(a.rhs[0].kind, ExprKind::Composite { .. }));
    }

    #[test]
    fn test_multi_assign() {
        let file = parse_ok("package main\n\nfunc f() {\n\t_, err := g()\n\t_ = err\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::Assign(a) = &f.body.stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(a.lhs.len(), 2);
        assert_eq!(a.rhs.len(), 1);
    }

    #[test]
    fn test_if_with_init() {
        let file = parse_ok(
            "package main\n\nfunc f() {\n\tif e := g(); e != nil {\n\t\treturn\n\t}\n}\n",
        );
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::If(s) = &f.body.stmts[0] else {
            panic!("expected if");
        };
        assert!(s.init.is_some());
        assert!(matches!(s.cond.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_composite_literal_not_in_if_header() {
        // `x` here is the condition, not the start of `x{}`.
        let file = parse_ok("package main\n\nfunc f() {\n\tif ok {\n\t\tg()\n\t}\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::If(s) = &f.body.stmts[0] else {
            panic!("expected if");
        };
        assert!(matches!(s.cond.kind, ExprKind::Ident(_)));
    }

    #[test]
    fn test_three_clause_for() {
        let file = parse_ok(
            "package main\n\nfunc f(n int) {\n\tfor j := 0; j < n; j++ {\n\t\tg(j)\n\t}\n}\n",
        );
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::For(s) = &f.body.stmts[0] else {
            panic!("expected for");
        };
        assert!(s.init.is_some());
        assert!(s.cond.is_some());
        assert!(s.post.is_some());
    }

    #[test]
    fn test_index_of_paren_expr() {
        let file = parse_ok("package main\n\nfunc f() {\n\tx := (a - b)[0]\n\t_ = x\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::Assign(a) = &f.body.stmts[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(a.rhs[0].kind, ExprKind::Index { .. }));
    }

    #[test]
    fn test_func_literal_call() {
        let file = parse_ok(
            "package main\n\nfunc f() {\n\ty := (func(x int) int {\n\t\treturn x + 1\n\t})(5)\n\t_ = y\n}\n",
        );
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::Assign(a) = &f.body.stmts[0] else {
            panic!("expected assignment");
        };
        let ExprKind::Call { fun, args, .. } = &a.rhs[0].kind else {
            panic!("expected call");
        };
        assert!(matches!(fun.kind, ExprKind::Paren(_)));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_spread_call() {
        let file = parse_ok("package main\n\nfunc f(args Vec) {\n\tg(args...)\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let Stmt::Expr(e) = &f.body.stmts[0] else {
            panic!("expected expr stmt");
        };
        let ExprKind::Call { spread, .. } = &e.kind else {
            panic!("expected call");
        };
        assert!(spread);
    }

    #[test]
    fn test_operator_precedence() {
        let file = parse_ok("package main\n\nvar x = 1 + 2*3\n");
        let Decl::Var(v) = &file.decls[0] else {
            panic!("expected var");
        };
        let ExprKind::Binary { op, y, .. } = &v.values[0].kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(
            y.kind,
            ExprKind::Binary { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn test_binary_op_span_points_into_source() {
        let source = "package main\n\nvar x = a + b\n";
        let file = parse_ok(source);
        let Decl::Var(v) = &file.decls[0] else {
            panic!("expected var");
        };
        let ExprKind::Binary { op_span, .. } = &v.values[0].kind else {
            panic!("expected binary");
        };
        assert_eq!(op_span.text(source), "+");
    }

    #[test]
    fn test_parse_error_reported() {
        let errors = parse_err("package main\n\nfunc f( {\n}\n");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_lexer_error_carries_offset() {
        let source = "package main\n\nvar x = #\n";
        let at = source.find('#').unwrap();
        let errors = parse_err(source);
        assert!(
            errors.iter().any(|e| e.span().start == at),
            "no error at offset {}: {:?}",
            at,
            errors
        );
    }

    #[test]
    fn test_dialect_glyph_is_a_parse_error() {
        // Unclassified dialect source must not slip through the standard
        // grammar.
        let errors = parse_err("package main\n\nvar x = a .+ b\n");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_comments_retained_on_request() {
        let source = "package main\n\n// doc for f\nfunc f() {\n}\n";
        let (file, errors) = parse_file(source, true);
        assert!(errors.is_empty());
        assert_eq!(file.comments.len(), 1);
        assert_eq!(file.comments[0].text, "// doc for f");
    }
}
