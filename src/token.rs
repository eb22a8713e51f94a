//! Token definitions for the Go subset
//!
//! This module defines all the tokens the lexer can produce. The token set
//! is the standard Go one: the dialect operators (`.+`, `.-`, `.+=`, `*.`)
//! are deliberately *not* tokens of their own: they surface as a `.` or
//! `*` followed by an ordinary operator, and the classifier recognizes the
//! adjacent pairs.

use crate::span::Span;
use logos::Logos;
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the text of this token from source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// All token types of the Go subset
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")] // Skip horizontal whitespace; newlines are tokens
pub enum TokenKind {
    // ============ Literals ============

    /// Integer literal: 42, 0xFF, 0644
    #[regex(r"[0-9]+", priority = 2)]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    IntLit,

    /// Float literal: 3.14, 0., 1e10, 2.5e-3
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLit,

    /// Interpreted string literal: "hello\n"
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    /// Raw string literal: `no escapes`
    #[regex(r"`[^`]*`")]
    RawStringLit,

    /// Character (rune) literal: 'a', '\n'
    #[regex(r"'([^'\\]|\\.)+'")]
    CharLit,

    // ============ Keywords ============

    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("func")]
    Func,
    #[token("type")]
    Type,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("range")]
    Range,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("fallthrough")]
    Fallthrough,
    #[token("go")]
    Go,
    #[token("defer")]
    Defer,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("select")]
    Select,
    #[token("goto")]
    Goto,

    // ============ Operators ============

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&^")]
    AndNot,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Not,

    #[token("=")]
    Eq,
    #[token(":=")]
    ColonEq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AndEq,
    #[token("|=")]
    OrEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("&^=")]
    AndNotEq,

    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("<-")]
    Arrow,
    #[token("...")]
    Ellipsis,

    // ============ Delimiters ============

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // ============ Identifiers ============

    /// Identifier: foo, _bar, Vec
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ============ Trivia ============

    /// Line comment, runs to just before the newline
    #[regex(r"//[^\n]*")]
    LineComment,

    /// Block comment, may span newlines
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,

    /// Newline; significant for automatic semicolon insertion
    #[token("\n")]
    Newline,

    // ============ Special ============

    /// End of file
    Eof,
}

impl TokenKind {
    /// Whether a newline after this token terminates the statement
    /// (Go's automatic semicolon insertion rule).
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::StringLit
                | TokenKind::RawStringLit
                | TokenKind::CharLit
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Whether this token is lexical trivia (never seen by the parser
    /// or the classifier state machine).
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::Newline
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::StringLit
                | TokenKind::RawStringLit
                | TokenKind::CharLit
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::IntLit => "integer",
            TokenKind::FloatLit => "float",
            TokenKind::StringLit => "string",
            TokenKind::RawStringLit => "raw string",
            TokenKind::CharLit => "char",
            TokenKind::Package => "package",
            TokenKind::Import => "import",
            TokenKind::Func => "func",
            TokenKind::Type => "type",
            TokenKind::Const => "const",
            TokenKind::Var => "var",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::Range => "range",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Fallthrough => "fallthrough",
            TokenKind::Go => "go",
            TokenKind::Defer => "defer",
            TokenKind::Struct => "struct",
            TokenKind::Interface => "interface",
            TokenKind::Map => "map",
            TokenKind::Chan => "chan",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Select => "select",
            TokenKind::Goto => "goto",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Caret => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::AndNot => "&^",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::Eq => "=",
            TokenKind::ColonEq => ":=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AndEq => "&=",
            TokenKind::OrEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::AndNotEq => "&^=",
            TokenKind::Inc => "++",
            TokenKind::Dec => "--",
            TokenKind::Arrow => "<-",
            TokenKind::Ellipsis => "...",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Ident => "identifier",
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
