//! Lexer for the Go subset
//!
//! The lexer converts source bytes into tokens using the `logos` crate.
//! It produces two views of the same source:
//!
//! - [`lex`]: the raw operator-level stream consumed by the classifier,
//!   comments and newlines are dropped, no semicolons are invented.
//! - [`lex_stmts`]: the parser stream, where Go's automatic semicolon insertion
//!   is applied, so the grammar can treat statements as `;`-terminated.
//!
//! Comments are collected separately with their spans so the parser can
//! retain them when asked to.

use crate::span::Span;
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("unexpected character at position {0}")]
    UnexpectedChar(usize),
}

/// A comment, kept verbatim (including its `//` or `/* */` markers)
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

/// Everything one pass over the source produces
#[derive(Debug, Clone)]
pub struct LexOutput {
    /// Significant tokens, terminated by an `Eof` token
    pub tokens: Vec<Token>,
    /// All comments, in source order
    pub comments: Vec<Comment>,
    pub errors: Vec<LexerError>,
}

fn scan(source: &str) -> (Vec<Token>, Vec<Comment>, Vec<LexerError>) {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut errors = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(TokenKind::LineComment) | Ok(TokenKind::BlockComment) => {
                comments.push(Comment {
                    text: span.text(source).to_string(),
                    span,
                });
                // A block comment containing a newline acts as a newline
                // for semicolon insertion.
                if span.text(source).contains('\n') {
                    tokens.push(Token::new(TokenKind::Newline, Span::point(span.start)));
                }
            }
            Ok(kind) => tokens.push(Token::new(kind, span)),
            Err(()) => errors.push(LexerError::UnexpectedChar(span.start)),
        }
    }

    let eof = source.len();
    tokens.push(Token::new(TokenKind::Eof, Span::new(eof, eof)));
    (tokens, comments, errors)
}

/// Lex the raw operator-level stream: no newlines, no inserted semicolons.
/// This is the view the token classifier walks.
pub fn lex(source: &str) -> LexOutput {
    let (tokens, comments, errors) = scan(source);
    let tokens = tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Newline)
        .collect();
    LexOutput {
        tokens,
        comments,
        errors,
    }
}

/// Lex the statement-level stream for the parser, applying Go's automatic
/// semicolon insertion: a newline after a token that can end a statement
/// becomes a `;` token at the newline's position.
pub fn lex_stmts(source: &str) -> LexOutput {
    let (raw, comments, errors) = scan(source);
    let mut tokens = Vec::with_capacity(raw.len());
    let mut last_significant: Option<TokenKind> = None;

    for token in raw {
        match token.kind {
            TokenKind::Newline => {
                if last_significant.is_some_and(|k| k.ends_statement()) {
                    tokens.push(Token::new(
                        TokenKind::Semicolon,
                        Span::point(token.span.start),
                    ));
                    last_significant = Some(TokenKind::Semicolon);
                }
            }
            TokenKind::Eof => {
                // Go also inserts a semicolon at end of input.
                if last_significant.is_some_and(|k| k.ends_statement()) {
                    tokens.push(Token::new(
                        TokenKind::Semicolon,
                        Span::point(token.span.start),
                    ));
                }
                tokens.push(token);
                break;
            }
            kind => {
                last_significant = Some(kind);
                tokens.push(token);
            }
        }
    }

    LexOutput {
        tokens,
        comments,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).tokens.into_iter().map(|t| t.kind).collect()
    }

    fn stmt_kinds(source: &str) -> Vec<TokenKind> {
        lex_stmts(source)
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / += :="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::PlusEq,
                TokenKind::ColonEq,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_dialect_glyphs_split_into_pairs() {
        // `.+` is not one token: the classifier relies on seeing the dot
        // and the operator as adjacent tokens.
        assert_eq!(
            kinds("a .+ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("2 *. x"),
            vec![
                TokenKind::IntLit,
                TokenKind::Star,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_float_keeps_its_dot() {
        assert_eq!(kinds("1.5"), vec![TokenKind::FloatLit, TokenKind::Eof]);
        assert_eq!(kinds("0."), vec![TokenKind::FloatLit, TokenKind::Eof]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("package func type const var return"),
            vec![
                TokenKind::Package,
                TokenKind::Func,
                TokenKind::Type,
                TokenKind::Const,
                TokenKind::Var,
                TokenKind::Return,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_collected() {
        let out = lex("x // trailing\n/* block */ y");
        assert_eq!(out.comments.len(), 2);
        assert_eq!(out.comments[0].text, "// trailing");
        assert_eq!(out.comments[1].text, "/* block */");
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_block_comment_shapes() {
        for src in ["/**/", "/* block */", "/* a * b */", "/*** stars ***/"] {
            let out = lex(src);
            assert!(out.errors.is_empty(), "{}: {:?}", src, out.errors);
            assert_eq!(out.comments.len(), 1, "{}", src);
            assert_eq!(out.comments[0].text, src);
            assert_eq!(out.tokens.len(), 1, "{}", src);
        }
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(
            stmt_kinds("x := 1\ny := 2\n"),
            vec![
                TokenKind::Ident,
                TokenKind::ColonEq,
                TokenKind::IntLit,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::ColonEq,
                TokenKind::IntLit,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        // A line ending in a binary operator continues the statement.
        assert_eq!(
            stmt_kinds("x +\n1\n"),
            vec![
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::IntLit,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_semicolon_at_eof() {
        assert_eq!(
            stmt_kinds("x"),
            vec![TokenKind::Ident, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_multiline_block_comment_acts_as_newline() {
        assert_eq!(
            stmt_kinds("x /*\n*/ y"),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let source = "x := 42";
        let out = lex(source);
        assert_eq!(out.tokens[0].text(source), "x");
        assert_eq!(out.tokens[1].text(source), ":=");
        assert_eq!(out.tokens[2].text(source), "42");
    }
}
