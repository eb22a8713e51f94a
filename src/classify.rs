//! Token classifier: the lexical pre-pass that neutralizes dialect glyphs
//!
//! The dialect adds four infix operators that the standard grammar does not
//! know: `.+`, `.-`, `.+=` and `*.`. Rather than teach the parser about
//! them, this pass rewrites a copy of the source, byte for byte, into a
//! buffer the standard grammar accepts:
//!
//! - at a *use* site the `.` is overwritten with a space, so `a .+ b`
//!   becomes `a  + b` and parses as an ordinary binary expression;
//! - at a *declaration* site (the glyph right after a closed receiver
//!   parameter list) the glyph is overwritten with an identifier of the
//!   same width, so `func (a Vec) .+ (b Vec)` becomes
//!   `func (a Vec) P_ (b Vec)` and parses as an ordinary method.
//!
//! The buffer never changes length, so spans reported by the parser index
//! back into the original source; the operator rewriter re-reads those
//! original bytes to tell a neutralized dialect operator from a real one.
//!
//! A glyph sequence the state machine does not recognize is not an error:
//! it is left in place and either parses as standard syntax or fails in
//! the parser with an ordinary parse error.

use crate::lexer;
use crate::token::TokenKind;

/// Method names generated for the dialect operators.
pub mod method {
    /// `.+`
    pub const ADD: &str = "P_";
    /// `.-`
    pub const SUB: &str = "M_";
    /// `.+=`
    pub const ADD_ASSIGN: &str = "PE_";
    /// `*.`; the conventional receiver is the right operand
    pub const SCALAR_MUL: &str = "_mul_dot";
    /// Width-2 stand-in spliced over a `*.` declaration so the buffer
    /// stays parseable; the rewriter renames it to [`SCALAR_MUL`].
    pub const SCALAR_MUL_STUB: &str = "S_";
}

/// Classifier state, advanced deterministically token by token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Boring,
    /// Just saw a `.` in expression position; its offset is remembered
    AfterDot,
    /// Just saw `func`; a following `(` opens a method receiver
    AfterFunc,
    /// Inside a method receiver parameter list
    InReceiver,
    /// The receiver list just closed; a `.` or `*.` here declares an operator
    AfterReceiver,
    /// Saw the method-declaration dot; the next operator token is a name
    AfterMethodDot,
    /// Saw `*` right after the receiver list (start of a `*.` declaration)
    ReceiverStar,
}

/// Produce the parser-safe buffer for `source`. The result always has the
/// same length as the input.
pub fn classify(source: &str) -> Vec<u8> {
    let mut buf = source.as_bytes().to_vec();
    let stream = lexer::lex(source);

    let mut state = State::Boring;
    // Offset of the `.` (or `*`) that opened the pending dialect glyph.
    let mut mark = 0usize;
    // End offset of the previous token, for byte-adjacency checks.
    let mut prev_end = 0usize;
    let mut prev_kind = TokenKind::Eof;

    for token in &stream.tokens {
        let start = token.span.start;
        match token.kind {
            TokenKind::Dot => {
                state = match state {
                    State::AfterReceiver => {
                        mark = start;
                        State::AfterMethodDot
                    }
                    State::ReceiverStar if start == mark + 1 => {
                        // Declaration head `*.`: splice the stand-in name.
                        splice(&mut buf, mark, method::SCALAR_MUL_STUB);
                        State::Boring
                    }
                    _ if prev_kind == TokenKind::Star && start == prev_end => {
                        // Use site `*.`: drop the dot, leaving a plain `*`
                        // whose original bytes the rewriter will inspect.
                        buf[start] = b' ';
                        State::Boring
                    }
                    _ => {
                        mark = start;
                        State::AfterDot
                    }
                };
            }

            TokenKind::Plus | TokenKind::Minus | TokenKind::PlusEq => {
                state = match state {
                    State::AfterDot if start == mark + 1 => {
                        buf[mark] = b' ';
                        State::Boring
                    }
                    State::AfterMethodDot if start == mark + 1 => {
                        let name = match token.kind {
                            TokenKind::Plus => method::ADD,
                            TokenKind::Minus => method::SUB,
                            _ => method::ADD_ASSIGN,
                        };
                        splice(&mut buf, mark, name);
                        State::Boring
                    }
                    State::InReceiver => State::InReceiver,
                    _ => State::Boring,
                };
            }

            TokenKind::Func => state = State::AfterFunc,

            TokenKind::LParen => {
                state = if state == State::AfterFunc {
                    State::InReceiver
                } else {
                    State::Boring
                };
            }

            TokenKind::RParen => {
                state = if state == State::InReceiver {
                    State::AfterReceiver
                } else {
                    State::Boring
                };
            }

            TokenKind::Star => {
                state = match state {
                    State::AfterReceiver => {
                        mark = start;
                        State::ReceiverStar
                    }
                    State::InReceiver => State::InReceiver,
                    _ => State::Boring,
                };
            }

            TokenKind::Eof => {}

            _ => {
                if state != State::InReceiver {
                    state = State::Boring;
                }
            }
        }
        prev_end = token.span.end;
        prev_kind = token.kind;
    }

    debug_assert_eq!(buf.len(), source.len());
    buf
}

fn splice(buf: &mut [u8], at: usize, name: &str) {
    buf[at..at + name.len()].copy_from_slice(name.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(source: &str) -> String {
        String::from_utf8(classify(source)).unwrap()
    }

    #[test]
    fn test_plain_source_unchanged() {
        let src = "package main\n\nfunc main() {\n\tx := 1 + 2\n}\n";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_length_preserved() {
        for src in [
            "",
            "a .+ b",
            "func (a Vec) .+ (b Vec) Vec { return a }",
            "x .+= y\n2 *. x",
            "weird .+ .+ tokens",
        ] {
            assert_eq!(classify(src).len(), src.len());
        }
    }

    #[test]
    fn test_use_site_add() {
        assert_eq!(classified("a .+ b"), "a  + b");
    }

    #[test]
    fn test_use_site_sub() {
        assert_eq!(classified("a .- b"), "a  - b");
    }

    #[test]
    fn test_use_site_add_assign() {
        assert_eq!(classified("a .+= b"), "a  += b");
    }

    #[test]
    fn test_use_site_scalar_mul() {
        assert_eq!(classified("2 *. x"), "2 *  x");
    }

    #[test]
    fn test_use_site_without_space() {
        assert_eq!(classified("a.+b"), "a +b");
    }

    #[test]
    fn test_declaration_add() {
        assert_eq!(
            classified("func (a Vec) .+ (b Vec) Vec {}"),
            "func (a Vec) P_ (b Vec) Vec {}"
        );
    }

    #[test]
    fn test_declaration_sub() {
        assert_eq!(
            classified("func (a Vec) .- (b Vec) Vec {}"),
            "func (a Vec) M_ (b Vec) Vec {}"
        );
    }

    #[test]
    fn test_declaration_add_assign() {
        assert_eq!(
            classified("func (a Vec) .+= (b Vec) {}"),
            "func (a Vec) PE_ (b Vec) {}"
        );
    }

    #[test]
    fn test_declaration_scalar_mul_gets_stub() {
        assert_eq!(
            classified("func (a Vec) *. (b float64) Vec {}"),
            "func (a Vec) S_ (b float64) Vec {}"
        );
    }

    #[test]
    fn test_pointer_receiver_survives() {
        assert_eq!(
            classified("func (a *Vec) .+ (b Vec) Vec {}"),
            "func (a *Vec) P_ (b Vec) Vec {}"
        );
    }

    #[test]
    fn test_plain_function_not_a_receiver() {
        // `func f(...)` never enters the receiver states.
        let src = "func f(a Vec) Vec { return a }";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_selector_untouched() {
        let src = "fmt.Println(a.b + c)";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_float_literal_untouched() {
        let src = "x := 1.5 + 0.25";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_spaced_glyph_falls_through() {
        // `. +` with a gap is not a dialect operator; the buffer is left
        // alone and the parser will reject it later.
        let src = "a . + b";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_glyph_in_comment_untouched() {
        let src = "// a .+ b stays put\nx := 1";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_glyph_in_string_untouched() {
        let src = "s := \"a .+ b\"";
        assert_eq!(classified(src), src);
    }

    #[test]
    fn test_nested_uses() {
        assert_eq!(
            classified("return a .+ (b .+ c) .- a"),
            "return a  + (b  + c)  - a"
        );
    }

    #[test]
    fn test_determinism() {
        let src = "func (a Vec) .+ (b Vec) Vec { return a .+ b }";
        assert_eq!(classify(src), classify(src));
    }
}
