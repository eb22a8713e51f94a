//! dotgo: a source-to-source translator for a small Go operator dialect
//!
//! The dialect adds four infix operators (`.+`, `.-`, `.+=`, `*.`) that
//! desugar to ordinary method calls. Translation runs as a pipeline:
//!
//! ```text
//! dialect source
//!       |
//!       v
//! [classify]  neutralize the glyphs, byte for byte
//!       |
//!       v
//! [parser]    standard grammar over the neutralized buffer
//!       |
//!       v
//! [rewrite]   turn neutralized operators back into method calls,
//!       |     consulting the original bytes
//!       v
//! [inline]    optional function inlining
//!       |
//!       v
//! [printer]   canonical Go source out
//! ```
//!
//! The [`driver`] module wires the stages together and drives the external
//! Go compiler and linker over the result.

pub mod ast;
pub mod classify;
pub mod driver;
pub mod fold;
pub mod inline;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod rewrite;
pub mod span;
pub mod token;

/// Version of the translator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension of the source files the translator consumes
pub const FILE_EXTENSION: &str = "go";
