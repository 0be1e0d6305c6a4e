//! NIT script language: lexer, parser, and a sequential runtime.
//!
//! A script is a list of tool calls, optionally bound to `$variables`:
//!
//! ```text
//! $hits = search(query="weather", limit=3)
//! notify(text=$hits)
//! ```
//!
//! Tool execution is delegated to a [`ToolExecutor`] supplied by the caller.

#![warn(missing_docs, clippy::pedantic)]

pub mod ast;
mod blocks;
mod error;
mod lexer;
mod parser;
mod runtime;
mod scope;
mod token;

/// Script block discovery inside model output.
pub use blocks::{ScriptBlock, find_blocks};
/// Error types raised while lexing, parsing, or running scripts.
pub use error::{
    LexError, LexResult, ParseError, ParseResult, RuntimeError, RuntimeResult, ScriptError,
};
/// Tokenizer entry point.
pub use lexer::tokenize;
/// Parser entry points.
pub use parser::{Parser, parse};
/// Runtime and the executor seam it calls through.
pub use runtime::{Runtime, ToolExecutor, execute_script};
/// Bounded variable scope.
pub use scope::{Scope, ScopeLimits, TRUNCATION_MARKER};
/// Token types produced by the lexer.
pub use token::{Number, Token, TokenKind};
