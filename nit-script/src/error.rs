//! Error types for script lexing, parsing, and execution.

use thiserror::Error;

/// Result alias for lexer operations.
pub type LexResult<T> = Result<T, LexError>;

/// Result alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Character-level failure while tokenizing a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error at line {line}, column {column}: {message}")]
pub struct LexError {
    /// Human-readable description of the failure.
    pub message: String,
    /// 1-based line of the offending character.
    pub line: usize,
    /// 1-based column of the offending character.
    pub column: usize,
    /// Script text the error refers to.
    pub source_text: Option<String>,
}

impl LexError {
    /// Renders a one-line diagnostic with a caret under the offending column.
    #[must_use]
    pub fn render(&self) -> String {
        render_diagnostic(
            "lex",
            &self.message,
            self.line,
            self.column,
            self.source_text.as_deref(),
        )
    }
}

/// Structural mismatch while parsing a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    /// Human-readable description naming the expected token kind.
    pub message: String,
    /// 1-based line of the unexpected token.
    pub line: usize,
    /// 1-based column of the unexpected token.
    pub column: usize,
    /// Script text the error refers to, when the parser was given it.
    pub source_text: Option<String>,
}

impl ParseError {
    /// Renders a one-line diagnostic with a caret under the offending column.
    #[must_use]
    pub fn render(&self) -> String {
        render_diagnostic(
            "parse",
            &self.message,
            self.line,
            self.column,
            self.source_text.as_deref(),
        )
    }
}

/// Failure surfaced by the injected tool executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The executor could not resolve or run the requested tool.
    #[error("tool `{name}` failed: {reason}")]
    Tool {
        /// Tool name as written in the script.
        name: String,
        /// Human-readable failure returned by the executor.
        reason: String,
    },
}

impl RuntimeError {
    /// Creates a tool failure for the supplied name.
    #[must_use]
    pub fn tool(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Tool {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Any failure produced while running a script end to end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// Tokenization failed.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// Parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A tool call failed during execution.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ScriptError {
    /// Renders the error, including a caret diagnostic for syntax errors.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Lex(err) => err.render(),
            Self::Parse(err) => err.render(),
            Self::Runtime(err) => err.to_string(),
        }
    }
}

fn render_diagnostic(
    kind: &str,
    message: &str,
    line: usize,
    column: usize,
    source: Option<&str>,
) -> String {
    let mut rendered = format!("NIT {kind} error at line {line}, column {column}: {message}");
    let target = source.and_then(|text| text.split('\n').nth(line.checked_sub(1)?));
    if let Some(target) = target {
        let gutter = format!("  {line} | ");
        let offset = gutter.chars().count() + column.saturating_sub(1);
        rendered.push('\n');
        rendered.push_str(&gutter);
        rendered.push_str(target.trim_end_matches('\r'));
        rendered.push('\n');
        rendered.push_str(&" ".repeat(offset));
        rendered.push('^');
    }
    rendered
}
