//! Token definitions produced by the lexer.

use std::fmt;

/// Numeric literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Literal without a decimal point.
    Integer(i64),
    /// Literal containing a decimal point.
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Kind of a token, carrying its value where it has one.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Tool or argument name.
    Identifier(String),
    /// `$name` variable reference, stored without the `$`.
    Variable(String),
    /// Quoted string with escapes resolved.
    Str(String),
    /// Integer or float literal.
    Number(Number),
    /// `=`
    Equals,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// The `async` keyword.
    Async,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns a short description of the kind, ignoring any carried value.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "identifier",
            Self::Variable(_) => "variable",
            Self::Str(_) => "string",
            Self::Number(_) => "number",
            Self::Equals => "`=`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::Comma => "`,`",
            Self::Async => "`async`",
            Self::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "IDENTIFIER({name})"),
            Self::Variable(name) => write!(f, "VARIABLE({name})"),
            Self::Str(value) => write!(f, "STRING({value})"),
            Self::Number(value) => write!(f, "NUMBER({value})"),
            Self::Equals => f.write_str("EQUALS"),
            Self::LParen => f.write_str("LPAREN"),
            Self::RParen => f.write_str("RPAREN"),
            Self::Comma => f.write_str("COMMA"),
            Self::Async => f.write_str("ASYNC"),
            Self::Eof => f.write_str("EOF"),
        }
    }
}

/// Token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Kind and value.
    pub kind: TokenKind,
    /// Line of the first character.
    pub line: usize,
    /// Column of the first character.
    pub column: usize,
}

impl Token {
    /// Creates a token at the given position.
    #[must_use]
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
