//! Recursive-descent parser with one token of lookahead.
//!
//! ```text
//! pipeline   := statement* EOF
//! statement  := assignment | call
//! assignment := VARIABLE '=' call
//! call       := 'async'? IDENTIFIER '(' (arg (',' arg)*)? ')'
//! arg        := IDENTIFIER '=' value
//! value      := STRING | NUMBER | VARIABLE
//! ```

use std::collections::BTreeMap;
use std::mem;

use crate::ast::{Assignment, Call, Literal, Pipeline, Statement, ValueNode};
use crate::error::{ParseError, ParseResult};
use crate::token::{Token, TokenKind};

/// Parses a token stream without source text for diagnostics.
///
/// # Errors
///
/// Returns [`ParseError`] on the first structural mismatch.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Pipeline> {
    Parser::new(tokens).parse()
}

/// Parser over a token stream produced by [`crate::tokenize`].
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: Option<String>,
}

impl Parser {
    /// Creates a parser. A missing trailing EOF token is supplied.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, line, column));
        }
        Self {
            tokens,
            pos: 0,
            source: None,
        }
    }

    /// Attaches the script text so errors can render a caret diagnostic.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Parses the whole stream into a [`Pipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] naming the expected token kind.
    pub fn parse(mut self) -> ParseResult<Pipeline> {
        let mut statements = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            statements.push(self.statement()?);
        }
        Ok(Pipeline { statements })
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> ParseError {
        let found = self.peek();
        ParseError {
            message: format!("expected {expected}, found {}", found.kind.describe()),
            line: found.line,
            column: found.column,
            source_text: self.source.clone(),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if mem::discriminant(&self.peek().kind) == mem::discriminant(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(kind.describe()))
        }
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        if let TokenKind::Variable(_) = self.peek().kind {
            self.assignment().map(Statement::Assignment)
        } else {
            self.call().map(Statement::Call)
        }
    }

    fn assignment(&mut self) -> ParseResult<Assignment> {
        let TokenKind::Variable(target) = self.advance().kind else {
            return Err(self.error("variable"));
        };
        self.expect(&TokenKind::Equals)?;
        let call = self.call()?;
        Ok(Assignment { target, call })
    }

    fn call(&mut self) -> ParseResult<Call> {
        let is_async = if self.peek().kind == TokenKind::Async {
            self.advance();
            true
        } else {
            false
        };

        let tool_name = self.identifier()?;
        self.expect(&TokenKind::LParen)?;

        let mut args = BTreeMap::new();
        if self.peek().kind != TokenKind::RParen {
            loop {
                let name = self.identifier()?;
                self.expect(&TokenKind::Equals)?;
                let value = self.value()?;
                args.insert(name, value);

                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;

        Ok(Call::new(tool_name, args, is_async))
    }

    fn identifier(&mut self) -> ParseResult<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn value(&mut self) -> ParseResult<ValueNode> {
        let node = match &self.peek().kind {
            TokenKind::Str(value) => ValueNode::Literal(Literal::String(value.clone())),
            TokenKind::Number(value) => ValueNode::Literal(Literal::Number(*value)),
            TokenKind::Variable(name) => ValueNode::VariableRef(name.clone()),
            _ => return Err(self.error("value")),
        };
        self.advance();
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::token::Number;

    fn parse_source(source: &str) -> ParseResult<Pipeline> {
        Parser::new(tokenize(source).unwrap())
            .with_source(source)
            .parse()
    }

    #[test]
    fn counts_assignments_and_calls() {
        let pipeline = parse_source(
            "$a = search(query=\"cats\", limit=3)\nnotify(text=$a)\nasync $b = x()",
        );
        // `async` must precede the tool name, not the variable.
        assert!(pipeline.is_err());

        let pipeline = parse_source(
            "$a = search(query=\"cats\", limit=3)\nnotify(text=$a) async ping()\n$b = x()",
        )
        .unwrap();
        assert_eq!(pipeline.statements.len(), 4);
    }

    #[test]
    fn builds_call_nodes() {
        let pipeline = parse_source("$r = async fetch(url='u', retries=2, callback=\"done\")")
            .unwrap();
        let Statement::Assignment(assignment) = &pipeline.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(assignment.target, "r");
        let call = &assignment.call;
        assert_eq!(call.tool_name, "fetch");
        assert!(call.is_async);
        assert_eq!(call.callback.as_deref(), Some("done"));
        assert_eq!(
            call.args.get("retries"),
            Some(&ValueNode::Literal(Literal::Number(Number::Integer(2))))
        );
    }

    #[test]
    fn empty_input_is_empty_pipeline() {
        assert!(parse_source("  # nothing here\n").unwrap().statements.is_empty());
    }

    #[test]
    fn missing_paren_names_expected_token() {
        let err = parse_source("$var = tool_call(arg1='val'").expect_err("should fail");
        assert!(err.message.contains("expected `)`"), "{}", err.message);
        assert!(err.message.contains("end of input"));
        assert!(err.render().contains('^'));
    }

    #[test]
    fn positional_argument_is_rejected() {
        let err = parse_source("foo(\"bare\")").expect_err("should fail");
        assert!(err.message.contains("expected identifier"));
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn parse_without_eof_token_still_terminates() {
        let mut tokens = tokenize("ping()").unwrap();
        tokens.pop();
        let pipeline = parse(tokens).unwrap();
        assert_eq!(pipeline.statements.len(), 1);
    }
}
