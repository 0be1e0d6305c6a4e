//! Hand-written lexer for NIT scripts.

use crate::error::{LexError, LexResult};
use crate::token::{Number, Token, TokenKind};

/// Tokenizes a NIT script.
///
/// The returned stream always ends with a [`TokenKind::Eof`] token.
///
/// # Errors
///
/// Returns [`LexError`] on any character outside the NIT alphabet, on an
/// unterminated string, or on a malformed number.
pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}

struct Lexer<'src> {
    source: &'src str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error_at(&self, message: impl Into<String>, line: usize, column: usize) -> LexError {
        LexError {
            message: message.into(),
            line,
            column,
            source_text: Some(self.source.to_owned()),
        }
    }

    fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let (line, column) = (self.line, self.column);

            if ch.is_whitespace() {
                self.advance();
                continue;
            }

            if ch == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            let kind = match ch {
                '$' => {
                    self.advance();
                    TokenKind::Variable(self.read_word())
                }
                '"' | '\'' => self.read_string(ch)?,
                '=' => {
                    self.advance();
                    TokenKind::Equals
                }
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                c if c.is_ascii_digit() => self.read_number()?,
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.read_word();
                    if word == "async" {
                        TokenKind::Async
                    } else {
                        TokenKind::Identifier(word)
                    }
                }
                other => {
                    return Err(self.error_at(
                        format!("unexpected character `{other}`"),
                        line,
                        column,
                    ));
                }
            };

            tokens.push(Token::new(kind, line, column));
        }

        tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
        Ok(tokens)
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            word.push(c);
            self.advance();
        }
        word
    }

    fn read_string(&mut self, quote: char) -> LexResult<TokenKind> {
        let (line, column) = (self.line, self.column);
        self.advance();

        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error_at("unterminated string", line, column)),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => return Err(self.error_at("unterminated string", line, column)),
                },
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::Str(value))
    }

    fn read_number(&mut self) -> LexResult<TokenKind> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_digit() || c == '.') {
                break;
            }
            text.push(c);
            self.advance();
        }

        let number = if text.contains('.') {
            text.parse::<f64>().ok().map(Number::Float)
        } else {
            // Integers too wide for i64 degrade to floats rather than failing.
            text.parse::<i64>()
                .map(Number::Integer)
                .or_else(|_| text.parse::<f64>().map(Number::Float))
                .ok()
        };

        number
            .map(TokenKind::Number)
            .ok_or_else(|| self.error_at(format!("malformed number `{text}`"), line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn tokenizes_assignment() {
        assert_eq!(
            kinds(r#"$a = foo(x=1, y="hi")"#),
            vec![
                TokenKind::Variable("a".into()),
                TokenKind::Equals,
                TokenKind::Identifier("foo".into()),
                TokenKind::LParen,
                TokenKind::Identifier("x".into()),
                TokenKind::Equals,
                TokenKind::Number(Number::Integer(1)),
                TokenKind::Comma,
                TokenKind::Identifier("y".into()),
                TokenKind::Equals,
                TokenKind::Str("hi".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reports_unexpected_character_position() {
        let err = tokenize("$v = 1 @ x").expect_err("should fail");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 8);
        assert!(err.render().contains('^'));
    }

    #[test]
    fn async_keyword_and_floats() {
        assert_eq!(
            kinds("async ping(t=0.5)"),
            vec![
                TokenKind::Async,
                TokenKind::Identifier("ping".into()),
                TokenKind::LParen,
                TokenKind::Identifier("t".into()),
                TokenKind::Equals,
                TokenKind::Number(Number::Float(0.5)),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes_and_single_quotes() {
        assert_eq!(
            kinds(r#"'a\nb\tc\'d' "q\"x""#),
            vec![
                TokenKind::Str("a\nb\tc'd".into()),
                TokenKind::Str("q\"x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_lines_across_strings_and_comments() {
        let tokens = tokenize("# leading comment\nfoo(a=\"x\ny\") bar").unwrap();
        let foo = &tokens[0];
        assert_eq!((foo.line, foo.column), (2, 1));
        let bar = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Identifier("bar".into()))
            .unwrap();
        assert_eq!((bar.line, bar.column), (3, 5));
    }

    #[test]
    fn unterminated_string_fails() {
        let err = tokenize("foo(a=\"open").expect_err("should fail");
        assert_eq!(err.column, 7);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn malformed_number_fails() {
        let err = tokenize("foo(a=1.2.3)").expect_err("should fail");
        assert!(err.message.contains("1.2.3"));
    }
}
