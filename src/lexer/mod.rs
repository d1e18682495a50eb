mod token;

pub use token::{Literal, Token, TokenKind};

use crate::error::MusError;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("class", TokenKind::Class);
        m.insert("fun", TokenKind::Fun);
        m.insert("var", TokenKind::Var);
        m.insert("if", TokenKind::If);
        m.insert("else", TokenKind::Else);
        m.insert("elif", TokenKind::Elif);
        m.insert("while", TokenKind::While);
        m.insert("for", TokenKind::For);
        m.insert("in", TokenKind::In);
        m.insert("return", TokenKind::Return);
        m.insert("this", TokenKind::This);
        m.insert("super", TokenKind::Super);
        m.insert("extends", TokenKind::Extends);
        m.insert("new", TokenKind::New);
        m
    };
}

/// Hand-rolled single-pass lexer: one character of lookahead via `Peekable`,
/// tracking `(line, column)` as it goes.
pub struct Lexer<'a> {
    source: &'a str,
    iterator: Peekable<Chars<'a>>,
    start: usize,
    current: usize,
    line: usize,
    column: usize,
    start_column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            source,
            iterator: source.chars().peekable(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_column: 1,
            tokens: vec![],
        }
    }

    pub fn lex(mut self) -> Result<Vec<Token>, MusError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "", None, self.line, self.column));
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.iterator.next().expect("advance past end of source");
        self.current += c.len_utf8();
        self.column += 1;
        c
    }

    fn peek(&mut self) -> char {
        *self.iterator.peek().unwrap_or(&'\0')
    }

    fn peek_next(&self) -> char {
        self.source[self.current..].chars().nth(1).unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_literal(kind, None);
    }

    fn add_token_literal(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let lexeme = self.lexeme().to_owned();
        self.tokens
            .push(Token::new(kind, lexeme, literal, self.line, self.start_column));
    }

    fn scan_token(&mut self) -> Result<(), MusError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '%' => self.add_token(TokenKind::Percent),
            ';' => self.add_token(TokenKind::Semicolon),
            '=' => {
                if self.matches('=') {
                    self.add_token(TokenKind::Equals);
                } else if self.matches('>') {
                    self.add_token(TokenKind::Arrow);
                } else {
                    self.add_token(TokenKind::Assign);
                }
            }
            '!' => {
                if self.matches('=') {
                    self.add_token(TokenKind::NotEquals);
                } else {
                    self.add_token(TokenKind::Bang);
                }
            }
            '>' => {
                if self.matches('=') {
                    self.add_token(TokenKind::GreaterEqual);
                } else {
                    self.add_token(TokenKind::Greater);
                }
            }
            '<' => {
                if self.matches('=') {
                    self.add_token(TokenKind::LessEqual);
                } else {
                    self.add_token(TokenKind::Less);
                }
            }
            '&' => {
                if self.matches('&') {
                    self.add_token(TokenKind::And);
                } else {
                    return Err(self.error(format!("Unexpected character: {c}")));
                }
            }
            '|' => {
                if self.matches('|') {
                    self.add_token(TokenKind::Or);
                } else {
                    return Err(self.error(format!("Unexpected character: {c}")));
                }
            }
            '-' => {
                if self.matches('-') {
                    self.skip_line_comment();
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '/' => {
                if self.matches('/') {
                    self.skip_line_comment();
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            c => return Err(self.error(format!("Unexpected character: {c}"))),
        }

        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        match KEYWORDS.get(text) {
            Some(kind) => self.add_token(*kind),
            None if text == "true" || text == "false" => {
                self.add_token_literal(TokenKind::Boolean, Some(Literal::Boolean(text == "true")))
            }
            None => self.add_token(TokenKind::Identifier),
        }
    }

    fn number(&mut self) -> Result<(), MusError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A fractional part is recognized but, per the value model, truncated: the
        // digits after the dot are consumed and discarded.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let digits: String = self.lexeme().chars().take_while(|c| c.is_ascii_digit()).collect();
        let value: i64 = digits
            .parse()
            .map_err(|_| self.error(format!("Integer literal '{digits}' is too large")))?;
        self.add_token_literal(TokenKind::Integer, Some(Literal::Integer(value)));
        Ok(())
    }

    fn string(&mut self) -> Result<(), MusError> {
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(self.error_at("Unterminated string", self.line, self.start_column));
            }
            let c = self.peek();
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            }
            self.advance();
            if c == '\\' {
                let escaped = self.peek();
                self.advance();
                match escaped {
                    '"' => value.push('"'),
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\\' => value.push('\\'),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(c);
            }
        }

        // closing quote
        self.advance();
        self.add_token_literal(TokenKind::String, Some(Literal::String(value)));
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> MusError {
        self.error_at(message, self.line, self.column)
    }

    fn error_at(&self, message: impl Into<String>, line: usize, column: usize) -> MusError {
        MusError::lexer(message, (line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .lex()
            .expect("lex should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_punctuation_and_two_char_operators() {
        let kinds = kinds("() {} [] , . ; => == != <= >= && ||");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Semicolon,
                TokenKind::Arrow,
                TokenKind::Equals,
                TokenKind::NotEquals,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_never_become_identifiers() {
        let tokens = Lexer::new("class extends super this new").lex().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Class);
        assert_eq!(tokens[1].kind, TokenKind::Extends);
        assert_eq!(tokens[2].kind, TokenKind::Super);
        assert_eq!(tokens[3].kind, TokenKind::This);
        assert_eq!(tokens[4].kind, TokenKind::New);
    }

    #[test]
    fn booleans_carry_a_literal() {
        let tokens = Lexer::new("true false").lex().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Boolean(true)));
        assert_eq!(tokens[1].literal, Some(Literal::Boolean(false)));
    }

    #[test]
    fn fractional_literal_is_truncated_to_integer() {
        let tokens = Lexer::new("3.14").lex().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Integer(3)));
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = Lexer::new(r#""a\nb\t\"c\"\\""#).lex().unwrap();
        assert_eq!(
            tokens[0].literal,
            Some(Literal::String("a\nb\t\"c\"\\".to_string()))
        );
    }

    #[test]
    fn both_comment_styles_run_to_end_of_line() {
        let kinds = kinds("1 -- a comment\n2 // another\n3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_is_a_lexer_error() {
        let err = Lexer::new("\"abc").lex().unwrap_err();
        assert!(matches!(err, MusError::Lexer { .. }));
    }

    #[test]
    fn unknown_character_is_a_lexer_error() {
        let err = Lexer::new("@").lex().unwrap_err();
        assert!(matches!(err, MusError::Lexer { .. }));
    }

    #[test]
    fn integer_literal_overflowing_i64_is_a_lexer_error_not_a_panic() {
        let err = Lexer::new("99999999999999999999999999999999").lex().unwrap_err();
        assert!(matches!(err, MusError::Lexer { .. }));
    }
}
