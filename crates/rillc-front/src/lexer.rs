//! Hand-written lexer.

use rillc_util::Symbol;

use crate::cursor::Cursor;
use crate::error::FrontError;
use crate::token::{Token, TokenKind};

/// Lex `source` to a token vector ending in `Eof`.
pub fn lex(source: &str) -> Result<Vec<Token>, FrontError> {
    let mut lexer = Lexer { cursor: Cursor::new(source) };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl Lexer<'_> {
    fn next_token(&mut self) -> Result<Token, FrontError> {
        self.skip_trivia();
        let location = self.cursor.location();
        if self.cursor.at_end() {
            return Ok(Token { kind: TokenKind::Eof, location });
        }

        let current = self.cursor.current();
        if current.is_ascii_digit() {
            return self.number();
        }
        if is_identifier_start(current) {
            return Ok(self.identifier_or_keyword());
        }

        self.cursor.advance();
        let kind = match current {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Equal,
            '-' => {
                if self.cursor.current() == '>' {
                    self.cursor.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            found => return Err(FrontError::UnexpectedChar { found, location }),
        };
        Ok(Token { kind, location })
    }

    /// Whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.current() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.advance();
                }
                '/' if self.cursor.peek(1) == '/' => {
                    while !self.cursor.at_end() && self.cursor.current() != '\n' {
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn number(&mut self) -> Result<Token, FrontError> {
        let location = self.cursor.location();
        let start = self.cursor.position();
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let value: i64 = text
            .parse()
            .map_err(|_| FrontError::IntegerOutOfRange { location })?;
        Ok(Token { kind: TokenKind::Integer(value), location })
    }

    fn identifier_or_keyword(&mut self) -> Token {
        let location = self.cursor.location();
        let start = self.cursor.position();
        while is_identifier_continue(self.cursor.current()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let kind = match text {
            "fn" => TokenKind::Fn,
            "const" => TokenKind::Const,
            "return" => TokenKind::Return,
            "nil" => TokenKind::Nil,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "i32" => TokenKind::I32,
            "bool" => TokenKind::Bool,
            _ => TokenKind::Identifier(Symbol::intern(text)),
        };
        Token { kind, location }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
