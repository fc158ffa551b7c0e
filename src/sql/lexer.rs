//! SQL Lexer (Tokenizer)
//!
//! This module converts statement strings into a stream of tokens, each
//! carrying the source text it was read from for error reporting.

use super::token::Token;
use crate::error::{Error, Result};

/// A token together with the raw text it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,
}

/// SQL Lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input, ending with `Token::Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Lexeme>> {
        let mut lexemes = Vec::new();

        loop {
            self.skip_trivia();
            let start = self.position;
            let token = self.next_token()?;
            let text: String = self.input[start..self.position].iter().collect();
            let done = token == Token::Eof;
            lexemes.push(Lexeme { token, text });
            if done {
                break;
            }
        }

        Ok(lexemes)
    }

    /// Get the next token from the input
    fn next_token(&mut self) -> Result<Token> {
        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        let single = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '.' => Some(Token::Dot),
            '*' => Some(Token::Asterisk),
            '=' => Some(Token::Eq),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match ch {
            '<' => {
                self.advance();
                match self.peek_current() {
                    Some('=') => {
                        self.advance();
                        Ok(Token::Lte)
                    }
                    Some('>') => {
                        self.advance();
                        Ok(Token::Neq)
                    }
                    _ => Ok(Token::Lt),
                }
            }
            '>' => {
                self.advance();
                if self.peek_current() == Some('=') {
                    self.advance();
                    return Ok(Token::Gte);
                }
                Ok(Token::Gt)
            }
            '!' => {
                self.advance();
                if self.peek_current() == Some('=') {
                    self.advance();
                    return Ok(Token::Neq);
                }
                Err(Error::syntax("unexpected character", "!"))
            }
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                match self.read_number()? {
                    Token::IntegerLiteral(n) => Ok(Token::IntegerLiteral(-n)),
                    Token::FloatLiteral(n) => Ok(Token::FloatLiteral(-n)),
                    other => Ok(other),
                }
            }
            '\'' | '"' => self.read_string(ch),
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c => Err(Error::syntax("unexpected character", c.to_string())),
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace and `--` line comments
    fn skip_trivia(&mut self) {
        loop {
            while !self.is_at_end() && self.current_char().is_whitespace() {
                self.advance();
            }
            if !self.is_at_end() && self.current_char() == '-' && self.peek_char() == Some('-') {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    /// Read a quoted string; the quotes are stripped and nothing is unescaped
    fn read_string(&mut self, quote: char) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();
        while !self.is_at_end() {
            let ch = self.current_char();
            self.advance();
            if ch == quote {
                return Ok(Token::StringLiteral(value));
            }
            value.push(ch);
        }

        let fragment: String = self.input[start_pos..].iter().collect();
        Err(Error::syntax("unterminated string literal", fragment))
    }

    /// Read a number: digits, optionally one decimal point followed by digits
    fn read_number(&mut self) -> Result<Token> {
        let start_pos = self.position;
        let mut value = String::new();
        let mut is_float = false;

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                if is_float {
                    // A second decimal point
                    while !self.is_at_end()
                        && (self.current_char().is_ascii_digit() || self.current_char() == '.')
                    {
                        self.advance();
                    }
                    let fragment: String = self.input[start_pos..self.position].iter().collect();
                    return Err(Error::syntax("invalid number", fragment));
                }
                is_float = true;
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let invalid = || {
            let fragment: String = self.input[start_pos..self.position].iter().collect();
            Error::syntax("invalid number", fragment)
        };

        if is_float {
            value
                .parse::<f64>()
                .map(Token::FloatLiteral)
                .map_err(|_| invalid())
        } else {
            value
                .parse::<i64>()
                .map(Token::IntegerLiteral)
                .map_err(|_| invalid())
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::from_keyword(&value).unwrap_or(Token::Identifier(value))
    }
}
