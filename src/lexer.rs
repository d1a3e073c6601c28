// ABOUTME: Lexer module producing a lazy token stream from source text

use crate::token::{lookup_ident, Token, TokenKind};

/// Single-pass lexer over the raw bytes of the source.
///
/// Tokens are produced on demand via [`Lexer::next_token`]; nothing is
/// buffered beyond a one-byte lookahead.
pub struct Lexer {
    input: Vec<u8>,
    /// Index of the byte currently under examination.
    position: usize,
    /// Index of the next byte to read.
    read_position: usize,
    /// Byte under examination; 0 at end of input.
    ch: u8,
    line: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer {
            input: input.as_bytes().to_vec(),
            position: 0,
            read_position: 0,
            ch: 0,
            line: 1,
        };
        lexer.read_char();
        lexer
    }

    /// The 1-based line the lexer is currently on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the next token in the input, consuming it.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let tok = match self.ch {
            b'+' => Token::new(TokenKind::Plus, "+"),
            b'-' => Token::new(TokenKind::Minus, "-"),
            b'*' => {
                if self.peek_char() == b'*' {
                    self.read_char();
                    Token::new(TokenKind::Pow, "**")
                } else {
                    Token::new(TokenKind::Asterisk, "*")
                }
            }
            b'/' => Token::new(TokenKind::Slash, "/"),
            b'%' => Token::new(TokenKind::Percent, "%"),
            b'!' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::NotEq, "!=")
                } else {
                    Token::new(TokenKind::Bang, "!")
                }
            }
            b'<' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Lte, "<=")
                } else {
                    Token::new(TokenKind::Lt, "<")
                }
            }
            b'>' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Gte, ">=")
                } else {
                    Token::new(TokenKind::Gt, ">")
                }
            }
            b'=' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Eq, "==")
                } else {
                    Token::new(TokenKind::Assign, "=")
                }
            }
            b';' => Token::new(TokenKind::Semicolon, ";"),
            b':' => Token::new(TokenKind::Colon, ":"),
            b',' => Token::new(TokenKind::Comma, ","),
            b'.' => Token::new(TokenKind::Dot, "."),
            b'(' => Token::new(TokenKind::LParen, "("),
            b')' => Token::new(TokenKind::RParen, ")"),
            b'{' => Token::new(TokenKind::LBrace, "{"),
            b'}' => Token::new(TokenKind::RBrace, "}"),
            b'[' => Token::new(TokenKind::LBracket, "["),
            b']' => Token::new(TokenKind::RBracket, "]"),
            0 => Token::new(TokenKind::Eof, ""),
            b'"' => {
                let literal = self.read_string();
                return Token::new(TokenKind::Str, literal);
            }
            ch if is_letter(ch) => {
                let literal = self.read_identifier();
                let kind = lookup_ident(&literal);
                return Token::new(kind, literal);
            }
            ch if ch.is_ascii_digit() => {
                return self.read_number();
            }
            other => Token::new(TokenKind::Illegal, (other as char).to_string()),
        };

        self.read_char();
        tok
    }

    fn read_char(&mut self) {
        if self.read_position >= self.input.len() {
            self.ch = 0;
        } else {
            self.ch = self.input[self.read_position];
        }
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, b' ' | b'\t' | b'\n' | b'\r') {
            if self.ch == b'\n' {
                self.line += 1;
            }
            self.read_char();
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while is_letter(self.ch) || self.ch.is_ascii_digit() {
            self.read_char();
        }
        self.slice(start, self.position)
    }

    /// Reads an integer or float. A number with more than one dot is
    /// consumed up to the next whitespace or `;` and reported as a single
    /// illegal token preserving the offending text.
    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut dot_count = 0;

        while self.ch.is_ascii_digit() || self.ch == b'.' {
            if self.ch == b'.' {
                dot_count += 1;
            }

            if dot_count > 1 {
                let mut invalid = self.slice(start, self.position);
                while !matches!(self.ch, b' ' | b'\t' | b'\n' | b'\r' | b';' | 0) {
                    invalid.push(self.ch as char);
                    self.read_char();
                }
                return Token::new(TokenKind::Illegal, invalid);
            }

            self.read_char();
        }

        let literal = self.slice(start, self.position);
        if dot_count == 1 {
            Token::new(TokenKind::Float, literal)
        } else {
            Token::new(TokenKind::Int, literal)
        }
    }

    /// Reads a string literal without its surrounding quotes. There are no
    /// escape sequences; an unterminated string stops at end of input.
    fn read_string(&mut self) -> String {
        let start = self.position + 1;
        loop {
            self.read_char();
            if self.ch == b'"' || self.ch == 0 {
                break;
            }
        }
        let end = self.position;
        self.read_char();
        self.slice(start, end)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.input.len());
        let start = start.min(end);
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}
