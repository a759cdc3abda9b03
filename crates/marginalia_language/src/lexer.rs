//! Lexer for program-mode templates.
//!
//! The lexer converts program text into a stream of tokens.

use crate::span::Span;
use crate::token::{ArithOp, CompareOp, Token, TokenKind};

/// Lexer for program-mode source.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '+' => self.single(TokenKind::Arith(ArithOp::Add)),
            '-' => self.single(TokenKind::Arith(ArithOp::Sub)),
            '*' => self.single(TokenKind::Arith(ArithOp::Mul)),
            '/' => self.single(TokenKind::Arith(ArithOp::Div)),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_angle(CompareOp::Lt, CompareOp::Le, CompareOp::NumLt, CompareOp::NumLe),
            '>' => self.scan_angle(CompareOp::Gt, CompareOp::Ge, CompareOp::NumGt, CompareOp::NumGe),
            '&' => self.scan_doubled('&', TokenKind::And),
            '|' => self.scan_doubled('|', TokenKind::Or),
            '#' => self.scan_comment(),
            '$' => self.scan_field(),
            '\'' | '"' => self.scan_string(c),
            c if c.is_ascii_digit() || c == '.' => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens ending in `Eof`.
    ///
    /// Comments are included in the output.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Consumes `expected` if it is next.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// `=`, `==`, `==#`
    fn scan_equals(&mut self) -> TokenKind {
        self.advance();
        if !self.eat('=') {
            return TokenKind::Assign;
        }
        if self.eat('#') {
            TokenKind::Compare(CompareOp::NumEq)
        } else {
            TokenKind::Compare(CompareOp::Eq)
        }
    }

    /// `!`, `!=`, `!=#`
    fn scan_bang(&mut self) -> TokenKind {
        self.advance();
        if !self.eat('=') {
            return TokenKind::Not;
        }
        if self.eat('#') {
            TokenKind::Compare(CompareOp::NumNe)
        } else {
            TokenKind::Compare(CompareOp::Ne)
        }
    }

    fn scan_angle(
        &mut self,
        strict: CompareOp,
        inclusive: CompareOp,
        num_strict: CompareOp,
        num_inclusive: CompareOp,
    ) -> TokenKind {
        self.advance();
        let op = match (self.eat('='), self.eat('#')) {
            (false, false) => strict,
            (true, false) => inclusive,
            (false, true) => num_strict,
            (true, true) => num_inclusive,
        };
        TokenKind::Compare(op)
    }

    fn scan_doubled(&mut self, c: char, kind: TokenKind) -> TokenKind {
        self.advance();
        if self.eat(c) {
            kind
        } else {
            TokenKind::Error(format!("expected '{c}{c}'"))
        }
    }

    /// Scans a comment starting with `#`.
    fn scan_comment(&mut self) -> TokenKind {
        self.advance();
        let start = self.position;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    /// Scans `$name` or `$$name`.
    fn scan_field(&mut self) -> TokenKind {
        self.advance();
        let raw = self.eat('$');
        let start = self.position;
        while self.peek_char().is_some_and(is_field_char) {
            self.advance();
        }
        let name = &self.source[start..self.position];
        if name.is_empty() && !raw {
            // A bare `$` is the value bound by `{field:'program'}`.
            TokenKind::Ident("$".into())
        } else if name.is_empty() {
            TokenKind::Error("expected a field name after '$$'".into())
        } else {
            TokenKind::Field {
                name: name.to_string(),
                raw,
            }
        }
    }

    /// Scans a string literal delimited by `quote`.
    ///
    /// Unknown escapes keep their backslash so regular expressions survive.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return TokenKind::String(text);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('\\') => text.push('\\'),
                        Some(c) if c == '\'' || c == '"' => text.push(c),
                        Some(c) => {
                            text.push('\\');
                            text.push(c);
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    }
                    self.advance();
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated string literal".into()),
            }
        }
    }

    /// Scans a number. The text is kept as written.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut has_dot = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.position];
        if text == "." {
            TokenKind::Error("unexpected character: .".into())
        } else {
            TokenKind::Number(text.to_string())
        }
    }

    /// Scans an identifier or keyword.
    fn scan_ident(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        let text = &self.source[start..self.position];
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | '@')
}
