//! Parser for program-mode templates.
//!
//! The parser converts a stream of tokens into a [`Program`].

use marginalia_foundation::{Error, Result};

use crate::ast::{Block, Branch, Expr, Program};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{ArithOp, Token, TokenKind};

/// Parser for program-mode source.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Source text (for error messages).
    source: &'src str,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = Self::next_significant(&mut lexer);
        Self {
            lexer,
            current,
            source,
        }
    }

    /// Parses a whole program: `;`-separated statements.
    ///
    /// # Errors
    /// Returns an error if the source cannot be parsed.
    pub fn parse_program(&mut self) -> Result<Program> {
        let block = self.parse_block()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of program"));
        }
        Ok(block)
    }

    /// Parses a single expression and requires the input to end after it.
    ///
    /// # Errors
    /// Returns an error if the source cannot be parsed.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expr)
    }

    fn next_significant(lexer: &mut Lexer<'_>) -> Token {
        loop {
            let token = lexer.next_token();
            if !matches!(token.kind, TokenKind::Comment(_)) {
                return token;
            }
        }
    }

    fn advance(&mut self) -> Token {
        let next = Self::next_significant(&mut self.lexer);
        std::mem::replace(&mut self.current, next)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.name()))
        }
    }

    fn error(&self, message: &str) -> Error {
        let span = self.current.span;
        let line = self
            .source
            .lines()
            .nth(span.line.saturating_sub(1) as usize)
            .unwrap_or("");
        let message = if line.is_empty() {
            message.to_string()
        } else {
            format!("{message} in '{}'", line.trim())
        };
        Error::parse(message, span.line, span.column)
    }

    fn unexpected(&self, wanted: &str) -> Error {
        match &self.current.kind {
            TokenKind::Error(msg) => self.error(msg),
            found => self.error(&format!("expected {wanted}, found {}", found.name())),
        }
    }

    /// Statements up to a block terminator.
    fn parse_block(&mut self) -> Result<Block> {
        let mut statements = Vec::new();
        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if matches!(
                self.current.kind,
                TokenKind::Eof
                    | TokenKind::Elif
                    | TokenKind::Else
                    | TokenKind::Fi
                    | TokenKind::Rof
                    | TokenKind::RParen
            ) {
                break;
            }
            statements.push(self.parse_expr()?);
            if !self.check(&TokenKind::Semicolon) {
                break;
            }
        }
        Ok(Block::new(statements))
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            let span = left.span().to(right.span());
            left = Expr::Or(Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            let span = left.span().to(right.span());
            left = Expr::And(Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Not) {
            let start = self.advance().span;
            let operand = self.parse_not()?;
            let span = start.to(operand.span());
            return Ok(Expr::Not(Box::new(operand), span));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        match self.current.kind {
            TokenKind::Compare(op) => {
                self.advance();
                let right = self.parse_additive()?;
                let span = left.span().to(right.span());
                Ok(Expr::Compare {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                })
            }
            TokenKind::In => {
                self.advance();
                let value = self.parse_additive()?;
                let span = left.span().to(value.span());
                Ok(Expr::Matches {
                    pattern: Box::new(left),
                    value: Box::new(value),
                    span,
                })
            }
            _ => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        while let TokenKind::Arith(op @ (ArithOp::Add | ArithOp::Sub)) = self.current.kind {
            self.advance();
            let right = self.parse_multiplicative()?;
            left = arith(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let TokenKind::Arith(op @ (ArithOp::Mul | ArithOp::Div)) = self.current.kind {
            self.advance();
            let right = self.parse_unary()?;
            left = arith(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.current.kind {
            TokenKind::Arith(ArithOp::Sub) => {
                let start = self.advance().span;
                let operand = self.parse_unary()?;
                let span = start.to(operand.span());
                // Negative number literals stay literals: substr(x, 1, -1).
                if let Expr::Literal(text, _) = &operand {
                    if is_number(text) {
                        return Ok(Expr::Literal(format!("-{text}"), span));
                    }
                }
                Ok(Expr::Negate(Box::new(operand), span))
            }
            TokenKind::Arith(ArithOp::Add) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::String(s) | TokenKind::Number(s) => {
                self.advance();
                Ok(Expr::Literal(s, token.span))
            }
            TokenKind::Field { name, raw } => {
                self.advance();
                Ok(Expr::Field {
                    name,
                    raw,
                    span: token.span,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                match self.current.kind {
                    TokenKind::Assign => {
                        self.advance();
                        let value = self.parse_expr()?;
                        let span = token.span.to(value.span());
                        Ok(Expr::Assign {
                            name,
                            value: Box::new(value),
                            span,
                        })
                    }
                    TokenKind::LParen => self.parse_call(name, token.span),
                    _ => Ok(Expr::Variable(name, token.span)),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_block()?;
                let end = self.expect(&TokenKind::RParen)?.span;
                let span = token.span.to(end);
                Ok(single_or_block(inner, span))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_call(&mut self, name: String, start: Span) -> Result<Expr> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RParen)?.span;
        Ok(Expr::Call {
            name,
            args,
            span: start.to(end),
        })
    }

    fn parse_if(&mut self) -> Result<Expr> {
        let start = self.expect(&TokenKind::If)?.span;
        let mut branches = Vec::new();
        loop {
            let condition = self.parse_expr()?;
            self.expect(&TokenKind::Then)?;
            let body = self.parse_block()?;
            branches.push(Branch { condition, body });
            if self.check(&TokenKind::Elif) {
                self.advance();
            } else {
                break;
            }
        }
        let otherwise = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        let end = self.expect(&TokenKind::Fi)?.span;
        Ok(Expr::If {
            branches,
            otherwise,
            span: start.to(end),
        })
    }

    fn parse_for(&mut self) -> Result<Expr> {
        let start = self.expect(&TokenKind::For)?.span;
        let var = match &self.current.kind {
            TokenKind::Ident(name) => name.clone(),
            _ => return Err(self.unexpected("a loop variable")),
        };
        self.advance();
        self.expect(&TokenKind::In)?;
        let list = self.parse_additive()?;
        let separator = if self.check(&TokenKind::Separator) {
            self.advance();
            Some(Box::new(self.parse_additive()?))
        } else {
            None
        };
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_block()?;
        let end = self.expect(&TokenKind::Rof)?.span;
        Ok(Expr::For {
            var,
            list: Box::new(list),
            separator,
            body,
            span: start.to(end),
        })
    }
}

fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Arith {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// A parenthesized block of one expression is just that expression; longer
/// blocks become `if '1' then ... fi` so their value is the last statement's.
fn single_or_block(mut block: Block, span: Span) -> Expr {
    if block.statements.len() == 1 {
        if let Some(expr) = block.statements.pop() {
            return expr;
        }
    }
    Expr::If {
        branches: vec![Branch {
            condition: Expr::Literal("1".into(), span),
            body: block,
        }],
        otherwise: None,
        span,
    }
}

/// Parses program source (without the `program:` prefix).
///
/// # Errors
/// Returns an error if the source cannot be parsed.
pub fn parse_program(source: &str) -> Result<Program> {
    Parser::new(source).parse_program()
}
