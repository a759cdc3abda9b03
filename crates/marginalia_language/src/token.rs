//! Tokens of the program-mode template language.

use std::fmt;

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the text this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Comparison operators. String comparisons are lexical, the `#` forms numeric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==#`
    NumEq,
    /// `!=#`
    NumNe,
    /// `<#`
    NumLt,
    /// `>#`
    NumGt,
    /// `<=#`
    NumLe,
    /// `>=#`
    NumGe,
}

impl CompareOp {
    /// Returns true for the numeric (`#`) forms.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::NumEq | Self::NumNe | Self::NumLt | Self::NumGt | Self::NumLe | Self::NumGe
        )
    }

    /// Applies the operator to an ordering.
    #[must_use]
    pub const fn accepts(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq | Self::NumEq => matches!(ordering, Equal),
            Self::Ne | Self::NumNe => !matches!(ordering, Equal),
            Self::Lt | Self::NumLt => matches!(ordering, Less),
            Self::Gt | Self::NumGt => matches!(ordering, Greater),
            Self::Le | Self::NumLe => !matches!(ordering, Greater),
            Self::Ge | Self::NumGe => !matches!(ordering, Less),
        }
    }

    /// The operator's source text.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::NumEq => "==#",
            Self::NumNe => "!=#",
            Self::NumLt => "<#",
            Self::NumGt => ">#",
            Self::NumLe => "<=#",
            Self::NumGe => ">=#",
        }
    }
}

/// Arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl ArithOp {
    /// The operator's source text.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Token types for program mode.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:` (ends a `for` header)
    Colon,

    // Operators
    /// `=`
    Assign,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// Comparison operator
    Compare(CompareOp),
    /// Arithmetic operator
    Arith(ArithOp),

    // Literals and names
    /// String literal, quotes removed and escapes processed
    String(String),
    /// Number literal, kept as written
    Number(String),
    /// Identifier (variable or function name)
    Ident(String),
    /// `$name` (formatted) or `$$name` (raw) field reference
    Field {
        /// Field lookup key.
        name: String,
        /// True for `$$`.
        raw: bool,
    },

    // Keywords
    /// `if`
    If,
    /// `then`
    Then,
    /// `elif`
    Elif,
    /// `else`
    Else,
    /// `fi`
    Fi,
    /// `for`
    For,
    /// `in` (also the regex-match operator)
    In,
    /// `separator`
    Separator,
    /// `rof`
    Rof,

    // Special
    /// `#` comment through end of line
    Comment(String),
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns the keyword token for an identifier, if it is one.
    #[must_use]
    pub fn keyword(ident: &str) -> Option<Self> {
        Some(match ident {
            "if" => Self::If,
            "then" => Self::Then,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "fi" => Self::Fi,
            "for" => Self::For,
            "in" => Self::In,
            "separator" => Self::Separator,
            "rof" => Self::Rof,
            _ => return None,
        })
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::Comma => "','".into(),
            Self::Semicolon => "';'".into(),
            Self::Colon => "':'".into(),
            Self::Assign => "'='".into(),
            Self::And => "'&&'".into(),
            Self::Or => "'||'".into(),
            Self::Not => "'!'".into(),
            Self::Compare(op) => format!("'{}'", op.symbol()),
            Self::Arith(op) => format!("'{}'", op.symbol()),
            Self::String(_) => "string".into(),
            Self::Number(_) => "number".into(),
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::Field { .. } => "field reference".into(),
            Self::If => "'if'".into(),
            Self::Then => "'then'".into(),
            Self::Elif => "'elif'".into(),
            Self::Else => "'else'".into(),
            Self::Fi => "'fi'".into(),
            Self::For => "'for'".into(),
            Self::In => "'in'".into(),
            Self::Separator => "'separator'".into(),
            Self::Rof => "'rof'".into(),
            Self::Comment(_) => "comment".into(),
            Self::Eof => "end of input".into(),
            Self::Error(_) => "error".into(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
