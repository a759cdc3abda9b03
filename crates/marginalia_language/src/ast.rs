//! Abstract syntax tree for program-mode templates.
//!
//! A parsed program is a call tree: every builtin or user function the
//! template names appears as an [`Expr::Call`] node.

use crate::span::Span;
use crate::token::{ArithOp, CompareOp};

/// A sequence of statements. Its value is the value of the last statement.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    /// The statements, in order.
    pub statements: Vec<Expr>,
}

impl Block {
    /// Creates a block from statements.
    #[must_use]
    pub fn new(statements: Vec<Expr>) -> Self {
        Self { statements }
    }

    /// Returns true if the block has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A complete parsed program.
pub type Program = Block;

/// One `if`/`elif` arm.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    /// The condition. Non-empty results are true.
    pub condition: Expr,
    /// The statements run when the condition holds.
    pub body: Block,
}

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// String or number literal.
    Literal(String, Span),
    /// Variable read.
    Variable(String, Span),
    /// `$name` or `$$name`.
    Field {
        /// Field lookup key.
        name: String,
        /// True for `$$name`, which skips display formatting.
        raw: bool,
        /// Source location.
        span: Span,
    },
    /// `name = value`
    Assign {
        /// Variable name.
        name: String,
        /// Assigned expression.
        value: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `name(args...)`
    Call {
        /// Function name.
        name: String,
        /// Argument expressions, in order.
        args: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// `left && right`, short-circuit.
    And(Box<Expr>, Box<Expr>, Span),
    /// `left || right`, short-circuit.
    Or(Box<Expr>, Box<Expr>, Span),
    /// `!operand`
    Not(Box<Expr>, Span),
    /// `-operand`
    Negate(Box<Expr>, Span),
    /// Comparison.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// Arithmetic.
    Arith {
        /// Operator.
        op: ArithOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `pattern in value`: case-insensitive regex search.
    Matches {
        /// The regular expression.
        pattern: Box<Expr>,
        /// The text searched.
        value: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `if c then ... elif c then ... else ... fi`
    If {
        /// `if` and `elif` arms, in order.
        branches: Vec<Branch>,
        /// The `else` arm.
        otherwise: Option<Block>,
        /// Source location.
        span: Span,
    },
    /// `for v in list [separator s]: ... rof`
    For {
        /// Loop variable.
        var: String,
        /// The list expression.
        list: Box<Expr>,
        /// Separator expression, `,` when absent.
        separator: Option<Box<Expr>>,
        /// Loop body.
        body: Block,
        /// Source location.
        span: Span,
    },
}

impl Expr {
    /// Returns the source span of this node.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Literal(_, s)
            | Self::Variable(_, s)
            | Self::And(_, _, s)
            | Self::Or(_, _, s)
            | Self::Not(_, s)
            | Self::Negate(_, s)
            | Self::Field { span: s, .. }
            | Self::Assign { span: s, .. }
            | Self::Call { span: s, .. }
            | Self::Compare { span: s, .. }
            | Self::Arith { span: s, .. }
            | Self::Matches { span: s, .. }
            | Self::If { span: s, .. }
            | Self::For { span: s, .. } => *s,
        }
    }

    /// Returns the literal text if this is a literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s, _) => Some(s),
            _ => None,
        }
    }

    /// Visits this node and every node beneath it, depth first.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Self::Literal(..) | Self::Variable(..) | Self::Field { .. } => {}
            Self::Assign { value, .. } => value.walk(f),
            Self::Call { args, .. } => args.iter().for_each(|a| a.walk(f)),
            Self::And(l, r, _)
            | Self::Or(l, r, _)
            | Self::Compare {
                left: l, right: r, ..
            }
            | Self::Arith {
                left: l, right: r, ..
            }
            | Self::Matches {
                pattern: l,
                value: r,
                ..
            } => {
                l.walk(f);
                r.walk(f);
            }
            Self::Not(e, _) | Self::Negate(e, _) => e.walk(f),
            Self::If {
                branches,
                otherwise,
                ..
            } => {
                for branch in branches {
                    branch.condition.walk(f);
                    branch.body.walk(f);
                }
                if let Some(block) = otherwise {
                    block.walk(f);
                }
            }
            Self::For {
                list,
                separator,
                body,
                ..
            } => {
                list.walk(f);
                if let Some(sep) = separator {
                    sep.walk(f);
                }
                body.walk(f);
            }
        }
    }
}

impl Block {
    /// Visits every node in the block, depth first.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        for statement in &self.statements {
            statement.walk(f);
        }
    }

    /// Names of every function called anywhere in the block, in call order.
    #[must_use]
    pub fn called_functions(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Call { name, .. } = e {
                names.push(name.clone());
            }
        });
        names
    }
}
