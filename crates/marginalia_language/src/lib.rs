//! Lexer, parser, and template scanner for the Marginalia template language.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of program-mode source
//! - [`Parser`] - Parsing tokens into a [`Program`] call tree
//! - [`parse_template`] - Splitting template-mode text into [`Segment`]s
//!
//! Evaluation lives in `marginalia_formatter`; the functions a program calls
//! live in `marginalia_functions`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod template;
pub mod token;

mod fuzz_tests;

pub use ast::{Block, Branch, Expr, Program};
pub use lexer::Lexer;
pub use parser::{Parser, parse_program};
pub use span::Span;
pub use template::{FieldRef, FieldSpec, PROGRAM_PREFIX, Segment, Template, parse_template};
pub use token::{ArithOp, CompareOp, Token, TokenKind};
