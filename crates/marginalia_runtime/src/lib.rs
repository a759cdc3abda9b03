//! Sessions, REPL, and CLI for Marginalia.
//!
//! This crate provides:
//! - [`Session`] - A book, a set of function libraries, and a formatter
//! - [`Repl`] - Interactive template evaluation
//! - The `marginalia` command-line entry point

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod highlight;
pub mod repl;
pub mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::Repl;
pub use session::{DEFAULT_LIBRARY, Session};
