//! The Marginalia template evaluator.
//!
//! This crate provides:
//! - [`TemplateFormatter`] - Renders templates in both modes and implements
//!   the [`Formatter`](marginalia_functions::Formatter) contract that
//!   functions call back into
//!
//! A formatter evaluates against one [`Snapshot`](marginalia_functions::Snapshot)
//! of the function registry per top-level render, so a library being
//! reloaded mid-render cannot change which functions a template sees.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod eval;
pub mod formatter;

pub use formatter::TemplateFormatter;
