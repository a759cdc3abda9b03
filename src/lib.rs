//! Marginalia - Template functions and evaluation for book metadata
//!
//! This crate re-exports all layers of the Marginalia system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: marginalia_runtime    — Sessions, REPL, CLI
//! Layer 3: marginalia_formatter  — Template evaluation, recursion, globals
//! Layer 2: marginalia_functions  — Function contract, builtins, registry, compiler
//! Layer 1: marginalia_language   — Template scanner, program lexer and parser
//! Layer 0: marginalia_foundation — Errors, values, metadata, library services
//! ```

pub use marginalia_formatter as formatter;
pub use marginalia_foundation as foundation;
pub use marginalia_functions as functions;
pub use marginalia_language as language;
pub use marginalia_runtime as runtime;
