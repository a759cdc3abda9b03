//! Integration tests for Layer 3: Formatter
//!
//! Tests for template rendering, program evaluation, variable scopes, and
//! library-backed functions.

mod database;
mod programs;
mod properties;
mod scopes;
mod templates;

use std::sync::Arc;

use marginalia_formatter::TemplateFormatter;
use marginalia_foundation::{FieldValue, Kwargs, MemoryMetadata, Result};
use marginalia_functions::FunctionRegistry;

/// A book with a representative spread of field types.
pub fn hobbit() -> MemoryMetadata {
    MemoryMetadata::new()
        .with_field("title", "The Hobbit")
        .with_list("authors", ["J. R. R. Tolkien"])
        .with_list("tags", ["Fantasy", "Classic", "Children"])
        .with_field("series", "Middle-earth")
        .with_field("series_index", FieldValue::Float(1.0))
        .with_field("#pages", FieldValue::Int(310))
}

/// A formatter over the builtin functions.
pub fn formatter() -> TemplateFormatter {
    TemplateFormatter::new(Arc::new(FunctionRegistry::with_builtins()))
}

/// Renders `template` for [`hobbit`].
pub fn render(template: &str) -> Result<String> {
    formatter().unsafe_format(template, Some(&hobbit()), &Kwargs::new())
}
