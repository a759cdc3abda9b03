//! Core values, errors, and collaborator traits for Marginalia.
//!
//! This crate provides:
//! - [`Value`] - What template functions return before string coercion
//! - [`Locals`] / [`Kwargs`] - Per-evaluation variable scope and raw arguments
//! - [`Error`] - Rich error types with context
//! - [`Metadata`], [`ProxyMetadata`], [`Database`], [`GuiContext`] - The host
//!   application as seen by template functions
//! - In-memory implementations of those traits ([`MemoryMetadata`],
//!   [`MemoryDatabase`], [`MemoryGui`])
//! - [`FormatterConfig`] - Evaluation settings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod database;
pub mod error;
pub mod locals;
pub mod memory;
pub mod metadata;
pub mod value;

pub use config::FormatterConfig;
pub use database::{Database, ExtraFile, GuiContext, Note, StorageLocation};
pub use error::{Error, ErrorContext, ErrorKind, Result, Unavailable};
pub use locals::{Kwargs, Locals};
pub use memory::{MemoryDatabase, MemoryGui, MemoryMetadata, MemoryProxy};
pub use metadata::{
    BookId, Datatype, FieldInfo, FieldValue, FormatInfo, Metadata, ProxyMetadata,
};
pub use value::{Value, format_float};
