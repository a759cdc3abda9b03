//! The book metadata accessor consumed by template functions.
//!
//! The metadata model itself is owned by the host application. Template
//! functions see it only through [`Metadata`] and, for functions that need
//! the live library, through the optional [`ProxyMetadata`] handle.

use std::fmt;
use std::sync::Weak;

use chrono::{DateTime, FixedOffset};

use crate::database::Database;

/// Identifier of a book within a library.
pub type BookId = u64;

/// The storage type of a metadata field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Datatype {
    /// Free text.
    Text,
    /// Long text, usually HTML.
    Comments,
    /// A series name (with an accompanying index field).
    Series,
    /// One value out of a fixed set.
    Enumeration,
    /// Integer.
    Int,
    /// Floating point.
    Float,
    /// Star rating stored as 0-10.
    Rating,
    /// Yes/No/undefined.
    Bool,
    /// Date and time.
    Datetime,
    /// Computed from a template.
    Composite,
}

/// Description of one metadata field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    /// Human-readable column heading.
    pub name: String,
    /// Storage type.
    pub datatype: Datatype,
    /// List separator for multi-valued fields (`,` for tags, `&` for authors).
    pub separator: Option<char>,
    /// True for user-defined (`#name`) columns.
    pub is_custom: bool,
}

impl FieldInfo {
    /// Creates a single-valued field description.
    #[must_use]
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            separator: None,
            is_custom: false,
        }
    }

    /// Marks the field multi-valued with the given separator.
    #[must_use]
    pub fn multiple(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Marks the field as a user-defined column.
    #[must_use]
    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    /// The separator used when joining list values for display.
    #[must_use]
    pub fn display_separator(&self) -> String {
        match self.separator {
            Some(',') | None => ", ".to_string(),
            Some(c) => format!(" {c} "),
        }
    }
}

/// A raw field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Text.
    Text(String),
    /// A multi-valued field.
    List(Vec<String>),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Timestamp.
    Date(DateTime<FixedOffset>),
    /// Ordered key/value pairs (identifiers).
    Map(Vec<(String, String)>),
}

impl FieldValue {
    /// Returns true for values that render as nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(pairs) => pairs.is_empty(),
            _ => false,
        }
    }

    /// Renders the value, joining lists with `separator`.
    #[must_use]
    pub fn render(&self, separator: &str) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(separator),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => crate::value::format_float(*x),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.to_rfc3339(),
            Self::Map(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(separator),
        }
    }

    /// Returns the items of a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// One stored format of a book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    /// Upper-case format name, e.g. `EPUB`.
    pub format: String,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: DateTime<FixedOffset>,
    /// Absolute path to the file.
    pub path: String,
}

/// Read access to one book's metadata.
pub trait Metadata: fmt::Debug {
    /// Returns a field's raw value.
    fn get(&self, field: &str) -> Option<FieldValue>;

    /// Describes a field, if it exists.
    fn field_info(&self, field: &str) -> Option<FieldInfo>;

    /// Every field lookup key known for this book.
    fn all_field_keys(&self) -> Vec<String>;

    /// The book's id in its library, if it has one.
    fn book_id(&self) -> Option<BookId> {
        None
    }

    /// The book's stored formats.
    fn format_metadata(&self) -> Vec<FormatInfo> {
        Vec::new()
    }

    /// Author name to author sort pairs, in author order.
    fn author_sort_map(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Whether the book has a cover.
    fn has_cover(&self) -> bool {
        false
    }

    /// The live-library proxy, present only for books read from a library.
    fn proxy(&self) -> Option<&dyn ProxyMetadata> {
        None
    }
}

/// Extra information available when metadata comes from an open library.
pub trait ProxyMetadata: fmt::Debug {
    /// Formats on disk as recorded in the library, without touching files.
    fn approximate_formats(&self) -> Vec<String>;

    /// Size of the largest format in bytes.
    fn book_size(&self) -> Option<u64>;

    /// The on-device column text.
    fn ondevice(&self) -> String;

    /// User category names containing this book.
    fn user_categories(&self) -> Vec<String>;

    /// Item value to link pairs for a field.
    fn link_map(&self, field: &str) -> Vec<(String, String)>;

    /// A weak handle to the library database.
    fn database(&self) -> Option<Weak<dyn Database>>;
}
