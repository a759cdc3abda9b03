//! Library database and GUI collaborators.
//!
//! Only the database-facing and GUI-facing builtins reach these. Everything
//! is read-only from the template language's point of view.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};

use crate::Result;
use crate::metadata::{BookId, FieldInfo, FieldValue};

/// A note attached to a field item (an author, a tag, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    /// Plain-text rendering.
    pub text: String,
    /// HTML rendering.
    pub html: String,
}

/// A non-book file stored alongside a book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraFile {
    /// Path relative to the book's data directory, e.g. `data/cover.png`.
    pub relpath: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: DateTime<FixedOffset>,
}

impl ExtraFile {
    /// The file name with the `data/` prefix removed.
    #[must_use]
    pub fn name(&self) -> &str {
        self.relpath.strip_prefix("data/").unwrap_or(&self.relpath)
    }
}

/// Read-only access to an open library.
pub trait Database: fmt::Debug + Send + Sync {
    /// Runs a search, optionally restricted to the current virtual library.
    fn search(&self, query: &str, use_virtual_library: bool) -> Result<Vec<BookId>>;

    /// Describes a column.
    fn field_info(&self, field: &str) -> Option<FieldInfo>;

    /// A column's value for one book.
    fn field_for(&self, field: &str, book: BookId) -> Option<FieldValue>;

    /// The library item id of a field value.
    fn item_id(&self, field: &str, value: &str) -> Option<u64>;

    /// The link attached to a field value.
    fn link_for(&self, field: &str, value: &str) -> Option<String>;

    /// The note attached to a field item.
    fn note_for(&self, field: &str, item: u64) -> Option<Note>;

    /// Ids of the field's items that have notes.
    fn items_with_notes(&self, field: &str) -> Vec<u64>;

    /// Names of the virtual libraries containing a book.
    fn virtual_libraries_for_book(&self, book: BookId) -> Vec<String>;

    /// The currently selected virtual library, empty when none.
    fn current_virtual_library_name(&self) -> String;

    /// Number of annotations recorded for a book.
    fn annotation_count(&self, book: BookId) -> usize;

    /// The mark text for a marked book.
    fn mark(&self, book: BookId) -> Option<String>;

    /// Extra files stored with a book.
    fn extra_files(&self, book: BookId) -> Vec<ExtraFile>;

    /// Path of the library on disk.
    fn library_path(&self) -> PathBuf;

    /// Name of the library (the final path component).
    fn library_name(&self) -> String {
        self.library_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Storage locations on a connected device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    /// Main memory.
    Main,
    /// First card slot.
    CardA,
    /// Second card slot.
    CardB,
}

impl StorageLocation {
    /// Parses `main`, `carda` or `cardb`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "main" => Some(Self::Main),
            "carda" => Some(Self::CardA),
            "cardb" => Some(Self::CardB),
            _ => None,
        }
    }
}

/// The interactive application, when one is running.
pub trait GuiContext: fmt::Debug + Send + Sync {
    /// Name of the connected device if it has the given storage.
    fn device_name(&self, storage: StorageLocation) -> Option<String>;

    /// UUID of the given storage on the connected device.
    fn device_uuid(&self, storage: StorageLocation) -> Option<String>;

    /// Whether the interface uses a dark palette.
    fn is_dark_theme(&self) -> bool;
}
