//! In-memory implementations of the collaborator traits.
//!
//! Used by the runtime session, by tests, and by anyone embedding the
//! formatter without a real library behind it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Weak;

use crate::Result;
use crate::database::{Database, ExtraFile, GuiContext, Note, StorageLocation};
use crate::metadata::{
    BookId, Datatype, FieldInfo, FieldValue, FormatInfo, Metadata, ProxyMetadata,
};

// =============================================================================
// MemoryMetadata
// =============================================================================

/// Book metadata held in ordinary maps.
#[derive(Clone, Debug)]
pub struct MemoryMetadata {
    fields: BTreeMap<String, FieldValue>,
    infos: BTreeMap<String, FieldInfo>,
    book_id: Option<BookId>,
    formats: Vec<FormatInfo>,
    author_sorts: Vec<(String, String)>,
    cover: bool,
    proxy: Option<MemoryProxy>,
}

impl Default for MemoryMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMetadata {
    /// Creates metadata with the standard fields declared and unset.
    #[must_use]
    pub fn new() -> Self {
        let infos = standard_fields()
            .into_iter()
            .map(|(key, info)| (key.to_string(), info))
            .collect();
        Self {
            fields: BTreeMap::new(),
            infos,
            book_id: None,
            formats: Vec::new(),
            author_sorts: Vec::new(),
            cover: false,
            proxy: None,
        }
    }

    /// Sets a field, builder style.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a multi-valued field, builder style.
    #[must_use]
    pub fn with_list<I, S>(mut self, key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_list(key, items);
        self
    }

    /// Declares or redeclares a field.
    #[must_use]
    pub fn with_field_info(mut self, key: impl Into<String>, info: FieldInfo) -> Self {
        self.infos.insert(key.into(), info);
        self
    }

    /// Sets the book id.
    #[must_use]
    pub fn with_book_id(mut self, id: BookId) -> Self {
        self.book_id = Some(id);
        self
    }

    /// Adds a stored format.
    #[must_use]
    pub fn with_format(mut self, format: FormatInfo) -> Self {
        self.formats.push(format);
        self
    }

    /// Records an author's sort value.
    #[must_use]
    pub fn with_author_sort(mut self, author: impl Into<String>, sort: impl Into<String>) -> Self {
        self.author_sorts.push((author.into(), sort.into()));
        self
    }

    /// Sets whether the book has a cover.
    #[must_use]
    pub fn with_cover(mut self, cover: bool) -> Self {
        self.cover = cover;
        self
    }

    /// Attaches a library proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: MemoryProxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets a field, declaring it as text if it is unknown.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        if !self.infos.contains_key(&key) {
            let datatype = match value {
                FieldValue::Int(_) => Datatype::Int,
                FieldValue::Float(_) => Datatype::Float,
                FieldValue::Bool(_) => Datatype::Bool,
                FieldValue::Date(_) => Datatype::Datetime,
                _ => Datatype::Text,
            };
            let mut info = FieldInfo::new(key.trim_start_matches('#'), datatype);
            if let FieldValue::List(_) = value {
                info = info.multiple(',');
            }
            if key.starts_with('#') {
                info = info.custom();
            }
            self.infos.insert(key.clone(), info);
        }
        self.fields.insert(key, value);
    }

    /// Sets a multi-valued field.
    pub fn set_list<I, S>(&mut self, key: impl Into<String>, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.set(key, FieldValue::List(items));
    }

    /// Clears a field's value. The field stays declared.
    pub fn clear(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// Sets the book id.
    pub fn set_book_id(&mut self, id: BookId) {
        self.book_id = Some(id);
    }
}

impl Metadata for MemoryMetadata {
    fn get(&self, field: &str) -> Option<FieldValue> {
        self.fields.get(field).cloned()
    }

    fn field_info(&self, field: &str) -> Option<FieldInfo> {
        self.infos.get(field).cloned()
    }

    fn all_field_keys(&self) -> Vec<String> {
        self.infos.keys().cloned().collect()
    }

    fn book_id(&self) -> Option<BookId> {
        self.book_id
    }

    fn format_metadata(&self) -> Vec<FormatInfo> {
        self.formats.clone()
    }

    fn author_sort_map(&self) -> Vec<(String, String)> {
        self.author_sorts.clone()
    }

    fn has_cover(&self) -> bool {
        self.cover
    }

    fn proxy(&self) -> Option<&dyn ProxyMetadata> {
        self.proxy.as_ref().map(|p| p as &dyn ProxyMetadata)
    }
}

fn standard_fields() -> Vec<(&'static str, FieldInfo)> {
    vec![
        ("title", FieldInfo::new("Title", Datatype::Text)),
        ("sort", FieldInfo::new("Title sort", Datatype::Text)),
        ("authors", FieldInfo::new("Authors", Datatype::Text).multiple('&')),
        ("author_sort", FieldInfo::new("Author sort", Datatype::Text)),
        ("tags", FieldInfo::new("Tags", Datatype::Text).multiple(',')),
        ("series", FieldInfo::new("Series", Datatype::Series)),
        ("series_index", FieldInfo::new("Series index", Datatype::Float)),
        ("publisher", FieldInfo::new("Publisher", Datatype::Text)),
        ("rating", FieldInfo::new("Rating", Datatype::Rating)),
        ("pubdate", FieldInfo::new("Published", Datatype::Datetime)),
        ("timestamp", FieldInfo::new("Date", Datatype::Datetime)),
        ("last_modified", FieldInfo::new("Modified", Datatype::Datetime)),
        ("languages", FieldInfo::new("Languages", Datatype::Text).multiple(',')),
        ("identifiers", FieldInfo::new("Identifiers", Datatype::Text).multiple(',')),
        ("formats", FieldInfo::new("Formats", Datatype::Text).multiple(',')),
        ("comments", FieldInfo::new("Comments", Datatype::Comments)),
        ("id", FieldInfo::new("Id", Datatype::Int)),
        ("uuid", FieldInfo::new("UUID", Datatype::Text)),
    ]
}

// =============================================================================
// MemoryProxy
// =============================================================================

/// Library proxy data held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryProxy {
    /// Formats recorded in the library.
    pub approximate_formats: Vec<String>,
    /// Size of the largest format.
    pub book_size: Option<u64>,
    /// On-device column text.
    pub ondevice: String,
    /// User categories containing the book.
    pub user_categories: Vec<String>,
    /// Field name to item/link pairs.
    pub link_maps: BTreeMap<String, Vec<(String, String)>>,
    /// The library database, if it is open.
    pub database: Option<Weak<dyn Database>>,
}

impl MemoryProxy {
    /// Creates a proxy connected to a database.
    #[must_use]
    pub fn connected(database: Weak<dyn Database>) -> Self {
        Self {
            database: Some(database),
            ..Self::default()
        }
    }
}

impl ProxyMetadata for MemoryProxy {
    fn approximate_formats(&self) -> Vec<String> {
        self.approximate_formats.clone()
    }

    fn book_size(&self) -> Option<u64> {
        self.book_size
    }

    fn ondevice(&self) -> String {
        self.ondevice.clone()
    }

    fn user_categories(&self) -> Vec<String> {
        self.user_categories.clone()
    }

    fn link_map(&self, field: &str) -> Vec<(String, String)> {
        self.link_maps.get(field).cloned().unwrap_or_default()
    }

    fn database(&self) -> Option<Weak<dyn Database>> {
        self.database.clone()
    }
}

// =============================================================================
// MemoryDatabase
// =============================================================================

/// A tiny library held in memory.
///
/// Searches understand `field:text` (case-insensitive substring),
/// `field:=text` (case-insensitive equality), bare text (any field) and the
/// empty query (every book).
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    path: PathBuf,
    books: BTreeMap<BookId, MemoryMetadata>,
    links: BTreeMap<(String, String), String>,
    notes: BTreeMap<(String, String), Note>,
    virtual_libraries: BTreeMap<String, Vec<BookId>>,
    current_virtual_library: Option<String>,
    annotations: BTreeMap<BookId, usize>,
    marks: BTreeMap<BookId, String>,
    extra_files: BTreeMap<BookId, Vec<ExtraFile>>,
}

impl MemoryDatabase {
    /// Creates an empty library at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a book.
    #[must_use]
    pub fn with_book(mut self, id: BookId, book: MemoryMetadata) -> Self {
        self.books.insert(id, book.with_book_id(id));
        self
    }

    /// Attaches a link to a field value.
    #[must_use]
    pub fn with_link(mut self, field: &str, value: &str, link: impl Into<String>) -> Self {
        self.links
            .insert((field.to_string(), value.to_lowercase()), link.into());
        self
    }

    /// Attaches a note to a field value.
    #[must_use]
    pub fn with_note(mut self, field: &str, value: &str, note: Note) -> Self {
        self.notes
            .insert((field.to_string(), value.to_lowercase()), note);
        self
    }

    /// Defines a virtual library.
    #[must_use]
    pub fn with_virtual_library(mut self, name: impl Into<String>, books: Vec<BookId>) -> Self {
        self.virtual_libraries.insert(name.into(), books);
        self
    }

    /// Selects the current virtual library.
    #[must_use]
    pub fn with_current_virtual_library(mut self, name: impl Into<String>) -> Self {
        self.current_virtual_library = Some(name.into());
        self
    }

    /// Records an annotation count.
    #[must_use]
    pub fn with_annotations(mut self, book: BookId, count: usize) -> Self {
        self.annotations.insert(book, count);
        self
    }

    /// Marks a book.
    #[must_use]
    pub fn with_mark(mut self, book: BookId, mark: impl Into<String>) -> Self {
        self.marks.insert(book, mark.into());
        self
    }

    /// Adds an extra file to a book.
    #[must_use]
    pub fn with_extra_file(mut self, book: BookId, file: ExtraFile) -> Self {
        self.extra_files.entry(book).or_default().push(file);
        self
    }

    /// A book's metadata.
    #[must_use]
    pub fn book(&self, id: BookId) -> Option<&MemoryMetadata> {
        self.books.get(&id)
    }

    fn item_values(&self, field: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .books
            .values()
            .filter_map(|b| b.get(field))
            .flat_map(|v| match v {
                FieldValue::List(items) => items,
                other => vec![other.render(", ")],
            })
            .filter(|s| !s.is_empty())
            .collect();
        values.sort_by_key(|v| v.to_lowercase());
        values.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        values
    }

    fn matches(book: &MemoryMetadata, query: &str) -> bool {
        let render = |value: FieldValue| value.render(",").to_lowercase();
        match query.split_once(':') {
            Some((field, needle)) => {
                let Some(value) = book.get(field) else {
                    return false;
                };
                match needle.strip_prefix('=') {
                    Some(exact) => match value {
                        FieldValue::List(items) => {
                            items.iter().any(|i| i.to_lowercase() == exact.to_lowercase())
                        }
                        other => render(other) == exact.to_lowercase(),
                    },
                    None => render(value).contains(&needle.to_lowercase()),
                }
            }
            None => {
                let needle = query.to_lowercase();
                book.all_field_keys()
                    .iter()
                    .filter_map(|k| book.get(k))
                    .any(|v| render(v).contains(&needle))
            }
        }
    }
}

impl Database for MemoryDatabase {
    fn search(&self, query: &str, use_virtual_library: bool) -> Result<Vec<BookId>> {
        let restrict = if use_virtual_library {
            self.current_virtual_library
                .as_ref()
                .and_then(|name| self.virtual_libraries.get(name))
        } else {
            None
        };
        let query = query.trim();
        Ok(self
            .books
            .iter()
            .filter(|(id, _)| restrict.is_none_or(|ids| ids.contains(id)))
            .filter(|(_, book)| query.is_empty() || Self::matches(book, query))
            .map(|(id, _)| *id)
            .collect())
    }

    fn field_info(&self, field: &str) -> Option<FieldInfo> {
        self.books
            .values()
            .find_map(|b| b.field_info(field))
            .or_else(|| MemoryMetadata::new().field_info(field))
    }

    fn field_for(&self, field: &str, book: BookId) -> Option<FieldValue> {
        self.books.get(&book).and_then(|b| b.get(field))
    }

    fn item_id(&self, field: &str, value: &str) -> Option<u64> {
        self.item_values(field)
            .iter()
            .position(|v| v.eq_ignore_ascii_case(value))
            .and_then(|i| u64::try_from(i + 1).ok())
    }

    fn link_for(&self, field: &str, value: &str) -> Option<String> {
        self.links
            .get(&(field.to_string(), value.to_lowercase()))
            .cloned()
    }

    fn note_for(&self, field: &str, item: u64) -> Option<Note> {
        let index = usize::try_from(item).ok()?.checked_sub(1)?;
        let value = self.item_values(field).into_iter().nth(index)?;
        self.notes
            .get(&(field.to_string(), value.to_lowercase()))
            .cloned()
    }

    fn items_with_notes(&self, field: &str) -> Vec<u64> {
        self.item_values(field)
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                self.notes
                    .contains_key(&(field.to_string(), v.to_lowercase()))
            })
            .filter_map(|(i, _)| u64::try_from(i + 1).ok())
            .collect()
    }

    fn virtual_libraries_for_book(&self, book: BookId) -> Vec<String> {
        self.virtual_libraries
            .iter()
            .filter(|(_, ids)| ids.contains(&book))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn current_virtual_library_name(&self) -> String {
        self.current_virtual_library.clone().unwrap_or_default()
    }

    fn annotation_count(&self, book: BookId) -> usize {
        self.annotations.get(&book).copied().unwrap_or(0)
    }

    fn mark(&self, book: BookId) -> Option<String> {
        self.marks.get(&book).cloned()
    }

    fn extra_files(&self, book: BookId) -> Vec<ExtraFile> {
        self.extra_files.get(&book).cloned().unwrap_or_default()
    }

    fn library_path(&self) -> PathBuf {
        self.path.clone()
    }
}

// =============================================================================
// MemoryGui
// =============================================================================

/// A stand-in for the interactive application.
#[derive(Clone, Debug, Default)]
pub struct MemoryGui {
    /// Connected device name and its storage UUIDs.
    pub device: Option<(String, Vec<(StorageLocation, String)>)>,
    /// Dark palette flag.
    pub dark: bool,
}

impl GuiContext for MemoryGui {
    fn device_name(&self, storage: StorageLocation) -> Option<String> {
        let (name, storages) = self.device.as_ref()?;
        storages
            .iter()
            .any(|(s, _)| *s == storage)
            .then(|| name.clone())
    }

    fn device_uuid(&self, storage: StorageLocation) -> Option<String> {
        let (_, storages) = self.device.as_ref()?;
        storages
            .iter()
            .find(|(s, _)| *s == storage)
            .map(|(_, uuid)| uuid.clone())
    }

    fn is_dark_theme(&self) -> bool {
        self.dark
    }
}
