//! Values read from the book being rendered.
//!
//! Most getters need only the [`Metadata`](marginalia_foundation::Metadata)
//! handle. Those marked as proxy-backed need metadata read from an open
//! library and fail with an only-in-GUI error otherwise.

use std::path::Path;

use marginalia_foundation::{
    Error, FieldInfo, FieldValue, ProxyMetadata, Result, StorageLocation, Value,
};

use super::{arg, fixed};
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{dates, languages, text};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{DatabaseFunctions, GetFromMetadata, StringManipulation};

    vec![
        FunctionDescriptor::builtin(
            "field",
            GetFromMetadata,
            Exact(1),
            "field(lookup_name) -- returns the value of the metadata field with lookup \
             name lookup_name, formatted for display.",
            native_field,
        ),
        FunctionDescriptor::builtin(
            "raw_field",
            GetFromMetadata,
            Variadic,
            "raw_field(lookup_name [, optional_default]) -- returns the metadata field \
             named by lookup_name without applying any formatting. Returns \
             optional_default if the field is undefined.",
            native_raw_field,
        ),
        FunctionDescriptor::builtin(
            "raw_list",
            GetFromMetadata,
            Exact(2),
            "raw_list(lookup_name, separator) -- returns the metadata list named by \
             lookup_name without any formatting or sorting, with the items separated by \
             separator.",
            native_raw_list,
        ),
        FunctionDescriptor::builtin(
            "field_exists",
            StringManipulation,
            Exact(1),
            "field_exists(lookup_name) -- checks if a field (column) with the lookup name \
             lookup_name exists, returning '1' if so and the empty string if not.",
            native_field_exists,
        ),
        FunctionDescriptor::builtin(
            "approximate_formats",
            GetFromMetadata,
            Exact(0),
            "approximate_formats() -- returns a comma-separated list of formats associated \
             with the book, as recorded in the library. Can be used only in the GUI.",
            native_approximate_formats,
        ),
        FunctionDescriptor::builtin(
            "formats_modtimes",
            GetFromMetadata,
            Exact(1),
            "formats_modtimes(date_format_string) -- returns a comma-separated list of \
             FMT:DATE items giving the modification times of the book's formats, newest \
             first, with dates formatted by date_format_string.",
            native_formats_modtimes,
        ),
        FunctionDescriptor::builtin(
            "formats_sizes",
            GetFromMetadata,
            Exact(0),
            "formats_sizes() -- returns a comma-separated list of FMT:SIZE items giving the \
             sizes of the book's formats in bytes.",
            native_formats_sizes,
        ),
        FunctionDescriptor::builtin(
            "formats_paths",
            GetFromMetadata,
            Variadic,
            "formats_paths([separator]) -- returns a separator-separated list of FMT:PATH \
             items giving the full paths of the book's formats. The separator defaults \
             to a comma.",
            native_formats_paths,
        ),
        FunctionDescriptor::builtin(
            "formats_path_segments",
            GetFromMetadata,
            Exact(5),
            "formats_path_segments(with_author, with_title, with_format, with_ext, sep) -- \
             returns the chosen segments of the path to a book format joined by sep. Pass \
             1 for each segment to include. with_ext keeps the file extension.",
            native_formats_path_segments,
        ),
        FunctionDescriptor::builtin(
            "booksize",
            GetFromMetadata,
            Exact(0),
            "booksize() -- returns the size of the book's largest format in bytes. Can be \
             used only in the GUI.",
            native_booksize,
        ),
        FunctionDescriptor::builtin(
            "ondevice",
            GetFromMetadata,
            Exact(0),
            "ondevice() -- returns 'Yes' if the book is on the connected device, otherwise \
             the empty string. Can be used only in the GUI.",
            native_ondevice,
        ),
        FunctionDescriptor::builtin(
            "series_sort",
            GetFromMetadata,
            Exact(0),
            "series_sort() -- returns the series sort value.",
            native_series_sort,
        ),
        FunctionDescriptor::builtin(
            "has_cover",
            GetFromMetadata,
            Exact(0),
            "has_cover() -- returns 'Yes' if the book has a cover, otherwise the empty \
             string.",
            native_has_cover,
        ),
        FunctionDescriptor::builtin(
            "author_links",
            GetFromMetadata,
            Exact(2),
            "author_links(val_separator, pair_separator) -- returns author:link pairs, the \
             author separated from the link by val_separator and pairs separated by \
             pair_separator. Can be used only in the GUI.",
            native_author_links,
        ),
        FunctionDescriptor::builtin(
            "author_sorts",
            GetFromMetadata,
            Exact(1),
            "author_sorts(val_separator) -- returns the author sort values of the book's \
             authors, in author order, separated by val_separator.",
            native_author_sorts,
        ),
        FunctionDescriptor::builtin(
            "language_strings",
            GetFromMetadata,
            Exact(2),
            "language_strings(value, localize) -- returns the language names for the \
             comma-separated language codes in value.",
            native_language_strings,
        ),
        FunctionDescriptor::builtin(
            "language_codes",
            GetFromMetadata,
            Exact(1),
            "language_codes(lang_strings) -- returns the language codes for the \
             comma-separated language names in lang_strings.",
            native_language_codes,
        ),
        FunctionDescriptor::builtin(
            "user_categories",
            GetFromMetadata,
            Exact(0),
            "user_categories() -- returns a comma-separated list of the user categories \
             that contain this book. Can be used only in the GUI.",
            native_user_categories,
        ),
        FunctionDescriptor::builtin(
            "current_library_name",
            DatabaseFunctions,
            Exact(0),
            "current_library_name() -- returns the last component of the path to the \
             current library.",
            native_current_library_name,
        ),
        FunctionDescriptor::builtin(
            "current_library_path",
            DatabaseFunctions,
            Exact(0),
            "current_library_path() -- returns the full path to the current library.",
            native_current_library_path,
        ),
        FunctionDescriptor::builtin(
            "connected_device_name",
            GetFromMetadata,
            Exact(1),
            "connected_device_name(storage_location_key) -- returns the name of the \
             connected device if it has the storage location main, carda or cardb, \
             otherwise the empty string. Can be used only in the GUI.",
            native_connected_device_name,
        ),
        FunctionDescriptor::builtin(
            "connected_device_uuid",
            GetFromMetadata,
            Exact(1),
            "connected_device_uuid(storage_location_key) -- returns the UUID of the given \
             storage location (main, carda or cardb) on the connected device, otherwise \
             the empty string. Can be used only in the GUI.",
            native_connected_device_uuid,
        ),
    ]
}

fn proxy<'a>(ctx: &CallContext<'a>, name: &str) -> Result<&'a dyn ProxyMetadata> {
    ctx.metadata(name)?
        .proxy()
        .ok_or_else(|| Error::only_in_gui(name))
}

fn yes_or_empty(flag: bool) -> Value {
    if flag { Value::from("Yes") } else { Value::empty() }
}

fn storage(name: &str, key: &str) -> Result<StorageLocation> {
    StorageLocation::parse(key).ok_or_else(|| {
        Error::invalid_argument(name, format!("invalid storage location \"{key}\""))
    })
}

// =============================================================================
// Fields
// =============================================================================

/// Metadata: field
fn native_field(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [name] = fixed::<1>("field", args)?;
    let metadata = ctx.metadata("field")?;
    Ok(Value::Text(ctx.formatter.field_value(name, metadata)?))
}

/// Metadata: raw_field
fn native_raw_field(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "raw_field";
    if !(1..=2).contains(&args.len()) {
        return Err(Error::arity(NAME, "requires 1 or 2 arguments"));
    }
    let metadata = ctx.metadata(NAME)?;
    let key = args[0].trim().to_lowercase();
    match metadata.get(&key) {
        None => Ok(Value::from(arg(args, 1))),
        Some(FieldValue::List(items)) => {
            let separator = metadata
                .field_info(&key)
                .as_ref()
                .map_or_else(|| ", ".to_string(), FieldInfo::display_separator);
            Ok(Value::Text(items.join(&separator)))
        }
        Some(value) => Ok(Value::Text(value.render(", "))),
    }
}

/// Metadata: raw_list
fn native_raw_list(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "raw_list";
    let [name, separator] = fixed::<2>(NAME, args)?;
    let metadata = ctx.metadata(NAME)?;
    match metadata.get(&name.trim().to_lowercase()) {
        Some(FieldValue::List(items)) => Ok(Value::Text(items.join(separator))),
        None => Ok(Value::empty()),
        Some(_) => Ok(Value::Text(format!("{name} is not a list"))),
    }
}

/// Metadata: field_exists
fn native_field_exists(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [name] = fixed::<1>("field_exists", args)?;
    let key = name.trim().to_lowercase();
    let metadata = ctx.metadata("field_exists")?;
    Ok(Value::from_flag(metadata.all_field_keys().contains(&key)))
}

// =============================================================================
// Formats
// =============================================================================

/// Metadata: approximate_formats
fn native_approximate_formats(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    let mut formats: Vec<String> = proxy(ctx, "approximate_formats")?
        .approximate_formats()
        .iter()
        .map(|f| f.to_uppercase())
        .collect();
    formats.sort();
    Ok(Value::Text(formats.join(",")))
}

/// Metadata: formats_modtimes
fn native_formats_modtimes(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [format] = fixed::<1>("formats_modtimes", args)?;
    let mut formats = ctx.metadata("formats_modtimes")?.format_metadata();
    formats.sort_by(|a, b| b.mtime.cmp(&a.mtime));
    let items: Vec<String> = formats
        .iter()
        .map(|f| format!("{}:{}", f.format.to_uppercase(), dates::format_date(&f.mtime, format)))
        .collect();
    Ok(Value::Text(items.join(",")))
}

/// Metadata: formats_sizes
fn native_formats_sizes(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    let items: Vec<String> = ctx
        .metadata("formats_sizes")?
        .format_metadata()
        .iter()
        .map(|f| format!("{}:{}", f.format.to_uppercase(), f.size))
        .collect();
    Ok(Value::Text(items.join(",")))
}

/// Metadata: formats_paths
fn native_formats_paths(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "formats_paths";
    let separator = match args {
        [] => ",",
        [separator] => separator.as_str(),
        _ => return Err(Error::arity(NAME, "accepts at most 1 argument")),
    };
    let items: Vec<String> = ctx
        .metadata(NAME)?
        .format_metadata()
        .iter()
        .map(|f| format!("{}:{}", f.format.to_uppercase(), f.path))
        .collect();
    Ok(Value::Text(items.join(separator)))
}

/// Metadata: formats_path_segments
fn native_formats_path_segments(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "formats_path_segments";
    let [with_author, with_title, with_format, with_ext, separator] = fixed::<5>(NAME, args)?;
    let formats = ctx.metadata(NAME)?.format_metadata();
    let Some(first) = formats.first() else {
        return Ok(Value::from("No book formats found so the path can't be generated"));
    };
    let path = Path::new(&first.path);
    let component = |p: Option<&Path>| {
        p.and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let file = if with_ext.is_empty() || with_ext == "0" {
        path.file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        component(Some(path))
    };
    let title_dir = path.parent();
    let author_dir = title_dir.and_then(Path::parent);
    let mut parts = Vec::with_capacity(3);
    if with_author == "1" {
        parts.push(component(author_dir));
    }
    if with_title == "1" {
        parts.push(component(title_dir));
    }
    if with_format == "1" {
        parts.push(file);
    }
    Ok(Value::Text(parts.join(separator)))
}

// =============================================================================
// Book Properties
// =============================================================================

/// Metadata: booksize
fn native_booksize(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Ok(proxy(ctx, "booksize")?
        .book_size()
        .map_or_else(Value::empty, |size| Value::Text(size.to_string())))
}

/// Metadata: ondevice
fn native_ondevice(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Ok(yes_or_empty(!proxy(ctx, "ondevice")?.ondevice().is_empty()))
}

/// Metadata: series_sort
fn native_series_sort(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    let series = ctx
        .metadata("series_sort")?
        .get("series")
        .map(|v| v.render(", "))
        .unwrap_or_default();
    if series.is_empty() {
        return Ok(Value::empty());
    }
    Ok(Value::Text(text::title_sort(&series)))
}

/// Metadata: has_cover
fn native_has_cover(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Ok(yes_or_empty(ctx.metadata("has_cover")?.has_cover()))
}

/// Metadata: author_links
fn native_author_links(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value_separator, pair_separator] = fixed::<2>("author_links", args)?;
    let mut links = proxy(ctx, "author_links")?.link_map("authors");
    links.sort_by_cached_key(|(name, _)| text::sort_key(name));
    let pairs: Vec<String> = links
        .iter()
        .map(|(name, link)| format!("{name}{value_separator}{link}"))
        .collect();
    Ok(Value::Text(pairs.join(pair_separator)))
}

/// Metadata: author_sorts
fn native_author_sorts(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [separator] = fixed::<1>("author_sorts", args)?;
    let metadata = ctx.metadata("author_sorts")?;
    let sorts = metadata.author_sort_map();
    if sorts.is_empty() {
        return Ok(Value::empty());
    }
    let authors = match metadata.get("authors") {
        Some(FieldValue::List(items)) => items,
        Some(other) => vec![other.render(", ")],
        None => Vec::new(),
    };
    let names: Vec<&str> = authors
        .iter()
        .filter_map(|author| {
            sorts
                .iter()
                .find(|(name, _)| name == author)
                .map(|(_, sort)| sort.as_str())
        })
        .collect();
    Ok(Value::Text(names.join(separator)))
}

/// Metadata: user_categories
fn native_user_categories(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    let mut categories = proxy(ctx, "user_categories")?.user_categories();
    text::sort_by_key(&mut categories);
    Ok(Value::Text(categories.join(", ")))
}

// =============================================================================
// Languages
// =============================================================================

/// Metadata: language_strings
fn native_language_strings(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [codes, _localize] = fixed::<2>("language_strings", args)?;
    let names: Vec<&str> = codes
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .filter_map(languages::name_for)
        .collect();
    Ok(Value::Text(names.join(", ")))
}

/// Metadata: language_codes
fn native_language_codes(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [names] = fixed::<1>("language_codes", args)?;
    let codes: Vec<&str> = names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .filter_map(languages::canonicalize)
        .collect();
    Ok(Value::Text(codes.join(", ")))
}

// =============================================================================
// Library and Device
// =============================================================================

/// Database: current_library_name
fn native_current_library_name(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Ok(Value::Text(ctx.database("current_library_name")?.library_name()))
}

/// Database: current_library_path
fn native_current_library_path(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    let path = ctx.database("current_library_path")?.library_path();
    Ok(Value::Text(path.to_string_lossy().into_owned()))
}

/// GUI: connected_device_name
fn native_connected_device_name(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "connected_device_name";
    let [key] = fixed::<1>(NAME, args)?;
    let gui = ctx.gui(NAME)?;
    let location = storage(NAME, key)?;
    Ok(gui
        .device_name(location)
        .map_or_else(Value::empty, Value::Text))
}

/// GUI: connected_device_uuid
fn native_connected_device_uuid(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "connected_device_uuid";
    let [key] = fixed::<1>(NAME, args)?;
    let gui = ctx.gui(NAME)?;
    let location = storage(NAME, key)?;
    Ok(gui
        .device_uuid(location)
        .map_or_else(Value::empty, Value::Text))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use marginalia_foundation::{
        ErrorKind, FieldValue, FormatInfo, MemoryDatabase, MemoryGui, MemoryMetadata,
        MemoryProxy, StorageLocation, Unavailable,
    };

    use crate::support::dates::parse_date;
    use crate::testing::{TestFormatter, builtin, call_with, run_with};

    fn hobbit() -> MemoryMetadata {
        MemoryMetadata::new()
            .with_field("title", "The Hobbit")
            .with_list("authors", ["J. R. R. Tolkien", "Christopher Tolkien"])
            .with_list("tags", ["Fantasy", "Classic"])
            .with_field("series", "The Lord of the Rings")
            .with_author_sort("J. R. R. Tolkien", "Tolkien, J. R. R.")
            .with_author_sort("Christopher Tolkien", "Tolkien, Christopher")
            .with_cover(true)
    }

    fn format(name: &str, size: u64, date: &str, path: &str) -> FormatInfo {
        FormatInfo {
            format: name.to_string(),
            size,
            mtime: parse_date(date).unwrap(),
            path: path.to_string(),
        }
    }

    fn with_formats() -> MemoryMetadata {
        hobbit()
            .with_format(format(
                "epub",
                1024,
                "2024-01-01",
                "/library/J. R. R. Tolkien/The Hobbit (12)/The Hobbit - J. R. R. Tolkien.epub",
            ))
            .with_format(format(
                "PDF",
                4096,
                "2024-02-01",
                "/library/J. R. R. Tolkien/The Hobbit (12)/The Hobbit - J. R. R. Tolkien.pdf",
            ))
    }

    #[test]
    fn raw_values_skip_formatting() {
        let mi = hobbit();
        assert_eq!(
            run_with(&mi, "raw_field", &["authors"]).unwrap(),
            "J. R. R. Tolkien & Christopher Tolkien"
        );
        assert_eq!(run_with(&mi, "raw_field", &["publisher", "none"]).unwrap(), "none");
        assert_eq!(run_with(&mi, "raw_field", &["publisher"]).unwrap(), "");
        assert_eq!(run_with(&mi, "raw_list", &["tags", "|"]).unwrap(), "Fantasy|Classic");
        assert_eq!(run_with(&mi, "raw_list", &["title", "|"]).unwrap(), "title is not a list");
    }

    #[test]
    fn field_renders_for_display() {
        let mi = hobbit();
        assert_eq!(run_with(&mi, "field", &["tags"]).unwrap(), "Fantasy, Classic");
        assert!(run_with(&mi, "field", &["#nope"]).is_err());
    }

    #[test]
    fn field_existence() {
        let mi = hobbit();
        assert_eq!(run_with(&mi, "field_exists", &["Title"]).unwrap(), "1");
        assert_eq!(run_with(&mi, "field_exists", &["#nope"]).unwrap(), "");
    }

    #[test]
    fn format_listings() {
        let mi = with_formats();
        assert_eq!(
            run_with(&mi, "formats_modtimes", &["yyyy-MM"]).unwrap(),
            "PDF:2024-02,EPUB:2024-01"
        );
        assert_eq!(run_with(&mi, "formats_sizes", &[]).unwrap(), "EPUB:1024,PDF:4096");
        assert!(
            run_with(&mi, "formats_paths", &[" | "])
                .unwrap()
                .starts_with("EPUB:/library/")
        );
    }

    #[test]
    fn path_segments() {
        let mi = with_formats();
        assert_eq!(
            run_with(&mi, "formats_path_segments", &["0", "0", "1", "0", "/"]).unwrap(),
            "The Hobbit - J. R. R. Tolkien"
        );
        assert_eq!(
            run_with(&mi, "formats_path_segments", &["1", "0", "1", "1", "/"]).unwrap(),
            "J. R. R. Tolkien/The Hobbit - J. R. R. Tolkien.epub"
        );
        assert_eq!(
            run_with(&mi, "formats_path_segments", &["0", "1", "0", "0", "/"]).unwrap(),
            "The Hobbit (12)"
        );
        assert_eq!(
            run_with(&hobbit(), "formats_path_segments", &["1", "1", "1", "1", "/"]).unwrap(),
            "No book formats found so the path can't be generated"
        );
    }

    #[test]
    fn book_properties() {
        let mi = hobbit();
        assert_eq!(run_with(&mi, "has_cover", &[]).unwrap(), "Yes");
        assert_eq!(run_with(&mi, "series_sort", &[]).unwrap(), "Lord of the Rings, The");
        assert_eq!(
            run_with(&mi, "author_sorts", &[" & "]).unwrap(),
            "Tolkien, J. R. R. & Tolkien, Christopher"
        );
        assert_eq!(run_with(&MemoryMetadata::new(), "author_sorts", &[","]).unwrap(), "");
    }

    #[test]
    fn proxy_backed_getters() {
        let mut proxy = MemoryProxy {
            approximate_formats: vec!["pdf".to_string(), "epub".to_string()],
            book_size: Some(4096),
            ondevice: "Main".to_string(),
            user_categories: vec!["Reading".to_string(), "Favourites".to_string()],
            ..MemoryProxy::default()
        };
        proxy.link_maps.insert(
            "authors".to_string(),
            vec![
                ("Tolkien".to_string(), "https://t".to_string()),
                ("Austen".to_string(), "https://a".to_string()),
            ],
        );
        let mi = hobbit().with_proxy(proxy);
        assert_eq!(run_with(&mi, "approximate_formats", &[]).unwrap(), "EPUB,PDF");
        assert_eq!(run_with(&mi, "booksize", &[]).unwrap(), "4096");
        assert_eq!(run_with(&mi, "ondevice", &[]).unwrap(), "Yes");
        assert_eq!(run_with(&mi, "user_categories", &[]).unwrap(), "Favourites, Reading");
        assert_eq!(
            run_with(&mi, "author_links", &[":", ";"]).unwrap(),
            "Austen:https://a;Tolkien:https://t"
        );

        let err = run_with(&hobbit(), "booksize", &[]).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::ContextUnavailable { reason: Unavailable::OnlyInGui, .. }
        ));
    }

    #[test]
    fn languages() {
        let mi = hobbit();
        assert_eq!(
            run_with(&mi, "language_strings", &["eng, fra", "0"]).unwrap(),
            "English, French"
        );
        assert_eq!(run_with(&mi, "language_codes", &["English, German"]).unwrap(), "eng, deu");
    }

    #[test]
    fn library_from_formatter_database() {
        let formatter = TestFormatter {
            database: Some(Arc::new(MemoryDatabase::new("/books/Calibre Library"))),
            ..TestFormatter::default()
        };
        let mi = hobbit();
        let out = call_with(&formatter, &builtin("current_library_name"), Some(&mi), &[]);
        assert_eq!(out.unwrap(), "Calibre Library");
        let out = call_with(&formatter, &builtin("current_library_path"), Some(&mi), &[]);
        assert_eq!(out.unwrap(), "/books/Calibre Library");
    }

    #[test]
    fn device_queries_need_the_gui() {
        let mi = hobbit();
        assert!(run_with(&mi, "connected_device_name", &["main"]).is_err());

        let formatter = TestFormatter {
            gui: Some(Arc::new(MemoryGui {
                device: Some((
                    "Kobo".to_string(),
                    vec![(StorageLocation::Main, "uuid-main".to_string())],
                )),
                dark: false,
            })),
            ..TestFormatter::default()
        };
        let name = builtin("connected_device_name");
        let uuid = builtin("connected_device_uuid");
        assert_eq!(call_with(&formatter, &name, Some(&mi), &["main"]).unwrap(), "Kobo");
        assert_eq!(call_with(&formatter, &name, Some(&mi), &["carda"]).unwrap(), "");
        assert_eq!(call_with(&formatter, &uuid, Some(&mi), &["main"]).unwrap(), "uuid-main");
        assert!(call_with(&formatter, &name, Some(&mi), &["drive"]).is_err());
    }

    #[test]
    fn raw_booleans_are_not_localized() {
        let mi = hobbit().with_field("#read", FieldValue::Bool(true));
        assert_eq!(run_with(&mi, "raw_field", &["#read"]).unwrap(), "true");
    }
}
