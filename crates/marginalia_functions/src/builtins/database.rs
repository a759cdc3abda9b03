//! Library-wide queries and the GUI.
//!
//! Every function here needs a live library, reached through the book's
//! proxy or the formatter. Outside one they fail rather than return the
//! empty string.

use std::collections::BTreeSet;

use marginalia_foundation::{Error, FieldInfo, FieldValue, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{dates, patterns, text};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{DatabaseFunctions, GetFromMetadata, Other};

    vec![
        FunctionDescriptor::builtin(
            "book_count",
            DatabaseFunctions,
            Exact(2),
            "book_count(query, use_vl) -- returns the number of books found by searching \
             for query. Virtual libraries are ignored if use_vl is 0. Cannot be used in \
             composite columns unless the configuration allows it.",
            native_book_count,
        ),
        FunctionDescriptor::builtin(
            "book_values",
            DatabaseFunctions,
            Exact(4),
            "book_values(column, query, sep, use_vl) -- returns the unique values of the \
             column in the books found by searching for query, separated by sep. Virtual \
             libraries are ignored if use_vl is 0. Cannot be used in composite columns \
             unless the configuration allows it.",
            native_book_values,
        ),
        FunctionDescriptor::builtin(
            "annotation_count",
            GetFromMetadata,
            Exact(0),
            "annotation_count() -- returns the number of annotations of all types attached \
             to the book, or the empty string if there are none.",
            native_annotation_count,
        ),
        FunctionDescriptor::builtin(
            "is_marked",
            GetFromMetadata,
            Exact(0),
            "is_marked() -- returns the mark text if the book is marked, 'true' for a mark \
             without text, otherwise the empty string.",
            native_is_marked,
        ),
        FunctionDescriptor::builtin(
            "virtual_libraries",
            DatabaseFunctions,
            Exact(0),
            "virtual_libraries() -- returns a comma-separated list of the virtual \
             libraries that contain this book.",
            native_virtual_libraries,
        ),
        FunctionDescriptor::builtin(
            "current_virtual_library_name",
            DatabaseFunctions,
            Exact(0),
            "current_virtual_library_name() -- returns the name of the current virtual \
             library if there is one, otherwise the empty string.",
            native_current_virtual_library_name,
        ),
        FunctionDescriptor::builtin(
            "get_link",
            DatabaseFunctions,
            Exact(2),
            "get_link(field_name, field_value) -- returns the link attached to the value \
             field_value of the field field_name, or the empty string if there is none.",
            native_get_link,
        ),
        FunctionDescriptor::builtin(
            "has_extra_files",
            DatabaseFunctions,
            Variadic,
            "has_extra_files([pattern]) -- returns the number of extra files, or the empty \
             string if there are none. With pattern, a case-insensitive regular \
             expression, only matching files are counted.",
            native_has_extra_files,
        ),
        FunctionDescriptor::builtin(
            "extra_file_names",
            DatabaseFunctions,
            Variadic,
            "extra_file_names(sep [, pattern]) -- returns a sep-separated list of the extra \
             files in the book's data folder, optionally only those matching pattern.",
            native_extra_file_names,
        ),
        FunctionDescriptor::builtin(
            "extra_file_size",
            DatabaseFunctions,
            Exact(1),
            "extra_file_size(file_name) -- returns the size in bytes of the extra file \
             file_name, or -1 if it does not exist.",
            native_extra_file_size,
        ),
        FunctionDescriptor::builtin(
            "extra_file_modtime",
            DatabaseFunctions,
            Exact(2),
            "extra_file_modtime(file_name, format_string) -- returns the modification time \
             of the extra file file_name formatted with format_string, or -1 if it does \
             not exist. An empty format_string returns seconds since the epoch.",
            native_extra_file_modtime,
        ),
        FunctionDescriptor::builtin(
            "get_note",
            DatabaseFunctions,
            Exact(3),
            "get_note(field_name, field_value, plain_text) -- returns the note attached to \
             field_value in field_name, as HTML unless plain_text is 1. Returns the empty \
             string if there is no note.",
            native_get_note,
        ),
        FunctionDescriptor::builtin(
            "has_note",
            DatabaseFunctions,
            Exact(2),
            "has_note(field_name, field_value) -- returns '1' if field_value in field_name \
             has a note. With an empty field_value, returns the book's values in \
             field_name that have notes.",
            native_has_note,
        ),
        FunctionDescriptor::builtin(
            "is_dark_mode",
            Other,
            Exact(0),
            "is_dark_mode() -- returns '1' if the interface uses a dark theme, otherwise \
             the empty string. Can be used only in the GUI.",
            native_is_dark_mode,
        ),
    ]
}

fn extra_file_filter(name: &str, pattern: Option<&str>) -> Result<Option<regex::Regex>> {
    pattern
        .map(|p| patterns::search(p).map_err(|e| e.in_frame(name)))
        .transpose()
}

/// The book's extra file names, optionally filtered by `pattern`.
fn extra_file_names(ctx: &CallContext<'_>, name: &str, pattern: Option<&str>) -> Result<Vec<String>> {
    let database = ctx.database(name)?;
    let book = ctx.book_id(name)?;
    let filter = extra_file_filter(name, pattern)?;
    Ok(database
        .extra_files(book)
        .iter()
        .map(|f| f.name().to_string())
        .filter(|n| filter.as_ref().is_none_or(|re| re.is_match(n)))
        .collect())
}

// =============================================================================
// Searches
// =============================================================================

/// Database: book_count
fn native_book_count(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "book_count";
    let [query, use_vl] = fixed::<2>(NAME, args)?;
    ctx.forbid_in_composite(NAME)?;
    let ids = ctx.database(NAME)?.search(query, use_vl != "0")?;
    Ok(Value::Text(ids.len().to_string()))
}

/// Database: book_values
fn native_book_values(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "book_values";
    let [column, query, separator, use_vl] = fixed::<4>(NAME, args)?;
    ctx.forbid_in_composite(NAME)?;
    let database = ctx.database(NAME)?;
    if database.field_info(column).is_none() {
        return Err(Error::invalid_argument(
            NAME,
            format!("The column {column} doesn't exist"),
        ));
    }
    let mut values = BTreeSet::new();
    for id in database.search(query, use_vl != "0")? {
        match database.field_for(column, id) {
            Some(FieldValue::List(items)) => values.extend(items),
            Some(value) if !value.is_empty() => {
                values.insert(value.render(", "));
            }
            _ => {}
        }
    }
    let mut values: Vec<String> = values.into_iter().collect();
    text::sort_by_key(&mut values);
    Ok(Value::Text(values.join(separator)))
}

// =============================================================================
// Book State
// =============================================================================

/// Database: annotation_count
fn native_annotation_count(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    const NAME: &str = "annotation_count";
    let count = ctx.database(NAME)?.annotation_count(ctx.book_id(NAME)?);
    Ok(if count == 0 {
        Value::empty()
    } else {
        Value::Text(count.to_string())
    })
}

/// Database: is_marked
fn native_is_marked(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    const NAME: &str = "is_marked";
    let mark = ctx.database(NAME)?.mark(ctx.book_id(NAME)?);
    Ok(match mark {
        Some(text) if text.is_empty() => Value::from("true"),
        Some(text) => Value::Text(text),
        None => Value::empty(),
    })
}

/// Database: virtual_libraries
fn native_virtual_libraries(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    const NAME: &str = "virtual_libraries";
    let libraries = ctx.database(NAME)?.virtual_libraries_for_book(ctx.book_id(NAME)?);
    Ok(Value::Text(libraries.join(", ")))
}

/// Database: current_virtual_library_name
fn native_current_virtual_library_name(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    let database = ctx.database("current_virtual_library_name")?;
    Ok(Value::Text(database.current_virtual_library_name()))
}

/// Database: get_link
fn native_get_link(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [field, value] = fixed::<2>("get_link", args)?;
    let link = ctx.database("get_link")?.link_for(field, value);
    Ok(link.map_or_else(Value::empty, Value::Text))
}

// =============================================================================
// Extra Files
// =============================================================================

/// Database: has_extra_files
fn native_has_extra_files(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "has_extra_files";
    let pattern = match args {
        [] => None,
        [pattern] => Some(pattern.as_str()),
        _ => return Err(Error::arity(NAME, "accepts at most 1 argument")),
    };
    let count = extra_file_names(ctx, NAME, pattern)?.len();
    Ok(if count == 0 {
        Value::empty()
    } else {
        Value::Text(count.to_string())
    })
}

/// Database: extra_file_names
fn native_extra_file_names(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "extra_file_names";
    let (separator, pattern) = match args {
        [separator] => (separator, None),
        [separator, pattern] => (separator, Some(pattern.as_str())),
        _ => return Err(Error::arity(NAME, "requires 1 or 2 arguments")),
    };
    Ok(Value::Text(extra_file_names(ctx, NAME, pattern)?.join(separator)))
}

/// Database: extra_file_size
fn native_extra_file_size(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "extra_file_size";
    let [file_name] = fixed::<1>(NAME, args)?;
    let files = ctx.database(NAME)?.extra_files(ctx.book_id(NAME)?);
    Ok(files
        .iter()
        .find(|f| f.name() == file_name)
        .map_or_else(|| Value::from("-1"), |f| Value::Text(f.size.to_string())))
}

/// Database: extra_file_modtime
fn native_extra_file_modtime(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "extra_file_modtime";
    let [file_name, format] = fixed::<2>(NAME, args)?;
    let files = ctx.database(NAME)?.extra_files(ctx.book_id(NAME)?);
    let Some(file) = files.iter().find(|f| f.name() == file_name) else {
        return Ok(Value::from("-1"));
    };
    if format.is_empty() {
        return Ok(Value::Float(dates::timestamp(&file.mtime)));
    }
    Ok(Value::Text(dates::format_date(&file.mtime, format)))
}

// =============================================================================
// Notes
// =============================================================================

/// Database: get_note
fn native_get_note(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [field, value, plain_text] = fixed::<3>("get_note", args)?;
    let database = ctx.database("get_note")?;
    let note = database
        .item_id(field, value)
        .and_then(|item| database.note_for(field, item));
    Ok(match note {
        Some(note) if plain_text == "1" => Value::Text(note.text),
        Some(note) => Value::Text(note.html),
        None => Value::empty(),
    })
}

/// Database: has_note
fn native_has_note(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "has_note";
    let [field, value] = fixed::<2>(NAME, args)?;
    let database = ctx.database(NAME)?;
    if !value.is_empty() {
        let has = database
            .item_id(field, value)
            .is_some_and(|item| database.note_for(field, item).is_some());
        return Ok(Value::from_flag(has));
    }
    let with_notes = database.items_with_notes(field);
    let book_values = match ctx.metadata(NAME)?.get(field) {
        Some(FieldValue::List(items)) => items,
        Some(other) if !other.is_empty() => vec![other.render(", ")],
        _ => Vec::new(),
    };
    let noted: Vec<String> = book_values
        .into_iter()
        .filter(|v| {
            database
                .item_id(field, v)
                .is_some_and(|item| with_notes.contains(&item))
        })
        .collect();
    let separator = database
        .field_info(field)
        .as_ref()
        .map_or_else(|| ", ".to_string(), FieldInfo::display_separator);
    Ok(Value::Text(noted.join(&separator)))
}

/// GUI: is_dark_mode
fn native_is_dark_mode(ctx: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Ok(Value::from_flag(ctx.gui("is_dark_mode")?.is_dark_theme()))
}
