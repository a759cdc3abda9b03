//! Integration tests for in-memory books and libraries

use marginalia_foundation::{
    Database, Datatype, FieldValue, MemoryDatabase, MemoryMetadata, Metadata, format_float,
};

fn hobbit() -> MemoryMetadata {
    MemoryMetadata::new()
        .with_field("title", "The Hobbit")
        .with_list("tags", ["Fantasy", "Classic"])
        .with_field("#pages", FieldValue::Int(310))
}

// =============================================================================
// Fields
// =============================================================================

#[test]
fn standard_fields_are_declared() {
    let book = MemoryMetadata::new();
    let authors = book.field_info("authors").unwrap();
    assert_eq!(authors.separator, Some('&'));
    assert_eq!(book.field_info("series_index").unwrap().datatype, Datatype::Float);
    assert!(book.get("title").is_none());
}

#[test]
fn unknown_keys_are_declared_by_value() {
    let book = hobbit();
    let pages = book.field_info("#pages").unwrap();
    assert!(pages.separator.is_none());
    let book = book.with_list("#shelves", ["a", "b"]);
    assert_eq!(book.field_info("#shelves").unwrap().separator, Some(','));
}

#[test]
fn list_values_render_with_separator() {
    let book = hobbit();
    let tags = book.get("tags").unwrap();
    assert_eq!(tags.as_list(), Some(&["Fantasy".to_string(), "Classic".to_string()][..]));
    assert_eq!(tags.render(", "), "Fantasy, Classic");
}

#[test]
fn scalar_values_render() {
    assert_eq!(FieldValue::Bool(true).render(", "), "true");
    assert_eq!(FieldValue::Int(7).render(", "), "7");
    assert!(FieldValue::Text(String::new()).is_empty());
}

#[test]
fn floats_keep_a_fraction() {
    assert_eq!(format_float(1.0), "1.0");
    assert_eq!(format_float(2.5), "2.5");
}

// =============================================================================
// Library
// =============================================================================

fn library() -> MemoryDatabase {
    MemoryDatabase::new("/books/Fiction")
        .with_book(1, hobbit())
        .with_book(
            2,
            MemoryMetadata::new()
                .with_field("title", "Emma")
                .with_list("tags", ["Romance", "Classic"]),
        )
        .with_virtual_library("Favourites", vec![2])
        .with_current_virtual_library("Favourites")
}

#[test]
fn search_by_field() {
    let db = library();
    assert_eq!(db.search("tags:=classic", false).unwrap(), vec![1, 2]);
    assert_eq!(db.search("title:hob", false).unwrap(), vec![1]);
    assert_eq!(db.search("", false).unwrap(), vec![1, 2]);
}

#[test]
fn search_respects_virtual_library() {
    let db = library();
    assert_eq!(db.search("tags:=classic", true).unwrap(), vec![2]);
    assert_eq!(db.current_virtual_library_name(), "Favourites");
    assert_eq!(db.virtual_libraries_for_book(2), vec!["Favourites".to_string()]);
    assert!(db.virtual_libraries_for_book(1).is_empty());
}

#[test]
fn books_carry_their_ids() {
    let db = library();
    assert_eq!(db.book(1).and_then(|b| b.book_id()), Some(1));
    assert_eq!(db.library_path().to_string_lossy(), "/books/Fiction");
}
