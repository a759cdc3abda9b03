//! Library-backed function tests

use std::sync::Arc;

use marginalia_foundation::{
    Database, ErrorKind, FormatterConfig, Kwargs, MemoryDatabase, MemoryGui, MemoryMetadata,
    MemoryProxy, StorageLocation,
};

use crate::{formatter, hobbit};

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
        .with_mark(1, "")
        .with_annotations(1, 3)
}

fn shared() -> Arc<dyn Database> {
    Arc::new(library())
}

#[test]
fn library_queries_through_the_formatter() {
    let f = formatter().with_database(shared());
    let book = hobbit().with_book_id(1);
    let render = |t: &str| f.unsafe_format(t, Some(&book), &Kwargs::new()).unwrap();
    assert_eq!(render("program: book_count('tags:=classic', 0)"), "2");
    assert_eq!(render("program: book_count('tags:=classic', 1)"), "1");
    assert_eq!(
        render("program: book_values('tags', 'tags:=classic', ', ', 0)"),
        "Children, Classic, Fantasy, Romance"
    );
    assert_eq!(render("program: is_marked()"), "true");
    assert_eq!(render("program: annotation_count()"), "3");
    assert_eq!(render("program: current_virtual_library_name()"), "Favourites");
    assert_eq!(render("program: virtual_libraries()"), "");
}

#[test]
fn books_reach_their_library_through_the_proxy() {
    let database = shared();
    let book = hobbit()
        .with_book_id(2)
        .with_proxy(MemoryProxy::connected(Arc::downgrade(&database)));
    let out = formatter()
        .unsafe_format("program: virtual_libraries()", Some(&book), &Kwargs::new())
        .unwrap();
    assert_eq!(out, "Favourites");
}

#[test]
fn closed_libraries_are_reported() {
    let database = shared();
    let book = hobbit()
        .with_book_id(1)
        .with_proxy(MemoryProxy::connected(Arc::downgrade(&database)));
    drop(database);
    let err = formatter()
        .unsafe_format("program: book_count('', 0)", Some(&book), &Kwargs::new())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "In function book_count: The database has been closed"
    );
}

#[test]
fn library_functions_need_a_library() {
    let err = formatter()
        .unsafe_format("program: book_count('', 0)", Some(&hobbit()), &Kwargs::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ContextUnavailable { .. }));
    assert_eq!(
        err.to_string(),
        "The function book_count can be used only in the GUI"
    );
}

#[test]
fn composite_columns_refuse_library_queries_by_default() {
    let f = formatter().with_database(shared());
    let out = f.render_composite("program: book_count('', 0)", &hobbit());
    assert!(out.contains("cannot be used in a composite column"), "{out}");

    let f = formatter()
        .with_database(shared())
        .with_config(FormatterConfig::permissive());
    assert_eq!(f.render_composite("program: book_count('', 0)", &hobbit()), "2");
}

#[test]
fn gui_functions() {
    let gui = MemoryGui {
        device: Some((
            "Kobo".to_string(),
            vec![(StorageLocation::Main, "uuid-main".to_string())],
        )),
        dark: true,
    };
    let f = formatter().with_gui(Arc::new(gui));
    let render = |t: &str| f.unsafe_format(t, Some(&hobbit()), &Kwargs::new()).unwrap();
    assert_eq!(render("program: connected_device_name('main')"), "Kobo");
    assert_eq!(render("program: connected_device_uuid('main')"), "uuid-main");
    assert_eq!(render("program: connected_device_name('carda')"), "");
    assert_eq!(render("program: is_dark_mode()"), "1");

    assert!(formatter()
        .unsafe_format("program: is_dark_mode()", Some(&hobbit()), &Kwargs::new())
        .is_err());
}
