//! Template-mode rendering tests

use marginalia_foundation::{ErrorKind, Kwargs, MemoryMetadata};

use crate::{formatter, hobbit, render};

#[test]
fn plain_fields() {
    assert_eq!(render("{title} ({authors})").unwrap(), "The Hobbit (J. R. R. Tolkien)");
    assert_eq!(render("{tags}").unwrap(), "Fantasy, Classic, Children");
}

#[test]
fn prefix_and_suffix_only_around_values() {
    assert_eq!(render("{series:|[|] }{title}").unwrap(), "[Middle-earth] The Hobbit");
    assert_eq!(render("{publisher:|[|] }{title}").unwrap(), "The Hobbit");
}

#[test]
fn format_specs() {
    assert_eq!(render("{#pages:05d}").unwrap(), "00310");
    assert_eq!(render("{series_index:0>5.2f}").unwrap(), "01.00");
}

#[test]
fn single_function_mode_passes_the_value_first() {
    assert_eq!(render("{title:uppercase()}").unwrap(), "THE HOBBIT");
    assert_eq!(render("{tags:sublist(0,1,\\,)}").unwrap(), "Fantasy");
    assert_eq!(render("{title:lowercase()|<|>}").unwrap(), "<the hobbit>");
}

#[test]
fn template_program_mode_binds_dollar() {
    assert_eq!(render("{title:'strcat($, \"!\")'}").unwrap(), "The Hobbit!");
    assert_eq!(render("{#pages:'$ * 2'}").unwrap(), "620");
}

#[test]
fn unknown_fields_are_errors_unless_in_kwargs() {
    assert!(matches!(
        render("{shelf}").unwrap_err().kind,
        ErrorKind::UnknownField(_)
    ));
    let kwargs = Kwargs::new().with("shelf", "top");
    let out = formatter()
        .unsafe_format("{title} on {shelf}", Some(&hobbit()), &kwargs)
        .unwrap();
    assert_eq!(out, "The Hobbit on top");
}

#[test]
fn templates_without_a_book_read_kwargs() {
    let kwargs = Kwargs::new().with("name", "Bilbo");
    assert_eq!(
        formatter().unsafe_format("Hi {name}", None, &kwargs).unwrap(),
        "Hi Bilbo"
    );
}

#[test]
fn empty_book_renders_empty_fields() {
    let out = formatter()
        .unsafe_format("[{title}]", Some(&MemoryMetadata::new()), &Kwargs::new())
        .unwrap();
    assert_eq!(out, "[]");
}

#[test]
fn safe_format_turns_errors_into_text() {
    let out = formatter().safe_format("{title", Some(&hobbit()), &Kwargs::new());
    assert!(out.starts_with("TEMPLATE ERROR: parse error"));
}
