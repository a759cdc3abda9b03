//! Integration tests for variable scopes and keyword arguments

use marginalia_foundation::{Kwargs, Locals};

#[test]
fn locals_bind_and_shadow() {
    let mut locals = Locals::new();
    assert!(locals.is_empty());
    assert_eq!(locals.set("x", "1"), None);
    assert_eq!(locals.set("x", "2").as_deref(), Some("1"));
    assert_eq!(locals.get("x"), Some("2"));
    assert!(locals.contains("x"));
    assert_eq!(locals.len(), 1);
}

#[test]
fn locals_with_value_binds_dollar() {
    let locals = Locals::with_value("The Hobbit");
    assert_eq!(locals.get("$"), Some("The Hobbit"));
}

#[test]
fn locals_collect_from_pairs() {
    let locals: Locals = [("b", "2"), ("a", "1")].into_iter().collect();
    let mut names = locals.names();
    names.sort();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn locals_remove() {
    let mut locals = Locals::new();
    locals.set("x", "1");
    assert_eq!(locals.remove("x").as_deref(), Some("1"));
    assert!(!locals.contains("x"));
}

#[test]
fn kwargs_lookup() {
    let kwargs = Kwargs::new().with("shelf", "top").with("room", "study");
    assert_eq!(kwargs.get("shelf"), Some("top"));
    assert_eq!(kwargs.get("floor"), None);
    assert!(!kwargs.is_empty());
    assert!(Kwargs::new().is_empty());
}
