//! Library switching and user-function lifecycle tests

use marginalia::functions::UserFunctionDef;
use marginalia::runtime::{DEFAULT_LIBRARY, Session};

fn greet(body: &str) -> UserFunctionDef {
    UserFunctionDef::new("greet", "Greets someone", 1, body)
}

#[test]
fn sessions_start_in_the_default_library() {
    let session = Session::new();
    assert_eq!(session.current_library(), DEFAULT_LIBRARY);
    assert_eq!(session.libraries(), [DEFAULT_LIBRARY]);
}

#[test]
fn functions_follow_their_library() {
    let mut session = Session::new();
    let loaded = session.load_library(
        "fiction",
        vec![greet("program: arguments(who); strcat('Hello, ', who)")],
    );
    assert_eq!(loaded, 1);
    assert_eq!(session.evaluate("program: greet('Bilbo')"), "Hello, Bilbo");
    assert_eq!(session.function("greet").unwrap().doc, "Greets someone");

    session.unload_library("fiction").unwrap();
    assert!(session.function("greet").is_none());
}

#[test]
fn same_definition_in_two_libraries_is_not_a_conflict() {
    let body = "program: arguments(who); strcat('Hi ', who)";
    let mut session = Session::new();
    session.load_library("one", vec![greet(body)]);
    session.load_library("two", vec![greet(body)]);
    assert_eq!(session.evaluate("program: greet('Sam')"), "Hi Sam");
}

#[test]
fn different_definitions_report_a_duplicate_name() {
    let mut session = Session::new();
    session.load_library("one", vec![greet("program: 'one'")]);
    session.load_library("two", vec![greet("program: 'two'")]);
    let out = session.evaluate("program: greet('Sam')");
    assert!(out.contains("Duplicate user function name greet"), "{out}");

    session.unload_library("two").unwrap();
    assert_eq!(session.evaluate("program: greet('Sam')"), "one");
}

#[test]
fn redefining_replaces_the_current_librarys_function() {
    let mut session = Session::new();
    session
        .define_function(UserFunctionDef::new("f", "", 0, "program: 'first'"))
        .unwrap();
    session
        .define_function(UserFunctionDef::new("f", "", 0, "program: 'second'"))
        .unwrap();
    assert_eq!(session.evaluate("program: f()"), "second");
}

#[test]
fn every_active_function_is_listed_once() {
    let mut session = Session::new();
    session
        .define_function(UserFunctionDef::new("zz_last", "", 0, "program: 1"))
        .unwrap();
    let names: Vec<String> = session.functions().iter().map(|f| f.name.clone()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(names, sorted);
    assert_eq!(names.last().map(String::as_str), Some("zz_last"));
}
