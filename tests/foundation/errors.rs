//! Integration tests for Error types
//!
//! Tests error construction, display, and frames.

use marginalia_foundation::{Error, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_arity_mismatch() {
    let err = Error::arity_mismatch("substr", 3, 2);
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("substr"));
    assert!(msg.contains('3'));
    assert!(msg.contains('2'));
}

#[test]
fn error_duplicate_function() {
    let err = Error::duplicate_function("shout");
    assert!(err.is_duplicate_function());
    assert!(format!("{err}").contains("shout"));
    assert!(!Error::internal("x").is_duplicate_function());
}

#[test]
fn error_compilation() {
    let err = Error::compilation("shout", "missing evaluate header");
    assert_eq!(
        err.to_string(),
        "Error compiling function shout: missing evaluate header"
    );
}

// =============================================================================
// Error Display
// =============================================================================

#[test]
fn error_display_lookups() {
    assert_eq!(
        Error::new(ErrorKind::UnknownFunction("nope".into())).to_string(),
        "nope: unknown function"
    );
    assert_eq!(
        Error::new(ErrorKind::UnknownIdentifier("x".into())).to_string(),
        "x: unknown identifier"
    );
    assert_eq!(
        Error::new(ErrorKind::UnknownField("#shelf".into())).to_string(),
        "#shelf: unknown field"
    );
}

#[test]
fn error_display_limits() {
    assert_eq!(
        Error::new(ErrorKind::RecursionLimit(32)).to_string(),
        "maximum template recursion depth (32) exceeded"
    );
    assert_eq!(
        Error::new(ErrorKind::DivisionByZero).to_string(),
        "division by zero"
    );
}

#[test]
fn error_parse_position() {
    let err = Error::parse("expected ')'", 2, 7);
    assert_eq!(err.to_string(), "parse error at 2:7: expected ')'");
}

// =============================================================================
// Frames
// =============================================================================

#[test]
fn frames_do_not_change_the_kind() {
    let err = Error::new(ErrorKind::DivisionByZero)
        .in_frame("outer")
        .in_frame("inner");
    assert!(matches!(err.kind, ErrorKind::DivisionByZero));
}
