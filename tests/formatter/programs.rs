//! Program-mode evaluation tests

use marginalia_foundation::ErrorKind;

use crate::render;

// =============================================================================
// Operators
// =============================================================================

#[test]
fn arithmetic_renders_integers_plainly() {
    assert_eq!(render("program: 1 + 2 * 3").unwrap(), "7");
    assert_eq!(render("program: (1 + 2) * 3").unwrap(), "9");
    assert_eq!(render("program: 1 / 4").unwrap(), "0.25");
    assert_eq!(render("program: $#pages - 10").unwrap(), "300");
}

#[test]
fn division_by_zero_is_an_error() {
    assert!(matches!(
        render("program: 1 / 0").unwrap_err().kind,
        ErrorKind::DivisionByZero
    ));
}

#[test]
fn string_comparisons_ignore_case() {
    assert_eq!(render("program: 'abc' == 'ABC'").unwrap(), "1");
    assert_eq!(render("program: 'abc' < 'abd'").unwrap(), "1");
    assert_eq!(render("program: 'b' < 'A'").unwrap(), "");
}

#[test]
fn numeric_comparisons() {
    assert_eq!(render("program: '10' ># '9'").unwrap(), "1");
    assert_eq!(render("program: '10' > '9'").unwrap(), "");
    assert_eq!(render("program: '' ==# 0").unwrap(), "1");
}

#[test]
fn boolean_operators_short_circuit() {
    assert_eq!(render("program: '' && 1 / 0").unwrap(), "");
    assert_eq!(render("program: 'x' || 1 / 0").unwrap(), "1");
    assert_eq!(render("program: !''").unwrap(), "1");
}

#[test]
fn in_searches_case_insensitively() {
    assert_eq!(render("program: '^the' in $title").unwrap(), "1");
    assert_eq!(render("program: 'ring' in $title").unwrap(), "");
}

// =============================================================================
// Control Flow
// =============================================================================

#[test]
fn if_elif_else() {
    let program = "program: if $#pages <# 100 then 'short' elif $#pages <# 500 then 'medium' \
                   else 'long' fi";
    assert_eq!(render(program).unwrap(), "medium");
    assert_eq!(render("program: if '' then 'x' fi").unwrap(), "");
}

#[test]
fn for_loops_with_separators() {
    assert_eq!(
        render("program: r = ''; for t in 'a&b&c' separator '&': r = strcat(r, t) rof; r")
            .unwrap(),
        "abc"
    );
    assert_eq!(
        render("program: n = 0; for t in $tags: n = n + 1 rof; n").unwrap(),
        "3"
    );
}

#[test]
fn unassigned_variables_are_errors() {
    assert!(matches!(
        render("program: nothing").unwrap_err().kind,
        ErrorKind::UnknownIdentifier(_)
    ));
}

// =============================================================================
// Builtins
// =============================================================================

#[test]
fn builtins_compose() {
    assert_eq!(
        render("program: list_join(' | ', list_sort($tags, 0, ','), ',')").unwrap(),
        "Children | Classic | Fantasy"
    );
    assert_eq!(render("program: strlen($title)").unwrap(), "10");
    assert_eq!(render("program: test($series, 'yes', 'no')").unwrap(), "yes");
}

#[test]
fn lazy_functions_skip_unused_arguments() {
    assert_eq!(render("program: first_non_empty('', 'a', 1 / 0)").unwrap(), "a");
    assert_eq!(render("program: switch_if('x', 'hit', 1 / 0)").unwrap(), "hit");
}

#[test]
fn unknown_functions_and_bad_arity() {
    assert!(matches!(
        render("program: no_such_thing()").unwrap_err().kind,
        ErrorKind::UnknownFunction(_)
    ));
    assert!(matches!(
        render("program: uppercase('a', 'b')").unwrap_err().kind,
        ErrorKind::ArityMismatch { .. }
    ));
}
