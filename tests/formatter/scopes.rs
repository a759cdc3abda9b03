//! Variable scope, globals, and recursion tests

use std::sync::Arc;

use marginalia_formatter::TemplateFormatter;
use marginalia_foundation::{ErrorKind, FormatterConfig, Kwargs, Locals};
use marginalia_functions::{FunctionRegistry, UserFunctionDef, load_user_template_functions};

use crate::{formatter, hobbit, render};

// =============================================================================
// eval and template
// =============================================================================

#[test]
fn eval_runs_in_the_callers_scope() {
    assert_eq!(
        render("program: n = 'x'; eval('program: n = strcat(n, \"y\")'); n").unwrap(),
        "xy"
    );
}

#[test]
fn eval_fields_are_variables() {
    assert_eq!(render("program: who = 'Bilbo'; eval('Hi {who}')").unwrap(), "Hi Bilbo");
}

#[test]
fn template_runs_in_a_fresh_scope() {
    assert_eq!(
        render("program: n = 'x'; template('program: n = \"z\"'); n").unwrap(),
        "x"
    );
}

#[test]
fn assign_takes_a_bare_identifier() {
    assert_eq!(render("program: assign(x, 5); x").unwrap(), "5");
    assert_eq!(render("program: assign('x', 5); x").unwrap(), "5");
    assert_eq!(render("program: x = 1; assign(x, x + 1); x").unwrap(), "2");
}

#[test]
fn assign_inside_eval_reaches_the_caller() {
    assert_eq!(render("program: eval('program: assign(y, 1)'); y").unwrap(), "1");
}

#[test]
fn assign_inside_template_stays_local() {
    let err = render("program: template('program: assign(z, 1)'); z").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownIdentifier(ref name) if name == "z"));
}

#[test]
fn sub_template_errors_become_text() {
    assert_eq!(
        render("program: n = 'x'; template('program: n')").unwrap(),
        "TEMPLATE ERROR: n: unknown identifier"
    );
}

#[test]
fn template_sees_the_book() {
    assert_eq!(
        render("program: template('[{title}]')").unwrap(),
        "[The Hobbit]"
    );
}

// =============================================================================
// Globals
// =============================================================================

#[test]
fn globals_cross_user_function_calls() {
    let registry = Arc::new(FunctionRegistry::with_builtins());
    load_user_template_functions(
        &registry,
        "lib",
        &[UserFunctionDef::new(
            "remember",
            "",
            1,
            "program: arguments(v); last = v; set_globals(last)",
        )],
    );
    let f = TemplateFormatter::new(registry);
    f.unsafe_format("program: remember('ring')", Some(&hobbit()), &Kwargs::new())
        .unwrap();
    assert_eq!(f.global("last").as_deref(), Some("ring"));
    assert_eq!(
        f.unsafe_format("program: globals(last); last", Some(&hobbit()), &Kwargs::new())
            .unwrap(),
        "ring"
    );
}

#[test]
fn globals_seed_from_the_host() {
    let f = formatter().with_globals([("shelf", "top")].into_iter().collect::<Locals>());
    assert_eq!(
        f.unsafe_format("program: globals(shelf); shelf", Some(&hobbit()), &Kwargs::new())
            .unwrap(),
        "top"
    );
}

#[test]
fn globals_default_when_unset() {
    assert_eq!(render("program: globals(shelf='none'); shelf").unwrap(), "none");
}

#[test]
fn globals_set_by_the_host_are_visible() {
    let f = formatter();
    f.set_global("owner", "Frodo");
    assert_eq!(
        f.unsafe_format("program: globals(owner); owner", Some(&hobbit()), &Kwargs::new())
            .unwrap(),
        "Frodo"
    );
}

// =============================================================================
// Recursion
// =============================================================================

#[test]
fn runaway_recursion_stops_at_the_limit() {
    let registry = Arc::new(FunctionRegistry::with_builtins());
    load_user_template_functions(
        &registry,
        "lib",
        &[UserFunctionDef::new("forever", "", 0, "program: forever()")],
    );
    let f = TemplateFormatter::new(registry)
        .with_config(FormatterConfig::default().with_max_recursion_depth(10));
    let err = f
        .unsafe_format("program: forever()", Some(&hobbit()), &Kwargs::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::RecursionLimit(10)));

    // The depth counter unwinds after the failure.
    assert_eq!(
        f.unsafe_format("{title}", Some(&hobbit()), &Kwargs::new()).unwrap(),
        "The Hobbit"
    );
}
