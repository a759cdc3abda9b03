//! Registry and library overlay tests

use std::sync::Arc;

use marginalia_functions::{
    ArgCount, FunctionBody, FunctionRegistry, UserFunctionDef, load_user_template_functions,
    unload_user_template_functions,
};

fn def(name: &str, source: &str) -> UserFunctionDef {
    UserFunctionDef::new(name, "", -1, source)
}

// =============================================================================
// Builtins
// =============================================================================

#[test]
fn builtin_library_is_complete() {
    let registry = FunctionRegistry::with_builtins();
    for name in [
        "add", "strcat", "uppercase", "list_union", "format_date", "book_count", "switch",
        "first_non_empty", "template", "eval", "arguments", "globals", "set_globals",
        "list_count_field", "re_group", "connected_device_name",
    ] {
        assert!(registry.lookup(name).is_some(), "{name} missing");
    }
    assert!(registry.snapshot().conflicts().is_empty());
}

#[test]
fn names_are_sorted_primary_names() {
    let registry = FunctionRegistry::with_builtins();
    let names = registry.snapshot().names();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"list_contains".to_string()));
    assert!(!names.contains(&"in_list".to_string()));
}

#[test]
fn inline_functions_are_builtins() {
    let registry = FunctionRegistry::with_builtins();
    let arguments = registry.lookup("arguments").unwrap();
    assert!(arguments.is_inline());
    assert!(arguments.is_builtin());
}

// =============================================================================
// Library Overlays
// =============================================================================

#[test]
fn library_functions_overlay_builtins() {
    let registry = FunctionRegistry::with_builtins();
    let loaded = load_user_template_functions(
        &registry,
        "lib",
        &[def("shout", "program: uppercase(arguments(x))")],
    );
    assert_eq!(loaded, 1);
    assert!(registry.lookup("shout").is_some());
    assert_eq!(registry.library_ids(), ["lib"]);
    assert_eq!(registry.library_functions("lib").len(), 1);
}

#[test]
fn reloading_a_library_replaces_its_functions() {
    let registry = FunctionRegistry::with_builtins();
    load_user_template_functions(&registry, "lib", &[def("a", "program: 1")]);
    load_user_template_functions(&registry, "lib", &[def("b", "program: 2")]);
    assert!(registry.lookup("a").is_none());
    assert!(registry.lookup("b").is_some());
}

#[test]
fn identical_definitions_in_two_libraries_coexist() {
    let registry = FunctionRegistry::with_builtins();
    load_user_template_functions(&registry, "one", &[def("f", "program: 'x'")]);
    load_user_template_functions(&registry, "two", &[def("f", "program: 'x'")]);
    let f = registry.lookup("f").unwrap();
    assert!(matches!(f.body, FunctionBody::StoredTemplate));
    assert!(registry.snapshot().conflicts().is_empty());
}

#[test]
fn different_definitions_conflict_until_one_unloads() {
    let registry = FunctionRegistry::with_builtins();
    load_user_template_functions(&registry, "one", &[def("f", "program: 'one'")]);
    load_user_template_functions(&registry, "two", &[def("f", "program: 'two'")]);

    let f = registry.lookup("f").unwrap();
    assert!(matches!(f.body, FunctionBody::ConflictPlaceholder));
    assert_eq!(f.arg_count, ArgCount::Variadic);
    assert_eq!(registry.snapshot().conflicts(), ["f".to_string()]);

    unload_user_template_functions(&registry, "one");
    let f = registry.lookup("f").unwrap();
    assert_eq!(f.program_text, "program: 'two'");
    assert!(registry.snapshot().conflicts().is_empty());
}

#[test]
fn reset_restores_builtins() {
    let registry = FunctionRegistry::with_builtins();
    let before = registry.snapshot().len();
    load_user_template_functions(&registry, "lib", &[def("f", "program: 1")]);
    registry.reset_to_builtins();
    assert_eq!(registry.snapshot().len(), before);
    assert!(registry.library_ids().is_empty());
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn snapshots_are_unaffected_by_later_loads() {
    let registry = FunctionRegistry::with_builtins();
    let before = registry.snapshot();
    load_user_template_functions(&registry, "lib", &[def("late", "program: 1")]);
    assert!(!before.contains("late"));
    assert!(registry.snapshot().contains("late"));
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = Arc::new(FunctionRegistry::with_builtins());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let body = format!("program: {i}");
                load_user_template_functions(
                    &registry,
                    &format!("lib{i}"),
                    &[def(&format!("f{i}"), &body)],
                );
                registry.lookup("strcat").is_some()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(registry.library_ids().len(), 4);
    for i in 0..4 {
        assert!(registry.lookup(&format!("f{i}")).is_some());
    }
}
