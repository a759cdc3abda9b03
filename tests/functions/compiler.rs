//! User-function compiler tests

use marginalia_foundation::ErrorKind;
use marginalia_functions::{
    ArgCount, Category, FunctionBody, FunctionRegistry, ObjectType, UserFunctionDef,
    compile_user_function, compile_user_template_functions, load_user_template_functions,
};

#[test]
fn three_kinds_of_definition() {
    let template = UserFunctionDef::new("t", "", 1, "program: arguments(x); x");
    let program = UserFunctionDef::new("p", "", -1, "python:\narg1");
    let native = UserFunctionDef::new("n", "", 1, "def evaluate(x):\n    x");
    assert_eq!(template.object_type(), ObjectType::StoredMacroTemplate);
    assert_eq!(program.object_type(), ObjectType::StoredMacroProgram);
    assert_eq!(native.object_type(), ObjectType::NativeFunction);

    let native = compile_user_function(&native).unwrap();
    match &native.body {
        FunctionBody::Native(compiled) => assert_eq!(compiled.params, ["x"]),
        other => panic!("expected a native body, got {other:?}"),
    }
    assert_eq!(native.category, Category::UserDefined);
}

#[test]
fn declared_counts_become_contracts() {
    let f = compile_user_function(&UserFunctionDef::new("f", "", -1, "program: 1")).unwrap();
    assert_eq!(f.arg_count, ArgCount::Variadic);
    assert!(f.check_arity(7).is_ok());

    let g = compile_user_function(&UserFunctionDef::new("g", "", 2, "program: 1")).unwrap();
    assert!(g.check_arity(2).is_ok());
    assert!(matches!(
        g.check_arity(1).unwrap_err().kind,
        ErrorKind::ArityMismatch { expected: 2, actual: 1, .. }
    ));
}

#[test]
fn tabs_are_normalized_in_native_sources() {
    let f = compile_user_function(&UserFunctionDef::new(
        "f",
        "",
        1,
        "def evaluate(x):\n\tuppercase(x)",
    ))
    .unwrap();
    assert_eq!(f.program_text, "def evaluate(x):\n    uppercase(x)");
}

#[test]
fn compilation_errors_name_the_function() {
    for source in [
        "",
        "evaluate(x): x",
        "def evaluate(x)\n    x",
        "def evaluate(x):\n    f(",
        "def evaluate(a, b):\n    a",
    ] {
        let err = compile_user_function(&UserFunctionDef::new("broken", "", 1, source)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Compilation { .. }), "{source:?}");
        assert!(err.to_string().starts_with("Error compiling function broken:"));
    }
}

#[test]
fn batches_skip_failures() {
    let defs = [
        UserFunctionDef::new("good", "", 0, "program: 1"),
        UserFunctionDef::new("bad", "", 0, "def oops"),
        UserFunctionDef::new("also_good", "", -1, "python:\n2"),
    ];
    let compiled = compile_user_template_functions(&defs);
    let names: Vec<_> = compiled.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["good", "also_good"]);

    let registry = FunctionRegistry::with_builtins();
    assert_eq!(load_user_template_functions(&registry, "lib", &defs), 2);
    assert!(registry.lookup("bad").is_none());
}

#[test]
fn later_definitions_replace_earlier_ones_in_a_batch() {
    let defs = [
        UserFunctionDef::new("f", "", 0, "program: 'old'"),
        UserFunctionDef::new("g", "", 0, "program: 'g'"),
        UserFunctionDef::new("f", "", 0, "program: 'new'"),
        UserFunctionDef::new("g", "", 0, "def oops"),
    ];
    let compiled = compile_user_template_functions(&defs);
    let names: Vec<_> = compiled.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["f", "g"]);
    assert_eq!(compiled[0].program_text, "program: 'new'");
    assert_eq!(compiled[1].program_text, "program: 'g'");

    let registry = FunctionRegistry::with_builtins();
    assert_eq!(load_user_template_functions(&registry, "lib", &defs), 2);
    let f = registry.lookup("f").unwrap();
    assert!(matches!(f.body, FunctionBody::StoredTemplate));
    assert_eq!(f.program_text, "program: 'new'");
}

#[test]
fn definitions_convert_to_persisted_tuples() {
    let def = UserFunctionDef::new("f", "doc", 2, "program: 1");
    let tuple: (String, String, i32, String) = def.clone().into();
    assert_eq!(tuple.2, 2);
    assert_eq!(UserFunctionDef::from(tuple), def);
}
