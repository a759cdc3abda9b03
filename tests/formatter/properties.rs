//! Property tests for rendering invariants

use marginalia_foundation::{Kwargs, Locals, MemoryMetadata};
use marginalia_functions::Formatter;
use proptest::prelude::*;

use crate::formatter;

proptest! {
    #[test]
    fn plain_text_renders_trimmed(text in "[a-zA-Z0-9 ,.!?-]{0,40}") {
        let out = formatter()
            .unsafe_format(&text, Some(&MemoryMetadata::new()), &Kwargs::new())
            .unwrap();
        prop_assert_eq!(out, text.trim());
    }

    #[test]
    fn integer_arithmetic_matches_rust(a in -1000i64..1000, b in -1000i64..1000) {
        let f = formatter();
        let book = MemoryMetadata::new();
        let render = |t: String| f.unsafe_format(&t, Some(&book), &Kwargs::new()).unwrap();
        prop_assert_eq!(render(format!("program: {a} + {b}")), (a + b).to_string());
        prop_assert_eq!(render(format!("program: {a} * {b}")), (a * b).to_string());
        let less = if a < b { "1" } else { "" };
        prop_assert_eq!(render(format!("program: {a} <# {b}")), less);
    }

    #[test]
    fn eval_writes_back_to_the_callers_locals(value in "[a-z]{1,12}") {
        let f = formatter();
        let mut locals = Locals::new();
        let program = format!("program: v = '{value}'");
        f.render_eval(&program, &mut locals).unwrap();
        prop_assert_eq!(locals.get("v"), Some(value.as_str()));
    }

    #[test]
    fn templates_never_leak_assignments(value in "[a-z]{1,12}") {
        let f = formatter();
        let program = format!("program: v = 'outer'; template('program: v = \"{value}\"'); v");
        let out = f
            .unsafe_format(&program, Some(&MemoryMetadata::new()), &Kwargs::new())
            .unwrap();
        prop_assert_eq!(out, "outer");
    }
}
