//! Fuzz tests for lexer, parser, and template scanner crash resistance.
//!
//! These tests use property-based testing to verify that no input, however
//! malformed, makes the front end panic.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::token::TokenKind;
    use crate::{Lexer, parse_program, parse_template};

    fn tokenize_all(input: &str) {
        let mut lexer = Lexer::new(input);
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
        }
    }

    // ==========================================================================
    // Generators
    // ==========================================================================

    /// Strategy for generating completely random strings.
    fn arbitrary_string() -> impl Strategy<Value = String> {
        prop::collection::vec(any::<char>(), 0..500).prop_map(|chars| chars.into_iter().collect())
    }

    /// Strategy for generating strings shaped like programs.
    fn program_like_string() -> impl Strategy<Value = String> {
        let atom = prop_oneof![
            "[0-9]+".prop_map(String::from),
            "[a-z_][a-z0-9_]*".prop_map(String::from),
            "\\$\\$?#?[a-z_]+".prop_map(String::from),
            "'[^'\\\\]*'".prop_map(String::from),
            "(if|then|elif|else|fi|for|in|rof|separator)".prop_map(String::from),
        ];

        let punct = prop_oneof![
            Just("(".to_string()),
            Just(")".to_string()),
            Just(",".to_string()),
            Just(";".to_string()),
            Just(":".to_string()),
            Just("=".to_string()),
            Just("==#".to_string()),
            Just("&&".to_string()),
            Just("||".to_string()),
            Just("!".to_string()),
            Just("-".to_string()),
            Just(" ".to_string()),
            Just("\n".to_string()),
        ];

        prop::collection::vec(prop_oneof![atom, punct], 0..80).prop_map(|parts| parts.join(""))
    }

    /// Strategy for strings shaped like templates.
    fn template_like_string() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("{".to_string()),
                Just("}".to_string()),
                Just(":".to_string()),
                Just("|".to_string()),
                Just("'".to_string()),
                Just("(".to_string()),
                Just(")".to_string()),
                Just("\\".to_string()),
                "[a-z ]{1,5}".prop_map(String::from),
            ],
            0..60,
        )
        .prop_map(|parts| parts.join(""))
    }

    /// Strategy for deep nesting.
    fn deeply_nested() -> impl Strategy<Value = String> {
        (1..100usize).prop_map(|depth| {
            let open: String = "f(".repeat(depth);
            let close: String = std::iter::repeat_n(')', depth).collect();
            format!("{open}'a'{close}")
        })
    }

    // ==========================================================================
    // Lexer
    // ==========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Lexer never panics on arbitrary input.
        #[test]
        fn lexer_never_panics_on_arbitrary_input(input in arbitrary_string()) {
            tokenize_all(&input);
        }

        /// Lexer never panics on program-like input.
        #[test]
        fn lexer_never_panics_on_program_like_input(input in program_like_string()) {
            tokenize_all(&input);
        }
    }

    // ==========================================================================
    // Parser and template scanner
    // ==========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Parser never panics on arbitrary input.
        #[test]
        fn parser_never_panics_on_arbitrary_input(input in arbitrary_string()) {
            let _ = parse_program(&input);
        }

        /// Parser never panics on program-like input.
        #[test]
        fn parser_never_panics_on_program_like_input(input in program_like_string()) {
            let _ = parse_program(&input);
        }

        /// Nested calls parse at any reasonable depth.
        #[test]
        fn parser_handles_deep_nesting(input in deeply_nested()) {
            prop_assert!(parse_program(&input).is_ok());
        }

        /// Template scanner never panics.
        #[test]
        fn template_scanner_never_panics(input in template_like_string()) {
            let _ = parse_template(&input);
        }

        /// Text without braces or backslashes is a single text segment.
        #[test]
        fn plain_text_round_trips(text in "[a-zA-Z0-9 .,;:!?-]{1,40}") {
            match parse_template(&text) {
                Ok(crate::Template::Segments(segments)) => {
                    prop_assert_eq!(segments, vec![crate::Segment::Text(text.clone())]);
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
