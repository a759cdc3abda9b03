//! Program-mode parsing tests

use marginalia_language::{ArithOp, CompareOp, Expr, Lexer, TokenKind, parse_program};

fn single(source: &str) -> Expr {
    let mut program = parse_program(source).unwrap();
    assert_eq!(program.statements.len(), 1, "{source}");
    program.statements.remove(0)
}

// =============================================================================
// Lexer
// =============================================================================

#[test]
fn lexer_distinguishes_field_forms() {
    let tokens = Lexer::tokenize_all("$title $$#read");
    assert_eq!(
        tokens[0].kind,
        TokenKind::Field {
            name: "title".into(),
            raw: false
        }
    );
    assert_eq!(
        tokens[1].kind,
        TokenKind::Field {
            name: "#read".into(),
            raw: true
        }
    );
}

#[test]
fn lexer_reads_numeric_comparisons() {
    let kinds: Vec<TokenKind> = Lexer::tokenize_all("a >=# 1")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(kinds[1], TokenKind::Compare(CompareOp::NumGe));
}

// =============================================================================
// Parser
// =============================================================================

#[test]
fn multiplication_binds_tighter_than_addition() {
    match single("1 + 2 * 3") {
        Expr::Arith {
            op: ArithOp::Add,
            right,
            ..
        } => assert!(matches!(*right, Expr::Arith { op: ArithOp::Mul, .. })),
        other => panic!("expected addition, got {other:?}"),
    }
}

#[test]
fn comparison_wraps_arithmetic() {
    assert!(matches!(
        single("$#pages - 10 <# 300"),
        Expr::Compare {
            op: CompareOp::NumLt,
            ..
        }
    ));
}

#[test]
fn in_is_a_regex_match() {
    assert!(matches!(single("'^the' in $title"), Expr::Matches { .. }));
}

#[test]
fn negative_literals_stay_literals() {
    assert_eq!(single("-3").as_literal(), Some("-3"));
    assert!(matches!(single("-x"), Expr::Negate(..)));
}

#[test]
fn statements_are_separated_by_semicolons() {
    let program = parse_program("a = 1; b = 2; strcat(a, b)").unwrap();
    assert_eq!(program.statements.len(), 3);
    assert_eq!(program.called_functions(), ["strcat"]);
}

#[test]
fn control_flow_parses() {
    assert!(matches!(
        single("if a then b elif c then d else e fi"),
        Expr::If { ref branches, otherwise: Some(_), .. } if branches.len() == 2
    ));
    assert!(matches!(
        single("for t in $tags separator '&': t rof"),
        Expr::For { separator: Some(_), .. }
    ));
}

#[test]
fn malformed_programs_are_errors() {
    for source in ["f(1,", "if a then b", "for x in y: x", "a = ", "1 2"] {
        assert!(parse_program(source).is_err(), "{source}");
    }
}
