//! Template-mode scanning tests

use marginalia_language::{FieldSpec, Segment, Template, parse_template};

fn segments(source: &str) -> Vec<Segment> {
    match parse_template(source).unwrap() {
        Template::Segments(segments) => segments,
        Template::Program(_) => panic!("expected segments for {source:?}"),
    }
}

fn specs(source: &str) -> Vec<(String, FieldSpec)> {
    segments(source)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Field(field) => Some((field.name, field.spec)),
            Segment::Text(_) => None,
        })
        .collect()
}

// =============================================================================
// Field References
// =============================================================================

#[test]
fn plain_text_is_one_segment() {
    assert_eq!(
        segments("no fields here"),
        vec![Segment::Text("no fields here".into())]
    );
}

#[test]
fn fields_between_text() {
    let s = segments("[{series}] {title}");
    assert_eq!(s.len(), 4);
    assert_eq!(s[0], Segment::Text("[".into()));
    assert_eq!(s[2], Segment::Text("] ".into()));
}

#[test]
fn every_spec_kind() {
    let fields = specs("{title}{#pages:05d|p. |}{tags:sublist(0,1,\\,)}{authors:'uppercase($)'}");
    assert_eq!(fields[0], ("title".into(), FieldSpec::Plain));
    assert_eq!(
        fields[1],
        (
            "#pages".into(),
            FieldSpec::Format {
                format: "05d".into(),
                prefix: "p. ".into(),
                suffix: String::new(),
            }
        )
    );
    match &fields[2].1 {
        FieldSpec::Function { name, args, .. } => {
            assert_eq!(name, "sublist");
            assert_eq!(args, &["0".to_string(), "1".into(), ",".into()]);
        }
        other => panic!("expected function spec, got {other:?}"),
    }
    assert!(matches!(fields[3].1, FieldSpec::Program(_)));
}

// =============================================================================
// Modes and Errors
// =============================================================================

#[test]
fn program_prefix_switches_mode() {
    assert!(matches!(
        parse_template("program: $title"),
        Ok(Template::Program(_))
    ));
    assert!(matches!(
        parse_template(" program: $title"),
        Ok(Template::Segments(_))
    ));
}

#[test]
fn unbalanced_braces_are_errors() {
    for source in ["{title", "title}", "{a{b}}"] {
        assert!(parse_template(source).is_err(), "{source}");
    }
}
