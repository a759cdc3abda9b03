//! Session-level rendering tests

use std::sync::Arc;

use marginalia::foundation::{FormatterConfig, MemoryDatabase, MemoryMetadata};
use marginalia::runtime::{LineEditor, ReadResult, Repl, Session};

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn session_renders_the_book() {
    let mut session = Session::new();
    session.set_field("title", "Dune");
    session.set_field("authors", "Frank Herbert");
    session.set_field("tags", "SF, Classic");
    assert_eq!(
        session.evaluate("{title} by {authors} [{tags:list_sort(0,\\,)}]"),
        "Dune by Frank Herbert [Classic, SF]"
    );
}

#[test]
fn session_reports_errors_as_text_or_values() {
    let session = Session::new();
    assert!(session.evaluate("program: f(").starts_with("TEMPLATE ERROR"));
    assert!(session.try_evaluate("program: f(").is_err());
}

#[test]
fn session_configuration_changes_error_text() {
    let mut session = Session::new();
    session.set_config(FormatterConfig::default().with_error_prefix("OOPS"));
    assert!(session.evaluate("program: nope()").starts_with("OOPS: "));
}

#[test]
fn session_database_serves_library_functions() {
    let database = MemoryDatabase::new("/library")
        .with_book(1, MemoryMetadata::new().with_field("title", "Dune"))
        .with_book(2, MemoryMetadata::new().with_field("title", "Emma"));
    let session = Session::new().with_database(Arc::new(database));
    assert_eq!(session.evaluate("program: book_count('', 0)"), "2");
}

// =============================================================================
// REPL
// =============================================================================

struct Script {
    lines: Vec<String>,
}

impl LineEditor for Script {
    fn read_line(&mut self, _prompt: &str) -> marginalia::foundation::Result<ReadResult> {
        Ok(if self.lines.is_empty() {
            ReadResult::Eof
        } else {
            ReadResult::Line(self.lines.remove(0))
        })
    }

    fn add_history(&mut self, _line: &str) {}

    fn set_keywords(&mut self, _keywords: Vec<String>) {}
}

#[test]
fn repl_session_survives_a_script() {
    let lines = [
        ":set title The Hobbit",
        ":def shout 1 program: arguments(x); uppercase(x)",
        ":def whisper 1 def evaluate(x):",
        "    lowercase(x)",
        "",
        "{title:shout()}",
    ];
    let script = Script {
        lines: lines.iter().map(|l| (*l).to_string()).collect(),
    };
    let mut repl = Repl::with_editor(script).without_banner();
    repl.run().unwrap();
    assert_eq!(repl.session().evaluate("{title:shout()}"), "THE HOBBIT");
    assert_eq!(repl.session().evaluate("{title:whisper()}"), "the hobbit");
}
