//! The main REPL implementation.
//!
//! Lines beginning with `:` are session commands; anything else is rendered
//! as a template against the session's book.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use marginalia_foundation::{Error, ErrorKind, Result};
use marginalia_functions::UserFunctionDef;
use tracing::debug;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;

const HELP: &str = "\
:set FIELD VALUE        Set a field of the book (list fields split on ',')
:list FIELD A,B,...     Set a multi-valued field
:fields                 Show the book's fields
:def NAME ARGC SOURCE   Define a function in the current library
:undef NAME             Remove a function from the current library
:library [ID]           Show or switch the current library
:unload ID              Withdraw a library's functions
:functions              List the active functions
:doc NAME               Show a function's documentation
:help                   Show this help
Anything else is rendered as a template.";

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (book, libraries, formatter).
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,

    /// Continuation prompt (for multi-line input).
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        let mut repl = Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "» ".to_string(),
            continuation_prompt: ".. ".to_string(),
        };
        repl.refresh_keywords();
        repl
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self.refresh_keywords();
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails fatally.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }

        loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => self.print_error(&e),
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false);
        };

        if input.trim().is_empty() {
            return Ok(true);
        }

        self.editor.add_history(&input);

        match self.eval(&input) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{output}");
                }
            }
            Err(e) => self.print_error(&e),
        }

        Ok(true)
    }

    /// Reads a potentially multi-line input.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        let mut first_line = true;

        loop {
            let prompt = if first_line {
                &self.prompt
            } else {
                &self.continuation_prompt
            };

            match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => {
                    if !first_line {
                        input.push('\n');
                    }
                    input.push_str(&line);

                    if is_complete(&input) {
                        return Ok(Some(input));
                    }

                    first_line = false;
                }
                ReadResult::Interrupted => {
                    if !first_line {
                        println!("\nInput cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => {
                    if first_line {
                        return Ok(None);
                    }
                    return Err(Error::internal("unexpected EOF in multi-line input"));
                }
            }
        }
    }

    /// Evaluates input and returns the text to show.
    ///
    /// # Errors
    ///
    /// Returns an error if a command is malformed or the template fails.
    pub fn eval(&mut self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        match trimmed.strip_prefix(':') {
            Some(command) => self.command(command),
            None => self.session.try_evaluate(input.trim_end_matches('\n')),
        }
    }

    /// Renders the contents of a file as a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the template fails.
    pub fn eval_file(&mut self, path: &Path) -> Result<String> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::internal(format!("failed to read {}: {e}", path.display())))?;
        self.session.try_evaluate(source.trim_end_matches('\n'))
    }

    fn command(&mut self, command: &str) -> Result<String> {
        let (name, rest) = split_word(command);
        debug!(command = name, "repl command");
        match name {
            "set" => {
                let (field, value) = split_word(rest);
                require(field, ":set FIELD VALUE")?;
                self.session.set_field(field, value);
                Ok(String::new())
            }
            "list" => {
                let (field, items) = split_word(rest);
                require(field, ":list FIELD A,B,...")?;
                self.session.set_list(field, items);
                Ok(String::new())
            }
            "fields" => Ok(self
                .session
                .fields()
                .into_iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("\n")),
            "def" => {
                let (name, rest) = split_word(rest);
                let (argc, source) = split_word(rest);
                require(source, ":def NAME ARGC SOURCE")?;
                let arg_count = argc.parse::<i32>().map_err(|_| {
                    Error::invalid_argument(":def", format!("invalid argument count: {argc}"))
                })?;
                self.session
                    .define_function(UserFunctionDef::new(name, "", arg_count, source))?;
                self.refresh_keywords();
                Ok(String::new())
            }
            "undef" => {
                let (name, _) = split_word(rest);
                require(name, ":undef NAME")?;
                if !self.session.remove_function(name) {
                    return Err(Error::invalid_argument(
                        ":undef",
                        format!(
                            "{name} is not defined in library {}",
                            self.session.current_library()
                        ),
                    ));
                }
                self.refresh_keywords();
                Ok(String::new())
            }
            "library" => {
                let (id, _) = split_word(rest);
                if id.is_empty() {
                    let current = self.session.current_library();
                    return Ok(self
                        .session
                        .libraries()
                        .into_iter()
                        .map(|lib| {
                            if lib == current {
                                format!("* {lib}")
                            } else {
                                format!("  {lib}")
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n"));
                }
                self.session.select_library(id);
                Ok(String::new())
            }
            "unload" => {
                let (id, _) = split_word(rest);
                require(id, ":unload ID")?;
                self.session.unload_library(id)?;
                self.refresh_keywords();
                Ok(String::new())
            }
            "functions" => {
                let mut out = String::new();
                for function in self.session.functions() {
                    let _ = writeln!(
                        out,
                        "{:<28} {:>3}  {}",
                        function.name, function.arg_count, function.category
                    );
                }
                Ok(out.trim_end().to_string())
            }
            "doc" => {
                let (name, _) = split_word(rest);
                require(name, ":doc NAME")?;
                let function = self
                    .session
                    .function(name)
                    .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(name.to_string())))?;
                Ok(format!(
                    "{}({}) [{}]\n{}",
                    function.name, function.arg_count, function.category, function.doc
                ))
            }
            "help" => Ok(HELP.to_string()),
            other => Err(Error::invalid_argument(
                "repl",
                format!("unknown command :{other} (try :help)"),
            )),
        }
    }

    fn refresh_keywords(&mut self) {
        let names = self
            .session
            .functions()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        self.editor.set_keywords(names);
    }

    /// Prints an error to stderr.
    #[allow(clippy::unused_self)]
    fn print_error(&self, error: &Error) {
        eprintln!("\x1b[31mError: {error}\x1b[0m");
    }

    /// Prints the welcome banner.
    #[allow(clippy::unused_self)]
    fn print_banner(&self) {
        println!("\x1b[1;36mMarginalia\x1b[0m template REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type a template to render it, :help for commands, Ctrl+D to exit.\n");
        let _ = io::stdout().flush();
    }
}

/// Checks if input is complete: braces and parentheses balanced, and, in
/// program text, quotes closed. A `:def` whose first line ends with `:` runs
/// until a blank line.
pub(crate) fn is_complete(input: &str) -> bool {
    let trimmed = input.trim_start();
    if trimmed.starts_with(":def") {
        let first = trimmed.lines().next().unwrap_or_default();
        if first.trim_end().ends_with(':') {
            return input.ends_with('\n');
        }
    }

    let track_quotes = trimmed.starts_with("program:") || trimmed.starts_with(":def");
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escape_next = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') if track_quotes => quote = Some(c),
            (None, '(' | '{') => depth += 1,
            (None, ')' | '}') => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && quote.is_none()
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    }
}

fn require(part: &str, usage: &str) -> Result<()> {
    if part.is_empty() {
        Err(Error::invalid_argument("repl", format!("usage: {usage}")))
    } else {
        Ok(())
    }
}
