//! Error types for the Marginalia system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

/// The main error type for Marginalia operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Pushes a call frame onto this error's context, creating it if needed.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates a duplicate user function error.
    #[must_use]
    pub fn duplicate_function(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateFunctionName(name.into()))
    }

    /// Creates a self-policed arity error for a variadic function.
    #[must_use]
    pub fn arity(function: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity {
            function: function.into(),
            requirement: requirement.into(),
        })
    }

    /// Creates a caller-side fixed arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(function: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            function: function.into(),
            expected,
            actual,
        })
    }

    /// Creates a type coercion error.
    #[must_use]
    pub fn type_coercion(
        function: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::new(ErrorKind::TypeCoercion {
            function: function.into(),
            value: value.into(),
            expected,
        })
    }

    /// Creates an error for a GUI-only function called without a GUI context.
    #[must_use]
    pub fn only_in_gui(function: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContextUnavailable {
            function: function.into(),
            reason: Unavailable::OnlyInGui,
        })
    }

    /// Creates an error for a database function whose database was closed.
    #[must_use]
    pub fn database_closed(function: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContextUnavailable {
            function: function.into(),
            reason: Unavailable::DatabaseClosed,
        })
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument {
            function: function.into(),
            message: message.into(),
        })
    }

    /// Creates an invalid regular expression error.
    #[must_use]
    pub fn invalid_regex(pattern: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidRegex {
            pattern: pattern.into(),
            message: message.to_string(),
        })
    }

    /// Creates a user-function compilation error.
    #[must_use]
    pub fn compilation(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Compilation {
            function: function.into(),
            message: message.into(),
        })
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::Parse {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error is a conflict placeholder's duplicate-name error.
    #[must_use]
    pub fn is_duplicate_function(&self) -> bool {
        matches!(self.kind, ErrorKind::DuplicateFunctionName(_))
    }
}

/// Why a database or GUI function could not reach its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// No database proxy or GUI is attached to this evaluation.
    OnlyInGui,
    /// The database handle exists but the database has been closed.
    DatabaseClosed,
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// A conflict placeholder was called.
    #[error(
        "Duplicate user function name {0}. Change the name or ensure that the functions are identical"
    )]
    DuplicateFunctionName(String),

    /// A variadic function rejected its argument count.
    #[error("{function}: {requirement}")]
    Arity {
        /// The function that rejected its arguments.
        function: String,
        /// Human-readable requirement, e.g. "requires an even number of arguments".
        requirement: String,
    },

    /// A fixed-arity function was called with the wrong number of arguments.
    #[error("{function}: incorrect number of arguments (expected {expected}, got {actual})")]
    ArityMismatch {
        /// The function that was called.
        function: String,
        /// The declared argument count.
        expected: usize,
        /// The number of arguments supplied.
        actual: usize,
    },

    /// A string argument could not be parsed as the expected type.
    #[error("{function}: cannot convert '{value}' to {expected}")]
    TypeCoercion {
        /// The function doing the conversion.
        function: String,
        /// The offending value.
        value: String,
        /// The expected type name.
        expected: &'static str,
    },

    /// A database or GUI function ran without its context.
    #[error("{}", unavailable_message(.function, .reason))]
    ContextUnavailable {
        /// The function that was called.
        function: String,
        /// Why the context was unavailable.
        reason: Unavailable,
    },

    /// A database query function was called while rendering a composite column.
    #[error(
        "{0}: this function cannot be used in a composite column unless database functions are allowed in composites"
    )]
    NotAllowedInComposite(String),

    /// A user-defined function failed to compile.
    #[error("Error compiling function {function}: {message}")]
    Compilation {
        /// The function name.
        function: String,
        /// Description of the failure.
        message: String,
    },

    /// A function received an argument it cannot accept.
    #[error("{function}: {message}")]
    InvalidArgument {
        /// The function that rejected the argument.
        function: String,
        /// Description of the problem.
        message: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex {
        /// The pattern text.
        pattern: String,
        /// The compiler's message.
        message: String,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// No function with this name is registered.
    #[error("{0}: unknown function")]
    UnknownFunction(String),

    /// An identifier was read before it was assigned.
    #[error("{0}: unknown identifier")]
    UnknownIdentifier(String),

    /// A metadata field does not exist.
    #[error("{0}: unknown field")]
    UnknownField(String),

    /// Parse error in a template or program.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// Nested template evaluation went too deep.
    #[error("maximum template recursion depth ({0}) exceeded")]
    RecursionLimit(usize),

    /// The database reported a failure.
    #[error("database error: {0}")]
    Database(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn unavailable_message(function: &str, reason: &Unavailable) -> String {
    match reason {
        Unavailable::OnlyInGui => format!("The function {function} can be used only in the GUI"),
        Unavailable::DatabaseClosed => {
            format!("In function {function}: The database has been closed")
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Template or function source name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
    /// Stack of function calls, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias for Marginalia operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_function_message_names_function() {
        let err = Error::duplicate_function("my_func");
        assert!(err.is_duplicate_function());
        let msg = err.to_string();
        assert!(msg.starts_with("Duplicate user function name my_func."));
        assert!(msg.contains("identical"));
    }

    #[test]
    fn context_unavailable_messages() {
        let gui = Error::only_in_gui("book_count");
        assert_eq!(
            gui.to_string(),
            "The function book_count can be used only in the GUI"
        );
        let closed = Error::database_closed("book_values");
        assert_eq!(
            closed.to_string(),
            "In function book_values: The database has been closed"
        );
    }

    #[test]
    fn error_with_context() {
        let err = Error::arity("switch", "requires an even number of arguments").with_context(
            ErrorContext::new()
                .with_source("template")
                .with_position(2, 7),
        );

        let ctx = err.context.expect("context was set");
        assert_eq!(ctx.source.as_deref(), Some("template"));
        assert_eq!(ctx.line, Some(2));
        assert_eq!(ctx.column, Some(7));
    }

    #[test]
    fn in_frame_accumulates() {
        let err = Error::new(ErrorKind::DivisionByZero)
            .in_frame("divide")
            .in_frame("my_func");
        let ctx = err.context.expect("frames were pushed");
        assert_eq!(ctx.stack, vec!["divide".to_string(), "my_func".to_string()]);
        assert!(ctx.to_string().contains("in my_func"));
    }

    #[test]
    fn arity_mismatch_display() {
        let err = Error::arity_mismatch("substr", 3, 2);
        let msg = err.to_string();
        assert!(msg.contains("substr"));
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("got 2"));
    }
}
