//! The function contract.
//!
//! Every callable the template language knows about is a
//! [`FunctionDescriptor`]. Its [`FunctionBody`] decides how a call runs:
//! builtins are plain Rust functions, user functions are handed back to the
//! [`Formatter`] that is evaluating the template, and conflict placeholders
//! always fail.

use std::fmt;
use std::sync::{Arc, Weak};

use marginalia_foundation::{
    BookId, Database, Error, FormatterConfig, GuiContext, Kwargs, Locals, Metadata, Result,
    Value,
};
use marginalia_language::Program;

use crate::support::{fields, number};

// =============================================================================
// Formatter Trait
// =============================================================================

/// The evaluator a function is called from.
///
/// Functions that need to re-enter the template language (`template`, `eval`,
/// `re_group`, user functions) or reach the host application do so through
/// this trait.
pub trait Formatter {
    /// Renders `template` for `metadata` in a fresh variable scope.
    ///
    /// # Errors
    /// Returns the template's evaluation error.
    fn render_template(
        &self,
        template: &str,
        metadata: Option<&dyn Metadata>,
        kwargs: &Kwargs,
    ) -> Result<String>;

    /// Renders `template` with `locals` as its variable scope.
    ///
    /// Fields in the template resolve to variables. Assignments made by the
    /// template stay in `locals`.
    ///
    /// # Errors
    /// Returns the template's evaluation error.
    fn render_eval(&self, template: &str, locals: &mut Locals) -> Result<String>;

    /// Renders `template` with only `$` bound to `value`, without stripping
    /// the result.
    ///
    /// # Errors
    /// Returns the template's evaluation error.
    fn render_with_value(&self, template: &str, value: &str) -> Result<String>;

    /// A field's display value, as `{field}` would render it.
    ///
    /// # Errors
    /// Returns an error for unknown fields.
    fn field_value(&self, field: &str, metadata: &dyn Metadata) -> Result<String> {
        fields::display_value(metadata, field)
    }

    /// Applies a format spec such as `05.2f` or `>10` to a value.
    ///
    /// # Errors
    /// Returns an error when the value does not suit the spec's type.
    fn format_value(&self, value: &str, spec: &str) -> Result<String> {
        number::format_value(value, spec)
    }

    /// Runs a compiled user function with positional arguments.
    ///
    /// # Errors
    /// Returns the function body's evaluation error.
    fn run_compiled(
        &self,
        name: &str,
        function: &CompiledNative,
        args: &[String],
        metadata: Option<&dyn Metadata>,
    ) -> Result<Value>;

    /// Runs a stored template or stored program user function.
    ///
    /// # Errors
    /// Returns the function body's evaluation error.
    fn run_stored(
        &self,
        name: &str,
        kind: ObjectType,
        source: &str,
        args: &[String],
        metadata: Option<&dyn Metadata>,
    ) -> Result<Value>;

    /// The library database, when the formatter was given one directly.
    fn database(&self) -> Option<Arc<dyn Database>> {
        None
    }

    /// The GUI, when running inside one.
    fn gui(&self) -> Option<Arc<dyn GuiContext>> {
        None
    }

    /// Evaluation settings.
    fn config(&self) -> &FormatterConfig;

    /// True while rendering a composite column.
    fn is_rendering_composite(&self) -> bool {
        false
    }
}

// =============================================================================
// CallContext
// =============================================================================

/// Everything a function sees besides its arguments.
pub struct CallContext<'a> {
    /// The evaluator making the call.
    pub formatter: &'a dyn Formatter,
    /// Raw arguments of the enclosing evaluation.
    pub kwargs: &'a Kwargs,
    /// The book being rendered, if any.
    pub metadata: Option<&'a dyn Metadata>,
    /// The evaluation's variable scope.
    pub locals: &'a mut Locals,
}

impl<'a> CallContext<'a> {
    /// Creates a call context.
    #[must_use]
    pub fn new(
        formatter: &'a dyn Formatter,
        kwargs: &'a Kwargs,
        metadata: Option<&'a dyn Metadata>,
        locals: &'a mut Locals,
    ) -> Self {
        Self {
            formatter,
            kwargs,
            metadata,
            locals,
        }
    }

    /// The book's metadata, or an error naming `function`.
    ///
    /// # Errors
    /// Returns an error when the evaluation has no book.
    pub fn metadata(&self, function: &str) -> Result<&'a dyn Metadata> {
        self.metadata
            .ok_or_else(|| Error::invalid_argument(function, "no book is available here"))
    }

    /// The live library database.
    ///
    /// Metadata read from a library carries a weak handle to it; a handle
    /// that no longer upgrades means the library was closed. Without a
    /// proxy the formatter's own database is used.
    ///
    /// # Errors
    /// Returns [`Error::only_in_gui`] when no database is reachable and
    /// [`Error::database_closed`] when it was closed.
    pub fn database(&self, function: &str) -> Result<Arc<dyn Database>> {
        match self.metadata.and_then(Metadata::proxy) {
            Some(proxy) => proxy
                .database()
                .as_ref()
                .and_then(Weak::upgrade)
                .ok_or_else(|| Error::database_closed(function)),
            None => self
                .formatter
                .database()
                .ok_or_else(|| Error::only_in_gui(function)),
        }
    }

    /// The GUI, or an only-in-GUI error.
    ///
    /// # Errors
    /// Returns [`Error::only_in_gui`] outside the GUI.
    pub fn gui(&self, function: &str) -> Result<Arc<dyn GuiContext>> {
        self.formatter
            .gui()
            .ok_or_else(|| Error::only_in_gui(function))
    }

    /// The id of the book being rendered.
    ///
    /// # Errors
    /// Returns an error when there is no book or it has no id.
    pub fn book_id(&self, function: &str) -> Result<BookId> {
        self.metadata(function)?
            .book_id()
            .ok_or_else(|| Error::invalid_argument(function, "the book has no id"))
    }

    /// Refuses to run a library-wide query inside a composite column unless
    /// the configuration allows it.
    ///
    /// # Errors
    /// Returns [`marginalia_foundation::ErrorKind::NotAllowedInComposite`].
    pub fn forbid_in_composite(&self, function: &str) -> Result<()> {
        if self.formatter.is_rendering_composite()
            && !self.formatter.config().allow_database_functions_in_composites
        {
            return Err(Error::new(
                marginalia_foundation::ErrorKind::NotAllowedInComposite(function.to_string()),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Descriptor Types
// =============================================================================

/// Signature of a builtin function body.
pub type BuiltinFn = fn(&mut CallContext<'_>, &[String]) -> Result<Value>;

/// How many arguments a function takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgCount {
    /// Exactly this many.
    Exact(usize),
    /// Any number; the function checks for itself.
    Variadic,
}

impl ArgCount {
    /// Converts the persisted integer form, where `-1` means variadic.
    #[must_use]
    pub fn from_declared(n: i32) -> Self {
        usize::try_from(n).map_or(Self::Variadic, Self::Exact)
    }

    /// The persisted integer form.
    #[must_use]
    pub fn declared(self) -> i32 {
        match self {
            Self::Exact(n) => i32::try_from(n).unwrap_or(i32::MAX),
            Self::Variadic => -1,
        }
    }

    /// True if `actual` arguments satisfy this count.
    #[must_use]
    pub fn accepts(self, actual: usize) -> bool {
        match self {
            Self::Exact(n) => n == actual,
            Self::Variadic => true,
        }
    }
}

impl fmt::Display for ArgCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.declared())
    }
}

/// How a stored definition is turned into something callable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Native source with an `evaluate` header, compiled at load time.
    NativeFunction,
    /// A `program:` template, interpreted per call.
    StoredMacroTemplate,
    /// A `python:` program, interpreted per call with positional arguments.
    StoredMacroProgram,
}

/// Documentation grouping. Has no effect on evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Category {
    Relational,
    Arithmetic,
    StringManipulation,
    ListManipulation,
    ListLookup,
    IteratingValues,
    Boolean,
    DateFunctions,
    FormattingValues,
    GetFromMetadata,
    Recursion,
    CaseChanges,
    UrlFunctions,
    DatabaseFunctions,
    Other,
    UserDefined,
}

impl Category {
    /// The heading used in function listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relational => "Relational",
            Self::Arithmetic => "Arithmetic",
            Self::StringManipulation => "String manipulation",
            Self::ListManipulation => "List manipulation",
            Self::ListLookup => "List lookup",
            Self::IteratingValues => "Iterating over values",
            Self::Boolean => "Boolean",
            Self::DateFunctions => "Date functions",
            Self::FormattingValues => "Formatting values",
            Self::GetFromMetadata => "Get values from metadata",
            Self::Recursion => "Recursion",
            Self::CaseChanges => "Case changes",
            Self::UrlFunctions => "URL functions",
            Self::DatabaseFunctions => "Database functions",
            Self::Other => "Other",
            Self::UserDefined => "User defined",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user function compiled from native source.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledNative {
    /// Parameter names, bound positionally.
    pub params: Vec<String>,
    /// The parsed body.
    pub program: Program,
}

/// What runs when a function is called.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    /// A builtin implemented in Rust.
    Builtin(BuiltinFn),
    /// A user function compiled at load time.
    Native(Arc<CompiledNative>),
    /// A `program:` user function; the source is the descriptor's program text.
    StoredTemplate,
    /// A `python:` user function; the source is the descriptor's program text.
    StoredProgram,
    /// Handled by the evaluator itself; has no callable body.
    Inline,
    /// Stands in for two different functions registered under one name.
    ConflictPlaceholder,
}

// =============================================================================
// FunctionDescriptor
// =============================================================================

/// The registry's record for one callable.
#[derive(Clone, Debug)]
pub struct FunctionDescriptor {
    /// Primary name.
    pub name: String,
    /// Other names resolving to this descriptor.
    pub aliases: Vec<String>,
    /// Documentation grouping.
    pub category: Category,
    /// Argument contract.
    pub arg_count: ArgCount,
    /// Human-readable description.
    pub doc: String,
    /// How the definition was compiled.
    pub object_type: ObjectType,
    /// Stored source. Two definitions are the same function exactly when
    /// their program texts are byte-identical.
    pub program_text: String,
    /// The executable body.
    pub body: FunctionBody,
}

impl FunctionDescriptor {
    /// Describes a builtin.
    #[must_use]
    pub fn builtin(
        name: &str,
        category: Category,
        arg_count: ArgCount,
        doc: &str,
        function: BuiltinFn,
    ) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            category,
            arg_count,
            doc: doc.to_string(),
            object_type: ObjectType::NativeFunction,
            program_text: format!("builtin:{name}"),
            body: FunctionBody::Builtin(function),
        }
    }

    /// Describes a function the evaluator implements in line.
    #[must_use]
    pub fn inline(name: &str, category: Category, arg_count: ArgCount, doc: &str) -> Self {
        Self {
            body: FunctionBody::Inline,
            program_text: format!("inline:{name}"),
            ..Self::builtin(name, category, arg_count, doc, inline_body)
        }
    }

    /// The descriptor installed when two libraries disagree about `name`.
    #[must_use]
    pub fn conflict_placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            category: Category::UserDefined,
            arg_count: ArgCount::Variadic,
            doc: String::new(),
            object_type: ObjectType::NativeFunction,
            program_text: format!("conflict:{name}"),
            body: FunctionBody::ConflictPlaceholder,
        }
    }

    /// Adds aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| (*a).to_string()).collect();
        self
    }

    /// True for functions the evaluator handles itself.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self.body, FunctionBody::Inline)
    }

    /// True for builtins and inline functions.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self.body, FunctionBody::Builtin(_) | FunctionBody::Inline)
    }

    /// The caller-side arity contract.
    ///
    /// # Errors
    /// Returns [`Error::arity_mismatch`] when a fixed-arity function gets the
    /// wrong number of arguments.
    pub fn check_arity(&self, actual: usize) -> Result<()> {
        match self.arg_count {
            ArgCount::Exact(expected) if expected != actual => {
                Err(Error::arity_mismatch(&self.name, expected, actual))
            }
            _ => Ok(()),
        }
    }

    /// Calls the function with already-evaluated arguments.
    ///
    /// # Errors
    /// Returns arity errors and whatever the body raises.
    pub fn evaluate(&self, ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
        self.check_arity(args.len())?;
        match &self.body {
            FunctionBody::Builtin(function) => function(ctx, args),
            FunctionBody::Native(compiled) => {
                ctx.formatter
                    .run_compiled(&self.name, compiled, args, ctx.metadata)
            }
            FunctionBody::StoredTemplate => ctx.formatter.run_stored(
                &self.name,
                ObjectType::StoredMacroTemplate,
                &self.program_text,
                args,
                ctx.metadata,
            ),
            FunctionBody::StoredProgram => ctx.formatter.run_stored(
                &self.name,
                ObjectType::StoredMacroProgram,
                &self.program_text,
                args,
                ctx.metadata,
            ),
            FunctionBody::Inline => inline_body(ctx, args)
                .map_err(|_| Error::invalid_argument(&self.name, "can only be used in a template")),
            FunctionBody::ConflictPlaceholder => Err(Error::duplicate_function(&self.name)),
        }
    }

    /// Calls the function and coerces the result to its string form.
    ///
    /// # Errors
    /// Same as [`FunctionDescriptor::evaluate`].
    pub fn eval_(&self, ctx: &mut CallContext<'_>, args: &[String]) -> Result<String> {
        self.evaluate(ctx, args).map(Value::into_text)
    }
}

fn inline_body(_: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Err(Error::internal("inline function called directly"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestFormatter, call};

    fn shout(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
        Ok(Value::Text(args[0].to_uppercase()))
    }

    #[test]
    fn arg_count_round_trips_declared_form() {
        assert_eq!(ArgCount::from_declared(-1), ArgCount::Variadic);
        assert_eq!(ArgCount::from_declared(3), ArgCount::Exact(3));
        assert_eq!(ArgCount::Exact(2).declared(), 2);
        assert_eq!(ArgCount::Variadic.declared(), -1);
        assert!(ArgCount::Variadic.accepts(7));
        assert!(!ArgCount::Exact(1).accepts(2));
    }

    #[test]
    fn fixed_arity_is_enforced() {
        let shout = FunctionDescriptor::builtin(
            "shout",
            Category::Other,
            ArgCount::Exact(1),
            "",
            shout,
        );
        let formatter = TestFormatter::default();
        assert_eq!(call(&formatter, &shout, &["hi"]).unwrap(), "HI");
        let err = call(&formatter, &shout, &["a", "b"]).unwrap_err();
        assert!(err.to_string().contains("expected 1, got 2"));
    }

    #[test]
    fn placeholder_always_fails() {
        let placeholder = FunctionDescriptor::conflict_placeholder("foo");
        let formatter = TestFormatter::default();
        let err = call(&formatter, &placeholder, &["x", "y", "z"]).unwrap_err();
        assert!(err.is_duplicate_function());
        assert_eq!(placeholder.arg_count, ArgCount::Variadic);
    }

    #[test]
    fn builtin_program_text_is_explicit() {
        let shout =
            FunctionDescriptor::builtin("shout", Category::Other, ArgCount::Exact(1), "", shout);
        assert_eq!(shout.program_text, "builtin:shout");
        assert!(shout.is_builtin());
    }

    #[test]
    fn inline_functions_refuse_direct_calls() {
        let inline =
            FunctionDescriptor::inline("globals", Category::Other, ArgCount::Variadic, "");
        let formatter = TestFormatter::default();
        let err = call(&formatter, &inline, &[]).unwrap_err();
        assert!(err.to_string().contains("can only be used in a template"));
    }

    #[test]
    fn database_requires_context() {
        let formatter = TestFormatter::default();
        let kwargs = Kwargs::new();
        let mut locals = Locals::new();
        let ctx = CallContext::new(&formatter, &kwargs, None, &mut locals);
        let err = ctx.database("book_count").err().unwrap();
        assert!(err.to_string().contains("can be used only in the GUI"));
    }
}
