//! The template formatter.
//!
//! [`TemplateFormatter`] is both the entry point for rendering and the
//! [`Formatter`] that functions call back into. It is single-threaded: one
//! formatter per rendering thread, sharing an `Arc<FunctionRegistry>`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use marginalia_foundation::{
    Database, Error, ErrorKind, FormatterConfig, GuiContext, Kwargs, Locals, Metadata, Result,
    Value,
};
use marginalia_functions::{
    CompiledNative, Formatter, FunctionRegistry, ObjectType, PROGRAM_PREFIX, Snapshot,
};
use marginalia_language::{Template, parse_program, parse_template};
use tracing::debug;

use crate::eval::{Evaluator, FieldMode};

// =============================================================================
// TemplateFormatter
// =============================================================================

/// Renders templates against a book, a variable scope, or a single value.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use marginalia_formatter::TemplateFormatter;
/// use marginalia_foundation::{Kwargs, MemoryMetadata};
/// use marginalia_functions::FunctionRegistry;
///
/// let formatter = TemplateFormatter::new(Arc::new(FunctionRegistry::with_builtins()));
/// let book = MemoryMetadata::new().with_field("title", "The Hobbit");
/// let out = formatter.safe_format("{title:uppercase()}", Some(&book), &Kwargs::new());
/// assert_eq!(out, "THE HOBBIT");
/// ```
pub struct TemplateFormatter {
    registry: Arc<FunctionRegistry>,
    config: FormatterConfig,
    database: Option<Arc<dyn Database>>,
    gui: Option<Arc<dyn GuiContext>>,
    /// Global variables. They outlive a single render.
    globals: RefCell<Locals>,
    /// Nesting of renders and user-function calls.
    depth: Cell<usize>,
    composite: Cell<bool>,
    /// The snapshot the outermost render in progress took.
    functions: RefCell<Option<Arc<Snapshot>>>,
    templates: RefCell<HashMap<String, Rc<Template>>>,
}

impl TemplateFormatter {
    /// Creates a formatter with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            config: FormatterConfig::default(),
            database: None,
            gui: None,
            globals: RefCell::new(Locals::new()),
            depth: Cell::new(0),
            composite: Cell::new(false),
            functions: RefCell::new(None),
            templates: RefCell::new(HashMap::new()),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: FormatterConfig) -> Self {
        self.config = config;
        self
    }

    /// Gives database functions a library to use when the book has none.
    #[must_use]
    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    /// Makes GUI-only functions available.
    #[must_use]
    pub fn with_gui(mut self, gui: Arc<dyn GuiContext>) -> Self {
        self.gui = Some(gui);
        self
    }

    /// Starts with the given global variables.
    #[must_use]
    pub fn with_globals(mut self, globals: Locals) -> Self {
        *self.globals.get_mut() = globals;
        self
    }

    /// The registry this formatter calls into.
    #[must_use]
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Renders a template, turning any error into its message.
    ///
    /// The message is prefixed with the configured error prefix, so a broken
    /// template shows up in its output instead of failing the caller.
    #[must_use]
    pub fn safe_format(
        &self,
        template: &str,
        metadata: Option<&dyn Metadata>,
        kwargs: &Kwargs,
    ) -> String {
        match self.unsafe_format(template, metadata, kwargs) {
            Ok(text) => text,
            Err(err) => {
                debug!(error = %err, template, "template evaluation failed");
                format!("{}: {err}", self.config.error_prefix)
            }
        }
    }

    /// Renders a template.
    ///
    /// # Errors
    /// Returns parse errors and the first evaluation error.
    pub fn unsafe_format(
        &self,
        template: &str,
        metadata: Option<&dyn Metadata>,
        kwargs: &Kwargs,
    ) -> Result<String> {
        self.render_template(template, metadata, kwargs)
    }

    /// Renders a composite column's template.
    ///
    /// Database functions refuse to run here unless the configuration allows
    /// them.
    #[must_use]
    pub fn render_composite(&self, template: &str, metadata: &dyn Metadata) -> String {
        let previous = self.composite.replace(true);
        let out = self.safe_format(template, Some(metadata), &Kwargs::new());
        self.composite.set(previous);
        out
    }

    // =========================================================================
    // Globals
    // =========================================================================

    /// A global variable's value.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<String> {
        self.globals.borrow().get(name).map(str::to_string)
    }

    /// Sets a global variable.
    pub fn set_global(&self, name: impl Into<String>, value: impl Into<String>) {
        self.globals.borrow_mut().set(name, value);
    }

    /// A copy of every global variable.
    #[must_use]
    pub fn globals(&self) -> Locals {
        self.globals.borrow().clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The functions visible to the render in progress.
    pub(crate) fn functions(&self) -> Arc<Snapshot> {
        self.functions
            .borrow()
            .clone()
            .unwrap_or_else(|| self.registry.snapshot())
    }

    /// Enters one level of nesting. The outermost level pins the function
    /// snapshot until it returns.
    fn enter(&self) -> Result<Frame<'_>> {
        let max = self.config.max_recursion_depth;
        let depth = self.depth.get() + 1;
        if depth > max {
            return Err(Error::new(ErrorKind::RecursionLimit(max)));
        }
        if depth == 1 {
            *self.functions.borrow_mut() = Some(self.registry.snapshot());
        }
        self.depth.set(depth);
        Ok(Frame { formatter: self })
    }

    fn parsed(&self, source: &str) -> Result<Rc<Template>> {
        let cached = self.templates.borrow().get(source).cloned();
        if let Some(template) = cached {
            return Ok(template);
        }
        let template = Rc::new(parse_template(source)?);
        self.templates
            .borrow_mut()
            .insert(source.to_string(), Rc::clone(&template));
        Ok(template)
    }

    fn finish(&self, text: String) -> String {
        if self.config.strip_results {
            text.trim().to_string()
        } else {
            text
        }
    }
}

impl fmt::Debug for TemplateFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateFormatter")
            .field("config", &self.config)
            .field("database", &self.database)
            .field("gui", &self.gui)
            .field("depth", &self.depth.get())
            .field("composite", &self.composite.get())
            .finish_non_exhaustive()
    }
}

/// One level of render nesting; leaving it releases the level.
struct Frame<'a> {
    formatter: &'a TemplateFormatter,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        let depth = self.formatter.depth.get().saturating_sub(1);
        self.formatter.depth.set(depth);
        if depth == 0 {
            self.formatter.functions.borrow_mut().take();
        }
    }
}

// =============================================================================
// Formatter Implementation
// =============================================================================

impl Formatter for TemplateFormatter {
    fn render_template(
        &self,
        template: &str,
        metadata: Option<&dyn Metadata>,
        kwargs: &Kwargs,
    ) -> Result<String> {
        let _frame = self.enter()?;
        let parsed = self.parsed(template)?;
        let mut locals = Locals::new();
        let text =
            Evaluator::new(self, metadata, kwargs, &mut locals, FieldMode::Book).run(&parsed)?;
        Ok(self.finish(text))
    }

    fn render_eval(&self, template: &str, locals: &mut Locals) -> Result<String> {
        let _frame = self.enter()?;
        let parsed = self.parsed(template)?;
        let kwargs = Kwargs::new();
        let text = Evaluator::new(self, None, &kwargs, locals, FieldMode::Variables).run(&parsed)?;
        Ok(self.finish(text))
    }

    fn render_with_value(&self, template: &str, value: &str) -> Result<String> {
        let _frame = self.enter()?;
        let parsed = self.parsed(template)?;
        let kwargs = Kwargs::new();
        let mut locals = Locals::with_value(value);
        Evaluator::new(self, None, &kwargs, &mut locals, FieldMode::Variables).run(&parsed)
    }

    fn run_compiled(
        &self,
        name: &str,
        function: &CompiledNative,
        args: &[String],
        metadata: Option<&dyn Metadata>,
    ) -> Result<Value> {
        let _frame = self.enter()?;
        debug!(function = %name, args = args.len(), "running compiled user function");
        let mut locals: Locals = function
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| (param.clone(), args.get(i).cloned().unwrap_or_default()))
            .collect();
        let kwargs = Kwargs::new();
        let text = Evaluator::new(self, metadata, &kwargs, &mut locals, FieldMode::Book)
            .with_arguments(args)
            .program(&function.program)?;
        Ok(Value::Text(text))
    }

    fn run_stored(
        &self,
        name: &str,
        kind: ObjectType,
        source: &str,
        args: &[String],
        metadata: Option<&dyn Metadata>,
    ) -> Result<Value> {
        let _frame = self.enter()?;
        if self.config.template_debug_printing {
            debug!(function = %name, source, "running stored user function");
        }
        let mut locals = Locals::new();
        let parsed = match kind {
            ObjectType::StoredMacroTemplate => self.parsed(source)?,
            ObjectType::StoredMacroProgram => {
                for (i, arg) in args.iter().enumerate() {
                    locals.set(format!("arg{}", i + 1), arg.clone());
                }
                locals.set("arg_count", args.len().to_string());
                let body = source.strip_prefix(PROGRAM_PREFIX).unwrap_or(source);
                Rc::new(Template::Program(parse_program(body)?))
            }
            ObjectType::NativeFunction => {
                return Err(Error::internal(format!("{name} is not a stored function")));
            }
        };
        let kwargs = Kwargs::new();
        let text = Evaluator::new(self, metadata, &kwargs, &mut locals, FieldMode::Book)
            .with_arguments(args)
            .run(&parsed)?;
        Ok(Value::Text(text))
    }

    fn database(&self) -> Option<Arc<dyn Database>> {
        self.database.clone()
    }

    fn gui(&self) -> Option<Arc<dyn GuiContext>> {
        self.gui.clone()
    }

    fn config(&self) -> &FormatterConfig {
        &self.config
    }

    fn is_rendering_composite(&self) -> bool {
        self.composite.get()
    }
}
