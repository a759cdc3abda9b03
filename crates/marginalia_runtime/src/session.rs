//! Session state for the REPL and CLI.
//!
//! A session is one library context: a function registry, the user functions
//! each library has defined, the book templates are rendered against, and
//! the formatter doing the rendering.

use std::collections::BTreeMap;
use std::sync::Arc;

use marginalia_formatter::TemplateFormatter;
use marginalia_foundation::{
    Database, Error, FieldValue, FormatterConfig, Kwargs, MemoryMetadata, Metadata, Result,
};
use marginalia_functions::{
    FunctionDescriptor, FunctionRegistry, UserFunctionDef, compile_user_function,
    load_user_template_functions, unload_user_template_functions,
};
use tracing::info;

/// The library a fresh session defines functions in.
pub const DEFAULT_LIBRARY: &str = "default";

/// Session state for interactive and batch use.
pub struct Session {
    registry: Arc<FunctionRegistry>,
    formatter: TemplateFormatter,
    config: FormatterConfig,
    database: Option<Arc<dyn Database>>,

    /// The book templates are rendered against.
    book: MemoryMetadata,

    /// User function definitions by library, then by name.
    libraries: BTreeMap<String, BTreeMap<String, UserFunctionDef>>,

    /// The library `define_function` and `remove_function` act on.
    current: String,
}

impl Session {
    /// Creates a session with the builtin functions, an empty book and the
    /// default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    /// Creates a session with the given configuration.
    #[must_use]
    pub fn with_config(config: FormatterConfig) -> Self {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let formatter = TemplateFormatter::new(Arc::clone(&registry)).with_config(config.clone());
        let mut libraries = BTreeMap::new();
        libraries.insert(DEFAULT_LIBRARY.to_string(), BTreeMap::new());
        Self {
            registry,
            formatter,
            config,
            database: None,
            book: MemoryMetadata::new(),
            libraries,
            current: DEFAULT_LIBRARY.to_string(),
        }
    }

    /// Gives database functions a library to work with.
    #[must_use]
    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self.rebuild_formatter();
        self
    }

    /// Replaces the configuration. Global variables are reset.
    pub fn set_config(&mut self, config: FormatterConfig) {
        self.config = config;
        self.rebuild_formatter();
    }

    fn rebuild_formatter(&mut self) {
        let formatter =
            TemplateFormatter::new(Arc::clone(&self.registry)).with_config(self.config.clone());
        self.formatter = match &self.database {
            Some(database) => formatter.with_database(Arc::clone(database)),
            None => formatter,
        };
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The function registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// The formatter.
    #[must_use]
    pub fn formatter(&self) -> &TemplateFormatter {
        &self.formatter
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// The book templates are rendered against.
    #[must_use]
    pub fn book(&self) -> &MemoryMetadata {
        &self.book
    }

    /// Mutable access to the book.
    pub fn book_mut(&mut self) -> &mut MemoryMetadata {
        &mut self.book
    }

    /// The current library id.
    #[must_use]
    pub fn current_library(&self) -> &str {
        &self.current
    }

    /// Library ids with definitions, sorted.
    #[must_use]
    pub fn libraries(&self) -> Vec<String> {
        self.libraries.keys().cloned().collect()
    }

    // =========================================================================
    // Book
    // =========================================================================

    /// Sets a field of the book. Fields declared as lists are split on `,`.
    pub fn set_field(&mut self, field: &str, value: &str) {
        let key = field.trim().to_lowercase();
        let is_list = self
            .book
            .field_info(&key)
            .is_some_and(|info| info.separator.is_some());
        if is_list {
            self.set_list(&key, value);
        } else {
            self.book.set(key, value);
        }
    }

    /// Sets a multi-valued field of the book from comma-separated items.
    pub fn set_list(&mut self, field: &str, items: &str) {
        let items: Vec<String> = items
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        self.book.set_list(field.trim().to_lowercase(), items);
    }

    /// Fields of the book that have values, with their display values.
    #[must_use]
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut keys = self.book.all_field_keys();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| {
                let value = self.book.get(&key)?;
                let rendered = match &value {
                    FieldValue::List(items) => items.join(", "),
                    other => other.render(", "),
                };
                Some((key, rendered))
            })
            .collect()
    }

    // =========================================================================
    // User Functions
    // =========================================================================

    /// Defines or redefines a function in the current library.
    ///
    /// # Errors
    /// Returns the compilation error; the library is left unchanged.
    pub fn define_function(&mut self, def: UserFunctionDef) -> Result<()> {
        compile_user_function(&def)?;
        let library = self.libraries.entry(self.current.clone()).or_default();
        library.insert(def.name.clone(), def);
        self.reload(&self.current);
        Ok(())
    }

    /// Removes a function from the current library. Returns false if the
    /// library did not define it.
    pub fn remove_function(&mut self, name: &str) -> bool {
        let removed = self
            .libraries
            .get_mut(&self.current)
            .is_some_and(|library| library.remove(name).is_some());
        if removed {
            self.reload(&self.current);
        }
        removed
    }

    /// Replaces a library's definitions and makes it current. Returns how
    /// many compiled.
    pub fn load_library(&mut self, library_id: &str, defs: Vec<UserFunctionDef>) -> usize {
        let library: BTreeMap<String, UserFunctionDef> =
            defs.into_iter().map(|def| (def.name.clone(), def)).collect();
        self.libraries.insert(library_id.to_string(), library);
        self.current = library_id.to_string();
        self.reload(library_id)
    }

    /// Makes a library current, creating it empty if it is new.
    pub fn select_library(&mut self, library_id: &str) {
        self.libraries.entry(library_id.to_string()).or_default();
        self.current = library_id.to_string();
        info!(library = %library_id, "selected library");
    }

    /// Withdraws a library's functions.
    ///
    /// # Errors
    /// Returns an error if the library is unknown.
    pub fn unload_library(&mut self, library_id: &str) -> Result<()> {
        if self.libraries.remove(library_id).is_none() {
            return Err(Error::invalid_argument(
                "unload_library",
                format!("no library named {library_id}"),
            ));
        }
        unload_user_template_functions(&self.registry, library_id);
        if self.current == library_id {
            self.libraries.insert(library_id.to_string(), BTreeMap::new());
        }
        Ok(())
    }

    fn reload(&self, library_id: &str) -> usize {
        let defs: Vec<UserFunctionDef> = self
            .libraries
            .get(library_id)
            .map(|library| library.values().cloned().collect())
            .unwrap_or_default();
        load_user_template_functions(&self.registry, library_id, &defs)
    }

    /// The active functions, sorted by name.
    #[must_use]
    pub fn functions(&self) -> Vec<Arc<FunctionDescriptor>> {
        let snapshot = self.registry.snapshot();
        snapshot
            .names()
            .iter()
            .filter_map(|name| snapshot.get(name).cloned())
            .collect()
    }

    /// The active function named `name`.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.registry.lookup(name)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Renders a template against the book. Errors become the output text.
    #[must_use]
    pub fn evaluate(&self, template: &str) -> String {
        self.formatter
            .safe_format(template, Some(&self.book), &Kwargs::new())
    }

    /// Renders a template against the book.
    ///
    /// # Errors
    /// Returns the template's parse or evaluation error.
    pub fn try_evaluate(&self, template: &str) -> Result<String> {
        self.formatter
            .unsafe_format(template, Some(&self.book), &Kwargs::new())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
