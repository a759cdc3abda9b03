//! Configuration for template evaluation.

/// Configuration for the formatter and its database-facing functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Allow `book_count`/`book_values` while rendering composite columns.
    pub allow_database_functions_in_composites: bool,

    /// Log compiled user-function source at debug level.
    pub template_debug_printing: bool,

    /// Maximum nesting of `template`, `eval` and user-function calls.
    pub max_recursion_depth: usize,

    /// Trim whitespace around formatter output.
    pub strip_results: bool,

    /// Prefix used by `safe_format` when rendering an error.
    pub error_prefix: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            allow_database_functions_in_composites: false,
            template_debug_printing: false,
            max_recursion_depth: 32,
            strip_results: true,
            error_prefix: "TEMPLATE ERROR".to_string(),
        }
    }
}

impl FormatterConfig {
    /// Creates a configuration that allows database functions in composites.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_database_functions_in_composites: true,
            ..Self::default()
        }
    }

    /// Creates a configuration for debugging templates.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            template_debug_printing: true,
            strip_results: false,
            ..Self::default()
        }
    }

    /// Builder method to allow database functions in composites.
    #[must_use]
    pub fn with_database_functions_in_composites(mut self, allow: bool) -> Self {
        self.allow_database_functions_in_composites = allow;
        self
    }

    /// Builder method to enable/disable debug printing of user functions.
    #[must_use]
    pub fn with_template_debug_printing(mut self, enabled: bool) -> Self {
        self.template_debug_printing = enabled;
        self
    }

    /// Builder method to set the recursion bound.
    #[must_use]
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Builder method to enable/disable result stripping.
    #[must_use]
    pub fn with_strip_results(mut self, strip: bool) -> Self {
        self.strip_results = strip;
        self
    }

    /// Builder method to set the error prefix.
    #[must_use]
    pub fn with_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self
    }
}
