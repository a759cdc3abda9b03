//! The user-function compiler.
//!
//! A stored definition is the 4-tuple `(name, doc, arg_count, source)`. The
//! source prefix decides what it becomes:
//!
//! | Prefix | Object type | Compiled |
//! |--------|-------------|----------|
//! | `program:` | [`ObjectType::StoredMacroTemplate`] | per call |
//! | `python:` | [`ObjectType::StoredMacroProgram`] | per call |
//! | anything else | [`ObjectType::NativeFunction`] | at load time |
//!
//! Native sources start with a `def evaluate(...)` header followed by an
//! indented program body:
//!
//! ```text
//! def evaluate(self, formatter, kwargs, mi, locals, value, width):
//!     if strlen(value) > width then substr(value, 0, width) else value fi
//! ```
//!
//! The leading `self, formatter, kwargs, mi, locals` parameters are optional.

use std::sync::Arc;

use tracing::{debug, error, info};

use marginalia_foundation::{Error, Result};
use marginalia_language::parse_program;

use crate::contract::{
    ArgCount, Category, CompiledNative, FunctionBody, FunctionDescriptor, ObjectType,
};
use crate::registry::FunctionRegistry;

/// Source prefix of stored template functions.
pub const TEMPLATE_PREFIX: &str = "program:";

/// Source prefix of stored program functions.
pub const PROGRAM_PREFIX: &str = "python:";

const CONTEXT_PARAMS: [&str; 5] = ["self", "formatter", "kwargs", "mi", "locals"];

// =============================================================================
// UserFunctionDef
// =============================================================================

/// A persisted user function definition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "(String, String, i32, String)", into = "(String, String, i32, String)")
)]
pub struct UserFunctionDef {
    /// Function name.
    pub name: String,
    /// Documentation.
    pub doc: String,
    /// Declared argument count, `-1` for variadic.
    pub arg_count: i32,
    /// Source text.
    pub source: String,
}

impl UserFunctionDef {
    /// Creates a definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        doc: impl Into<String>,
        arg_count: i32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
            arg_count,
            source: source.into(),
        }
    }

    /// The object type the source compiles to.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        object_type_of(&self.source)
    }
}

impl From<(String, String, i32, String)> for UserFunctionDef {
    fn from((name, doc, arg_count, source): (String, String, i32, String)) -> Self {
        Self {
            name,
            doc,
            arg_count,
            source,
        }
    }
}

impl From<UserFunctionDef> for (String, String, i32, String) {
    fn from(def: UserFunctionDef) -> Self {
        (def.name, def.doc, def.arg_count, def.source)
    }
}

/// Classifies source text by its prefix.
#[must_use]
pub fn object_type_of(source: &str) -> ObjectType {
    if source.starts_with(TEMPLATE_PREFIX) {
        ObjectType::StoredMacroTemplate
    } else if source.starts_with(PROGRAM_PREFIX) {
        ObjectType::StoredMacroProgram
    } else {
        ObjectType::NativeFunction
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compiles one definition.
///
/// # Errors
/// Returns [`Error::compilation`] when a native source has no usable
/// `evaluate` header, its body does not parse, or its parameter count
/// disagrees with a fixed `arg_count`.
pub fn compile_user_function(def: &UserFunctionDef) -> Result<FunctionDescriptor> {
    let object_type = def.object_type();
    let body = match object_type {
        ObjectType::StoredMacroTemplate => FunctionBody::StoredTemplate,
        ObjectType::StoredMacroProgram => FunctionBody::StoredProgram,
        ObjectType::NativeFunction => FunctionBody::Native(Arc::new(compile_native(def)?)),
    };
    let program_text = match object_type {
        ObjectType::NativeFunction => normalize_indentation(&def.source),
        _ => def.source.clone(),
    };
    debug!(function = %def.name, ?object_type, "compiled user function");
    Ok(FunctionDescriptor {
        name: def.name.clone(),
        aliases: Vec::new(),
        category: Category::UserDefined,
        arg_count: ArgCount::from_declared(def.arg_count),
        doc: def.doc.clone(),
        object_type,
        program_text,
        body,
    })
}

/// Compiles a batch. Failures are logged and left out; the rest still
/// compile.
///
/// Names are unique in the result: a later definition replaces an earlier
/// one of the same name, keeping the earlier one's position.
#[must_use]
pub fn compile_user_template_functions(defs: &[UserFunctionDef]) -> Vec<FunctionDescriptor> {
    let mut compiled: Vec<FunctionDescriptor> = Vec::with_capacity(defs.len());
    for def in defs {
        let descriptor = match compile_user_function(def) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!(function = %def.name, error = %e, "user function failed to compile");
                continue;
            }
        };
        match compiled.iter_mut().find(|c| c.name == descriptor.name) {
            Some(earlier) => {
                debug!(function = %descriptor.name, "later definition replaces earlier one");
                *earlier = descriptor;
            }
            None => compiled.push(descriptor),
        }
    }
    compiled
}

/// Compiles a library's definitions and makes them active in place of
/// whatever the library registered before. Returns how many compiled.
pub fn load_user_template_functions(
    registry: &FunctionRegistry,
    library_id: &str,
    defs: &[UserFunctionDef],
) -> usize {
    let compiled = compile_user_template_functions(defs);
    let count = compiled.len();
    info!(library = %library_id, loaded = count, skipped = defs.len() - count, "loading user functions");
    registry.register_library_functions(library_id, compiled);
    count
}

/// Withdraws a library's user functions.
pub fn unload_user_template_functions(registry: &FunctionRegistry, library_id: &str) {
    info!(library = %library_id, "unloading user functions");
    registry.unregister_library_functions(library_id);
}

/// Replaces leading tabs on each line with four spaces.
#[must_use]
pub fn normalize_indentation(source: &str) -> String {
    source
        .lines()
        .map(|line| {
            let tabs = line.len() - line.trim_start_matches('\t').len();
            format!("{}{}", "    ".repeat(tabs), &line[tabs..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn compile_native(def: &UserFunctionDef) -> Result<CompiledNative> {
    let source = normalize_indentation(&def.source);
    let fail = |message: &str| Error::compilation(&def.name, message);

    let mut lines = source.lines().skip_while(|l| l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| fail("the source is empty"))?
        .trim();
    let params = parse_header(header).ok_or_else(|| {
        fail("expected a header of the form 'def evaluate(arg, ...):'")
    })?;

    if let ArgCount::Exact(n) = ArgCount::from_declared(def.arg_count) {
        if params.len() != n {
            return Err(fail(&format!(
                "the header names {} arguments but the function declares {n}",
                params.len()
            )));
        }
    }

    let body: Vec<&str> = lines.collect();
    let indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let body = body
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n");

    let program = parse_program(&body).map_err(|e| fail(&e.to_string()))?;
    Ok(CompiledNative { params, program })
}

/// Parses `def evaluate(a, b):` into its parameter names.
fn parse_header(header: &str) -> Option<Vec<String>> {
    let rest = header.strip_prefix("def")?.trim_start();
    let rest = rest.strip_prefix("evaluate")?.trim_start();
    let inner = rest
        .strip_prefix('(')?
        .trim_end()
        .strip_suffix(':')?
        .trim_end()
        .strip_suffix(')')?;
    let mut params: Vec<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if !params
        .iter()
        .all(|p| p.chars().all(|c| c.is_alphanumeric() || c == '_'))
    {
        return None;
    }
    let context = params
        .iter()
        .zip(CONTEXT_PARAMS)
        .take_while(|(p, c)| p == c)
        .count();
    params.drain(..context);
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_prefix() {
        assert_eq!(object_type_of("program: 1"), ObjectType::StoredMacroTemplate);
        assert_eq!(object_type_of("python:\n 1"), ObjectType::StoredMacroProgram);
        assert_eq!(
            object_type_of("def evaluate(x):\n  x"),
            ObjectType::NativeFunction
        );
    }

    #[test]
    fn stored_sources_are_kept_verbatim() {
        let def = UserFunctionDef::new("f", "doc", 2, "program: arguments(a, b); a");
        let f = compile_user_function(&def).unwrap();
        assert!(matches!(f.body, FunctionBody::StoredTemplate));
        assert_eq!(f.program_text, def.source);
        assert_eq!(f.arg_count, ArgCount::Exact(2));
        assert_eq!(f.category, Category::UserDefined);
    }

    #[test]
    fn native_header_skips_context_parameters() {
        let def = UserFunctionDef::new(
            "twice",
            "",
            1,
            "def evaluate(self, formatter, kwargs, mi, locals, value):\n    strcat(value, value)",
        );
        let f = compile_user_function(&def).unwrap();
        let FunctionBody::Native(native) = &f.body else {
            panic!("expected a native body");
        };
        assert_eq!(native.params, vec!["value".to_string()]);
        assert_eq!(native.program.called_functions(), vec!["strcat"]);
    }

    #[test]
    fn tabs_and_spaces_normalize_to_the_same_text() {
        let tabs = UserFunctionDef::new("f", "", 1, "def evaluate(x):\n\tx");
        let spaces = UserFunctionDef::new("f", "", 1, "def evaluate(x):\n    x");
        assert_eq!(
            compile_user_function(&tabs).unwrap().program_text,
            compile_user_function(&spaces).unwrap().program_text
        );
    }

    #[test]
    fn native_failures_name_the_function() {
        let bad_body = UserFunctionDef::new("broken", "", 1, "def evaluate(x):\n    add(x,");
        let err = compile_user_function(&bad_body).unwrap_err();
        assert!(err.to_string().contains("broken"));

        let no_header = UserFunctionDef::new("headless", "", 0, "add(1, 2)");
        assert!(compile_user_function(&no_header).is_err());

        let wrong_count = UserFunctionDef::new("w", "", 2, "def evaluate(x):\n    x");
        assert!(compile_user_function(&wrong_count).is_err());
    }

    #[test]
    fn batch_keeps_the_good_ones() {
        let defs = vec![
            UserFunctionDef::new("good", "", 0, "program: 1"),
            UserFunctionDef::new("bad", "", 1, "def evaluate(x):\n    (("),
            UserFunctionDef::new("also_good", "", 1, "def evaluate(x):\n    x"),
        ];
        let names: Vec<_> = compile_user_template_functions(&defs)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["good", "also_good"]);
    }

    #[test]
    fn load_and_unload_through_registry() {
        let registry = FunctionRegistry::with_builtins();
        let defs = vec![UserFunctionDef::new("mine", "", 0, "program: 'x'")];
        assert_eq!(load_user_template_functions(&registry, "lib", &defs), 1);
        assert!(registry.lookup("mine").is_some());
        unload_user_template_functions(&registry, "lib");
        assert!(registry.lookup("mine").is_none());
    }

    #[test]
    fn tuple_conversion() {
        let def = UserFunctionDef::new("f", "d", -1, "program: 1");
        let tuple: (String, String, i32, String) = def.clone().into();
        assert_eq!(UserFunctionDef::from(tuple), def);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_four_element_sequence() {
        let def = UserFunctionDef::new("f", "doc", 3, "program: 1");
        let bytes = rmp_serde::to_vec(&def).unwrap();
        let as_tuple: (String, String, i32, String) = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(as_tuple.2, 3);
        let back: UserFunctionDef = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, def);
    }
}
