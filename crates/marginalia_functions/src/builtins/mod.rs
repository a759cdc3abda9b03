//! The builtin function library.
//!
//! Functions are organized by category:
//! - `relational`: Three-way comparisons
//! - `arithmetic`: Numeric operations over string operands
//! - `boolean`: Non-short-circuiting `and`/`or`/`not`
//! - `string`: String manipulation and case changes
//! - `lists`: Operations over separator-delimited lists
//! - `lookup`: Pattern lookups in lists and branching
//! - `dates`: Date parsing, formatting and arithmetic
//! - `formatting`: Numbers, durations and ratings
//! - `url`: URL construction and encoding
//! - `metadata`: Values read from the book being rendered
//! - `database`: Library-wide queries and the GUI
//! - `other`: Recursion, variables and the evaluator's inline forms

#[allow(clippy::unnecessary_wraps)]
mod arithmetic;
#[allow(clippy::unnecessary_wraps)]
mod boolean;
#[allow(clippy::unnecessary_wraps)]
mod database;
#[allow(clippy::unnecessary_wraps)]
mod dates;
#[allow(clippy::unnecessary_wraps)]
mod formatting;
#[allow(clippy::unnecessary_wraps)]
mod lists;
#[allow(clippy::unnecessary_wraps)]
mod lookup;
#[allow(clippy::unnecessary_wraps)]
#[allow(clippy::match_same_arms)]
mod metadata;
#[allow(clippy::unnecessary_wraps)]
mod other;
#[allow(clippy::unnecessary_wraps)]
mod relational;
#[allow(clippy::unnecessary_wraps)]
#[allow(clippy::redundant_closure_for_method_calls)]
mod string;
#[allow(clippy::unnecessary_wraps)]
mod url;

use marginalia_foundation::{Error, Result};

use crate::contract::FunctionDescriptor;

/// Every builtin, in catalogue order.
#[must_use]
pub fn all() -> Vec<FunctionDescriptor> {
    let mut functions = Vec::with_capacity(160);
    functions.extend(relational::descriptors());
    functions.extend(arithmetic::descriptors());
    functions.extend(boolean::descriptors());
    functions.extend(string::descriptors());
    functions.extend(lists::descriptors());
    functions.extend(lookup::descriptors());
    functions.extend(dates::descriptors());
    functions.extend(formatting::descriptors());
    functions.extend(url::descriptors());
    functions.extend(metadata::descriptors());
    functions.extend(database::descriptors());
    functions.extend(other::descriptors());
    functions
}

/// Views the arguments of a fixed-arity builtin as an array.
///
/// The caller-side arity check normally guarantees the length; this keeps
/// direct calls from panicking.
pub(crate) fn fixed<'a, const N: usize>(name: &str, args: &'a [String]) -> Result<&'a [String; N]> {
    <&[String; N]>::try_from(args).map_err(|_| Error::arity_mismatch(name, N, args.len()))
}

/// Templates passed as arguments spell braces as `[[` and `]]`.
pub(crate) fn unbracket(template: &str) -> String {
    template.replace("[[", "{").replace("]]", "}")
}

/// The argument at `index`, or the empty string.
pub(crate) fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map_or("", String::as_str)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::contract::{ArgCount, FunctionBody};

    #[test]
    fn names_and_aliases_are_unique() {
        let mut seen = HashSet::new();
        for desc in all() {
            assert!(seen.insert(desc.name.clone()), "duplicate {}", desc.name);
            for alias in &desc.aliases {
                assert!(seen.insert(alias.clone()), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn catalogue_is_complete() {
        let functions = all();
        assert!(functions.len() >= 119, "only {} builtins", functions.len());
        for name in [
            "strcmp", "add", "substr", "list_union", "switch", "format_duration",
            "date_arithmetic", "book_count", "template", "eval", "query_string",
        ] {
            assert!(functions.iter().any(|d| d.name == name), "missing {name}");
        }
    }

    #[test]
    fn every_builtin_documents_itself() {
        for desc in all() {
            assert!(!desc.doc.is_empty(), "{} has no documentation", desc.name);
            assert!(desc.is_builtin());
        }
    }

    #[test]
    fn inline_forms_are_marked() {
        let inline: Vec<_> = all()
            .into_iter()
            .filter(|d| matches!(d.body, FunctionBody::Inline))
            .map(|d| d.name)
            .collect();
        assert_eq!(
            inline,
            ["arguments", "globals", "set_globals", "list_count_field"]
        );
    }

    #[test]
    fn fixed_rejects_wrong_length() {
        let args = vec!["a".to_string()];
        assert!(fixed::<1>("f", &args).is_ok());
        assert!(fixed::<2>("f", &args).is_err());
        assert_eq!(ArgCount::Exact(2).declared(), 2);
    }
}
