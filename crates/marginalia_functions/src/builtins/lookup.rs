//! List lookups and branching over values.
//!
//! Patterns are case-insensitive regular expressions tried in the order the
//! caller gives them. The first match wins.

use marginalia_foundation::{Error, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{patterns, text};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{IteratingValues, ListLookup};

    vec![
        FunctionDescriptor::builtin(
            "list_item",
            ListLookup,
            Exact(3),
            "list_item(value, index, separator) -- returns the index'th item of the list. \
             The first item is number zero and the last is -1. Returns the empty string \
             if the item is not in the list.",
            native_list_item,
        ),
        FunctionDescriptor::builtin(
            "select",
            ListLookup,
            Exact(2),
            "select(value, key) -- interprets the value as a comma-separated list of \
             id:id_value items and returns the id_value of the first item whose id is key.",
            native_select,
        ),
        FunctionDescriptor::builtin(
            "list_contains",
            ListLookup,
            Variadic,
            "list_contains(value, separator, [pattern, found_val,]* not_found_val) -- \
             returns the found_val of the first pattern matching any item of the list, \
             otherwise not_found_val.",
            native_list_contains,
        )
        .with_aliases(&["in_list"]),
        FunctionDescriptor::builtin(
            "str_in_list",
            ListLookup,
            Variadic,
            "str_in_list(value, separator, [string, found_val,]+ not_found_val) -- like \
             list_contains but compares strings ignoring case instead of matching \
             patterns. A string containing the separator is itself treated as a list.",
            native_str_in_list,
        ),
        FunctionDescriptor::builtin(
            "identifier_in_list",
            ListLookup,
            Variadic,
            "identifier_in_list(val, id_name [, found_val, not_found_val]) -- treats val as \
             a comma-separated list of id_name:value identifiers. id_name is either a name \
             or name:regexp. With found_val and not_found_val returns one of them, \
             otherwise the matching identifier or the empty string.",
            native_identifier_in_list,
        ),
        FunctionDescriptor::builtin(
            "lookup",
            IteratingValues,
            Variadic,
            "lookup(value, [pattern, key,]* else_key) -- returns the value of the field \
             named by the key of the first pattern matching value, otherwise the value of \
             the field named by else_key.",
            native_lookup,
        ),
        FunctionDescriptor::builtin(
            "switch",
            IteratingValues,
            Variadic,
            "switch(value, [patternN, valueN,]+ else_value) -- returns the valueN of the \
             first patternN matching value, otherwise else_value.",
            native_switch,
        ),
        FunctionDescriptor::builtin(
            "switch_if",
            IteratingValues,
            Variadic,
            "switch_if([test_expression, value_expression,]+ else_expression) -- returns \
             the value_expression of the first non-empty test_expression, otherwise \
             else_expression.",
            native_switch_if,
        ),
        FunctionDescriptor::builtin(
            "first_non_empty",
            IteratingValues,
            Variadic,
            "first_non_empty(value [, value]*) -- returns the first value that is not \
             empty, or the empty string.",
            native_first_non_empty,
        ),
    ]
}

/// Walks `[test, result,]* else` pairs and returns the result of the first
/// test that passes.
fn first_pair<F>(branches: &[String], mut passes: F) -> Result<&str>
where
    F: FnMut(&str) -> Result<bool>,
{
    let (fallback, pairs) = branches
        .split_last()
        .ok_or_else(|| Error::internal("no fallback branch"))?;
    for pair in pairs.chunks_exact(2) {
        if passes(&pair[0])? {
            return Ok(&pair[1]);
        }
    }
    Ok(fallback)
}

fn require_odd(name: &str, branches: &[String]) -> Result<()> {
    if branches.len() % 2 == 1 {
        Ok(())
    } else {
        Err(Error::arity(name, "requires an odd number of pattern and value arguments"))
    }
}

/// Lookup: list_item
fn native_list_item(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, index, separator] = fixed::<3>("list_item", args)?;
    if value.is_empty() {
        return Ok(Value::empty());
    }
    let index = text::integer("list_item", index)?;
    let items = text::split_all(value, separator);
    let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let position = if index < 0 { len + index } else { index };
    Ok(usize::try_from(position)
        .ok()
        .and_then(|i| items.get(i))
        .map_or_else(Value::empty, |item| Value::from(item.as_str())))
}

/// Lookup: select
fn native_select(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, key] = fixed::<2>("select", args)?;
    let prefix = format!("{key}:");
    Ok(text::split_all(value, ",")
        .iter()
        .find_map(|item| item.strip_prefix(&prefix))
        .map_or_else(Value::empty, Value::from))
}

/// Lookup: list_contains
fn native_list_contains(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator, branches @ ..] = args else {
        return Err(Error::arity("list_contains", "requires at least 3 arguments"));
    };
    require_odd("list_contains", branches)?;
    let items = text::split_items(value, separator);
    let found = first_pair(branches, |pattern| {
        let re = patterns::search(pattern)?;
        Ok(items.iter().any(|item| re.is_match(item)))
    })?;
    Ok(Value::from(found))
}

/// Lookup: str_in_list
fn native_str_in_list(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator, branches @ ..] = args else {
        return Err(Error::arity("str_in_list", "requires at least 3 arguments"));
    };
    require_odd("str_in_list", branches)?;
    let items = text::split_items(value, separator);
    let found = first_pair(branches, |candidates| {
        Ok(text::split_items(candidates, separator).iter().any(|candidate| {
            items
                .iter()
                .any(|item| text::strcmp(candidate, item).is_eq())
        }))
    })?;
    Ok(Value::from(found))
}

/// Lookup: identifier_in_list
fn native_identifier_in_list(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "identifier_in_list";
    let (value, ident, outcomes) = match args {
        [value, ident] => (value, ident, None),
        [value, ident, found, not_found] => (value, ident, Some((found, not_found))),
        _ => return Err(Error::arity(NAME, "requires 2 or 4 arguments")),
    };
    let not_found = outcomes.map_or("", |(_, nf)| nf.as_str());
    let (id, pattern) = ident.split_once(':').unwrap_or((ident.as_str(), ""));
    if id.is_empty() {
        return Ok(Value::from(not_found));
    }
    let re = if pattern.is_empty() {
        None
    } else {
        Some(patterns::search(pattern)?)
    };
    for candidate in text::split_items(value, ",") {
        let (name, val) = candidate.split_once(':').unwrap_or((candidate.as_str(), ""));
        let value_matches = re.as_ref().is_none_or(|re| re.is_match(val));
        if !val.is_empty() && name == id && value_matches {
            return Ok(match outcomes {
                Some((found, _)) => Value::from(found.as_str()),
                None => Value::Text(candidate),
            });
        }
    }
    Ok(Value::from(not_found))
}

/// Lookup: lookup
fn native_lookup(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "lookup";
    let [value, branches @ ..] = args else {
        return Err(Error::arity(NAME, "requires either 2 or an odd number of arguments"));
    };
    let key = match branches {
        [if_set, if_unset] => {
            if value.is_empty() {
                if_unset.as_str()
            } else {
                if_set.as_str()
            }
        }
        _ => {
            if branches.len() % 2 != 1 {
                return Err(Error::arity(
                    NAME,
                    "requires either 2 or an odd number of arguments",
                ));
            }
            first_pair(branches, |pattern| patterns::is_match(pattern, value))?
        }
    };
    let template = format!("{{{}}}", key.trim());
    let rendered = ctx
        .formatter
        .render_template(&template, ctx.metadata, ctx.kwargs)?;
    Ok(Value::Text(rendered))
}

/// Iterating: switch
fn native_switch(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, branches @ ..] = args else {
        return Err(Error::arity("switch", "requires an even number of arguments"));
    };
    if branches.len() % 2 != 1 {
        return Err(Error::arity("switch", "requires an even number of arguments"));
    }
    let result = first_pair(branches, |pattern| patterns::is_match(pattern, value))?;
    Ok(Value::from(result))
}

/// Iterating: switch_if
fn native_switch_if(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    require_odd("switch_if", args)?;
    let result = first_pair(args, |test| Ok(!test.is_empty()))?;
    Ok(Value::from(result))
}

/// Iterating: first_non_empty
fn native_first_non_empty(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    Ok(args
        .iter()
        .find(|a| !a.is_empty())
        .map_or_else(Value::empty, |a| Value::from(a.as_str())))
}
