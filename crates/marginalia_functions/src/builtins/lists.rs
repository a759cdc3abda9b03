//! List manipulation functions.
//!
//! A list is a string with a caller-chosen separator. Items are trimmed and
//! empty items dropped unless a function says otherwise. Results joined with
//! a bare `,` use `, ` instead.

use std::collections::{BTreeSet, HashSet};

use marginalia_foundation::{Error, Result, Value};

use super::string::replace_groups;
use super::{arg, fixed};
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{patterns, text};

const RANGE_LIMIT: i64 = 1000;

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::ListManipulation;

    vec![
        FunctionDescriptor::builtin(
            "list_count",
            ListManipulation,
            Exact(2),
            "list_count(value, separator) -- interprets the value as a list of items \
             separated by separator and returns the number of items in the list.",
            native_list_count,
        )
        .with_aliases(&["count"]),
        FunctionDescriptor::builtin(
            "list_count_matching",
            ListManipulation,
            Exact(3),
            "list_count_matching(value, pattern, separator) -- returns the number of items \
             in the list that match the regular expression pattern, ignoring case.",
            native_list_count_matching,
        )
        .with_aliases(&["count_matching"]),
        FunctionDescriptor::builtin(
            "list_split",
            ListManipulation,
            Exact(3),
            "list_split(list_val, sep, id_prefix) -- splits list_val into separate values \
             using sep, then assigns the values to local variables named id_prefix_N where \
             N is the position of the value in the list. Returns the last element.",
            native_list_split,
        ),
        FunctionDescriptor::builtin(
            "list_join",
            ListManipulation,
            Variadic,
            "list_join(with_separator, list1, separator1 [, list2, separator2]*) -- returns \
             a list made by joining the items in the source lists using with_separator. \
             Duplicates are removed ignoring case. Items keep the position of their first \
             appearance and the spelling of their last.",
            native_list_join,
        ),
        FunctionDescriptor::builtin(
            "list_union",
            ListManipulation,
            Exact(3),
            "list_union(list1, list2, separator) -- returns a list made by merging the items \
             in list1 and list2, removing duplicates ignoring case. Items keep the position \
             of their first appearance and the spelling of their last.",
            native_list_union,
        )
        .with_aliases(&["merge_lists"]),
        FunctionDescriptor::builtin(
            "list_remove_duplicates",
            ListManipulation,
            Exact(2),
            "list_remove_duplicates(list, separator) -- returns the list with duplicates \
             removed ignoring case. If items differ only in case then the last is kept.",
            native_list_remove_duplicates,
        ),
        FunctionDescriptor::builtin(
            "list_difference",
            ListManipulation,
            Exact(3),
            "list_difference(list1, list2, separator) -- returns list1 without the items \
             found in list2, compared ignoring case.",
            native_list_difference,
        ),
        FunctionDescriptor::builtin(
            "list_intersection",
            ListManipulation,
            Exact(3),
            "list_intersection(list1, list2, separator) -- returns list1 without the items \
             not found in list2, compared ignoring case.",
            native_list_intersection,
        ),
        FunctionDescriptor::builtin(
            "list_sort",
            ListManipulation,
            Exact(3),
            "list_sort(value, direction, separator) -- returns the list sorted ignoring \
             case. A direction of 0 sorts ascending, anything else descending.",
            native_list_sort,
        ),
        FunctionDescriptor::builtin(
            "list_equals",
            ListManipulation,
            Exact(6),
            "list_equals(list1, sep1, list2, sep2, yes_val, no_val) -- returns yes_val if \
             the two lists contain the same items ignoring case and order, otherwise no_val.",
            native_list_equals,
        ),
        FunctionDescriptor::builtin(
            "list_re",
            ListManipulation,
            Exact(4),
            "list_re(src_list, separator, include_re, opt_replace) -- returns the items of \
             src_list that match include_re. If opt_replace is not empty it is applied to \
             each kept item.",
            native_list_re,
        ),
        FunctionDescriptor::builtin(
            "list_re_group",
            ListManipulation,
            Variadic,
            "list_re_group(src_list, separator, include_re, search_re [, template_for_group]*) \
             -- like list_re except replacements are done with re_group(item, search_re, \
             template ...).",
            native_list_re_group,
        ),
        FunctionDescriptor::builtin(
            "sublist",
            ListManipulation,
            Exact(4),
            "sublist(value, start_index, end_index, separator) -- returns the items from \
             start_index up to end_index. Negative indices count from the end; an \
             end_index of zero means the end of the list.",
            native_sublist,
        ),
        FunctionDescriptor::builtin(
            "subitems",
            ListManipulation,
            Exact(3),
            "subitems(value, start_index, end_index) -- interprets the value as a \
             comma-separated list of period-separated hierarchical items and returns the \
             components start_index to end_index of each item, without duplicates.",
            native_subitems,
        ),
        FunctionDescriptor::builtin(
            "range",
            ListManipulation,
            Variadic,
            "range(start, stop, step, limit) -- returns the numbers from start up to but not \
             including stop in steps of step, at most limit of them. One argument is stop; \
             two are start and stop. The limit defaults to 1000.",
            native_range,
        ),
    ]
}

fn join(items: &[String], separator: &str) -> Value {
    Value::Text(items.join(text::output_separator(separator)))
}

fn lowered(value: &str, separator: &str) -> HashSet<String> {
    text::split_items(value, separator)
        .into_iter()
        .map(|item| item.to_lowercase())
        .collect()
}

/// List: list_count
fn native_list_count(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator] = fixed::<2>("list_count", args)?;
    let count = if separator.is_empty() {
        usize::from(!value.is_empty())
    } else {
        value.split(separator.as_str()).filter(|v| !v.is_empty()).count()
    };
    Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
}

/// List: list_count_matching
fn native_list_count_matching(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, pattern, separator] = fixed::<3>("list_count_matching", args)?;
    let re = patterns::search(pattern)?;
    let count = text::split_items(value, separator)
        .iter()
        .filter(|item| re.is_match(item))
        .count();
    Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
}

/// List: list_split
fn native_list_split(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator, prefix] = fixed::<3>("list_split", args)?;
    let mut last = String::new();
    for (i, item) in text::split_all(value, separator).into_iter().enumerate() {
        ctx.locals.set(format!("{prefix}_{i}"), item.clone());
        last = item;
    }
    Ok(Value::Text(last))
}

/// List: list_join
fn native_list_join(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [with_separator, pairs @ ..] = args else {
        return Err(Error::arity("list_join", "requires at least 1 argument"));
    };
    if pairs.len() % 2 != 0 {
        return Err(Error::arity(
            "list_join",
            "invalid 'list, separator' pairs. Every list must have one associated separator",
        ));
    }
    let items = pairs
        .chunks_exact(2)
        .flat_map(|pair| text::split_items(&pair[0], &pair[1]));
    Ok(Value::Text(text::dedupe_last_spelling(items).join(with_separator)))
}

/// List: list_union
fn native_list_union(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [first, second, separator] = fixed::<3>("list_union", args)?;
    let items = text::split_items(first, separator)
        .into_iter()
        .chain(text::split_items(second, separator));
    Ok(join(&text::dedupe_last_spelling(items), separator))
}

/// List: list_remove_duplicates
fn native_list_remove_duplicates(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator] = fixed::<2>("list_remove_duplicates", args)?;
    Ok(join(
        &text::dedupe_last_spelling(text::split_items(value, separator)),
        separator,
    ))
}

fn filter_by_membership(args: &[String], name: &str, keep_found: bool) -> Result<Value> {
    let [first, second, separator] = fixed::<3>(name, args)?;
    let other = lowered(second, separator);
    let kept = text::split_items(first, separator)
        .into_iter()
        .filter(|item| other.contains(&item.to_lowercase()) == keep_found);
    Ok(join(&text::dedupe_exact(kept), separator))
}

/// List: list_difference
fn native_list_difference(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    filter_by_membership(args, "list_difference", false)
}

/// List: list_intersection
fn native_list_intersection(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    filter_by_membership(args, "list_intersection", true)
}

/// List: list_sort
fn native_list_sort(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, direction, separator] = fixed::<3>("list_sort", args)?;
    let mut items = text::split_items(value, separator);
    if direction == "0" {
        text::sort_by_key(&mut items);
    } else {
        items.sort_by_cached_key(|item| std::cmp::Reverse(text::sort_key(item)));
    }
    Ok(join(&items, separator))
}

/// List: list_equals
fn native_list_equals(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [first, sep1, second, sep2, yes, no] = fixed::<6>("list_equals", args)?;
    let same = lowered(first, sep1) == lowered(second, sep2);
    Ok(Value::from(if same { yes } else { no }.as_str()))
}

/// List: list_re
fn native_list_re(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator, include, replacement] = fixed::<4>("list_re", args)?;
    let include_re = patterns::search(include)?;
    let mut result = Vec::new();
    for item in text::split_items(value, separator) {
        if !include_re.is_match(&item) {
            continue;
        }
        let item = if replacement.is_empty() {
            item
        } else {
            patterns::substitute(include, replacement, &item, false)?
        };
        result.extend(text::split_items(&item, separator));
    }
    Ok(join(&text::dedupe_exact(result), separator))
}

/// List: list_re_group
fn native_list_re_group(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator, include, search, templates @ ..] = args else {
        return Err(Error::arity("list_re_group", "requires at least 4 arguments"));
    };
    let include_re = patterns::search(include)?;
    let search_re = patterns::search(search)?;
    let mut result = Vec::new();
    for item in text::split_items(value, separator) {
        if include_re.is_match(&item) {
            let replaced = replace_groups(ctx, &item, &search_re, templates)?;
            result.extend(text::split_items(&replaced, separator));
        }
    }
    Ok(join(&text::dedupe_exact(result), separator))
}

/// List: sublist
fn native_sublist(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, start, end, separator] = fixed::<4>("sublist", args)?;
    if value.is_empty() {
        return Ok(Value::empty());
    }
    let start = text::integer("sublist", start)?;
    let end = text::integer("sublist", end)?;
    // Empty items are kept so that indices count what the user sees.
    let items = text::split_all(value, separator);
    Ok(join(&text::sub_slice(&items, start, end), separator))
}

/// Splits a hierarchical item on periods that sit between two other
/// characters, so `A.B` splits but `A. B` and `A..B` do not.
fn split_periods(item: &str) -> Vec<String> {
    let chars: Vec<char> = item.chars().collect();
    let joins = |c: char| c != '.' && !c.is_whitespace();
    let mut parts = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        let splits = c == '.'
            && i > 0
            && i + 1 < chars.len()
            && joins(chars[i - 1])
            && joins(chars[i + 1]);
        if splits {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// List: subitems
fn native_subitems(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, start, end] = fixed::<3>("subitems", args)?;
    if value.is_empty() {
        return Ok(Value::empty());
    }
    let start = text::integer("subitems", start)?;
    let end = text::integer("subitems", end)?;
    let mut found = BTreeSet::new();
    for item in text::split_items(value, ",") {
        let components = split_periods(&item);
        let joined = text::sub_slice(&components, start, end).join(".");
        let joined = joined.trim();
        if !joined.is_empty() {
            found.insert(joined.to_string());
        }
    }
    let mut items: Vec<String> = found.into_iter().collect();
    text::sort_by_key(&mut items);
    Ok(Value::Text(items.join(", ")))
}

/// List: range
fn native_range(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "range";
    if args.is_empty() || args.len() > 4 {
        return Err(Error::arity(NAME, "requires 1 to 4 arguments"));
    }
    let number = |i: usize| text::integer_or_zero(NAME, arg(args, i));
    let (start, stop) = if args.len() == 1 {
        (0, number(0)?)
    } else {
        (number(0)?, number(1)?)
    };
    let step = if args.len() >= 3 { number(2)? } else { 1 };
    let limit = if args.len() == 4 { number(3)? } else { RANGE_LIMIT };
    if step == 0 {
        return Err(Error::invalid_argument(NAME, "the step must not be zero"));
    }

    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 && start < stop {
        (stop - start - 1) / step + 1
    } else if step < 0 && start > stop {
        (start - stop - 1) / -step + 1
    } else {
        0
    };
    if len > i128::from(limit) {
        return Err(Error::invalid_argument(
            NAME,
            format!("length ({len}) longer than limit ({limit})"),
        ));
    }
    let mut values = Vec::new();
    let mut current = start;
    for _ in 0..len {
        values.push(current.to_string());
        current += step;
    }
    Ok(Value::Text(values.join(", ")))
}

#[cfg(test)]
mod tests {
    use marginalia_foundation::Locals;

    use super::split_periods;
    use crate::testing::{TestFormatter, builtin, call_in, run};

    #[test]
    fn counting() {
        assert_eq!(run("list_count", &["a,b,c", ","]).unwrap(), "3");
        assert_eq!(run("count", &["", ","]).unwrap(), "0");
        assert_eq!(run("list_count", &["A & B", "&"]).unwrap(), "2");
        assert_eq!(
            run("list_count_matching", &["Fiction, Non-fiction, History", "fiction", ","]).unwrap(),
            "2"
        );
    }

    #[test]
    fn union_keeps_first_position_and_last_spelling() {
        assert_eq!(run("list_union", &["Foo,Bar", "foo,Baz", ","]).unwrap(), "foo, Bar, Baz");
        assert_eq!(run("merge_lists", &["a&b", "c", "&"]).unwrap(), "a&b&c");
    }

    #[test]
    fn join_uses_given_separator() {
        assert_eq!(
            run("list_join", &["|", "a,B,c", ",", "A&d", "&"]).unwrap(),
            "A|B|c|d"
        );
        assert!(run("list_join", &["|", "a,b"]).is_err());
    }

    #[test]
    fn duplicates_difference_intersection() {
        assert_eq!(run("list_remove_duplicates", &["a, B, A, b", ","]).unwrap(), "A, b");
        assert_eq!(run("list_difference", &["a, b, c", "B", ","]).unwrap(), "a, c");
        assert_eq!(run("list_intersection", &["a, b, c", "C, A", ","]).unwrap(), "a, c");
    }

    #[test]
    fn sorting_and_equality() {
        assert_eq!(run("list_sort", &["b, C, a", "0", ","]).unwrap(), "a, b, C");
        assert_eq!(run("list_sort", &["b, C, a", "1", ","]).unwrap(), "C, b, a");
        assert_eq!(run("list_equals", &["a,B", ",", "b&A", "&", "y", "n"]).unwrap(), "y");
        assert_eq!(run("list_equals", &["a", ",", "a&b", "&", "y", "n"]).unwrap(), "n");
    }

    #[test]
    fn regex_lists() {
        assert_eq!(
            run("list_re", &["Fiction, History, Fantasy", ",", "^f", ""]).unwrap(),
            "Fiction, Fantasy"
        );
        assert_eq!(
            run("list_re", &["Fiction, Fantasy", ",", "^(.).*$", r"Genre: \1"]).unwrap(),
            "Genre: F"
        );
        assert_eq!(
            run("list_re_group", &["ab, cd", ",", ".", "(.)(.)", "[[$]]!"]).unwrap(),
            "a!b, c!d"
        );
    }

    #[test]
    fn sublist_keeps_empty_items() {
        assert_eq!(run("sublist", &["A, B, C", "0", "1", ","]).unwrap(), "A");
        assert_eq!(run("sublist", &["A, B, C", "-1", "0", ","]).unwrap(), "C");
        assert_eq!(run("sublist", &["A, B, C", "0", "-1", ","]).unwrap(), "A, B");
        assert_eq!(run("sublist", &["A,,C", "1", "2", ","]).unwrap(), "");
    }

    #[test]
    fn subitems_split_hierarchies() {
        assert_eq!(run("subitems", &["A.B.C", "0", "1"]).unwrap(), "A");
        assert_eq!(run("subitems", &["A.B.C", "1", "0"]).unwrap(), "B.C");
        assert_eq!(run("subitems", &["A.B.C, D.E", "0", "2"]).unwrap(), "A.B, D.E");
        assert_eq!(run("subitems", &["D.E, A.X", "0", "1"]).unwrap(), "A, D");
        assert_eq!(split_periods("J. R. R."), vec!["J. R. R."]);
    }

    #[test]
    fn range_follows_start_stop_step() {
        assert_eq!(run("range", &["5"]).unwrap(), "0, 1, 2, 3, 4");
        assert_eq!(run("range", &["-1", "2"]).unwrap(), "-1, 0, 1");
        assert_eq!(run("range", &["1", "5", "2"]).unwrap(), "1, 3");
        assert_eq!(run("range", &["5", "1", "-2"]).unwrap(), "5, 3");
        assert_eq!(run("range", &["5", "1"]).unwrap(), "");
        let err = run("range", &["1", "5", "2", "1"]).unwrap_err();
        assert!(err.to_string().contains("longer than limit"));
    }

    #[test]
    fn list_split_assigns_locals() {
        let mut locals = Locals::new();
        let desc = builtin("list_split");
        let last = call_in(
            &TestFormatter::default(),
            &desc,
            None,
            &mut locals,
            &["one:two:foo", ":", "var"],
        )
        .unwrap();
        assert_eq!(last, "foo");
        assert_eq!(locals.get("var_0"), Some("one"));
        assert_eq!(locals.get("var_2"), Some("foo"));
    }
}
