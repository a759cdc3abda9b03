//! Relational functions.

use std::cmp::Ordering;

use marginalia_foundation::{Error, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::text;

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::builtin(
            "strcmp",
            Category::Relational,
            ArgCount::Exact(5),
            "strcmp(x, y, lt, eq, gt) -- does a case-insensitive lexical comparison of x \
             and y. Returns lt if x < y, eq if x == y, otherwise gt.",
            native_strcmp,
        ),
        FunctionDescriptor::builtin(
            "strcmpcase",
            Category::Relational,
            ArgCount::Exact(5),
            "strcmpcase(x, y, lt, eq, gt) -- does a case-sensitive lexical comparison of x \
             and y. Returns lt if x < y, eq if x == y, otherwise gt.",
            native_strcmpcase,
        ),
        FunctionDescriptor::builtin(
            "cmp",
            Category::Relational,
            ArgCount::Exact(5),
            "cmp(value, y, lt, eq, gt) -- compares value and y after converting both to \
             numbers. Returns lt if value < y, eq if value == y, otherwise gt.",
            native_cmp,
        ),
        FunctionDescriptor::builtin(
            "first_matching_cmp",
            Category::Relational,
            ArgCount::Variadic,
            "first_matching_cmp(val, [cmp, result,]* else_result) -- compares val < cmp in \
             sequence, returning the associated result for the first comparison that \
             succeeds. Returns else_result if no comparison succeeds.",
            native_first_matching_cmp,
        ),
    ]
}

fn pick(order: Ordering, lt: &str, eq: &str, gt: &str) -> Value {
    Value::from(match order {
        Ordering::Less => lt,
        Ordering::Equal => eq,
        Ordering::Greater => gt,
    })
}

/// Relational: strcmp
fn native_strcmp(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x, y, lt, eq, gt] = fixed::<5>("strcmp", args)?;
    Ok(pick(text::strcmp(x, y), lt, eq, gt))
}

/// Relational: strcmpcase
fn native_strcmpcase(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x, y, lt, eq, gt] = fixed::<5>("strcmpcase", args)?;
    Ok(pick(text::strcmp_case(x, y), lt, eq, gt))
}

/// Relational: cmp
fn native_cmp(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x, y, lt, eq, gt] = fixed::<5>("cmp", args)?;
    let x = text::number("cmp", x)?;
    let y = text::number("cmp", y)?;
    let order = x.partial_cmp(&y).unwrap_or(Ordering::Greater);
    Ok(pick(order, lt, eq, gt))
}

/// Relational: first_matching_cmp
fn native_first_matching_cmp(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "first_matching_cmp";
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(Error::arity(NAME, "requires an even number of arguments"));
    }
    let value = text::number(NAME, &args[0])?;
    for pair in args[1..args.len() - 1].chunks_exact(2) {
        if value < text::number(NAME, &pair[0])? {
            return Ok(Value::from(pair[1].as_str()));
        }
    }
    Ok(Value::from(args[args.len() - 1].as_str()))
}
