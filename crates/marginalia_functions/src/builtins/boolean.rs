//! Boolean functions.
//!
//! These see already-evaluated arguments, so unlike the `&&` and `||`
//! operators they never short-circuit.

use marginalia_foundation::{Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::builtin(
            "and",
            Category::Boolean,
            ArgCount::Variadic,
            "and(value [, value]*) -- returns '1' if all values are not empty, otherwise \
             the empty string. Every argument is evaluated, so side effects such as \
             assign() always happen. The && operator short-circuits instead.",
            native_and,
        ),
        FunctionDescriptor::builtin(
            "or",
            Category::Boolean,
            ArgCount::Variadic,
            "or(value [, value]*) -- returns '1' if any value is not empty, otherwise the \
             empty string. Every argument is evaluated; the || operator short-circuits.",
            native_or,
        ),
        FunctionDescriptor::builtin(
            "not",
            Category::Boolean,
            ArgCount::Exact(1),
            "not(value) -- returns '1' if the value is empty, otherwise the empty string.",
            native_not,
        ),
    ]
}

/// Boolean: and
fn native_and(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    Ok(Value::from_flag(args.iter().all(|a| !a.is_empty())))
}

/// Boolean: or
fn native_or(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    Ok(Value::from_flag(args.iter().any(|a| !a.is_empty())))
}

/// Boolean: not
fn native_not(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("not", args)?;
    Ok(Value::from_flag(value.is_empty()))
}

#[cfg(test)]
mod tests {
    use crate::testing::run;

    #[test]
    fn and_or_not() {
        assert_eq!(run("and", &["a", "b"]).unwrap(), "1");
        assert_eq!(run("and", &["a", ""]).unwrap(), "");
        assert_eq!(run("or", &["", "b"]).unwrap(), "1");
        assert_eq!(run("or", &["", ""]).unwrap(), "");
        assert_eq!(run("not", &[""]).unwrap(), "1");
        assert_eq!(run("not", &["x"]).unwrap(), "");
    }
}
