//! Arithmetic functions.
//!
//! Operands arrive as strings. The empty string and `None` count as zero.

use marginalia_foundation::{Error, ErrorKind, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::text::{exact_integer, number};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::builtin(
            "add",
            Category::Arithmetic,
            ArgCount::Variadic,
            "add(x [, y]*) -- returns the sum of its arguments. Throws an exception if an \
             argument is not a number.",
            native_add,
        ),
        FunctionDescriptor::builtin(
            "subtract",
            Category::Arithmetic,
            ArgCount::Exact(2),
            "subtract(x, y) -- returns x - y.",
            native_subtract,
        ),
        FunctionDescriptor::builtin(
            "multiply",
            Category::Arithmetic,
            ArgCount::Variadic,
            "multiply(x [, y]*) -- returns the product of its arguments.",
            native_multiply,
        ),
        FunctionDescriptor::builtin(
            "divide",
            Category::Arithmetic,
            ArgCount::Exact(2),
            "divide(x, y) -- returns x / y.",
            native_divide,
        ),
        FunctionDescriptor::builtin(
            "ceiling",
            Category::Arithmetic,
            ArgCount::Exact(1),
            "ceiling(value) -- returns the smallest integer greater than or equal to value.",
            native_ceiling,
        ),
        FunctionDescriptor::builtin(
            "floor",
            Category::Arithmetic,
            ArgCount::Exact(1),
            "floor(value) -- returns the largest integer less than or equal to value.",
            native_floor,
        ),
        FunctionDescriptor::builtin(
            "round",
            Category::Arithmetic,
            ArgCount::Exact(1),
            "round(value) -- returns the nearest integer to value. Halves round to even.",
            native_round,
        ),
        FunctionDescriptor::builtin(
            "mod",
            Category::Arithmetic,
            ArgCount::Exact(2),
            "mod(value, y) -- returns the floor of the remainder of value / y.",
            native_mod,
        ),
        FunctionDescriptor::builtin(
            "fractional_part",
            Category::Arithmetic,
            ArgCount::Exact(1),
            "fractional_part(value) -- returns the part of the value after the decimal point. \
             For example, fractional_part(3.14) returns 0.14.",
            native_fractional_part,
        ),
    ]
}

/// An integral result. Values past the `i64` range stay floats; infinities
/// and NaN are errors.
fn to_int(function: &str, x: f64) -> Result<Value> {
    if !x.is_finite() {
        return Err(Error::type_coercion(function, x.to_string(), "a finite number"));
    }
    Ok(exact_integer(x).map_or(Value::Float(x), Value::Int))
}

/// Arithmetic: add
fn native_add(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let mut sum = 0.0;
    for arg in args {
        sum += number("add", arg)?;
    }
    Ok(Value::Float(sum))
}

/// Arithmetic: subtract
fn native_subtract(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x, y] = fixed::<2>("subtract", args)?;
    Ok(Value::Float(number("subtract", x)? - number("subtract", y)?))
}

/// Arithmetic: multiply
fn native_multiply(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let mut product = 1.0;
    for arg in args {
        product *= number("multiply", arg)?;
    }
    Ok(Value::Float(product))
}

/// Arithmetic: divide
fn native_divide(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x, y] = fixed::<2>("divide", args)?;
    let divisor = number("divide", y)?;
    if divisor == 0.0 {
        return Err(Error::new(ErrorKind::DivisionByZero).in_frame("divide"));
    }
    Ok(Value::Float(number("divide", x)? / divisor))
}

/// Arithmetic: ceiling
fn native_ceiling(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x] = fixed::<1>("ceiling", args)?;
    to_int("ceiling", number("ceiling", x)?.ceil())
}

/// Arithmetic: floor
fn native_floor(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x] = fixed::<1>("floor", args)?;
    to_int("floor", number("floor", x)?.floor())
}

/// Arithmetic: round
fn native_round(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x] = fixed::<1>("round", args)?;
    to_int("round", number("round", x)?.round_ties_even())
}

/// Arithmetic: mod
fn native_mod(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x, y] = fixed::<2>("mod", args)?;
    let x = number("mod", x)?;
    let y = number("mod", y)?;
    if y == 0.0 {
        return Err(Error::new(ErrorKind::DivisionByZero).in_frame("mod"));
    }
    // The remainder takes the divisor's sign.
    let mut r = x % y;
    if r != 0.0 && (r < 0.0) != (y < 0.0) {
        r += y;
    }
    to_int("mod", r)
}

/// Arithmetic: fractional_part
fn native_fractional_part(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [x] = fixed::<1>("fractional_part", args)?;
    Ok(Value::Float(number("fractional_part", x)?.fract()))
}
