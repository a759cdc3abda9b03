//! Formatting values: numbers, sizes, durations and ratings.

use marginalia_foundation::{Error, FieldValue, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{duration, number, text};

const STAR: char = '\u{2605}';
const HALF_STAR: char = '\u{2BE8}';

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{FormattingValues, StringManipulation};

    vec![
        FunctionDescriptor::builtin(
            "human_readable",
            FormattingValues,
            Exact(1),
            "human_readable(value) -- expects the value to be a number and returns a \
             string representing that number in KB, MB, GB, etc.",
            native_human_readable,
        ),
        FunctionDescriptor::builtin(
            "format_number",
            FormattingValues,
            Exact(2),
            "format_number(value, template) -- formats the number using a template such as \
             {0:5.2f}, {0:,d} or ${0:5,.2f}. A template holding only a format spec may \
             leave off the {0: and }. Returns the empty string if formatting fails.",
            native_format_number,
        ),
        FunctionDescriptor::builtin(
            "format_duration",
            FormattingValues,
            Variadic,
            "format_duration(value, template [, largest_unit]) -- formats value, a number \
             of seconds, using a template of [w], [d], [h], [m] and [s] selectors. A \
             selector can carry its own suffixes, as in [d: day| days]. Uppercase \
             selectors show zero amounts. largest_unit caps the largest unit produced.",
            native_format_duration,
        ),
        FunctionDescriptor::builtin(
            "finish_formatting",
            FormattingValues,
            Exact(4),
            "finish_formatting(value, format, prefix, suffix) -- applies the format, prefix \
             and suffix to the value the way {series_index:05.2f| - |- } does.",
            native_finish_formatting,
        ),
        FunctionDescriptor::builtin(
            "rating_to_stars",
            FormattingValues,
            Exact(2),
            "rating_to_stars(value, use_half_stars) -- returns the value, a number between \
             0 and 5, as a string of star characters. Set use_half_stars to 1 to show half \
             stars for fractional values.",
            native_rating_to_stars,
        ),
        FunctionDescriptor::builtin(
            "check_yes_no",
            StringManipulation,
            Exact(4),
            "check_yes_no(field_name, is_undefined, is_false, is_true) -- returns 'Yes' if \
             the yes/no field named field_name is in one of the states whose parameter is \
             1, otherwise the empty string.",
            native_check_yes_no,
        ),
    ]
}

/// Formatting: human_readable
fn native_human_readable(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("human_readable", args)?;
    Ok(value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|x| text::exact_integer(x.round_ties_even()))
        .map_or_else(Value::empty, |x| Value::Text(text::human_readable(x))))
}

/// Formatting: format_number
fn native_format_number(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, template] = fixed::<2>("format_number", args)?;
    Ok(Value::Text(number::format_number(value, template)))
}

/// Formatting: format_duration
fn native_format_duration(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "format_duration";
    let (value, template, largest) = match args {
        [value, template] => (value, template, ""),
        [value, template, largest] => (value, template, largest.as_str()),
        _ => return Err(Error::arity(NAME, "requires 2 or 3 arguments")),
    };
    let seconds = if value.is_empty() {
        0
    } else {
        let x = text::number(NAME, value)?;
        text::exact_integer(x.round_ties_even())
            .ok_or_else(|| Error::type_coercion(NAME, value.as_str(), "a number of seconds"))?
    };
    Ok(Value::Text(duration::format_duration(seconds, template, largest)?))
}

/// Formatting: finish_formatting
fn native_finish_formatting(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, format, prefix, suffix] = fixed::<4>("finish_formatting", args)?;
    if value.is_empty() {
        return Ok(Value::empty());
    }
    let formatted = ctx.formatter.format_value(value, format)?;
    Ok(Value::Text(format!("{prefix}{formatted}{suffix}")))
}

/// Formatting: rating_to_stars
fn native_rating_to_stars(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "rating_to_stars";
    let [value, half_stars] = fixed::<2>(NAME, args)?;
    if value.is_empty() {
        return Ok(Value::empty());
    }
    let out_of_range = || Error::invalid_argument(NAME, "The rating must be a number between 0 and 5");
    let doubled = value.trim().parse::<f64>().map_err(|_| out_of_range())? * 2.0;
    if !(0.0..=10.0).contains(&doubled) {
        return Err(out_of_range());
    }
    #[allow(clippy::cast_possible_truncation)]
    let stars = doubled.trunc() as usize;
    let mut out: String = std::iter::repeat_n(STAR, stars / 2).collect();
    if half_stars == "1" && stars % 2 == 1 {
        out.push(HALF_STAR);
    }
    Ok(Value::Text(out))
}

/// Formatting: check_yes_no
fn native_check_yes_no(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "check_yes_no";
    let [field, if_undefined, if_false, if_true] = fixed::<4>(NAME, args)?;
    let metadata = ctx.metadata(NAME)?;
    let state = match metadata.get(&field.trim().to_lowercase()) {
        None => None,
        Some(FieldValue::Bool(b)) => Some(b),
        Some(_) => {
            return Err(Error::invalid_argument(
                NAME,
                "the field must be a Yes/No custom column",
            ));
        }
    };
    let wanted = match state {
        None => if_undefined,
        Some(false) => if_false,
        Some(true) => if_true,
    };
    Ok(if wanted == "1" {
        Value::from("Yes")
    } else {
        Value::empty()
    })
}
