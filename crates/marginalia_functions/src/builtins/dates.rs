//! Date functions.

use chrono::{DateTime, FixedOffset};
use marginalia_foundation::{Datatype, Error, FieldValue, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::dates;

const BAD_DATE: &str = "BAD DATE";

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{DateFunctions, FormattingValues};

    vec![
        FunctionDescriptor::builtin(
            "today",
            DateFunctions,
            Exact(0),
            "today() -- returns a date+time string for now, in ISO format.",
            native_today,
        ),
        FunctionDescriptor::builtin(
            "days_between",
            DateFunctions,
            Exact(2),
            "days_between(date1, date2) -- returns the number of days between date1 and \
             date2, positive if date1 is later. Returns the empty string if either value \
             is not a date.",
            native_days_between,
        ),
        FunctionDescriptor::builtin(
            "date_arithmetic",
            DateFunctions,
            Variadic,
            "date_arithmetic(value, calc_spec [, fmt]) -- calculates a new date from value \
             using calc_spec, a string of vW pairs where v is a possibly negative number \
             and W is one of s, m, h, d, w or y (365 days). For example 1s3d-1m adds one \
             second and three days and subtracts one minute. The result is formatted with \
             fmt, or in ISO format without it.",
            native_date_arithmetic,
        ),
        FunctionDescriptor::builtin(
            "format_date",
            FormattingValues,
            Exact(2),
            "format_date(value, format_string) -- formats the date value using \
             format_string. to_number returns the date as seconds since the epoch; \
             from_number[:fmt] formats such a number. Returns BAD DATE when the value \
             cannot be read.",
            native_format_date,
        ),
        FunctionDescriptor::builtin(
            "format_date_field",
            FormattingValues,
            Exact(2),
            "format_date_field(field_name, format_string) -- formats the value of the date \
             field field_name using format_string. Works on the stored date, so it is \
             faster and more reliable than format_date.",
            native_format_date_field,
        ),
    ]
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "None"
}

/// Applies a format string to a date, including the `to_number` and
/// `from_number` forms.
fn format_with(date: &DateTime<FixedOffset>, format: &str) -> Value {
    if format == "to_number" {
        Value::Float(dates::timestamp(date))
    } else {
        Value::Text(dates::format_date(date, format))
    }
}

/// The format following `from_number:`, defaulting to ISO.
fn from_number_format(format: &str) -> &str {
    match format.get(12..) {
        Some(f) if !f.is_empty() => f,
        _ => "iso",
    }
}

/// Formats a `from_number[:fmt]` request, or `None` if the number is bad.
fn from_number(value: &str, format: &str) -> Option<String> {
    let seconds: f64 = value.trim().parse().ok()?;
    let date = dates::from_timestamp(seconds)?;
    Some(dates::format_date(&date, from_number_format(format)))
}

/// Date: today
fn native_today(_: &mut CallContext<'_>, _: &[String]) -> Result<Value> {
    Ok(Value::Text(dates::format_date(&dates::now(), "iso")))
}

/// Date: days_between
fn native_days_between(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [first, second] = fixed::<2>("days_between", args)?;
    let parse = |v: &str| dates::parse_date(v).filter(|d| !dates::is_undefined(d));
    let (Some(first), Some(second)) = (parse(first), parse(second)) else {
        return Ok(Value::empty());
    };
    Ok(Value::Text(format!(
        "{:.1}",
        dates::days_between(&first, &second)
    )))
}

/// Date: date_arithmetic
fn native_date_arithmetic(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "date_arithmetic";
    let (value, spec, format) = match args {
        [value, spec] => (value, spec, "iso"),
        [value, spec, format] => (value, spec, format.as_str()),
        _ => return Err(Error::arity(NAME, "requires 2 or 3 arguments")),
    };
    if is_blank(value.trim()) {
        return Ok(Value::empty());
    }
    let date = dates::parse_date(value).ok_or_else(|| {
        Error::invalid_argument(NAME, format!("error: '{value}' is not a date"))
    })?;
    if dates::is_undefined(&date) {
        return Ok(Value::empty());
    }
    let date = dates::apply_calculation(date, spec)?;
    let format = if format.is_empty() { "iso" } else { format };
    Ok(Value::Text(dates::format_date(&date, format)))
}

/// Formatting: format_date
fn native_format_date(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, format] = fixed::<2>("format_date", args)?;
    if is_blank(value) {
        return Ok(Value::empty());
    }
    if format.starts_with("from_number") {
        return Ok(Value::Text(
            from_number(value, format).unwrap_or_else(|| BAD_DATE.to_string()),
        ));
    }
    Ok(dates::parse_date(value)
        .map_or_else(|| Value::from(BAD_DATE), |date| format_with(&date, format)))
}

/// Formatting: format_date_field
fn native_format_date_field(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "format_date_field";
    let [field, format] = fixed::<2>(NAME, args)?;
    let metadata = ctx.metadata(NAME)?;
    let key = field.trim().to_lowercase();
    if !metadata.all_field_keys().contains(&key) {
        return Err(Error::invalid_argument(NAME, format!("Unknown field '{key}'")));
    }
    let is_date = metadata
        .field_info(&key)
        .is_some_and(|info| info.datatype == Datatype::Datetime);
    if !is_date {
        return Err(Error::invalid_argument(NAME, format!("field '{key}' is not a date")));
    }
    match metadata.get(&key) {
        None => Ok(Value::empty()),
        Some(FieldValue::Date(date)) if format.starts_with("from_number") => Ok(Value::Text(
            dates::format_date(&date, from_number_format(format)),
        )),
        Some(FieldValue::Date(date)) => Ok(format_with(&date, format)),
        Some(_) => Err(Error::invalid_argument(
            NAME,
            format!("field '{key}' does not hold a date"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use marginalia_foundation::{FieldValue, MemoryMetadata};

    use crate::support::dates::parse_date;
    use crate::testing::{run, run_with};

    #[test]
    fn today_is_iso() {
        let today = run("today", &[]).unwrap();
        assert!(parse_date(&today).is_some());
        assert!(today.contains('T'));
    }

    #[test]
    fn days_between_is_signed_with_one_decimal() {
        assert_eq!(run("days_between", &["2024-01-11", "2024-01-01"]).unwrap(), "10.0");
        assert_eq!(run("days_between", &["2024-01-01", "2024-01-11"]).unwrap(), "-10.0");
        assert_eq!(run("days_between", &["soon", "2024-01-01"]).unwrap(), "");
    }

    #[test]
    fn date_arithmetic_applies_each_step() {
        assert_eq!(
            run("date_arithmetic", &["2024-01-01", "1s3d-1m"]).unwrap(),
            "2024-01-03T23:59:01+00:00"
        );
        assert_eq!(
            run("date_arithmetic", &["2024-01-01", "-1d", "yyyy-MM-dd"]).unwrap(),
            "2023-12-31"
        );
        assert_eq!(run("date_arithmetic", &["", "1d"]).unwrap(), "");
        let err = run("date_arithmetic", &["2024-01-01", "3q"]).unwrap_err();
        assert!(err.to_string().contains("invalid calculation specifier '3q'"));
    }

    #[test]
    fn format_date_forms() {
        assert_eq!(run("format_date", &["2024-03-05", "dd MMM yyyy"]).unwrap(), "05 Mar 2024");
        assert_eq!(run("format_date", &["2024-01-01", "to_number"]).unwrap(), "1704067200.0");
        assert_eq!(
            run("format_date", &["1704067200", "from_number:yyyy"]).unwrap(),
            "2024"
        );
        assert_eq!(
            run("format_date", &["1704067200", "from_number"]).unwrap(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(run("format_date", &["tomorrowish", "yyyy"]).unwrap(), "BAD DATE");
        assert_eq!(run("format_date", &["None", "yyyy"]).unwrap(), "");
    }

    #[test]
    fn format_date_field_reads_stored_dates() {
        let pubdate = parse_date("1937-09-21").unwrap();
        let mi = MemoryMetadata::new()
            .with_field("pubdate", FieldValue::Date(pubdate))
            .with_field("title", "The Hobbit");
        assert_eq!(run_with(&mi, "format_date_field", &["pubdate", "yyyy"]).unwrap(), "1937");
        assert_eq!(run_with(&mi, "format_date_field", &["timestamp", "yyyy"]).unwrap(), "");
        assert!(run_with(&mi, "format_date_field", &["title", "yyyy"]).is_err());
        assert!(run_with(&mi, "format_date_field", &["#nope", "yyyy"]).is_err());
    }
}
