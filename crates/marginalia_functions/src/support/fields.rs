//! Display values of metadata fields, as `{field}` renders them.

use marginalia_foundation::{
    Datatype, Error, ErrorKind, FieldInfo, FieldValue, Metadata, Result, format_float,
};

use super::dates;

/// A field's display value.
///
/// Field names are case-insensitive. Declared fields without a value render
/// as the empty string; undeclared fields are an error.
///
/// # Errors
/// Returns [`ErrorKind::UnknownField`] for undeclared fields.
pub fn display_value(metadata: &dyn Metadata, field: &str) -> Result<String> {
    let key = field.trim().to_lowercase();
    if key.is_empty() || key == "none" {
        return Ok(String::new());
    }
    match metadata.get(&key) {
        Some(value) => Ok(render(&value, metadata.field_info(&key).as_ref())),
        None if metadata.all_field_keys().iter().any(|k| *k == key) => Ok(String::new()),
        None => Err(Error::new(ErrorKind::UnknownField(field.to_string()))),
    }
}

/// Renders a raw value for display.
#[must_use]
pub fn render(value: &FieldValue, info: Option<&FieldInfo>) -> String {
    let datatype = info.map(|i| i.datatype);
    let custom = info.is_some_and(|i| i.is_custom);
    match value {
        FieldValue::Int(0) if custom && datatype == Some(Datatype::Int) => String::new(),
        FieldValue::Float(x) if custom && datatype == Some(Datatype::Float) && *x == 0.0 => {
            String::new()
        }
        #[allow(clippy::cast_precision_loss)]
        FieldValue::Int(n) if datatype == Some(Datatype::Rating) => stars_value(*n as f64),
        FieldValue::Float(x) if datatype == Some(Datatype::Rating) => stars_value(*x),
        FieldValue::Bool(true) => "Yes".to_string(),
        FieldValue::Bool(false) => "No".to_string(),
        FieldValue::Date(d) => dates::format_date(d, dates::DEFAULT_FORMAT),
        FieldValue::List(items) => {
            let separator = info.map_or_else(|| ", ".to_string(), FieldInfo::display_separator);
            items.join(&separator)
        }
        FieldValue::Map(_) => value.render(","),
        other => other.render(", "),
    }
}

/// Ratings are stored doubled; `7` displays as `3.5`.
fn stars_value(stored: f64) -> String {
    let half = stored / 2.0;
    if half.fract() == 0.0 {
        format!("{half:.0}")
    } else {
        format_float(half)
    }
}
