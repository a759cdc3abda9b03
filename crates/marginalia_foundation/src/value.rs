//! Function return values and their canonical string form.
//!
//! Every value flowing through the template language is ultimately a string.
//! Functions may return richer values; [`Value::into_text`] coerces them the
//! same way everywhere.

use std::fmt;

/// Value returned by a template function before string coercion.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A string, returned unchanged.
    Text(String),
    /// A list, joined with `,`.
    List(Vec<String>),
    /// An integer.
    Int(i64),
    /// A float. Integral floats render with a trailing `.0`.
    Float(f64),
    /// A boolean, rendered as `true` or `false`.
    Bool(bool),
}

impl Value {
    /// The empty string.
    #[must_use]
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// The canonical "true" result of template predicates.
    #[must_use]
    pub fn truthy() -> Self {
        Self::Text("1".to_string())
    }

    /// Returns `"1"` when `flag` is set, otherwise the empty string.
    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag { Self::truthy() } else { Self::empty() }
    }

    /// Converts this value into the canonical string representation.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::List(items) => items.join(","),
            other => other.to_string(),
        }
    }

    /// Returns the string slice if this value is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders a float the way the template language always has: integral values
/// keep a trailing `.0`, very large or small magnitudes use exponent notation.
#[must_use]
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format_exponent(f);
    }
    if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn format_exponent(f: f64) -> String {
    // Rust renders 1e16 as "1e16"; the language expects "1e+16".
    let s = format!("{f:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join(",")),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{}", format_float(*x)),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

// Convenience From implementations

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_keep_point_zero() {
        assert_eq!(Value::Float(3.0).into_text(), "3.0");
        assert_eq!(Value::Float(-2.0).into_text(), "-2.0");
        assert_eq!(Value::Float(0.0).into_text(), "0.0");
    }

    #[test]
    fn fractional_floats_are_shortest() {
        assert_eq!(Value::Float(2.5).into_text(), "2.5");
        assert_eq!(Value::Float(0.1 + 0.2).into_text(), "0.30000000000000004");
    }

    #[test]
    fn large_floats_use_exponent() {
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
    }

    #[test]
    fn lists_join_with_comma() {
        let v = Value::List(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(v.into_text(), "a,b,c");
    }

    #[test]
    fn bools_and_flags() {
        assert_eq!(Value::Bool(true).into_text(), "true");
        assert_eq!(Value::from_flag(true).into_text(), "1");
        assert_eq!(Value::from_flag(false).into_text(), "");
    }
}
