//! Format specs of the `[[fill]align][sign][#][0][width][,][.precision][type]`
//! family, as used by `{field:spec}` references, `format_number` and
//! `finish_formatting`.

use marginalia_foundation::{Error, Result, format_float};

use crate::support::text;

// =============================================================================
// FormatSpec
// =============================================================================

/// Where padding goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    /// `<`
    Left,
    /// `>`
    Right,
    /// `^`
    Center,
    /// `=`: between the sign and the digits.
    AfterSign,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Left),
            '>' => Some(Self::Right),
            '^' => Some(Self::Center),
            '=' => Some(Self::AfterSign),
            _ => None,
        }
    }
}

/// How the sign of a number is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sign {
    /// Only negative numbers carry a sign.
    #[default]
    Negative,
    /// Always show the sign.
    Always,
    /// A space in place of `+`.
    Space,
}

/// A parsed format spec.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatSpec {
    /// Fill character, when given explicitly.
    pub fill: Option<char>,
    /// Alignment, when given explicitly.
    pub align: Option<Align>,
    /// Sign handling.
    pub sign: Sign,
    /// The `#` flag.
    pub alternate: bool,
    /// The `0` flag.
    pub zero_pad: bool,
    /// Minimum width.
    pub width: usize,
    /// Thousands separator.
    pub grouping: Option<char>,
    /// Digits after the point, or maximum length for text.
    pub precision: Option<usize>,
    /// Presentation type.
    pub kind: Option<char>,
}

const KINDS: &str = "bcdeEfFgGnosxX%";

impl FormatSpec {
    /// Parses a spec.
    ///
    /// # Errors
    /// Returns an error for malformed specs.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || Error::invalid_argument("format", format!("invalid format spec '{spec}'"));
        let chars: Vec<char> = spec.chars().collect();
        let mut out = Self::default();
        let mut i = 0;

        if let Some(align) = chars.get(1).copied().and_then(Align::from_char) {
            out.fill = Some(chars[0]);
            out.align = Some(align);
            i = 2;
        } else if let Some(align) = chars.first().copied().and_then(Align::from_char) {
            out.align = Some(align);
            i = 1;
        }
        match chars.get(i) {
            Some('+') => {
                out.sign = Sign::Always;
                i += 1;
            }
            Some(' ') => {
                out.sign = Sign::Space;
                i += 1;
            }
            Some('-') => i += 1,
            _ => {}
        }
        if chars.get(i) == Some(&'#') {
            out.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            out.zero_pad = true;
            i += 1;
        }
        let (width, used) = digits(&chars[i..]);
        out.width = width.unwrap_or(0);
        i += used;
        if let Some(&c @ (',' | '_')) = chars.get(i) {
            out.grouping = Some(c);
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            let (precision, used) = digits(&chars[i + 1..]);
            out.precision = Some(precision.ok_or_else(invalid)?);
            i += 1 + used;
        }
        match &chars[i..] {
            [] => {}
            [c] if KINDS.contains(*c) => out.kind = Some(*c),
            _ => return Err(invalid()),
        }
        Ok(out)
    }
}

fn digits(chars: &[char]) -> (Option<usize>, usize) {
    let used = chars.iter().take_while(|c| c.is_ascii_digit()).count();
    let text: String = chars[..used].iter().collect();
    (text.parse().ok(), used)
}

// =============================================================================
// Formatting
// =============================================================================

/// A value to format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Arg<'a> {
    /// Text.
    Text(&'a str),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
}

/// Formats one value with a spec.
///
/// # Errors
/// Returns an error when the spec does not apply to the value's type.
pub fn format_arg(arg: Arg<'_>, spec: &FormatSpec) -> Result<String> {
    match arg {
        Arg::Text(s) => format_text(s, spec),
        Arg::Int(n) => format_int(n, spec),
        Arg::Float(x) => format_real(x, spec),
    }
}

fn unknown_code(kind: char, type_name: &str) -> Error {
    Error::invalid_argument(
        "format",
        format!("unknown format code '{kind}' for a value of type {type_name}"),
    )
}

fn format_text(value: &str, spec: &FormatSpec) -> Result<String> {
    match spec.kind {
        None | Some('s') => {}
        Some(kind) => return Err(unknown_code(kind, "text")),
    }
    if spec.sign != Sign::Negative || spec.alternate || spec.grouping.is_some() {
        return Err(Error::invalid_argument(
            "format",
            "sign, '#' and grouping are not allowed for text",
        ));
    }
    let align = spec.align.unwrap_or(Align::Left);
    if align == Align::AfterSign {
        return Err(Error::invalid_argument(
            "format",
            "'=' alignment is not allowed for text",
        ));
    }
    let text: String = match spec.precision {
        Some(p) => value.chars().take(p).collect(),
        None => value.to_string(),
    };
    let fill = spec.fill.unwrap_or(if spec.zero_pad { '0' } else { ' ' });
    let padding = spec.width.saturating_sub(text.chars().count());
    Ok(pad(&text, fill, align, padding))
}

fn format_int(value: i64, spec: &FormatSpec) -> Result<String> {
    let (radix, prefix) = match spec.kind {
        None | Some('d' | 'n') => (10, ""),
        Some('b') => (2, "0b"),
        Some('o') => (8, "0o"),
        Some('x') => (16, "0x"),
        Some('X') => (16, "0X"),
        Some('c') => {
            let c = u32::try_from(value)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| Error::invalid_argument("format", "character code out of range"))?;
            let mut text_spec = spec.clone();
            text_spec.kind = None;
            return format_text(&c.to_string(), &text_spec);
        }
        Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => {
            #[allow(clippy::cast_precision_loss)]
            let real = value as f64;
            return format_real(real, spec);
        }
        Some(kind) => return Err(unknown_code(kind, "integer")),
    };
    if spec.precision.is_some() {
        return Err(Error::invalid_argument(
            "format",
            "precision is not allowed for integers",
        ));
    }
    let magnitude = value.unsigned_abs();
    let mut body = match radix {
        2 => format!("{magnitude:b}"),
        8 => format!("{magnitude:o}"),
        16 if spec.kind == Some('X') => format!("{magnitude:X}"),
        16 => format!("{magnitude:x}"),
        _ => magnitude.to_string(),
    };
    if let Some(sep) = spec.grouping {
        body = group(&body, sep, if radix == 10 { 3 } else { 4 });
    }
    let prefix = if spec.alternate { prefix } else { "" };
    Ok(pad_number(value < 0, prefix, &body, spec))
}

fn format_real(value: f64, spec: &FormatSpec) -> Result<String> {
    let upper = matches!(spec.kind, Some('E' | 'F' | 'G'));
    let magnitude = value.abs();
    let mut body = if value.is_finite() {
        match spec.kind {
            Some('f' | 'F') => {
                let p = spec.precision.unwrap_or(6);
                let mut s = format!("{magnitude:.p$}");
                if spec.alternate && p == 0 {
                    s.push('.');
                }
                s
            }
            Some('e' | 'E') => {
                scientific(magnitude, spec.precision.unwrap_or(6), spec.alternate, upper)
            }
            Some('g' | 'G' | 'n') => {
                general(magnitude, spec.precision.unwrap_or(6), spec.alternate, upper, false)
            }
            Some('%') => {
                let p = spec.precision.unwrap_or(6);
                format!("{:.p$}%", magnitude * 100.0)
            }
            None => match spec.precision {
                Some(p) => general(magnitude, p, spec.alternate, false, true),
                None => format_float(magnitude),
            },
            Some(kind) => return Err(unknown_code(kind, "float")),
        }
    } else {
        if let Some(kind @ ('b' | 'c' | 'd' | 'o' | 'x' | 'X' | 's')) = spec.kind {
            return Err(unknown_code(kind, "float"));
        }
        let word = if value.is_nan() { "nan" } else { "inf" };
        let mut s = if upper {
            word.to_uppercase()
        } else {
            word.to_string()
        };
        if spec.kind == Some('%') {
            s.push('%');
        }
        s
    };
    if let Some(sep) = spec.grouping {
        if body.starts_with(|c: char| c.is_ascii_digit()) {
            let end = body
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(body.len());
            body = format!("{}{}", group(&body[..end], sep, 3), &body[end..]);
        }
    }
    Ok(pad_number(value.is_sign_negative() && !value.is_nan(), "", &body, spec))
}

/// Exponent notation with at least two exponent digits.
fn scientific(magnitude: f64, precision: usize, alternate: bool, upper: bool) -> String {
    let raw = format!("{magnitude:.precision$e}");
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut mantissa = mantissa.to_string();
    if alternate && precision == 0 {
        mantissa.push('.');
    }
    let e = if upper { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{sign}{:02}", exponent.abs())
}

fn decimal_exponent(magnitude: f64, precision: usize) -> i32 {
    if magnitude == 0.0 {
        return 0;
    }
    let digits = precision.saturating_sub(1);
    let raw = format!("{magnitude:.digits$e}");
    raw.split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0)
}

/// The `g` presentation. With `repr_style`, fixed notation keeps at least one
/// fractional digit and exponent notation starts one digit earlier.
fn general(magnitude: f64, precision: usize, alternate: bool, upper: bool, repr_style: bool) -> String {
    let precision = precision.max(1);
    let exponent = decimal_exponent(magnitude, precision);
    let limit = i32::try_from(precision).unwrap_or(i32::MAX) - i32::from(repr_style);
    if (-4..limit).contains(&exponent) {
        let decimals = usize::try_from(i32::try_from(precision).unwrap_or(i32::MAX) - 1 - exponent)
            .unwrap_or(0);
        let mut s = format!("{magnitude:.decimals$}");
        if !alternate {
            strip_fraction_zeros(&mut s);
        }
        if repr_style && !s.contains('.') {
            s.push_str(".0");
        }
        s
    } else {
        let s = scientific(magnitude, precision - 1, alternate, upper);
        if alternate {
            return s;
        }
        match s.find(['e', 'E']) {
            Some(at) => {
                let mut mantissa = s[..at].to_string();
                strip_fraction_zeros(&mut mantissa);
                format!("{mantissa}{}", &s[at..])
            }
            None => s,
        }
    }
}

fn strip_fraction_zeros(s: &mut String) {
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
}

fn group(digits: &str, separator: char, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / size);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % size == 0 {
            out.push(separator);
        }
        out.push(*c);
    }
    out
}

fn pad_number(negative: bool, prefix: &str, body: &str, spec: &FormatSpec) -> String {
    let sign = match (negative, spec.sign) {
        (true, _) => "-",
        (false, Sign::Always) => "+",
        (false, Sign::Space) => " ",
        (false, Sign::Negative) => "",
    };
    let fill = spec.fill.unwrap_or(if spec.zero_pad { '0' } else { ' ' });
    let align = spec.align.unwrap_or(if spec.zero_pad {
        Align::AfterSign
    } else {
        Align::Right
    });
    let len = sign.len() + prefix.len() + body.chars().count();
    let padding = spec.width.saturating_sub(len);
    if align == Align::AfterSign {
        let fill: String = std::iter::repeat_n(fill, padding).collect();
        return format!("{sign}{prefix}{fill}{body}");
    }
    pad(&format!("{sign}{prefix}{body}"), fill, align, padding)
}

fn pad(text: &str, fill: char, align: Align, padding: usize) -> String {
    let (left, right) = match align {
        Align::Left => (0, padding),
        Align::Center => (padding / 2, padding - padding / 2),
        Align::Right | Align::AfterSign => (padding, 0),
    };
    let mut out = String::with_capacity(text.len() + padding);
    out.extend(std::iter::repeat_n(fill, left));
    out.push_str(text);
    out.extend(std::iter::repeat_n(fill, right));
    out
}

// =============================================================================
// Entry Points
// =============================================================================

/// Applies `spec` to a field value, converting the value to the type the
/// spec's presentation type asks for.
///
/// Empty values and empty specs pass through unchanged.
///
/// # Errors
/// Returns an error when the value cannot be converted or the spec is invalid.
pub fn format_value(value: &str, spec: &str) -> Result<String> {
    if spec.is_empty() || value.is_empty() {
        return Ok(value.to_string());
    }
    let parsed = FormatSpec::parse(spec)?;
    match parsed.kind {
        Some(kind @ ('b' | 'c' | 'd' | 'o' | 'x' | 'X' | 'n')) => {
            let n: i64 = value.trim().parse().map_err(|_| {
                Error::invalid_argument(
                    "format",
                    format!("type {kind} requires an integer value, got {value}"),
                )
            })?;
            format_arg(Arg::Int(n), &parsed)
        }
        Some(kind @ ('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%')) => {
            let x: f64 = value.trim().parse().map_err(|_| {
                Error::invalid_argument(
                    "format",
                    format!("type {kind} requires a decimal (float) value, got {value}"),
                )
            })?;
            format_arg(Arg::Float(x), &parsed)
        }
        _ => format_arg(Arg::Text(value), &parsed),
    }
}

/// Substitutes `arg` into every `{}`/`{0}`/`{0:spec}` field of `template`.
/// `{{` and `}}` stand for literal braces.
///
/// # Errors
/// Returns an error for malformed templates or specs that do not suit `arg`.
pub fn format_template(template: &str, arg: Arg<'_>) -> Result<String> {
    const FUNCTION: &str = "format_number";
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(Error::invalid_argument(FUNCTION, "single '}' in format string"));
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    return Err(Error::invalid_argument(FUNCTION, "unclosed '{' in format string"));
                }
                let (name, spec) = field.split_once(':').unwrap_or((field.as_str(), ""));
                if !name.is_empty() && name != "0" {
                    return Err(Error::invalid_argument(
                        FUNCTION,
                        format!("only one value is available, not '{name}'"),
                    ));
                }
                out.push_str(&format_arg(arg, &FormatSpec::parse(spec)?)?);
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Formats a number with a template such as `{0:,d}` or just `5.2f`.
///
/// The value is tried as a float first and, when integral, as an integer.
/// Anything that cannot be formatted gives the empty string.
#[must_use]
pub fn format_number(value: &str, template: &str) -> String {
    if value.is_empty() || value == "None" {
        return String::new();
    }
    let template = if template.contains('{') {
        template.to_string()
    } else {
        format!("{{0:{template}}}")
    };
    let Ok(x) = value.trim().parse::<f64>() else {
        return String::new();
    };
    if let Ok(s) = format_template(&template, Arg::Float(x)) {
        return s;
    }
    text::exact_integer(x)
        .and_then(|n| format_template(&template, Arg::Int(n)).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: &str, spec: &str) -> String {
        format_value(value, spec).unwrap()
    }

    #[test]
    fn parses_every_part() {
        let spec = FormatSpec::parse("*^+#010,.3f").unwrap();
        assert_eq!(spec.fill, Some('*'));
        assert_eq!(spec.align, Some(Align::Center));
        assert_eq!(spec.sign, Sign::Always);
        assert!(spec.alternate);
        assert!(spec.zero_pad);
        assert_eq!(spec.width, 10);
        assert_eq!(spec.grouping, Some(','));
        assert_eq!(spec.precision, Some(3));
        assert_eq!(spec.kind, Some('f'));
        assert!(FormatSpec::parse("5q").is_err());
        assert!(FormatSpec::parse(".f").is_err());
    }

    #[test]
    fn text_padding() {
        assert_eq!(fmt("ab", ">5"), "   ab");
        assert_eq!(fmt("ab", "5"), "ab   ");
        assert_eq!(fmt("ab", "*^6"), "**ab**");
        assert_eq!(fmt("abcdef", ".3"), "abc");
    }

    #[test]
    fn integers() {
        assert_eq!(fmt("42", "05d"), "00042");
        assert_eq!(fmt("-42", "05d"), "-0042");
        assert_eq!(fmt("1234567", ",d"), "1,234,567");
        assert_eq!(fmt("255", "#x"), "0xff");
        assert_eq!(fmt("255", "X"), "FF");
        assert_eq!(fmt("5", "b"), "101");
        assert_eq!(fmt("7", "+d"), "+7");
        assert!(format_value("3.5", "d").is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(fmt("3.14159", ".2f"), "3.14");
        assert_eq!(fmt("3", "06.2f"), "003.00");
        assert_eq!(fmt("1234.5", ",.1f"), "1,234.5");
        assert_eq!(fmt("0.25", ".0%"), "25%");
        assert_eq!(fmt("12345.678", ".3e"), "1.235e+04");
        assert_eq!(fmt("0.0001234", "g"), "0.0001234");
        assert_eq!(fmt("1234567", "g"), "1.23457e+06");
        assert_eq!(fmt("100", "g"), "100");
        assert!(format_value("abc", "f").is_err());
    }

    #[test]
    fn untyped_float_precision() {
        let spec = FormatSpec::parse(".3").unwrap();
        assert_eq!(format_arg(Arg::Float(1.0), &spec).unwrap(), "1.0");
        assert_eq!(format_arg(Arg::Float(12.0), &spec).unwrap(), "12.0");
        assert_eq!(format_arg(Arg::Float(1234.5), &spec).unwrap(), "1.23e+03");
    }

    #[test]
    fn empty_inputs_pass_through() {
        assert_eq!(fmt("", "05d"), "");
        assert_eq!(fmt("abc", ""), "abc");
    }

    #[test]
    fn number_templates() {
        assert_eq!(format_number("1234", "{0:,d}"), "1,234");
        assert_eq!(format_number("1234.5", ",.2f"), "1,234.50");
        assert_eq!(format_number("3", "{0:5.1f} pages"), "  3.0 pages");
        assert_eq!(format_number("3.5", "d"), "");
        assert_eq!(format_number("abc", "d"), "");
        assert_eq!(format_number("None", "d"), "");
        assert_eq!(format_number("9.3e18", "d"), "");
        assert_eq!(format_number("inf", "d"), "");
        assert_eq!(format_number("7", "{{{}}}"), "{7.0}");
    }
}
