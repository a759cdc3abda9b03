//! String helpers shared by the builtins.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use marginalia_foundation::{Error, Result};

// =============================================================================
// Numbers from strings
// =============================================================================

/// Parses a numeric argument. The empty string and `None` are zero.
///
/// # Errors
/// Returns a type coercion error naming `function`.
pub fn number(function: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "None" {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::type_coercion(function, value, "a number"))
}

/// The integer an integral float holds, if it fits in an `i64`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn exact_integer(x: f64) -> Option<i64> {
    // 2^63 is exactly representable; every float below it in magnitude fits.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (x.is_finite() && x.fract() == 0.0 && (-LIMIT..LIMIT).contains(&x)).then(|| x as i64)
}

/// Parses an integer argument.
///
/// # Errors
/// Returns a type coercion error naming `function`.
pub fn integer(function: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::type_coercion(function, value, "an integer"))
}

/// Parses an integer argument with the empty/`None`-is-zero rule.
///
/// # Errors
/// Returns a type coercion error naming `function`.
pub fn integer_or_zero(function: &str, value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "None" {
        return Ok(0);
    }
    integer(function, trimmed)
}

// =============================================================================
// Slicing
// =============================================================================

/// Resolves slice bounds the way sequence slicing does: negative positions
/// count from the end and everything is clamped to `0..len`.
#[must_use]
pub fn slice_range(len: usize, start: i64, end: Option<i64>) -> Range<usize> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |i: i64| {
        let i = if i < 0 { (len_i + i).max(0) } else { i.min(len_i) };
        usize::try_from(i).unwrap_or(0)
    };
    let start = clamp(start);
    let end = end.map_or(len, clamp);
    start..end.max(start)
}

/// Characters `start..end` of `value`, where an `end` of zero means the end
/// of the string.
#[must_use]
pub fn substring(value: &str, start: i64, end: i64) -> String {
    let chars: Vec<char> = value.chars().collect();
    let range = slice_range(chars.len(), start, (end != 0).then_some(end));
    chars[range].iter().collect()
}

/// Items `start..end` of a list, with the same zero-means-end rule.
#[must_use]
pub fn sub_slice<T: Clone>(items: &[T], start: i64, end: i64) -> Vec<T> {
    items[slice_range(items.len(), start, (end != 0).then_some(end))].to_vec()
}

// =============================================================================
// Lists
// =============================================================================

/// Splits on `separator`, trims items and drops empty ones.
///
/// An empty separator leaves the value whole.
#[must_use]
pub fn split_items(value: &str, separator: &str) -> Vec<String> {
    split_all(value, separator)
        .into_iter()
        .filter(|item| !item.is_empty())
        .collect()
}

/// Splits on `separator` and trims items, keeping empty ones.
#[must_use]
pub fn split_all(value: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![value.trim().to_string()];
    }
    value
        .split(separator)
        .map(|item| item.trim().to_string())
        .collect()
}

/// The separator used to join a result list: `,` reads better as `, `.
#[must_use]
pub fn output_separator(separator: &str) -> &str {
    if separator == "," { ", " } else { separator }
}

/// Removes case-insensitive duplicates. Each item keeps the position of its
/// first occurrence and the spelling of its last.
#[must_use]
pub fn dedupe_last_spelling<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<String> = Vec::new();
    for item in items {
        let key = item.to_lowercase();
        match positions.get(&key) {
            Some(&i) => result[i] = item,
            None => {
                positions.insert(key, result.len());
                result.push(item);
            }
        }
    }
    result
}

/// Removes exact duplicates, keeping the first occurrence.
#[must_use]
pub fn dedupe_exact<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut result: Vec<String> = Vec::new();
    for item in items {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    result
}

// =============================================================================
// Collation
// =============================================================================

/// A case- and accent-insensitive sort key.
#[must_use]
pub fn sort_key(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive comparison.
#[must_use]
pub fn strcmp(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Case-sensitive comparison that still orders `a` before `B`.
#[must_use]
pub fn strcmp_case(a: &str, b: &str) -> Ordering {
    strcmp(a, b).then_with(|| b.cmp(a))
}

/// Sorts strings by [`sort_key`].
pub fn sort_by_key(items: &mut [String]) {
    items.sort_by_cached_key(|s| sort_key(s));
}

// =============================================================================
// Case and articles
// =============================================================================

const SMALL_WORDS: [&str; 19] = [
    "a", "an", "and", "as", "at", "but", "by", "en", "for", "if", "in", "of", "on", "or", "the",
    "to", "v", "via", "vs",
];

/// Upper-cases the first character and lower-cases the rest.
#[must_use]
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

/// Title case: words are capitalized except short joining words in the
/// middle of the text. Words with capitals after the first letter are left
/// as they are.
#[must_use]
pub fn titlecase(value: &str) -> String {
    let words: Vec<&str> = value.split(' ').collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            let inner_capital = word.chars().skip(1).any(char::is_uppercase);
            if inner_capital {
                (*word).to_string()
            } else if i != 0 && i != last && SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize_word(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut done = false;
    for c in word.chars() {
        if !done && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Moves a leading English article to the end: `The Hobbit` sorts as
/// `Hobbit, The`.
#[must_use]
pub fn title_sort(title: &str) -> String {
    let title = title.trim();
    for article in ["A", "An", "The"] {
        let len = article.len();
        let Some(head) = title.get(..len) else {
            continue;
        };
        let rest = &title[len..];
        if head.eq_ignore_ascii_case(article) && rest.starts_with(char::is_whitespace) {
            let rest = rest.trim_start();
            if !rest.is_empty() {
                return format!("{rest}, {head}");
            }
        }
    }
    title.to_string()
}

/// `Last, First` becomes `First Last`.
#[must_use]
pub fn swap_around_comma(value: &str) -> String {
    match value.split_once(',') {
        Some((last, first)) => format!("{} {last}", first.trim_start()).trim().to_string(),
        None => value.trim().to_string(),
    }
}

// =============================================================================
// Transliteration and sizes
// =============================================================================

/// Reduces text to ASCII: accents are dropped and a few letters that do not
/// decompose are spelled out. Anything else becomes `?`.
#[must_use]
pub fn ascii_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        let spelled = match c {
            'ß' => "ss",
            'æ' => "ae",
            'Æ' => "AE",
            'œ' => "oe",
            'Œ' => "OE",
            'ø' => "o",
            'Ø' => "O",
            'ł' => "l",
            'Ł' => "L",
            'đ' | 'ð' => "d",
            'Đ' | 'Ð' => "D",
            'þ' => "th",
            'Þ' => "Th",
            'ı' => "i",
            '‘' | '’' => "'",
            '“' | '”' => "\"",
            '–' | '—' => "-",
            '…' => "...",
            _ => "?",
        };
        out.push_str(spelled);
    }
    out
}

/// A byte count with a binary unit, one decimal truncated: `1.5 KB`.
#[must_use]
pub fn human_readable(size: i64) -> String {
    const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
    let mut divisor: i64 = 1;
    let mut suffix = "B";
    for (i, unit) in UNITS.iter().enumerate() {
        let limit = 1_i128 << ((i + 1) * 10);
        if i128::from(size) < limit {
            divisor = 1_i64 << (i * 10);
            suffix = unit;
            break;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let scaled = marginalia_foundation::format_float(size as f64 / divisor as f64);
    let mut text = match scaled.find('.') {
        Some(dot) => scaled[..(dot + 2).min(scaled.len())].to_string(),
        None => scaled,
    };
    if let Some(whole) = text.strip_suffix(".0") {
        text = whole.to_string();
    }
    format!("{text} {suffix}")
}

/// Escapes text for XML content or attributes.
#[must_use]
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
