//! Regular expressions as the template language uses them.
//!
//! Searches are case-insensitive. Replacement strings use the `\1` /
//! `\g<name>` group syntax and are translated to the `${1}` form the regex
//! crate expects.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};

use marginalia_foundation::{Error, Result};

const CACHE_LIMIT: usize = 256;

type Cache = Mutex<HashMap<(String, bool), Regex>>;

static CACHE: LazyLock<Cache> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Compiles a case-insensitive pattern.
///
/// # Errors
/// Returns [`Error::invalid_regex`] for malformed patterns.
pub fn search(pattern: &str) -> Result<Regex> {
    compile(pattern, true)
}

/// Compiles a case-sensitive pattern.
///
/// # Errors
/// Returns [`Error::invalid_regex`] for malformed patterns.
pub fn exact(pattern: &str) -> Result<Regex> {
    compile(pattern, false)
}

/// True if `pattern` matches anywhere in `text`, ignoring case.
///
/// # Errors
/// Returns [`Error::invalid_regex`] for malformed patterns.
pub fn is_match(pattern: &str, text: &str) -> Result<bool> {
    Ok(search(pattern)?.is_match(text))
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    let key = (pattern.to_string(), case_insensitive);
    if let Some(re) = CACHE.lock().get(&key).cloned() {
        return Ok(re);
    }
    let re = RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::invalid_regex(pattern, e))?;
    let mut cache = CACHE.lock();
    if cache.len() >= CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(key, re.clone());
    Ok(re)
}

/// Translates a `\1` / `\g<1>` / `\g<name>` replacement into `${1}` form.
///
/// A literal `$` is escaped; `\n` and `\t` become newline and tab; any other
/// escaped character stands for itself.
#[must_use]
pub fn replacement(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = d.to_string();
                    if let Some(&e) = chars.peek() {
                        if e.is_ascii_digit() {
                            group.push(e);
                            chars.next();
                        }
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('g') if chars.peek() == Some(&'<') => {
                    chars.next();
                    let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                    out.push_str(&format!("${{{name}}}"));
                }
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

/// Replaces every match of `pattern` in `text`.
///
/// # Errors
/// Returns [`Error::invalid_regex`] for malformed patterns.
pub fn substitute(pattern: &str, repl: &str, text: &str, case_insensitive: bool) -> Result<String> {
    let re = compile(pattern, case_insensitive)?;
    Ok(re.replace_all(text, replacement(repl).as_str()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searches_ignore_case() {
        assert!(is_match("^the", "The Hobbit").unwrap());
        assert!(!exact("^the").unwrap().is_match("The Hobbit"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = search("(unclosed").unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn translates_group_references() {
        assert_eq!(replacement(r"\2 \1"), "${2} ${1}");
        assert_eq!(replacement(r"\g<name>-\g<2>"), "${name}-${2}");
        assert_eq!(replacement("cost $5"), "cost $$5");
        assert_eq!(replacement(r"a\.b"), "a.b");
    }

    #[test]
    fn substitute_uses_python_groups() {
        assert_eq!(
            substitute(r"(\w+), (\w+)", r"\2 \1", "Tolkien, John", true).unwrap(),
            "John Tolkien"
        );
        assert_eq!(substitute("A", "x", "aA", false).unwrap(), "ax");
    }
}
