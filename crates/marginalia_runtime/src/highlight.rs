//! Syntax highlighting for the REPL.

use std::borrow::Cow;

const RESET: &str = "\x1b[0m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[35m";
const FIELD: &str = "\x1b[36m";
const KEYWORD: &str = "\x1b[32m";
const COMMAND: &str = "\x1b[1;34m";
const COMMENT: &str = "\x1b[2;3m";
const BRACE: &str = "\x1b[1m";

/// Highlighter for templates and REPL commands.
#[derive(Debug, Default)]
pub struct TemplateHighlighter;

impl TemplateHighlighter {
    /// Creates a new highlighter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highlight a line of input.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some(rest) = line.strip_prefix(':') {
            let end = rest.find(char::is_whitespace).map_or(line.len(), |i| i + 1);
            return Cow::Owned(format!("{COMMAND}{}{RESET}{}", &line[..end], &line[end..]));
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if let Some(q) = quote {
                result.push(c);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        result.push(next);
                    }
                } else if c == q {
                    result.push_str(RESET);
                    quote = None;
                }
                continue;
            }

            match c {
                '#' => {
                    result.push_str(COMMENT);
                    result.push(c);
                    result.extend(chars.by_ref());
                    result.push_str(RESET);
                }
                '\'' | '"' => {
                    result.push_str(STRING);
                    result.push(c);
                    quote = Some(c);
                }
                '$' => {
                    result.push_str(FIELD);
                    result.push(c);
                    while let Some(next) =
                        chars.next_if(|&n| n.is_alphanumeric() || matches!(n, '$' | '_' | '#' | '@'))
                    {
                        result.push(next);
                    }
                    result.push_str(RESET);
                }
                '{' | '}' | '(' | ')' => {
                    result.push_str(BRACE);
                    result.push(c);
                    result.push_str(RESET);
                }
                c if c.is_ascii_digit() => {
                    result.push_str(NUMBER);
                    result.push(c);
                    while let Some(next) = chars.next_if(|&n| n.is_ascii_digit() || n == '.') {
                        result.push(next);
                    }
                    result.push_str(RESET);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut word = String::from(c);
                    while let Some(next) = chars.next_if(|&n| n.is_alphanumeric() || n == '_') {
                        word.push(next);
                    }
                    let is_keyword = matches!(
                        word.as_str(),
                        "program" | "if" | "then" | "elif" | "else" | "fi" | "for" | "in"
                            | "separator" | "rof"
                    );
                    if is_keyword {
                        result.push_str(KEYWORD);
                        result.push_str(&word);
                        result.push_str(RESET);
                    } else {
                        result.push_str(&word);
                    }
                }
                _ => result.push(c),
            }
        }

        if quote.is_some() {
            result.push_str(RESET);
        }

        Cow::Owned(result)
    }
}
