//! Template-mode scanning.
//!
//! A template is literal text with `{...}` field references:
//!
//! - `{field}` - the field's display value
//! - `{field:fmt|prefix|suffix}` - format spec, plus text added around
//!   non-empty values
//! - `{field:func(a, b)|prefix|suffix}` - single-function mode, the field
//!   value is passed as the first argument
//! - `{field:'program'}` - a program run with the value bound to `$`
//!
//! A template that starts with `program:` is a program in its entirety.

use marginalia_foundation::{Error, Result};

use crate::ast::Program;
use crate::parser::parse_program;

/// Prefix marking a whole-template program.
pub const PROGRAM_PREFIX: &str = "program:";

/// A parsed template.
#[derive(Clone, Debug, PartialEq)]
pub enum Template {
    /// A `program:` template.
    Program(Program),
    /// Text interleaved with field references.
    Segments(Vec<Segment>),
}

/// One piece of a template.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// Literal text.
    Text(String),
    /// A `{...}` reference.
    Field(FieldRef),
}

/// A `{...}` field reference.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRef {
    /// Field lookup key.
    pub name: String,
    /// What to do with the value.
    pub spec: FieldSpec,
}

/// How a field reference renders its value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldSpec {
    /// `{field}`
    Plain,
    /// `{field:fmt|prefix|suffix}`
    Format {
        /// Format spec; empty means none.
        format: String,
        /// Added before a non-empty value.
        prefix: String,
        /// Added after a non-empty value.
        suffix: String,
    },
    /// `{field:func(args)|prefix|suffix}`
    Function {
        /// Function name.
        name: String,
        /// Literal arguments after the field value.
        args: Vec<String>,
        /// Added before a non-empty result.
        prefix: String,
        /// Added after a non-empty result.
        suffix: String,
    },
    /// `{field:'program'}`
    Program(Program),
}

/// Parses a template in either mode.
///
/// # Errors
/// Returns an error for unbalanced braces or an unparsable embedded program.
pub fn parse_template(source: &str) -> Result<Template> {
    if let Some(program) = source.strip_prefix(PROGRAM_PREFIX) {
        return Ok(Template::Program(parse_program(program)?));
    }
    Scanner::new(source).scan().map(Template::Segments)
}

struct Scanner<'src> {
    source: &'src str,
    chars: Vec<(usize, char)>,
    index: usize,
}

impl<'src> Scanner<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            index: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map_or(self.source.len(), |&(i, _)| i)
    }

    fn error(&self, message: &str) -> Error {
        let consumed = &self.source[..self.offset()];
        let line = u32::try_from(consumed.matches('\n').count() + 1).unwrap_or(u32::MAX);
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(1, |l| l.chars().count() + 1);
        Error::parse(message, line, u32::try_from(column).unwrap_or(u32::MAX))
    }

    fn scan(&mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            match c {
                '\\' if matches!(
                    self.chars.get(self.index + 1),
                    Some((_, '{' | '}' | '\\'))
                ) =>
                {
                    self.index += 1;
                    if let Some(escaped) = self.peek() {
                        text.push(escaped);
                    }
                    self.index += 1;
                }
                '{' => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    self.index += 1;
                    segments.push(Segment::Field(self.scan_field()?));
                }
                '}' => return Err(self.error("unmatched '}'")),
                c => {
                    text.push(c);
                    self.index += 1;
                }
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(segments)
    }

    /// Scans the inside of `{...}`; the `{` is already consumed.
    fn scan_field(&mut self) -> Result<FieldRef> {
        let start = self.offset();
        while self.peek().is_some_and(|c| c != ':' && c != '}' && c != '{') {
            self.index += 1;
        }
        let name = self.source[start..self.offset()].trim().to_string();
        if name.is_empty() {
            return Err(self.error("empty field name"));
        }
        match self.peek() {
            Some('}') => {
                self.index += 1;
                Ok(FieldRef {
                    name,
                    spec: FieldSpec::Plain,
                })
            }
            Some(':') => {
                self.index += 1;
                let spec = if self.peek() == Some('\'') {
                    self.scan_program()?
                } else {
                    self.scan_spec()?
                };
                Ok(FieldRef { name, spec })
            }
            Some(_) => Err(self.error("unexpected '{' in field name")),
            None => Err(self.error("unterminated field reference")),
        }
    }

    /// Scans `'program'}`.
    fn scan_program(&mut self) -> Result<FieldSpec> {
        self.index += 1;
        let start = self.offset();
        loop {
            match self.peek() {
                Some('\\') => self.index += 2,
                Some('\'') => {
                    let end = self.offset();
                    self.index += 1;
                    if self.peek() == Some('}') {
                        self.index += 1;
                        let program = parse_program(&self.source[start..end])?;
                        return Ok(FieldSpec::Program(program));
                    }
                }
                Some(_) => self.index += 1,
                None => return Err(self.error("unterminated template program")),
            }
        }
    }

    /// Scans `fmt|prefix|suffix}`, honouring parentheses in the format part.
    fn scan_spec(&mut self) -> Result<FieldSpec> {
        let mut parts = vec![String::new()];
        let mut depth = 0usize;
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated field reference"));
            };
            self.index += 1;
            match c {
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        if let Some(part) = parts.last_mut() {
                            part.push('\\');
                            part.push(escaped);
                        }
                        self.index += 1;
                    }
                }
                '(' => {
                    depth += 1;
                    push(&mut parts, c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    push(&mut parts, c);
                }
                '|' if depth == 0 => parts.push(String::new()),
                '}' if depth == 0 => break,
                c => push(&mut parts, c),
            }
        }
        if parts.len() > 3 {
            return Err(self.error("too many '|' separators in field reference"));
        }
        let mut parts = parts.into_iter();
        let format = parts.next().unwrap_or_default();
        let prefix = parts.next().unwrap_or_default();
        let suffix = parts.next().unwrap_or_default();

        let prefix = unescape(&prefix);
        let suffix = unescape(&suffix);
        Ok(match split_function(&format) {
            Some((name, args)) => FieldSpec::Function {
                name,
                args,
                prefix,
                suffix,
            },
            None => FieldSpec::Format {
                format: unescape(&format),
                prefix,
                suffix,
            },
        })
    }
}

fn push(parts: &mut [String], c: char) {
    if let Some(part) = parts.last_mut() {
        part.push(c);
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Splits `name(a, b)` into its name and literal arguments.
fn split_function(format: &str) -> Option<(String, Vec<String>)> {
    let open = format.find('(')?;
    let inner = format.strip_suffix(')')?.get(open + 1..)?;
    let name = &format[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => args.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if !inner.trim().is_empty() || !args.is_empty() {
        args.push(current);
    }
    Some((name.to_string(), args))
}
