//! String manipulation and case-change functions.

use marginalia_foundation::{Error, Result, Value};
use regex::Regex;

use super::{fixed, unbracket};
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{patterns, text};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{CaseChanges, StringManipulation, UrlFunctions};

    vec![
        FunctionDescriptor::builtin(
            "strcat",
            StringManipulation,
            Variadic,
            "strcat(a [, b]*) -- returns a string formed by concatenating all the arguments.",
            native_strcat,
        ),
        FunctionDescriptor::builtin(
            "strlen",
            StringManipulation,
            Exact(1),
            "strlen(value) -- returns the length of the string value.",
            native_strlen,
        ),
        FunctionDescriptor::builtin(
            "substr",
            StringManipulation,
            Exact(3),
            "substr(value, start, end) -- returns the characters of value from start up to \
             but not including end. A negative end counts back from the end of the string; \
             an end of zero means the last character.",
            native_substr,
        ),
        FunctionDescriptor::builtin(
            "shorten",
            StringManipulation,
            Exact(4),
            "shorten(value, left_chars, middle_text, right_chars) -- returns a shortened \
             version of value consisting of left_chars characters from the beginning, then \
             middle_text, then right_chars characters from the end. The value is returned \
             unchanged if it is already short enough.",
            native_shorten,
        ),
        FunctionDescriptor::builtin(
            "strcat_max",
            StringManipulation,
            Variadic,
            "strcat_max(max, string1 [, prefix2, string2]*) -- concatenates prefix/string \
             pairs onto string1 until the result would be longer than max.",
            native_strcat_max,
        ),
        FunctionDescriptor::builtin(
            "swap_around_comma",
            StringManipulation,
            Exact(1),
            "swap_around_comma(value) -- given a value of the form B, A returns A B.",
            native_swap_around_comma,
        ),
        FunctionDescriptor::builtin(
            "swap_around_articles",
            StringManipulation,
            Exact(2),
            "swap_around_articles(value, separator) -- returns value with leading articles \
             moved to the end. The value can be a list, in which case each item is \
             processed. Commas in the result become semicolons.",
            native_swap_around_articles,
        ),
        FunctionDescriptor::builtin(
            "re",
            StringManipulation,
            Exact(3),
            "re(value, pattern, replacement) -- returns value after applying the regular \
             expression. All instances of pattern are replaced with replacement. Matching \
             ignores case.",
            native_re,
        ),
        FunctionDescriptor::builtin(
            "re_group",
            StringManipulation,
            Variadic,
            "re_group(value, pattern [, template_for_group]*) -- replaces each match of \
             pattern by its groups, each passed through the corresponding template. \
             Templates use [[ and ]] for braces and $ for the group value.",
            native_re_group,
        ),
        FunctionDescriptor::builtin(
            "test",
            StringManipulation,
            Exact(3),
            "test(value, text_if_not_empty, text_if_empty) -- returns text_if_not_empty if \
             the value is not empty, otherwise text_if_empty.",
            native_test,
        ),
        FunctionDescriptor::builtin(
            "contains",
            StringManipulation,
            Exact(4),
            "contains(value, pattern, text_if_match, text_if_not_match) -- checks if the \
             value is matched by the regular expression pattern, ignoring case.",
            native_contains,
        ),
        FunctionDescriptor::builtin(
            "ifempty",
            StringManipulation,
            Exact(2),
            "ifempty(value, text_if_empty) -- returns the value if it is not empty, \
             otherwise text_if_empty.",
            native_ifempty,
        ),
        FunctionDescriptor::builtin(
            "transliterate",
            StringManipulation,
            Exact(1),
            "transliterate(value) -- returns a string in a Latin alphabet formed by \
             approximating the sound of the words in value.",
            native_transliterate,
        ),
        FunctionDescriptor::builtin(
            "character",
            StringManipulation,
            Exact(1),
            "character(character_name) -- returns the character named by character_name: \
             newline, return, tab or backslash.",
            native_character,
        ),
        FunctionDescriptor::builtin(
            "to_hex",
            UrlFunctions,
            Exact(1),
            "to_hex(value) -- returns the string encoded into hex.",
            native_to_hex,
        ),
        FunctionDescriptor::builtin(
            "uppercase",
            CaseChanges,
            Exact(1),
            "uppercase(value) -- returns the value in upper case.",
            native_uppercase,
        ),
        FunctionDescriptor::builtin(
            "lowercase",
            CaseChanges,
            Exact(1),
            "lowercase(value) -- returns the value in lower case.",
            native_lowercase,
        ),
        FunctionDescriptor::builtin(
            "titlecase",
            CaseChanges,
            Exact(1),
            "titlecase(value) -- returns the value in title case.",
            native_titlecase,
        ),
        FunctionDescriptor::builtin(
            "capitalize",
            CaseChanges,
            Exact(1),
            "capitalize(value) -- returns the value with the first letter upper case and \
             the rest lower case.",
            native_capitalize,
        ),
    ]
}

/// String: strcat
fn native_strcat(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    Ok(Value::Text(args.concat()))
}

/// String: strlen
fn native_strlen(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("strlen", args)?;
    Ok(Value::Int(i64::try_from(value.chars().count()).unwrap_or(i64::MAX)))
}

/// String: substr
fn native_substr(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, start, end] = fixed::<3>("substr", args)?;
    let start = text::integer("substr", start)?;
    let end = text::integer("substr", end)?;
    Ok(Value::Text(text::substring(value, start, end)))
}

/// String: shorten
fn native_shorten(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, left, middle, right] = fixed::<4>("shorten", args)?;
    let left = usize::try_from(text::integer("shorten", left)?.max(0)).unwrap_or(0);
    let right = usize::try_from(text::integer("shorten", right)?.max(0)).unwrap_or(0);
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= left + middle.chars().count() + right {
        return Ok(Value::from(value.as_str()));
    }
    let mut out: String = chars[..left.min(chars.len())].iter().collect();
    out.push_str(middle);
    if right > 0 {
        out.extend(&chars[chars.len().saturating_sub(right)..]);
    }
    Ok(Value::Text(out))
}

/// String: strcat_max
fn native_strcat_max(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "strcat_max";
    if args.len() < 2 {
        return Err(Error::arity(NAME, "requires 2 or more arguments"));
    }
    if args.len() % 2 != 0 {
        return Err(Error::arity(NAME, "requires an even number of arguments"));
    }
    let max: usize = args[0]
        .trim()
        .parse::<i64>()
        .map(|n| usize::try_from(n).unwrap_or(0))
        .map_err(|_| Error::invalid_argument(NAME, "first argument must be an integer"))?;
    let mut result = args[1].clone();
    for pair in args[2..].chunks_exact(2) {
        let grown = result.chars().count() + pair[0].chars().count() + pair[1].chars().count();
        if grown > max {
            break;
        }
        result.push_str(&pair[0]);
        result.push_str(&pair[1]);
    }
    Ok(Value::Text(result.trim().to_string()))
}

/// String: swap_around_comma
fn native_swap_around_comma(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("swap_around_comma", args)?;
    Ok(Value::Text(text::swap_around_comma(value)))
}

/// String: swap_around_articles
fn native_swap_around_articles(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, separator] = fixed::<2>("swap_around_articles", args)?;
    if value.is_empty() {
        return Ok(Value::empty());
    }
    let swap = |v: &str| text::title_sort(v).replace(',', ";");
    if separator.is_empty() {
        return Ok(Value::Text(swap(value)));
    }
    let mut items: Vec<String> = value.split(separator.as_str()).map(|v| swap(v.trim())).collect();
    text::sort_by_key(&mut items);
    Ok(Value::Text(items.join(separator)))
}

/// String: re
fn native_re(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, pattern, replacement] = fixed::<3>("re", args)?;
    Ok(Value::Text(patterns::substitute(
        pattern,
        replacement,
        value,
        true,
    )?))
}

/// String: re_group
fn native_re_group(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, pattern, templates @ ..] = args else {
        return Err(Error::arity("re_group", "requires at least 2 arguments"));
    };
    let re = patterns::search(pattern)?;
    Ok(Value::Text(replace_groups(ctx, value, &re, templates)?))
}

/// Replaces every match of `re` by its participating groups, each rendered
/// through the template at the same position when there is one.
pub(super) fn replace_groups(
    ctx: &CallContext<'_>,
    value: &str,
    re: &Regex,
    templates: &[String],
) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for caps in re.captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&value[last..whole.start()]);
        let last_group = (1..caps.len()).rev().find(|&i| caps.get(i).is_some());
        for index in 1..=last_group.unwrap_or(0) {
            let Some(group) = caps.get(index) else { continue };
            match templates.get(index - 1) {
                Some(template) => out.push_str(
                    &ctx.formatter
                        .render_with_value(&unbracket(template), group.as_str())?,
                ),
                None => out.push_str(group.as_str()),
            }
        }
        last = whole.end();
    }
    out.push_str(&value[last..]);
    Ok(out)
}

/// String: test
fn native_test(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, set, not_set] = fixed::<3>("test", args)?;
    Ok(Value::from(if value.is_empty() { not_set } else { set }.as_str()))
}

/// String: contains
fn native_contains(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, pattern, yes, no] = fixed::<4>("contains", args)?;
    let found = patterns::is_match(pattern, value)?;
    Ok(Value::from(if found { yes } else { no }.as_str()))
}

/// String: ifempty
fn native_ifempty(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, if_empty] = fixed::<2>("ifempty", args)?;
    Ok(Value::from(if value.is_empty() { if_empty } else { value }.as_str()))
}

/// String: transliterate
fn native_transliterate(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("transliterate", args)?;
    Ok(Value::Text(text::ascii_text(value)))
}

/// String: character
fn native_character(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [name] = fixed::<1>("character", args)?;
    let c = match name.as_str() {
        "newline" => "\n",
        "return" => "\r",
        "tab" => "\t",
        "backslash" => "\\",
        other => {
            return Err(Error::invalid_argument(
                "character",
                format!("unknown character name '{other}'"),
            ));
        }
    };
    Ok(Value::from(c))
}

/// String: to_hex
fn native_to_hex(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("to_hex", args)?;
    Ok(Value::Text(value.bytes().map(|b| format!("{b:02x}")).collect()))
}

/// Case: uppercase
fn native_uppercase(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("uppercase", args)?;
    Ok(Value::Text(value.to_uppercase()))
}

/// Case: lowercase
fn native_lowercase(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("lowercase", args)?;
    Ok(Value::Text(value.to_lowercase()))
}

/// Case: titlecase
fn native_titlecase(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("titlecase", args)?;
    Ok(Value::Text(text::titlecase(value)))
}

/// Case: capitalize
fn native_capitalize(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value] = fixed::<1>("capitalize", args)?;
    Ok(Value::Text(text::capitalize(value)))
}
