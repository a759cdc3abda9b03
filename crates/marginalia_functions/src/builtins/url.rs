//! URL construction and encoding.

use marginalia_foundation::{Error, Result, Value};

use super::fixed;
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};
use crate::support::{text, url};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::UrlFunctions;

    vec![
        FunctionDescriptor::builtin(
            "make_url",
            UrlFunctions,
            Variadic,
            "make_url(path, [query_name, query_value]+) -- builds a query URL from path and \
             the name/value pairs. Values are always encoded, with spaces as '+'.",
            native_make_url,
        ),
        FunctionDescriptor::builtin(
            "make_url_extended",
            UrlFunctions,
            Variadic,
            "make_url_extended(scheme, authority, path, [query_name, query_value]+) or \
             make_url_extended(scheme, authority, path, query_string) -- builds a URL from \
             its components. The authority may be empty. An empty query_string leaves the \
             query out.",
            native_make_url_extended,
        ),
        FunctionDescriptor::builtin(
            "query_string",
            UrlFunctions,
            Variadic,
            "query_string([query_name, query_value, how_to_encode]+) -- builds a URL query \
             string. how_to_encode is 0 to encode with spaces as '+', 1 to encode with \
             spaces as %20 and 2 to leave the value alone.",
            native_query_string,
        ),
        FunctionDescriptor::builtin(
            "encode_for_url",
            UrlFunctions,
            Exact(2),
            "encode_for_url(value, use_plus) -- returns the value URL-encoded. Spaces \
             become '+' if use_plus is 0 and %20 if it is 1.",
            native_encode_for_url,
        ),
        FunctionDescriptor::builtin(
            "urls_from_identifiers",
            UrlFunctions,
            Exact(2),
            "urls_from_identifiers(identifiers, sort_results) -- given a comma-separated \
             list of id_name:id_value identifiers, returns a comma-separated list of HTML \
             links for them. The list is sorted by site name unless sort_results is 0.",
            native_urls_from_identifiers,
        ),
    ]
}

/// `name=value&...` from name/value pairs, values encoded with `+` for spaces.
fn plus_query(pairs: &[String]) -> String {
    pairs
        .chunks_exact(2)
        .map(|pair| format!("{}={}", pair[0], url::quote_plus(pair[1].trim())))
        .collect::<Vec<_>>()
        .join("&")
}

fn check_pairs(name: &str, pairs: &[String], minimum: usize) -> Result<()> {
    if pairs.len() % 2 != 0 {
        return Err(Error::arity(name, "requires an odd number of arguments"));
    }
    if pairs.is_empty() {
        return Err(Error::arity(name, format!("requires at least {minimum} arguments")));
    }
    Ok(())
}

/// URL: make_url
fn native_make_url(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [path, pairs @ ..] = args else {
        return Err(Error::arity("make_url", "requires at least 3 arguments"));
    };
    check_pairs("make_url", pairs, 3)?;
    Ok(Value::Text(format!("{path}?{}", plus_query(pairs))))
}

/// URL: make_url_extended
fn native_make_url_extended(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "make_url_extended";
    let [scheme, authority, path, query @ ..] = args else {
        return Err(Error::arity(NAME, "requires at least 4 arguments"));
    };
    let query = match query {
        [query_string] => query_string.clone(),
        pairs => {
            check_pairs(NAME, pairs, 5)?;
            plus_query(pairs)
        }
    };
    let slash = if authority.is_empty() { "" } else { "/" };
    let path = path.strip_prefix('/').unwrap_or(path);
    let query = if query.is_empty() {
        query
    } else {
        format!("?{query}")
    };
    Ok(Value::Text(format!("{scheme}://{authority}{slash}{path}{query}")))
}

/// URL: query_string
fn native_query_string(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    const NAME: &str = "query_string";
    if args.is_empty() || args.len() % 3 != 0 {
        return Err(Error::arity(NAME, "requires at least one group of 3 arguments"));
    }
    let mut items = Vec::with_capacity(args.len() / 3);
    for group in args.chunks_exact(3) {
        let value = group[1].trim();
        let encoded = match group[2].as_str() {
            "0" => url::quote_plus(value),
            "1" => url::quote(value),
            "2" => value.to_string(),
            other => {
                return Err(Error::invalid_argument(
                    NAME,
                    format!("the third argument of a group must be 0, 1, or 2, not {other}"),
                ));
            }
        };
        items.push(format!("{}={encoded}", group[0]));
    }
    Ok(Value::Text(items.join("&")))
}

/// URL: encode_for_url
fn native_encode_for_url(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [value, use_plus] = fixed::<2>("encode_for_url", args)?;
    let encoded = match use_plus.as_str() {
        "0" => url::quote_plus(value),
        "1" => url::quote(value),
        other => {
            return Err(Error::invalid_argument(
                "encode_for_url",
                format!("the second argument must be 0, or 1, not {other}"),
            ));
        }
    };
    Ok(Value::Text(encoded))
}

/// URL: urls_from_identifiers
fn native_urls_from_identifiers(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [identifiers, sort] = fixed::<2>("urls_from_identifiers", args)?;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for item in identifiers.split(',') {
        let Some((kind, value)) = item.split_once(':') else {
            continue;
        };
        let (kind, value) = (kind.trim(), value.trim());
        if kind.is_empty() || value.is_empty() {
            continue;
        }
        match pairs.iter_mut().find(|(k, _)| k == kind) {
            Some(existing) => existing.1 = value.to_string(),
            None => pairs.push((kind.to_string(), value.to_string())),
        }
    }
    let links: Vec<String> = url::urls_from_identifiers(&pairs, sort != "0")
        .into_iter()
        .map(|link| {
            format!(
                "<a href=\"{}\" title=\"{}:{}\">{}</a>",
                text::xml_escape(&link.url),
                text::xml_escape(&link.kind),
                text::xml_escape(&link.value),
                text::xml_escape(&link.name),
            )
        })
        .collect();
    Ok(Value::Text(links.join(", ")))
}

#[cfg(test)]
mod tests {
    use crate::testing::run;

    #[test]
    fn make_url_encodes_values() {
        assert_eq!(
            run("make_url", &["https://en.wikipedia.org/w/index.php", "search", "Niccolò Machiavelli"])
                .unwrap(),
            "https://en.wikipedia.org/w/index.php?search=Niccol%C3%B2+Machiavelli"
        );
        assert!(run("make_url", &["https://x", "search"]).is_err());
        assert!(run("make_url", &["https://x"]).is_err());
    }

    #[test]
    fn make_url_extended_variants() {
        assert_eq!(
            run("make_url_extended", &["https", "en.wikipedia.org", "/w/index.php", "search", "a b"])
                .unwrap(),
            "https://en.wikipedia.org/w/index.php?search=a+b"
        );
        assert_eq!(
            run("make_url_extended", &["calibre", "", "show-book", "id=5"]).unwrap(),
            "calibre://show-book?id=5"
        );
        assert_eq!(
            run("make_url_extended", &["https", "host", "path", ""]).unwrap(),
            "https://host/path"
        );
    }

    #[test]
    fn query_string_encodings() {
        assert_eq!(
            run("query_string", &["encoded", "Hendrik Bäßler", "0", "raw", "{0}", "2"]).unwrap(),
            "encoded=Hendrik+B%C3%A4%C3%9Fler&raw={0}"
        );
        assert_eq!(run("query_string", &["q", "a b", "1"]).unwrap(), "q=a%20b");
        assert!(run("query_string", &["q", "a b", "3"]).is_err());
        assert!(run("query_string", &["q", "a b"]).is_err());
    }

    #[test]
    fn encode_for_url_choices() {
        assert_eq!(run("encode_for_url", &["a b", "0"]).unwrap(), "a+b");
        assert_eq!(run("encode_for_url", &["a b", "1"]).unwrap(), "a%20b");
        assert!(run("encode_for_url", &["a b", "2"]).is_err());
    }

    #[test]
    fn identifier_links() {
        let out = run("urls_from_identifiers", &["isbn:9780261103573, bogus", "0"]).unwrap();
        assert_eq!(
            out,
            "<a href=\"https://www.worldcat.org/isbn/9780261103573\" \
             title=\"isbn:9780261103573\">ISBN</a>"
        );
        assert_eq!(run("urls_from_identifiers", &["", "1"]).unwrap(), "");
    }
}
