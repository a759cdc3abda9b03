//! URL quoting and identifier links.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left alone by [`quote_plus`].
const QUERY_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Characters left alone by [`quote`]; also keeps `/`.
const PATH_SAFE: &AsciiSet = &QUERY_SAFE.remove(b'/');

/// Percent-encodes `value` for a URL path; spaces become `%20`.
#[must_use]
pub fn quote(value: &str) -> String {
    utf8_percent_encode(value, PATH_SAFE).to_string()
}

/// Percent-encodes `value` for a query string; spaces become `+` and `/`
/// is encoded.
#[must_use]
pub fn quote_plus(value: &str) -> String {
    value
        .split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_SAFE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// A link generated for one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierLink {
    /// Display name of the site.
    pub name: String,
    /// Identifier type, e.g. `isbn`.
    pub kind: String,
    /// Identifier value.
    pub value: String,
    /// The link target.
    pub url: String,
}

fn link_for(kind: &str, value: &str) -> Option<(String, String)> {
    let (name, url) = match kind {
        "isbn" => ("ISBN".to_string(), format!("https://www.worldcat.org/isbn/{}", quote(value))),
        "doi" => ("DOI".to_string(), format!("https://dx.doi.org/{}", quote(value))),
        "google" => (
            "Google Books".to_string(),
            format!("https://books.google.com/books?id={}", quote_plus(value)),
        ),
        "goodreads" => (
            "Goodreads".to_string(),
            format!("https://www.goodreads.com/book/show/{}", quote(value)),
        ),
        "amazon" => ("Amazon.com".to_string(), format!("https://www.amazon.com/dp/{}", quote(value))),
        "openlibrary" => (
            "Open Library".to_string(),
            format!("https://openlibrary.org/books/{}", quote(value)),
        ),
        "url" | "uri" if value.contains("://") => (value.to_string(), value.to_string()),
        other => {
            let tld = other.strip_prefix("amazon_")?;
            if tld.is_empty() || !tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
                return None;
            }
            let tld = match tld {
                "uk" => "co.uk",
                "jp" => "co.jp",
                "br" => "com.br",
                "au" => "com.au",
                t => t,
            };
            (
                format!("Amazon.{tld}"),
                format!("https://www.amazon.{tld}/dp/{}", quote(value)),
            )
        }
    };
    Some((name, url))
}

/// Links for the identifiers a site is known for, in identifier order or
/// sorted by site name.
#[must_use]
pub fn urls_from_identifiers(identifiers: &[(String, String)], sort: bool) -> Vec<IdentifierLink> {
    let mut links: Vec<IdentifierLink> = identifiers
        .iter()
        .filter_map(|(kind, value)| {
            let (name, url) = link_for(kind, value)?;
            Some(IdentifierLink {
                name,
                kind: kind.clone(),
                value: value.clone(),
                url,
            })
        })
        .collect();
    if sort {
        links.sort_by(|a, b| super::text::strcmp(&a.name, &b.name));
    }
    links
}
