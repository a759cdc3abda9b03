//! Rendering a number of seconds through a `[w][d][h][m][s]` template.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use marginalia_foundation::{Error, Result};

const FUNCTION: &str = "format_duration";
const UNITS: &str = "smhdw";

static SELECTOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[(.)(:(.*?))?\]").ok());

fn seconds_in(unit: char) -> i64 {
    match unit {
        'w' => 7 * 24 * 60 * 60,
        'd' => 24 * 60 * 60,
        'h' => 60 * 60,
        'm' => 60,
        _ => 1,
    }
}

/// Per-unit amounts, `None` above the largest unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Breakdown {
    weeks: Option<i64>,
    days: Option<i64>,
    hours: Option<i64>,
    minutes: Option<i64>,
    seconds: i64,
}

impl Breakdown {
    fn new(total: i64, largest: char) -> Self {
        let rank = UNITS.find(largest).unwrap_or(0);
        let mut remainder = total;
        let mut take = |unit: char| {
            if UNITS.find(unit).unwrap_or(0) > rank {
                return None;
            }
            let size = seconds_in(unit);
            let amount = remainder.div_euclid(size);
            remainder = remainder.rem_euclid(size);
            Some(amount)
        };
        let weeks = take('w');
        let days = take('d');
        let hours = take('h');
        let minutes = take('m');
        Self {
            weeks,
            days,
            hours,
            minutes,
            seconds: remainder,
        }
    }

    fn get(&self, unit: char) -> Option<i64> {
        match unit {
            'w' => self.weeks,
            'd' => self.days,
            'h' => self.hours,
            'm' => self.minutes,
            _ => Some(self.seconds),
        }
    }
}

/// Formats `total` seconds.
///
/// `largest_unit` is one of `wdhms` or empty, in which case the largest
/// selector in the template is used. Lowercase selectors drop zero amounts
/// for units larger than the whole duration; uppercase selectors keep them.
///
/// # Errors
/// Returns an error for unknown selectors, a bad `largest_unit` or more than
/// three suffixes in a group.
pub fn format_duration(total: i64, template: &str, largest_unit: &str) -> Result<String> {
    let selector = SELECTOR
        .as_ref()
        .ok_or_else(|| Error::internal("duration selector failed to compile"))?;
    let invalid = |spec: &str| {
        Error::invalid_argument(FUNCTION, format!("The {spec} format specifier is not valid"))
    };

    let largest = match largest_unit.chars().collect::<Vec<_>>().as_slice() {
        [] => {
            let mut highest = 0;
            for caps in selector.captures_iter(template) {
                let unit = caps[1].to_lowercase();
                let rank = UNITS.find(unit.as_str()).ok_or_else(|| invalid(&caps[0]))?;
                highest = highest.max(rank);
            }
            UNITS.chars().nth(highest).unwrap_or('s')
        }
        [c] if "wdhms".contains(*c) => *c,
        _ => {
            return Err(Error::invalid_argument(
                FUNCTION,
                "the largest_unit parameter must be one of wdhms",
            ));
        }
    };

    let amounts = Breakdown::new(total, largest);
    let mut failure = None;
    let out = selector.replace_all(template, |caps: &Captures<'_>| {
        render_selector(caps, &amounts, total).unwrap_or_else(|e| {
            failure.get_or_insert(e);
            String::new()
        })
    });
    if let Some(e) = failure {
        return Err(e);
    }
    Ok(out.trim_end().to_string())
}

fn render_selector(caps: &Captures<'_>, amounts: &Breakdown, total: i64) -> Result<String> {
    let letter = caps[1].chars().next().unwrap_or(' ');
    let unit = letter.to_ascii_lowercase();
    if !UNITS.contains(unit) {
        return Err(Error::invalid_argument(
            FUNCTION,
            format!("The {letter} format specifier is not valid"),
        ));
    }
    let (zero, one, many) = match caps.get(3).map(|m| m.as_str()) {
        None => {
            let s = format!("{unit} ");
            (s.clone(), s.clone(), s)
        }
        Some(text) => match text.split('|').collect::<Vec<_>>().as_slice() {
            [all] => ((*all).to_string(), (*all).to_string(), (*all).to_string()),
            [other, one] => ((*other).to_string(), (*one).to_string(), (*other).to_string()),
            [zero, one, many] => ((*zero).to_string(), (*one).to_string(), (*many).to_string()),
            _ => {
                return Err(Error::invalid_argument(
                    FUNCTION,
                    format!("The group {letter} has too many suffixes"),
                ));
            }
        },
    };
    let threshold = if unit == 's' { -1 } else { seconds_in(unit) };
    Ok(match amounts.get(unit) {
        None => String::new(),
        Some(0) if letter.is_lowercase() && total < threshold => String::new(),
        Some(0) => format!("0{zero}"),
        Some(1) => format!("1{one}"),
        Some(n) => format!("{n}{many}"),
    })
}
