//! Parsing and formatting dates.
//!
//! Dates without an offset are taken to be UTC. Formatting keeps the date's
//! own offset.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat,
    Timelike, Utc,
};
use regex::Regex;

use marginalia_foundation::{Error, Result};

/// Years at or before this mark the "no date" value.
pub const UNDEFINED_YEAR: i32 = 101;

/// Format used when none is given.
pub const DEFAULT_FORMAT: &str = "dd MMM yyyy";

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d.%m.%Y",
];

static CALC_STEP: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([-+\d]+)([smhdwy])").ok());

/// Parses a date in any of the common textual forms.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(midnight(date));
        }
    }
    // A bare year and month lands mid-month.
    NaiveDate::parse_from_str(&format!("{value}-15"), "%Y-%m-%d")
        .ok()
        .map(midnight)
}

fn midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .fixed_offset()
}

/// True for the "no date" value.
#[must_use]
pub fn is_undefined(dt: &DateTime<FixedOffset>) -> bool {
    dt.year() <= UNDEFINED_YEAR
}

/// The current local time.
#[must_use]
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Seconds since the epoch.
#[must_use]
pub fn timestamp(dt: &DateTime<FixedOffset>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = dt.timestamp() as f64;
    seconds + f64::from(dt.timestamp_subsec_micros()) / 1_000_000.0
}

/// The UTC date for a count of seconds since the epoch.
#[must_use]
pub fn from_timestamp(seconds: f64) -> Option<DateTime<FixedOffset>> {
    if !seconds.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_micros(micros).map(|dt| dt.fixed_offset())
}

/// Renders a date with a `dd MMM yyyy`-style format, or `iso`.
///
/// | Code | Meaning |
/// |------|---------|
/// | `d` `dd` | day, unpadded / two digits |
/// | `ddd` `dddd` | abbreviated / full weekday name |
/// | `M` `MM` | month, unpadded / two digits |
/// | `MMM` `MMMM` | abbreviated / full month name |
/// | `yy` `yyyy` | two / four digit year |
/// | `h` `hh` | hour (12-hour when `ap` or `AP` appears) |
/// | `m` `mm` | minutes |
/// | `s` `ss` | seconds |
/// | `ap` `AP` | am/pm marker |
#[must_use]
pub fn format_date(dt: &DateTime<FixedOffset>, format: &str) -> String {
    let format = if format.is_empty() {
        DEFAULT_FORMAT
    } else {
        format
    };
    if format == "iso" {
        return dt.to_rfc3339_opts(SecondsFormat::AutoSi, false);
    }
    if is_undefined(dt) {
        return String::new();
    }
    let twelve_hour = format.to_lowercase().contains("ap");
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let next = chars.get(i + 1).copied();
        let (text, used) = match c {
            's' => two(dt.second(), run.min(2)),
            'm' => two(dt.minute(), run.min(2)),
            'h' => {
                let hour = if twelve_hour {
                    match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    dt.hour()
                };
                two(hour, run.min(2))
            }
            'a' if next == Some('p') => {
                let marker = if dt.hour() < 12 { "am" } else { "pm" };
                (marker.to_string(), 2)
            }
            'A' if next == Some('P') => {
                let marker = if dt.hour() < 12 { "AM" } else { "PM" };
                (marker.to_string(), 2)
            }
            'd' => match run.min(4) {
                1 => (dt.day().to_string(), 1),
                2 => (format!("{:02}", dt.day()), 2),
                3 => (dt.format("%a").to_string(), 3),
                _ => (dt.format("%A").to_string(), 4),
            },
            'M' => match run.min(4) {
                1 => (dt.month().to_string(), 1),
                2 => (format!("{:02}", dt.month()), 2),
                3 => (dt.format("%b").to_string(), 3),
                _ => (dt.format("%B").to_string(), 4),
            },
            'y' if run >= 4 => (format!("{:04}", dt.year()), 4),
            'y' if run >= 2 => (format!("{:02}", dt.year().rem_euclid(100)), 2),
            c => (c.to_string(), 1),
        };
        out.push_str(&text);
        i += used;
    }
    out
}

fn two(value: u32, width: usize) -> (String, usize) {
    if width == 2 {
        (format!("{value:02}"), 2)
    } else {
        (value.to_string(), 1)
    }
}

/// Applies a calculation such as `1s3d-1m` to a date, left to right.
///
/// Units are `s`, `m`, `h`, `d`, `w` and `y` (365 days).
///
/// # Errors
/// Returns an error for malformed specifiers or out-of-range results.
pub fn apply_calculation(
    mut dt: DateTime<FixedOffset>,
    spec: &str,
) -> Result<DateTime<FixedOffset>> {
    const FUNCTION: &str = "date_arithmetic";
    let invalid = || {
        Error::invalid_argument(FUNCTION, format!("invalid calculation specifier '{spec}'"))
    };
    let step = CALC_STEP
        .as_ref()
        .ok_or_else(|| Error::internal("calculation pattern failed to compile"))?;
    let mut rest = spec;
    while !rest.is_empty() {
        let caps = step.captures(rest).ok_or_else(invalid)?;
        let amount: i64 = caps[1].parse().map_err(|_| invalid())?;
        let delta = match &caps[2] {
            "s" => Duration::try_seconds(amount),
            "m" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            "d" => Duration::try_days(amount),
            "w" => Duration::try_weeks(amount),
            _ => amount.checked_mul(365).and_then(Duration::try_days),
        }
        .ok_or_else(invalid)?;
        dt = dt
            .checked_add_signed(delta)
            .ok_or_else(|| Error::invalid_argument(FUNCTION, "date out of range"))?;
        rest = &rest[caps[0].len()..];
    }
    Ok(dt)
}

/// `first - second` in days.
#[must_use]
pub fn days_between(first: &DateTime<FixedOffset>, second: &DateTime<FixedOffset>) -> f64 {
    let delta = first.signed_duration_since(*second);
    #[allow(clippy::cast_precision_loss)]
    let seconds = delta.num_milliseconds() as f64 / 1000.0;
    seconds / 86_400.0
}
