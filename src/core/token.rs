//! Placeholder substitution and date patterns
//!
//! Templates use `%{name}` for tokens and `%%` for a literal percent sign.
//! Substitution is a single pass over the original template: values that
//! themselves contain `%{...}` are emitted verbatim.

use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// One parsed piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Percent,
    Token(&'a str),
}

/// Split a template into literals, escaped percents and tokens.
#[must_use]
pub fn parse(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'%') => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                segments.push(Segment::Percent);
                i += 2;
                literal_start = i;
            }
            Some(b'{') => match template[i + 2..].find('}') {
                Some(offset) => {
                    if literal_start < i {
                        segments.push(Segment::Literal(&template[literal_start..i]));
                    }
                    let end = i + 2 + offset;
                    segments.push(Segment::Token(&template[i + 2..end]));
                    i = end + 1;
                    literal_start = i;
                }
                None => i += 2,
            },
            _ => i += 1,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

/// Distinct token names in first-occurrence order
fn token_names<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for segment in segments {
        if let Segment::Token(name) = *segment {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Replace every `%{name}` with `lookup(name)`, or `default` when the lookup
/// yields nothing. Each distinct name is looked up once.
pub fn substitute<F>(template: &str, lookup: F, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let segments = parse(template);
    let resolved: HashMap<&str, String> = token_names(&segments)
        .into_iter()
        .map(|name| (name, lookup(name).unwrap_or_else(|| default.to_string())))
        .collect();

    let mut out = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Percent => out.push('%'),
            Segment::Token(name) => out.push_str(&resolved[name]),
        }
    }
    out
}

/// Text form of a token value. `None` for null so callers fall back to the default.
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Clock used by [`strftime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timezone {
    Utc,
    #[default]
    Local,
}

impl FromStr for Timezone {
    type Err = std::convert::Infallible;

    /// `GMT` and `UTC` select UTC; anything else is the local clock.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GMT" | "UTC" => Ok(Timezone::Utc),
            _ => Ok(Timezone::Local),
        }
    }
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Format `date` with the supported directives:
/// `%Y %y %m %d %w %H %I %M %S %B %b %A %a %z %%`.
pub fn strftime<Tz: TimeZone>(pattern: &str, timezone: Timezone, date: &DateTime<Tz>) -> String {
    match timezone {
        Timezone::Utc => render(pattern, &date.with_timezone(&Utc), 0),
        Timezone::Local => {
            let local = date.with_timezone(&Local);
            let offset = local.offset().fix().local_minus_utc();
            render(pattern, &local, offset)
        }
    }
}

fn render<Tz: TimeZone>(pattern: &str, date: &DateTime<Tz>, offset_secs: i32) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(directive) = chars.next() else {
            out.push('%');
            break;
        };
        let month = date.month0() as usize;
        let weekday = date.weekday().num_days_from_sunday() as usize;
        match directive {
            'Y' => out.push_str(&format!("{:04}", date.year())),
            'y' => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            'm' => out.push_str(&format!("{:02}", date.month())),
            'd' => out.push_str(&format!("{:02}", date.day())),
            'w' => out.push_str(&weekday.to_string()),
            'H' => out.push_str(&format!("{:02}", date.hour())),
            'I' => {
                let hour = date.hour() % 12;
                out.push_str(&format!("{:02}", if hour == 0 { 12 } else { hour }));
            }
            'M' => out.push_str(&format!("{:02}", date.minute())),
            'S' => out.push_str(&format!("{:02}", date.second())),
            'B' => out.push_str(MONTHS[month]),
            'b' => out.push_str(&MONTHS[month][..3]),
            'A' => out.push_str(DAYS[weekday]),
            'a' => out.push_str(&DAYS[weekday][..3]),
            'z' => out.push_str(&format_offset(offset_secs)),
            '%' => out.push('%'),
            other => {
                out.push('%');
                out.push(other);
            }
        }
    }
    out
}

/// `±HHMM`
fn format_offset(offset_secs: i32) -> String {
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let minutes = offset_secs.abs() / 60;
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

/// printf-style interpolation of `args` into `format`.
///
/// Supports `%s %d %i %f %j %o %O %%`. Arguments left over after the format is
/// exhausted are appended separated by spaces; directives without an argument
/// stay literal.
#[must_use]
pub fn interpolate(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut remaining = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&directive) = chars.peek() else {
            out.push('%');
            break;
        };
        match directive {
            '%' => {
                chars.next();
                out.push('%');
            }
            's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O' => {
                chars.next();
                match remaining.next() {
                    Some(arg) => out.push_str(&interpolate_arg(directive, arg)),
                    None => {
                        out.push('%');
                        out.push(directive);
                    }
                }
            }
            _ => out.push('%'),
        }
    }

    for arg in remaining {
        out.push(' ');
        out.push_str(&value_text(arg).unwrap_or_else(|| "null".to_string()));
    }
    out
}

fn interpolate_arg(directive: char, arg: &Value) -> String {
    match directive {
        's' => value_text(arg).unwrap_or_else(|| "null".to_string()),
        'd' | 'i' => match number_of(arg) {
            Some(n) => format!("{}", n.trunc() as i64),
            None => "NaN".to_string(),
        },
        'f' => match number_of(arg) {
            Some(n) => n.to_string(),
            None => "NaN".to_string(),
        },
        _ => arg.to_string(),
    }
}

fn number_of(arg: &Value) -> Option<f64> {
    match arg {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
