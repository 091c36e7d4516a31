//! Timestamp formatting for the `timestamp` token
//!
//! Three shapes are supported: a locale-style string (the default), ISO 8601,
//! and an arbitrary strftime pattern rendered by [`token::strftime`].
//!
//! [`token::strftime`]: super::token::strftime

use super::token::{strftime, Timezone};
use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Access-log timestamp used by the `common` and `combined` formatters
pub const ACCESS_LOG_PATTERN: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use rust_handle_logger::core::TimestampFormat;
/// use chrono::Local;
///
/// let format = TimestampFormat::Iso;
/// let timestamp = format.format(&Local::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `10/19/2026, 3:04:05 PM` on the local clock
    #[default]
    Locale,

    /// ISO 8601 in UTC with milliseconds: `2026-10-19T15:04:05.123Z`
    Iso,

    /// strftime pattern with an explicit clock
    Pattern { pattern: String, timezone: Timezone },
}

impl TimestampFormat {
    /// Build from a formatter's `timestamp` directive.
    ///
    /// `"ISO"` selects ISO 8601; any other pattern is a strftime pattern.
    #[must_use]
    pub fn from_directive(pattern: Option<&str>, timezone: Option<&str>) -> Self {
        match pattern {
            None => TimestampFormat::Locale,
            Some(p) if p.eq_ignore_ascii_case("iso") => TimestampFormat::Iso,
            Some(p) => TimestampFormat::Pattern {
                pattern: p.to_string(),
                timezone: timezone
                    .and_then(|tz| tz.parse().ok())
                    .unwrap_or_default(),
            },
        }
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Locale => datetime.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            TimestampFormat::Iso => datetime
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            TimestampFormat::Pattern { pattern, timezone } => {
                strftime(pattern, *timezone, datetime)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Local> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            .with_timezone(&Local)
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_iso_format() {
        let result = TimestampFormat::Iso.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_pattern_format_utc() {
        let format = TimestampFormat::from_directive(Some("%Y/%m/%d %H:%M %z"), Some("GMT"));
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30 +0000");
    }

    #[test]
    fn test_access_log_pattern() {
        let format = TimestampFormat::Pattern {
            pattern: ACCESS_LOG_PATTERN.to_string(),
            timezone: Timezone::Utc,
        };
        assert_eq!(
            format.format(&fixed_datetime()),
            "08/Jan/2025:10:30:45 +0000"
        );
    }

    #[test]
    fn test_locale_format_shape() {
        let result = TimestampFormat::Locale.format(&fixed_datetime());
        assert!(result.contains("/2025, "));
        assert!(result.ends_with("AM") || result.ends_with("PM"));
    }

    #[test]
    fn test_from_directive() {
        assert_eq!(TimestampFormat::from_directive(None, None), TimestampFormat::Locale);
        assert_eq!(
            TimestampFormat::from_directive(Some("ISO"), Some("UTC")),
            TimestampFormat::Iso
        );
        assert_eq!(
            TimestampFormat::from_directive(Some("%H"), None),
            TimestampFormat::Pattern {
                pattern: "%H".to_string(),
                timezone: Timezone::Local
            }
        );
    }

    #[test]
    fn test_default_is_locale() {
        assert_eq!(TimestampFormat::default(), TimestampFormat::Locale);
    }
}
