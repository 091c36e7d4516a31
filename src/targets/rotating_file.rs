//! Rotating file target
//!
//! Two policies, exactly one per handle:
//!
//! - **interval**: the file name carries the date portion of the current
//!   period, `{fileName}_{date}{ext}`, or a custom strftime `fileNamePattern`.
//!   A new stream is opened whenever the computed name changes.
//! - **size**: files are numbered `{fileName}{ext}.{N}`. Before each write the
//!   current file is checked; once it reaches `maxSize` the next number is
//!   used. Going past `maxFiles` is fatal and every later write fails as well.

use super::file::{FileSpec, FileStream};
use crate::core::token::{strftime, Timezone};
use crate::core::{LogRecord, LoggerError, Result, Target, TargetContext};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, Weekday};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Period length of an interval rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

/// When to move on to a new file
///
/// # Examples
///
/// ```
/// use rust_handle_logger::targets::{Interval, RotationPolicy};
/// use chrono::Weekday;
///
/// // New file every 10 KiB, at most 5 files
/// let by_size = RotationPolicy::size(10 * 1024, 5);
///
/// // New file every week, starting on Monday
/// let weekly = RotationPolicy::interval(Interval::Week).with_rotate_day(Weekday::Mon);
/// # let _ = (by_size, weekly);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationPolicy {
    Size {
        max_size: u64,
        max_files: u32,
    },
    Interval {
        interval: Interval,
        /// First day of a week period
        rotate_day: Weekday,
        /// strftime pattern producing the whole file name
        pattern: Option<String>,
    },
}

impl RotationPolicy {
    #[must_use]
    pub fn size(max_size: u64, max_files: u32) -> Self {
        RotationPolicy::Size {
            max_size,
            max_files,
        }
    }

    #[must_use]
    pub fn interval(interval: Interval) -> Self {
        RotationPolicy::Interval {
            interval,
            rotate_day: Weekday::Sun,
            pattern: None,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_rotate_day(mut self, day: Weekday) -> Self {
        if let RotationPolicy::Interval { rotate_day, .. } = &mut self {
            *rotate_day = day;
        }
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_pattern(mut self, file_name_pattern: impl Into<String>) -> Self {
        if let RotationPolicy::Interval { pattern, .. } = &mut self {
            *pattern = Some(file_name_pattern.into());
        }
        self
    }
}

/// Date portion of an interval file name for the period containing `date`
#[must_use]
pub fn date_portion(date: &DateTime<Local>, interval: Interval, rotate_day: Weekday) -> String {
    match interval {
        Interval::Year => date.format("%Y").to_string(),
        Interval::Month => date.format("%Y-%m").to_string(),
        Interval::Week => {
            let since = (date.weekday().num_days_from_sunday() + 7
                - rotate_day.num_days_from_sunday())
                % 7;
            (date.date_naive() - ChronoDuration::days(i64::from(since)))
                .format("%Y-%m-%d")
                .to_string()
        }
        Interval::Day => date.format("%Y-%m-%d").to_string(),
        Interval::Hour => date.format("%Y-%m-%dT%H").to_string(),
        Interval::Minute => date.format("%Y-%m-%dT%H-%M").to_string(),
        Interval::Second => date.format("%Y-%m-%dT%H-%M-%S").to_string(),
    }
}

pub struct RotatingFileTarget {
    spec: FileSpec,
    policy: RotationPolicy,
    stream: Option<FileStream>,
    /// Current size-rotation number, recovered from disk on first use
    log_num: Option<u32>,
    exhausted: bool,
}

impl RotatingFileTarget {
    pub fn new(spec: FileSpec, policy: RotationPolicy) -> Self {
        Self {
            spec,
            policy,
            stream: None,
            log_num: None,
            exhausted: false,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Path of the file the next write would go to, if a stream is open
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.stream.as_ref().map(|s| s.path().to_path_buf())
    }

    fn size_path(&self, num: u32) -> PathBuf {
        self.spec.directory.join(format!(
            "{}{}.{}",
            self.spec.file_name, self.spec.extension, num
        ))
    }

    fn interval_path(&self, date: &DateTime<Local>) -> PathBuf {
        match &self.policy {
            RotationPolicy::Interval {
                pattern: Some(pattern),
                ..
            } => self
                .spec
                .directory
                .join(strftime(pattern, Timezone::Local, date)),
            RotationPolicy::Interval {
                interval,
                rotate_day,
                pattern: None,
            } => self.spec.directory.join(format!(
                "{}_{}{}",
                self.spec.file_name,
                date_portion(date, *interval, *rotate_day),
                self.spec.extension
            )),
            RotationPolicy::Size { .. } => self.spec.path(),
        }
    }

    /// Highest `N` among existing `{fileName}{ext}.{N}` files.
    ///
    /// Not safe against another process rotating in the same directory.
    fn scan_log_num(&self) -> Result<Option<u32>> {
        let prefix = format!("{}{}.", self.spec.file_name, self.spec.extension);
        let entries = match fs::read_dir(&self.spec.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LoggerError::io_operation(
                    "scan log directory",
                    format!("Failed to read '{}'", self.spec.directory.display()),
                    e,
                ))
            }
        };
        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix(&prefix))
                    .and_then(|num| num.parse::<u32>().ok())
            })
            .max())
    }

    /// Swap the open stream for one at `path`, closing the old one
    fn switch_to(&mut self, path: PathBuf, ctx: &mut TargetContext<'_>) {
        if self.stream.as_ref().is_some_and(|s| s.path() == path) {
            return;
        }
        if let Some(mut old) = self.stream.take() {
            if let Err(e) = old.close(ctx) {
                ctx.error(e, None);
            }
        }
        self.stream = Some(FileStream::new(path));
    }

    fn size_target(
        &mut self,
        max_size: u64,
        max_files: u32,
        ctx: &mut TargetContext<'_>,
    ) -> Result<PathBuf> {
        let base = self.spec.path().display().to_string();
        let limit = || LoggerError::max_file_limit(base.clone(), max_files);
        if self.exhausted {
            return Err(limit());
        }

        let mut num = match self.log_num {
            Some(num) => num,
            None => self.scan_log_num()?.unwrap_or(1).max(1),
        };
        let current = fs::metadata(self.size_path(num)).map_or(0, |m| m.len());
        if current >= max_size {
            num += 1;
        }
        self.log_num = Some(num);

        if num > max_files {
            self.exhausted = true;
            let error = limit();
            if let Some(mut old) = self.stream.take() {
                if let Err(e) = old.close(ctx) {
                    ctx.error(e, None);
                }
            }
            return Err(error);
        }
        Ok(self.size_path(num))
    }
}

impl Target for RotatingFileTarget {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()> {
        let path = match self.policy {
            RotationPolicy::Size {
                max_size,
                max_files,
            } => self.size_target(max_size, max_files, ctx)?,
            RotationPolicy::Interval { .. } => self.interval_path(&record.date),
        };
        self.switch_to(path, ctx);

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Rotating file stream not initialized"))?;
        stream.write_line(record.rendered())?;
        ctx.logged(record);
        Ok(())
    }

    fn close(&mut self, ctx: &mut TargetContext<'_>) -> Result<()> {
        match self.stream.take() {
            Some(mut stream) => stream.close(ctx),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "rotatingFile"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_date_portions() {
        // Wednesday
        let date = local(2026, 10, 14, 9, 5, 7);
        assert_eq!(date_portion(&date, Interval::Year, Weekday::Sun), "2026");
        assert_eq!(date_portion(&date, Interval::Month, Weekday::Sun), "2026-10");
        assert_eq!(date_portion(&date, Interval::Day, Weekday::Sun), "2026-10-14");
        assert_eq!(date_portion(&date, Interval::Hour, Weekday::Sun), "2026-10-14T09");
        assert_eq!(
            date_portion(&date, Interval::Second, Weekday::Sun),
            "2026-10-14T09-05-07"
        );
    }

    #[test]
    fn test_week_anchored_to_rotate_day() {
        let wednesday = local(2026, 10, 14, 12, 0, 0);
        assert_eq!(date_portion(&wednesday, Interval::Week, Weekday::Sun), "2026-10-11");
        assert_eq!(date_portion(&wednesday, Interval::Week, Weekday::Mon), "2026-10-12");
        assert_eq!(date_portion(&wednesday, Interval::Week, Weekday::Wed), "2026-10-14");
        assert_eq!(date_portion(&wednesday, Interval::Week, Weekday::Thu), "2026-10-08");
    }

    #[test]
    fn test_interval_path_and_pattern() {
        let date = local(2026, 1, 2, 3, 4, 5);
        let spec = FileSpec::new("/logs", "api", ".log");

        let daily = RotatingFileTarget::new(spec.clone(), RotationPolicy::interval(Interval::Day));
        assert_eq!(daily.interval_path(&date), PathBuf::from("/logs/api_2026-01-02.log"));

        let custom = RotatingFileTarget::new(
            spec,
            RotationPolicy::interval(Interval::Day).with_pattern("api-%Y%m%d.txt"),
        );
        assert_eq!(custom.interval_path(&date), PathBuf::from("/logs/api-20260102.txt"));
    }

    #[test]
    fn test_scan_recovers_highest_number() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["app.log.1", "app.log.3", "app.log.x", "other.log.9"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let target = RotatingFileTarget::new(
            FileSpec::new(dir.path(), "app", ".log"),
            RotationPolicy::size(100, 5),
        );
        assert_eq!(target.scan_log_num().unwrap(), Some(3));
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = RotatingFileTarget::new(
            FileSpec::new(dir.path().join("missing"), "app", ".log"),
            RotationPolicy::size(100, 5),
        );
        assert_eq!(target.scan_log_num().unwrap(), None);
    }
}
