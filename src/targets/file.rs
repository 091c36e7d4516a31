//! File target and the append stream shared with rotating files

use crate::core::{EventKind, LogRecord, LoggerError, Result, Target, TargetContext};
use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

pub const DEFAULT_EXTENSION: &str = ".log";

fn escape_line_breaks(line: &str) -> Cow<'_, str> {
    if !line.contains(['\n', '\r']) {
        return Cow::Borrowed(line);
    }
    Cow::Owned(line.replace('\n', "\\n").replace('\r', "\\r"))
}

/// Where a file-backed handle writes: either an explicit `path`, or
/// `directory` + `fileName` + `fileExtension`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub directory: PathBuf,
    pub file_name: String,
    pub extension: String,
}

impl FileSpec {
    pub fn new(
        directory: impl Into<PathBuf>,
        file_name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
            extension: normalize_extension(extension.into()),
        }
    }

    /// Split an explicit path into its parts
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                LoggerError::config("file target", format!("'{}' has no file name", path.display()))
            })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self {
            directory,
            file_name: file_name.to_string(),
            extension,
        })
    }

    /// Name of the running executable, used when no file name is configured
    #[must_use]
    pub fn default_file_name() -> String {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().and_then(|s| s.to_str()).map(String::from))
            .unwrap_or_else(|| "app".to_string())
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.file_name, self.extension))
    }
}

fn normalize_extension(extension: String) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension
    } else {
        format!(".{}", extension)
    }
}

/// Append-only stream opened on first write
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn open(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| {
                    LoggerError::file_appender(
                        self.path.display().to_string(),
                        format!("Failed to open: {}", e),
                    )
                })?;
            tracing::debug!(path = %self.path.display(), "opened log file");
            self.writer = Some(BufWriter::new(file));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))
    }

    /// Write one line and flush it through to the file.
    ///
    /// Line breaks inside `line` are written as `\n` and `\r` so one record
    /// always occupies exactly one line of the file.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let path = self.path.display().to_string();
        let line = escape_line_breaks(line);
        let writer = self.open()?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(LINE_ENDING.as_bytes()))
            .and_then(|()| writer.flush())
            .map_err(|e| LoggerError::file_appender(path, format!("Failed to write: {}", e)))
    }

    /// Flush and drop the writer, firing `finish` then `close`
    pub fn close(&mut self, ctx: &mut TargetContext<'_>) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let flushed = writer.flush().map_err(|e| {
            LoggerError::file_appender(
                self.path.display().to_string(),
                format!("Failed to flush on close: {}", e),
            )
        });
        ctx.lifecycle(EventKind::Finish);
        drop(writer);
        ctx.lifecycle(EventKind::Close);
        flushed
    }
}

/// Appends each rendered record to a single file
#[derive(Debug)]
pub struct FileTarget {
    stream: FileStream,
}

impl FileTarget {
    pub fn new(spec: &FileSpec) -> Self {
        Self {
            stream: FileStream::new(spec.path()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.stream.path()
    }
}

impl Target for FileTarget {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()> {
        self.stream.write_line(record.rendered())?;
        ctx.logged(record);
        Ok(())
    }

    fn flush(&mut self, ctx: &mut TargetContext<'_>) -> Result<()> {
        if self.stream.is_open() {
            ctx.lifecycle(EventKind::Drain);
        }
        Ok(())
    }

    fn close(&mut self, ctx: &mut TargetContext<'_>) -> Result<()> {
        self.stream.close(ctx)
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_spec_from_path() {
        let spec = FileSpec::from_path(Path::new("/var/log/app.log")).unwrap();
        assert_eq!(spec.directory, PathBuf::from("/var/log"));
        assert_eq!(spec.file_name, "app");
        assert_eq!(spec.extension, ".log");
        assert_eq!(spec.path(), PathBuf::from("/var/log/app.log"));

        let bare = FileSpec::from_path(Path::new("server")).unwrap();
        assert_eq!(bare.directory, PathBuf::from("."));
        assert_eq!(bare.extension, "");
    }

    #[test]
    fn test_extension_normalized() {
        let spec = FileSpec::new("/tmp", "app", "txt");
        assert_eq!(spec.extension, ".txt");
    }

    #[test]
    fn test_stream_opens_lazily_and_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.log");
        let mut stream = FileStream::new(&path);
        assert!(!path.exists());

        stream.write_line("one").unwrap();
        stream.write_line("two").unwrap();
        assert!(stream.is_open());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("one{0}two{0}", LINE_ENDING));
    }

    #[test]
    fn test_stream_keeps_one_record_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forged.log");
        let mut stream = FileStream::new(&path);

        stream.write_line("user=bob\r\nINFO admin logged in").unwrap();
        stream.write_line("tab\tstays").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            format!("user=bob\\r\\nINFO admin logged in{0}tab\tstays{0}", LINE_ENDING)
        );
    }

    #[test]
    fn test_escape_line_breaks_borrows_plain_lines() {
        assert!(matches!(escape_line_breaks("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_line_breaks("a\nb"), "a\\nb");
    }
}
