use crate::error::{AccessLogError, Result};
use rootcause::prelude::{Report, ResultExt};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Unparsed lines of a log file, in file order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogFile {
    lines: Vec<String>,
}

impl RawLogFile {
    #[cfg(test)]
    pub(crate) fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Read a log file into memory, one element per physical line.
///
/// Fails with [`AccessLogError::FileNotFound`] when the path does not name a
/// readable file and with [`AccessLogError::EmptyInput`] when it has no lines
/// or only blank ones. Only line terminators are stripped.
pub fn load(path: impl AsRef<Path>) -> Result<RawLogFile> {
    let path = path.as_ref();
    tracing::info!("Loading log file: {}", path.display());

    if !path.is_file() {
        tracing::error!("File not found at location: {}", path.display());
        return Err(Report::new(AccessLogError::FileNotFound(
            path.display().to_string(),
        )));
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            tracing::error!("Cannot open {}: {}", path.display(), e);
            return Err(Report::new(AccessLogError::FileNotFound(
                path.display().to_string(),
            )));
        }
        Err(e) => {
            return Err(AccessLogError::from(e))
                .attach_with(|| format!("Failed to open log file: {}", path.display()));
        }
    };

    let lines = read_lines(BufReader::new(file))
        .attach_with(|| format!("Failed to read log file: {}", path.display()))?;

    if lines.iter().all(|line| line.trim().is_empty()) {
        tracing::error!("Loaded data is empty from file: {}", path.display());
        return Err(Report::new(AccessLogError::EmptyInput(
            path.display().to_string(),
        )));
    }

    tracing::debug!("Raw data loaded with {} entries", lines.len());
    Ok(RawLogFile { lines })
}

fn read_lines(mut reader: impl BufRead) -> std::result::Result<Vec<String>, AccessLogError> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf)? {
            0 => break, // EOF
            _ => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                lines.push(String::from_utf8_lossy(&buf).into_owned());
            }
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::fixtures::{BINGBOT, PETALBOT};
    use std::io::Write;

    fn write_log(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_raw_data() {
        let file = write_log(&format!("{PETALBOT}\n{BINGBOT}\n"));
        let raw = load(file.path()).unwrap();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw.lines()[0], PETALBOT);
        assert_eq!(raw.lines()[1], BINGBOT);
    }

    #[test]
    fn test_load_keeps_unrecognised_lines() {
        let file = write_log("first\r\n\n  indented line  \nlast without newline");
        let raw = load(file.path()).unwrap();

        assert_eq!(
            raw.into_lines(),
            vec!["first", "", "  indented line  ", "last without newline"]
        );
    }

    #[test]
    fn test_load_no_data() {
        let file = write_log("");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err.current_context(), AccessLogError::EmptyInput(_)));
    }

    #[test]
    fn test_load_blank_only_file() {
        let file = write_log("\n  \r\n\t\n");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err.current_context(), AccessLogError::EmptyInput(_)));
    }

    #[test]
    fn test_invalid_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("non_existent_file.log");

        let err = load(&missing).unwrap_err();
        assert!(matches!(err.current_context(), AccessLogError::FileNotFound(_)));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err.current_context(), AccessLogError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"10.0.0.1 \xff\n").unwrap();
        file.flush().unwrap();

        let raw = load(file.path()).unwrap();
        assert_eq!(raw.lines(), ["10.0.0.1 \u{fffd}".to_string()]);
    }
}
