//! Write finished archives to disk.
//!
//! Bytes are written to a temporary file next to the destination and renamed
//! into place only once fully flushed, so a failed export never leaves a
//! partial `.xlsx` behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::{ExportError, Result};

const FILE_PREFIX: &str = "Statement";
const FILE_EXTENSION: &str = "xlsx";
const MAX_SUFFIX: u32 = 100;

/// A persisted export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

/// Replace every character that is not ASCII alphanumeric with `_`.
pub fn sanitize_name(source_name: &str) -> String {
    source_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `Statement_<sanitized-source-name>_<timestamp>.xlsx`, timestamp in milliseconds.
pub fn export_file_name(source_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{FILE_PREFIX}_{}_{}.{FILE_EXTENSION}",
        sanitize_name(source_name),
        at.timestamp_millis()
    )
}

/// Write `bytes` into `dir` under `file_name`.
///
/// If `file_name` is already taken a numeric suffix is added before the
/// extension instead of overwriting.
///
/// # Errors
/// Returns [`ExportError::Persist`] if the directory cannot be created or the
/// file cannot be written. No partial file is left behind.
pub fn persist(bytes: &[u8], dir: &Path, file_name: &str) -> Result<ExportedFile> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::persist(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ExportError::persist(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ExportError::persist(tmp.path(), e))?;

    let (stem, ext) = file_name
        .rsplit_once('.')
        .unwrap_or((file_name, FILE_EXTENSION));

    for attempt in 0..=MAX_SUFFIX {
        let name = if attempt == 0 {
            file_name.to_string()
        } else {
            format!("{stem}_{attempt}.{ext}")
        };
        let target = dir.join(&name);
        match tmp.persist_noclobber(&target) {
            Ok(_) => {
                tracing::info!(path = %target.display(), bytes = bytes.len(), "wrote export");
                return Ok(ExportedFile {
                    path: target,
                    file_name: name,
                    size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
                });
            }
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %target.display(), "export name taken, trying next suffix");
                tmp = err.file;
            }
            Err(err) => return Err(ExportError::persist(target, err.error)),
        }
    }

    Err(ExportError::persist(
        dir.join(file_name),
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free file name for export",
        ),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case("March 2024.pdf", "March_2024_pdf")]
    #[test_case("HDFC/acct#42", "HDFC_acct_42")]
    #[test_case("plain", "plain")]
    #[test_case("über", "_ber")]
    #[test_case("", "")]
    fn test_sanitize_name(input: &str, expected: &str) {
        assert_eq!(sanitize_name(input), expected);
    }

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(
            export_file_name("Jan statement", at),
            format!("Statement_Jan_statement_{}.xlsx", at.timestamp_millis())
        );
    }

    #[test]
    fn test_persist_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let file = persist(b"PK data", &out, "Statement_x_1.xlsx").unwrap();
        assert_eq!(file.path, out.join("Statement_x_1.xlsx"));
        assert_eq!(file.size, 7);
        assert_eq!(std::fs::read(&file.path).unwrap(), b"PK data");
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_persist_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = persist(b"one", dir.path(), "Statement_x_1.xlsx").unwrap();
        let second = persist(b"two", dir.path(), "Statement_x_1.xlsx").unwrap();
        assert_eq!(second.file_name, "Statement_x_1_1.xlsx");
        assert_eq!(std::fs::read(&first.path).unwrap(), b"one");
        assert_eq!(std::fs::read(&second.path).unwrap(), b"two");
    }

    #[test]
    fn test_persist_into_file_path_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let err = persist(b"data", &blocker, "Statement_x_1.xlsx").unwrap_err();
        assert!(matches!(err, ExportError::Persist { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
