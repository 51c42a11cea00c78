//! Export settings.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

const APP_DIR: &str = "statement-xlsx";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_DATE_FORMAT: &str = "%-d/%-m/%Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the `.xlsx` file is written to. See [`ExportConfig::output_dir`].
    pub output_dir: Option<PathBuf>,
    /// Currency shown for transactions that carry none.
    pub default_currency: String,
    /// `chrono` strftime pattern for the Date column.
    pub date_format: String,
    /// UTC offset such as `+05:30` the Date column is shown in. `None` uses
    /// the system's local time zone.
    pub utc_offset: Option<String>,
    /// DEFLATE level 0-9; `None` uses the library default.
    pub compression_level: Option<i32>,
    /// Read the archive back and check the package structure before writing it.
    pub verify_package: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_currency: DEFAULT_CURRENCY.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc_offset: None,
            compression_level: None,
            verify_package: true,
        }
    }
}

impl ExportConfig {
    /// Load and validate a JSON config file.
    ///
    /// # Errors
    /// - The file cannot be read or is not valid JSON.
    /// - A value fails [`ExportConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded export config");
        Ok(config)
    }

    /// # Errors
    /// Returns [`ExportError::Config`] for an unusable date format or UTC
    /// offset, an empty default currency or a compression level outside 0-9.
    pub fn validate(&self) -> Result<()> {
        if self.date_format.is_empty()
            || StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ExportError::Config(format!(
                "invalid date format '{}'",
                self.date_format
            )));
        }
        if let Some(offset) = &self.utc_offset {
            parse_offset(offset)?;
        }
        if self.default_currency.trim().is_empty() {
            return Err(ExportError::Config("default currency is empty".into()));
        }
        if let Some(level) = self.compression_level {
            if !(0..=9).contains(&level) {
                return Err(ExportError::Config(format!(
                    "compression level {level} is outside 0-9"
                )));
            }
        }
        Ok(())
    }

    /// `at` as wall-clock time in the configured offset, else in local time.
    ///
    /// # Errors
    /// Returns [`ExportError::Config`] if `utc_offset` does not parse.
    pub fn local_time(&self, at: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
        let offset = match &self.utc_offset {
            Some(offset) => parse_offset(offset)?,
            None => *at.with_timezone(&Local).offset(),
        };
        Ok(at.with_timezone(&offset))
    }

    /// Configured directory, else `<cache dir>/statement-xlsx`, else the OS temp dir.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(std::env::temp_dir)
        })
    }
}

fn parse_offset(offset: &str) -> Result<FixedOffset> {
    offset
        .parse()
        .map_err(|e| ExportError::Config(format!("invalid utc offset '{offset}': {e}")))
}
