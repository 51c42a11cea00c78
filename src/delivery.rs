//! Hand a persisted export to the platform: a native "save to location"
//! picker first, the system share/open handler as fallback.
//!
//! A user cancelling the dialog is reported as [`DeliveryOutcome::Cancelled`],
//! never as an error.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ExportError, Result};
use crate::persist::ExportedFile;

/// Result of a delivery attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The file was handed off. `location` is set when the file was copied.
    Delivered {
        channel: &'static str,
        location: Option<PathBuf>,
    },
    /// The user dismissed the save/share dialog.
    Cancelled { channel: &'static str },
}

impl DeliveryOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// A save or share mechanism.
pub trait Delivery: Send + Sync {
    /// Short name used in logs and errors.
    fn channel(&self) -> &'static str;

    /// Whether this mechanism can be used on the current platform.
    fn is_available(&self) -> bool;

    /// Deliver `file`.
    ///
    /// # Errors
    /// Returns [`ExportError::Delivery`] when the mechanism fails.
    fn deliver(&self, file: &ExportedFile) -> Result<DeliveryOutcome>;
}

/// Asks the user where to save. `None` means the dialog was cancelled.
pub trait FolderPicker: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    fn pick_folder(&self, suggested_name: &str) -> Option<PathBuf>;
}

/// Picker that always answers with the same folder.
#[derive(Debug, Clone)]
pub struct FixedFolder(pub PathBuf);

impl FolderPicker for FixedFolder {
    fn pick_folder(&self, _suggested_name: &str) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Native save: copy the export into a folder chosen by a [`FolderPicker`].
#[derive(Debug, Clone)]
pub struct SaveToFolder<P> {
    picker: P,
}

impl<P: FolderPicker> SaveToFolder<P> {
    pub fn new(picker: P) -> Self {
        Self { picker }
    }
}

impl<P: FolderPicker> Delivery for SaveToFolder<P> {
    fn channel(&self) -> &'static str {
        "save"
    }

    fn is_available(&self) -> bool {
        self.picker.is_available()
    }

    fn deliver(&self, file: &ExportedFile) -> Result<DeliveryOutcome> {
        let Some(folder) = self.picker.pick_folder(&file.file_name) else {
            return Ok(DeliveryOutcome::Cancelled {
                channel: self.channel(),
            });
        };
        let target = folder.join(&file.file_name);
        if target == file.path {
            return Ok(DeliveryOutcome::Delivered {
                channel: self.channel(),
                location: Some(target),
            });
        }
        std::fs::create_dir_all(&folder)
            .and_then(|()| std::fs::copy(&file.path, &target))
            .map_err(|e| ExportError::Delivery {
                channel: self.channel(),
                reason: format!("{}: {e}", target.display()),
            })?;
        Ok(DeliveryOutcome::Delivered {
            channel: self.channel(),
            location: Some(target),
        })
    }
}

/// Share/open fallback: launches the platform's default handler for the file.
#[derive(Debug, Clone)]
pub struct SystemShare {
    program: String,
    args: Vec<String>,
}

impl Default for SystemShare {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::with_program("open", &[])
        } else if cfg!(target_os = "windows") {
            Self::with_program("cmd", &["/C", "start", ""])
        } else {
            Self::with_program("xdg-open", &[])
        }
    }
}

impl SystemShare {
    /// Use `program args... <file>` as the share handler.
    pub fn with_program(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

impl Delivery for SystemShare {
    fn channel(&self) -> &'static str {
        "share"
    }

    fn is_available(&self) -> bool {
        find_on_path(&self.program).is_some()
    }

    fn deliver(&self, file: &ExportedFile) -> Result<DeliveryOutcome> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&file.path)
            .status()
            .map_err(|e| ExportError::Delivery {
                channel: self.channel(),
                reason: format!("could not run {}: {e}", self.program),
            })?;
        if !status.success() {
            return Err(ExportError::Delivery {
                channel: self.channel(),
                reason: format!("{} exited with {status}", self.program),
            });
        }
        Ok(DeliveryOutcome::Delivered {
            channel: self.channel(),
            location: None,
        })
    }
}

fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .flat_map(|dir| {
            let plain = dir.join(program);
            let exe = dir.join(format!("{program}.exe"));
            [plain, exe]
        })
        .find(|p| p.is_file())
}

/// Ordered fallbacks: the first available mechanism handles the file.
#[derive(Default)]
pub struct DeliveryChain {
    strategies: Vec<Box<dyn Delivery>>,
}

impl DeliveryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native save, then the system share handler.
    pub fn platform_default<P: FolderPicker + 'static>(picker: P) -> Self {
        Self::new()
            .with(SaveToFolder::new(picker))
            .with(SystemShare::default())
    }

    #[must_use]
    pub fn with(mut self, strategy: impl Delivery + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// # Errors
    /// - [`ExportError::DeliveryUnavailable`] when no mechanism is available.
    /// - Any error of the selected mechanism.
    pub fn deliver(&self, file: &ExportedFile) -> Result<DeliveryOutcome> {
        let Some(strategy) = self.strategies.iter().find(|s| s.is_available()) else {
            tracing::warn!(path = %file.path.display(), "no delivery mechanism available");
            return Err(ExportError::DeliveryUnavailable);
        };
        tracing::debug!(channel = strategy.channel(), "delivering export");
        let outcome = strategy.deliver(file)?;
        if outcome.is_cancelled() {
            tracing::info!(channel = strategy.channel(), "delivery cancelled by user");
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for DeliveryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.channel()))
            .finish()
    }
}
