//! Discovery of the `ffmpeg` and `ffprobe` executables.
//!
//! Each binary is resolved in order from:
//! 1. an explicit path in [`ExecutablesConfig`]
//! 2. the configured directory
//! 3. the process-wide directory set with [`set_executables_directory`]
//! 4. `PATH`, via [`which`]

use once_cell::sync::Lazy;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

use crate::config::ExecutablesConfig;
use crate::conversion::ConversionError;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

static EXECUTABLES_DIRECTORY: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// Sets the directory searched for executables by every [`DefaultLocator`].
pub fn set_executables_directory(directory: Option<PathBuf>) {
    match EXECUTABLES_DIRECTORY.write() {
        Ok(mut guard) => *guard = directory,
        Err(poisoned) => *poisoned.into_inner() = directory,
    }
}

/// The process-wide executables directory, if one was set.
pub fn executables_directory() -> Option<PathBuf> {
    match EXECUTABLES_DIRECTORY.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Resolved locations of both executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executables {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Resolves the executables a conversion runs.
pub trait ExecutableLocator: Send + Sync + Debug {
    /// # Errors
    ///
    /// Returns [`ConversionError::NotFound`] naming the missing executable and
    /// every place that was searched.
    fn resolve(&self) -> Result<Executables, ConversionError>;
}

/// Locator driven by [`ExecutablesConfig`].
#[derive(Debug, Clone, Default)]
pub struct DefaultLocator {
    config: ExecutablesConfig,
}

impl DefaultLocator {
    pub fn new(config: ExecutablesConfig) -> Self {
        Self { config }
    }

    /// Resolves a single executable by name.
    pub fn locate(&self, name: &str) -> Result<PathBuf, ConversionError> {
        let explicit = match name {
            FFMPEG => self.config.ffmpeg_path.as_deref(),
            FFPROBE => self.config.ffprobe_path.as_deref(),
            _ => None,
        };

        let mut searched = Vec::new();

        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            searched.push(path.display().to_string());
        }

        let directories = [self.config.directory.clone(), executables_directory()];
        for directory in directories.iter().flatten() {
            let candidate = directory.join(executable_file_name(name));
            if candidate.is_file() {
                debug!(executable = name, path = %candidate.display(), "Found executable in directory");
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }

        match which::which(name) {
            Ok(path) => {
                debug!(executable = name, path = %path.display(), "Found executable on PATH");
                Ok(path)
            }
            Err(_) => {
                searched.push("PATH".to_string());
                Err(ConversionError::NotFound {
                    executable: name.to_string(),
                    searched: searched.join(", "),
                })
            }
        }
    }
}

impl ExecutableLocator for DefaultLocator {
    fn resolve(&self) -> Result<Executables, ConversionError> {
        Ok(Executables {
            ffmpeg: self.locate(FFMPEG)?,
            ffprobe: self.locate(FFPROBE)?,
        })
    }
}

/// Locator returning fixed paths without touching the filesystem.
#[derive(Debug, Clone)]
pub struct FixedLocator(pub Executables);

impl ExecutableLocator for FixedLocator {
    fn resolve(&self) -> Result<Executables, ConversionError> {
        Ok(self.0.clone())
    }
}

fn executable_file_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}
