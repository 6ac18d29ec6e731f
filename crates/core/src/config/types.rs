use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::conversion::ConversionSettings;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executables: ExecutablesConfig,
    #[serde(default)]
    pub conversion: ConversionSettings,
}

/// Where to find `ffmpeg` and `ffprobe`.
///
/// Explicit paths win over `directory`; anything left unresolved is looked up
/// in the process-wide executables directory and then on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutablesConfig {
    /// Directory containing both executables.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

impl ExecutablesConfig {
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_paths(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            directory: None,
            ffmpeg_path: Some(ffmpeg_path.into()),
            ffprobe_path: Some(ffprobe_path.into()),
        }
    }
}
