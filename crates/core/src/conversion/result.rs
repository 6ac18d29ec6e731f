use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConversionError;
use crate::media::{MediaInfo, MediaInfoProvider};

/// Outcome of a successful conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// The exact argument string ffmpeg was started with.
    pub arguments: String,
    /// `None` when the output went to a pipe.
    pub output_path: Option<PathBuf>,
}

impl ConversionResult {
    /// Wall-clock time the conversion took.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Probes the produced file.
    pub async fn output_media_info(
        &self,
        provider: &dyn MediaInfoProvider,
    ) -> Result<MediaInfo, ConversionError> {
        let path = self.output_path.as_deref().ok_or_else(|| {
            ConversionError::invalid_operation("conversion output was piped, there is no file to probe")
        })?;
        provider.media_info(path).await
    }
}
