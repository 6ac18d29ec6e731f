use async_trait::async_trait;
use std::path::Path;

use super::types::MediaInfo;
use crate::conversion::ConversionError;

/// Something that can describe the streams of a media file.
#[async_trait]
pub trait MediaInfoProvider: Send + Sync {
    /// Probes `path`.
    ///
    /// Implementations fail with [`ConversionError::ProbeFailed`] when the
    /// file cannot be read or described.
    async fn media_info(&self, path: &Path) -> Result<MediaInfo, ConversionError>;
}
