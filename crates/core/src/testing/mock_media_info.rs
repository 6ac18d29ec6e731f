//! Mock media info provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::conversion::ConversionError;
use crate::media::{AudioStreamInfo, MediaInfo, MediaInfoProvider, VideoStreamInfo};

/// Mock implementation of [`MediaInfoProvider`].
///
/// Returns pre-configured media info by path, records every probed path, and
/// can be told to fail the next probe.
///
/// # Example
///
/// ```rust,ignore
/// use ffconv_core::testing::MockMediaInfoProvider;
///
/// let provider = MockMediaInfoProvider::new();
/// provider.set_media_info(MockMediaInfoProvider::video_file("/in.mp4", 1280, 720)).await;
///
/// let info = provider.media_info(Path::new("/in.mp4")).await?;
/// assert_eq!(provider.probed_paths().await.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockMediaInfoProvider {
    /// Pre-configured results by path.
    media_infos: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    /// Paths passed to `media_info`, in call order.
    probed: Arc<RwLock<Vec<PathBuf>>>,
    /// If set, the next probe will fail with this reason.
    next_error: Arc<RwLock<Option<String>>>,
}

impl Default for MockMediaInfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaInfoProvider {
    pub fn new() -> Self {
        Self {
            media_infos: Arc::new(RwLock::new(HashMap::new())),
            probed: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Registers `info` under its own path.
    pub async fn set_media_info(&self, info: MediaInfo) {
        self.media_infos
            .write()
            .await
            .insert(info.path.clone(), info);
    }

    /// Configure the next probe to fail.
    pub async fn set_next_error(&self, reason: impl Into<String>) {
        *self.next_error.write().await = Some(reason.into());
    }

    /// Get all probed paths.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }

    /// A 13 second file with one video stream (index 0) and one stereo
    /// audio stream (index 1).
    pub fn video_file(path: impl Into<PathBuf>, width: u32, height: u32) -> MediaInfo {
        let duration = Duration::from_secs(13);
        MediaInfo {
            path: path.into(),
            format: "mov".to_string(),
            duration,
            size_bytes: 1024 * 1024,
            videos: vec![VideoStreamInfo {
                index: 0,
                codec: "h264".to_string(),
                width,
                height,
                framerate: 25.0,
                bitrate: 1_000_000,
                duration,
                pixel_format: Some("yuv420p".to_string()),
                ratio: None,
            }],
            audios: vec![AudioStreamInfo {
                index: 1,
                codec: "aac".to_string(),
                bitrate: 128_000,
                duration,
                sample_rate: 48_000,
                channels: 2,
                language: None,
            }],
            subtitles: Vec::new(),
        }
    }
}

#[async_trait]
impl MediaInfoProvider for MockMediaInfoProvider {
    async fn media_info(&self, path: &Path) -> Result<MediaInfo, ConversionError> {
        self.probed.write().await.push(path.to_path_buf());

        if let Some(reason) = self.next_error.write().await.take() {
            return Err(ConversionError::probe_failed(path, reason));
        }

        self.media_infos
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| ConversionError::probe_failed(path, "no media info configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_configured_info() {
        let provider = MockMediaInfoProvider::new();
        provider
            .set_media_info(MockMediaInfoProvider::video_file("/in.mp4", 640, 360))
            .await;

        let info = provider.media_info(Path::new("/in.mp4")).await.unwrap();
        assert_eq!(info.videos[0].width, 640);
        assert_eq!(provider.probed_paths().await, vec![PathBuf::from("/in.mp4")]);
    }

    #[tokio::test]
    async fn test_unknown_path_and_next_error() {
        let provider = MockMediaInfoProvider::new();
        assert!(provider.media_info(Path::new("/missing.mp4")).await.is_err());

        provider
            .set_media_info(MockMediaInfoProvider::video_file("/in.mp4", 640, 360))
            .await;
        provider.set_next_error("boom").await;
        assert!(provider.media_info(Path::new("/in.mp4")).await.is_err());
        assert!(provider.media_info(Path::new("/in.mp4")).await.is_ok());
    }
}
