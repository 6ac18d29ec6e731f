//! [`MediaInfoProvider`] backed by the ffprobe executable.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::traits::MediaInfoProvider;
use super::types::{AudioStreamInfo, MediaInfo, SubtitleStreamInfo, VideoStreamInfo};
use crate::conversion::ConversionError;
use crate::executables::ExecutableLocator;

/// Runs `ffprobe -print_format json -show_format -show_streams` and parses
/// its output.
#[derive(Debug, Clone)]
pub struct FfprobeProvider {
    ffprobe_path: PathBuf,
}

impl FfprobeProvider {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Creates a provider for the ffprobe resolved by `locator`.
    pub fn from_locator(locator: &dyn ExecutableLocator) -> Result<Self, ConversionError> {
        Ok(Self::new(locator.resolve()?.ffprobe))
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    /// Parses ffprobe JSON output into MediaInfo.
    pub fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConversionError> {
        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            ConversionError::probe_failed(path, format!("Failed to parse ffprobe output: {}", e))
        })?;

        let duration = probe
            .format
            .duration
            .as_deref()
            .and_then(parse_seconds)
            .unwrap_or_default();

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let format = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown")
            .to_string();

        let mut info = MediaInfo {
            path: path.to_path_buf(),
            format,
            duration,
            size_bytes,
            ..Default::default()
        };

        for stream in probe.streams {
            let stream_duration = stream
                .duration
                .as_deref()
                .and_then(parse_seconds)
                .unwrap_or(duration);
            let bitrate = stream
                .bit_rate
                .as_ref()
                .and_then(|b| b.parse::<u64>().ok())
                .unwrap_or(0);
            let language = stream.tags.as_ref().and_then(|t| t.language.clone());

            match stream.codec_type.as_str() {
                "video" => info.videos.push(VideoStreamInfo {
                    index: stream.index,
                    codec: stream.codec_name.unwrap_or_default(),
                    width: stream.width.unwrap_or(0),
                    height: stream.height.unwrap_or(0),
                    framerate: stream
                        .avg_frame_rate
                        .as_deref()
                        .and_then(parse_frame_rate)
                        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
                        .unwrap_or(0.0),
                    bitrate,
                    duration: stream_duration,
                    pixel_format: stream.pix_fmt,
                    ratio: stream
                        .display_aspect_ratio
                        .filter(|r| r != "0:1" && r != "N/A"),
                }),
                "audio" => info.audios.push(AudioStreamInfo {
                    index: stream.index,
                    codec: stream.codec_name.unwrap_or_default(),
                    bitrate,
                    duration: stream_duration,
                    sample_rate: stream
                        .sample_rate
                        .as_ref()
                        .and_then(|r| r.parse::<u32>().ok())
                        .unwrap_or(0),
                    channels: stream.channels.unwrap_or(0),
                    language,
                }),
                "subtitle" => info.subtitles.push(SubtitleStreamInfo {
                    index: stream.index,
                    codec: stream.codec_name.unwrap_or_default(),
                    language,
                }),
                other => debug!(codec_type = other, index = stream.index, "Skipping stream"),
            }
        }

        Ok(info)
    }
}

#[async_trait]
impl MediaInfoProvider for FfprobeProvider {
    async fn media_info(&self, path: &Path) -> Result<MediaInfo, ConversionError> {
        if !path.exists() {
            return Err(ConversionError::probe_failed(path, "file does not exist"));
        }

        debug!(path = %path.display(), "Probing media file");
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConversionError::NotFound {
                        executable: "ffprobe".to_string(),
                        searched: self.ffprobe_path.display().to_string(),
                    }
                } else {
                    ConversionError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConversionError::probe_failed(
                path,
                format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    format_name: String,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Deserialize)]
struct ProbeStream {
    index: usize,
    codec_type: String,
    codec_name: Option<String>,
    bit_rate: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    display_aspect_ratio: Option<String>,
    tags: Option<ProbeTags>,
}

#[derive(Deserialize)]
struct ProbeTags {
    language: Option<String>,
}

fn parse_seconds(value: &str) -> Option<Duration> {
    value
        .parse::<f64>()
        .ok()
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
}

/// Parses frame rates like "24000/1001" or "30".
fn parse_frame_rate(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().ok()?;
            let den = den.parse::<f64>().ok()?;
            if den > 0.0 && num > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => value.parse::<f64>().ok().filter(|r| *r > 0.0),
    }
}
