//! Stream metadata reported by a media info provider.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversion::{AudioStream, SubtitleStream, VideoStream};

/// Metadata of a single video stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    /// Index of the stream inside its file.
    pub index: usize,
    /// Codec name as reported by ffprobe (e.g. "h264").
    pub codec: String,
    pub width: u32,
    pub height: u32,
    /// Frames per second.
    pub framerate: f64,
    /// Bits per second, 0 when unknown.
    pub bitrate: u64,
    /// Zero when unknown.
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_format: Option<String>,
    /// Display aspect ratio such as "16:9".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
}

/// Metadata of a single audio stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub index: usize,
    pub codec: String,
    pub bitrate: u64,
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Metadata of a single subtitle stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubtitleStreamInfo {
    pub index: usize,
    pub codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Everything known about one media file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    /// First name of the container format list (e.g. "matroska").
    pub format: String,
    pub duration: Duration,
    pub size_bytes: u64,
    pub videos: Vec<VideoStreamInfo>,
    pub audios: Vec<AudioStreamInfo>,
    pub subtitles: Vec<SubtitleStreamInfo>,
}

impl MediaInfo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Video stream descriptors ready to be configured and added to a conversion.
    pub fn video_streams(&self) -> impl Iterator<Item = VideoStream> + '_ {
        self.videos
            .iter()
            .map(|info| VideoStream::from_info(&self.path, info))
    }

    pub fn audio_streams(&self) -> impl Iterator<Item = AudioStream> + '_ {
        self.audios
            .iter()
            .map(|info| AudioStream::from_info(&self.path, info))
    }

    pub fn subtitle_streams(&self) -> impl Iterator<Item = SubtitleStream> + '_ {
        self.subtitles
            .iter()
            .map(|info| SubtitleStream::from_info(&self.path, info))
    }

    /// The first video stream, if any.
    pub fn video_stream(&self) -> Option<VideoStream> {
        self.video_streams().next()
    }

    /// The first audio stream, if any.
    pub fn audio_stream(&self) -> Option<AudioStream> {
        self.audio_streams().next()
    }

    /// The widest video stream of the file.
    pub fn widest_video(&self) -> Option<&VideoStreamInfo> {
        self.videos.iter().max_by_key(|v| v.width)
    }
}

/// Reduces `width:height` to its lowest terms ("1920:1080" → "16:9").
pub fn aspect_ratio(width: u32, height: u32) -> Option<String> {
    if width == 0 || height == 0 {
        return None;
    }
    let divisor = gcd(width, height);
    Some(format!("{}:{}", width / divisor, height / divisor))
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(aspect_ratio(1920, 1080), Some("16:9".to_string()));
        assert_eq!(aspect_ratio(640, 480), Some("4:3".to_string()));
        assert_eq!(aspect_ratio(0, 480), None);
    }

    #[test]
    fn test_descriptors_carry_source_path() {
        let info = MediaInfo {
            path: PathBuf::from("/media/in.mp4"),
            videos: vec![VideoStreamInfo {
                index: 0,
                codec: "h264".to_string(),
                width: 1280,
                height: 720,
                ..Default::default()
            }],
            audios: vec![AudioStreamInfo {
                index: 1,
                codec: "aac".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let video = info.video_stream().unwrap();
        assert_eq!(video.path(), Path::new("/media/in.mp4"));
        assert_eq!(video.index(), 0);
        let audio = info.audio_stream().unwrap();
        assert_eq!(audio.index(), 1);
        assert!(info.subtitle_streams().next().is_none());
    }

    #[test]
    fn test_widest_video() {
        let info = MediaInfo {
            videos: vec![
                VideoStreamInfo {
                    index: 0,
                    width: 640,
                    height: 360,
                    ..Default::default()
                },
                VideoStreamInfo {
                    index: 1,
                    width: 1920,
                    height: 1080,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(info.widest_video().map(|v| v.index), Some(1));
    }
}
