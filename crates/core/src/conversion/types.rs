//! Named constants for the ffmpeg CLI.
//!
//! Each enum renders to the exact token ffmpeg expects. Every builder method
//! that takes one of these also accepts a plain string, so names missing
//! from these tables can still be passed through.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! display_as_str {
    ($($t:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

/// Container / muxer names passed to `-f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Mp4,
    Matroska,
    Webm,
    Ogg,
    Mpegts,
    Mov,
    Avi,
    Flv,
    Gif,
    Mp3,
    Wav,
    Flac,
    Image2,
    Rawvideo,
    Concat,
    Lavfi,
    Null,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Matroska => "matroska",
            Self::Webm => "webm",
            Self::Ogg => "ogg",
            Self::Mpegts => "mpegts",
            Self::Mov => "mov",
            Self::Avi => "avi",
            Self::Flv => "flv",
            Self::Gif => "gif",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Image2 => "image2",
            Self::Rawvideo => "rawvideo",
            Self::Concat => "concat",
            Self::Lavfi => "lavfi",
            Self::Null => "null",
        }
    }
}

/// Video encoder / decoder names passed to `-c:v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    Copy,
    Libx264,
    Libx265,
    H264,
    Hevc,
    Libvpx,
    LibvpxVp9,
    LibaomAv1,
    Libtheora,
    Mpeg4,
    Mpeg2video,
    Gif,
    Png,
    Mjpeg,
    Rawvideo,
    H264Nvenc,
    HevcNvenc,
    H264Cuvid,
    HevcCuvid,
    H264Qsv,
    H264Vaapi,
    H264Videotoolbox,
}

impl VideoCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Libx264 => "libx264",
            Self::Libx265 => "libx265",
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::Libvpx => "libvpx",
            Self::LibvpxVp9 => "libvpx-vp9",
            Self::LibaomAv1 => "libaom-av1",
            Self::Libtheora => "libtheora",
            Self::Mpeg4 => "mpeg4",
            Self::Mpeg2video => "mpeg2video",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Mjpeg => "mjpeg",
            Self::Rawvideo => "rawvideo",
            Self::H264Nvenc => "h264_nvenc",
            Self::HevcNvenc => "hevc_nvenc",
            Self::H264Cuvid => "h264_cuvid",
            Self::HevcCuvid => "hevc_cuvid",
            Self::H264Qsv => "h264_qsv",
            Self::H264Vaapi => "h264_vaapi",
            Self::H264Videotoolbox => "h264_videotoolbox",
        }
    }
}

/// Audio encoder names passed to `-c:a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    Copy,
    Aac,
    Libmp3lame,
    Libvorbis,
    Libopus,
    Flac,
    Alac,
    Ac3,
    PcmS16le,
}

impl AudioCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Aac => "aac",
            Self::Libmp3lame => "libmp3lame",
            Self::Libvorbis => "libvorbis",
            Self::Libopus => "libopus",
            Self::Flac => "flac",
            Self::Alac => "alac",
            Self::Ac3 => "ac3",
            Self::PcmS16le => "pcm_s16le",
        }
    }
}

/// Subtitle encoder names passed to `-c:s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleCodec {
    Copy,
    Srt,
    Ass,
    MovText,
    Webvtt,
    DvdSubtitle,
}

impl SubtitleCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Srt => "srt",
            Self::Ass => "ass",
            Self::MovText => "mov_text",
            Self::Webvtt => "webvtt",
            Self::DvdSubtitle => "dvdsub",
        }
    }
}

/// Pixel formats passed to `-pix_fmt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Yuv420p10le,
    Nv12,
    Rgb24,
    Rgba,
    Bgr24,
    Gray,
}

impl PixelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10le => "yuv420p10le",
            Self::Nv12 => "nv12",
            Self::Rgb24 => "rgb24",
            Self::Rgba => "rgba",
            Self::Bgr24 => "bgr24",
            Self::Gray => "gray",
        }
    }
}

/// Encoder speed presets passed to `-preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPreset {
    UltraFast,
    SuperFast,
    VeryFast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    VerySlow,
}

impl ConversionPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UltraFast => "ultrafast",
            Self::SuperFast => "superfast",
            Self::VeryFast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::VerySlow => "veryslow",
        }
    }
}

/// Hardware decoding backends passed to `-hwaccel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareAccelerator {
    Auto,
    Cuda,
    Cuvid,
    Dxva2,
    D3d11va,
    Qsv,
    Vaapi,
    Vdpau,
    Videotoolbox,
    Opencl,
    Drm,
    Vulkan,
}

impl HardwareAccelerator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cuda => "cuda",
            Self::Cuvid => "cuvid",
            Self::Dxva2 => "dxva2",
            Self::D3d11va => "d3d11va",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
            Self::Vdpau => "vdpau",
            Self::Videotoolbox => "videotoolbox",
            Self::Opencl => "opencl",
            Self::Drm => "drm",
            Self::Vulkan => "vulkan",
        }
    }

    /// Looks up an accelerator by the name `ffmpeg -hwaccels` prints.
    pub fn from_name(name: &str) -> Option<Self> {
        let all = [
            Self::Auto,
            Self::Cuda,
            Self::Cuvid,
            Self::Dxva2,
            Self::D3d11va,
            Self::Qsv,
            Self::Vaapi,
            Self::Vdpau,
            Self::Videotoolbox,
            Self::Opencl,
            Self::Drm,
            Self::Vulkan,
        ];
        all.into_iter().find(|a| a.as_str() == name.trim())
    }
}

/// Hash algorithms for the `hash` muxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hash {
    Md5,
    Murmur3,
    Ripemd160,
    Sha1,
    Sha224,
    Sha256,
    Sha512,
    Crc32,
    Adler32,
}

impl Hash {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Murmur3 => "murmur3",
            Self::Ripemd160 => "ripemd160",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Crc32 => "crc32",
            Self::Adler32 => "adler32",
        }
    }
}

/// Watermark placement inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Center,
    UpperLeft,
    Up,
    UpperRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Position {
    /// The `overlay` filter coordinates for this position.
    pub fn overlay_expression(&self) -> &'static str {
        match self {
            Self::Center => "(main_w-overlay_w)/2:(main_h-overlay_h)/2",
            Self::UpperLeft => "0:0",
            Self::Up => "(main_w-overlay_w)/2:0",
            Self::UpperRight => "main_w-overlay_w:0",
            Self::Right => "main_w-overlay_w:(main_h-overlay_h)/2",
            Self::BottomRight => "main_w-overlay_w:main_h-overlay_h",
            Self::Bottom => "(main_w-overlay_w)/2:main_h-overlay_h",
            Self::BottomLeft => "0:main_h-overlay_h",
            Self::Left => "0:(main_h-overlay_h)/2",
        }
    }
}

/// Rotation applied with the `transpose` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDegrees {
    /// 90° counter-clockwise and vertical flip.
    CounterClockwiseAndFlip,
    /// 90° clockwise.
    Clockwise,
    /// 90° counter-clockwise.
    CounterClockwise,
    /// 90° clockwise and vertical flip.
    ClockwiseAndFlip,
    /// 180°.
    Invert,
}

impl RotateDegrees {
    /// The value of the `transpose` filter, or the filter chain for 180°.
    pub fn transpose_value(&self) -> &'static str {
        match self {
            Self::CounterClockwiseAndFlip => "0",
            Self::Clockwise => "1",
            Self::CounterClockwise => "2",
            Self::ClockwiseAndFlip => "3",
            Self::Invert => "2,transpose=2",
        }
    }
}

display_as_str!(
    Format,
    VideoCodec,
    AudioCodec,
    SubtitleCodec,
    PixelFormat,
    ConversionPreset,
    HardwareAccelerator,
    Hash,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_ffmpeg_tokens() {
        assert_eq!(VideoCodec::LibvpxVp9.to_string(), "libvpx-vp9");
        assert_eq!(AudioCodec::Libvorbis.to_string(), "libvorbis");
        assert_eq!(Format::Mpegts.to_string(), "mpegts");
        assert_eq!(ConversionPreset::UltraFast.to_string(), "ultrafast");
        assert_eq!(HardwareAccelerator::Cuda.to_string(), "cuda");
    }

    #[test]
    fn test_hardware_accelerator_from_name() {
        assert_eq!(
            HardwareAccelerator::from_name("vaapi"),
            Some(HardwareAccelerator::Vaapi)
        );
        assert_eq!(HardwareAccelerator::from_name("nope"), None);
    }

    #[test]
    fn test_overlay_expressions_are_distinct() {
        let positions = [
            Position::Center,
            Position::UpperLeft,
            Position::Up,
            Position::UpperRight,
            Position::Right,
            Position::BottomRight,
            Position::Bottom,
            Position::BottomLeft,
            Position::Left,
        ];
        let mut expressions: Vec<_> = positions.iter().map(|p| p.overlay_expression()).collect();
        expressions.sort();
        expressions.dedup();
        assert_eq!(expressions.len(), 9);
    }
}
