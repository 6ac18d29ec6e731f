use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{check_seek, check_speed, FilterMap};
use crate::conversion::arguments::{escape_filter_path, format_decimal};
use crate::conversion::error::ConversionError;
use crate::conversion::filter::{FilterConfiguration, FILTER_COMPLEX};
use crate::conversion::parameter::{ParameterPosition, ParameterSet};
use crate::conversion::time::format_time;
use crate::conversion::types::{Position, RotateDegrees};
use crate::media::{aspect_ratio, VideoStreamInfo};

/// A video stream of an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStream {
    index: usize,
    path: PathBuf,
    codec: String,
    width: u32,
    height: u32,
    framerate: f64,
    bitrate: u64,
    duration: Duration,
    pixel_format: Option<String>,
    ratio: Option<String>,
    watermark: Option<PathBuf>,
    parameters: ParameterSet,
    filters: FilterMap,
}

impl VideoStream {
    /// Creates a descriptor with no metadata.
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            index,
            path: path.into(),
            codec: String::new(),
            width: 0,
            height: 0,
            framerate: 0.0,
            bitrate: 0,
            duration: Duration::ZERO,
            pixel_format: None,
            ratio: None,
            watermark: None,
            parameters: ParameterSet::new(),
            filters: FilterMap::default(),
        }
    }

    /// Creates a descriptor from probed metadata.
    pub fn from_info(path: &Path, info: &VideoStreamInfo) -> Self {
        Self {
            codec: info.codec.clone(),
            width: info.width,
            height: info.height,
            framerate: info.framerate,
            bitrate: info.bitrate,
            duration: info.duration,
            pixel_format: info.pixel_format.clone(),
            ratio: info.ratio.clone(),
            ..Self::new(path, info.index)
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Codec of the source stream as probed.
    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    pub fn bitrate(&self) -> u64 {
        self.bitrate
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn pixel_format(&self) -> Option<&str> {
        self.pixel_format.as_deref()
    }

    /// Display aspect ratio, derived from the frame size when not probed.
    pub fn ratio(&self) -> Option<String> {
        self.ratio
            .clone()
            .or_else(|| aspect_ratio(self.width, self.height))
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources = vec![self.path.clone()];
        if let Some(watermark) = &self.watermark {
            sources.push(watermark.clone());
        }
        sources
    }

    pub fn set_codec(mut self, codec: impl fmt::Display) -> Self {
        self.parameters.replace(
            "-c:v",
            format!("-c:v {}", codec),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Copies the stream without re-encoding.
    pub fn copy_stream(self) -> Self {
        self.set_codec("copy")
    }

    /// Target bitrate in bits per second.
    pub fn set_bitrate(mut self, bitrate: u64) -> Self {
        self.parameters.replace(
            "-b:v",
            format!("-b:v {}", bitrate),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Target bitrate with rate-control bounds.
    pub fn set_bitrate_range(mut self, min: u64, max: u64, buffer: u64) -> Self {
        self.parameters.replace(
            "-b:v",
            format!("-b:v {} -maxrate {} -bufsize {}", min, max, buffer),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_framerate(mut self, framerate: f64) -> Self {
        self.parameters.replace(
            "-r",
            format!("-r {}", format_decimal(framerate)),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_size(mut self, width: u32, height: u32) -> Self {
        self.parameters.replace(
            "-s",
            format!("-s {}x{}", width, height),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Loops the input `count` times (-1 loops forever).
    pub fn set_stream_loop(mut self, count: i32) -> Self {
        self.parameters.replace(
            "-stream_loop",
            format!("-stream_loop {}", count),
            ParameterPosition::PreInput,
        );
        self
    }

    pub fn set_bitstream_filter(mut self, filter: impl fmt::Display) -> Self {
        self.parameters.replace(
            "-bsf:v",
            format!("-bsf:v {}", filter),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Keeps `duration` of the stream starting at `start`.
    pub fn split(mut self, start: Duration, duration: Duration) -> Self {
        self.parameters.replace(
            "-ss",
            format!("-ss {} -t {}", format_time(start), format_time(duration)),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Seeks the input before decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::InvalidArgument`] if the stream duration is
    /// known and `seek` lies beyond it.
    pub fn set_seek(mut self, seek: Duration) -> Result<Self, ConversionError> {
        check_seek(seek, self.duration)?;
        self.parameters.replace(
            "-ss",
            format!("-ss {}", format_time(seek)),
            ParameterPosition::PreInput,
        );
        Ok(self)
    }

    /// Changes playback speed; `multiplier` must be within `[0.5, 2.0]`.
    pub fn change_speed(mut self, multiplier: f64) -> Result<Self, ConversionError> {
        check_speed(multiplier)?;
        self.filters
            .set("setpts", format!("{}*PTS", format_decimal(1.0 / multiplier)));
        Ok(self)
    }

    pub fn rotate(mut self, rotation: RotateDegrees) -> Self {
        self.filters.set("transpose", rotation.transpose_value());
        self
    }

    /// Plays the stream backwards.
    pub fn reverse(mut self) -> Self {
        self.filters.set("reverse", "");
        self
    }

    /// Burns a subtitle file into the picture.
    pub fn add_subtitles(
        mut self,
        subtitles: &Path,
        encoding: Option<&str>,
        style: Option<&str>,
        original_size: Option<(u32, u32)>,
    ) -> Self {
        let mut value = escape_filter_path(subtitles);
        if let Some(encoding) = encoding {
            value.push_str(&format!(":charenc={}", encoding));
        }
        if let Some(style) = style {
            value.push_str(&format!(":force_style='{}'", style));
        }
        if let Some((width, height)) = original_size {
            value.push_str(&format!(":original_size={}x{}", width, height));
        }
        self.filters.set("subtitles", value);
        self
    }

    /// Overlays an image; the image becomes an additional input.
    pub fn set_watermark(mut self, image: impl Into<PathBuf>, position: Position) -> Self {
        self.watermark = Some(image.into());
        self.filters.set("overlay", position.overlay_expression());
        self
    }

    pub fn filters(&self) -> Option<FilterConfiguration> {
        if self.filters.is_empty() {
            return None;
        }
        Some(FilterConfiguration {
            directive: FILTER_COMPLEX.to_string(),
            stream_number: self.index,
            filters: self.filters.to_vec(),
        })
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn build_parameters(&self, position: ParameterPosition) -> String {
        self.parameters.render(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> VideoStream {
        VideoStream::from_info(
            Path::new("/media/in.mp4"),
            &VideoStreamInfo {
                index: 0,
                codec: "h264".to_string(),
                width: 1280,
                height: 720,
                framerate: 25.0,
                duration: Duration::from_secs(13),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_codec_and_bitrate_render_post_input() {
        let video = stream().set_codec("libvpx").set_bitrate(2_000_000);
        assert_eq!(
            video.build_parameters(ParameterPosition::PostInput),
            "-c:v libvpx -b:v 2000000 "
        );
        assert_eq!(video.build_parameters(ParameterPosition::PreInput), "");
    }

    #[test]
    fn test_second_codec_replaces_first() {
        let video = stream().set_codec("libx264").set_codec("copy");
        assert_eq!(video.build_parameters(ParameterPosition::PostInput), "-c:v copy ");
    }

    #[test]
    fn test_seek_within_duration() {
        let video = stream().set_seek(Duration::from_secs(13)).unwrap();
        assert_eq!(
            video.build_parameters(ParameterPosition::PreInput),
            "-ss 00:00:13.000 "
        );
    }

    #[test]
    fn test_seek_beyond_duration_fails() {
        let err = stream().set_seek(Duration::from_secs(14)).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidArgument { .. }));
    }

    #[test]
    fn test_split_renders_start_and_length() {
        let video = stream().split(Duration::from_secs(2), Duration::from_millis(1500));
        assert_eq!(
            video.build_parameters(ParameterPosition::PostInput),
            "-ss 00:00:02.000 -t 00:00:01.500 "
        );
    }

    #[test]
    fn test_change_speed_bounds() {
        assert!(stream().change_speed(0.4).is_err());
        assert!(stream().change_speed(2.5).is_err());
        for ok in [0.5, 1.0, 2.0] {
            assert!(stream().change_speed(ok).is_ok());
        }
    }

    #[test]
    fn test_change_speed_uses_setpts() {
        let filters = stream().change_speed(2.0).unwrap().filters().unwrap();
        assert_eq!(filters.directive, "-filter_complex");
        assert_eq!(
            filters.filters,
            vec![("setpts".to_string(), "0.5*PTS".to_string())]
        );
    }

    #[test]
    fn test_no_filters_yields_none() {
        assert!(stream().set_codec("libx264").filters().is_none());
    }

    #[test]
    fn test_watermark_adds_source_and_overlay() {
        let video = stream().set_watermark("/media/logo.png", Position::BottomRight);
        assert_eq!(
            video.sources(),
            vec![PathBuf::from("/media/in.mp4"), PathBuf::from("/media/logo.png")]
        );
        let filters = video.filters().unwrap();
        assert_eq!(
            filters.filters,
            vec![(
                "overlay".to_string(),
                "main_w-overlay_w:main_h-overlay_h".to_string()
            )]
        );
    }

    #[test]
    fn test_subtitles_optional_suffixes() {
        let plain = stream().add_subtitles(Path::new("/subs/a.srt"), None, None, None);
        assert_eq!(
            plain.filters().unwrap().filters[0].1,
            "'/subs/a.srt'"
        );

        let full = stream().add_subtitles(
            Path::new("/subs/a.srt"),
            Some("UTF-8"),
            Some("FontSize=24"),
            Some((1280, 720)),
        );
        assert_eq!(
            full.filters().unwrap().filters[0].1,
            "'/subs/a.srt':charenc=UTF-8:force_style='FontSize=24':original_size=1280x720"
        );
    }

    #[test]
    fn test_ratio_falls_back_to_frame_size() {
        assert_eq!(stream().ratio(), Some("16:9".to_string()));
    }
}
