use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{check_seek, check_speed, FilterMap};
use crate::conversion::arguments::format_decimal;
use crate::conversion::error::ConversionError;
use crate::conversion::filter::{FilterConfiguration, AUDIO_FILTER};
use crate::conversion::parameter::{ParameterPosition, ParameterSet};
use crate::conversion::time::format_time;
use crate::media::AudioStreamInfo;

/// An audio stream of an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStream {
    index: usize,
    path: PathBuf,
    codec: String,
    bitrate: u64,
    duration: Duration,
    sample_rate: u32,
    channels: u32,
    language: Option<String>,
    parameters: ParameterSet,
    filters: FilterMap,
}

impl AudioStream {
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            index,
            path: path.into(),
            codec: String::new(),
            bitrate: 0,
            duration: Duration::ZERO,
            sample_rate: 0,
            channels: 0,
            language: None,
            parameters: ParameterSet::new(),
            filters: FilterMap::default(),
        }
    }

    pub fn from_info(path: &Path, info: &AudioStreamInfo) -> Self {
        Self {
            codec: info.codec.clone(),
            bitrate: info.bitrate,
            duration: info.duration,
            sample_rate: info.sample_rate,
            channels: info.channels,
            language: info.language.clone(),
            ..Self::new(path, info.index)
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn bitrate(&self) -> u64 {
        self.bitrate
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_codec(mut self, codec: impl fmt::Display) -> Self {
        self.parameters.replace(
            "-c:a",
            format!("-c:a {}", codec),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn copy_stream(self) -> Self {
        self.set_codec("copy")
    }

    /// Target bitrate in bits per second.
    pub fn set_bitrate(mut self, bitrate: u64) -> Self {
        self.parameters.replace(
            "-b:a",
            format!("-b:a {}", bitrate),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_channels(mut self, channels: u32) -> Self {
        self.parameters.replace(
            "-ac",
            format!("-ac {}", channels),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_sample_rate(mut self, sample_rate: u32) -> Self {
        self.parameters.replace(
            "-ar",
            format!("-ar {}", sample_rate),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_bitstream_filter(mut self, filter: impl fmt::Display) -> Self {
        self.parameters.replace(
            "-bsf:a",
            format!("-bsf:a {}", filter),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn split(mut self, start: Duration, duration: Duration) -> Self {
        self.parameters.replace(
            "-ss",
            format!("-ss {} -t {}", format_time(start), format_time(duration)),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Seeks the input before decoding; rejected past a known duration.
    pub fn set_seek(mut self, seek: Duration) -> Result<Self, ConversionError> {
        check_seek(seek, self.duration)?;
        self.parameters.replace(
            "-ss",
            format!("-ss {}", format_time(seek)),
            ParameterPosition::PreInput,
        );
        Ok(self)
    }

    /// Changes tempo with `atempo`; `multiplier` must be within `[0.5, 2.0]`.
    pub fn change_speed(mut self, multiplier: f64) -> Result<Self, ConversionError> {
        check_speed(multiplier)?;
        self.filters.set("atempo", format_decimal(multiplier));
        Ok(self)
    }

    pub fn reverse(mut self) -> Self {
        self.filters.set("areverse", "");
        self
    }

    pub fn filters(&self) -> Option<FilterConfiguration> {
        if self.filters.is_empty() {
            return None;
        }
        Some(FilterConfiguration {
            directive: AUDIO_FILTER.to_string(),
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

    fn stream() -> AudioStream {
        AudioStream::from_info(
            Path::new("/media/in.mp4"),
            &AudioStreamInfo {
                index: 1,
                codec: "aac".to_string(),
                duration: Duration::from_secs(13),
                sample_rate: 48_000,
                channels: 2,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_audio_parameters() {
        let audio = stream()
            .set_codec("libvorbis")
            .set_bitrate(128_000)
            .set_channels(2)
            .set_sample_rate(44_100);
        assert_eq!(
            audio.build_parameters(ParameterPosition::PostInput),
            "-c:a libvorbis -b:a 128000 -ac 2 -ar 44100 "
        );
    }

    #[test]
    fn test_change_speed_uses_atempo() {
        let filters = stream().change_speed(1.5).unwrap().filters().unwrap();
        assert_eq!(filters.directive, "-filter:a");
        assert_eq!(filters.stream_number, 1);
        assert_eq!(
            filters.filters,
            vec![("atempo".to_string(), "1.5".to_string())]
        );
    }

    #[test]
    fn test_change_speed_out_of_range() {
        let err = stream().change_speed(0.4).unwrap_err();
        assert!(matches!(err, ConversionError::OutOfRange { .. }));
        assert!(stream().change_speed(2.5).is_err());
    }

    #[test]
    fn test_seek_is_validated_against_known_duration() {
        assert!(stream().set_seek(Duration::from_secs(20)).is_err());
        assert!(AudioStream::new("/media/raw.wav", 0)
            .set_seek(Duration::from_secs(20))
            .is_ok());
    }

    #[test]
    fn test_reverse_has_empty_value() {
        let filters = stream().reverse().filters().unwrap();
        assert_eq!(filters.filters, vec![("areverse".to_string(), String::new())]);
    }
}
