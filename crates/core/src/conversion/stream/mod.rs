//! Per-stream descriptors that render their own argument fragments.
//!
//! Descriptors are built with consuming setters (`fn set_x(self, ..) -> Self`)
//! and moved into a [`Conversion`](crate::conversion::Conversion) with
//! `add_stream`, which makes each descriptor single-owner once it is part of a
//! conversion.

mod audio;
mod subtitle;
mod video;

pub use audio::AudioStream;
pub use subtitle::SubtitleStream;
pub use video::VideoStream;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConversionError;
use super::filter::FilterConfiguration;
use super::parameter::{ParameterPosition, ParameterSet};

/// Minimum accepted speed multiplier.
pub const MIN_SPEED: f64 = 0.5;
/// Maximum accepted speed multiplier.
pub const MAX_SPEED: f64 = 2.0;

/// Kind of elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

impl StreamKind {
    /// The stream specifier letter used in `-c:{v|a|s}`.
    pub fn specifier(&self) -> char {
        match self {
            Self::Video => 'v',
            Self::Audio => 'a',
            Self::Subtitle => 's',
        }
    }
}

/// Any stream descriptor that can be added to a conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaStream {
    Video(VideoStream),
    Audio(AudioStream),
    Subtitle(SubtitleStream),
}

impl MediaStream {
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Video(_) => StreamKind::Video,
            Self::Audio(_) => StreamKind::Audio,
            Self::Subtitle(_) => StreamKind::Subtitle,
        }
    }

    /// Index of the stream inside its source file.
    pub fn index(&self) -> usize {
        match self {
            Self::Video(s) => s.index(),
            Self::Audio(s) => s.index(),
            Self::Subtitle(s) => s.index(),
        }
    }

    /// The file this stream is read from.
    pub fn path(&self) -> &Path {
        match self {
            Self::Video(s) => s.path(),
            Self::Audio(s) => s.path(),
            Self::Subtitle(s) => s.path(),
        }
    }

    /// Every file this stream needs as an input, primary source first.
    pub fn sources(&self) -> Vec<PathBuf> {
        match self {
            Self::Video(s) => s.sources(),
            Self::Audio(s) => vec![s.path().to_path_buf()],
            Self::Subtitle(s) => vec![s.path().to_path_buf()],
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        match self {
            Self::Video(s) => s.parameters(),
            Self::Audio(s) => s.parameters(),
            Self::Subtitle(s) => s.parameters(),
        }
    }

    pub fn build_parameters(&self, position: ParameterPosition) -> String {
        match self {
            Self::Video(s) => s.build_parameters(position),
            Self::Audio(s) => s.build_parameters(position),
            Self::Subtitle(s) => s.build_parameters(position),
        }
    }

    /// Filter requests of this stream; subtitles never have any.
    pub fn filters(&self) -> Option<FilterConfiguration> {
        match self {
            Self::Video(s) => s.filters(),
            Self::Audio(s) => s.filters(),
            Self::Subtitle(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoStream> {
        match self {
            Self::Video(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioStream> {
        match self {
            Self::Audio(s) => Some(s),
            _ => None,
        }
    }
}

impl From<VideoStream> for MediaStream {
    fn from(stream: VideoStream) -> Self {
        Self::Video(stream)
    }
}

impl From<AudioStream> for MediaStream {
    fn from(stream: AudioStream) -> Self {
        Self::Audio(stream)
    }
}

impl From<SubtitleStream> for MediaStream {
    fn from(stream: SubtitleStream) -> Self {
        Self::Subtitle(stream)
    }
}

/// Filter name → value pairs kept in insertion order.
///
/// Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterMap {
    entries: Vec<(String, String)>,
}

impl FilterMap {
    pub(crate) fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn to_vec(&self) -> Vec<(String, String)> {
        self.entries.clone()
    }
}

pub(crate) fn check_speed(multiplier: f64) -> Result<(), ConversionError> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&multiplier) {
        return Err(ConversionError::OutOfRange {
            name: "speed multiplier",
            value: multiplier,
            min: MIN_SPEED,
            max: MAX_SPEED,
        });
    }
    Ok(())
}

/// Rejects a seek past the end of a stream whose duration is known.
pub(crate) fn check_seek(seek: Duration, duration: Duration) -> Result<(), ConversionError> {
    if !duration.is_zero() && seek > duration {
        return Err(ConversionError::invalid_argument(format!(
            "seek {:?} is beyond the stream duration {:?}",
            seek, duration
        )));
    }
    Ok(())
}
