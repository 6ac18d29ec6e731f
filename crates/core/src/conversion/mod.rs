//! Building and running ffmpeg conversions.
//!
//! A [`Conversion`] collects stream descriptors ([`VideoStream`],
//! [`AudioStream`], [`SubtitleStream`]) and global options, renders them into
//! one argument string with a fixed clause order, and hands that string to a
//! [`ProcessSupervisor`] which spawns ffmpeg, parses progress from stderr and
//! classifies failures.
//!
//! # Example
//!
//! ```ignore
//! use ffconv_core::conversion::{AudioCodec, Conversion, VideoCodec};
//! use ffconv_core::media::{FfprobeProvider, MediaInfoProvider};
//!
//! let info = FfprobeProvider::new("ffprobe").media_info(Path::new("in.mp4")).await?;
//!
//! let mut conversion = Conversion::new();
//! conversion
//!     .add_streams([info.video_stream().map(|v| v.set_codec(VideoCodec::Libvpx))])
//!     .add_streams([info.audio_stream().map(|a| a.set_codec(AudioCodec::Libvorbis))])
//!     .set_output("out.webm");
//!
//! let result = conversion.start().await?;
//! println!("took {}s", result.duration().num_seconds());
//! ```

pub mod arguments;
mod builder;
mod capabilities;
mod classifier;
mod config;
mod error;
mod filter;
mod parameter;
mod priority;
mod progress;
mod result;
mod stream;
mod supervisor;
pub mod time;
mod types;

pub use builder::{Conversion, ConversionState, OutputTarget};
pub use capabilities::{
    available_encoders, available_hardware_accelerators, parse_encoders, parse_hwaccels, Encoder,
};
pub use classifier::{classify, matching_rule, FailureKind, Rule, RULES};
pub use config::ConversionSettings;
pub use error::ConversionError;
pub use filter::{assemble_filters, FilterConfiguration, AUDIO_FILTER, FILTER_COMPLEX};
pub use parameter::{Parameter, ParameterPosition, ParameterSet};
pub use priority::ProcessPriority;
pub use progress::{ConversionProgress, ProgressParser};
pub use result::ConversionResult;
pub use stream::{AudioStream, MediaStream, StreamKind, SubtitleStream, VideoStream};
pub use supervisor::ProcessSupervisor;
pub use types::{
    AudioCodec, ConversionPreset, Format, HardwareAccelerator, Hash, PixelFormat, Position,
    RotateDegrees, SubtitleCodec, VideoCodec,
};
