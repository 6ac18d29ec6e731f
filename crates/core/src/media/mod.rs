//! Media metadata: the provider contract and an ffprobe-backed implementation.

mod ffprobe;
mod traits;
mod types;

pub use ffprobe::FfprobeProvider;
pub use traits::MediaInfoProvider;
pub use types::{aspect_ratio, AudioStreamInfo, MediaInfo, SubtitleStreamInfo, VideoStreamInfo};
