//! Ready-made conversions for common jobs.
//!
//! Each recipe probes its inputs through a [`MediaInfoProvider`] and returns a
//! configured [`Conversion`] that has not been started yet, so callers can
//! still adjust it (overwrite flag, progress subscriber, ...) before calling
//! `start`.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::conversion::{
    arguments::{escape_path, format_decimal},
    AudioCodec, AudioStream, Conversion, ConversionError, Format, ParameterPosition, Position,
    SubtitleCodec, SubtitleStream, VideoCodec, VideoStream,
};
use crate::media::{aspect_ratio, MediaInfo, MediaInfoProvider};

/// Sample rate of the silent track generated for inputs without audio.
const FILLER_SAMPLE_RATE: u32 = 44_100;

async fn probe(
    provider: &dyn MediaInfoProvider,
    path: &Path,
) -> Result<MediaInfo, ConversionError> {
    debug!(path = %path.display(), "Probing recipe input");
    provider.media_info(path).await
}

fn require_video(info: &MediaInfo) -> Result<VideoStream, ConversionError> {
    info.video_stream().ok_or_else(|| {
        ConversionError::invalid_argument(format!(
            "{} has no video stream",
            info.path.display()
        ))
    })
}

fn require_audio(info: &MediaInfo) -> Result<AudioStream, ConversionError> {
    info.audio_stream().ok_or_else(|| {
        ConversionError::invalid_argument(format!(
            "{} has no audio stream",
            info.path.display()
        ))
    })
}

/// Re-encodes the first video and audio stream with the given codecs.
async fn transcode(
    provider: &dyn MediaInfoProvider,
    input: &Path,
    output: &Path,
    video_codec: VideoCodec,
    audio_codec: AudioCodec,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_streams([info.video_stream().map(|v| v.set_codec(video_codec))])
        .add_streams([info.audio_stream().map(|a| a.set_codec(audio_codec))])
        .set_output(output);
    Ok(conversion)
}

/// H.264 / AAC in an MP4 container.
pub async fn to_mp4(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    transcode(
        provider,
        input.as_ref(),
        output.as_ref(),
        VideoCodec::Libx264,
        AudioCodec::Aac,
    )
    .await
}

/// VP8 / Vorbis in a WebM container.
pub async fn to_webm(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    transcode(
        provider,
        input.as_ref(),
        output.as_ref(),
        VideoCodec::Libvpx,
        AudioCodec::Libvorbis,
    )
    .await
}

/// Theora / Vorbis in an Ogg container.
pub async fn to_ogv(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    transcode(
        provider,
        input.as_ref(),
        output.as_ref(),
        VideoCodec::Libtheora,
        AudioCodec::Libvorbis,
    )
    .await
}

/// Remuxes into MPEG-TS without re-encoding.
pub async fn to_ts(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_streams([info
            .video_stream()
            .map(|v| v.copy_stream().set_bitstream_filter("h264_mp4toannexb"))])
        .add_streams([info.audio_stream().map(AudioStream::copy_stream)])
        .set_output_format(Format::Mpegts)
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Keeps only the first audio stream.
pub async fn extract_audio(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_audio(&info)?)
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Keeps only the first video stream, copied as is.
pub async fn extract_video(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_video(&info)?.copy_stream())
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Replaces the audio of `video` with the first audio stream of `audio`.
pub async fn add_audio(
    provider: &dyn MediaInfoProvider,
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    let video_info = probe(provider, video.as_ref()).await?;
    let audio_info = probe(provider, audio.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_video(&video_info)?)
        .add_stream(require_audio(&audio_info)?)
        .use_shortest(true)
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Renders a subtitle file into the picture.
pub async fn burn_subtitles(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    subtitles: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let video = require_video(&info)?.add_subtitles(subtitles.as_ref(), None, None, None);
    let mut conversion = Conversion::new();
    conversion
        .add_stream(video)
        .add_streams([info.audio_stream()])
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Adds a subtitle file as a selectable track, copying audio and video.
pub async fn add_subtitle(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    subtitle: impl AsRef<Path>,
    output: impl AsRef<Path>,
    language: Option<&str>,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut track = SubtitleStream::new(subtitle.as_ref(), 0).set_codec(SubtitleCodec::MovText);
    if let Some(language) = language {
        track = track.set_language(language);
    }
    let mut conversion = Conversion::new();
    conversion
        .add_streams([info.video_stream().map(VideoStream::copy_stream)])
        .add_streams([info.audio_stream().map(AudioStream::copy_stream)])
        .add_stream(track)
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Cuts `duration` starting at `start` out of every video and audio stream.
pub async fn split(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: Duration,
    duration: Duration,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    for video in info.video_streams() {
        conversion.add_stream(video.split(start, duration));
    }
    for audio in info.audio_streams() {
        conversion.add_stream(audio.split(start, duration));
    }
    conversion.set_output(output.as_ref());
    Ok(conversion)
}

/// Scales the video to `width`x`height`.
pub async fn change_size(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    width: u32,
    height: u32,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_video(&info)?.set_size(width, height))
        .add_streams([info.audio_stream()])
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Overlays `image` at `position`.
pub async fn set_watermark(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    image: impl AsRef<Path>,
    position: Position,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_video(&info)?.set_watermark(image.as_ref(), position))
        .add_streams([info.audio_stream()])
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Writes the frame at `at` as a single image.
pub async fn snapshot(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    at: Duration,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_video(&info)?.set_seek(at)?)
        .add_parameter("-frames:v 1", ParameterPosition::PostInput)
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Animated GIF. `loop_count` 0 loops forever; `delay` is the pause after the
/// last frame in hundredths of a second.
pub async fn to_gif(
    provider: &dyn MediaInfoProvider,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    loop_count: u32,
    delay: u32,
) -> Result<Conversion, ConversionError> {
    let info = probe(provider, input.as_ref()).await?;
    let mut conversion = Conversion::new();
    conversion
        .add_stream(require_video(&info)?)
        .add_parameter(format!("-loop {}", loop_count), ParameterPosition::PostInput)
        .add_parameter(format!("-final_delay {}", delay), ParameterPosition::PostInput)
        .set_output_format(Format::Gif)
        .set_output(output.as_ref());
    Ok(conversion)
}

/// Joins `inputs` one after the other.
///
/// Every input is scaled to the width and height of the widest one and gets
/// its display aspect ratio; inputs without audio get a silent track so the
/// `concat` filter sees the same layout everywhere.
///
/// # Errors
///
/// [`ConversionError::InvalidArgument`] for fewer than two inputs or an input
/// without video.
pub async fn concatenate(
    provider: &dyn MediaInfoProvider,
    inputs: &[PathBuf],
    output: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    if inputs.len() < 2 {
        return Err(ConversionError::invalid_argument(
            "concatenation needs at least two inputs",
        ));
    }

    let mut infos = Vec::with_capacity(inputs.len());
    for input in inputs {
        let info = probe(provider, input).await?;
        require_video(&info)?;
        infos.push(info);
    }

    let widest = infos
        .iter()
        .filter_map(MediaInfo::widest_video)
        .max_by_key(|v| v.width)
        .ok_or_else(|| ConversionError::invalid_argument("inputs have no video stream"))?;
    let (width, height) = (widest.width, widest.height);
    let ratio = widest
        .ratio
        .clone()
        .or_else(|| aspect_ratio(width, height))
        .unwrap_or_else(|| format!("{}:{}", width, height));

    let input_clauses: Vec<String> = inputs
        .iter()
        .map(|path| format!("-i {}", escape_path(path)))
        .collect();

    let mut graph = Vec::new();
    let mut segments = String::new();
    for (i, info) in infos.iter().enumerate() {
        graph.push(format!(
            "[{i}:v:0]scale={width}:{height},setdar=dar={},setpts=PTS-STARTPTS[v{i}]",
            ratio.replace(':', "/")
        ));
        if info.audios.is_empty() {
            graph.push(format!(
                "anullsrc=channel_layout=stereo:sample_rate={FILLER_SAMPLE_RATE},atrim=duration={}[a{i}]",
                format_decimal(info.duration.as_secs_f64())
            ));
        } else {
            graph.push(format!(
                "[{i}:a:0]aresample={FILLER_SAMPLE_RATE},asetpts=PTS-STARTPTS[a{i}]"
            ));
        }
        segments.push_str(&format!("[v{i}][a{i}]"));
    }
    graph.push(format!(
        "{segments}concat=n={}:v=1:a=1[v][a]",
        infos.len()
    ));

    debug!(inputs = inputs.len(), width, height, %ratio, "Built concatenation graph");

    let mut conversion = Conversion::new();
    conversion
        .add_parameter(input_clauses.join(" "), ParameterPosition::PreInput)
        .add_parameter(
            format!("-filter_complex \"{}\"", graph.join(";")),
            ParameterPosition::PostInput,
        )
        .add_parameter("-map \"[v]\" -map \"[a]\"", ParameterPosition::PostInput)
        .add_parameter(format!("-aspect {}", ratio), ParameterPosition::PostInput)
        .set_output(output.as_ref());
    Ok(conversion)
}
