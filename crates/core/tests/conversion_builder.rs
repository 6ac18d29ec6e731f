//! Argument rendering through the public API, without running ffmpeg.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ffconv_core::conversion::{classify, ConversionSettings, ParameterPosition};
use ffconv_core::media::VideoStreamInfo;
use ffconv_core::{
    AudioStream, Conversion, ConversionError, ConversionPreset, Executables, FixedLocator,
    VideoCodec, VideoStream,
};

fn conversion() -> Conversion {
    Conversion::with_settings(ConversionSettings::default().with_threads(2))
}

fn video(path: &str, index: usize, seconds: u64) -> VideoStream {
    VideoStream::from_info(
        std::path::Path::new(path),
        &VideoStreamInfo {
            index,
            codec: "h264".to_string(),
            width: 1280,
            height: 720,
            framerate: 25.0,
            duration: Duration::from_secs(seconds),
            ..Default::default()
        },
    )
}

#[test]
fn test_pre_input_parameters_precede_inputs_in_any_setter_order() {
    let mut late = conversion();
    late.add_stream(video("a.mp4", 0, 13))
        .set_preset(ConversionPreset::Fast)
        .add_parameter("-hide_banner", ParameterPosition::PreInput)
        .add_parameter("-movflags +faststart", ParameterPosition::PostInput)
        .set_output("out.mp4");

    let mut early = conversion();
    early
        .add_parameter("-movflags +faststart", ParameterPosition::PostInput)
        .add_parameter("-hide_banner", ParameterPosition::PreInput)
        .set_output("out.mp4")
        .set_preset(ConversionPreset::Fast)
        .add_stream(video("a.mp4", 0, 13));

    for args in [late.build(), early.build()] {
        let pre = args.find("-hide_banner").unwrap();
        let input = args.find("-i ").unwrap();
        let post = args.find("-movflags").unwrap();
        assert!(pre < input && input < post, "{args}");
    }
    assert_eq!(late.build(), early.build());
}

#[test]
fn test_duplicate_parameter_renders_once() {
    let mut once = conversion();
    once.add_parameter("-an", ParameterPosition::PostInput)
        .set_output("out.mp4");
    let mut twice = conversion();
    twice
        .add_parameter("-an", ParameterPosition::PostInput)
        .add_parameter("-an", ParameterPosition::PostInput)
        .set_output("out.mp4");
    assert_eq!(once.build(), twice.build());
}

#[test]
fn test_speed_bounds() {
    for multiplier in [0.4, 2.5, 0.0, -1.0] {
        let err = video("a.mp4", 0, 13).change_speed(multiplier).unwrap_err();
        assert!(matches!(err, ConversionError::OutOfRange { .. }));
        assert!(AudioStream::new("a.mp4", 1).change_speed(multiplier).is_err());
    }
    for multiplier in [0.5, 1.0, 2.0] {
        assert!(video("a.mp4", 0, 13).change_speed(multiplier).is_ok());
        assert!(AudioStream::new("a.mp4", 1).change_speed(multiplier).is_ok());
    }
}

#[test]
fn test_seek_bound() {
    assert!(video("a.mp4", 0, 13)
        .set_seek(Duration::from_secs(13))
        .is_ok());
    assert!(video("a.mp4", 0, 13)
        .set_seek(Duration::from_millis(13_001))
        .is_err());
}

#[test]
fn test_repeated_source_shares_input_index() {
    let mut conversion = conversion();
    conversion
        .add_stream(video("a.mp4", 0, 13))
        .add_stream(AudioStream::new("a.mp4", 1))
        .add_stream(AudioStream::new("b.mp3", 0))
        .set_output("out.mkv");

    let args = conversion.build();
    assert_eq!(args.matches("-i ").count(), 2);
    assert!(args.contains("-map 0:0 -map 0:1 -map 1:0"));
    assert_eq!(
        conversion.inputs(),
        &[PathBuf::from("a.mp4"), PathBuf::from("b.mp3")]
    );
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let mut conversion = conversion().with_locator(Arc::new(FixedLocator(Executables {
        ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
        ffprobe: PathBuf::from("/nonexistent/ffprobe"),
    })));
    conversion
        .add_stream(video("a.mp4", 0, 13).set_codec(VideoCodec::Libx264))
        .set_output("out.mp4");

    assert!(conversion.start().await.is_err());
    let second = conversion.start().await.unwrap_err();
    assert!(matches!(second, ConversionError::InvalidOperation { .. }));
}

#[test]
fn test_classification_follows_table_order() {
    let log = "[h264] Unknown decoder 'foo'\n[h264] Invalid NAL unit size (1 > 0)\n";
    let err = classify(log, "-i in.mp4 out.mp4").unwrap_err();
    // "Invalid NAL unit size" is listed first even though it is logged last.
    assert!(matches!(err, ConversionError::ConversionFailed { .. }));
}
