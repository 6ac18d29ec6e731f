pub mod config;
pub mod conversion;
pub mod executables;
pub mod media;
pub mod metrics;
pub mod snippets;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    ExecutablesConfig,
};
pub use conversion::{
    AudioCodec, AudioStream, Conversion, ConversionError, ConversionPreset, ConversionProgress,
    ConversionResult, ConversionSettings, ConversionState, Format, HardwareAccelerator,
    MediaStream, ParameterPosition, PixelFormat, Position, ProcessPriority, SubtitleCodec,
    SubtitleStream, VideoCodec, VideoStream,
};
pub use executables::{
    executables_directory, set_executables_directory, DefaultLocator, ExecutableLocator,
    Executables, FixedLocator,
};
pub use media::{FfprobeProvider, MediaInfo, MediaInfoProvider};
