//! Error types for the conversion module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or running a conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// An ffmpeg or ffprobe executable could not be located.
    #[error("{executable} not found (searched: {searched})")]
    NotFound { executable: String, searched: String },

    /// The caller passed a value the builder rejects before spawning.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A numeric value fell outside its accepted range.
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// ffmpeg reported a failure that has no more specific classification.
    #[error("Conversion failed: {log}")]
    ConversionFailed { log: String, arguments: String },

    /// ffmpeg could not decode one of the inputs.
    #[error("Unknown decoder: {log}")]
    UnknownDecoder { log: String, arguments: String },

    /// The requested hardware accelerator is not available.
    #[error("Hardware accelerator not found: {log}")]
    HardwareAcceleratorNotFound { log: String, arguments: String },

    /// ffmpeg could not infer an output format from the output path.
    #[error("No suitable output format found: {log}")]
    NoSuitableOutputFormat { log: String, arguments: String },

    /// A bitstream filter does not accept the stream it was applied to.
    #[error("Invalid bitstream filter: {log}")]
    InvalidBitstreamFilter { log: String, arguments: String },

    /// The process was terminated without a cancellation request.
    #[error("ffmpeg process was killed and could not be stopped gracefully (arguments: {arguments})")]
    ProcessKilled { arguments: String },

    /// The caller cancelled the conversion.
    #[error("Conversion cancelled")]
    Cancelled { arguments: String },

    /// The builder was used in a state that does not allow the operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Probing a media file failed.
    #[error("Failed to probe {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    /// I/O error while talking to the child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Creates a generic conversion failure carrying the log and arguments.
    pub fn conversion_failed(log: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::ConversionFailed {
            log: log.into(),
            arguments: arguments.into(),
        }
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a new probe failure.
    pub fn probe_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The ffmpeg argument string this error was raised for, if any.
    pub fn arguments(&self) -> Option<&str> {
        match self {
            Self::ConversionFailed { arguments, .. }
            | Self::UnknownDecoder { arguments, .. }
            | Self::HardwareAcceleratorNotFound { arguments, .. }
            | Self::NoSuitableOutputFormat { arguments, .. }
            | Self::InvalidBitstreamFilter { arguments, .. }
            | Self::ProcessKilled { arguments }
            | Self::Cancelled { arguments } => Some(arguments),
            _ => None,
        }
    }

    /// The raw stderr transcript, for failures reported by the process.
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::ConversionFailed { log, .. }
            | Self::UnknownDecoder { log, .. }
            | Self::HardwareAcceleratorNotFound { log, .. }
            | Self::NoSuitableOutputFormat { log, .. }
            | Self::InvalidBitstreamFilter { log, .. } => Some(log),
            _ => None,
        }
    }

    /// Whether ffmpeg itself reported the failure.
    pub fn is_conversion_failure(&self) -> bool {
        self.log().is_some()
    }

    /// Whether the caller cancelled the conversion.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::OutOfRange { .. } => "out_of_range",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::UnknownDecoder { .. } => "unknown_decoder",
            Self::HardwareAcceleratorNotFound { .. } => "hardware_accelerator_not_found",
            Self::NoSuitableOutputFormat { .. } => "no_suitable_output_format",
            Self::InvalidBitstreamFilter { .. } => "invalid_bitstream_filter",
            Self::ProcessKilled { .. } => "process_killed",
            Self::Cancelled { .. } => "cancelled",
            Self::InvalidOperation { .. } => "invalid_operation",
            Self::ProbeFailed { .. } => "probe_failed",
            Self::Io(_) => "io",
        }
    }
}
