//! Maps known ffmpeg stderr messages to typed errors.

use super::error::ConversionError;

/// Marker that some rules additionally require in the log.
const EMPTY_OUTPUT: &str = "Output file is empty";

/// Error family a rule maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Conversion,
    UnknownDecoder,
    HardwareAcceleratorNotFound,
    NoSuitableOutputFormat,
    InvalidBitstreamFilter,
}

impl FailureKind {
    fn into_error(self, log: &str, arguments: &str) -> ConversionError {
        let log = log.to_string();
        let arguments = arguments.to_string();
        match self {
            Self::Conversion => ConversionError::ConversionFailed { log, arguments },
            Self::UnknownDecoder => ConversionError::UnknownDecoder { log, arguments },
            Self::HardwareAcceleratorNotFound => {
                ConversionError::HardwareAcceleratorNotFound { log, arguments }
            }
            Self::NoSuitableOutputFormat => {
                ConversionError::NoSuitableOutputFormat { log, arguments }
            }
            Self::InvalidBitstreamFilter => {
                ConversionError::InvalidBitstreamFilter { log, arguments }
            }
        }
    }
}

/// One entry of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub needle: &'static str,
    pub requires_empty_output: bool,
    pub kind: FailureKind,
}

impl Rule {
    const fn new(needle: &'static str, requires_empty_output: bool, kind: FailureKind) -> Self {
        Self {
            needle,
            requires_empty_output,
            kind,
        }
    }

    fn matches(&self, log: &str) -> bool {
        log.contains(self.needle) && (!self.requires_empty_output || log.contains(EMPTY_OUTPUT))
    }
}

/// Evaluated top to bottom; the first matching rule wins.
pub const RULES: &[Rule] = &[
    Rule::new("Invalid NAL unit size", false, FailureKind::Conversion),
    Rule::new("Packet mismatch", true, FailureKind::Conversion),
    Rule::new("asf_read_pts failed", true, FailureKind::UnknownDecoder),
    Rule::new(
        "Missing key frame while searching for timestamp",
        true,
        FailureKind::UnknownDecoder,
    ),
    Rule::new(
        "Old interlaced mode is not supported",
        true,
        FailureKind::UnknownDecoder,
    ),
    Rule::new("mpeg1video", true, FailureKind::UnknownDecoder),
    Rule::new(
        "Frame rate very high for a muxer not efficiently supporting it",
        true,
        FailureKind::UnknownDecoder,
    ),
    Rule::new("multiple fourcc not supported", false, FailureKind::UnknownDecoder),
    Rule::new("Unknown decoder", false, FailureKind::UnknownDecoder),
    Rule::new(
        "Failed to open codec in avformat_find_stream_info",
        false,
        FailureKind::UnknownDecoder,
    ),
    Rule::new(
        "Unrecognized hwaccel: ",
        false,
        FailureKind::HardwareAcceleratorNotFound,
    ),
    Rule::new(
        "Unable to find a suitable output format",
        false,
        FailureKind::NoSuitableOutputFormat,
    ),
    Rule::new(
        "is not supported by the bitstream filter",
        false,
        FailureKind::InvalidBitstreamFilter,
    ),
];

/// Returns the first matching rule for `log`, if any.
pub fn matching_rule(log: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(log))
}

/// Fails with the error of the first rule that matches the full log.
pub fn classify(log: &str, arguments: &str) -> Result<(), ConversionError> {
    match matching_rule(log) {
        Some(rule) => Err(rule.kind.into_error(log, arguments)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_log_passes() {
        assert!(classify("frame=100 size=10kB time=00:00:04.00", "-y").is_ok());
    }

    #[test]
    fn test_unknown_decoder() {
        let err = classify("[mov] Unknown decoder 'foo'", "-i \"a\" \"b\"").unwrap_err();
        assert!(matches!(err, ConversionError::UnknownDecoder { .. }));
        assert_eq!(err.arguments(), Some("-i \"a\" \"b\""));
        assert_eq!(err.log(), Some("[mov] Unknown decoder 'foo'"));
    }

    #[test]
    fn test_table_order_beats_log_order() {
        let log = "Unknown decoder 'x'\nInvalid NAL unit size (1 > 0)";
        let err = classify(log, "").unwrap_err();
        assert!(matches!(err, ConversionError::ConversionFailed { .. }));
    }

    #[test]
    fn test_secondary_condition_required() {
        assert!(classify("Packet mismatch 1", "").is_ok());
        let err = classify("Packet mismatch 1\nOutput file is empty, nothing was encoded", "")
            .unwrap_err();
        assert!(matches!(err, ConversionError::ConversionFailed { .. }));
    }

    #[test]
    fn test_hwaccel_and_output_format() {
        assert!(matches!(
            classify("Unrecognized hwaccel: foo.", "").unwrap_err(),
            ConversionError::HardwareAcceleratorNotFound { .. }
        ));
        assert!(matches!(
            classify("Unable to find a suitable output format for 'x'", "").unwrap_err(),
            ConversionError::NoSuitableOutputFormat { .. }
        ));
        assert!(matches!(
            classify("Codec 'aac' is not supported by the bitstream filter 'h264_mp4toannexb'", "")
                .unwrap_err(),
            ConversionError::InvalidBitstreamFilter { .. }
        ));
    }
}
