//! Hardware accelerator and encoder detection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::ConversionError;
use super::types::HardwareAccelerator;

/// An encoder listed by `ffmpeg -encoders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoder {
    /// 'V', 'A' or 'S'.
    pub kind: char,
    pub name: String,
    pub description: String,
}

impl Encoder {
    pub fn is_video(&self) -> bool {
        self.kind == 'V'
    }

    pub fn is_audio(&self) -> bool {
        self.kind == 'A'
    }

    /// Encoders that run on NVENC, QSV, AMF, VA-API or VideoToolbox.
    pub fn is_hardware(&self) -> bool {
        ["_nvenc", "_qsv", "_amf", "_vaapi", "_videotoolbox"]
            .iter()
            .any(|suffix| self.name.ends_with(suffix))
    }
}

/// Accelerators ffmpeg was built with, from `ffmpeg -hwaccels`.
pub async fn available_hardware_accelerators(
    ffmpeg: &Path,
) -> Result<Vec<HardwareAccelerator>, ConversionError> {
    let stdout = run_listing(ffmpeg, "-hwaccels").await?;
    Ok(parse_hwaccels(&stdout))
}

/// Encoders ffmpeg was built with, from `ffmpeg -encoders`.
pub async fn available_encoders(ffmpeg: &Path) -> Result<Vec<Encoder>, ConversionError> {
    let stdout = run_listing(ffmpeg, "-encoders").await?;
    Ok(parse_encoders(&stdout))
}

async fn run_listing(ffmpeg: &Path, flag: &str) -> Result<String, ConversionError> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", flag])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConversionError::NotFound {
                    executable: "ffmpeg".to_string(),
                    searched: ffmpeg.display().to_string(),
                }
            } else {
                ConversionError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(ConversionError::conversion_failed(
            String::from_utf8_lossy(&output.stderr),
            flag,
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parses the `-hwaccels` listing, skipping names this crate does not know.
pub fn parse_hwaccels(listing: &str) -> Vec<HardwareAccelerator> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .filter_map(|name| {
            let accelerator = HardwareAccelerator::from_name(name);
            if accelerator.is_none() {
                debug!(name, "Unknown hardware accelerator");
            }
            accelerator
        })
        .collect()
}

/// Parses the `-encoders` listing.
///
/// Entry lines look like ` V....D libx264   libx264 H.264 / AVC`; the legend
/// above the `------` separator is skipped.
pub fn parse_encoders(listing: &str) -> Vec<Encoder> {
    listing
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            let kind = flags.chars().next()?;
            if !matches!(kind, 'V' | 'A' | 'S') {
                return None;
            }
            Some(Encoder {
                kind,
                name: name.to_string(),
                description: parts.collect::<Vec<_>>().join(" "),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HWACCELS: &str = "Hardware acceleration methods:\nvdpau\ncuda\nvaapi\nsomethingnew\n\n";

    const ENCODERS: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
 S..... mov_text             3GPP Timed Text subtitle
";

    #[test]
    fn test_parse_hwaccels() {
        assert_eq!(
            parse_hwaccels(HWACCELS),
            vec![
                HardwareAccelerator::Vdpau,
                HardwareAccelerator::Cuda,
                HardwareAccelerator::Vaapi
            ]
        );
    }

    #[test]
    fn test_parse_encoders() {
        let encoders = parse_encoders(ENCODERS);
        assert_eq!(encoders.len(), 4);
        assert_eq!(encoders[0].name, "libx264");
        assert!(encoders[0].is_video());
        assert!(!encoders[0].is_hardware());
        assert!(encoders[1].is_hardware());
        assert!(encoders[2].is_audio());
        assert_eq!(encoders[2].description, "AAC (Advanced Audio Coding)");
        assert_eq!(encoders[3].kind, 'S');
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_encoders("").is_empty());
        assert!(parse_hwaccels("").is_empty());
    }

    #[tokio::test]
    async fn test_missing_ffmpeg() {
        let err = available_encoders(Path::new("/nonexistent/ffmpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_listing_keeps_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"Unrecognized option 'encoders'\" >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = available_encoders(&script).await.unwrap_err();
        assert!(matches!(err, ConversionError::ConversionFailed { .. }));
        assert!(err.log().unwrap().contains("Unrecognized option 'encoders'"));
    }
}
