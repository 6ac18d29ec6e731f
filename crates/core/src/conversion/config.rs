//! Runtime settings shared by every conversion.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::priority::ProcessPriority;

/// Settings applied to each [`Conversion`](super::Conversion) unless the
/// conversion overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Default for the `-y` / `-n` flag.
    #[serde(default)]
    pub overwrite_output: bool,

    /// Thread count for `-threads`. `None` uses the processor count.
    #[serde(default)]
    pub threads: Option<usize>,

    /// OS scheduling priority for the child process.
    #[serde(default)]
    pub priority: Option<ProcessPriority>,

    /// Seconds to wait for ffmpeg to quit after `q` before killing it.
    #[serde(default = "default_graceful_quit_timeout")]
    pub graceful_quit_timeout_secs: u64,

    /// Size of the chunks forwarded to a stdout subscriber.
    #[serde(default = "default_stdout_chunk_size")]
    pub stdout_chunk_size: usize,

    /// Capacity suggested for progress channels.
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

fn default_graceful_quit_timeout() -> u64 {
    5
}

fn default_stdout_chunk_size() -> usize {
    4096
}

fn default_progress_buffer() -> usize {
    100
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            overwrite_output: false,
            threads: None,
            priority: None,
            graceful_quit_timeout_secs: default_graceful_quit_timeout(),
            stdout_chunk_size: default_stdout_chunk_size(),
            progress_buffer: default_progress_buffer(),
        }
    }
}

impl ConversionSettings {
    pub fn with_overwrite_output(mut self, overwrite: bool) -> Self {
        self.overwrite_output = overwrite;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_priority(mut self, priority: ProcessPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the graceful quit timeout in seconds.
    pub fn with_graceful_quit_timeout(mut self, secs: u64) -> Self {
        self.graceful_quit_timeout_secs = secs;
        self
    }

    pub fn with_stdout_chunk_size(mut self, size: usize) -> Self {
        self.stdout_chunk_size = size;
        self
    }

    pub fn graceful_quit_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_quit_timeout_secs)
    }

    /// Configured thread count, or the number of logical processors.
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ConversionSettings::default();
        assert!(!settings.overwrite_output);
        assert_eq!(settings.threads, None);
        assert_eq!(settings.graceful_quit_timeout(), Duration::from_secs(5));
        assert_eq!(settings.stdout_chunk_size, 4096);
        assert_eq!(settings.progress_buffer, 100);
        assert!(settings.effective_threads() >= 1);
    }

    #[test]
    fn test_settings_builder() {
        let settings = ConversionSettings::default()
            .with_overwrite_output(true)
            .with_threads(2)
            .with_priority(ProcessPriority::BelowNormal)
            .with_graceful_quit_timeout(1)
            .with_stdout_chunk_size(512);

        assert!(settings.overwrite_output);
        assert_eq!(settings.effective_threads(), 2);
        assert_eq!(settings.priority, Some(ProcessPriority::BelowNormal));
        assert_eq!(settings.graceful_quit_timeout_secs, 1);
        assert_eq!(settings.stdout_chunk_size, 512);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: ConversionSettings = serde_json::from_str(r#"{"threads": 3}"#).unwrap();
        assert_eq!(settings.threads, Some(3));
        assert_eq!(settings.graceful_quit_timeout_secs, 5);
    }
}
