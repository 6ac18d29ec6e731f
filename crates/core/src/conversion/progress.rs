//! Incremental parsing of ffmpeg's stderr into progress events.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::time::{parse_time, parse_time_or_seconds};

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\w+:\w+:\w+(?:\.\w+)?").expect("valid time regex"));
static SEEK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)-ss\s+(\S+)").expect("valid seek regex"));
static LIMIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)-t\s+(\S+)").expect("valid limit regex"));

/// A progress update for a running conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Position ffmpeg has reached in the output.
    pub position: Duration,
    /// Expected total length of the output.
    pub duration: Duration,
    /// OS id of the ffmpeg process.
    pub process_id: u32,
}

impl ConversionProgress {
    /// Completion percentage in `0.0..=100.0`, 0 when the total is unknown.
    pub fn percent(&self) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64() * 100.0).min(100.0) as f32
    }
}

/// Accumulates `Duration:` lines and turns `size=... time=...` lines into
/// [`ConversionProgress`] events.
///
/// Several `Duration:` lines (one per input) are summed, which keeps the total
/// right for concatenations. Each one has the `-ss` offset of the argument
/// string subtracted, and the total is capped by an output `-t` limit.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    total: Duration,
    seek: Option<Duration>,
    limit: Option<Duration>,
    process_id: u32,
}

impl ProgressParser {
    pub fn new(arguments: &str, process_id: u32) -> Self {
        let capture = |pattern: &Regex| {
            pattern
                .captures(arguments)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_time_or_seconds(m.as_str()))
        };
        Self {
            total: Duration::ZERO,
            seek: capture(&SEEK_PATTERN),
            limit: capture(&LIMIT_PATTERN),
            process_id,
        }
    }

    /// Total duration accumulated so far.
    pub fn total(&self) -> Duration {
        match self.limit {
            Some(limit) if limit < self.total => limit,
            _ => self.total,
        }
    }

    /// Feeds one stderr line, returning an event for progress lines.
    pub fn feed(&mut self, line: &str) -> Option<ConversionProgress> {
        if line.contains("Duration: N/A") {
            return None;
        }

        if line.contains("Duration") {
            if let Some(duration) = first_time(line) {
                self.total += duration;
                if let Some(seek) = self.seek {
                    self.total = self.total.saturating_sub(seek);
                }
            }
            return None;
        }

        if line.contains("size") {
            let position = first_time(line)?;
            if position.is_zero() {
                return None;
            }
            return Some(ConversionProgress {
                position,
                duration: self.total(),
                process_id: self.process_id,
            });
        }

        None
    }
}

/// First token of the line that passes strict time parsing.
fn first_time(line: &str) -> Option<Duration> {
    TIME_PATTERN
        .find_iter(line)
        .find_map(|m| parse_time(m.as_str()))
}
