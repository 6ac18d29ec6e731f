//! Runs one ffmpeg process and turns its outcome into a typed result.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::arguments::split_arguments;
use super::classifier::classify;
use super::error::ConversionError;
use super::priority::ProcessPriority;
use super::progress::{ConversionProgress, ProgressParser};

/// Marker that turns a non-zero exit into a success when found on the last
/// stderr line.
const DUMMY_MARKER: &str = "dummy";

/// Spawns ffmpeg with a prepared argument string and supervises it until it
/// exits or is cancelled.
#[derive(Debug)]
pub struct ProcessSupervisor {
    executable: PathBuf,
    arguments: String,
    priority: Option<ProcessPriority>,
    graceful_quit_timeout: Duration,
    stdout_chunk_size: usize,
    progress_tx: Option<mpsc::Sender<ConversionProgress>>,
    data_tx: Option<mpsc::Sender<Vec<u8>>>,
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
}

impl ProcessSupervisor {
    pub fn new(executable: impl Into<PathBuf>, arguments: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            arguments: arguments.into(),
            priority: None,
            graceful_quit_timeout: Duration::from_secs(5),
            stdout_chunk_size: 4096,
            progress_tx: None,
            data_tx: None,
        }
    }

    pub fn with_priority(mut self, priority: Option<ProcessPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_graceful_quit_timeout(mut self, timeout: Duration) -> Self {
        self.graceful_quit_timeout = timeout;
        self
    }

    pub fn with_stdout_chunk_size(mut self, size: usize) -> Self {
        self.stdout_chunk_size = size.max(1);
        self
    }

    /// Parses stderr into progress events sent on `tx`.
    pub fn with_progress(mut self, tx: mpsc::Sender<ConversionProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Pipes stdout and forwards it to `tx` in fixed-size chunks.
    pub fn with_data(mut self, tx: mpsc::Sender<Vec<u8>>) -> Self {
        self.data_tx = Some(tx);
        self
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Runs the process to completion.
    ///
    /// # Errors
    ///
    /// - [`ConversionError::Cancelled`] if `cancel` fires, before or after spawn
    /// - [`ConversionError::ProcessKilled`] if the process dies from a signal
    /// - a classified failure if stderr matches a known message
    /// - [`ConversionError::ConversionFailed`] for any other non-zero exit
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ConversionError> {
        if cancel.is_cancelled() {
            debug!("Conversion cancelled before spawn");
            return Err(self.cancelled());
        }

        let argv = split_arguments(&self.arguments);
        let mut child = Command::new(&self.executable)
            .args(&argv)
            .stdin(Stdio::piped())
            .stdout(if self.data_tx.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConversionError::NotFound {
                        executable: self.executable.display().to_string(),
                        searched: self.executable.display().to_string(),
                    }
                } else {
                    ConversionError::Io(e)
                }
            })?;

        let pid = child.id().unwrap_or_default();
        info!(
            pid,
            executable = %self.executable.display(),
            arguments = %self.arguments,
            "Started ffmpeg"
        );

        let priority = self.priority.or_else(ProcessPriority::current);
        if let Some(priority) = priority {
            if let Err(e) = priority.apply(pid) {
                warn!(pid, ?priority, error = %e, "Failed to set process priority");
            }
        }

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;
        let parser = self
            .progress_tx
            .as_ref()
            .map(|_| ProgressParser::new(&self.arguments, pid));
        let reader = tokio::spawn(read_stderr(stderr, parser, self.progress_tx.clone()));

        let drain = match (child.stdout.take(), self.data_tx.clone()) {
            (Some(stdout), Some(tx)) => Some(tokio::spawn(drain_stdout(
                stdout,
                tx,
                self.stdout_chunk_size,
            ))),
            _ => None,
        };

        let mut stdin = child.stdin.take();

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = cancel.cancelled() => Outcome::Cancelled,
        };

        let status = match outcome {
            Outcome::Exited(status) => status?,
            Outcome::Cancelled => {
                info!(pid, "Cancellation requested, stopping ffmpeg");
                self.stop(&mut child, stdin.take(), pid).await;
                reader.abort();
                if let Some(drain) = drain {
                    drain.abort();
                }
                return Err(self.cancelled());
            }
        };
        drop(stdin);

        let lines = match reader.await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(pid, error = %e, "stderr reader task failed");
                Vec::new()
            }
        };
        if let Some(drain) = drain {
            if let Err(e) = drain.await {
                warn!(pid, error = %e, "stdout drain task failed");
            }
        }

        debug!(pid, code = ?status.code(), lines = lines.len(), "ffmpeg exited");

        if status.code().is_none() {
            warn!(pid, "ffmpeg was terminated by a signal");
            return Err(ConversionError::ProcessKilled {
                arguments: self.arguments,
            });
        }

        let log = lines.join("\n");
        classify(&log, &self.arguments)?;

        let dummy = lines
            .last()
            .is_some_and(|line| line.contains(DUMMY_MARKER));
        if !status.success() && !dummy {
            return Err(ConversionError::conversion_failed(log, self.arguments));
        }

        Ok(())
    }

    /// Asks ffmpeg to quit with `q`, killing it if it does not exit in time.
    /// Windows processes are killed directly.
    async fn stop(&self, child: &mut Child, stdin: Option<ChildStdin>, pid: u32) {
        if !cfg!(windows) {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(b"q").await {
                    debug!(pid, error = %e, "Could not send quit to ffmpeg");
                }
                let _ = stdin.shutdown().await;
                drop(stdin);

                match tokio::time::timeout(self.graceful_quit_timeout, child.wait()).await {
                    Ok(Ok(status)) => {
                        debug!(pid, code = ?status.code(), "ffmpeg quit gracefully");
                        return;
                    }
                    Ok(Err(e)) => warn!(pid, error = %e, "Waiting for ffmpeg failed"),
                    Err(_) => warn!(
                        pid,
                        timeout_secs = self.graceful_quit_timeout.as_secs(),
                        "ffmpeg did not quit in time"
                    ),
                }
            }
        }

        warn!(pid, "Killing ffmpeg");
        if let Err(e) = child.kill().await {
            warn!(pid, error = %e, "Failed to kill ffmpeg");
        }
    }

    fn cancelled(&self) -> ConversionError {
        ConversionError::Cancelled {
            arguments: self.arguments.clone(),
        }
    }
}

/// Reads stderr to EOF, splitting on `\n` and `\r`.
///
/// ffmpeg terminates its status lines with `\r`, so both count as line ends.
/// Blank segments are dropped.
async fn read_stderr<R>(
    mut stderr: R,
    mut parser: Option<ProgressParser>,
    progress_tx: Option<mpsc::Sender<ConversionProgress>>,
) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    let mut handle = |raw: &[u8], lines: &mut Vec<String>| {
        let line = String::from_utf8_lossy(raw).trim_end().to_string();
        if line.trim().is_empty() {
            return;
        }
        if let (Some(parser), Some(tx)) = (parser.as_mut(), progress_tx.as_ref()) {
            if let Some(progress) = parser.feed(&line) {
                // Non-blocking send
                let _ = tx.try_send(progress);
            }
        }
        lines.push(line);
    };

    loop {
        let n = match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "stderr read failed");
                break;
            }
        };
        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                handle(&pending, &mut lines);
                pending.clear();
            } else {
                pending.push(byte);
            }
        }
    }
    if !pending.is_empty() {
        handle(&pending, &mut lines);
    }
    lines
}

/// Forwards stdout in chunks of at most `chunk_size` bytes.
///
/// Keeps reading after the receiver is gone so the child never blocks on a
/// full pipe.
async fn drain_stdout<R>(mut stdout: R, tx: mpsc::Sender<Vec<u8>>, chunk_size: usize)
where
    R: AsyncRead + Unpin,
{
    let mut tx = Some(tx);
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "stdout read failed");
                break;
            }
        };
        if let Some(sender) = &tx {
            if sender.send(buf[..n].to_vec()).await.is_err() {
                tx = None;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::conversion::arguments::escape_path;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    /// Writes a shell script standing in for ffmpeg and returns a supervisor
    /// that runs it through `/bin/sh`.
    fn fake_ffmpeg(dir: &TempDir, body: &str, arguments: &str) -> ProcessSupervisor {
        let script = dir.path().join("ffmpeg.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        ProcessSupervisor::new(
            "/bin/sh",
            format!("{} {}", escape_path(Path::new(&script)), arguments),
        )
        .with_graceful_quit_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_success_with_progress() {
        let dir = TempDir::new().unwrap();
        let body = r#"
printf '  Duration: 00:00:10.00, start: 0.000000, bitrate: 100 kb/s\n' >&2
printf 'frame=1 size=1kB time=00:00:05.00 bitrate=1kbits/s\r' >&2
printf 'frame=2 size=2kB time=00:00:10.00 bitrate=1kbits/s\n' >&2
exit 0"#;
        let (tx, mut rx) = mpsc::channel(10);
        let supervisor = fake_ffmpeg(&dir, body, "-i \"in.mp4\" \"out.mp4\"").with_progress(tx);

        supervisor.run(CancellationToken::new()).await.unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.position, Duration::from_secs(5));
        assert_eq!(first.duration, Duration::from_secs(10));
        assert!(first.process_id > 0);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.position, Duration::from_secs(10));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_conversion_failure() {
        let dir = TempDir::new().unwrap();
        let supervisor = fake_ffmpeg(&dir, "echo 'something broke' >&2\nexit 1", "-y");

        let err = supervisor.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ConversionError::ConversionFailed { .. }));
        assert_eq!(err.log(), Some("something broke"));
        assert!(err.arguments().unwrap().ends_with("-y"));
    }

    #[tokio::test]
    async fn test_dummy_last_line_allows_non_zero_exit() {
        let dir = TempDir::new().unwrap();
        let supervisor = fake_ffmpeg(&dir, "echo 'writing to dummy output' >&2\nexit 1", "");
        assert!(supervisor.run(CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_known_message_is_classified() {
        let dir = TempDir::new().unwrap();
        let supervisor = fake_ffmpeg(&dir, "echo 'Unknown decoder xyz' >&2\nexit 1", "");
        let err = supervisor.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ConversionError::UnknownDecoder { .. }));
    }

    #[tokio::test]
    async fn test_stdout_is_forwarded_in_chunks() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::channel(10);
        let supervisor = fake_ffmpeg(&dir, "printf 'abcdef'", "pipe:1")
            .with_stdout_chunk_size(4)
            .with_data(tx);

        supervisor.run(CancellationToken::new()).await.unwrap();

        let mut received = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            assert!(chunk.len() <= 4);
            received.extend(chunk);
        }
        assert_eq!(received, b"abcdef");
    }

    #[tokio::test]
    async fn test_cancel_before_spawn() {
        let token = CancellationToken::new();
        token.cancel();
        let supervisor = ProcessSupervisor::new("/nonexistent/ffmpeg", "-y");
        let err = supervisor.run(token).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_graceful_cancel() {
        let dir = TempDir::new().unwrap();
        let supervisor = fake_ffmpeg(&dir, "read line\nexit 0", "");
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let err = supervisor.run(token).await.unwrap_err();
        assert!(matches!(err, ConversionError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_cancel_kills_unresponsive_process() {
        let dir = TempDir::new().unwrap();
        let supervisor = fake_ffmpeg(&dir, "exec sleep 30", "")
            .with_graceful_quit_timeout(Duration::from_millis(300));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = supervisor.run(token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_signal_without_cancel_is_process_killed() {
        let dir = TempDir::new().unwrap();
        let supervisor = fake_ffmpeg(&dir, "kill -9 $$", "");
        let err = supervisor.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ConversionError::ProcessKilled { .. }));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let supervisor = ProcessSupervisor::new("/nonexistent/ffmpeg", "-y");
        let err = supervisor.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ConversionError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_stderr_splits_carriage_returns() {
        let input: &[u8] = b"one\rtwo\n\nthree";
        let lines = read_stderr(input, None, None).await;
        assert_eq!(lines, vec!["one", "two", "three"]);
    }
}
