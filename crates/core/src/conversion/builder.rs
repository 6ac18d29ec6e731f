//! The [`Conversion`] aggregate: collects streams and options and renders
//! them into a single ffmpeg argument string.

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::arguments::{escape_path, format_decimal};
use super::config::ConversionSettings;
use super::error::ConversionError;
use super::filter::assemble_filters;
use super::parameter::{ParameterPosition, ParameterSet};
use super::priority::ProcessPriority;
use super::progress::ConversionProgress;
use super::result::ConversionResult;
use super::stream::MediaStream;
use super::supervisor::ProcessSupervisor;
use super::time::format_time;
use crate::config::ExecutablesConfig;
use crate::executables::{DefaultLocator, ExecutableLocator};
use crate::metrics;

/// Lifecycle of a [`Conversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    Configuring,
    Built,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Where ffmpeg writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    /// Standard output (`pipe:1`).
    Pipe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HardwareAcceleration {
    accelerator: String,
    decoder: String,
    device: u32,
}

/// A single ffmpeg run under construction.
///
/// Setters take `&mut self` and return `&mut Self` for chaining. `build()`
/// renders the arguments in a fixed order:
///
/// hardware acceleration, input format, input time, pre-input parameters,
/// inputs (skipped when capturing), overwrite flag, threads, preset,
/// shortest, seek, per-stream parameters, filter graph, maps, post-input
/// parameters, output time, pixel format, output format, hash format and
/// finally the output.
///
/// A conversion can be started once. [`clear`](Self::clear) resets it
/// completely, including the start guard.
#[derive(Debug)]
pub struct Conversion {
    settings: ConversionSettings,
    locator: Arc<dyn ExecutableLocator>,
    streams: Vec<MediaStream>,
    parameters: ParameterSet,
    hardware_acceleration: Option<HardwareAcceleration>,
    input_format: Option<String>,
    input_time: Option<Duration>,
    capturing: bool,
    overwrite: Option<bool>,
    multithread: bool,
    threads: Option<usize>,
    preset: Option<String>,
    shortest: bool,
    seek: Option<Duration>,
    output_time: Option<Duration>,
    pixel_format: Option<String>,
    output_format: Option<String>,
    hash_format: Option<String>,
    output: Option<OutputTarget>,
    priority: Option<ProcessPriority>,
    progress_tx: Option<mpsc::Sender<ConversionProgress>>,
    data_tx: Option<mpsc::Sender<Vec<u8>>>,
    inputs: Vec<PathBuf>,
    state: ConversionState,
    started: bool,
}

impl Default for Conversion {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversion {
    /// Creates a conversion with default settings that resolves executables
    /// through the process-wide directory and `PATH`.
    pub fn new() -> Self {
        Self::with_settings(ConversionSettings::default())
    }

    pub fn with_settings(settings: ConversionSettings) -> Self {
        Self {
            settings,
            locator: Arc::new(DefaultLocator::new(ExecutablesConfig::default())),
            streams: Vec::new(),
            parameters: ParameterSet::new(),
            hardware_acceleration: None,
            input_format: None,
            input_time: None,
            capturing: false,
            overwrite: None,
            multithread: true,
            threads: None,
            preset: None,
            shortest: false,
            seek: None,
            output_time: None,
            pixel_format: None,
            output_format: None,
            hash_format: None,
            output: None,
            priority: None,
            progress_tx: None,
            data_tx: None,
            inputs: Vec::new(),
            state: ConversionState::Configuring,
            started: false,
        }
    }

    /// Uses `locator` to find ffmpeg when the conversion starts.
    pub fn with_locator(mut self, locator: Arc<dyn ExecutableLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// Replaces settings and locator of an existing conversion, e.g. one
    /// returned by a recipe in [`snippets`](crate::snippets).
    pub fn configure(
        &mut self,
        settings: ConversionSettings,
        locator: Arc<dyn ExecutableLocator>,
    ) -> &mut Self {
        self.settings = settings;
        self.locator = locator;
        self
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    pub fn streams(&self) -> &[MediaStream] {
        &self.streams
    }

    pub fn add_stream(&mut self, stream: impl Into<MediaStream>) -> &mut Self {
        self.streams.push(stream.into());
        self
    }

    /// Adds every present stream, skipping `None`.
    pub fn add_streams<S, I>(&mut self, streams: I) -> &mut Self
    where
        S: Into<MediaStream>,
        I: IntoIterator<Item = Option<S>>,
    {
        self.streams
            .extend(streams.into_iter().flatten().map(Into::into));
        self
    }

    /// Adds a raw argument fragment, rendered verbatim.
    pub fn add_parameter(
        &mut self,
        parameter: impl Into<String>,
        position: ParameterPosition,
    ) -> &mut Self {
        self.parameters.add(parameter, position);
        self
    }

    pub fn set_output(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output = Some(OutputTarget::File(path.into()));
        self
    }

    /// Writes the output to stdout; chunks reach the
    /// [`on_video_data`](Self::on_video_data) subscriber.
    pub fn pipe_output(&mut self) -> &mut Self {
        self.output = Some(OutputTarget::Pipe);
        self
    }

    /// The output file, `None` when piping or unset.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.output {
            Some(OutputTarget::File(path)) => Some(path),
            _ => None,
        }
    }

    /// Decodes with `accelerator` and `decoder`, re-encodes with `encoder`.
    ///
    /// Forces a single thread. `device` 0 leaves the device choice to ffmpeg.
    pub fn use_hardware_acceleration(
        &mut self,
        accelerator: impl fmt::Display,
        decoder: impl fmt::Display,
        encoder: impl fmt::Display,
        device: u32,
    ) -> &mut Self {
        self.hardware_acceleration = Some(HardwareAcceleration {
            accelerator: accelerator.to_string(),
            decoder: decoder.to_string(),
            device,
        });
        self.parameters
            .add(format!("-c:v {}", encoder), ParameterPosition::PostInput);
        self.threads = Some(1);
        self
    }

    pub fn set_overwrite_output(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = Some(overwrite);
        self
    }

    /// `false` renders `-threads 1`; `true` uses the configured count.
    pub fn use_multithread(&mut self, multithread: bool) -> &mut Self {
        self.multithread = multithread;
        self
    }

    pub fn set_threads(&mut self, threads: usize) -> &mut Self {
        self.threads = Some(threads);
        self
    }

    pub fn set_preset(&mut self, preset: impl fmt::Display) -> &mut Self {
        self.preset = Some(preset.to_string());
        self
    }

    /// Ends the output with the shortest stream.
    pub fn use_shortest(&mut self, shortest: bool) -> &mut Self {
        self.shortest = shortest;
        self
    }

    /// Output seek applied after the inputs.
    pub fn set_seek(&mut self, seek: Duration) -> &mut Self {
        self.seek = Some(seek);
        self
    }

    /// Limits how much of the input is read (`-t` before the inputs).
    pub fn set_input_time(&mut self, time: Duration) -> &mut Self {
        self.input_time = Some(time);
        self
    }

    /// Limits the output length (`-t` before the output).
    pub fn set_output_time(&mut self, time: Duration) -> &mut Self {
        self.output_time = Some(time);
        self
    }

    pub fn set_input_format(&mut self, format: impl fmt::Display) -> &mut Self {
        self.input_format = Some(format.to_string());
        self
    }

    pub fn set_output_format(&mut self, format: impl fmt::Display) -> &mut Self {
        self.output_format = Some(format.to_string());
        self
    }

    pub fn set_pixel_format(&mut self, pixel_format: impl fmt::Display) -> &mut Self {
        self.pixel_format = Some(pixel_format.to_string());
        self
    }

    /// Produces a hash of the decoded output (`-f hash -hash {algorithm}`).
    pub fn set_hash_format(&mut self, algorithm: impl fmt::Display) -> &mut Self {
        self.hash_format = Some(algorithm.to_string());
        self
    }

    pub fn set_frame_rate(&mut self, framerate: f64) -> &mut Self {
        self.parameters.replace(
            "-r",
            format!("-r {}", format_decimal(framerate)),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_video_bitrate(&mut self, bitrate: u64) -> &mut Self {
        self.parameters.replace(
            "-b:v",
            format!("-b:v {}", bitrate),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn set_audio_bitrate(&mut self, bitrate: u64) -> &mut Self {
        self.parameters.replace(
            "-b:a",
            format!("-b:a {}", bitrate),
            ParameterPosition::PostInput,
        );
        self
    }

    /// In capture mode no `-i` clauses are emitted; inputs come from
    /// pre-input parameters such as `-f x11grab -i :0.0`.
    pub fn set_capturing(&mut self, capturing: bool) -> &mut Self {
        self.capturing = capturing;
        self
    }

    pub fn set_priority(&mut self, priority: ProcessPriority) -> &mut Self {
        self.priority = Some(priority);
        self
    }

    /// Subscribes to progress events.
    pub fn on_progress(&mut self, tx: mpsc::Sender<ConversionProgress>) -> &mut Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Subscribes to raw stdout chunks; only used with
    /// [`pipe_output`](Self::pipe_output).
    pub fn on_video_data(&mut self, tx: mpsc::Sender<Vec<u8>>) -> &mut Self {
        self.data_tx = Some(tx);
        self
    }

    /// Distinct input files of the last build, in `-i` order.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Renders the argument string.
    pub fn build(&mut self) -> String {
        self.inputs = self.collect_inputs();

        let mut args = String::new();

        if let Some(hw) = &self.hardware_acceleration {
            args.push_str(&format!("-hwaccel {} -c:v {} ", hw.accelerator, hw.decoder));
            if hw.device != 0 {
                args.push_str(&format!("-hwaccel_device {} ", hw.device));
            }
        }
        if let Some(format) = &self.input_format {
            args.push_str(&format!("-f {} ", format));
        }
        if let Some(time) = self.input_time {
            args.push_str(&format!("-t {} ", format_time(time)));
        }
        args.push_str(&self.parameters.render(ParameterPosition::PreInput));

        if !self.capturing {
            args.push_str(&self.build_inputs());
        }

        let overwrite = self.overwrite.unwrap_or(self.settings.overwrite_output);
        args.push_str(if overwrite { "-y " } else { "-n " });
        args.push_str(&format!("-threads {} ", self.thread_count()));

        if let Some(preset) = &self.preset {
            args.push_str(&format!("-preset {} ", preset));
        }
        if self.shortest {
            args.push_str("-shortest ");
        }
        if let Some(seek) = self.seek {
            args.push_str(&format!("-ss {} ", format_time(seek)));
        }

        for stream in &self.streams {
            args.push_str(&stream.build_parameters(ParameterPosition::PostInput));
        }

        let filters: Vec<_> = self.streams.iter().filter_map(MediaStream::filters).collect();
        args.push_str(&assemble_filters(&filters));

        args.push_str(&self.build_maps());
        args.push_str(&self.parameters.render(ParameterPosition::PostInput));

        if let Some(time) = self.output_time {
            args.push_str(&format!("-t {} ", format_time(time)));
        }
        if let Some(pixel_format) = &self.pixel_format {
            args.push_str(&format!("-pix_fmt {} ", pixel_format));
        }
        if let Some(format) = &self.output_format {
            args.push_str(&format!("-f {} ", format));
        }
        if let Some(hash) = &self.hash_format {
            args.push_str(&format!("-f hash -hash {} ", hash));
        }

        match &self.output {
            Some(OutputTarget::File(path)) => args.push_str(&escape_path(path)),
            Some(OutputTarget::Pipe) => args.push_str("pipe:1"),
            None => {}
        }

        if self.state == ConversionState::Configuring {
            self.state = ConversionState::Built;
        }
        args.trim_end().to_string()
    }

    /// Builds and runs the conversion.
    pub async fn start(&mut self) -> Result<ConversionResult, ConversionError> {
        self.start_with_cancellation(CancellationToken::new()).await
    }

    /// Builds and runs the conversion, stopping ffmpeg when `cancel` fires.
    ///
    /// # Errors
    ///
    /// [`ConversionError::InvalidOperation`] if no output is set or the
    /// conversion was already started. Otherwise any error of the run.
    pub async fn start_with_cancellation(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        self.guard_start()?;
        if self.output.is_none() {
            return Err(ConversionError::invalid_operation(
                "no output configured; call set_output or pipe_output",
            ));
        }
        let arguments = self.build();
        self.run(arguments, cancel).await
    }

    /// Runs ffmpeg with a caller-supplied argument string instead of the
    /// built one. Progress and data subscribers still apply.
    pub async fn start_with_arguments(
        &mut self,
        arguments: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        self.guard_start()?;
        self.run(arguments.into(), cancel).await
    }

    /// Resets every option, the stream list, the subscribers and the start
    /// guard. Settings and the locator are kept.
    pub fn clear(&mut self) {
        let settings = self.settings.clone();
        let locator = Arc::clone(&self.locator);
        *self = Self::with_settings(settings).with_locator(locator);
    }

    fn guard_start(&mut self) -> Result<(), ConversionError> {
        if self.started {
            return Err(ConversionError::invalid_operation(
                "conversion was already started; call clear() or create a new one",
            ));
        }
        Ok(())
    }

    async fn run(
        &mut self,
        arguments: String,
        cancel: CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        self.started = true;
        self.state = ConversionState::Running;

        if cancel.is_cancelled() {
            debug!("Conversion cancelled before start");
            self.state = ConversionState::Cancelled;
            metrics::record_conversion("cancelled", 0.0);
            return Err(ConversionError::Cancelled { arguments });
        }

        let executables = match self.locator.resolve() {
            Ok(executables) => executables,
            Err(e) => {
                self.state = ConversionState::Failed;
                metrics::record_failure(e.kind());
                return Err(e);
            }
        };

        let mut supervisor = ProcessSupervisor::new(&executables.ffmpeg, arguments.clone())
            .with_priority(self.priority.or(self.settings.priority))
            .with_graceful_quit_timeout(self.settings.graceful_quit_timeout())
            .with_stdout_chunk_size(self.settings.stdout_chunk_size);
        if let Some(tx) = &self.progress_tx {
            supervisor = supervisor.with_progress(tx.clone());
        }
        if let (Some(OutputTarget::Pipe), Some(tx)) = (&self.output, &self.data_tx) {
            supervisor = supervisor.with_data(tx.clone());
        }

        let start_time = Utc::now();
        let outcome = supervisor.run(cancel).await;
        let end_time = Utc::now();
        let elapsed = (end_time - start_time)
            .to_std()
            .unwrap_or_default()
            .as_secs_f64();

        match outcome {
            Ok(()) => {
                self.state = ConversionState::Succeeded;
                metrics::record_conversion("success", elapsed);
                info!(elapsed_secs = elapsed, "Conversion finished");
                Ok(ConversionResult {
                    success: true,
                    start_time,
                    end_time,
                    arguments,
                    output_path: self.output_path().map(Path::to_path_buf),
                })
            }
            Err(e) if e.is_cancelled() => {
                self.state = ConversionState::Cancelled;
                metrics::record_conversion("cancelled", elapsed);
                info!(elapsed_secs = elapsed, "Conversion cancelled");
                Err(e)
            }
            Err(e) => {
                self.state = ConversionState::Failed;
                metrics::record_conversion("failed", elapsed);
                metrics::record_failure(e.kind());
                warn!(kind = e.kind(), error = %e, "Conversion failed");
                Err(e)
            }
        }
    }

    fn thread_count(&self) -> usize {
        if !self.multithread {
            return 1;
        }
        self.threads
            .unwrap_or_else(|| self.settings.effective_threads())
    }

    /// Distinct source paths in first-seen order.
    fn collect_inputs(&self) -> Vec<PathBuf> {
        let mut inputs: Vec<PathBuf> = Vec::new();
        for source in self.streams.iter().flat_map(MediaStream::sources) {
            if !inputs.contains(&source) {
                inputs.push(source);
            }
        }
        inputs
    }

    fn input_index(&self, path: &Path) -> usize {
        self.inputs
            .iter()
            .position(|input| input == path)
            .unwrap_or_default()
    }

    /// One `-i` clause per input, preceded by the pre-input parameters of
    /// the streams whose primary source it is.
    fn build_inputs(&self) -> String {
        let mut clauses = String::new();
        for input in &self.inputs {
            let mut pre_input = ParameterSet::new();
            for stream in self.streams.iter().filter(|s| s.path() == input.as_path()) {
                for parameter in stream
                    .parameters()
                    .iter()
                    .filter(|p| p.position() == ParameterPosition::PreInput)
                {
                    pre_input.add(parameter.text(), ParameterPosition::PreInput);
                }
            }
            clauses.push_str(&pre_input.render(ParameterPosition::PreInput));
            clauses.push_str(&format!("-i {} ", escape_path(input)));
        }
        clauses
    }

    fn build_maps(&self) -> String {
        self.streams
            .iter()
            .map(|stream| {
                format!(
                    "-map {}:{} ",
                    self.input_index(stream.path()),
                    stream.index()
                )
            })
            .collect()
    }
}
