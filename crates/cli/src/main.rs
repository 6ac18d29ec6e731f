use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ffconv_core::conversion::{available_encoders, available_hardware_accelerators};
use ffconv_core::{
    load_config, load_config_from_env, snippets, validate_config, Config, Conversion,
    ConversionProgress, DefaultLocator, ExecutableLocator, FfprobeProvider, MediaInfoProvider,
};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "FFCONV_CONFIG";

#[derive(Parser)]
#[command(name = "ffconv", version, about = "Run ffmpeg conversions from typed options")]
struct Cli {
    /// Configuration file, overrides FFCONV_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved ffmpeg and ffprobe paths
    Locate,

    /// Print the media info of a file as JSON
    Probe { file: PathBuf },

    /// List encoders and hardware accelerators ffmpeg was built with
    Encoders,

    /// Convert the first video and audio stream of a file
    Convert {
        input: PathBuf,
        output: PathBuf,

        #[arg(long)]
        video_codec: Option<String>,

        #[arg(long)]
        audio_codec: Option<String>,

        #[arg(long)]
        preset: Option<String>,

        /// Output size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        size: Option<(u32, u32)>,

        /// Start position in seconds
        #[arg(long)]
        seek: Option<f64>,

        #[arg(long)]
        overwrite: bool,

        /// Print the ffmpeg arguments instead of running
        #[arg(long)]
        dry_run: bool,
    },

    /// Join files one after another
    Concat {
        output: PathBuf,

        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        overwrite: bool,

        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = read_config(cli.config)?;
    validate_config(&config).context("Configuration validation failed")?;

    let locator: Arc<dyn ExecutableLocator> =
        Arc::new(DefaultLocator::new(config.executables.clone()));

    match cli.command {
        Command::Locate => {
            let executables = locator.resolve()?;
            println!("ffmpeg: {}", executables.ffmpeg.display());
            println!("ffprobe: {}", executables.ffprobe.display());
        }
        Command::Probe { file } => {
            let provider = FfprobeProvider::from_locator(locator.as_ref())?;
            let info = provider.media_info(&file).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Encoders => {
            let ffmpeg = locator.resolve()?.ffmpeg;
            for accelerator in available_hardware_accelerators(&ffmpeg).await? {
                println!("hwaccel {}", accelerator);
            }
            for encoder in available_encoders(&ffmpeg).await? {
                println!("{} {:<24} {}", encoder.kind, encoder.name, encoder.description);
            }
        }
        Command::Convert {
            input,
            output,
            video_codec,
            audio_codec,
            preset,
            size,
            seek,
            overwrite,
            dry_run,
        } => {
            let provider = FfprobeProvider::from_locator(locator.as_ref())?;
            let info = provider
                .media_info(&input)
                .await
                .with_context(|| format!("Failed to probe {:?}", input))?;

            let mut video = info.video_stream();
            if let Some(codec) = &video_codec {
                video = video.map(|v| v.set_codec(codec));
            }
            if let Some((width, height)) = size {
                video = video.map(|v| v.set_size(width, height));
            }
            if let Some(seconds) = seek {
                let at = seconds_to_duration(seconds)?;
                video = video.map(|v| v.set_seek(at)).transpose()?;
            }
            let audio = match &audio_codec {
                Some(codec) => info.audio_stream().map(|a| a.set_codec(codec)),
                None => info.audio_stream(),
            };
            if video.is_none() && audio.is_none() {
                bail!("{:?} has neither video nor audio", input);
            }

            let mut conversion =
                Conversion::with_settings(config.conversion.clone()).with_locator(locator);
            conversion
                .add_streams([video])
                .add_streams([audio])
                .set_output(&output);
            if let Some(preset) = &preset {
                conversion.set_preset(preset);
            }
            if overwrite {
                conversion.set_overwrite_output(true);
            }

            execute(conversion, &config, dry_run).await?;
        }
        Command::Concat {
            output,
            inputs,
            overwrite,
            dry_run,
        } => {
            let provider = FfprobeProvider::from_locator(locator.as_ref())?;
            let mut conversion = snippets::concatenate(&provider, &inputs, &output).await?;
            conversion.configure(config.conversion.clone(), locator);
            if overwrite {
                conversion.set_overwrite_output(true);
            }

            execute(conversion, &config, dry_run).await?;
        }
    }

    Ok(())
}

fn read_config(flag: Option<PathBuf>) -> Result<Config> {
    let path = flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => load_config_from_env().context("Failed to read configuration from environment"),
    }
}

/// Runs the conversion with progress logging; Ctrl-C cancels it.
async fn execute(mut conversion: Conversion, config: &Config, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("{}", conversion.build());
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<ConversionProgress>(config.conversion.progress_buffer);
    conversion.on_progress(tx);
    let reporter = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            info!(
                position_secs = progress.position.as_secs(),
                total_secs = progress.duration.as_secs(),
                "Progress {:.1}%",
                progress.percent()
            );
        }
    });

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping ffmpeg");
            on_interrupt.cancel();
        }
    });

    let outcome = conversion.start_with_cancellation(cancel).await;
    // The conversion holds the progress sender; dropping it ends the reporter.
    drop(conversion);
    let _ = reporter.await;

    let result = outcome?;
    info!(
        elapsed_ms = result.duration().num_milliseconds(),
        "Wrote {:?}",
        result.output_path().unwrap_or(std::path::Path::new("pipe:1"))
    );
    println!("{}", result.arguments);
    Ok(())
}

fn seconds_to_duration(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("seek must be a non-negative number of seconds, got {}", seconds))
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", value))?;
    let width = width.parse().map_err(|_| format!("invalid width {:?}", width))?;
    let height = height.parse().map_err(|_| format!("invalid height {:?}", height))?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size("640X480"), Ok((640, 480)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("wide x720").is_err());
    }

    #[test]
    fn test_negative_seek_rejected() {
        assert!(seconds_to_duration(-1.0).is_err());
        assert!(seconds_to_duration(1e300).is_err());
        assert!(seconds_to_duration(f64::NAN).is_err());
        assert_eq!(
            seconds_to_duration(1.5).unwrap(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_cli_parses_concat() {
        let cli = Cli::try_parse_from(["ffconv", "concat", "out.mp4", "a.mp4", "b.mp4", "--dry-run"])
            .unwrap();
        match cli.command {
            Command::Concat { inputs, dry_run, .. } => {
                assert_eq!(inputs.len(), 2);
                assert!(dry_run);
            }
            _ => panic!("expected concat"),
        }
    }

    #[test]
    fn test_cli_concat_needs_two_inputs() {
        assert!(Cli::try_parse_from(["ffconv", "concat", "out.mp4", "a.mp4"]).is_err());
    }
}
