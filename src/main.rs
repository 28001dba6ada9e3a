use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use signaltab::engine::{ClassifierStage, IoReader, IoWriter, SampleReader};
use signaltab::model::mock::StaticLoader;
use signaltab::model::{is_available, LabelTable, ModelCache, ModelLoader};
use signaltab::observability::{MetricsCollector, PipelineMonitor};
use signaltab::source::{generate_file, FileSource, SignalKind};
use signaltab::ClassifierConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STDIN_CHUNK_SAMPLES: usize = 1024;

/// Streaming IQ signal classifier
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter (e.g. "info", "signaltab=debug")
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a .cf32 recording and print one JSON event per line
    Classify {
        /// Complex float32 recording to replay, or "-" to read samples from stdin
        #[arg(short, long)]
        file: PathBuf,

        /// Sample rate of the recording in Hz
        #[arg(short, long, default_value = "48000")]
        sample_rate: u32,

        /// Tuned center frequency reported with every event
        #[arg(long, default_value = "0")]
        freq: i64,

        /// Flat settings JSON with signal_classifier_* keys
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Override the confidence threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Override the classification interval in seconds
        #[arg(long)]
        interval: Option<f64>,

        /// Override the compute device (cpu, cuda, cuda:N, mps)
        #[arg(long)]
        device: Option<String>,

        /// Loop the recording until interrupted
        #[arg(long)]
        r#loop: bool,

        /// Throttle playback to the recording's sample rate
        #[arg(long)]
        realtime: bool,

        /// Class the simulated model favors
        #[arg(long, default_value = "am-dsb")]
        simulated_class: String,
    },

    /// Write a synthetic .cf32 test recording and its JSON metadata
    Generate {
        #[arg(short, long, default_value = "test_data/iq/test_tone.cf32")]
        output: PathBuf,

        #[arg(short, long, default_value = "48000")]
        sample_rate: u32,

        /// Duration in seconds
        #[arg(short, long, default_value = "5.0")]
        duration: f64,

        /// tone, noise, am or tone_noise
        #[arg(long, default_value = "tone")]
        signal: SignalKind,

        /// Tone frequency offset from center in Hz
        #[arg(short, long, default_value = "1000")]
        frequency: f64,

        /// Center frequency recorded in the metadata
        #[arg(long, default_value = "14074000")]
        center_freq: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Classify {
            file,
            sample_rate,
            freq,
            settings,
            threshold,
            interval,
            device,
            r#loop,
            realtime,
            simulated_class,
        } => {
            let mut config = match &settings {
                Some(path) => {
                    let raw = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read settings {}", path.display()))?;
                    let config = ClassifierConfig::from_settings(&serde_json::from_str(&raw)?)?;
                    if !config.enabled {
                        warn!("signal classifier is disabled in {}", path.display());
                        return Ok(());
                    }
                    config
                }
                None => ClassifierConfig {
                    enabled: true,
                    ..ClassifierConfig::default()
                },
            };
            config.sample_rate = sample_rate;
            if let Some(t) = threshold {
                config.threshold = t;
            }
            if let Some(i) = interval {
                config.interval = i;
            }
            if let Some(d) = device {
                config.device = d;
            }
            config.validate()?;

            let source: Box<dyn SampleReader> = if file.as_os_str() == "-" {
                info!("reading samples from stdin");
                Box::new(IoReader::new(std::io::stdin(), STDIN_CHUNK_SAMPLES))
            } else {
                let source = FileSource::open(&file, sample_rate)?
                    .looping(r#loop)
                    .realtime(realtime);
                info!(source = ?source, "replaying recording");
                Box::new(source)
            };
            classify(config, source, freq, &simulated_class).await
        }
        Commands::Generate {
            output,
            sample_rate,
            duration,
            signal,
            frequency,
            center_freq,
        } => {
            let metadata =
                generate_file(&output, signal, frequency, sample_rate, duration, center_freq)?;
            info!(
                output = %output.display(),
                samples = metadata.num_samples,
                bytes = metadata.file_size_bytes,
                "{}",
                metadata.description
            );
            Ok(())
        }
    }
}

async fn classify(
    config: ClassifierConfig,
    source: Box<dyn SampleReader>,
    freq: i64,
    simulated_class: &str,
) -> Result<()> {
    let labels = LabelTable::sig53();
    if labels.index_of(simulated_class).is_none() {
        bail!("'{}' is not a known class", simulated_class);
    }

    let loader: Arc<dyn ModelLoader> =
        Arc::new(StaticLoader::favoring(&labels, simulated_class, 0.9));
    if !is_available(loader.as_ref()) {
        bail!("signal classifier runtime is not available");
    }
    let cache = Arc::new(ModelCache::new(loader, labels)?);

    let stage = ClassifierStage::new("file", config, cache)?;
    stage.set_dial_frequency(freq);

    let mut collector = MetricsCollector::new();
    collector.register(stage.metrics());

    let handle = stage.start(source, Box::new(IoWriter::new(std::io::stdout())))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, stopping classifier");
                handle.stop();
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if handle.is_finished() {
                    break;
                }
            }
        }
    }

    let report = tokio::task::spawn_blocking(move || handle.join()).await??;
    info!(
        windows = report.windows_classified,
        events = report.events_emitted,
        discarded = report.discarded_samples,
        "classification finished"
    );
    eprintln!("{}", PipelineMonitor::new(collector).generate_report());

    Ok(())
}
