//! voxsplit - unsupervised speaker diarization for WAV recordings
//!
//! Run with `voxsplit meeting.wav` to segment a recording by speaker.
//! The timeline is printed to stdout and written to a report file.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use voxsplit_pipeline::{
    render_report, AudioSignal, ClusterStrategy, DiarizationConfig, Diarizer, VadStrategy,
};

#[derive(Parser)]
#[command(name = "voxsplit")]
#[command(author, version, about = "Unsupervised speaker diarization")]
#[command(long_about = "
Voxsplit answers \"who spoke when\" for a recording without any pretrained
speaker model: voice activity detection, spectral and cepstral features,
and clustering, all computed from the file itself.

USAGE:
  voxsplit meeting.wav
  voxsplit meeting.wav -n 3 --method spectral -o meeting.txt
")]
struct Cli {
    /// Path to the recording (WAV)
    audio: PathBuf,

    /// Where to write the diarization report
    #[arg(short, long, value_name = "FILE", default_value = "diarization.txt")]
    output: PathBuf,

    /// Expected number of speakers
    #[arg(short = 'n', long = "speakers", value_name = "N", default_value_t = 2)]
    speakers: usize,

    /// Clustering method
    #[arg(long, value_enum, default_value_t = MethodArg::Agglomerative)]
    method: MethodArg,

    /// Voice activity detection strategy
    #[arg(long, value_enum, default_value_t = VadArg::Webrtc)]
    vad: VadArg,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Agglomerative,
    Kmeans,
    Spectral,
    Gmm,
}

impl From<MethodArg> for ClusterStrategy {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Agglomerative => ClusterStrategy::Agglomerative,
            MethodArg::Kmeans => ClusterStrategy::KMeans,
            MethodArg::Spectral => ClusterStrategy::Spectral,
            MethodArg::Gmm => ClusterStrategy::Gmm,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VadArg {
    Webrtc,
    Energy,
}

impl From<VadArg> for VadStrategy {
    fn from(arg: VadArg) -> Self {
        match arg {
            VadArg::Webrtc => VadStrategy::Webrtc,
            VadArg::Energy => VadStrategy::Energy,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("voxsplit={log_level},warn"))),
        )
        .with_target(false)
        .init();

    if !cli.audio.exists() {
        anyhow::bail!("audio file not found: {}", cli.audio.display());
    }

    let config = DiarizationConfig {
        n_speakers: cli.speakers,
        cluster_strategy: cli.method.into(),
        vad_strategy: cli.vad.into(),
        ..DiarizationConfig::default()
    };

    let signal = AudioSignal::from_wav_path(&cli.audio)
        .with_context(|| format!("failed to read {}", cli.audio.display()))?;
    tracing::info!(
        duration_secs = signal.duration_secs() as f64,
        sample_rate = signal.sample_rate(),
        "loaded recording"
    );

    let diarizer = Diarizer::new(config);
    let segments = diarizer
        .diarize(&signal)
        .with_context(|| format!("diarization of {} failed", cli.audio.display()))?;

    let source = cli.audio.display().to_string();
    let report = render_report(&source, diarizer.config(), &segments);
    print!("{report}");

    std::fs::write(&cli.output, &report)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    tracing::info!(report = %cli.output.display(), "report written");

    Ok(())
}
