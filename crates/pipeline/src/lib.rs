//! The diarization pipeline: who spoke when, without a pretrained speaker
//! model.
//!
//! One synchronous batch computation per call: VAD finds the voiced
//! intervals, each analysis window inside them becomes an acoustic feature
//! vector, the standardized feature matrix is clustered into speakers, and
//! the per-frame labels are collapsed and cleaned into a strictly
//! sequential list of speaking turns.
//!
//! A [`Diarizer`] holds only its configuration; concurrent runs on
//! different signals are fully independent.

mod config;
mod report;

pub use config::DiarizationConfig;
pub use report::render_report;

pub use voxsplit_audio::AudioSignal;
pub use voxsplit_cluster::ClusterStrategy;
pub use voxsplit_segment::SpeakerSegment;
pub use voxsplit_vad::{VadAggressiveness, VadStrategy};

use voxsplit_features::{standardize, FeatureConfig, FeatureExtractor};
use voxsplit_vad::VadOptions;

/// Fewer surviving frames than this and clustering is meaningless.
const MIN_VIABLE_FRAMES: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum DiarizeError {
    #[error("no voice activity detected in the recording")]
    NoVoiceDetected,
    #[error("insufficient voice data for diarization ({frames} usable frames)")]
    InsufficientFeatureData { frames: usize },
}

pub type Result<T> = std::result::Result<T, DiarizeError>;

/// The diarization service object. Construct once with a configuration and
/// reuse across runs; it keeps no per-run state.
#[derive(Debug, Clone)]
pub struct Diarizer {
    config: DiarizationConfig,
}

impl Diarizer {
    pub fn new(config: DiarizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiarizationConfig {
        &self.config
    }

    /// Run the full pipeline on one recording.
    ///
    /// Structural failures (no voice, too little usable audio) surface as
    /// errors with no partial output. Numerical trouble inside a single
    /// window and a speaker count exceeding the available frames are both
    /// absorbed with safe defaults instead.
    pub fn diarize(&self, signal: &AudioSignal) -> Result<Vec<SpeakerSegment>> {
        if signal.is_empty() {
            return Err(DiarizeError::InsufficientFeatureData { frames: 0 });
        }
        let cfg = &self.config;

        tracing::debug!(
            duration_secs = signal.duration_secs() as f64,
            "starting diarization"
        );
        let vad_opts = VadOptions {
            strategy: cfg.vad_strategy,
            aggressiveness: cfg.vad_aggressiveness,
            min_interval_s: cfg.min_voice_interval_s,
            merge_gap_s: cfg.vad_merge_gap_s,
        };
        let intervals = voxsplit_vad::detect(signal.samples(), signal.sample_rate(), &vad_opts);
        if intervals.is_empty() {
            return Err(DiarizeError::NoVoiceDetected);
        }

        let extractor = FeatureExtractor::new(FeatureConfig {
            window_s: cfg.window_s,
            hop_s: cfg.hop_s,
            ..FeatureConfig::default()
        });
        let mut features = extractor.extract(signal.samples(), signal.sample_rate(), &intervals);
        if features.len() < MIN_VIABLE_FRAMES {
            return Err(DiarizeError::InsufficientFeatureData {
                frames: features.len(),
            });
        }

        // Standardization is global to the recording; it must happen after
        // every frame has been collected.
        standardize(&mut features);

        let matrix: Vec<Vec<f32>> = features.iter().map(|f| f.values.clone()).collect();
        let times: Vec<f32> = features.iter().map(|f| f.time).collect();
        let labels = voxsplit_cluster::cluster(&matrix, cfg.n_speakers, cfg.cluster_strategy);
        let labels = voxsplit_segment::smooth_labels(&labels);

        let raw = voxsplit_segment::build_segments(&labels, &times, cfg.window_s, cfg.min_segment_s);
        let merged = voxsplit_segment::merge_segments(&raw, cfg.merge_gap_s, cfg.min_segment_s);
        let mut segments = voxsplit_segment::resolve_overlaps(&merged);
        let speakers = voxsplit_segment::relabel_speakers(&mut segments);

        tracing::debug!(
            segments = segments.len(),
            speakers,
            "diarization complete"
        );
        Ok(segments)
    }
}
