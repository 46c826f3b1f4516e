use serde::{Deserialize, Serialize};

use voxsplit_cluster::ClusterStrategy;
use voxsplit_vad::{VadAggressiveness, VadStrategy};

/// Every recognized pipeline option with its default. No dynamic lookup:
/// unknown knobs do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiarizationConfig {
    /// Expected (or approximate) speaker count.
    pub n_speakers: usize,
    /// Analysis window length in seconds.
    pub window_s: f32,
    /// Analysis hop in seconds.
    pub hop_s: f32,
    pub vad_strategy: VadStrategy,
    pub vad_aggressiveness: VadAggressiveness,
    pub cluster_strategy: ClusterStrategy,
    /// Minimum duration of an emitted speaking turn.
    pub min_segment_s: f32,
    /// Same-speaker turns closer than this are coalesced.
    pub merge_gap_s: f32,
    /// Minimum duration of a VAD interval. The source material disagrees
    /// with `min_segment_s` on a single value, so the two stay independent.
    pub min_voice_interval_s: f32,
    /// VAD intervals closer than this are bridged.
    pub vad_merge_gap_s: f32,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            n_speakers: 2,
            window_s: 1.2,
            hop_s: 0.6,
            vad_strategy: VadStrategy::Webrtc,
            vad_aggressiveness: VadAggressiveness::Quality,
            cluster_strategy: ClusterStrategy::Agglomerative,
            min_segment_s: 0.5,
            merge_gap_s: 0.4,
            min_voice_interval_s: 0.2,
            vad_merge_gap_s: 0.2,
        }
    }
}

impl DiarizationConfig {
    pub fn with_speakers(n_speakers: usize) -> Self {
        Self {
            n_speakers,
            ..Self::default()
        }
    }
}
