//! Turning noisy per-frame speaker labels into stable speaking turns.
//!
//! Three stages: collapse label runs into raw segments, merge and absorb
//! short fragments, then force a strictly sequential timeline by bisecting
//! residual overlaps. The post-processing pass is a fixed point: running it
//! on its own output changes nothing.

mod build;
mod postprocess;

pub use build::{build_segments, smooth_labels};
pub use postprocess::{merge_segments, resolve_overlaps};

use serde::{Deserialize, Serialize};

/// Residual slivers below this length are merged into a neighbor.
pub const MIN_SLIVER_S: f32 = 0.1;

/// One speaking turn. Invariant: `end > start`; output lists are sorted by
/// `start` and pairwise non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub start: f32,
    pub end: f32,
    pub speaker: usize,
}

impl SpeakerSegment {
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    /// Presentation label, e.g. `SPEAKER_00`.
    pub fn speaker_name(&self) -> String {
        format!("SPEAKER_{:02}", self.speaker)
    }
}

/// Re-label speakers densely as 0..K-1 in order of first appearance.
/// Returns the number of distinct speakers.
pub fn relabel_speakers(segments: &mut [SpeakerSegment]) -> usize {
    let mut mapping: Vec<usize> = Vec::new();
    for seg in segments.iter_mut() {
        let dense = match mapping.iter().position(|&old| old == seg.speaker) {
            Some(i) => i,
            None => {
                mapping.push(seg.speaker);
                mapping.len() - 1
            }
        };
        seg.speaker = dense;
    }
    mapping.len()
}
