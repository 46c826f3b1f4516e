//! Voice activity detection: classifies a recording into voiced intervals.
//!
//! Two interchangeable strategies: the WebRTC classifier (via `earshot`) and
//! an adaptive energy threshold. The WebRTC path falls back to the energy
//! path if the detector errors, so `detect` itself never fails; an empty
//! interval list means no voice was found.

mod energy;
mod webrtc;

pub use energy::EnergyVadConfig;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum VadError {
    #[error("audio too short for a single VAD frame")]
    TooShort,
    #[error("detector error: {0}")]
    Detector(String),
}

pub type Result<T> = std::result::Result<T, VadError>;

/// A voiced time span in seconds. Invariant: `end > start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceInterval {
    pub start: f32,
    pub end: f32,
}

impl VoiceInterval {
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// WebRTC VAD aggressiveness, mirroring the four earshot profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VadAggressiveness {
    #[default]
    Quality,
    LowBitrate,
    Aggressive,
    VeryAggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VadStrategy {
    #[default]
    Webrtc,
    Energy,
}

impl std::fmt::Display for VadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VadStrategy::Webrtc => write!(f, "webrtc"),
            VadStrategy::Energy => write!(f, "energy"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VadOptions {
    pub strategy: VadStrategy,
    pub aggressiveness: VadAggressiveness,
    /// Intervals shorter than this are dropped.
    pub min_interval_s: f32,
    /// Gaps between adjacent intervals shorter than this are bridged.
    pub merge_gap_s: f32,
}

impl Default for VadOptions {
    fn default() -> Self {
        Self {
            strategy: VadStrategy::Webrtc,
            aggressiveness: VadAggressiveness::Quality,
            min_interval_s: 0.2,
            merge_gap_s: 0.2,
        }
    }
}

/// Detect voiced intervals in a mono signal.
///
/// The returned list is sorted, non-overlapping, and every interval is at
/// least `min_interval_s` long. An empty list means no voice activity.
pub fn detect(samples: &[f32], sample_rate: u32, opts: &VadOptions) -> Vec<VoiceInterval> {
    if samples.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let raw = match opts.strategy {
        VadStrategy::Webrtc => match webrtc::detect(samples, sample_rate, opts.aggressiveness) {
            Ok(intervals) => intervals,
            Err(e) => {
                tracing::warn!("webrtc VAD failed ({e}), falling back to energy threshold");
                energy::detect(samples, sample_rate, &EnergyVadConfig::default())
            }
        },
        VadStrategy::Energy => energy::detect(samples, sample_rate, &EnergyVadConfig::default()),
    };

    let filtered = postfilter(raw, opts.min_interval_s, opts.merge_gap_s);
    tracing::debug!(intervals = filtered.len(), "voice activity detection done");
    filtered
}

/// Collapse per-frame speech flags into contiguous intervals.
///
/// `frame_starts[i]` is the start time of flag `i`; `frame_s` is one frame's
/// duration, used to close a trailing open interval.
pub(crate) fn collapse_flags(
    flags: &[bool],
    frame_starts: &[f32],
    frame_s: f32,
) -> Vec<VoiceInterval> {
    let mut intervals = Vec::new();
    let mut seg_start: Option<f32> = None;

    for (i, &voiced) in flags.iter().enumerate() {
        match (voiced, seg_start) {
            (true, None) => seg_start = Some(frame_starts[i]),
            (false, Some(start)) => {
                let end = frame_starts[i];
                if end > start {
                    intervals.push(VoiceInterval { start, end });
                }
                seg_start = None;
            }
            _ => {}
        }
    }

    if let (Some(start), Some(&last)) = (seg_start, frame_starts.last()) {
        let end = last + frame_s;
        if end > start {
            intervals.push(VoiceInterval { start, end });
        }
    }

    intervals
}

/// Drop intervals shorter than `min_dur`, then bridge gaps below `merge_gap`.
fn postfilter(intervals: Vec<VoiceInterval>, min_dur: f32, merge_gap: f32) -> Vec<VoiceInterval> {
    let mut merged: Vec<VoiceInterval> = Vec::new();
    for iv in intervals {
        if iv.duration() < min_dur {
            continue;
        }
        match merged.last_mut() {
            Some(prev) if iv.start - prev.end < merge_gap => {
                prev.end = prev.end.max(iv.end);
            }
            _ => merged.push(iv),
        }
    }
    merged
}
