//! Segment post-processing: merge pass, then overlap resolution.

use crate::{SpeakerSegment, MIN_SLIVER_S};

/// Coalesce same-speaker neighbors separated by at most `merge_gap`, and
/// absorb segments still shorter than `min_dur` into their predecessor. The
/// very first segment is kept even when short so the opening turn survives.
pub fn merge_segments(
    segments: &[SpeakerSegment],
    merge_gap: f32,
    min_dur: f32,
) -> Vec<SpeakerSegment> {
    let mut out: Vec<SpeakerSegment> = Vec::with_capacity(segments.len());
    for &seg in segments {
        let Some(prev) = out.last_mut() else {
            out.push(seg);
            continue;
        };
        if seg.speaker == prev.speaker && seg.start - prev.end <= merge_gap {
            prev.end = prev.end.max(seg.end);
        } else if seg.duration() < min_dur {
            prev.end = prev.end.max(seg.end);
        } else {
            out.push(seg);
        }
    }
    out
}

/// Force a strictly sequential timeline.
///
/// Segments are sorted by start; an overlap is bisected at its midpoint, the
/// earlier segment's end clamped down and the later segment's start advanced.
/// When the midpoint would leave either side empty, only the later segment is
/// kept. A final pass folds slivers under `MIN_SLIVER_S` into the previous
/// segment. Idempotent: applying this to its own output is the identity.
pub fn resolve_overlaps(segments: &[SpeakerSegment]) -> Vec<SpeakerSegment> {
    let mut sorted: Vec<SpeakerSegment> = segments.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut sequential: Vec<SpeakerSegment> = Vec::with_capacity(sorted.len());
    for seg in sorted {
        let Some(prev) = sequential.last_mut() else {
            sequential.push(seg);
            continue;
        };
        if seg.start >= prev.end {
            sequential.push(seg);
            continue;
        }

        let midpoint = (seg.start + prev.end) / 2.0;
        if midpoint > prev.start && midpoint < seg.end {
            prev.end = midpoint;
            sequential.push(SpeakerSegment {
                start: midpoint,
                ..seg
            });
        } else {
            // Degenerate bisection: the later segment wins outright.
            *prev = seg;
        }
    }

    // Fold residual slivers into the previous turn.
    let mut out: Vec<SpeakerSegment> = Vec::with_capacity(sequential.len());
    for seg in sequential {
        if seg.duration() >= MIN_SLIVER_S {
            out.push(seg);
        } else if let Some(prev) = out.last_mut() {
            prev.end = prev.end.max(seg.end);
        }
        // A leading sliver with no neighbor is dropped.
    }
    out
}
