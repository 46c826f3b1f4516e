use std::collections::BTreeSet;
use std::fmt::Write;

use voxsplit_segment::SpeakerSegment;

use crate::DiarizationConfig;

/// Renders the human-readable timeline: a short header followed by one
/// line per speaking turn, `[AAA.As -> BBB.Bs] SPEAKER_NN`.
pub fn render_report(
    source: &str,
    config: &DiarizationConfig,
    segments: &[SpeakerSegment],
) -> String {
    let speakers: BTreeSet<usize> = segments.iter().map(|s| s.speaker).collect();

    let mut out = String::new();
    let _ = writeln!(out, "Diarization of {source}");
    let _ = writeln!(
        out,
        "Method: {} VAD, {} clustering",
        config.vad_strategy, config.cluster_strategy
    );
    let _ = writeln!(out, "Speakers found: {}", speakers.len());
    let _ = writeln!(out, "----------------------------------------");
    for seg in segments {
        let _ = writeln!(
            out,
            "[{:05.1}s -> {:05.1}s] {}",
            seg.start,
            seg.end,
            seg.speaker_name()
        );
    }
    out
}
