//! Label-run collapsing: frame labels plus timestamps in, raw segments out.

use crate::SpeakerSegment;

/// Median-filter the label sequence with a width-3 window, absorbing
/// single-frame label flips before segments are built.
pub fn smooth_labels(labels: &[usize]) -> Vec<usize> {
    let n = labels.len();
    if n < 3 {
        return labels.to_vec();
    }
    (0..n)
        .map(|i| {
            if i == 0 || i == n - 1 {
                labels[i]
            } else {
                let mut window = [labels[i - 1], labels[i], labels[i + 1]];
                window.sort_unstable();
                window[1]
            }
        })
        .collect()
}

/// Collapse each maximal run of identical labels into a segment spanning
/// [first frame time, last frame time + window].
///
/// Runs shorter than `min_dur` are not emitted standalone: they extend the
/// preceding segment instead, keeping its label. A too-short first run is
/// kept so the result is never empty when frames exist.
pub fn build_segments(
    labels: &[usize],
    times: &[f32],
    window_s: f32,
    min_dur: f32,
) -> Vec<SpeakerSegment> {
    debug_assert_eq!(labels.len(), times.len());
    if labels.is_empty() {
        return Vec::new();
    }

    let mut segments: Vec<SpeakerSegment> = Vec::new();
    let mut cur_label = labels[0];
    let mut cur_start = times[0];

    let close_run = |segments: &mut Vec<SpeakerSegment>, start: f32, end: f32, label: usize| {
        if end - start >= min_dur {
            segments.push(SpeakerSegment {
                start,
                end,
                speaker: label,
            });
        } else if let Some(prev) = segments.last_mut() {
            // Too short to stand alone: fold into the previous turn.
            prev.end = prev.end.max(end);
        } else {
            segments.push(SpeakerSegment {
                start,
                end,
                speaker: label,
            });
        }
    };

    for i in 1..labels.len() {
        if labels[i] != cur_label {
            let end = times[i] + window_s;
            close_run(&mut segments, cur_start, end, cur_label);
            cur_label = labels[i];
            cur_start = times[i];
        }
    }
    let end = times[times.len() - 1] + window_s;
    close_run(&mut segments, cur_start, end, cur_label);

    tracing::debug!(raw_segments = segments.len(), "label runs collapsed");
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(n: usize, hop: f32) -> Vec<f32> {
        (0..n).map(|i| i as f32 * hop).collect()
    }

    #[test]
    fn test_smooth_labels_removes_single_flip() {
        let labels = vec![0, 0, 1, 0, 0, 1, 1, 1];
        let smoothed = smooth_labels(&labels);
        assert_eq!(smoothed, vec![0, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_smooth_labels_short_input_unchanged() {
        assert_eq!(smooth_labels(&[1, 0]), vec![1, 0]);
    }

    #[test]
    fn test_single_run_spans_all_frames() {
        let labels = vec![0; 5];
        let t = times(5, 0.6);
        let segments = build_segments(&labels, &t, 1.2, 0.5);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 0.0);
        assert!((segments[0].end - (2.4 + 1.2)).abs() < 1e-6);
    }

    #[test]
    fn test_alternating_runs_become_segments() {
        let labels = vec![0, 0, 0, 1, 1, 1, 0, 0, 0];
        let t = times(9, 0.6);
        let segments = build_segments(&labels, &t, 1.2, 0.5);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].speaker, 0);
        assert_eq!(segments[1].speaker, 1);
        assert_eq!(segments[2].speaker, 0);
    }

    #[test]
    fn test_short_run_absorbed_into_predecessor() {
        // Middle run is one frame: 0.6 + 1.2 window = 1.8s... use a large
        // min_dur so the single-frame run cannot stand alone.
        let labels = vec![0, 0, 0, 0, 1, 0, 0, 0, 0];
        let t = times(9, 0.6);
        let segments = build_segments(&labels, &t, 1.2, 2.0);
        assert!(segments.iter().all(|s| s.speaker == 0));
    }

    #[test]
    fn test_short_first_run_is_kept() {
        let labels = vec![1, 0, 0, 0, 0];
        let t = times(5, 0.6);
        let segments = build_segments(&labels, &t, 1.2, 5.0);
        assert!(!segments.is_empty());
        assert_eq!(segments[0].speaker, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_segments(&[], &[], 1.2, 0.5).is_empty());
    }
}
