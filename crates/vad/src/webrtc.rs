//! WebRTC-based strategy: earshot over 30 ms frames of 16 kHz 16-bit PCM.

use earshot::VoiceActivityProfile;
use voxsplit_audio::resample_linear;

use crate::{collapse_flags, VadAggressiveness, VadError, VoiceInterval};

const TARGET_RATE: u32 = 16_000;
const FRAME_MS: usize = 30;
const FRAME_SAMPLES: usize = TARGET_RATE as usize * FRAME_MS / 1000;
const FRAME_S: f32 = FRAME_MS as f32 / 1000.0;

pub(crate) fn detect(
    samples: &[f32],
    sample_rate: u32,
    aggressiveness: VadAggressiveness,
) -> crate::Result<Vec<VoiceInterval>> {
    let audio16k = if sample_rate == TARGET_RATE {
        samples.to_vec()
    } else {
        resample_linear(samples, sample_rate, TARGET_RATE)
    };
    if audio16k.len() < FRAME_SAMPLES {
        return Err(VadError::TooShort);
    }

    let pcm: Vec<i16> = audio16k
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect();

    let profile = match aggressiveness {
        VadAggressiveness::Quality => VoiceActivityProfile::QUALITY,
        VadAggressiveness::LowBitrate => VoiceActivityProfile::LBR,
        VadAggressiveness::Aggressive => VoiceActivityProfile::AGGRESSIVE,
        VadAggressiveness::VeryAggressive => VoiceActivityProfile::VERY_AGGRESSIVE,
    };
    let mut detector = earshot::VoiceActivityDetector::new(profile);

    let mut flags = Vec::new();
    let mut starts = Vec::new();
    for (i, frame) in pcm.chunks_exact(FRAME_SAMPLES).enumerate() {
        let voiced = detector
            .predict_16khz(frame)
            .map_err(|e| VadError::Detector(format!("{e:?}")))?;
        flags.push(voiced);
        starts.push(i as f32 * FRAME_S);
    }

    Ok(collapse_flags(&flags, &starts, FRAME_S))
}
