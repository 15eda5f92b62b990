use tracing::warn;

use crate::config::StreamingConfig;

/// Thresholds for the preprocessing chain.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    /// Noise gate threshold as a fraction of full scale.
    pub noise_gate: f32,
    /// Peak amplitude below which a trim frame counts as silence.
    pub trim_threshold: i16,
    /// Trim frame size in samples.
    pub trim_frame_size: usize,
    /// Peak normalization target as a fraction of full scale.
    pub normalize_target: f32,
}

impl From<&StreamingConfig> for ProcessorConfig {
    fn from(cfg: &StreamingConfig) -> Self {
        Self {
            noise_gate: cfg.noise_gate,
            trim_threshold: cfg.trim_threshold,
            trim_frame_size: cfg.trim_frame_size,
            normalize_target: cfg.normalize_target,
        }
    }
}

/// Run the full preprocessing chain on a segment: noise gate, silence trim,
/// then DC-offset removal with peak normalization.
pub fn preprocess(samples: &[i16], cfg: &ProcessorConfig) -> Vec<i16> {
    let gated = apply_noise_gate(samples, cfg.noise_gate);
    let trimmed = trim_silence(&gated, cfg.trim_threshold, cfg.trim_frame_size);
    normalize_volume(trimmed, cfg.normalize_target)
}

/// Zero every sample whose magnitude falls below `threshold` of full scale.
pub fn apply_noise_gate(samples: &[i16], threshold: f32) -> Vec<i16> {
    let threshold_abs = (threshold * 32768.0) as i32;

    samples
        .iter()
        .map(|&s| {
            if (s as i32).abs() < threshold_abs {
                0
            } else {
                s
            }
        })
        .collect()
}

/// Drop leading and trailing frames whose peak magnitude stays below
/// `threshold`. An entirely quiet segment trims to empty.
pub fn trim_silence(samples: &[i16], threshold: i16, frame_size: usize) -> &[i16] {
    let n = samples.len();
    if n == 0 || frame_size == 0 {
        return samples;
    }

    let frame_peak = |frame: &[i16]| {
        frame
            .iter()
            .map(|&s| (s as i32).unsigned_abs())
            .max()
            .unwrap_or(0)
    };

    let mut start = 0;
    while start < n {
        let end = (start + frame_size).min(n);
        if frame_peak(&samples[start..end]) > threshold as u32 {
            break;
        }
        start += frame_size;
    }

    let mut stop = n;
    while stop > start {
        let begin = stop.saturating_sub(frame_size).max(start);
        if frame_peak(&samples[begin..stop]) > threshold as u32 {
            break;
        }
        stop -= frame_size.min(stop - start);
    }

    &samples[start.min(stop)..stop]
}

/// Remove the DC offset and scale the peak to `target_peak` of full scale,
/// clamping to the i16 range.
pub fn normalize_volume(samples: &[i16], target_peak: f32) -> Vec<i16> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let sum: i64 = samples.iter().map(|&s| s as i64).sum();
    let mean = sum as f64 / n as f64;

    let peak = samples
        .iter()
        .map(|&s| (s as f64 - mean).abs())
        .fold(0.0_f64, f64::max);

    if peak == 0.0 {
        return samples.to_vec();
    }

    let gain = (target_peak as f64 * 32767.0) / peak;

    samples
        .iter()
        .map(|&s| {
            let v = ((s as f64 - mean) * gain).round();
            v.clamp(-32768.0, 32767.0) as i16
        })
        .collect()
}

/// Interpret raw bytes as little-endian 16-bit PCM samples. A trailing odd
/// byte (malformed input) is dropped with a warning.
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    if bytes.len() % 2 != 0 {
        warn!(
            "Odd PCM byte length ({}), dropping trailing byte",
            bytes.len()
        );
    }

    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Serialize samples back to little-endian PCM bytes.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
