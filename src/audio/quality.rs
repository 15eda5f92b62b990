/// RMS-based loudness measurement over a processed segment.
///
/// Used to decide whether a segment is worth sending to the transcription
/// backend at all; silence and background hum fail the gate and the session
/// keeps accumulating instead.
#[derive(Debug, Clone, Copy)]
pub struct AudioQuality {
    /// Root-mean-square amplitude.
    pub rms: f64,
    /// RMS as a percentage of full scale (32768).
    pub rms_percent: f64,
    /// Peak sample magnitude.
    pub peak: u32,
}

impl AudioQuality {
    /// Measure a segment. An empty segment measures as silence.
    pub fn measure(samples: &[i16]) -> Self {
        if samples.is_empty() {
            return Self {
                rms: 0.0,
                rms_percent: 0.0,
                peak: 0,
            };
        }

        let mut sum_squares = 0.0_f64;
        let mut peak = 0u32;

        for &sample in samples {
            let magnitude = (sample as i32).unsigned_abs();
            sum_squares += (magnitude as f64) * (magnitude as f64);
            if magnitude > peak {
                peak = magnitude;
            }
        }

        let rms = (sum_squares / samples.len() as f64).sqrt();
        let rms_percent = rms / 32768.0 * 100.0;

        Self {
            rms,
            rms_percent,
            peak,
        }
    }

    /// A segment passes only when both the absolute RMS floor and the
    /// relative percentage floor are exceeded.
    pub fn passes(&self, min_rms: f64, min_percent: f64) -> bool {
        self.rms > min_rms && self.rms_percent > min_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_fails_the_gate() {
        let q = AudioQuality::measure(&vec![0i16; 1600]);
        assert_eq!(q.rms, 0.0);
        assert!(!q.passes(400.0, 1.5));
    }

    #[test]
    fn loud_audio_passes_the_gate() {
        let samples: Vec<i16> = (0..1600).map(|i| if i % 2 == 0 { 8000 } else { -8000 }).collect();
        let q = AudioQuality::measure(&samples);
        assert!(q.rms > 400.0);
        assert_eq!(q.peak, 8000);
        assert!(q.passes(400.0, 1.5));
    }

    #[test]
    fn gate_is_monotonic_in_amplitude() {
        let loud: Vec<i16> = (0..1600).map(|i| if i % 2 == 0 { 8000 } else { -8000 }).collect();
        assert!(AudioQuality::measure(&loud).passes(400.0, 1.5));

        // Scale the passing segment down below the floors and it must fail
        let quiet: Vec<i16> = loud.iter().map(|&s| s / 100).collect();
        assert!(!AudioQuality::measure(&quiet).passes(400.0, 1.5));

        // Scale a failing segment back up and it must pass again
        let restored: Vec<i16> = quiet.iter().map(|&s| s * 100).collect();
        assert!(AudioQuality::measure(&restored).passes(400.0, 1.5));
    }
}
