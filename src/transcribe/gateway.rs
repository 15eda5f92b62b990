use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::backend::TranscriptionBackend;
use crate::audio::encode_wav;
use crate::config::StreamingConfig;

/// Short acknowledgments the backend tends to hallucinate on near-silence.
const FILLER_WORDS: &[&str] = &["yes", "no", "hmm", "uh", "um", "ok", "okay", "ah", "ha"];

const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '’', '“', '”', '-', '–', '—', '(', ')', '[', ']',
    '{', '}',
];

/// Issues throttled requests to the transcription backend and cleans up what
/// comes back. Stateless apart from the backend handle; the throttle clock
/// itself lives in the session that owns it.
pub struct TranscriptionGateway {
    backend: Arc<dyn TranscriptionBackend>,
    sample_rate: u32,
    min_interval: Duration,
    request_timeout: Duration,
}

impl TranscriptionGateway {
    pub fn new(backend: Arc<dyn TranscriptionBackend>, cfg: &StreamingConfig) -> Self {
        Self {
            backend,
            sample_rate: cfg.sample_rate,
            min_interval: cfg.min_dispatch_interval(),
            request_timeout: cfg.request_timeout(),
        }
    }

    /// Leaky bucket of depth 1: a segment arriving sooner than the minimum
    /// interval after the last dispatch is dropped, not queued.
    pub fn throttled(&self, last_dispatch: Option<Instant>) -> bool {
        match last_dispatch {
            Some(at) => at.elapsed() < self.min_interval,
            None => false,
        }
    }

    /// Encode a processed segment as WAV and send it to the backend with a
    /// bounded timeout.
    pub async fn transcribe_segment(&self, samples: &[i16], language: &str) -> Result<String> {
        let wav = encode_wav(samples, self.sample_rate)?;

        debug!(
            "Dispatching segment: {} samples ({:.1}s) via {} backend",
            samples.len(),
            samples.len() as f64 / self.sample_rate as f64,
            self.backend.name()
        );

        tokio::time::timeout(self.request_timeout, self.backend.transcribe(wav, language))
            .await
            .context("Transcription request timed out")?
    }
}

/// Lowercase a transcript and strip punctuation, collapsing whitespace.
fn clean_transcript(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a transcript is junk not worth emitting: empty, or a short filler
/// acknowledgment like "ok" or "hmm".
pub fn is_noise(transcript: &str) -> bool {
    if transcript.trim().is_empty() {
        return true;
    }

    let cleaned = clean_transcript(transcript);
    let word_count = cleaned.split_whitespace().count();

    word_count <= 2 && FILLER_WORDS.contains(&cleaned.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_are_noise() {
        assert!(is_noise(""));
        assert!(is_noise("   \n"));
    }

    #[test]
    fn fillers_are_noise() {
        assert!(is_noise("ok"));
        assert!(is_noise("Okay."));
        assert!(is_noise("Hmm!"));
    }

    #[test]
    fn real_transcripts_are_kept() {
        assert!(!is_noise("ok let's go"));
        assert!(!is_noise("नमस्ते दोस्तों"));
        assert!(!is_noise("the meeting starts at nine"));
    }
}
