use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

/// Streaming pipeline configuration.
///
/// Every field can be overridden through the environment with a
/// `TRANSCRIPTER_` prefix (e.g. `TRANSCRIPTER_SEGMENT_SIZE_BYTES=96000`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Backlog size that triggers a transcription attempt.
    /// 192000 bytes ≈ 6s at 16kHz 16-bit mono (longer = better context).
    pub segment_size_bytes: usize,

    /// Trailing audio retained across segment boundaries, in milliseconds.
    /// Prevents losing words that straddle a boundary.
    pub overlap_ms: u64,

    /// Hard cap on the backlog. A silent connection can fail the quality
    /// gate indefinitely; oldest bytes are evicted past this point.
    pub max_backlog_bytes: usize,

    /// Noise gate threshold as a fraction of full scale.
    pub noise_gate: f32,

    /// Peak amplitude below which a frame counts as silence when trimming.
    pub trim_threshold: i16,

    /// Trim frame size in samples (160 = 10ms at 16kHz).
    pub trim_frame_size: usize,

    /// Peak normalization target as a fraction of full scale.
    pub normalize_target: f32,

    /// Minimum RMS amplitude for a segment to be worth transcribing.
    pub min_rms: f64,

    /// Minimum RMS as a percentage of full scale.
    pub min_rms_percent: f64,

    /// Minimum time between backend requests per session. Segments ready
    /// sooner than this are dropped, not queued.
    pub min_dispatch_interval_ms: u64,

    /// Delay between the interim and final emission of a transcript.
    pub final_delay_ms: u64,

    /// Script share above which a language guess is high-confidence.
    pub high_confidence: f64,

    /// Script share above which a language guess is low-confidence.
    pub low_confidence: f64,

    /// Minimum transcript word count before detection may lock.
    pub lock_min_words: usize,

    /// Number of detection samples required before locking.
    pub lock_history_len: usize,

    /// PCM sample rate in Hz. The backend expects 16kHz mono 16-bit.
    pub sample_rate: u32,

    /// Language hint used before any detection has locked.
    pub default_language: String,

    /// Ask the backend to punctuate transcripts.
    pub enable_punctuation: bool,

    /// Ask the backend to apply casing.
    pub enable_casing: bool,

    /// Ask the backend for inverse text normalization (spoken numbers etc.).
    pub enable_itn: bool,

    /// Optional speaker diarization; omitted from requests when unset.
    pub diarization: Option<bool>,

    /// Optional translation of the transcript; omitted when unset.
    pub translate: Option<bool>,

    /// Target language for translation; omitted when unset.
    pub target_language_code: Option<String>,

    /// Comma-separated vocabulary hints for the backend; omitted when unset.
    pub custom_vocabulary: Option<String>,

    /// Transcription backend endpoint.
    pub api_url: String,

    /// Transcription backend subscription key.
    pub api_key: String,

    /// Per-request timeout for backend calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            segment_size_bytes: 192_000,
            overlap_ms: 1000,
            max_backlog_bytes: 768_000,
            noise_gate: 0.02,
            trim_threshold: 600,
            trim_frame_size: 160,
            normalize_target: 0.95,
            min_rms: 400.0,
            min_rms_percent: 1.5,
            min_dispatch_interval_ms: 1000,
            final_delay_ms: 500,
            high_confidence: 0.70,
            low_confidence: 0.40,
            lock_min_words: 5,
            lock_history_len: 2,
            sample_rate: 16_000,
            default_language: "en-IN".to_string(),
            enable_punctuation: true,
            enable_casing: true,
            enable_itn: true,
            diarization: None,
            translate: None,
            target_language_code: None,
            custom_vocabulary: None,
            api_url: "https://api.sarvam.ai/speech-to-text-translate".to_string(),
            api_key: String::new(),
            request_timeout_secs: 10,
        }
    }
}

impl StreamingConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("TRANSCRIPTER").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// PCM bytes per second of audio (16-bit mono).
    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * 2
    }

    /// Overlap window converted to bytes, aligned to whole samples.
    pub fn overlap_bytes(&self) -> usize {
        let bytes = self.overlap_ms as usize * self.bytes_per_second() / 1000;
        bytes & !1
    }

    pub fn min_dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.min_dispatch_interval_ms)
    }

    pub fn final_delay(&self) -> Duration {
        Duration::from_millis(self.final_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
