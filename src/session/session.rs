use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::events::{ClientEvent, LanguageMode, SessionEvent};
use crate::audio::{bytes_to_samples, preprocess, AudioQuality, ProcessorConfig};
use crate::config::StreamingConfig;
use crate::language::{detect_language, display_name};
use crate::transcribe::gateway::is_noise;
use crate::transcribe::TranscriptionGateway;

/// Detection guesses kept while waiting for a lock.
const DETECTION_HISTORY_CAP: usize = 32;

/// Confidence reported once detection locks after consistent guesses.
const LOCK_CONFIDENCE: f64 = 0.95;

/// Session lifecycle. Transitions are one-way:
/// `Active -> Stopping -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Stopping,
    Closed,
}

/// Take ownership of a full backlog as a segment, returning the segment and
/// the trailing slice to retain as the next backlog's seed.
///
/// The retained slice is the last `overlap_bytes` of the segment, or empty
/// when the overlap window is longer than the segment itself.
pub fn split_segment(backlog: Vec<u8>, overlap_bytes: usize) -> (Vec<u8>, Vec<u8>) {
    if overlap_bytes == 0 || overlap_bytes >= backlog.len() {
        return (backlog, Vec::new());
    }

    let retained = backlog[backlog.len() - overlap_bytes..].to_vec();
    (backlog, retained)
}

/// One streaming transcription session.
///
/// Owns all per-connection state exclusively; the only way in is the mailbox
/// consumed by [`SessionTask::run`], so events are processed strictly in
/// arrival order without any locking.
pub struct SessionTask {
    id: String,
    mode: LanguageMode,
    detected_language: Option<String>,
    detection_history: Vec<String>,
    backlog: Vec<u8>,
    last_dispatch: Option<Instant>,
    lifecycle: Lifecycle,

    /// Shared with deferred final-transcript tasks so they become no-ops
    /// once the session closes.
    closed: Arc<AtomicBool>,

    outbound: mpsc::Sender<ClientEvent>,
    gateway: Arc<TranscriptionGateway>,
    config: Arc<StreamingConfig>,
}

impl SessionTask {
    pub fn new(
        id: String,
        mode: LanguageMode,
        outbound: mpsc::Sender<ClientEvent>,
        gateway: Arc<TranscriptionGateway>,
        config: Arc<StreamingConfig>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            mode,
            detected_language: None,
            detection_history: Vec::new(),
            backlog: Vec::new(),
            last_dispatch: None,
            lifecycle: Lifecycle::Active,
            closed,
            outbound,
            gateway,
            config,
        }
    }

    /// Process mailbox events until a stop, disconnect, or the transport
    /// dropping its sender, then run the final flush.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SessionEvent>) {
        info!(
            "Session {} started (mode: {})",
            self.id,
            match &self.mode {
                LanguageMode::Auto => "auto-detect",
                LanguageMode::Fixed(tag) => tag.as_str(),
            }
        );

        let ready_language = match &self.mode {
            LanguageMode::Auto => "Detecting...".to_string(),
            LanguageMode::Fixed(tag) => tag.clone(),
        };
        self.emit(ClientEvent::Ready {
            session_id: self.id.clone(),
            language: ready_language,
            auto_detect: self.mode.is_auto(),
        })
        .await;

        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Audio(bytes) => {
                    if self.lifecycle == Lifecycle::Active {
                        self.ingest(bytes).await;
                    } else {
                        debug!("Session {} rejecting audio while stopping", self.id);
                    }
                }
                SessionEvent::Stop => {
                    info!("Session {} stopping", self.id);
                    self.lifecycle = Lifecycle::Stopping;
                    // Drain (and reject) whatever the transport already
                    // queued, then fall out of the loop.
                    rx.close();
                }
                SessionEvent::Disconnect => {
                    info!("Session {} disconnected", self.id);
                    self.lifecycle = Lifecycle::Stopping;
                    rx.close();
                }
            }
        }

        self.finish().await;
    }

    /// Append inbound audio and dispatch a segment once the backlog crosses
    /// the threshold. Accumulation never blocks on segment disposal.
    async fn ingest(&mut self, bytes: Vec<u8>) {
        self.backlog.extend_from_slice(&bytes);

        // A silent connection can fail the quality gate forever; keep the
        // newest audio and evict the oldest past the cap.
        if self.backlog.len() > self.config.max_backlog_bytes {
            let excess = self.backlog.len() - self.config.max_backlog_bytes;
            self.backlog.drain(..excess);
            warn!(
                "Session {} backlog capped at {} bytes (evicted {} oldest)",
                self.id, self.config.max_backlog_bytes, excess
            );
        }

        if self.backlog.len() >= self.config.segment_size_bytes {
            self.try_dispatch(false).await;
        }
    }

    /// Run the backlog through preprocessing, the quality gate, throttling,
    /// and the backend. `flush` marks the one-shot residual dispatch during
    /// teardown, which skips overlap retention and awaits the final inline.
    async fn try_dispatch(&mut self, flush: bool) {
        let samples = bytes_to_samples(&self.backlog);
        if samples.is_empty() {
            return;
        }

        let processed = preprocess(&samples, &ProcessorConfig::from(self.config.as_ref()));
        let quality = AudioQuality::measure(&processed);

        if !quality.passes(self.config.min_rms, self.config.min_rms_percent) {
            debug!(
                "Session {} audio too quiet (rms: {:.0}, {:.2}%, peak: {}), accumulating",
                self.id, quality.rms, quality.rms_percent, quality.peak
            );
            return;
        }

        // The segment is committed now: retain only the overlap window so
        // words straddling the boundary survive into the next segment.
        if !flush {
            let backlog = std::mem::take(&mut self.backlog);
            let (_, retained) = split_segment(backlog, self.config.overlap_bytes());
            self.backlog = retained;
        } else {
            self.backlog.clear();
        }

        // Recency over completeness: a segment ready too soon after the
        // previous dispatch is dropped, never queued.
        if self.gateway.throttled(self.last_dispatch) {
            debug!("Session {} throttled, dropping segment", self.id);
            return;
        }
        self.last_dispatch = Some(Instant::now());

        let hint = self.language_hint();

        match self.gateway.transcribe_segment(&processed, &hint).await {
            Ok(transcript) => self.handle_transcript(transcript, hint, flush).await,
            Err(e) => {
                error!("Session {} transcription failed: {:#}", self.id, e);
                self.emit(ClientEvent::Error {
                    message: "Transcription request failed".to_string(),
                })
                .await;
            }
        }
    }

    /// The language tag attached to the next backend request.
    fn language_hint(&self) -> String {
        if let Some(tag) = &self.detected_language {
            return tag.clone();
        }
        match &self.mode {
            LanguageMode::Fixed(tag) => tag.clone(),
            LanguageMode::Auto => self.config.default_language.clone(),
        }
    }

    async fn handle_transcript(&mut self, transcript: String, hint: String, flush: bool) {
        if is_noise(&transcript) {
            info!(
                "Session {} skipping filler/junk transcript: {:?}",
                self.id,
                transcript.trim()
            );
            return;
        }

        if self.mode.is_auto() && self.detected_language.is_none() {
            self.accumulate_detection(&transcript, &hint).await;
        }

        let language = self.detected_language.clone().unwrap_or(hint);

        self.emit(ClientEvent::InterimTranscript {
            text: transcript.clone(),
            language: language.clone(),
            timestamp: Utc::now(),
        })
        .await;

        // The final is decoupled from the interim by a short delay: more
        // audio might still arrive before the text is worth committing.
        let final_event = ClientEvent::FinalTranscript {
            text: transcript,
            language,
            timestamp: Utc::now(),
        };

        if flush {
            // Teardown awaits the final inline so `stopped` stays last.
            tokio::time::sleep(self.config.final_delay()).await;
            self.emit(final_event).await;
        } else {
            let outbound = self.outbound.clone();
            let closed = Arc::clone(&self.closed);
            let delay = self.config.final_delay();

            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if !closed.load(Ordering::SeqCst) {
                    let _ = outbound.send(final_event).await;
                }
            });
        }
    }

    /// Record one detection guess and lock the language once the evidence is
    /// consistent. Locked detection never changes again.
    async fn accumulate_detection(&mut self, transcript: &str, hint: &str) {
        let guess = detect_language(
            transcript,
            hint,
            self.config.high_confidence,
            self.config.low_confidence,
        );

        if !guess.is_evidence() {
            debug!(
                "Session {} unclear script (ratio {:.2}), keeping hint {}",
                self.id, guess.ratio, hint
            );
            return;
        }

        self.detection_history.push(guess.tag.clone());
        if self.detection_history.len() > DETECTION_HISTORY_CAP {
            self.detection_history.remove(0);
        }

        let word_count = transcript.split_whitespace().count();
        let consistent = self.detection_history.len() >= self.config.lock_history_len
            && matches!(
                &self.detection_history[..],
                [.., a, b] if a == b
            );

        if word_count >= self.config.lock_min_words && consistent {
            let tag = guess.tag;
            info!(
                "Session {} language detected and locked: {} (after {} samples)",
                self.id,
                tag,
                self.detection_history.len()
            );

            self.detected_language = Some(tag.clone());
            self.emit(ClientEvent::LanguageDetected {
                language: tag.clone(),
                language_name: display_name(&tag),
                confidence: LOCK_CONFIDENCE,
            })
            .await;
        } else {
            debug!(
                "Session {} accumulating detection evidence ({} words, {} samples)",
                self.id,
                word_count,
                self.detection_history.len()
            );
        }
    }

    /// Flush the residual backlog once, then close. Cancels any pending
    /// deferred final emissions before `stopped` goes out.
    async fn finish(&mut self) {
        self.lifecycle = Lifecycle::Stopping;

        if !self.backlog.is_empty() {
            self.try_dispatch(true).await;
        }

        self.closed.store(true, Ordering::SeqCst);
        self.lifecycle = Lifecycle::Closed;

        self.emit(ClientEvent::Stopped).await;
        info!("Session {} closed", self.id);
    }

    async fn emit(&self, event: ClientEvent) {
        // The transport side may already be gone on disconnect; that is fine.
        if self.outbound.send(event).await.is_err() {
            debug!("Session {} outbound channel closed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_retains_trailing_overlap() {
        let backlog: Vec<u8> = (0..100).collect();
        let (segment, retained) = split_segment(backlog.clone(), 10);
        assert_eq!(segment, backlog);
        assert_eq!(retained, (90..100).collect::<Vec<u8>>());
    }

    #[test]
    fn split_with_oversized_overlap_retains_nothing() {
        let backlog: Vec<u8> = (0..20).collect();
        let (segment, retained) = split_segment(backlog.clone(), 50);
        assert_eq!(segment, backlog);
        assert!(retained.is_empty());
    }

    #[test]
    fn split_with_zero_overlap_retains_nothing() {
        let (_, retained) = split_segment(vec![1, 2, 3], 0);
        assert!(retained.is_empty());
    }
}
