use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use transcripter_core::{
    HttpTranscriptionBackend, SessionRegistry, StreamingConfig, TranscriptionGateway,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Arc::new(StreamingConfig::from_env()?);

    info!("Transcripter core v0.1.0");
    info!(
        "Segment: {} bytes (~{:.1}s), overlap: {}ms, throttle: {}ms",
        config.segment_size_bytes,
        config.segment_size_bytes as f64 / config.bytes_per_second() as f64,
        config.overlap_ms,
        config.min_dispatch_interval_ms
    );
    info!("Transcription backend: {}", config.api_url);

    if config.api_key.is_empty() {
        warn!("TRANSCRIPTER_API_KEY not set; backend requests will be rejected");
    }

    let backend = Arc::new(HttpTranscriptionBackend::new(&config)?);
    let gateway = Arc::new(TranscriptionGateway::new(backend, &config));
    let registry = SessionRegistry::new(gateway, config);

    info!(
        "Ready for transport layer to create sessions ({} active)",
        registry.len().await
    );

    Ok(())
}
