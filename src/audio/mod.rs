pub mod processor;
pub mod quality;
pub mod wav;

pub use processor::{
    apply_noise_gate, bytes_to_samples, normalize_volume, preprocess, samples_to_bytes,
    trim_silence, ProcessorConfig,
};
pub use quality::AudioQuality;
pub use wav::encode_wav;
