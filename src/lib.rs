pub mod audio;
pub mod config;
pub mod language;
pub mod session;
pub mod transcribe;

pub use audio::{AudioQuality, ProcessorConfig};
pub use config::StreamingConfig;
pub use language::{detect_language, display_name, LanguageGuess, Strength};
pub use session::{
    ClientEvent, LanguageMode, SessionEvent, SessionHandle, SessionRegistry, SessionTask,
};
pub use transcribe::{HttpTranscriptionBackend, TranscriptionBackend, TranscriptionGateway};
