pub mod backend;
pub mod gateway;

pub use backend::{HttpTranscriptionBackend, TranscriptionBackend};
pub use gateway::TranscriptionGateway;
