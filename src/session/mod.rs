pub mod events;
pub mod registry;
pub mod session;

pub use events::{ClientEvent, LanguageMode, SessionEvent};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{split_segment, Lifecycle, SessionTask};
