pub mod replay;
pub mod worker;

// Re-exports for convenience
pub use replay::{RecordedFrame, ReplayStream, read_recording, start_replay_stream};
pub use worker::{SessionEvent, start_session_worker};
