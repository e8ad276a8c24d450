//! Hand-landmark gesture recognition: per-frame classification, temporal
//! debouncing, cursor smoothing and a threaded session pipeline.

pub mod config;
pub mod cursor;
pub mod debounce;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod pipeline;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::{ActiveZone, ContextMode, GestureConfig};
pub use error::{Error, Result};
pub use gesture::{GestureClassifier, MotionTracker};
pub use session::{FrameOutcome, GestureSession, GestureSink, MetricsSnapshot};
pub use types::{
    GestureCandidate, GestureKind, HandFrame, HandObservation, Handedness, Landmark, MotionEvent,
};
