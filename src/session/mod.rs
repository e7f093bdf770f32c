//! Interview capture session management
//!
//! This module provides the `CaptureSession` abstraction that manages:
//! - Media acquisition with mute/unmute track toggles
//! - Chunked audio recording (1-second encoded fragments)
//! - Face-frame sampling from the live camera feed
//! - The session timer with its hard duration cap
//! - The audio level meter
//! - The optional transcript streaming channel
//! - Aggregation of externally-supplied live interview metrics

mod config;
mod events;
mod metrics;
mod session;
mod stats;

pub use config::CaptureConfig;
pub use events::CaptureEvent;
pub use metrics::{
    BehaviorSignal, CommunicationSignal, FaceMetricsSummary, FacialSignal, HeadPose, LiveMetrics,
    MetricsSnapshot,
};
pub use session::{CaptureSession, SessionState};
pub use stats::{SessionStats, TranscriptSegment};
