use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::media::AudioConstraints;

/// Configuration for one capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Unique session identifier (e.g., "interview-2026-08-23-behavioral")
    pub session_id: String,

    /// Hard ceiling on recording length; the session auto-stops at the cap
    pub max_duration_secs: u32,

    /// Cadence of encoded audio fragments (default: 1 second slices)
    pub chunk_duration: Duration,

    /// How often a face frame is sampled from the live camera feed
    pub face_interval: Duration,

    /// How often the audio level meter publishes a reading
    pub level_interval: Duration,

    /// FFT size for the level meter's frequency analyser
    pub fft_size: usize,

    /// JPEG quality (1-100) for sampled face frames
    pub jpeg_quality: u8,

    /// Upper bound on waiting for the recorder's final flush on stop
    pub stop_flush_timeout: Duration,

    /// Requested microphone characteristics
    pub constraints: AudioConstraints,

    /// Transcript streaming endpoint; the channel stays disabled when unset
    pub transcript_url: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            max_duration_secs: 180, // 03:00 cap on every answer
            chunk_duration: Duration::from_secs(1),
            face_interval: Duration::from_secs(2),
            level_interval: Duration::from_millis(100),
            fft_size: 2048,
            jpeg_quality: 80,
            stop_flush_timeout: Duration::from_secs(2),
            constraints: AudioConstraints::default(),
            transcript_url: None,
        }
    }
}
