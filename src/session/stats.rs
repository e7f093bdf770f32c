use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionState;

/// Statistics about a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// When the session object was created
    pub started_at: DateTime<Utc>,

    /// Elapsed recording time in whole seconds
    pub elapsed_seconds: u32,

    /// Number of audio fragments collected so far
    pub chunks_count: usize,

    /// Number of transcript segments received
    pub transcript_segments_count: usize,
}

/// A single transcript segment from the streaming channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Transcribed text
    pub text: String,

    /// When this segment was received
    pub timestamp: DateTime<Utc>,

    /// Confidence score (0.0 to 1.0), if available
    pub confidence: Option<f32>,

    /// Whether this is a partial (interim) result
    pub partial: bool,
}
