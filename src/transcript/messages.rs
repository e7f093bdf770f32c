use serde::{Deserialize, Serialize};

/// Transcript increment received from the streaming STT collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub text: String,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub confidence: Option<f32>,
}
