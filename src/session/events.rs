use crate::media::AudioBlob;

/// Everything a capture session reports to its host
///
/// All timers, the transcript channel, and the recorder funnel through one
/// dispatch point, so events arrive in the order they were produced.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Emitted on every transition into or out of `Recording`
    RecordingChange(bool),

    /// The final concatenated recording, exactly once per completed recording
    AudioReady(AudioBlob),

    /// A sampled camera still as a base64 JPEG data URI
    FaceFrame(String),

    /// A transcript increment from the streaming channel
    TranscriptUpdate(String),

    /// Mean spectral magnitude (0-255) for the live level meter
    AudioLevel(u8),
}
