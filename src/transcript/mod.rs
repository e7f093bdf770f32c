//! Optional transcript streaming channel
//!
//! When enabled, every audio fragment produced during a recording is pushed
//! over a socket, and incoming transcript increments flow back to the
//! session. Strictly best-effort: a channel that fails to open, errors, or
//! closes mid-recording never disturbs the primary recording path.

pub mod messages;
pub mod ws;

use anyhow::Result;
use tokio::sync::mpsc;

pub use messages::TranscriptMessage;
pub use ws::connect as connect_ws;

/// Outbound half of a transcript channel
///
/// Fragments are only offered while `is_open` reports true; a closed sink is
/// simply skipped (the fragment still lands in the recording).
#[async_trait::async_trait]
pub trait TranscriptSink: Send {
    fn is_open(&self) -> bool;

    async fn send_audio(&mut self, fragment: &[u8]) -> Result<()>;

    /// Closing an already-closed sink is a no-op
    async fn close(&mut self) -> Result<()>;
}

/// A connected transcript channel: the audio sink plus the stream of
/// incoming transcript increments
pub struct TranscriptChannel {
    sink: Box<dyn TranscriptSink>,
    messages: mpsc::Receiver<TranscriptMessage>,
}

impl TranscriptChannel {
    pub fn new(sink: Box<dyn TranscriptSink>, messages: mpsc::Receiver<TranscriptMessage>) -> Self {
        Self { sink, messages }
    }

    pub(crate) fn into_parts(self) -> (Box<dyn TranscriptSink>, mpsc::Receiver<TranscriptMessage>) {
        (self.sink, self.messages)
    }
}
