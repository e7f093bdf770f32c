// Shared test support: a synthetic capture session wired for virtual time,
// a recording transcript sink, and device backends with missing hardware.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

use studymate_capture::{
    AudioConstraints, AudioStream, CaptureConfig, CaptureEvent, CaptureSession, MediaBackend,
    SyntheticBackend, TranscriptSink, VideoStream,
};

/// Small sample rate and an off-grid frame cadence (90ms never lands on a
/// whole-second chunk boundary inside a short test) keep timer-driven tests
/// deterministic under paused time.
pub fn test_config() -> CaptureConfig {
    CaptureConfig {
        session_id: "test-session".to_string(),
        constraints: AudioConstraints {
            sample_rate: 8000,
            channels: 1,
            frame_duration_ms: 90,
            ..AudioConstraints::default()
        },
        ..CaptureConfig::default()
    }
}

pub fn synthetic_session(
    config: CaptureConfig,
) -> (CaptureSession, UnboundedReceiver<CaptureEvent>) {
    CaptureSession::new(config, Arc::new(SyntheticBackend::new()))
}

pub fn drain_events(rx: &mut UnboundedReceiver<CaptureEvent>) -> Vec<CaptureEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn face_frames(events: &[CaptureEvent]) -> Vec<&String> {
    events
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::FaceFrame(uri) => Some(uri),
            _ => None,
        })
        .collect()
}

pub fn audio_ready(events: &[CaptureEvent]) -> Vec<&studymate_capture::AudioBlob> {
    events
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::AudioReady(blob) => Some(blob),
            _ => None,
        })
        .collect()
}

pub fn recording_changes(events: &[CaptureEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::RecordingChange(recording) => Some(*recording),
            _ => None,
        })
        .collect()
}

/// Transcript sink that records every fragment offered to it
pub struct RecordingSink {
    pub open: Arc<AtomicBool>,
    pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Arc<AtomicBool>, Arc<Mutex<Vec<Vec<u8>>>>) {
        let open = Arc::new(AtomicBool::new(true));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Self {
            open: Arc::clone(&open),
            sent: Arc::clone(&sent),
        };
        (sink, open, sent)
    }
}

#[async_trait::async_trait]
impl TranscriptSink for RecordingSink {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn send_audio(&mut self, fragment: &[u8]) -> Result<()> {
        assert!(self.is_open(), "send attempted on a closed channel");
        self.sent.lock().unwrap().push(fragment.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Backend with no devices at all
pub struct NoMediaBackend;

#[async_trait::async_trait]
impl MediaBackend for NoMediaBackend {
    async fn open_microphone(&self, _constraints: &AudioConstraints) -> Result<AudioStream> {
        Err(anyhow!("microphone permission denied"))
    }

    async fn open_camera(&self) -> Result<VideoStream> {
        Err(anyhow!("camera permission denied"))
    }

    fn name(&self) -> &str {
        "no-media"
    }
}

/// Backend with a working microphone but no camera
pub struct MicOnlyBackend {
    inner: SyntheticBackend,
}

impl MicOnlyBackend {
    pub fn new() -> Self {
        Self {
            inner: SyntheticBackend::new(),
        }
    }
}

#[async_trait::async_trait]
impl MediaBackend for MicOnlyBackend {
    async fn open_microphone(&self, constraints: &AudioConstraints) -> Result<AudioStream> {
        self.inner.open_microphone(constraints).await
    }

    async fn open_camera(&self) -> Result<VideoStream> {
        Err(anyhow!("camera permission denied"))
    }

    fn name(&self) -> &str {
        "mic-only"
    }
}
