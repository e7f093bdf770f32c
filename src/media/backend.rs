use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the stream opened
    pub timestamp_ms: u64,
}

/// A single still image from the live camera feed (RGB8, row-major)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Timestamp in milliseconds since the stream opened
    pub timestamp_ms: u64,
}

/// Requested microphone characteristics, passed to the device layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConstraints {
    pub sample_rate: u32,
    pub channels: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    /// Duration of each delivered audio frame in milliseconds
    pub frame_duration_ms: u64,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono, the STT-friendly default
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            frame_duration_ms: 100,
        }
    }
}

/// Media device backend trait
///
/// The device-permission collaborator: opens microphone and camera streams
/// independently. Either may fail (device missing, permission denied) without
/// affecting the other.
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Open the microphone and start delivering audio frames
    async fn open_microphone(&self, constraints: &AudioConstraints) -> Result<AudioStream>;

    /// Open the camera and start publishing the current frame
    async fn open_camera(&self) -> Result<VideoStream>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// A live microphone stream
///
/// The producer keeps running for the lifetime of the stream; `set_enabled`
/// suspends track output (frames carry silence) without stopping the device,
/// so toggling is cheap and reversible. `stop_tracks` shuts the producer down
/// for good.
pub struct AudioStream {
    id: Uuid,
    enabled: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    receiver: Option<mpsc::Receiver<AudioFrame>>,
}

impl AudioStream {
    pub fn new(
        receiver: mpsc::Receiver<AudioFrame>,
        enabled: Arc<AtomicBool>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            enabled,
            stop,
            receiver: Some(receiver),
        }
    }

    /// Stable identity of the underlying device stream
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Stop the underlying device stream permanently
    pub fn stop_tracks(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn take_receiver(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.receiver.take()
    }

    pub(crate) fn restore_receiver(&mut self, receiver: mpsc::Receiver<AudioFrame>) {
        self.receiver = Some(receiver);
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// A live camera stream
///
/// The producer continuously overwrites the current frame; consumers sample
/// whatever frame is current at the moment they look.
pub struct VideoStream {
    id: Uuid,
    enabled: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    current: Arc<Mutex<Option<VideoFrame>>>,
}

impl VideoStream {
    pub fn new(
        current: Arc<Mutex<Option<VideoFrame>>>,
        enabled: Arc<AtomicBool>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            enabled,
            stop,
            current,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn stop_tracks(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// The most recent frame published by the device, if any
    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    /// A cheap read-only view for frame sampling
    pub fn view(&self) -> CameraView {
        CameraView {
            enabled: Arc::clone(&self.enabled),
            current: Arc::clone(&self.current),
        }
    }
}

impl Drop for VideoStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Read-only handle onto a live camera stream, shared with the capture loop
#[derive(Clone)]
pub struct CameraView {
    enabled: Arc<AtomicBool>,
    current: Arc<Mutex<Option<VideoFrame>>>,
}

impl CameraView {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }
}
