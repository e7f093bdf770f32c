use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::backend::{AudioConstraints, AudioFrame, AudioStream, CameraView, MediaBackend, VideoStream};

/// Owner of the microphone and camera device streams
///
/// Streams are acquired lazily before a recording and released only when the
/// session is closed, so a second recording never re-prompts the device layer.
/// Acquisition failures are logged and leave the stream unset; dependent
/// operations degrade to no-ops.
pub struct MediaStreams {
    backend: Arc<dyn MediaBackend>,
    constraints: AudioConstraints,
    mic: Option<AudioStream>,
    cam: Option<VideoStream>,
}

impl MediaStreams {
    pub fn new(backend: Arc<dyn MediaBackend>, constraints: AudioConstraints) -> Self {
        Self {
            backend,
            constraints,
            mic: None,
            cam: None,
        }
    }

    /// Acquire any stream that is not already present
    pub async fn ensure_streams(&mut self) {
        if self.mic.is_none() {
            match self.backend.open_microphone(&self.constraints).await {
                Ok(stream) => {
                    info!(
                        "microphone stream opened via {} ({}Hz, {} channels)",
                        self.backend.name(),
                        self.constraints.sample_rate,
                        self.constraints.channels
                    );
                    self.mic = Some(stream);
                }
                Err(e) => error!("microphone unavailable: {:#}", e),
            }
        }

        if self.cam.is_none() {
            match self.backend.open_camera().await {
                Ok(stream) => {
                    info!("camera stream opened via {}", self.backend.name());
                    self.cam = Some(stream);
                }
                Err(e) => warn!("camera unavailable: {:#}", e),
            }
        }
    }

    pub fn has_microphone(&self) -> bool {
        self.mic.is_some()
    }

    pub fn has_camera(&self) -> bool {
        self.cam.is_some()
    }

    pub fn mic_id(&self) -> Option<Uuid> {
        self.mic.as_ref().map(|s| s.id())
    }

    pub fn cam_id(&self) -> Option<Uuid> {
        self.cam.as_ref().map(|s| s.id())
    }

    pub fn mic_enabled(&self) -> bool {
        self.mic.as_ref().map(|s| s.is_enabled()).unwrap_or(false)
    }

    pub fn cam_enabled(&self) -> bool {
        self.cam.as_ref().map(|s| s.is_enabled()).unwrap_or(false)
    }

    /// Track-enable toggle: never stops or re-acquires the device
    pub fn set_mic_enabled(&self, enabled: bool) {
        match &self.mic {
            Some(stream) => stream.set_enabled(enabled),
            None => warn!("no microphone stream to toggle"),
        }
    }

    pub fn set_cam_enabled(&self, enabled: bool) {
        match &self.cam {
            Some(stream) => stream.set_enabled(enabled),
            None => warn!("no camera stream to toggle"),
        }
    }

    pub fn camera_view(&self) -> Option<CameraView> {
        self.cam.as_ref().map(|s| s.view())
    }

    /// Borrow the microphone frame receiver for the duration of a recording.
    ///
    /// A stream whose receiver was lost (a recording that had to be aborted)
    /// is unusable and gets dropped so the next acquisition starts fresh.
    pub(crate) fn take_mic_receiver(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        let stream = self.mic.as_mut()?;
        match stream.take_receiver() {
            Some(rx) => Some(rx),
            None => {
                warn!("microphone stream lost its receiver; releasing it");
                self.mic = None;
                None
            }
        }
    }

    pub(crate) fn restore_mic_receiver(&mut self, receiver: mpsc::Receiver<AudioFrame>) {
        if let Some(stream) = self.mic.as_mut() {
            stream.restore_receiver(receiver);
        }
    }

    pub(crate) fn drop_microphone(&mut self) {
        self.mic = None;
    }

    /// Stop every device stream; called on session close only
    pub fn release(&mut self) {
        if let Some(mic) = self.mic.take() {
            mic.stop_tracks();
        }
        if let Some(cam) = self.cam.take() {
            cam.stop_tracks();
        }
        info!("device streams released");
    }
}
