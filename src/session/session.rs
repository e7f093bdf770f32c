use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::CaptureConfig;
use super::events::CaptureEvent;
use super::metrics::{
    BehaviorSignal, CommunicationSignal, FaceMetricsSummary, FacialSignal, LiveMetrics,
    MetricsSnapshot,
};
use super::stats::{SessionStats, TranscriptSegment};
use crate::media::{
    AudioBlob, AudioFrame, CameraView, FrameEncoder, LevelAnalyser, MediaBackend, MediaStreams,
};
use crate::transcript::{self, TranscriptChannel, TranscriptMessage, TranscriptSink};

/// Lifecycle state of a capture session
///
/// `Idle` and `Stopped` are equivalent re-armable states; a stopped session
/// can start a fresh recording without re-acquiring its device streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Recording,
            2 => SessionState::Stopped,
            _ => SessionState::Idle,
        }
    }
}

/// One interview capture session: media acquisition, chunked audio
/// recording, face-frame sampling, the session timer, the level meter, and
/// the optional transcript channel, all driven by a single recording task.
pub struct CaptureSession {
    config: CaptureConfig,
    started_at: chrono::DateTime<chrono::Utc>,

    /// Device streams, shared with the recording task
    streams: Arc<Mutex<MediaStreams>>,

    state: Arc<AtomicU8>,
    is_recording: Arc<AtomicBool>,
    elapsed_seconds: Arc<AtomicU32>,

    /// Encoded audio fragments of the current/last recording, in production order
    audio_chunks: Arc<Mutex<Vec<Vec<u8>>>>,

    /// Accumulated transcript segments
    transcript_segments: Arc<Mutex<Vec<TranscriptSegment>>>,

    /// Live interview metrics, fed by the external analysis services
    metrics: Arc<Mutex<LiveMetrics>>,

    events: mpsc::UnboundedSender<CaptureEvent>,

    /// Handle for the recording task
    capture_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    stop_signal: Arc<Notify>,

    /// Transcript channel staged for the next recording (overrides the URL)
    staged_channel: Arc<Mutex<Option<TranscriptChannel>>>,
}

impl CaptureSession {
    /// Create a session and the event stream its host consumes
    pub fn new(
        config: CaptureConfig,
        backend: Arc<dyn MediaBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let streams = MediaStreams::new(backend, config.constraints.clone());

        let session = Self {
            config,
            started_at: Utc::now(),
            streams: Arc::new(Mutex::new(streams)),
            state: Arc::new(AtomicU8::new(SessionState::Idle as u8)),
            is_recording: Arc::new(AtomicBool::new(false)),
            elapsed_seconds: Arc::new(AtomicU32::new(0)),
            audio_chunks: Arc::new(Mutex::new(Vec::new())),
            transcript_segments: Arc::new(Mutex::new(Vec::new())),
            metrics: Arc::new(Mutex::new(LiveMetrics::new())),
            events,
            capture_task: Arc::new(Mutex::new(None)),
            stop_signal: Arc::new(Notify::new()),
            staged_channel: Arc::new(Mutex::new(None)),
        };

        (session, events_rx)
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds.load(Ordering::SeqCst)
    }

    /// Elapsed time for UI display, e.g. "00:42 / 03:00"
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed_seconds();
        let max = self.config.max_duration_secs;
        format!(
            "{:02}:{:02} / {:02}:{:02}",
            elapsed / 60,
            elapsed % 60,
            max / 60,
            max % 60
        )
    }

    /// Acquire any missing device streams without starting a recording
    pub async fn ensure_streams(&self) {
        self.streams.lock().await.ensure_streams().await;
    }

    /// Suspend or resume microphone output without touching the device
    pub async fn set_mic_enabled(&self, enabled: bool) {
        self.streams.lock().await.set_mic_enabled(enabled);
    }

    /// Suspend or resume camera output without touching the device
    pub async fn set_cam_enabled(&self, enabled: bool) {
        self.streams.lock().await.set_cam_enabled(enabled);
    }

    pub async fn mic_enabled(&self) -> bool {
        self.streams.lock().await.mic_enabled()
    }

    pub async fn cam_enabled(&self) -> bool {
        self.streams.lock().await.cam_enabled()
    }

    pub async fn mic_stream_id(&self) -> Option<Uuid> {
        self.streams.lock().await.mic_id()
    }

    pub async fn cam_stream_id(&self) -> Option<Uuid> {
        self.streams.lock().await.cam_id()
    }

    /// Stage a transcript channel for the next recording, in place of the
    /// configured URL
    pub async fn set_transcript(&self, channel: TranscriptChannel) {
        *self.staged_channel.lock().await = Some(channel);
    }

    /// Fragments collected during the current or most recent recording
    pub async fn audio_chunks(&self) -> Vec<Vec<u8>> {
        self.audio_chunks.lock().await.clone()
    }

    /// Accumulated transcript
    pub async fn transcript(&self) -> Vec<TranscriptSegment> {
        self.transcript_segments.lock().await.clone()
    }

    /// Fold an external frame-analysis result into the live metrics
    pub async fn ingest_face_analysis(&self, facial: FacialSignal, behavior: BehaviorSignal) {
        self.metrics
            .lock()
            .await
            .ingest_face_analysis(facial, behavior);
    }

    /// Record the latest external communication-analysis result
    pub async fn ingest_communication(&self, communication: CommunicationSignal) {
        self.metrics.lock().await.ingest_communication(communication);
    }

    /// Latest signal values for the live metrics panel
    pub async fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.lock().await.snapshot()
    }

    /// Facial averages over the current/last recording
    pub async fn face_summary(&self) -> FaceMetricsSummary {
        self.metrics.lock().await.face_summary()
    }

    /// Current session statistics
    pub async fn stats(&self) -> SessionStats {
        let chunks_count = self.audio_chunks.lock().await.len();
        let transcript_segments_count = self.transcript_segments.lock().await.len();

        SessionStats {
            state: self.state(),
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds(),
            chunks_count,
            transcript_segments_count,
        }
    }

    /// Start recording
    ///
    /// A no-op when already recording, or when no microphone stream can be
    /// acquired (the session stays in its previous state).
    pub async fn start(&self) -> Result<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            warn!("recording already active: {}", self.config.session_id);
            return Ok(());
        }

        let (mut mic_rx, camera) = {
            let mut streams = self.streams.lock().await;
            streams.ensure_streams().await;
            let Some(mic_rx) = streams.take_mic_receiver() else {
                warn!(
                    "no microphone stream; not starting recording: {}",
                    self.config.session_id
                );
                return Ok(());
            };
            (mic_rx, streams.camera_view())
        };

        // Frames buffered while idle belong to no recording
        loop {
            match mic_rx.try_recv() {
                Ok(_) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        info!("starting capture session: {}", self.config.session_id);

        self.elapsed_seconds.store(0, Ordering::SeqCst);
        self.audio_chunks.lock().await.clear();
        self.metrics.lock().await.reset();

        let channel = match self.staged_channel.lock().await.take() {
            Some(channel) => Some(channel),
            None => match &self.config.transcript_url {
                Some(url) => match transcript::connect_ws(url).await {
                    Ok(channel) => Some(channel),
                    Err(e) => {
                        warn!("transcript channel unavailable: {:#}", e);
                        None
                    }
                },
                None => None,
            },
        };

        self.state
            .store(SessionState::Recording as u8, Ordering::SeqCst);
        self.is_recording.store(true, Ordering::SeqCst);
        let _ = self.events.send(CaptureEvent::RecordingChange(true));

        let capture_loop = CaptureLoop {
            config: self.config.clone(),
            mic_rx,
            camera,
            channel,
            streams: Arc::clone(&self.streams),
            state: Arc::clone(&self.state),
            is_recording: Arc::clone(&self.is_recording),
            elapsed_seconds: Arc::clone(&self.elapsed_seconds),
            audio_chunks: Arc::clone(&self.audio_chunks),
            transcript_segments: Arc::clone(&self.transcript_segments),
            events: self.events.clone(),
            stop_signal: Arc::clone(&self.stop_signal),
        };

        let task = tokio::spawn(capture_loop.run());
        *self.capture_task.lock().await = Some(task);

        Ok(())
    }

    /// Stop recording, flushing the in-flight fragment
    ///
    /// Idempotent: stopping a session that is not recording changes nothing.
    /// Always resolves; a recorder that fails to flush within the configured
    /// bound is aborted and the blob assembled from the fragments on hand.
    pub async fn stop(&self) -> Result<()> {
        if !self.is_recording.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!("stopping capture session: {}", self.config.session_id);
        self.stop_signal.notify_one();

        let task = self.capture_task.lock().await.take();
        if let Some(mut task) = task {
            match tokio::time::timeout(self.config.stop_flush_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("capture task failed: {}", e),
                Err(_) => {
                    warn!(
                        "capture task did not flush within {:?}; aborting",
                        self.config.stop_flush_timeout
                    );
                    task.abort();
                    self.finalize_aborted().await;
                }
            }
        }

        Ok(())
    }

    /// Stop any active recording and release the device streams
    pub async fn close(&self) -> Result<()> {
        self.stop().await?;
        self.streams.lock().await.release();
        info!("capture session closed: {}", self.config.session_id);
        Ok(())
    }

    /// Teardown path for a recorder that had to be aborted: the recording
    /// still completes from the host's point of view
    async fn finalize_aborted(&self) {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            return;
        }
        self.state
            .store(SessionState::Stopped as u8, Ordering::SeqCst);

        // The aborted task took the frame receiver with it; drop the stream
        // so the next recording re-acquires the device
        self.streams.lock().await.drop_microphone();

        let data: Vec<u8> = {
            let chunks = self.audio_chunks.lock().await;
            chunks.iter().flatten().copied().collect()
        };
        let blob = AudioBlob {
            data,
            sample_rate: self.config.constraints.sample_rate,
            channels: self.config.constraints.channels,
        };

        let _ = self.events.send(CaptureEvent::RecordingChange(false));
        let _ = self.events.send(CaptureEvent::AudioReady(blob));
    }
}

/// The single recording task: every ticking timer and the transcript receive
/// path interleave in one select loop, so fragment order and teardown are
/// enforced in one place.
struct CaptureLoop {
    config: CaptureConfig,
    mic_rx: mpsc::Receiver<AudioFrame>,
    camera: Option<CameraView>,
    channel: Option<TranscriptChannel>,
    streams: Arc<Mutex<MediaStreams>>,
    state: Arc<AtomicU8>,
    is_recording: Arc<AtomicBool>,
    elapsed_seconds: Arc<AtomicU32>,
    audio_chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    transcript_segments: Arc<Mutex<Vec<TranscriptSegment>>>,
    events: mpsc::UnboundedSender<CaptureEvent>,
    stop_signal: Arc<Notify>,
}

impl CaptureLoop {
    async fn run(mut self) {
        info!("capture loop started: {}", self.config.session_id);

        let (mut sink, mut transcript_rx) = match self.channel.take() {
            Some(channel) => {
                let (sink, rx) = channel.into_parts();
                (Some(sink), Some(rx))
            }
            None => (None, None),
        };

        let mut pending: Vec<i16> = Vec::new();
        let mut analyser = LevelAnalyser::new(self.config.fft_size);
        let encoder = FrameEncoder::new(self.config.jpeg_quality);

        let start = Instant::now();
        let second = Duration::from_secs(1);
        let mut chunk_tick = interval_at(
            start + self.config.chunk_duration,
            self.config.chunk_duration,
        );
        let mut elapsed_tick = interval_at(start + second, second);
        let mut level_tick = interval_at(
            start + self.config.level_interval,
            self.config.level_interval,
        );
        // First face sample is taken immediately
        let mut face_tick = interval(self.config.face_interval);

        loop {
            tokio::select! {
                frame = self.mic_rx.recv() => match frame {
                    Some(frame) => {
                        analyser.push(&frame.samples);
                        pending.extend_from_slice(&frame.samples);
                    }
                    None => {
                        warn!("microphone stream ended mid-recording");
                        break;
                    }
                },

                _ = chunk_tick.tick() => {
                    if let Some(fragment) = drain_fragment(&mut pending) {
                        forward_fragment(sink.as_mut(), &fragment).await;
                        self.audio_chunks.lock().await.push(fragment);
                    }
                },

                _ = elapsed_tick.tick() => {
                    let elapsed = self.elapsed_seconds.fetch_add(1, Ordering::SeqCst) + 1;
                    if elapsed >= self.config.max_duration_secs {
                        info!(
                            "maximum recording duration reached ({}s); auto-stopping",
                            elapsed
                        );
                        break;
                    }
                },

                _ = face_tick.tick() => {
                    if let Some(camera) = &self.camera {
                        if camera.is_enabled() {
                            if let Some(frame) = camera.current_frame() {
                                match encoder.encode_data_uri(&frame) {
                                    Ok(uri) => {
                                        let _ = self.events.send(CaptureEvent::FaceFrame(uri));
                                    }
                                    Err(e) => warn!("face frame encoding failed: {:#}", e),
                                }
                            }
                        }
                    }
                },

                _ = level_tick.tick() => {
                    if let Some(level) = analyser.mean_level() {
                        let _ = self.events.send(CaptureEvent::AudioLevel(level));
                    }
                },

                message = recv_transcript(&mut transcript_rx) => match message {
                    Some(message) => {
                        let segment = TranscriptSegment {
                            text: message.text.clone(),
                            timestamp: Utc::now(),
                            confidence: message.confidence,
                            partial: message.partial,
                        };
                        self.transcript_segments.lock().await.push(segment);
                        let _ = self.events.send(CaptureEvent::TranscriptUpdate(message.text));
                    }
                    None => {
                        transcript_rx = None;
                    }
                },

                _ = self.stop_signal.notified() => break,
            }
        }

        // Final flush: the in-flight fragment is kept, never discarded
        if let Some(fragment) = drain_fragment(&mut pending) {
            forward_fragment(sink.as_mut(), &fragment).await;
            self.audio_chunks.lock().await.push(fragment);
        }

        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                warn!("transcript channel close failed: {:#}", e);
            }
        }
        drop(transcript_rx);

        let data: Vec<u8> = {
            let chunks = self.audio_chunks.lock().await;
            chunks.iter().flatten().copied().collect()
        };
        let blob = AudioBlob {
            data,
            sample_rate: self.config.constraints.sample_rate,
            channels: self.config.constraints.channels,
        };

        self.state
            .store(SessionState::Stopped as u8, Ordering::SeqCst);
        let _ = self.events.send(CaptureEvent::RecordingChange(false));
        let _ = self.events.send(CaptureEvent::AudioReady(blob));

        // Hand the receiver back so the next recording reuses the same stream
        self.streams.lock().await.restore_mic_receiver(self.mic_rx);
        self.is_recording.store(false, Ordering::SeqCst);

        info!("capture loop stopped: {}", self.config.session_id);
    }
}

fn drain_fragment(pending: &mut Vec<i16>) -> Option<Vec<u8>> {
    if pending.is_empty() {
        return None;
    }
    Some(pending.drain(..).flat_map(|s| s.to_le_bytes()).collect())
}

/// Offer a fragment to the transcript channel if it is open at send time;
/// fragments never reach a closed channel and failures never propagate
async fn forward_fragment(sink: Option<&mut Box<dyn TranscriptSink>>, fragment: &[u8]) {
    if let Some(sink) = sink {
        if sink.is_open() {
            if let Err(e) = sink.send_audio(fragment).await {
                warn!("transcript channel send failed: {:#}", e);
            }
        }
    }
}

async fn recv_transcript(
    rx: &mut Option<mpsc::Receiver<TranscriptMessage>>,
) -> Option<TranscriptMessage> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
