use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use super::backend::{
    AudioConstraints, AudioFrame, AudioStream, MediaBackend, VideoFrame, VideoStream,
};

const VIDEO_WIDTH: u32 = 64;
const VIDEO_HEIGHT: u32 = 48;

/// Deterministic software media source for tests and offline runs
///
/// The microphone delivers a repeating sample ramp on the cadence given by
/// the audio constraints; the camera publishes a small solid-color frame that
/// cycles hue over time. A disabled microphone track yields silence, matching
/// real track-enable semantics.
pub struct SyntheticBackend {
    /// How often the camera publishes a new frame
    pub video_interval: Duration,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            video_interval: Duration::from_millis(100),
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaBackend for SyntheticBackend {
    async fn open_microphone(&self, constraints: &AudioConstraints) -> Result<AudioStream> {
        let (tx, rx) = mpsc::channel(64);
        let enabled = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));

        let sample_rate = constraints.sample_rate;
        let channels = constraints.channels;
        let frame_ms = constraints.frame_duration_ms;
        let samples_per_frame =
            (sample_rate as u64 * frame_ms / 1000) as usize * channels as usize;

        let producer_enabled = Arc::clone(&enabled);
        let producer_stop = Arc::clone(&stop);
        tokio::spawn(async move {
            let mut seq: u64 = 0;
            loop {
                tokio::time::sleep(Duration::from_millis(frame_ms)).await;
                if producer_stop.load(Ordering::SeqCst) {
                    break;
                }

                let samples = if producer_enabled.load(Ordering::SeqCst) {
                    let base = (seq % 251) as i16;
                    (0..samples_per_frame)
                        .map(|i| base.wrapping_add((i % 97) as i16))
                        .collect()
                } else {
                    vec![0i16; samples_per_frame]
                };

                let frame = AudioFrame {
                    samples,
                    sample_rate,
                    channels,
                    timestamp_ms: (seq + 1) * frame_ms,
                };

                match tx.try_send(frame) {
                    Ok(()) => {}
                    // Receiver idle between recordings: drop the frame, keep going
                    Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }

                seq += 1;
            }
        });

        Ok(AudioStream::new(rx, enabled, stop))
    }

    async fn open_camera(&self) -> Result<VideoStream> {
        let current = Arc::new(Mutex::new(None));
        let enabled = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let interval = self.video_interval;

        let cell = Arc::clone(&current);
        let producer_stop = Arc::clone(&stop);
        tokio::spawn(async move {
            let mut seq: u64 = 0;
            // First frame available as soon as the stream is live
            publish_frame(&cell, seq, 0);
            loop {
                tokio::time::sleep(interval).await;
                if producer_stop.load(Ordering::SeqCst) {
                    break;
                }
                seq += 1;
                publish_frame(&cell, seq, seq * interval.as_millis() as u64);
            }
        });

        Ok(VideoStream::new(current, enabled, stop))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

fn publish_frame(cell: &Arc<Mutex<Option<VideoFrame>>>, seq: u64, timestamp_ms: u64) {
    let r = (seq * 29 % 256) as u8;
    let g = (seq * 53 % 256) as u8;
    let b = (seq * 97 % 256) as u8;
    let mut rgb = Vec::with_capacity((VIDEO_WIDTH * VIDEO_HEIGHT * 3) as usize);
    for _ in 0..(VIDEO_WIDTH * VIDEO_HEIGHT) {
        rgb.extend_from_slice(&[r, g, b]);
    }

    let frame = VideoFrame {
        rgb,
        width: VIDEO_WIDTH,
        height: VIDEO_HEIGHT,
        timestamp_ms,
    };

    if let Ok(mut guard) = cell.lock() {
        *guard = Some(frame);
    }
}
