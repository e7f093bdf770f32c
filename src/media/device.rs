use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::backend::{AudioConstraints, AudioFrame, AudioStream, MediaBackend, VideoStream};

/// Hardware media backend built on cpal
///
/// Only microphone capture is available; opening the camera fails and the
/// session degrades to audio-only recording (face sampling becomes a no-op).
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaBackend for CpalBackend {
    async fn open_microphone(&self, constraints: &AudioConstraints) -> Result<AudioStream> {
        let (tx, rx) = mpsc::channel(64);
        let enabled = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

        // cpal streams are !Send, so a dedicated thread owns the stream and
        // keeps it alive until the stop flag is raised.
        let thread_constraints = constraints.clone();
        let thread_enabled = Arc::clone(&enabled);
        let thread_stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            run_input_stream(thread_constraints, tx, thread_enabled, thread_stop, ready_tx);
        });

        ready_rx
            .await
            .map_err(|_| anyhow!("microphone thread exited before reporting status"))??;

        Ok(AudioStream::new(rx, enabled, stop))
    }

    async fn open_camera(&self) -> Result<VideoStream> {
        Err(anyhow!("camera capture is not available on the cpal backend"))
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

fn run_input_stream(
    constraints: AudioConstraints,
    tx: mpsc::Sender<AudioFrame>,
    enabled: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    ready: tokio::sync::oneshot::Sender<Result<()>>,
) {
    let sample_rate = constraints.sample_rate;
    let channels = constraints.channels;
    let samples_per_frame =
        (sample_rate as u64 * constraints.frame_duration_ms / 1000) as usize * channels as usize;

    let setup = (|| -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("no default input device found")?;

        info!(
            "opening input device {:?} (echo cancellation: {}, noise suppression: {})",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            constraints.echo_cancellation,
            constraints.noise_suppression
        );

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let started = Instant::now();
        let mut buffer: Vec<i16> = Vec::with_capacity(samples_per_frame);
        let callback_enabled = Arc::clone(&enabled);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &sample in data {
                        // Track-enable semantics: a disabled track keeps the
                        // device running but delivers silence
                        let value = if callback_enabled.load(Ordering::Relaxed) {
                            (sample * i16::MAX as f32) as i16
                        } else {
                            0
                        };
                        buffer.push(value);

                        if buffer.len() >= samples_per_frame {
                            let frame = AudioFrame {
                                samples: std::mem::take(&mut buffer),
                                sample_rate,
                                channels,
                                timestamp_ms: started.elapsed().as_millis() as u64,
                            };
                            // Drop frames when nobody is draining the channel
                            let _ = tx.try_send(frame);
                        }
                    }
                },
                |err| error!("microphone stream error: {}", err),
                None,
            )
            .context("failed to build input stream")?;

        stream.play().context("failed to start input stream")?;
        Ok(stream)
    })();

    match setup {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(50));
            }
            drop(stream);
            info!("microphone stream stopped");
        }
        Err(e) => {
            let _ = ready.send(Err(e));
        }
    }
}
