use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

/// Bin magnitudes map to bytes on a decibel scale: the noise floor reads 0,
/// a loud signal saturates at 255.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Frequency analyser for the live audio level meter
///
/// Keeps a sliding window of the most recent samples from the live microphone
/// stream; `mean_level` runs a fixed-size FFT over the window and returns the
/// arithmetic mean of the byte-scaled bin magnitudes (0-255). Purely a visual
/// aid: the value never feeds into the recorded artifact.
pub struct LevelAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: VecDeque<i16>,
}

impl LevelAnalyser {
    pub fn new(fft_size: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        Self {
            fft,
            fft_size,
            window: VecDeque::with_capacity(fft_size),
        }
    }

    /// Feed live samples into the analysis window
    pub fn push(&mut self, samples: &[i16]) {
        for &sample in samples {
            if self.window.len() == self.fft_size {
                self.window.pop_front();
            }
            self.window.push_back(sample);
        }
    }

    /// Mean spectral magnitude over the current window, or `None` until
    /// enough samples have arrived
    pub fn mean_level(&self) -> Option<u8> {
        if self.window.len() < self.fft_size {
            return None;
        }

        let mut buffer: Vec<Complex<f32>> = self
            .window
            .iter()
            .map(|&s| Complex::new(s as f32 / i16::MAX as f32, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let half = self.fft_size / 2;
        let scale = 255.0 / (MAX_DB - MIN_DB);
        let sum: f32 = buffer[..half]
            .iter()
            .map(|c| {
                let magnitude = c.norm() / self.fft_size as f32;
                let db = 20.0 * magnitude.max(f32::MIN_POSITIVE).log10();
                ((db - MIN_DB) * scale).clamp(0.0, 255.0)
            })
            .sum();

        Some((sum / half as f32).round() as u8)
    }
}
