use anyhow::{Context, Result};
use std::path::Path;

/// The final assembled recording: every audio fragment of one capture
/// session, concatenated in production order
///
/// Carried as raw 16-bit little-endian PCM; `write_wav` wraps it in a WAV
/// container for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub data: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        let samples = self.data.len() / 2;
        samples as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Decode the PCM payload back into samples
    pub fn samples(&self) -> Vec<i16> {
        self.data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Persist the recording as a WAV file
    pub fn write_wav(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        for sample in self.samples() {
            writer
                .write_sample(sample)
                .context("failed to write sample to WAV")?;
        }

        writer.finalize().context("failed to finalize WAV file")?;
        Ok(())
    }
}
