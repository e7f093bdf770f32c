use anyhow::{Context, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::backend::VideoFrame;

/// Encodes sampled camera frames as base64 JPEG data URIs
pub struct FrameEncoder {
    quality: u8,
}

impl FrameEncoder {
    /// `quality` is the JPEG quality on a 1-100 scale
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn encode_data_uri(&self, frame: &VideoFrame) -> Result<String> {
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        encoder
            .write_image(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .context("failed to encode face frame as JPEG")?;

        let payload = base64::engine::general_purpose::STANDARD.encode(&jpeg);
        Ok(format!("data:image/jpeg;base64,{}", payload))
    }
}
