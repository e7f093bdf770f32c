use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::media::AudioConstraints;
use crate::session::CaptureConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    pub channels: u16,
    pub max_duration_secs: u32,
    pub face_interval_ms: u64,
    /// Completed recordings are persisted here as WAV when set
    pub recordings_path: Option<String>,
    pub transcript_url: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Session defaults derived from the service configuration
    pub fn capture_defaults(&self) -> CaptureConfig {
        CaptureConfig {
            max_duration_secs: self.capture.max_duration_secs,
            face_interval: Duration::from_millis(self.capture.face_interval_ms),
            constraints: AudioConstraints {
                sample_rate: self.capture.sample_rate,
                channels: self.capture.channels,
                ..AudioConstraints::default()
            },
            transcript_url: self.capture.transcript_url.clone(),
            ..CaptureConfig::default()
        }
    }
}
