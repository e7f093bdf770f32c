use crate::media::MediaBackend;
use crate::session::{CaptureConfig, CaptureSession};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active capture sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<CaptureSession>>>>,

    /// Device backend used for every session
    pub backend: Arc<dyn MediaBackend>,

    /// Session defaults from the service configuration
    pub defaults: CaptureConfig,

    /// Completed recordings are persisted here as WAV when set
    pub recordings_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        defaults: CaptureConfig,
        recordings_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend,
            defaults,
            recordings_dir,
        }
    }
}
