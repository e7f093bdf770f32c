pub mod config;
pub mod http;
pub mod media;
pub mod session;
pub mod transcript;

pub use config::Config;
pub use http::{create_router, AppState};
pub use media::{
    AudioBlob, AudioConstraints, AudioFrame, AudioStream, CameraView, CpalBackend, FrameEncoder,
    LevelAnalyser, MediaBackend, MediaStreams, SyntheticBackend, VideoFrame, VideoStream,
};
pub use session::{
    BehaviorSignal, CaptureConfig, CaptureEvent, CaptureSession, CommunicationSignal,
    FaceMetricsSummary, FacialSignal, HeadPose, LiveMetrics, MetricsSnapshot, SessionState,
    SessionStats, TranscriptSegment,
};
pub use transcript::{TranscriptChannel, TranscriptMessage, TranscriptSink};
