pub mod backend;
pub mod blob;
pub mod device;
pub mod frame;
pub mod level;
pub mod streams;
pub mod synthetic;

pub use backend::{
    AudioConstraints, AudioFrame, AudioStream, CameraView, MediaBackend, VideoFrame, VideoStream,
};
pub use blob::AudioBlob;
pub use device::CpalBackend;
pub use frame::FrameEncoder;
pub use level::LevelAnalyser;
pub use streams::MediaStreams;
pub use synthetic::SyntheticBackend;
