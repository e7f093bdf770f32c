use serde::{Deserialize, Serialize};

/// Facial expression scores supplied by the external frame-analysis service
/// (0.0 to 1.0 each)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FacialSignal {
    pub confident: f32,
    pub stressed: f32,
    pub nervous: f32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Behavioral tracking signals from the frame-analysis service
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BehaviorSignal {
    pub blink_count: u32,
    pub looking_at_camera: bool,
    pub head_pose: HeadPose,
}

/// Speech delivery signals from the communication-analysis service
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommunicationSignal {
    pub filler_word_count: u32,
    pub words_per_minute: f32,
    pub clarity_score: f32,
}

/// Display-ready view of the most recent signals, for the live metrics panel
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub facial: FacialSignal,
    pub behavior: BehaviorSignal,
    pub communication: CommunicationSignal,
}

/// Per-recording facial averages, submitted alongside the final answer
/// (percentage scale)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FaceMetricsSummary {
    pub avg_confident: f32,
    pub avg_stressed: f32,
    pub avg_nervous: f32,
    pub blink_count: u32,
    pub looking_at_camera_percent: f32,
}

/// Combines externally-supplied facial, behavior and communication signals
///
/// No signal is computed here: per-frame analysis results are folded in as
/// they arrive, yielding a display snapshot of the latest values plus running
/// averages over the recording.
#[derive(Debug, Default)]
pub struct LiveMetrics {
    latest: MetricsSnapshot,
    frame_count: u32,
    total_confident: f32,
    total_stressed: f32,
    total_nervous: f32,
    blink_count: u32,
    looking_at_camera_count: u32,
}

impl LiveMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame-analysis result into the aggregate
    pub fn ingest_face_analysis(&mut self, facial: FacialSignal, behavior: BehaviorSignal) {
        self.latest.facial = facial;
        self.latest.behavior = behavior;

        self.frame_count += 1;
        self.total_confident += facial.confident;
        self.total_stressed += facial.stressed;
        self.total_nervous += facial.nervous;
        self.blink_count += behavior.blink_count;
        if behavior.looking_at_camera {
            self.looking_at_camera_count += 1;
        }
    }

    pub fn ingest_communication(&mut self, communication: CommunicationSignal) {
        self.latest.communication = communication;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.latest
    }

    /// Running facial averages; neutral priors stand in when no frame was
    /// ever analysed
    pub fn face_summary(&self) -> FaceMetricsSummary {
        if self.frame_count == 0 {
            return FaceMetricsSummary {
                avg_confident: 50.0,
                avg_stressed: 20.0,
                avg_nervous: 15.0,
                blink_count: self.blink_count,
                looking_at_camera_percent: 50.0,
            };
        }

        let frames = self.frame_count as f32;
        FaceMetricsSummary {
            avg_confident: self.total_confident / frames * 100.0,
            avg_stressed: self.total_stressed / frames * 100.0,
            avg_nervous: self.total_nervous / frames * 100.0,
            blink_count: self.blink_count,
            looking_at_camera_percent: self.looking_at_camera_count as f32 / frames * 100.0,
        }
    }

    /// Clear everything for a new recording
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facial(confident: f32, stressed: f32, nervous: f32) -> FacialSignal {
        FacialSignal {
            confident,
            stressed,
            nervous,
        }
    }

    #[test]
    fn summary_averages_ingested_frames() {
        let mut metrics = LiveMetrics::new();
        metrics.ingest_face_analysis(
            facial(0.8, 0.1, 0.2),
            BehaviorSignal {
                blink_count: 2,
                looking_at_camera: true,
                ..BehaviorSignal::default()
            },
        );
        metrics.ingest_face_analysis(
            facial(0.4, 0.3, 0.0),
            BehaviorSignal {
                blink_count: 1,
                looking_at_camera: false,
                ..BehaviorSignal::default()
            },
        );

        let summary = metrics.face_summary();
        assert!((summary.avg_confident - 60.0).abs() < 1e-4);
        assert!((summary.avg_stressed - 20.0).abs() < 1e-4);
        assert!((summary.avg_nervous - 10.0).abs() < 1e-4);
        assert_eq!(summary.blink_count, 3);
        assert!((summary.looking_at_camera_percent - 50.0).abs() < 1e-4);
    }

    #[test]
    fn summary_without_frames_uses_neutral_priors() {
        let metrics = LiveMetrics::new();
        let summary = metrics.face_summary();
        assert_eq!(summary.avg_confident, 50.0);
        assert_eq!(summary.avg_stressed, 20.0);
        assert_eq!(summary.avg_nervous, 15.0);
        assert_eq!(summary.blink_count, 0);
        assert_eq!(summary.looking_at_camera_percent, 50.0);
    }

    #[test]
    fn snapshot_tracks_the_latest_signals() {
        let mut metrics = LiveMetrics::new();
        metrics.ingest_face_analysis(facial(0.8, 0.1, 0.2), BehaviorSignal::default());
        metrics.ingest_communication(CommunicationSignal {
            filler_word_count: 4,
            words_per_minute: 132.0,
            clarity_score: 78.0,
        });
        metrics.ingest_face_analysis(facial(0.5, 0.2, 0.1), BehaviorSignal::default());

        let snapshot = metrics.snapshot();
        assert!((snapshot.facial.confident - 0.5).abs() < 1e-6);
        assert_eq!(snapshot.communication.filler_word_count, 4);

        metrics.reset();
        let cleared = metrics.snapshot();
        assert_eq!(cleared.facial.confident, 0.0);
        assert_eq!(cleared.communication.filler_word_count, 0);
    }
}
