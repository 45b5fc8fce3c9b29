//! Keypoint data model: joints, keypoints, and pose frames
//!
//! Handles:
//! - The fixed set of tracked body joints
//! - Per-joint detection confidence
//! - Frame-level deduplication and lookup

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Body joints tracked by the engine.
///
/// Declared in the order used for feature-vector layout; `TRACKED_JOINTS`
/// is the authoritative ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointId {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// Fixed joint ordering for feature vectors (12 joints x 3 coordinates).
pub const TRACKED_JOINTS: [JointId; 12] = [
    JointId::LeftShoulder,
    JointId::RightShoulder,
    JointId::LeftElbow,
    JointId::RightElbow,
    JointId::LeftWrist,
    JointId::RightWrist,
    JointId::LeftHip,
    JointId::RightHip,
    JointId::LeftKnee,
    JointId::RightKnee,
    JointId::LeftAnkle,
    JointId::RightAnkle,
];

impl JointId {
    /// Short display name (e.g. for feedback and logs)
    pub fn name(&self) -> &'static str {
        match self {
            JointId::LeftShoulder => "left_shoulder",
            JointId::RightShoulder => "right_shoulder",
            JointId::LeftElbow => "left_elbow",
            JointId::RightElbow => "right_elbow",
            JointId::LeftWrist => "left_wrist",
            JointId::RightWrist => "right_wrist",
            JointId::LeftHip => "left_hip",
            JointId::RightHip => "right_hip",
            JointId::LeftKnee => "left_knee",
            JointId::RightKnee => "right_knee",
            JointId::LeftAnkle => "left_ankle",
            JointId::RightAnkle => "right_ankle",
        }
    }
}

/// A detected body joint: position plus detection confidence in [0, 1].
///
/// Positions from 2-D detectors carry z = 0.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Keypoint {
    pub joint: JointId,
    pub position: [f32; 3],
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(joint: JointId, position: [f32; 3], confidence: f32) -> Self {
        Keypoint {
            joint,
            position,
            confidence,
        }
    }
}

/// One instant of detected keypoints with a session-monotonic timestamp.
///
/// Each joint id appears at most once; the constructor deduplicates
/// (last detection wins).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp_ms: u64,
    keypoints: FxHashMap<JointId, Keypoint>,
}

impl PoseFrame {
    /// Build a frame from raw detections, deduplicating by joint id
    pub fn new(timestamp_ms: u64, detections: Vec<Keypoint>) -> Self {
        let mut keypoints = FxHashMap::default();
        for kp in detections {
            keypoints.insert(kp.joint, kp);
        }
        PoseFrame {
            timestamp_ms,
            keypoints,
        }
    }

    /// Look up a joint's keypoint, if detected in this frame
    pub fn get(&self, joint: JointId) -> Option<&Keypoint> {
        self.keypoints.get(&joint)
    }

    /// Position of a joint if it was detected at or above the confidence floor
    pub fn position_if_confident(&self, joint: JointId, floor: f32) -> Option<[f32; 3]> {
        self.keypoints
            .get(&joint)
            .filter(|kp| kp.confidence >= floor)
            .map(|kp| kp.position)
    }

    /// Number of distinct joints detected in this frame
    #[allow(dead_code)]
    pub fn joint_count(&self) -> usize {
        self.keypoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_dedup_last_wins() {
        let frame = PoseFrame::new(
            10,
            vec![
                Keypoint::new(JointId::LeftHip, [0.0, 0.0, 0.0], 0.5),
                Keypoint::new(JointId::LeftHip, [1.0, 2.0, 0.0], 0.9),
            ],
        );
        assert_eq!(frame.joint_count(), 1);
        let kp = frame.get(JointId::LeftHip).unwrap();
        assert_eq!(kp.position, [1.0, 2.0, 0.0]);
        assert_eq!(kp.confidence, 0.9);
    }

    #[test]
    fn test_position_if_confident_respects_floor() {
        let frame = PoseFrame::new(
            0,
            vec![Keypoint::new(JointId::LeftKnee, [0.5, 0.5, 0.0], 0.2)],
        );
        assert!(frame.position_if_confident(JointId::LeftKnee, 0.3).is_none());
        assert!(frame.position_if_confident(JointId::LeftKnee, 0.1).is_some());
        assert!(frame.position_if_confident(JointId::RightKnee, 0.0).is_none());
    }
}
