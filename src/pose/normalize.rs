//! Keypoint normalization into a translation/scale-invariant feature space
//!
//! Features:
//! - Origin at the hip centroid (translation invariance)
//! - Scaled by the shoulder-to-hip torso length (scale invariance)
//! - Fixed output ordering defined by `TRACKED_JOINTS`

use thiserror::Error;

use super::keypoints::{JointId, PoseFrame, TRACKED_JOINTS};

/// Coordinates per joint in the output vector
pub const FEATURE_DIMS: usize = 3;

/// Total feature-vector length (12 joints x 3 coordinates)
pub const FEATURE_COUNT: usize = TRACKED_JOINTS.len() * FEATURE_DIMS;

/// Scale references shorter than this are rejected as degenerate
const SCALE_EPSILON: f32 = 1e-4;

/// Errors that can occur while normalizing a pose frame.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A required joint is missing or below the confidence floor.
    #[error("insufficient keypoints: {0} missing or below confidence floor")]
    InsufficientKeypoints(&'static str),

    /// Shoulder-to-hip reference length too short to divide by.
    #[error("degenerate scale reference: torso length {0}")]
    DegenerateScale(f32),
}

/// Fixed-length feature vector in the documented `TRACKED_JOINTS` order.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedVector(Vec<f32>);

impl NormalizedVector {
    /// Wrap a pre-computed feature vector (recorded data, synthetic input)
    pub fn from_features(features: Vec<f32>) -> Self {
        NormalizedVector(features)
    }

    pub fn features(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Converts raw keypoint frames into classifier-ready feature vectors.
///
/// Pure transformation; holds only its configuration.
#[derive(Clone, Copy, Debug)]
pub struct KeypointNormalizer {
    confidence_floor: f32,
}

/// Joints that must be present for the origin and scale reference
const REQUIRED_JOINTS: [JointId; 4] = [
    JointId::LeftShoulder,
    JointId::RightShoulder,
    JointId::LeftHip,
    JointId::RightHip,
];

impl KeypointNormalizer {
    pub fn new(confidence_floor: f32) -> Self {
        KeypointNormalizer { confidence_floor }
    }

    /// Normalize a frame into the fixed-order feature vector.
    ///
    /// Requires both shoulders and both hips at or above the confidence
    /// floor. Optional joints that are missing or low-confidence are
    /// emitted as zeros (the origin), keeping the vector length stable.
    pub fn normalize(&self, frame: &PoseFrame) -> Result<NormalizedVector, NormalizeError> {
        let mut required = [[0.0f32; 3]; REQUIRED_JOINTS.len()];
        for (slot, &joint) in required.iter_mut().zip(REQUIRED_JOINTS.iter()) {
            *slot = frame
                .position_if_confident(joint, self.confidence_floor)
                .ok_or(NormalizeError::InsufficientKeypoints(joint.name()))?;
        }
        let [left_shoulder, right_shoulder, left_hip, right_hip] = required;

        let origin = midpoint(left_hip, right_hip);
        let shoulder_center = midpoint(left_shoulder, right_shoulder);
        let scale = distance(shoulder_center, origin);
        if scale < SCALE_EPSILON {
            return Err(NormalizeError::DegenerateScale(scale));
        }

        let mut features = Vec::with_capacity(FEATURE_COUNT);
        for &joint in TRACKED_JOINTS.iter() {
            match frame.position_if_confident(joint, self.confidence_floor) {
                Some(p) => {
                    features.push((p[0] - origin[0]) / scale);
                    features.push((p[1] - origin[1]) / scale);
                    features.push((p[2] - origin[2]) / scale);
                }
                None => features.extend_from_slice(&[0.0, 0.0, 0.0]),
            }
        }

        Ok(NormalizedVector(features))
    }
}

fn midpoint(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        (a[0] + b[0]) / 2.0,
        (a[1] + b[1]) / 2.0,
        (a[2] + b[2]) / 2.0,
    ]
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::keypoints::Keypoint;

    /// Upright standing pose with all 12 joints at full confidence
    fn standing_frame(offset: [f32; 3], scale: f32) -> PoseFrame {
        let joints = [
            (JointId::LeftShoulder, [-0.2, 1.4, 0.0]),
            (JointId::RightShoulder, [0.2, 1.4, 0.0]),
            (JointId::LeftElbow, [-0.3, 1.1, 0.0]),
            (JointId::RightElbow, [0.3, 1.1, 0.0]),
            (JointId::LeftWrist, [-0.3, 0.8, 0.0]),
            (JointId::RightWrist, [0.3, 0.8, 0.0]),
            (JointId::LeftHip, [-0.15, 0.9, 0.0]),
            (JointId::RightHip, [0.15, 0.9, 0.0]),
            (JointId::LeftKnee, [-0.15, 0.5, 0.0]),
            (JointId::RightKnee, [0.15, 0.5, 0.0]),
            (JointId::LeftAnkle, [-0.15, 0.1, 0.0]),
            (JointId::RightAnkle, [0.15, 0.1, 0.0]),
        ];
        let detections = joints
            .iter()
            .map(|&(joint, p)| {
                Keypoint::new(
                    joint,
                    [
                        p[0] * scale + offset[0],
                        p[1] * scale + offset[1],
                        p[2] * scale + offset[2],
                    ],
                    1.0,
                )
            })
            .collect();
        PoseFrame::new(0, detections)
    }

    #[test]
    fn test_normalize_full_frame() {
        let normalizer = KeypointNormalizer::new(0.3);
        let vector = normalizer.normalize(&standing_frame([0.0; 3], 1.0)).unwrap();
        assert_eq!(vector.len(), FEATURE_COUNT);
        // Hip centroid maps to the origin: hips are symmetric around it
        let lh = &vector.features()[18..21];
        let rh = &vector.features()[21..24];
        assert!((lh[0] + rh[0]).abs() < 1e-5);
        assert!(lh[1].abs() < 1e-5 && rh[1].abs() < 1e-5);
    }

    #[test]
    fn test_translation_invariance() {
        let normalizer = KeypointNormalizer::new(0.3);
        let base = normalizer.normalize(&standing_frame([0.0; 3], 1.0)).unwrap();
        let shifted = normalizer
            .normalize(&standing_frame([3.5, -2.0, 0.7], 1.0))
            .unwrap();
        for (a, b) in base.features().iter().zip(shifted.features()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_scale_invariance() {
        let normalizer = KeypointNormalizer::new(0.3);
        let base = normalizer.normalize(&standing_frame([0.0; 3], 1.0)).unwrap();
        let scaled = normalizer.normalize(&standing_frame([0.0; 3], 2.5)).unwrap();
        for (a, b) in base.features().iter().zip(scaled.features()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_missing_required_joint() {
        let normalizer = KeypointNormalizer::new(0.3);
        let frame = PoseFrame::new(
            0,
            vec![
                Keypoint::new(JointId::LeftShoulder, [-0.2, 1.4, 0.0], 1.0),
                Keypoint::new(JointId::RightShoulder, [0.2, 1.4, 0.0], 1.0),
                Keypoint::new(JointId::LeftHip, [-0.15, 0.9, 0.0], 1.0),
                // right hip confident below the floor
                Keypoint::new(JointId::RightHip, [0.15, 0.9, 0.0], 0.1),
            ],
        );
        match normalizer.normalize(&frame) {
            Err(NormalizeError::InsufficientKeypoints(name)) => {
                assert_eq!(name, "right_hip");
            }
            other => panic!("expected InsufficientKeypoints, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_scale() {
        let normalizer = KeypointNormalizer::new(0.3);
        // Shoulders collapsed onto the hips: zero torso length
        let frame = PoseFrame::new(
            0,
            vec![
                Keypoint::new(JointId::LeftShoulder, [-0.1, 0.9, 0.0], 1.0),
                Keypoint::new(JointId::RightShoulder, [0.1, 0.9, 0.0], 1.0),
                Keypoint::new(JointId::LeftHip, [-0.1, 0.9, 0.0], 1.0),
                Keypoint::new(JointId::RightHip, [0.1, 0.9, 0.0], 1.0),
            ],
        );
        assert!(matches!(
            normalizer.normalize(&frame),
            Err(NormalizeError::DegenerateScale(_))
        ));
    }
}
