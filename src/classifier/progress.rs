//! Per-exercise movement progress from joint angles
//!
//! The rep counter consumes a continuous progress signal in [0, 1]
//! (0 = top of the movement, 1 = bottom). How progress is derived differs
//! per exercise, so the mapping is a pluggable strategy: the default maps
//! a per-exercise joint triple's angle range onto [0, 1], e.g. the
//! hip-knee-ankle angle for squats. Calibration ranges are engineering
//! estimates and can be replaced with measured data per deployment.

use rustc_hash::FxHashMap;

use crate::classifier::labels::ExerciseType;
use crate::pose::angles::joint_angle;
use crate::pose::keypoints::{JointId, PoseFrame};

/// Strategy turning a classified frame into movement progress.
pub trait ProgressExtractor {
    /// Progress in [0, 1] for the given exercise, or `None` when the
    /// frame lacks the joints this exercise is measured by.
    fn progress(&self, exercise: ExerciseType, frame: &PoseFrame) -> Option<f32>;
}

/// Angle range for one exercise: the measured joint triple per body side
/// and the angles observed at the top and bottom of the movement.
#[derive(Clone, Copy, Debug)]
pub struct AngleCalibration {
    pub left: [JointId; 3],
    pub right: [JointId; 3],
    /// Angle in degrees at progress 0
    pub top_angle: f32,
    /// Angle in degrees at progress 1
    pub bottom_angle: f32,
}

impl AngleCalibration {
    fn new(left: [JointId; 3], right: [JointId; 3], top_angle: f32, bottom_angle: f32) -> Self {
        AngleCalibration {
            left,
            right,
            top_angle,
            bottom_angle,
        }
    }
}

/// Default progress strategy: joint-angle interpolation with a built-in
/// calibration table covering every classifier label.
pub struct JointAngleProgress {
    calibrations: FxHashMap<ExerciseType, AngleCalibration>,
    confidence_floor: f32,
}

impl JointAngleProgress {
    pub fn new(confidence_floor: f32) -> Self {
        use ExerciseType::*;
        use JointId::*;

        let knee_l = [LeftHip, LeftKnee, LeftAnkle];
        let knee_r = [RightHip, RightKnee, RightAnkle];
        let elbow_l = [LeftShoulder, LeftElbow, LeftWrist];
        let elbow_r = [RightShoulder, RightElbow, RightWrist];
        let hip_l = [LeftShoulder, LeftHip, LeftKnee];
        let hip_r = [RightShoulder, RightHip, RightKnee];
        let shoulder_l = [LeftHip, LeftShoulder, LeftElbow];
        let shoulder_r = [RightHip, RightShoulder, RightElbow];

        let mut calibrations = FxHashMap::default();
        calibrations.insert(Squats, AngleCalibration::new(knee_l, knee_r, 170.0, 80.0));
        calibrations.insert(Lunges, AngleCalibration::new(knee_l, knee_r, 170.0, 90.0));
        calibrations.insert(
            BicepCurls,
            AngleCalibration::new(elbow_l, elbow_r, 160.0, 50.0),
        );
        calibrations.insert(Situps, AngleCalibration::new(hip_l, hip_r, 130.0, 60.0));
        calibrations.insert(
            Pushups,
            AngleCalibration::new(elbow_l, elbow_r, 165.0, 75.0),
        );
        // Extension movements run bent-to-straight; the inverted range
        // keeps progress 1 at the extended end.
        calibrations.insert(
            TricepExtensions,
            AngleCalibration::new(elbow_l, elbow_r, 70.0, 170.0),
        );
        calibrations.insert(
            DumbbellRows,
            AngleCalibration::new(elbow_l, elbow_r, 170.0, 60.0),
        );
        calibrations.insert(
            JumpingJacks,
            AngleCalibration::new(shoulder_l, shoulder_r, 20.0, 160.0),
        );
        calibrations.insert(
            DumbbellShoulderPress,
            AngleCalibration::new(elbow_l, elbow_r, 90.0, 170.0),
        );
        calibrations.insert(
            LateralShoulderRaises,
            AngleCalibration::new(shoulder_l, shoulder_r, 15.0, 90.0),
        );

        JointAngleProgress {
            calibrations,
            confidence_floor,
        }
    }

    /// Angle of a joint triple if all three joints are confidently visible
    fn side_angle(&self, triple: &[JointId; 3], frame: &PoseFrame) -> Option<f32> {
        let a = frame.position_if_confident(triple[0], self.confidence_floor)?;
        let vertex = frame.position_if_confident(triple[1], self.confidence_floor)?;
        let b = frame.position_if_confident(triple[2], self.confidence_floor)?;
        Some(joint_angle(a, vertex, b))
    }
}

impl ProgressExtractor for JointAngleProgress {
    fn progress(&self, exercise: ExerciseType, frame: &PoseFrame) -> Option<f32> {
        let cal = self.calibrations.get(&exercise)?;

        let mut angles = Vec::with_capacity(2);
        if let Some(angle) = self.side_angle(&cal.left, frame) {
            angles.push(angle);
        }
        if let Some(angle) = self.side_angle(&cal.right, frame) {
            angles.push(angle);
        }
        if angles.is_empty() {
            return None;
        }

        let angle = angles.iter().sum::<f32>() / angles.len() as f32;
        let progress = (cal.top_angle - angle) / (cal.top_angle - cal.bottom_angle);
        Some(progress.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::keypoints::Keypoint;

    /// Legs-only frame with a given knee angle (vertical thigh, shin
    /// rotated by 180 - angle degrees)
    fn leg_frame(knee_angle_deg: f32) -> PoseFrame {
        let bend = (180.0 - knee_angle_deg).to_radians();
        let shin = [bend.sin() * 0.4, 0.4 * bend.cos(), 0.0];
        let mut detections = Vec::new();
        for (hip, knee, ankle) in [
            (JointId::LeftHip, JointId::LeftKnee, JointId::LeftAnkle),
            (JointId::RightHip, JointId::RightKnee, JointId::RightAnkle),
        ] {
            detections.push(Keypoint::new(hip, [0.0, 1.0, 0.0], 1.0));
            detections.push(Keypoint::new(knee, [0.0, 0.5, 0.0], 1.0));
            detections.push(Keypoint::new(
                ankle,
                [shin[0], 0.5 - shin[1], shin[2]],
                1.0,
            ));
        }
        PoseFrame::new(0, detections)
    }

    #[test]
    fn test_standing_is_near_zero() {
        let extractor = JointAngleProgress::new(0.3);
        let progress = extractor
            .progress(ExerciseType::Squats, &leg_frame(175.0))
            .unwrap();
        assert!(progress < 0.05, "progress {} not near 0", progress);
    }

    #[test]
    fn test_deep_squat_is_near_one() {
        let extractor = JointAngleProgress::new(0.3);
        let progress = extractor
            .progress(ExerciseType::Squats, &leg_frame(78.0))
            .unwrap();
        assert!(progress > 0.95, "progress {} not near 1", progress);
    }

    #[test]
    fn test_half_depth_is_mid_range() {
        let extractor = JointAngleProgress::new(0.3);
        let progress = extractor
            .progress(ExerciseType::Squats, &leg_frame(125.0))
            .unwrap();
        assert!((progress - 0.5).abs() < 0.05, "progress {}", progress);
    }

    #[test]
    fn test_missing_joints_yield_none() {
        let extractor = JointAngleProgress::new(0.3);
        let empty = PoseFrame::new(0, vec![]);
        assert!(extractor.progress(ExerciseType::Squats, &empty).is_none());
    }

    #[test]
    fn test_every_label_has_calibration() {
        let extractor = JointAngleProgress::new(0.3);
        for &label in crate::classifier::labels::EXERCISE_LABELS.iter() {
            assert!(
                extractor.calibrations.contains_key(&label),
                "missing calibration for {:?}",
                label
            );
        }
    }
}
