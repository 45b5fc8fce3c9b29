//! Pose Module: Keypoint data model, joint-angle math, and normalization
//!
//! # Components
//! - `keypoints.rs`: Joint identifiers, keypoints, and pose frames
//! - `angles.rs`: Joint-angle calculation from keypoint triples
//! - `normalize.rs`: Translation/scale-invariant feature vectors

pub mod angles;
pub mod keypoints;
pub mod normalize;

pub use keypoints::{JointId, Keypoint, PoseFrame, TRACKED_JOINTS};
pub use normalize::{KeypointNormalizer, NormalizeError, NormalizedVector};

#[allow(unused_imports)]
pub use angles::joint_angle;
