//! Joint angle calculation using dot product
//!
//! Calculates the angle at a middle joint from a triple of keypoint
//! positions, e.g. hip-knee-ankle for knee flexion.

/// Calculate the angle at `vertex` in degrees
///
/// Uses dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|)
///
/// Returns angle in degrees:
/// - ~90° = fully bent
/// - ~180° = fully straight
pub fn joint_angle(a: [f32; 3], vertex: [f32; 3], b: [f32; 3]) -> f32 {
    let v1 = [a[0] - vertex[0], a[1] - vertex[1], a[2] - vertex[2]];
    let v2 = [b[0] - vertex[0], b[1] - vertex[1], b[2] - vertex[2]];

    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];

    let mag1 = (v1[0] * v1[0] + v1[1] * v1[1] + v1[2] * v1[2]).sqrt();
    let mag2 = (v2[0] * v2[0] + v2[1] * v2[1] + v2[2] * v2[2]).sqrt();

    // Handle degenerate case
    if mag1 < 0.0001 || mag2 < 0.0001 {
        return 180.0; // Assume straight if we can't calculate
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);

    cos_angle.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_leg() {
        // Hip, knee, ankle in a vertical line
        let hip = [0.0, 0.0, 0.0];
        let knee = [0.0, 0.5, 0.0];
        let ankle = [0.0, 1.0, 0.0];
        let angle = joint_angle(hip, knee, ankle);
        assert!((angle - 180.0).abs() < 1.0);
    }

    #[test]
    fn test_bent_knee() {
        // Knee bent at 90 degrees
        let hip = [0.0, 0.0, 0.0];
        let knee = [0.0, 0.5, 0.0];
        let ankle = [0.5, 0.5, 0.0];
        let angle = joint_angle(hip, knee, ankle);
        assert!((angle - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_degenerate_triple_is_straight() {
        let p = [0.3, 0.3, 0.0];
        let angle = joint_angle(p, p, [0.6, 0.3, 0.0]);
        assert_eq!(angle, 180.0);
    }
}
