//! Joint angle from three planar points.

/// Angle at `vertex` between the rays vertex→proximal and vertex→distal,
/// in degrees.
///
/// Uses the difference of the two ray headings (`atan2`), folded so the
/// result lies in `[0, 180]`:
/// - 180° = straight limb (arm extended)
/// - small angles = fully bent
///
/// Coincident points give a heading of 0 rather than `NaN`; callers are
/// expected to only pass detected landmarks.
pub fn compute_joint_angle(proximal: (f64, f64), vertex: (f64, f64), distal: (f64, f64)) -> f64 {
    let distal_heading = (distal.1 - vertex.1).atan2(distal.0 - vertex.0);
    let proximal_heading = (proximal.1 - vertex.1).atan2(proximal.0 - vertex.0);

    let angle = (distal_heading - proximal_heading).to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const EPS: f64 = 1e-9;

    #[test]
    fn straight_arm_is_180() {
        let angle = compute_joint_angle((0.0, 0.0), (0.5, 0.0), (1.0, 0.0));
        assert!((angle - 180.0).abs() < EPS, "{angle}");

        // Same line, any orientation.
        let angle = compute_joint_angle((0.2, 0.9), (0.4, 0.6), (0.6, 0.3));
        assert!((angle - 180.0).abs() < 1e-6, "{angle}");
    }

    #[test]
    fn right_angle() {
        let angle = compute_joint_angle((0.0, 0.0), (0.5, 0.0), (0.5, 0.5));
        assert!((angle - 90.0).abs() < EPS, "{angle}");
    }

    #[test]
    fn reflex_difference_is_folded() {
        // Headings of +170° and -170° differ by 340° raw, 20° folded.
        let proximal = (170f64.to_radians().cos(), 170f64.to_radians().sin());
        let distal = ((-170f64).to_radians().cos(), (-170f64).to_radians().sin());
        let angle = compute_joint_angle(proximal, (0.0, 0.0), distal);
        assert!((angle - 20.0).abs() < 1e-6, "{angle}");
    }

    #[test]
    fn symmetric_in_ray_order() {
        let a = compute_joint_angle((0.1, 0.2), (0.4, 0.5), (0.9, 0.3));
        let b = compute_joint_angle((0.9, 0.3), (0.4, 0.5), (0.1, 0.2));
        assert!((a - b).abs() < EPS);
    }

    #[test]
    fn coincident_points_stay_finite() {
        let angle = compute_joint_angle((0.5, 0.5), (0.5, 0.5), (0.7, 0.5));
        assert!(angle.is_finite());
    }

    #[test]
    fn always_within_0_and_180() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let mut point = || (rng.gen_range(-1.0..2.0), rng.gen_range(-1.0..2.0));
            let (p, v, d) = (point(), point(), point());
            let angle = compute_joint_angle(p, v, d);
            assert!((0.0..=180.0).contains(&angle), "{p:?} {v:?} {d:?} -> {angle}");
        }
    }
}
