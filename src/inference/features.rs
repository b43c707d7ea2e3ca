//! Classifier input built from a detection.

use crate::models::PoseLandmarks;

/// The form model was trained on the first nine landmarks (9 × 4 values).
pub const DEFAULT_FEATURE_LEN: usize = 36;

/// Flattens `(x, y, z, visibility)` of every landmark in topology order,
/// then truncates or zero-pads to exactly `len` values.
pub fn extract_features(landmarks: &PoseLandmarks, len: usize) -> Vec<f32> {
    let mut features: Vec<f32> = landmarks
        .iter()
        .flat_map(|lm| [lm.x, lm.y, lm.z, lm.visibility])
        .take(len)
        .collect();
    features.resize(len, 0.0);
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Landmark;

    fn numbered(count: usize) -> PoseLandmarks {
        PoseLandmarks::new(
            (0..count)
                .map(|i| Landmark {
                    x: i as f32,
                    y: i as f32 + 0.1,
                    z: i as f32 + 0.2,
                    visibility: 0.9,
                })
                .collect(),
        )
    }

    #[test]
    fn truncates_full_skeleton() {
        let features = extract_features(&numbered(33), DEFAULT_FEATURE_LEN);
        assert_eq!(features.len(), 36);
        assert_eq!(&features[..4], &[0.0, 0.1, 0.2, 0.9]);
        assert_eq!(features[32], 8.0);
        assert_eq!(features[35], 0.9);
    }

    #[test]
    fn pads_short_detection() {
        let features = extract_features(&numbered(2), 12);
        assert_eq!(features.len(), 12);
        assert_eq!(features[4], 1.0);
        assert!(features[8..].iter().all(|v| *v == 0.0));
    }
}
