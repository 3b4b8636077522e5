//! Raw face-detection output and quality flags

use serde::{Deserialize, Serialize};

use crate::types::{EmotionScores, Frame};
use crate::{MIN_FACE_AREA_RATIO, QUALITY_MIN_SCORE};

/// A 2D landmark point in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned face bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box area in pixels
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Landmark groups used by the quality checks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: Vec<Point>,
    pub right_eye: Vec<Point>,
    pub nose: Vec<Point>,
    pub mouth: Vec<Point>,
}

impl FaceLandmarks {
    /// True when every core landmark group is populated
    pub fn has_core_features(&self) -> bool {
        !self.left_eye.is_empty()
            && !self.right_eye.is_empty()
            && !self.nose.is_empty()
            && !self.mouth.is_empty()
    }
}

/// One detected face: the highest-confidence candidate from a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    /// Detector confidence in [0,1]
    pub score: f64,
    /// Face bounding box
    pub face_box: FaceBox,
    /// Landmark groups
    pub landmarks: FaceLandmarks,
    /// Face descriptor embedding
    pub descriptor: Vec<f32>,
    /// Per-emotion expression scores
    pub expressions: EmotionScores,
}

/// Quality problems found during verification.
/// Flags downgrade confidence; they never abort the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlags {
    /// Detection score below the quality bar
    pub low_confidence: bool,
    /// A core landmark group came back empty
    pub missing_features: bool,
    /// Face occupies too little of the frame
    pub face_too_small: bool,
}

impl QualityFlags {
    /// Evaluate flags for a detection within its source frame
    pub fn evaluate(detection: &RawDetection, frame: &Frame) -> Self {
        let area_ratio = if frame.area() > 0.0 {
            detection.face_box.area() / frame.area()
        } else {
            0.0
        };
        Self {
            low_confidence: detection.score < QUALITY_MIN_SCORE,
            missing_features: !detection.landmarks.has_core_features(),
            face_too_small: area_ratio < MIN_FACE_AREA_RATIO,
        }
    }

    /// True when any flag is raised
    pub fn any(&self) -> bool {
        self.low_confidence || self.missing_features || self.face_too_small
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Emotion;

    fn full_landmarks() -> FaceLandmarks {
        FaceLandmarks {
            left_eye: vec![Point::new(10.0, 10.0)],
            right_eye: vec![Point::new(30.0, 10.0)],
            nose: vec![Point::new(20.0, 20.0)],
            mouth: vec![Point::new(20.0, 30.0)],
        }
    }

    fn detection(score: f64, box_side: f64) -> RawDetection {
        RawDetection {
            score,
            face_box: FaceBox::new(0.0, 0.0, box_side, box_side),
            landmarks: full_landmarks(),
            descriptor: vec![0.0; 128],
            expressions: EmotionScores::zero(),
        }
    }

    #[test]
    fn test_clean_detection_raises_no_flags() {
        let frame = Frame::synthetic(Emotion::Happy, 100, 100);
        let flags = QualityFlags::evaluate(&detection(0.9, 40.0), &frame);
        assert!(!flags.any());
    }

    #[test]
    fn test_low_score_flag() {
        let frame = Frame::synthetic(Emotion::Happy, 100, 100);
        let flags = QualityFlags::evaluate(&detection(0.5, 40.0), &frame);
        assert!(flags.low_confidence);
        assert!(flags.any());
    }

    #[test]
    fn test_small_face_flag() {
        let frame = Frame::synthetic(Emotion::Happy, 100, 100);
        // 10x10 box in a 100x100 frame is 1% of the area, below the 3% bar
        let flags = QualityFlags::evaluate(&detection(0.9, 10.0), &frame);
        assert!(flags.face_too_small);
    }

    #[test]
    fn test_missing_features_flag() {
        let frame = Frame::synthetic(Emotion::Happy, 100, 100);
        let mut det = detection(0.9, 40.0);
        det.landmarks.mouth.clear();
        let flags = QualityFlags::evaluate(&det, &frame);
        assert!(flags.missing_features);
    }
}
