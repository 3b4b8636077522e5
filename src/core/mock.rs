//! Simulated engine and degraded-mode fallback detector
//!
//! `SimulatedEngine` is the inference backend for the simulator surfaces and
//! tests: it decodes the staged scene from a synthetic frame and fabricates a
//! plausible detection for it. `MockDetector` is the always-succeeds fallback
//! used when the primary model path is unavailable; its numbers are a
//! placeholder, not product behavior.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::adapter::{FaceEngine, ModelAssets};
use crate::core::verifier::Detector;
use crate::types::{
    Emotion, EmotionScores, FaceBox, FaceLandmarks, Frame, ModelError, Point, QualityFlags,
    RawDetection, VerificationResult, VibeCheck,
};

/// Deterministic-seedable engine over synthetic frames
pub struct SimulatedEngine {
    rng: Mutex<SmallRng>,
    loaded: AtomicBool,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Fixed seed for reproducible runs and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            loaded: AtomicBool::new(false),
        }
    }

    /// Expression distribution peaked at the staged emotion
    fn expressions_for(&self, staged: Emotion) -> EmotionScores {
        let mut rng = self.rng.lock();
        let peak = rng.gen_range(0.72..0.92);
        let mut scores = EmotionScores::zero();
        let residual = 1.0 - peak;
        for e in Emotion::ALL {
            if e == staged {
                scores.set(e, peak);
            } else {
                scores.set(e, rng.gen_range(0.0..residual / 3.0));
            }
        }
        scores
    }

    fn landmarks_for(face_box: &FaceBox) -> FaceLandmarks {
        let cx = face_box.x + face_box.width / 2.0;
        let eye_y = face_box.y + face_box.height * 0.38;
        FaceLandmarks {
            left_eye: vec![Point::new(cx - face_box.width * 0.2, eye_y)],
            right_eye: vec![Point::new(cx + face_box.width * 0.2, eye_y)],
            nose: vec![Point::new(cx, face_box.y + face_box.height * 0.55)],
            mouth: vec![Point::new(cx, face_box.y + face_box.height * 0.75)],
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceEngine for SimulatedEngine {
    async fn load(&self, _assets: ModelAssets) -> Result<(), ModelError> {
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, ModelError> {
        if !self.loaded.load(Ordering::SeqCst) {
            return Err(ModelError::Inference("engine not loaded".into()));
        }

        let staged = match frame.staged_emotion() {
            Some(emotion) => emotion,
            None => return Ok(Vec::new()),
        };

        // Face fills a bit under half the frame, centered
        let side = (frame.width.min(frame.height) as f64) * 0.45;
        let face_box = FaceBox::new(
            (frame.width as f64 - side) / 2.0,
            (frame.height as f64 - side) / 2.0,
            side,
            side,
        );

        let score = self.rng.lock().gen_range(0.82..0.98);
        let descriptor: Vec<f32> = {
            let mut rng = self.rng.lock();
            (0..128).map(|_| rng.gen_range(-1.0..1.0)).collect()
        };

        Ok(vec![RawDetection {
            score,
            landmarks: Self::landmarks_for(&face_box),
            face_box,
            descriptor,
            expressions: self.expressions_for(staged),
        }])
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Always-succeeds fallback for when the model never loads.
/// Reports a face with a randomized match score so the capture flow stays
/// usable in degraded mode.
pub struct MockDetector {
    rng: Mutex<SmallRng>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for MockDetector {
    async fn verify(
        &self,
        _frame: &Frame,
        requested: Option<Emotion>,
    ) -> Result<VerificationResult, ModelError> {
        let (target_score, confidence, pick) = {
            let mut rng = self.rng.lock();
            (
                rng.gen_range(0.3..0.9),
                rng.gen_range(50..=80u8),
                rng.gen_range(0..Emotion::ALL.len()),
            )
        };

        let shown = requested.unwrap_or(Emotion::ALL[pick]);
        let mut scores = EmotionScores::zero();
        scores.set(shown, target_score);

        let vibe_check = VibeCheck::evaluate(&scores, requested);
        let (dominant, _) = scores.dominant();

        Ok(VerificationResult {
            timestamp: Utc::now(),
            is_face_detected: true,
            overall_confidence: confidence,
            emotion_scores: scores,
            dominant_emotion: Some(dominant),
            quality: QualityFlags::default(),
            vibe_check: Some(vibe_check),
            message: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock-fallback"
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapter::ModelAdapter;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_simulated_engine_reads_staged_scene() {
        let engine = SimulatedEngine::with_seed(7);
        engine.load(ModelAssets::new(bytes::Bytes::new())).await.unwrap();

        let frame = Frame::synthetic(Emotion::Angry, 640, 480);
        let detections = engine.detect(&frame).await.unwrap();
        assert_eq!(detections.len(), 1);
        let (dominant, score) = detections[0].expressions.dominant();
        assert_eq!(dominant, Emotion::Angry);
        assert!(score > 0.7);
        assert!(detections[0].landmarks.has_core_features());
    }

    #[tokio::test]
    async fn test_simulated_engine_empty_scene() {
        let engine = SimulatedEngine::with_seed(7);
        engine.load(ModelAssets::new(bytes::Bytes::new())).await.unwrap();

        let frame = Frame::synthetic_empty(640, 480);
        assert!(engine.detect(&frame).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_simulated_engine_requires_load() {
        let engine = SimulatedEngine::with_seed(7);
        let frame = Frame::synthetic(Emotion::Happy, 640, 480);
        assert!(engine.detect(&frame).await.is_err());
    }

    #[tokio::test]
    async fn test_simulated_detection_clears_quality_bar() {
        let engine = Arc::new(SimulatedEngine::with_seed(11));
        let adapter = ModelAdapter::embedded(engine);
        let frame = Frame::synthetic(Emotion::Surprised, 640, 480);

        let detection = adapter.detect_single_face(&frame).await.unwrap().unwrap();
        let flags = QualityFlags::evaluate(&detection, &frame);
        assert!(!flags.any());
    }

    #[tokio::test]
    async fn test_mock_detector_always_finds_a_face() {
        let mock = MockDetector::with_seed(3);
        let frame = Frame::synthetic_empty(100, 100);

        for _ in 0..5 {
            let result = mock.verify(&frame, Some(Emotion::Happy)).await.unwrap();
            assert!(result.is_face_detected);
            assert!(result.vibe_check.is_some());
        }
    }

    #[tokio::test]
    async fn test_mock_detector_seeded_is_deterministic() {
        let frame = Frame::synthetic_empty(100, 100);
        let a = MockDetector::with_seed(42)
            .verify(&frame, Some(Emotion::Sad))
            .await
            .unwrap();
        let b = MockDetector::with_seed(42)
            .verify(&frame, Some(Emotion::Sad))
            .await
            .unwrap();
        assert_eq!(a.overall_confidence, b.overall_confidence);
        assert_eq!(a.match_score_percent(), b.match_score_percent());
    }
}
