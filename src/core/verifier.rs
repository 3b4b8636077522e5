//! Single-shot verifier: one frame in, one vibe-check verdict out
//!
//! Quality problems downgrade confidence instead of aborting; runtime
//! detection errors are absorbed into a zero-confidence non-face result.
//! Only model availability errors leave this boundary, so the strategy
//! stack can fall through to a degraded detector.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::core::adapter::ModelAdapter;
use crate::types::{Emotion, Frame, ModelError, QualityFlags, VerificationResult, VibeCheck};
use crate::FLAGGED_CONFIDENCE_CAP;

/// Capability interface shared by the primary verifier and degraded
/// fallbacks. An `Err` means the strategy is unavailable (not that the
/// frame had no face).
#[async_trait]
pub trait Detector: Send + Sync {
    async fn verify(
        &self,
        frame: &Frame,
        requested: Option<Emotion>,
    ) -> Result<VerificationResult, ModelError>;

    /// Strategy name for logs
    fn name(&self) -> &'static str;
}

/// Primary model-backed verifier
pub struct FaceVerifier {
    adapter: Arc<ModelAdapter>,
}

impl FaceVerifier {
    pub fn new(adapter: Arc<ModelAdapter>) -> Self {
        Self { adapter }
    }

    fn analyze(
        &self,
        detection: crate::types::RawDetection,
        frame: &Frame,
        requested: Option<Emotion>,
    ) -> VerificationResult {
        let quality = QualityFlags::evaluate(&detection, frame);

        let area_ratio = if frame.area() > 0.0 {
            detection.face_box.area() / frame.area()
        } else {
            0.0
        };

        // Blend: detection score (0-50), face size (0-30), expression
        // distinctness (0-20)
        let raw = detection.score * 50.0
            + (area_ratio * 100.0).min(30.0)
            + (detection.expressions.variance() * 1000.0).min(20.0);
        let mut overall_confidence = raw.round().clamp(0.0, 100.0) as u8;
        if quality.any() {
            overall_confidence = overall_confidence.min(FLAGGED_CONFIDENCE_CAP);
        }

        let (dominant, _) = detection.expressions.dominant();
        let vibe_check = VibeCheck::evaluate(&detection.expressions, requested);

        VerificationResult {
            timestamp: Utc::now(),
            is_face_detected: true,
            overall_confidence,
            emotion_scores: detection.expressions,
            dominant_emotion: Some(dominant),
            quality,
            vibe_check: Some(vibe_check),
            message: None,
        }
    }
}

#[async_trait]
impl Detector for FaceVerifier {
    async fn verify(
        &self,
        frame: &Frame,
        requested: Option<Emotion>,
    ) -> Result<VerificationResult, ModelError> {
        // Availability failures propagate so the stack can fall back
        self.adapter.ensure_loaded().await?;

        match self.adapter.detect_single_face(frame).await {
            Ok(Some(detection)) => Ok(self.analyze(detection, frame, requested)),
            Ok(None) => Ok(VerificationResult::no_face("No face detected")),
            // Runtime inference errors never escape the verifier boundary
            Err(e) => {
                warn!(error = %e, "detection failed, returning non-face result");
                Ok(VerificationResult::no_face(format!("Detection failed: {}", e)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "face-verifier"
    }
}

/// Ranked detector strategies tried in order.
/// The first available strategy wins; if every strategy is unavailable the
/// stack degrades to a safe no-face result rather than erroring.
pub struct DetectorStack {
    strategies: Vec<Arc<dyn Detector>>,
}

impl DetectorStack {
    pub fn new(strategies: Vec<Arc<dyn Detector>>) -> Self {
        Self { strategies }
    }

    pub async fn verify(&self, frame: &Frame, requested: Option<Emotion>) -> VerificationResult {
        for strategy in &self.strategies {
            match strategy.verify(frame, requested).await {
                Ok(result) => return result,
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "detector unavailable, trying next");
                }
            }
        }
        VerificationResult::no_face("No detector available")
    }
}

// =============================================================================
// TESTS
// =============================================================================
