//! Verification results and vibe checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Emotion, EmotionScores, QualityFlags};
use crate::VIBE_PASS_THRESHOLD;

/// Verdict of comparing detected expressions against a requested emotion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeCheck {
    /// The emotion that was asked for, if any
    pub requested_emotion: Option<Emotion>,
    /// The emotion the face actually shows most
    pub dominant_emotion: Emotion,
    /// Requested-emotion score as a percentage (dominant score when nothing
    /// was requested)
    pub match_score_percent: u8,
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable verdict
    pub message: String,
}

impl VibeCheck {
    /// Build the verdict for a detection's expression scores.
    /// With a requested emotion the check passes iff that emotion's score
    /// clears the pass threshold; without one the check always passes and
    /// reports the dominant emotion.
    pub fn evaluate(scores: &EmotionScores, requested: Option<Emotion>) -> Self {
        let (dominant, dominant_score) = scores.dominant();

        match requested {
            Some(target) => {
                let target_score = scores.get(target);
                let passed = target_score > VIBE_PASS_THRESHOLD;
                let match_score_percent = to_percent(target_score);
                let message = if passed {
                    format!(
                        "{} Vibe check passed! You're giving {} energy",
                        target.emoji(),
                        target
                    )
                } else {
                    format!(
                        "{} Not feeling the {} vibe yet, showing {} instead",
                        target.emoji(),
                        target,
                        dominant
                    )
                };
                Self {
                    requested_emotion: Some(target),
                    dominant_emotion: dominant,
                    match_score_percent,
                    passed,
                    message,
                }
            }
            None => Self {
                requested_emotion: None,
                dominant_emotion: dominant,
                match_score_percent: to_percent(dominant_score),
                passed: true,
                message: format!("{} Reading {} right now", dominant.emoji(), dominant),
            },
        }
    }
}

/// Outcome of one verification call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// When the verification ran
    pub timestamp: DateTime<Utc>,
    /// Whether a face was found at all
    pub is_face_detected: bool,
    /// Blended confidence in the reading (0-100)
    pub overall_confidence: u8,
    /// Full per-emotion distribution
    pub emotion_scores: EmotionScores,
    /// Highest-scoring emotion, when a face was found
    pub dominant_emotion: Option<Emotion>,
    /// Quality problems found (downgrades only)
    pub quality: QualityFlags,
    /// Vibe check verdict, when a face was found
    pub vibe_check: Option<VibeCheck>,
    /// Diagnostic message on the no-face path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    /// Zero-confidence result for a frame with no usable face
    pub fn no_face(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            is_face_detected: false,
            overall_confidence: 0,
            emotion_scores: EmotionScores::zero(),
            dominant_emotion: None,
            quality: QualityFlags::default(),
            vibe_check: None,
            message: Some(message.into()),
        }
    }

    /// Match percentage from the vibe check, 0 when there is none
    pub fn match_score_percent(&self) -> u8 {
        self.vibe_check.as_ref().map(|v| v.match_score_percent).unwrap_or(0)
    }

    /// True when the detected dominant emotion equals the requested one
    pub fn is_exact_match(&self) -> bool {
        match &self.vibe_check {
            Some(v) => v.requested_emotion == Some(v.dominant_emotion),
            None => false,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        match self.dominant_emotion {
            Some(dominant) => {
                let verdict = match &self.vibe_check {
                    Some(v) if v.passed => "\x1b[32mPASS\x1b[0m",
                    Some(_) => "\x1b[31mFAIL\x1b[0m",
                    None => "-",
                };
                format!(
                    "{} {} | confidence={} | match={}% | {}",
                    dominant.emoji(),
                    dominant,
                    self.overall_confidence,
                    self.match_score_percent(),
                    verdict
                )
            }
            None => format!(
                "\x1b[90m∅ no face | {}\x1b[0m",
                self.message.as_deref().unwrap_or("")
            ),
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        match self.dominant_emotion {
            Some(dominant) => format!(
                "face=yes | emotion={} | confidence={} | match={}% | passed={}",
                dominant,
                self.overall_confidence,
                self.match_score_percent(),
                self.vibe_check.as_ref().map(|v| v.passed).unwrap_or(false)
            ),
            None => format!(
                "face=no | confidence=0 | message={}",
                self.message.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Round a [0,1] score to a whole percentage
fn to_percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

// =============================================================================
// TESTS
// =============================================================================
