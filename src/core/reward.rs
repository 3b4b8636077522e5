//! Token reward formula
//!
//! Pure and deterministic: base pay scales with detection confidence, an
//! exact match earns the big bonus, and a near-miss earns a vibe bonus.
//! The two bonuses are mutually exclusive.

use crate::types::VerificationResult;
use crate::{
    EXACT_MATCH_BONUS, VIBE_BONUS_PARTIAL, VIBE_BONUS_STRONG, VIBE_PARTIAL_CUTOFF,
    VIBE_STRONG_CUTOFF,
};

/// Compute the token reward for one completed capture.
///
/// `confidence` and `match_score_percent` are 0-100. The result is rounded
/// to one decimal place.
pub fn compute_reward(confidence: u8, match_score_percent: u8, is_exact_match: bool) -> f64 {
    let base = confidence as f64 / 10.0;

    let exact_bonus = if is_exact_match { EXACT_MATCH_BONUS } else { 0.0 };

    // Vibe bonus only applies on the non-exact path
    let vibe_bonus = if is_exact_match {
        0.0
    } else if match_score_percent > VIBE_STRONG_CUTOFF {
        VIBE_BONUS_STRONG
    } else if match_score_percent > VIBE_PARTIAL_CUTOFF {
        VIBE_BONUS_PARTIAL
    } else {
        0.0
    };

    round1(base + exact_bonus + vibe_bonus)
}

/// Reward for a completed capture; a frame with no face earns nothing
pub fn reward_for(result: &VerificationResult) -> f64 {
    if !result.is_face_detected {
        return 0.0;
    }
    compute_reward(
        result.overall_confidence,
        result.match_score_percent(),
        result.is_exact_match(),
    )
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// =============================================================================
// TESTS
// =============================================================================
