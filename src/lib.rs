//! MoodFi verification core
//!
//! Pipeline: frame capture → face/emotion detection → vibe check → token reward,
//! plus the timed training-mode game (10 matches in 30 seconds).

pub mod core;
pub mod types;

// =============================================================================
// DETECTION THRESHOLDS [C]
// =============================================================================

/// Minimum face-detection score a candidate must reach to count as a face.
/// Tuned for recall; low-quality detections are penalized downstream instead
/// of being rejected here.
pub const MIN_DETECTION_SCORE: f64 = 0.3;

/// Requested-emotion probability above which a vibe check passes
pub const VIBE_PASS_THRESHOLD: f64 = 0.2;

/// Detection score below which the low-confidence quality flag is raised
pub const QUALITY_MIN_SCORE: f64 = 0.7;

/// Face-box area / frame area below which the face-too-small flag is raised
pub const MIN_FACE_AREA_RATIO: f64 = 0.03;

/// Overall confidence is capped here when any quality flag was raised
pub const FLAGGED_CONFIDENCE_CAP: u8 = 85;

/// Match percentage a training-mode detection must exceed to count as a match
pub const MATCH_THRESHOLD_PERCENT: u8 = 70;

// =============================================================================
// REWARD FORMULA [C]
// =============================================================================

/// Bonus for matching the challenge emotion exactly
pub const EXACT_MATCH_BONUS: f64 = 50.0;

/// Vibe bonus for a strong (but not exact) match
pub const VIBE_BONUS_STRONG: f64 = 30.0;

/// Vibe bonus for a partial match
pub const VIBE_BONUS_PARTIAL: f64 = 15.0;

/// Match percentage above which the strong vibe bonus applies
pub const VIBE_STRONG_CUTOFF: u8 = 70;

/// Match percentage above which the partial vibe bonus applies
pub const VIBE_PARTIAL_CUTOFF: u8 = 40;

// =============================================================================
// TRAINING MODE [C]
// =============================================================================

/// Challenges per training session
pub const TOTAL_CHALLENGES: u32 = 10;

/// Session time budget in seconds
pub const TRAINING_DURATION_SECS: u32 = 30;

/// Points per successful match
pub const POINTS_PER_MATCH: u32 = 10;

/// Bonus points per second left on the clock
pub const TIME_BONUS_PER_SEC: f64 = 2.0;

/// Scale applied to the accuracy ratio in the completion bonus (100 * 0.5)
pub const ACCURACY_BONUS_SCALE: f64 = 50.0;

/// Detection-loop frame cadence in milliseconds (~30 fps)
pub const FRAME_INTERVAL_MS: u64 = 33;

/// Live-feed detection history depth (~3 seconds of recent detections)
pub const HISTORY_CAPACITY: usize = 3;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
