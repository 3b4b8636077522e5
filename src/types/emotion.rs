//! Emotion labels and per-emotion score distributions

use serde::{Deserialize, Serialize};

/// The closed set of emotions the expression model can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Emotion {
    /// All emotions, in model output order
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgusted,
        Emotion::Surprised,
    ];

    /// Emotions eligible as training-mode targets. Neutral is excluded
    /// from the pool.
    pub const CHALLENGE_POOL: [Emotion; 4] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
    ];

    /// Lowercase label as used in model output and the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
            Emotion::Surprised => "surprised",
        }
    }

    /// Get emoji for emotion
    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Neutral => "😐",
            Emotion::Happy => "😄",
            Emotion::Sad => "😢",
            Emotion::Angry => "😠",
            Emotion::Fearful => "😨",
            Emotion::Disgusted => "🤢",
            Emotion::Surprised => "😲",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Emotion::Neutral),
            "happy" => Ok(Emotion::Happy),
            "sad" => Ok(Emotion::Sad),
            "angry" => Ok(Emotion::Angry),
            "fearful" => Ok(Emotion::Fearful),
            "disgusted" => Ok(Emotion::Disgusted),
            "surprised" => Ok(Emotion::Surprised),
            other => Err(format!("unknown emotion: {}", other)),
        }
    }
}

/// Per-emotion probabilities from one expression inference.
/// Values are in [0,1] and normalized-ish; they need not sum to exactly 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub surprised: f64,
}

impl EmotionScores {
    /// Create zero scores
    pub fn zero() -> Self {
        Self::default()
    }

    /// Score for a single emotion
    pub fn get(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Neutral => self.neutral,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Fearful => self.fearful,
            Emotion::Disgusted => self.disgusted,
            Emotion::Surprised => self.surprised,
        }
    }

    /// Set the score for a single emotion
    pub fn set(&mut self, emotion: Emotion, value: f64) {
        match emotion {
            Emotion::Neutral => self.neutral = value,
            Emotion::Happy => self.happy = value,
            Emotion::Sad => self.sad = value,
            Emotion::Angry => self.angry = value,
            Emotion::Fearful => self.fearful = value,
            Emotion::Disgusted => self.disgusted = value,
            Emotion::Surprised => self.surprised = value,
        }
    }

    /// Iterate all (emotion, score) pairs in model output order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }

    /// Emotion with the highest score, with its score
    pub fn dominant(&self) -> (Emotion, f64) {
        let mut best = (Emotion::Neutral, self.neutral);
        for (emotion, score) in self.iter() {
            if score > best.1 {
                best = (emotion, score);
            }
        }
        best
    }

    /// Population variance across the seven scores.
    /// A flat distribution (model unsure) has near-zero variance; a peaked
    /// one (clear read) has high variance.
    pub fn variance(&self) -> f64 {
        let n = Emotion::ALL.len() as f64;
        let mean = self.iter().map(|(_, s)| s).sum::<f64>() / n;
        self.iter().map(|(_, s)| (s - mean) * (s - mean)).sum::<f64>() / n
    }
}

// =============================================================================
// TESTS
// =============================================================================
