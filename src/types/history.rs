//! Live-feed detection history
//!
//! A bounded ring of the most recent detections, roughly the last three
//! seconds of a live feed. Oldest entry is evicted when the buffer is full.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Emotion, EmotionScores};
use crate::HISTORY_CAPACITY;

/// One completed detection in the live feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub timestamp: DateTime<Utc>,
    pub dominant_emotion: Emotion,
    pub emotion_scores: EmotionScores,
    pub confidence: u8,
}

impl DetectionRecord {
    pub fn new(dominant_emotion: Emotion, emotion_scores: EmotionScores, confidence: u8) -> Self {
        Self {
            timestamp: Utc::now(),
            dominant_emotion,
            emotion_scores,
            confidence,
        }
    }
}

/// Ring buffer of recent detections
#[derive(Debug)]
pub struct DetectionHistory {
    records: VecDeque<DetectionRecord>,
    capacity: usize,
}

impl Default for DetectionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionHistory {
    /// Create with the default live-feed depth
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create with a custom depth
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Add a record, evicting the oldest when full
    pub fn push(&mut self, record: DetectionRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records oldest first
    pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.records.iter()
    }

    /// Most recent record
    pub fn latest(&self) -> Option<&DetectionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
