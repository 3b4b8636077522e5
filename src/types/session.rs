//! Training-mode state definitions and status snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Emotion;

/// Lifecycle of a training session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingPhase {
    /// No session yet, or after a reset
    NotStarted,
    /// Timer ticking, challenges active
    Running,
    /// Time ran out, all challenges matched, or stopped manually
    Complete,
}

impl TrainingPhase {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            TrainingPhase::NotStarted => "\x1b[90m", // Gray
            TrainingPhase::Running => "\x1b[33m",    // Orange/Yellow
            TrainingPhase::Complete => "\x1b[32m",   // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for phase
    pub fn emoji(&self) -> &'static str {
        match self {
            TrainingPhase::NotStarted => "⏳",
            TrainingPhase::Running => "🎯",
            TrainingPhase::Complete => "🏁",
        }
    }
}

impl std::fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrainingPhase::NotStarted => "NOT_STARTED",
            TrainingPhase::Running => "RUNNING",
            TrainingPhase::Complete => "COMPLETE",
        };
        write!(f, "{}", name)
    }
}

/// States of the continuous detection loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopPhase {
    /// Waiting for the next frame tick
    Idle,
    /// A verification is in flight
    Detecting,
    /// Target matched; the loop stopped itself
    Matched,
    /// Cancelled from outside
    Stopped,
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopPhase::Idle => "IDLE",
            LoopPhase::Detecting => "DETECTING",
            LoopPhase::Matched => "MATCHED",
            LoopPhase::Stopped => "STOPPED",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot of a training session for display and live updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStatus {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Session phase
    pub phase: TrainingPhase,
    /// Current challenge, 1-based
    pub challenge_index: u32,
    /// Total challenges in a session
    pub total_challenges: u32,
    /// Seconds left on the clock
    pub time_remaining: u32,
    /// Emotion the player must show now
    pub target: Option<Emotion>,
    /// Challenges matched so far
    pub correct: u32,
    /// Points earned from matches
    pub score: u32,
    /// Completion bonus (0 until Complete)
    pub bonus_reward: u32,
}

impl TrainingStatus {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.phase.color_code();
        let reset = TrainingPhase::color_reset();
        let target = match self.target {
            Some(t) => format!("{} {}", t.emoji(), t),
            None => "-".to_string(),
        };
        format!(
            "{}{} [{}] challenge {}/{} | target={} | {}s left | score={} | correct={}{}",
            color,
            self.phase.emoji(),
            self.phase,
            self.challenge_index,
            self.total_challenges,
            target,
            self.time_remaining,
            self.score,
            self.correct,
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | challenge={}/{} | target={} | left={}s | score={} | correct={} | bonus={}",
            self.phase,
            self.challenge_index,
            self.total_challenges,
            self.target.map(|t| t.as_str()).unwrap_or("-"),
            self.time_remaining,
            self.score,
            self.correct,
            self.bonus_reward
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
