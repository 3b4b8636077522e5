//! Training session state machine
//!
//! Phase transitions:
//! - NOT_STARTED → RUNNING: start() resets counters, 30s clock, random target
//! - RUNNING → COMPLETE: clock hits zero, final challenge matched, or stop()
//! - COMPLETE → NOT_STARTED: reset()

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::types::{Emotion, TrainingPhase, TrainingStatus};
use crate::{
    ACCURACY_BONUS_SCALE, POINTS_PER_MATCH, TIME_BONUS_PER_SEC, TOTAL_CHALLENGES,
    TRAINING_DURATION_SECS,
};

/// Training-mode game state.
/// Owned by the controller; the detection loop only reads the current
/// target and reports match events.
#[derive(Debug)]
pub struct TrainingSession {
    phase: TrainingPhase,
    challenge_index: u32,
    time_remaining: u32,
    target: Option<Emotion>,
    correct: u32,
    score: u32,
    bonus: u32,
    rng: SmallRng,
}

impl Default for TrainingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingSession {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Fixed seed for deterministic challenge sequences
    pub fn with_seed(seed: u64) -> Self {
        Self {
            phase: TrainingPhase::NotStarted,
            challenge_index: 0,
            time_remaining: 0,
            target: None,
            correct: 0,
            score: 0,
            bonus: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Begin a session: challenge 1, full clock, fresh target
    pub fn start(&mut self) -> TrainingStatus {
        self.phase = TrainingPhase::Running;
        self.challenge_index = 1;
        self.time_remaining = TRAINING_DURATION_SECS;
        self.correct = 0;
        self.score = 0;
        self.bonus = 0;
        self.target = Some(self.pick_target());
        self.status()
    }

    /// One-second clock tick. Reaching zero while running completes the
    /// session.
    pub fn tick(&mut self) -> TrainingStatus {
        if self.phase == TrainingPhase::Running {
            self.time_remaining = self.time_remaining.saturating_sub(1);
            if self.time_remaining == 0 {
                self.complete();
            }
        }
        self.status()
    }

    /// Record the outcome of the current challenge. A success scores points;
    /// either way the session advances to a new target, except that moving
    /// past the final challenge completes the session instead.
    pub fn record_match(&mut self, success: bool) -> TrainingStatus {
        if self.phase != TrainingPhase::Running {
            return self.status();
        }

        if success {
            self.correct += 1;
            self.score += POINTS_PER_MATCH;
        }

        if self.challenge_index >= TOTAL_CHALLENGES {
            self.complete();
        } else {
            self.challenge_index += 1;
            self.target = Some(self.pick_target());
        }
        self.status()
    }

    /// Manual finalize
    pub fn stop(&mut self) -> TrainingStatus {
        if self.phase == TrainingPhase::Running {
            self.complete();
        }
        self.status()
    }

    /// Back to NOT_STARTED with all counters cleared
    pub fn reset(&mut self) {
        self.phase = TrainingPhase::NotStarted;
        self.challenge_index = 0;
        self.time_remaining = 0;
        self.target = None;
        self.correct = 0;
        self.score = 0;
        self.bonus = 0;
    }

    /// Safety net: the challenge index must never exceed the total while
    /// running. Forces completion if the loop and controller fall out of
    /// sync.
    pub fn enforce_bounds(&mut self) {
        if self.phase == TrainingPhase::Running && self.challenge_index > TOTAL_CHALLENGES {
            self.challenge_index = TOTAL_CHALLENGES;
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.phase = TrainingPhase::Complete;
        self.bonus = compute_bonus(self.time_remaining, self.correct, self.challenge_index);
    }

    fn pick_target(&mut self) -> Emotion {
        let pool = Emotion::CHALLENGE_POOL;
        pool[self.rng.gen_range(0..pool.len())]
    }

    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    pub fn target(&self) -> Option<Emotion> {
        self.target
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn challenge_index(&self) -> u32 {
        self.challenge_index
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn bonus(&self) -> u32 {
        self.bonus
    }

    /// Current snapshot for display and live updates
    pub fn status(&self) -> TrainingStatus {
        TrainingStatus {
            timestamp: Utc::now(),
            phase: self.phase,
            challenge_index: self.challenge_index,
            total_challenges: TOTAL_CHALLENGES,
            time_remaining: self.time_remaining,
            target: self.target,
            correct: self.correct,
            score: self.score,
            bonus_reward: self.bonus,
        }
    }
}

/// Completion bonus: time left at 2 points per second, plus an
/// accuracy-weighted share
fn compute_bonus(time_remaining: u32, correct: u32, challenge_index: u32) -> u32 {
    let accuracy = correct as f64 / challenge_index.max(1) as f64;
    (time_remaining as f64 * TIME_BONUS_PER_SEC + accuracy * ACCURACY_BONUS_SCALE).round() as u32
}

// =============================================================================
// TESTS
// =============================================================================
