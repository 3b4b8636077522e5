//! Continuous detection loop and training-mode controller
//!
//! Loop transitions:
//! - Idle → Detecting: next frame tick while training is active
//! - Detecting → Matched: dominant == target AND match score > 70; the loop
//!   captures the frame, reports the match, and stops itself
//! - Detecting → Idle: verification finished without a qualifying match
//! - any → Stopped: cancellation; an in-flight result is discarded
//!
//! The controller owns the session, runs the 1-second clock, and restarts
//! the loop with a fresh target after every accepted match.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::camera::FrameSource;
use crate::core::session::TrainingSession;
use crate::core::verifier::DetectorStack;
use crate::types::{Emotion, Frame, LoopPhase, TrainingPhase, TrainingStatus};
use crate::{FRAME_INTERVAL_MS, MATCH_THRESHOLD_PERCENT};

/// Frame-cadence seam. Production sleeps one display interval per tick;
/// tests substitute an immediate fake.
#[async_trait]
pub trait TickScheduler: Send + Sync {
    async fn next_tick(&self);
}

/// Sleeps one frame interval (~30 fps) per tick
pub struct FrameScheduler {
    interval: Duration,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(FRAME_INTERVAL_MS))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickScheduler for FrameScheduler {
    async fn next_tick(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Events the loop reports upward
#[derive(Debug, Clone)]
pub enum LoopEvent {
    /// A verification completed; informational, fired on every frame that
    /// found a face
    Detected {
        emotion: Emotion,
        match_score_percent: u8,
        confidence: u8,
    },
    /// The target was matched; carries the captured frame
    Matched {
        emotion: Emotion,
        match_score_percent: u8,
        snapshot: Frame,
    },
}

/// Repeated single-shot verification against a live frame source.
/// Verifications are strictly sequential: the next frame is not scheduled
/// until the current verification resolves, so detection latency throttles
/// the effective inspection rate.
pub struct DetectionLoop {
    detector: Arc<DetectorStack>,
    scheduler: Arc<dyn TickScheduler>,
    events: mpsc::UnboundedSender<LoopEvent>,
    cancel: CancellationToken,
}

impl DetectionLoop {
    pub fn new(
        detector: Arc<DetectorStack>,
        scheduler: Arc<dyn TickScheduler>,
        events: mpsc::UnboundedSender<LoopEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            detector,
            scheduler,
            events,
            cancel,
        }
    }

    /// Run until the target is matched or the loop is cancelled.
    /// Restarting for the next challenge is the caller's job.
    pub async fn run<C: FrameSource>(&self, camera: Arc<Mutex<C>>, target: Emotion) -> LoopPhase {
        loop {
            // Idle: wait for the next frame tick
            tokio::select! {
                _ = self.cancel.cancelled() => return LoopPhase::Stopped,
                _ = self.scheduler.next_tick() => {}
            }

            let frame = match camera.lock().grab() {
                Ok(frame) => frame,
                // A bad frame never halts training
                Err(e) => {
                    warn!(error = %e, "frame grab failed, skipping");
                    continue;
                }
            };

            // Detecting: cancellation discards the in-flight result
            let result = tokio::select! {
                _ = self.cancel.cancelled() => return LoopPhase::Stopped,
                result = self.detector.verify(&frame, Some(target)) => result,
            };

            let Some(dominant) = result.dominant_emotion else {
                continue;
            };
            let match_score_percent = result.match_score_percent();

            let _ = self.events.send(LoopEvent::Detected {
                emotion: dominant,
                match_score_percent,
                confidence: result.overall_confidence,
            });

            if dominant == target && match_score_percent > MATCH_THRESHOLD_PERCENT {
                debug!(target = %target, score = match_score_percent, "target matched");
                let _ = self.events.send(LoopEvent::Matched {
                    emotion: dominant,
                    match_score_percent,
                    snapshot: frame,
                });
                return LoopPhase::Matched;
            }
        }
    }
}

/// Live updates fanned out to consumers (terminal, websocket)
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Session state changed
    Status(TrainingStatus),
    /// The loop saw an emotion (pre-match, informational)
    Detection {
        emotion: Emotion,
        match_score_percent: u8,
        confidence: u8,
    },
}

/// Wires the session clock and the detection loop together for one game
pub struct TrainingController {
    session: Arc<Mutex<TrainingSession>>,
    detector: Arc<DetectorStack>,
    scheduler: Arc<dyn TickScheduler>,
    cancel: CancellationToken,
    updates: broadcast::Sender<ControllerEvent>,
}

impl TrainingController {
    pub fn new(
        session: TrainingSession,
        detector: Arc<DetectorStack>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            session: Arc::new(Mutex::new(session)),
            detector,
            scheduler,
            cancel: CancellationToken::new(),
            updates,
        }
    }

    /// Subscribe to live updates
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.updates.subscribe()
    }

    /// Token that stops the game from outside
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn session(&self) -> Arc<Mutex<TrainingSession>> {
        Arc::clone(&self.session)
    }

    /// Run a full session to completion (all challenges, timeout, or
    /// cancellation) and return the final status.
    pub async fn run<C: FrameSource + Send + 'static>(
        &self,
        camera: Arc<Mutex<C>>,
    ) -> TrainingStatus {
        let status = self.session.lock().start();
        let _ = self.updates.send(ControllerEvent::Status(status));

        let mut clock = tokio::time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; skip it
        clock.tick().await;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut loop_cancel = self.spawn_loop(Arc::clone(&camera), event_tx.clone());

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    loop_cancel.cancel();
                    let status = self.session.lock().stop();
                    let _ = self.updates.send(ControllerEvent::Status(status.clone()));
                    return status;
                }
                _ = clock.tick() => {
                    let status = self.session.lock().tick();
                    let _ = self.updates.send(ControllerEvent::Status(status.clone()));
                    if status.phase == TrainingPhase::Complete {
                        loop_cancel.cancel();
                        return status;
                    }
                }
                event = event_rx.recv() => {
                    match event {
                        Some(LoopEvent::Detected { emotion, match_score_percent, confidence }) => {
                            let _ = self.updates.send(ControllerEvent::Detection {
                                emotion,
                                match_score_percent,
                                confidence,
                            });
                        }
                        Some(LoopEvent::Matched { .. }) => {
                            let status = {
                                let mut session = self.session.lock();
                                session.record_match(true);
                                session.enforce_bounds();
                                session.status()
                            };
                            let _ = self.updates.send(ControllerEvent::Status(status.clone()));
                            if status.phase == TrainingPhase::Complete {
                                loop_cancel.cancel();
                                return status;
                            }
                            // The matched loop stopped itself; start a fresh
                            // one for the new target
                            loop_cancel.cancel();
                            loop_cancel = self.spawn_loop(Arc::clone(&camera), event_tx.clone());
                        }
                        // We hold a sender clone, so the channel never closes
                        None => {}
                    }
                }
            }
        }
    }

    fn spawn_loop<C: FrameSource + Send + 'static>(
        &self,
        camera: Arc<Mutex<C>>,
        events: mpsc::UnboundedSender<LoopEvent>,
    ) -> CancellationToken {
        let target = match self.session.lock().target() {
            Some(target) => target,
            None => return self.cancel.child_token(),
        };
        let child = self.cancel.child_token();
        let detection_loop = DetectionLoop::new(
            Arc::clone(&self.detector),
            Arc::clone(&self.scheduler),
            events,
            child.clone(),
        );
        tokio::spawn(async move {
            detection_loop.run(camera, target).await;
        });
        child
    }
}

// =============================================================================
// TESTS
// =============================================================================
