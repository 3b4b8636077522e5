//! Integration tests for training mode
//!
//! Full path: synthetic camera → detection loop → session controller

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use moodfi::core::{
    Detector, DetectionLoop, DetectorStack, FaceVerifier, FrameScheduler, ModelAdapter, Scene,
    SimulatedEngine, SyntheticCamera, TickScheduler, TrainingController, TrainingSession,
};
use moodfi::core::LoopEvent;
use moodfi::types::{Emotion, LoopPhase, TrainingPhase};

fn simulated_stack(seed: u64) -> Arc<DetectorStack> {
    let adapter = Arc::new(ModelAdapter::embedded(Arc::new(SimulatedEngine::with_seed(
        seed,
    ))));
    Arc::new(DetectorStack::new(vec![
        Arc::new(FaceVerifier::new(adapter)) as Arc<dyn Detector>,
    ]))
}

/// Scheduler that yields without sleeping
struct InstantScheduler;

#[async_trait]
impl TickScheduler for InstantScheduler {
    async fn next_tick(&self) {
        tokio::task::yield_now().await;
    }
}

/// Test the loop matching against the live scene
#[tokio::test]
async fn test_loop_matches_live_scene() {
    let scene = Scene::new();
    scene.show(Emotion::Angry);
    let camera = Arc::new(Mutex::new(SyntheticCamera::open(scene).unwrap()));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let detection_loop = DetectionLoop::new(
        simulated_stack(1),
        Arc::new(InstantScheduler),
        tx,
        CancellationToken::new(),
    );

    let phase = detection_loop.run(camera, Emotion::Angry).await;
    assert_eq!(phase, LoopPhase::Matched);

    let mut saw_match = false;
    while let Ok(event) = rx.try_recv() {
        if let LoopEvent::Matched { emotion, match_score_percent, snapshot } = event {
            assert_eq!(emotion, Emotion::Angry);
            assert!(match_score_percent > 70);
            assert_eq!(snapshot.staged_emotion(), Some(Emotion::Angry));
            saw_match = true;
        }
    }
    assert!(saw_match);
}

/// Test loop cancellation while the scene never matches
#[tokio::test]
async fn test_loop_stops_on_cancel() {
    let scene = Scene::new();
    scene.show(Emotion::Neutral);
    let camera = Arc::new(Mutex::new(SyntheticCamera::open(scene).unwrap()));

    let (tx, _rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let detection_loop = DetectionLoop::new(
        simulated_stack(2),
        Arc::new(InstantScheduler),
        tx,
        cancel.clone(),
    );

    let handle = tokio::spawn(async move { detection_loop.run(camera, Emotion::Happy).await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), LoopPhase::Stopped);
}

/// Test a full game where the player always shows the current target
#[tokio::test(start_paused = true)]
async fn test_full_game_perfect_run() {
    let controller = TrainingController::new(
        TrainingSession::with_seed(5),
        simulated_stack(3),
        Arc::new(FrameScheduler::with_interval(Duration::from_millis(10))),
    );

    let scene = Scene::new();
    let camera = Arc::new(Mutex::new(SyntheticCamera::open(scene.clone()).unwrap()));

    let session = controller.session();
    let follower = tokio::spawn(async move {
        loop {
            if let Some(target) = session.lock().target() {
                scene.show(target);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let status = controller.run(Arc::clone(&camera)).await;
    follower.abort();

    assert_eq!(status.phase, TrainingPhase::Complete);
    assert_eq!(status.correct, 10);
    assert_eq!(status.score, 100);
    assert_eq!(status.challenge_index, 10);

    // Camera teardown releases the hardware handle
    let mut camera = camera.lock();
    camera.close();
    assert!(camera.stream().tracks().iter().all(|t| !t.is_active()));
}

/// Test a game where the player never matches anything
#[tokio::test(start_paused = true)]
async fn test_full_game_timeout() {
    let controller = TrainingController::new(
        TrainingSession::with_seed(6),
        simulated_stack(4),
        Arc::new(FrameScheduler::new()),
    );

    let scene = Scene::new();
    scene.show(Emotion::Neutral);
    let camera = Arc::new(Mutex::new(SyntheticCamera::open(scene).unwrap()));

    let status = controller.run(camera).await;
    assert_eq!(status.phase, TrainingPhase::Complete);
    assert_eq!(status.time_remaining, 0);
    assert_eq!(status.correct, 0);
    assert_eq!(status.bonus_reward, 0);
}

/// Test that dropping the camera stream stops its tracks on every path
#[tokio::test]
async fn test_camera_released_after_abandoned_game() {
    let scene = Scene::new();
    let camera = SyntheticCamera::open(scene).unwrap();
    let tracks: Vec<_> = camera.stream().tracks().to_vec();

    drop(camera);
    assert!(tracks.iter().all(|t| !t.is_active()));
}
