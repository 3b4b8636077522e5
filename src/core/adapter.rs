//! Emotion model adapter
//!
//! Owns the inference backend plus its load state. Loading is lazy and
//! single-flight: concurrent callers share one in-flight load, all waiters
//! of a failed load see the same error, and a failed adapter returns to the
//! not-loaded state so a later call can retry.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::types::{Frame, ModelError, RawDetection};
use crate::MIN_DETECTION_SCORE;

/// Model weights and metadata handed to an engine at load time
#[derive(Debug, Clone)]
pub struct ModelAssets {
    pub weights: Bytes,
}

impl ModelAssets {
    pub fn new(weights: Bytes) -> Self {
        Self { weights }
    }
}

/// Where model assets come from
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Fetch weights over HTTP once per process
    Remote { url: String },
    /// Built-in defaults, no fetch
    Embedded,
}

impl ModelSource {
    /// Fetch the assets this source points at
    pub async fn fetch(&self) -> Result<ModelAssets, ModelError> {
        match self {
            ModelSource::Remote { url } => {
                debug!(url, "fetching model assets");
                let response = reqwest::get(url)
                    .await
                    .map_err(|e| ModelError::Fetch(e.to_string()))?
                    .error_for_status()
                    .map_err(|e| ModelError::Fetch(e.to_string()))?;
                let weights = response
                    .bytes()
                    .await
                    .map_err(|e| ModelError::Fetch(e.to_string()))?;
                Ok(ModelAssets::new(weights))
            }
            ModelSource::Embedded => Ok(ModelAssets::new(Bytes::new())),
        }
    }
}

/// Inference backend seam.
/// Implementations find face candidates in a frame and score their
/// expressions; the adapter handles load state and candidate selection.
#[async_trait]
pub trait FaceEngine: Send + Sync {
    /// Load model weights. Called once per process by the adapter.
    async fn load(&self, assets: ModelAssets) -> Result<(), ModelError>;

    /// All face candidates found in the frame, unfiltered
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, ModelError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

type LoadFuture = Shared<BoxFuture<'static, Result<(), ModelError>>>;

enum LoadState {
    NotLoaded,
    Loading(LoadFuture),
    Loaded,
}

/// Adapter owning one engine and its load lifecycle
pub struct ModelAdapter {
    engine: Arc<dyn FaceEngine>,
    source: ModelSource,
    load_state: Mutex<LoadState>,
}

impl ModelAdapter {
    pub fn new(engine: Arc<dyn FaceEngine>, source: ModelSource) -> Self {
        Self {
            engine,
            source,
            load_state: Mutex::new(LoadState::NotLoaded),
        }
    }

    /// Adapter over an engine that needs no external assets
    pub fn embedded(engine: Arc<dyn FaceEngine>) -> Self {
        Self::new(engine, ModelSource::Embedded)
    }

    /// True once a load has completed successfully
    pub fn is_loaded(&self) -> bool {
        matches!(*self.load_state.lock(), LoadState::Loaded)
    }

    /// Idempotent lazy load. Concurrent callers await the same in-flight
    /// load; its outcome (success or failure) is delivered to every waiter.
    pub async fn ensure_loaded(&self) -> Result<(), ModelError> {
        let fut = {
            let mut state = self.load_state.lock();
            match &*state {
                LoadState::Loaded => return Ok(()),
                LoadState::Loading(fut) => fut.clone(),
                LoadState::NotLoaded => {
                    let engine = Arc::clone(&self.engine);
                    let source = self.source.clone();
                    let fut: LoadFuture = async move {
                        let assets = source.fetch().await?;
                        engine.load(assets).await
                    }
                    .boxed()
                    .shared();
                    *state = LoadState::Loading(fut.clone());
                    fut
                }
            }
        };

        let result = fut.await;

        let mut state = self.load_state.lock();
        match &result {
            Ok(()) => {
                if !matches!(*state, LoadState::Loaded) {
                    info!(engine = self.engine.name(), "model loaded");
                }
                *state = LoadState::Loaded;
            }
            // Failed load resets to NotLoaded so the next call retries
            Err(_) => {
                if matches!(*state, LoadState::Loading(_)) {
                    *state = LoadState::NotLoaded;
                }
            }
        }
        result
    }

    /// Highest-confidence face in the frame, or None when nothing clears
    /// the minimum detection score
    pub async fn detect_single_face(
        &self,
        frame: &Frame,
    ) -> Result<Option<RawDetection>, ModelError> {
        self.ensure_loaded().await?;

        let candidates = self.engine.detect(frame).await?;
        Ok(candidates
            .into_iter()
            .filter(|d| d.score >= MIN_DETECTION_SCORE)
            .max_by(|a, b| a.score.total_cmp(&b.score)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmotionScores, FaceBox, FaceLandmarks};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine that counts loads and can fail the first N of them
    struct CountingEngine {
        loads: AtomicUsize,
        fail_first: usize,
    }

    impl CountingEngine {
        fn new(fail_first: usize) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl FaceEngine for CountingEngine {
        async fn load(&self, _assets: ModelAssets) -> Result<(), ModelError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent callers pile onto the in-flight load
            tokio::task::yield_now().await;
            if n < self.fail_first {
                Err(ModelError::Load("weights corrupt".into()))
            } else {
                Ok(())
            }
        }

        async fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, ModelError> {
            Ok(vec![
                detection_with_score(0.4),
                detection_with_score(0.9),
                detection_with_score(0.2),
            ])
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn detection_with_score(score: f64) -> RawDetection {
        RawDetection {
            score,
            face_box: FaceBox::new(0.0, 0.0, 50.0, 50.0),
            landmarks: FaceLandmarks::default(),
            descriptor: Vec::new(),
            expressions: EmotionScores::zero(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_flight() {
        let engine = Arc::new(CountingEngine::new(0));
        let adapter = Arc::new(ModelAdapter::embedded(engine.clone()));

        let a = Arc::clone(&adapter);
        let b = Arc::clone(&adapter);
        let (ra, rb) = tokio::join!(a.ensure_loaded(), b.ensure_loaded());
        assert!(ra.is_ok());
        assert!(rb.is_ok());
        assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
        assert!(adapter.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_allows_retry() {
        let engine = Arc::new(CountingEngine::new(1));
        let adapter = ModelAdapter::embedded(engine.clone());

        let err = adapter.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, ModelError::Load(_)));
        assert!(!adapter.is_loaded());

        // Second call starts a fresh load and succeeds
        adapter.ensure_loaded().await.unwrap();
        assert!(adapter.is_loaded());
        assert_eq!(engine.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_a_failure() {
        let engine = Arc::new(CountingEngine::new(2));
        let adapter = Arc::new(ModelAdapter::embedded(engine.clone()));

        let a = Arc::clone(&adapter);
        let b = Arc::clone(&adapter);
        let (ra, rb) = tokio::join!(a.ensure_loaded(), b.ensure_loaded());

        // One underlying load ran; both waiters saw its error
        assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
        assert_eq!(ra.unwrap_err(), rb.unwrap_err());
        assert!(!adapter.is_loaded());
    }

    #[tokio::test]
    async fn test_repeat_load_is_noop() {
        let engine = Arc::new(CountingEngine::new(0));
        let adapter = ModelAdapter::embedded(engine.clone());

        adapter.ensure_loaded().await.unwrap();
        adapter.ensure_loaded().await.unwrap();
        adapter.ensure_loaded().await.unwrap();
        assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detect_single_face_picks_best_above_threshold() {
        let adapter = ModelAdapter::embedded(Arc::new(CountingEngine::new(0)));
        let frame = Frame::synthetic(crate::types::Emotion::Happy, 100, 100);

        let best = adapter.detect_single_face(&frame).await.unwrap().unwrap();
        assert!((best.score - 0.9).abs() < 1e-10);
    }
}
