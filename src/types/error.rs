//! Error taxonomy for the verification core
//!
//! Per-frame problems are absorbed at the verifier boundary; only setup-level
//! failures (model never loads, camera never acquired) reach the caller.

use thiserror::Error;

/// Model pipeline failures.
/// Cloneable so a shared in-flight load can hand the same failure to every
/// concurrent waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Model assets could not be fetched from their source
    #[error("model asset fetch failed: {0}")]
    Fetch(String),

    /// Fetched assets could not be parsed or loaded into the engine
    #[error("model load failed: {0}")]
    Load(String),

    /// Inference failed on a frame
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Camera/stream failures
#[derive(Debug, Error)]
pub enum CameraError {
    /// Hardware or permission failure acquiring the stream
    #[error("camera acquisition failed: {0}")]
    Acquisition(String),

    /// The stream was closed while a consumer was still reading
    #[error("camera stream closed")]
    StreamClosed,
}
