//! Core types for MoodFi

mod detection;
mod emotion;
mod error;
mod frame;
mod history;
mod session;
mod verification;

pub use detection::{FaceBox, FaceLandmarks, Point, QualityFlags, RawDetection};
pub use emotion::{Emotion, EmotionScores};
pub use error::{CameraError, ModelError};
pub use frame::{Frame, NO_FACE_TAG};
pub use history::{DetectionHistory, DetectionRecord};
pub use session::{LoopPhase, TrainingPhase, TrainingStatus};
pub use verification::{VerificationResult, VibeCheck};
