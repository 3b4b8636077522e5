//! Core modules for MoodFi

pub mod adapter;
pub mod api;
pub mod camera;
pub mod mock;
pub mod reward;
pub mod session;
pub mod training;
pub mod verifier;

pub use adapter::{FaceEngine, ModelAdapter, ModelAssets, ModelSource};
pub use api::{create_router, create_router_with_stack, run_server};
pub use camera::{CameraStream, FrameSource, MediaTrack, Scene, SyntheticCamera};
pub use mock::{MockDetector, SimulatedEngine};
pub use reward::{compute_reward, reward_for};
pub use session::TrainingSession;
pub use training::{
    ControllerEvent, DetectionLoop, FrameScheduler, LoopEvent, TickScheduler, TrainingController,
};
pub use verifier::{Detector, DetectorStack, FaceVerifier};
