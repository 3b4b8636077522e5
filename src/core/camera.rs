//! Scoped camera resource and frame sources
//!
//! The stream owns its hardware tracks; every exit path (explicit close,
//! drop, error) stops them. One consumer reads frames at a time.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::types::{CameraError, Emotion, Frame};

/// A stoppable hardware track handle
#[derive(Debug, Clone)]
pub struct MediaTrack {
    label: String,
    active: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!(track = %self.label, "track stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// An acquired camera stream owning its tracks
#[derive(Debug)]
pub struct CameraStream {
    tracks: Vec<MediaTrack>,
    closed: bool,
}

impl CameraStream {
    /// Acquire a stream. `available` models the hardware/permission gate;
    /// refusal is a `CameraError::Acquisition`.
    pub fn acquire(available: bool) -> Result<Self, CameraError> {
        if !available {
            return Err(CameraError::Acquisition(
                "camera unavailable or permission denied".into(),
            ));
        }
        Ok(Self {
            tracks: vec![MediaTrack::new("video0")],
            closed: false,
        })
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Stop every track. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.closed {
            for track in &self.tracks {
                track.stop();
            }
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Anything the detection loop can pull frames from
pub trait FrameSource: Send {
    fn grab(&mut self) -> Result<Frame, CameraError>;
}

/// Handle for staging what the synthetic camera currently "sees".
/// Cloneable so a driver (CLI input, API request) can change the scene
/// while the detection loop reads frames.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    staged: Arc<RwLock<Option<Emotion>>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an emotion in front of the camera
    pub fn show(&self, emotion: Emotion) {
        *self.staged.write() = Some(emotion);
    }

    /// Empty the scene (no face)
    pub fn clear(&self) {
        *self.staged.write() = None;
    }

    pub fn current(&self) -> Option<Emotion> {
        *self.staged.read()
    }
}

/// Simulated webcam over a shared staged scene
pub struct SyntheticCamera {
    scene: Scene,
    stream: CameraStream,
    width: u32,
    height: u32,
}

impl SyntheticCamera {
    pub fn open(scene: Scene) -> Result<Self, CameraError> {
        Ok(Self {
            scene,
            stream: CameraStream::acquire(true)?,
            width: 640,
            height: 480,
        })
    }

    pub fn stream(&self) -> &CameraStream {
        &self.stream
    }

    pub fn close(&mut self) {
        self.stream.close();
    }
}

impl FrameSource for SyntheticCamera {
    fn grab(&mut self) -> Result<Frame, CameraError> {
        if self.stream.is_closed() {
            return Err(CameraError::StreamClosed);
        }
        Ok(match self.scene.current() {
            Some(emotion) => Frame::synthetic(emotion, self.width, self.height),
            None => Frame::synthetic_empty(self.width, self.height),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
