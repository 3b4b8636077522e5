//! Frame: the unit of analysis handed to the detection engine
//!
//! A frame may come from a still image, a live camera, or a canvas capture;
//! the engine sees the same structure either way.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::types::Emotion;

/// Tag byte marking a synthetic frame with no face in the scene
pub const NO_FACE_TAG: u8 = 0xFF;

/// A single captured frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel payload (zero-copy on clone)
    pub data: Bytes,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// Create a frame from an existing payload
    pub fn new(data: Bytes, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Utc::now(),
        }
    }

    /// Create a frame from a plain byte vector
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(Bytes::from(data), width, height)
    }

    /// Synthetic frame staging the given emotion in the scene.
    /// The leading tag byte carries the staged emotion index; simulated
    /// engines decode it in place of real inference.
    pub fn synthetic(staged: Emotion, width: u32, height: u32) -> Self {
        let tag = Emotion::ALL
            .iter()
            .position(|&e| e == staged)
            .unwrap_or(0) as u8;
        let mut data = vec![0u8; (width * height) as usize];
        if !data.is_empty() {
            data[0] = tag;
        }
        Self::from_vec(data, width, height)
    }

    /// Synthetic frame with no face in the scene
    pub fn synthetic_empty(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; (width * height) as usize];
        if !data.is_empty() {
            data[0] = NO_FACE_TAG;
        }
        Self::from_vec(data, width, height)
    }

    /// Staged emotion encoded in a synthetic frame, if any
    pub fn staged_emotion(&self) -> Option<Emotion> {
        let tag = *self.data.first()?;
        if tag == NO_FACE_TAG {
            return None;
        }
        Emotion::ALL.get(tag as usize).copied()
    }

    /// Frame area in pixels
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_round_trip() {
        let frame = Frame::synthetic(Emotion::Surprised, 64, 48);
        assert_eq!(frame.staged_emotion(), Some(Emotion::Surprised));
        assert_eq!(frame.width, 64);
        assert!((frame.area() - 64.0 * 48.0).abs() < 1e-10);
    }

    #[test]
    fn test_synthetic_empty_has_no_staged_emotion() {
        let frame = Frame::synthetic_empty(64, 48);
        assert_eq!(frame.staged_emotion(), None);
    }

    #[test]
    fn test_clone_shares_payload() {
        let frame = Frame::synthetic(Emotion::Happy, 32, 32);
        let copy = frame.clone();
        assert_eq!(frame.data, copy.data);
    }
}
