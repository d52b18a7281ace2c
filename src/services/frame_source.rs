// src/services/frame_source.rs
// DOCUMENTATION: Decoded frame stream abstraction
// PURPOSE: Decouple the analyzer from how frames are produced

use crate::errors::DashboardError;
use image::GrayImage;
use std::collections::VecDeque;

/// A single decoded video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in decode order, starting at 0
    pub index: usize,
    /// Presentation timestamp in milliseconds
    pub timestamp_ms: f64,
    /// 8-bit luma plane
    pub luma: GrayImage,
}

/// Sequential source of frames
/// DOCUMENTATION: `Ok(None)` marks the end of the stream
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, DashboardError>;
}

/// In-memory frame source
/// DOCUMENTATION: Replays pre-built frames; used for tests and offline replays
pub struct VecFrameSource {
    frames: VecDeque<Frame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// Build a source from timestamps and luma planes, indexing frames in order
    pub fn from_parts(parts: Vec<(f64, GrayImage)>) -> Self {
        let frames = parts
            .into_iter()
            .enumerate()
            .map(|(index, (timestamp_ms, luma))| Frame {
                index,
                timestamp_ms,
                luma,
            })
            .collect();
        Self::new(frames)
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, DashboardError> {
        Ok(self.frames.pop_front())
    }
}
