use crate::error::{GestureError, Result};
use crate::frame::types::RawFrame;
use std::collections::VecDeque;

/// Camera frame provider.
///
/// Capture hardware is out of scope; this trait is the boundary the intake
/// thread polls. Implementations may produce frames faster than the
/// classifier consumes them; the pipeline applies backpressure itself.
pub trait FrameSource: Send {
    /// Start delivering frames.
    fn start(&mut self) -> Result<()>;

    /// Stop delivering frames.
    fn stop(&mut self) -> Result<()>;

    /// Next frame, or `None` when no frame is ready (live) or the source
    /// is exhausted (finite).
    fn read_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Returns true for sources that end (files, scripts, tests).
    ///
    /// A finite source returning `None` ends intake; a live one is polled again.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Emits a fixed number of uniform frames. Used by replay mode, where the
/// classifier is scripted and pixel content is irrelevant.
#[derive(Debug, Clone)]
pub struct SyntheticFrameSource {
    template: RawFrame,
    remaining: Option<u64>,
    started: bool,
}

impl SyntheticFrameSource {
    /// `count = None` produces frames forever.
    pub fn new(width: u32, height: u32, count: Option<u64>) -> Self {
        Self {
            template: RawFrame::solid_yuv(width, height, 16, 128, 128),
            remaining: count,
            started: false,
        }
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.template.rotation_degrees = degrees;
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if !self.started {
            return Err(GestureError::FrameSource {
                message: "source not started".to_string(),
            });
        }
        match self.remaining.as_mut() {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.template.clone()))
            }
            None => Ok(Some(self.template.clone())),
        }
    }

    fn is_finite(&self) -> bool {
        self.remaining.is_some()
    }
}

/// Mock frame source for testing: replays a fixed list of frames once.
#[derive(Debug, Clone, Default)]
pub struct MockFrameSource {
    frames: VecDeque<RawFrame>,
    should_fail_start: bool,
    started: bool,
}

impl MockFrameSource {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self {
            frames: frames.into(),
            should_fail_start: false,
            started: false,
        }
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MockFrameSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(GestureError::FrameSource {
                message: "mock camera unavailable".to_string(),
            });
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        Ok(self.frames.pop_front())
    }

    fn is_finite(&self) -> bool {
        true
    }
}
