//! Frame data types: what the camera delivers and what the classifier receives.

use crate::error::{GestureError, Result};
use std::time::Instant;

/// Clockwise rotation needed to bring a frame upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parses a rotation hint in degrees. Negative and >= 360 values wrap.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(GestureError::malformed(format!(
                "rotation hint {other}° is not a multiple of 90"
            ))),
        }
    }

    /// True when the rotation swaps width and height.
    pub fn is_transposed(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Native pixel layout of a captured frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// Planar YUV 4:2:0 (I420). Chroma planes cover `ceil(w/2) x ceil(h/2)`.
    Yuv420 {
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
        y_stride: usize,
        uv_stride: usize,
    },
    /// Packed 8-bit RGB, 3 bytes per pixel, no row padding.
    Rgb8 { data: Vec<u8> },
}

/// A frame exactly as the camera delivered it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Rotation hint in degrees (clockwise).
    pub rotation_degrees: i32,
    pub pixels: PixelData,
}

impl RawFrame {
    /// Creates a tightly packed I420 frame.
    pub fn yuv420(width: u32, height: u32, y: Vec<u8>, u: Vec<u8>, v: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rotation_degrees: 0,
            pixels: PixelData::Yuv420 {
                y,
                u,
                v,
                y_stride: width as usize,
                uv_stride: (width as usize).div_ceil(2),
            },
        }
    }

    /// Creates a packed RGB frame.
    pub fn rgb8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rotation_degrees: 0,
            pixels: PixelData::Rgb8 { data },
        }
    }

    /// Creates a uniformly colored I420 frame (handy for synthetic sources).
    pub fn solid_yuv(width: u32, height: u32, luma: u8, u: u8, v: u8) -> Self {
        let (w, h) = (width as usize, height as usize);
        let chroma = w.div_ceil(2) * h.div_ceil(2);
        Self::yuv420(width, height, vec![luma; w * h], vec![u; chroma], vec![v; chroma])
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }
}

/// A raw frame stamped by the intake thread.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: RawFrame,
    /// Monotonic capture time; becomes the observation timestamp.
    pub timestamp: Instant,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
}

impl CapturedFrame {
    pub fn new(frame: RawFrame, timestamp: Instant, sequence: u64) -> Self {
        Self {
            frame,
            timestamp,
            sequence,
        }
    }
}

/// Upright, scaled RGB image in the layout the classifier expects.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Packed RGB, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

impl PreparedImage {
    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.rgb
            .get(offset..offset + 3)
            .map(|p| [p[0], p[1], p[2]])
    }
}
