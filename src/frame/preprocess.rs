//! Frame normalization: decode, rotate upright, scale to the classifier size.
//!
//! Stateless. Every frame is validated against its declared geometry before
//! any pixel is touched; inconsistent frames fail with `MalformedFrame` and
//! are dropped by the caller.

use crate::defaults;
use crate::error::{GestureError, Result};
use crate::frame::types::{PixelData, PreparedImage, RawFrame, Rotation};

/// Converts raw camera frames into classifier-ready RGB images.
#[derive(Debug, Clone, Copy)]
pub struct FramePreprocessor {
    target_size: u32,
}

impl Default for FramePreprocessor {
    fn default() -> Self {
        Self::new(defaults::TARGET_SIZE)
    }
}

impl FramePreprocessor {
    /// `target_size` is the length the larger upright dimension is scaled to.
    pub fn new(target_size: u32) -> Self {
        Self {
            target_size: target_size.max(1),
        }
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Output dimensions for an upright image of `width x height`.
    ///
    /// The larger side maps to the target size; the other keeps the aspect
    /// ratio, rounded, never below one pixel.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let long = width.max(height).max(1) as u64;
        let scale = |side: u32| -> u32 {
            let scaled = (side as u64 * self.target_size as u64 + long / 2) / long;
            scaled.max(1) as u32
        };
        if width >= height {
            (self.target_size, scale(height))
        } else {
            (scale(width), self.target_size)
        }
    }

    /// Normalizes one frame.
    pub fn prepare(&self, frame: &RawFrame) -> Result<PreparedImage> {
        if frame.width == 0 || frame.height == 0 {
            return Err(GestureError::malformed(format!(
                "empty geometry {}x{}",
                frame.width, frame.height
            )));
        }
        let rotation = Rotation::from_degrees(frame.rotation_degrees)?;
        let (w, h) = (frame.width as usize, frame.height as usize);

        let rgb = decode_rgb(&frame.pixels, w, h)?;
        let (rotated, rw, rh) = rotate_rgb(&rgb, w, h, rotation);

        let (tw, th) = self.target_dimensions(rw as u32, rh as u32);
        let scaled = resize_bilinear(&rotated, rw, rh, tw as usize, th as usize);

        Ok(PreparedImage {
            width: tw,
            height: th,
            rgb: scaled,
        })
    }
}

/// Decodes the native pixel layout into packed RGB at full resolution.
fn decode_rgb(pixels: &PixelData, w: usize, h: usize) -> Result<Vec<u8>> {
    match pixels {
        PixelData::Rgb8 { data } => {
            let expected = rgb_len(w, h)?;
            if data.len() != expected {
                return Err(GestureError::malformed(format!(
                    "rgb buffer holds {} bytes, expected {expected}",
                    data.len()
                )));
            }
            Ok(data.clone())
        }
        PixelData::Yuv420 {
            y,
            u,
            v,
            y_stride,
            uv_stride,
        } => {
            let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
            check_plane("y", y.len(), *y_stride, w, h)?;
            check_plane("u", u.len(), *uv_stride, cw, ch)?;
            check_plane("v", v.len(), *uv_stride, cw, ch)?;

            let mut rgb = Vec::with_capacity(rgb_len(w, h)?);
            for row in 0..h {
                let y_row = row * y_stride;
                let c_row = (row / 2) * uv_stride;
                for col in 0..w {
                    let luma = y[y_row + col];
                    let c = c_row + col / 2;
                    rgb.extend_from_slice(&yuv_to_rgb(luma, u[c], v[c]));
                }
            }
            Ok(rgb)
        }
    }
}

/// Byte length of a packed RGB buffer, or `MalformedFrame` on overflow.
fn rgb_len(w: usize, h: usize) -> Result<usize> {
    w.checked_mul(h)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| GestureError::malformed(format!("geometry {w}x{h} overflows")))
}

/// Verifies a plane can hold `rows` rows of `row_len` bytes at `stride`.
///
/// Once this passes, every `row * stride + col` index into the plane is in
/// bounds and cannot overflow.
fn check_plane(name: &str, len: usize, stride: usize, row_len: usize, rows: usize) -> Result<()> {
    if stride < row_len {
        return Err(GestureError::malformed(format!(
            "{name} stride {stride} is shorter than row width {row_len}"
        )));
    }
    let needed = stride
        .checked_mul(rows.saturating_sub(1))
        .and_then(|n| n.checked_add(row_len))
        .ok_or_else(|| {
            GestureError::malformed(format!(
                "{name} plane geometry overflows ({rows} rows at stride {stride})"
            ))
        })?;
    if len < needed {
        return Err(GestureError::malformed(format!(
            "{name} plane holds {len} bytes, expected at least {needed}"
        )));
    }
    Ok(())
}

/// BT.601 full-range conversion (the JPEG/NV21 convention).
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    [
        clamp(y + 1.402 * v),
        clamp(y - 0.344_136 * u - 0.714_136 * v),
        clamp(y + 1.772 * u),
    ]
}

/// Rotates packed RGB clockwise; returns the buffer and its new dimensions.
fn rotate_rgb(src: &[u8], w: usize, h: usize, rotation: Rotation) -> (Vec<u8>, usize, usize) {
    if rotation == Rotation::Deg0 {
        return (src.to_vec(), w, h);
    }
    let (rw, rh) = if rotation.is_transposed() { (h, w) } else { (w, h) };
    let mut out = vec![0u8; w * h * 3];

    for ry in 0..rh {
        for rx in 0..rw {
            let (sx, sy) = match rotation {
                Rotation::Deg90 => (ry, h - 1 - rx),
                Rotation::Deg180 => (w - 1 - rx, h - 1 - ry),
                Rotation::Deg270 => (w - 1 - ry, rx),
                Rotation::Deg0 => (rx, ry),
            };
            let s = (sy * w + sx) * 3;
            let d = (ry * rw + rx) * 3;
            out[d..d + 3].copy_from_slice(&src[s..s + 3]);
        }
    }
    (out, rw, rh)
}

/// Bilinear resample of packed RGB using pixel-center alignment.
fn resize_bilinear(src: &[u8], sw: usize, sh: usize, dw: usize, dh: usize) -> Vec<u8> {
    if sw == dw && sh == dh {
        return src.to_vec();
    }
    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;
    let mut out = Vec::with_capacity(dw * dh * 3);

    for dy in 0..dh {
        let fy = ((dy as f32 + 0.5) * y_ratio - 0.5).clamp(0.0, (sh - 1) as f32);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(sh - 1);
        let wy = fy - y0 as f32;

        for dx in 0..dw {
            let fx = ((dx as f32 + 0.5) * x_ratio - 0.5).clamp(0.0, (sw - 1) as f32);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(sw - 1);
            let wx = fx - x0 as f32;

            for c in 0..3 {
                let p = |x: usize, y: usize| src[(y * sw + x) * 3 + c] as f32;
                let top = p(x0, y0) * (1.0 - wx) + p(x1, y0) * wx;
                let bottom = p(x0, y1) * (1.0 - wx) + p(x1, y1) * wx;
                let value = top * (1.0 - wy) + bottom * wy;
                out.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    out
}
