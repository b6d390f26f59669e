//! Viewport state: logical size, device pixel ratio and backing buffer
//!
//! All physics and drawing happen in logical (CSS) pixels. The backing
//! buffer is `floor(logical * dpr)` device pixels and the draw transform
//! scales by `dpr` to bridge the two.

use serde::Serialize;

/// Smallest logical extent a viewport can have on either axis
pub const MIN_EXTENT: f32 = 1.0;

/// Logical viewport and derived backing-buffer size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Logical width in CSS pixels
    pub width: f32,
    /// Logical height in CSS pixels
    pub height: f32,
    /// Device pixel ratio
    pub dpr: f32,
    /// Backing buffer width in device pixels
    pub backing_width: u32,
    /// Backing buffer height in device pixels
    pub backing_height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MIN_EXTENT, MIN_EXTENT, 1.0)
    }
}

impl Viewport {
    /// Create a viewport; degenerate input is clamped as in [`Viewport::resize`]
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        let mut viewport = Self {
            width: MIN_EXTENT,
            height: MIN_EXTENT,
            dpr: 1.0,
            backing_width: 1,
            backing_height: 1,
        };
        viewport.resize(width, height, dpr);
        viewport
    }

    /// Recompute for a new logical size and pixel ratio.
    ///
    /// Zero-area (or non-finite) sizes clamp to 1x1 and a non-positive ratio
    /// falls back to 1.0. Returns whether the backing buffer changed size.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> bool {
        let previous = (self.backing_width, self.backing_height);

        self.width = clamp_extent(width);
        self.height = clamp_extent(height);
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.backing_width = backing_extent(self.width, self.dpr);
        self.backing_height = backing_extent(self.height, self.dpr);

        previous != (self.backing_width, self.backing_height)
    }

    /// Width over height, never zero or infinite
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// 2D affine transform `[a, b, c, d, e, f]` mapping logical pixels onto
    /// the backing buffer (the `setTransform` argument order)
    pub fn transform(&self) -> [f64; 6] {
        let s = self.dpr as f64;
        [s, 0.0, 0.0, s, 0.0, 0.0]
    }

    /// Convert a logical point to normalized device coordinates (y up)
    pub fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        [x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0]
    }
}

fn clamp_extent(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_EXTENT)
    } else {
        MIN_EXTENT
    }
}

fn backing_extent(logical: f32, dpr: f32) -> u32 {
    ((logical * dpr).floor() as u32).max(1)
}
