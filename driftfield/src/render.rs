//! Renderer interface shared by every backend
//!
//! A renderer only reads the frame it is handed; simulation state is never
//! mutated from here.

use crate::camera::Camera;
use crate::config::FieldConfig;
use crate::connections::Edge;
use crate::particle::Particle;
use crate::viewport::Viewport;

/// Read-only view of one completed frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub particles: &'a [Particle],
    pub edges: &'a [Edge],
    pub viewport: &'a Viewport,
    pub camera: &'a Camera,
    pub config: &'a FieldConfig,
    /// Frames completed so far, this one included
    pub frame: u64,
}

/// A drawing backend
pub trait Renderer {
    /// Resize the drawing surface to the viewport's backing buffer
    fn resize(&mut self, viewport: &Viewport);

    /// Upload data that never changes after spawn (styles, sizes)
    fn upload_static(&mut self, _particles: &[Particle]) {}

    /// Draw a frame onto a transparent surface
    fn draw(&mut self, frame: &FrameView<'_>);

    /// Release the surface and any GPU resources. Called once.
    fn release(&mut self);
}

/// CSS `rgba()` color string
pub fn css_rgba(color: [u8; 3], alpha: f32) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        color[0],
        color[1],
        color[2],
        alpha.clamp(0.0, 1.0)
    )
}

/// Stroke alpha for a link of the given opacity
pub fn link_alpha(config: &FieldConfig, opacity: f32) -> f32 {
    config.link_alpha * opacity
}
