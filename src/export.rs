//! SVG snapshots of a field
//!
//! [`SvgRenderer`] draws each frame the way the Canvas 2D backend does:
//! transparent background, links underneath, particles as filled circles.
//! Volume fields are projected through the field camera first.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use driftfield::render::link_alpha;
use driftfield::{
    AnimationLoop, FieldConfig, FrameView, ManualScheduler, ParticleField, Renderer, Viewport,
    css_rgba,
};

use crate::simulate::FRAME_INTERVAL;

/// Renderer keeping the latest frame as an SVG document
#[derive(Debug, Default)]
pub struct SvgRenderer {
    svg: String,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// SVG of the last drawn frame; empty before the first draw
    pub fn svg(&self) -> &str {
        &self.svg
    }
}

impl Renderer for SvgRenderer {
    fn resize(&mut self, _viewport: &Viewport) {}

    fn draw(&mut self, frame: &FrameView<'_>) {
        self.svg = render_svg(frame);
    }

    fn release(&mut self) {}
}

/// Screen position and radius of a particle, in logical pixels
fn screen_circle(frame: &FrameView<'_>, index: usize) -> Option<(f32, f32, f32)> {
    let particle = &frame.particles[index];
    let viewport = frame.viewport;
    if !frame.config.is_volume() {
        return Some((particle.position[0], particle.position[1], particle.size));
    }

    let [nx, ny] = frame.camera.project(particle.position)?;
    let diameter = frame.camera.projected_size(
        particle.size * frame.config.point_scale,
        particle.position,
        viewport.height,
    );
    Some((
        (nx + 1.0) / 2.0 * viewport.width,
        (1.0 - ny) / 2.0 * viewport.height,
        diameter / 2.0,
    ))
}

/// Render one frame as a standalone SVG document
pub fn render_svg(frame: &FrameView<'_>) -> String {
    let config = frame.config;
    let (width, height) = (frame.viewport.width, frame.viewport.height);
    let mut svg = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" class="{}">"#,
        config.class_name
    );

    let _ = writeln!(svg, r#"  <g stroke-width="{}">"#, config.link_width);
    for edge in frame.edges {
        let (Some((x1, y1, _)), Some((x2, y2, _))) =
            (screen_circle(frame, edge.a), screen_circle(frame, edge.b))
        else {
            continue;
        };
        let _ = writeln!(
            svg,
            r#"    <line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}"/>"#,
            css_rgba(config.link_color, link_alpha(config, edge.opacity))
        );
    }
    svg.push_str("  </g>\n  <g>\n");

    for (i, particle) in frame.particles.iter().enumerate() {
        let Some((cx, cy, r)) = screen_circle(frame, i) else {
            continue;
        };
        let _ = writeln!(
            svg,
            r#"    <circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{}"/>"#,
            css_rgba(particle.color, particle.opacity)
        );
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

/// Run `frames` frames headless and return the last one as SVG
pub fn snapshot(
    config: FieldConfig,
    viewport: Viewport,
    frames: u64,
    entropy: u64,
) -> driftfield::FieldResult<String> {
    let field = ParticleField::new(config, viewport, entropy)?;
    snapshot_field(field, frames)
}

/// Run an already built field for `frames` frames (at least one)
pub fn snapshot_field(field: ParticleField, frames: u64) -> driftfield::FieldResult<String> {
    let mut anim = AnimationLoop::new(field, SvgRenderer::new(), ManualScheduler::new());
    anim.start()?;
    for frame in 0..frames.max(1) {
        anim.on_frame(frame as f64 * FRAME_INTERVAL);
    }
    let svg = anim.renderer().svg().to_string();
    anim.teardown();
    Ok(svg)
}

/// Write a snapshot to `output`, creating parent directories
pub fn write_snapshot(svg: &str, output: &Path) -> anyhow::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, svg)?;
    Ok(())
}
