//! GPU buffer layouts and CPU-side staging
//!
//! These types are uploaded directly into vertex and uniform buffers. Styles
//! are staged once; positions and line vertices are restaged every frame
//! into reused vectors.

use bytemuck::{Pod, Zeroable};

use crate::camera::Camera;
use crate::config::FieldConfig;
use crate::connections::Edge;
use crate::particle::Particle;
use crate::viewport::Viewport;

/// Per-particle style, uploaded once at start
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointStyle {
    /// Straight (non-premultiplied) RGBA
    pub color: [f32; 4],
    /// Sprite diameter in scene units
    pub size: f32,
    pub _padding: [f32; 3],
}

/// Per-particle position, uploaded every frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointPosition {
    pub position: [f32; 3],
}

/// One end of a link
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub opacity: f32,
}

/// Shared uniforms for both passes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [f32; 16],
    /// Link RGB with `link_alpha` in the last lane
    pub link_color: [f32; 4],
    /// Logical viewport size
    pub viewport: [f32; 2],
    /// Projection y-scale, `1 / tan(fov / 2)`
    pub focal: f32,
    pub _padding: f32,
}

impl SceneUniforms {
    pub fn new(camera: &Camera, viewport: &Viewport, config: &FieldConfig) -> Self {
        Self {
            view_proj: camera.view_projection_matrix(),
            link_color: rgba(config.link_color, config.link_alpha),
            viewport: [viewport.width, viewport.height],
            focal: camera.focal(),
            _padding: 0.0,
        }
    }
}

/// `[u8; 3]` color plus alpha as normalized floats
pub fn rgba(color: [u8; 3], alpha: f32) -> [f32; 4] {
    [
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        alpha,
    ]
}

/// Stage the static per-particle styles
pub fn point_styles(particles: &[Particle], point_scale: f32) -> Vec<PointStyle> {
    particles
        .iter()
        .map(|p| PointStyle {
            color: rgba(p.color, p.opacity),
            size: p.size * point_scale,
            _padding: [0.0; 3],
        })
        .collect()
}

/// Restage positions into `out`, reusing its allocation
pub fn write_point_positions(particles: &[Particle], out: &mut Vec<PointPosition>) {
    out.clear();
    out.extend(particles.iter().map(|p| PointPosition {
        position: p.position,
    }));
}

/// Restage line endpoints for at most `max_edges` edges.
///
/// Returns the vertex count to draw; edges past the cap are skipped.
pub fn write_line_vertices(
    particles: &[Particle],
    edges: &[Edge],
    max_edges: usize,
    out: &mut Vec<LineVertex>,
) -> u32 {
    out.clear();
    for edge in edges.iter().take(max_edges) {
        let (a, b) = (&particles[edge.a], &particles[edge.b]);
        out.push(LineVertex {
            position: a.position,
            opacity: edge.opacity,
        });
        out.push(LineVertex {
            position: b.position,
            opacity: edge.opacity,
        });
    }
    out.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles() -> Vec<Particle> {
        let mut a = Particle::at([0.0, 1.0, 2.0]);
        a.color = [255, 0, 51];
        a.opacity = 0.5;
        a.size = 2.0;
        vec![a, Particle::at([3.0, 4.0, 5.0]), Particle::at([6.0, 7.0, 8.0])]
    }

    fn edge(a: usize, b: usize, opacity: f32) -> Edge {
        Edge {
            a,
            b,
            distance: 1.0,
            opacity,
        }
    }

    #[test]
    fn layouts_match_shader_strides() {
        assert_eq!(std::mem::size_of::<PointStyle>(), 32);
        assert_eq!(std::mem::size_of::<PointPosition>(), 12);
        assert_eq!(std::mem::size_of::<LineVertex>(), 16);
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 96);
    }

    #[test]
    fn styles_carry_color_opacity_and_scaled_size() {
        let styles = point_styles(&particles(), 0.05);
        assert_eq!(styles.len(), 3);
        assert_eq!(styles[0].color, [1.0, 0.0, 0.2, 0.5]);
        assert!((styles[0].size - 0.1).abs() < 1e-6);
    }

    #[test]
    fn positions_reuse_the_buffer() {
        let mut out = Vec::with_capacity(3);
        let ptr = out.as_ptr();
        write_point_positions(&particles(), &mut out);
        write_point_positions(&particles(), &mut out);
        assert_eq!(out.len(), 3);
        assert_eq!(out.as_ptr(), ptr);
        assert_eq!(out[1].position, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn line_vertices_pair_endpoints_with_opacity() {
        let mut out = Vec::new();
        let count = write_line_vertices(
            &particles(),
            &[edge(0, 2, 0.25), edge(1, 2, 0.75)],
            16,
            &mut out,
        );
        assert_eq!(count, 4);
        assert_eq!(out[0].position, [0.0, 1.0, 2.0]);
        assert_eq!(out[1].position, [6.0, 7.0, 8.0]);
        assert_eq!(out[3].opacity, 0.75);
    }

    #[test]
    fn line_vertices_respect_the_cap() {
        let mut out = Vec::new();
        let edges = [edge(0, 1, 1.0), edge(0, 2, 1.0), edge(1, 2, 1.0)];
        let count = write_line_vertices(&particles(), &edges, 2, &mut out);
        assert_eq!(count, 4);
    }

    #[test]
    fn uniforms_pack_link_color() {
        let config = FieldConfig::webgpu();
        let viewport = Viewport::new(640.0, 480.0, 2.0);
        let camera = Camera::from_config(&config, &viewport);
        let uniforms = SceneUniforms::new(&camera, &viewport, &config);
        assert_eq!(uniforms.viewport, [640.0, 480.0]);
        assert_eq!(uniforms.link_color[3], 0.25);
        assert_eq!(uniforms.view_proj, camera.view_projection_matrix());
        assert_eq!(uniforms.focal, uniforms.view_proj[5]);
    }
}
