//! Perspective camera for the volume (WebGPU) backend
//!
//! The camera sits on the +z axis looking at the origin with y up. Pointer
//! input is unprojected onto the `z = 0` plane so repulsion works in scene
//! units, and point sprites shrink with depth.

use crate::config::FieldConfig;
use crate::viewport::Viewport;

/// Fixed look-at-origin perspective camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Distance from the origin along +z
    pub distance: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(distance: f32, fov_degrees: f32, aspect: f32) -> Self {
        Self {
            distance,
            fov: fov_degrees.to_radians(),
            aspect,
            near: 0.1,
            far: distance * 4.0,
        }
    }

    pub fn from_config(config: &FieldConfig, viewport: &Viewport) -> Self {
        Self::new(config.camera_distance, config.camera_fov, viewport.aspect())
    }

    /// Track the viewport aspect ratio
    pub fn resize(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect();
    }

    /// Projection y-scale, `1 / tan(fov / 2)`
    pub fn focal(&self) -> f32 {
        1.0 / (self.fov / 2.0).tan()
    }

    pub fn eye(&self) -> [f32; 3] {
        [0.0, 0.0, self.distance]
    }

    /// View matrix (4x4 column-major)
    pub fn view_matrix(&self) -> [f32; 16] {
        look_at(self.eye(), [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    }

    /// Projection matrix (4x4 column-major)
    pub fn projection_matrix(&self) -> [f32; 16] {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> [f32; 16] {
        mat4_multiply(self.projection_matrix(), self.view_matrix())
    }

    /// Project a scene point to normalized device coordinates.
    /// Returns `None` for points at or behind the eye.
    pub fn project(&self, point: [f32; 3]) -> Option<[f32; 2]> {
        let [x, y, _, w] = transform(self.view_projection_matrix(), point);
        if w <= 0.0 {
            return None;
        }
        Some([x / w, y / w])
    }

    /// Intersect the ray through `ndc` with the `z = 0` plane
    pub fn unproject_to_plane(&self, ndc: [f32; 2]) -> [f32; 2] {
        let half_height = (self.fov / 2.0).tan() * self.distance;
        [ndc[0] * half_height * self.aspect, ndc[1] * half_height]
    }

    /// On-screen diameter in logical pixels of a sprite with `world_size`
    /// diameter at `point`, for a viewport `viewport_height` pixels tall
    pub fn projected_size(&self, world_size: f32, point: [f32; 3], viewport_height: f32) -> f32 {
        let w = self.distance - point[2];
        if w <= 0.0 {
            return 0.0;
        }
        world_size * self.focal() / w * viewport_height / 2.0
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [f32; 16] {
    let f = normalize(sub(target, eye));
    let s = normalize(cross(f, up));
    let u = cross(s, f);

    #[rustfmt::skip]
    let m = [
        s[0], u[0], -f[0], 0.0,
        s[1], u[1], -f[1], 0.0,
        s[2], u[2], -f[2], 0.0,
        -dot(s, eye), -dot(u, eye), dot(f, eye), 1.0,
    ];
    m
}

/// Right-handed perspective with depth mapped to `[0, 1]` (WebGPU clip space)
fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> [f32; 16] {
    let f = 1.0 / (fov / 2.0).tan();
    let range = 1.0 / (near - far);

    #[rustfmt::skip]
    let m = [
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, far * range, -1.0,
        0.0, 0.0, far * near * range, 0.0,
    ];
    m
}

fn mat4_multiply(a: [f32; 16], b: [f32; 16]) -> [f32; 16] {
    let mut result = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            result[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    result
}

fn transform(m: [f32; 16], p: [f32; 3]) -> [f32; 4] {
    let v = [p[0], p[1], p[2], 1.0];
    let mut out = [0.0f32; 4];
    for (row, slot) in out.iter_mut().enumerate() {
        *slot = (0..4).map(|k| m[k * 4 + row] * v[k]).sum();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(12.0, 60.0, 16.0 / 9.0)
    }

    #[test]
    fn origin_projects_to_center() {
        let ndc = camera().project([0.0, 0.0, 0.0]).unwrap();
        assert!(ndc[0].abs() < 1e-6 && ndc[1].abs() < 1e-6);
    }

    #[test]
    fn unproject_inverts_project_on_the_plane() {
        let cam = camera();
        for ndc in [[0.5, -0.25], [-1.0, 1.0], [0.9, 0.9]] {
            let [x, y] = cam.unproject_to_plane(ndc);
            let back = cam.project([x, y, 0.0]).unwrap();
            assert!((back[0] - ndc[0]).abs() < 1e-4, "{back:?} vs {ndc:?}");
            assert!((back[1] - ndc[1]).abs() < 1e-4, "{back:?} vs {ndc:?}");
        }
    }

    #[test]
    fn points_behind_the_eye_do_not_project() {
        assert!(camera().project([0.0, 0.0, 13.0]).is_none());
    }

    #[test]
    fn sprite_size_shrinks_with_depth() {
        let cam = camera();
        let near = cam.projected_size(0.1, [0.0, 0.0, 4.0], 600.0);
        let mid = cam.projected_size(0.1, [0.0, 0.0, 0.0], 600.0);
        let far = cam.projected_size(0.1, [0.0, 0.0, -4.0], 600.0);
        assert!(near > mid && mid > far);
        // Inverse proportionality: depth 8 vs 16 from the eye
        assert!((near / far - 2.0).abs() < 1e-4);
    }

    #[test]
    fn resize_tracks_aspect() {
        let mut cam = camera();
        cam.resize(&Viewport::new(400.0, 400.0, 2.0));
        assert_eq!(cam.aspect, 1.0);
    }

    #[test]
    fn from_config_uses_degrees() {
        let cam = Camera::from_config(&FieldConfig::webgpu(), &Viewport::new(800.0, 400.0, 1.0));
        assert!((cam.fov - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert_eq!(cam.aspect, 2.0);
        assert_eq!(cam.distance, 12.0);
    }
}
