//! Particle records and the fixed-size store that owns them
//!
//! Particles are created once, addressed by index, and never added or
//! removed. Plane-mode particles keep `z = 0` throughout.

use rand::Rng;

use crate::config::FieldConfig;
use crate::viewport::Viewport;

/// Region particles spawn into and wrap around
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// `[0, width] x [0, height]` in logical pixels
    Plane { width: f32, height: f32 },
    /// `[-half, half]^3` in scene units
    Volume { half: f32 },
}

impl Bounds {
    /// Bounds for the configured backend over the current viewport
    pub fn for_field(config: &FieldConfig, viewport: &Viewport) -> Self {
        if config.is_volume() {
            Bounds::Volume {
                half: config.spread / 2.0,
            }
        } else {
            Bounds::Plane {
                width: viewport.width,
                height: viewport.height,
            }
        }
    }

    /// Number of axes the bounds constrain
    pub fn axes(&self) -> usize {
        match self {
            Bounds::Plane { .. } => 2,
            Bounds::Volume { .. } => 3,
        }
    }

    /// Inclusive `(min, max)` on one axis
    pub fn axis(&self, axis: usize) -> (f32, f32) {
        match *self {
            Bounds::Plane { width, .. } if axis == 0 => (0.0, width),
            Bounds::Plane { height, .. } if axis == 1 => (0.0, height),
            Bounds::Plane { .. } => (0.0, 0.0),
            Bounds::Volume { half } => (-half, half),
        }
    }

    /// Whether a point lies inside on every constrained axis
    pub fn contains(&self, point: [f32; 3]) -> bool {
        (0..self.axes()).all(|axis| {
            let (min, max) = self.axis(axis);
            point[axis] >= min && point[axis] <= max
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f32; 3] {
        let mut point = [0.0; 3];
        for (axis, value) in point.iter_mut().enumerate().take(self.axes()) {
            let (min, max) = self.axis(axis);
            *value = sample_range(rng, [min, max]);
        }
        point
    }
}

/// One animated point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Rendered location, eased toward the frame target
    pub position: [f32; 3],
    /// Unforced resting location, drifting independently
    pub base: [f32; 3],
    /// Per-frame drift, fixed at creation
    pub velocity: [f32; 3],
    pub size: f32,
    pub opacity: f32,
    pub color: [u8; 3],
    /// Repulsion multiplier
    pub density: f32,
    /// Oscillation offset in radians
    pub phase: f32,
}

impl Particle {
    /// A motionless unit particle resting at `base`
    pub fn at(base: [f32; 3]) -> Self {
        Self {
            position: base,
            base,
            velocity: [0.0; 3],
            size: 1.0,
            opacity: 1.0,
            color: [255, 255, 255],
            density: 1.0,
            phase: 0.0,
        }
    }

    /// Randomized particle for the given configuration
    pub fn random<R: Rng + ?Sized>(config: &FieldConfig, bounds: &Bounds, rng: &mut R) -> Self {
        let base = bounds.sample(rng);
        let half = config.drift_speed / 2.0;

        let mut velocity = [0.0; 3];
        for v in velocity.iter_mut().take(bounds.axes()) {
            *v = sample_range(rng, [-half, half]);
        }

        let color = config.palette[rng.gen_range(0..config.palette.len())];

        Self {
            position: base,
            base,
            velocity,
            size: sample_range(rng, config.size_range),
            opacity: sample_range(rng, config.opacity_range),
            color,
            density: sample_range(rng, config.density_range),
            phase: rng.gen_range(0.0..std::f32::consts::TAU),
        }
    }
}

/// Fixed-size arena of particles
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Box<[Particle]>,
}

impl ParticleStore {
    /// Spawn `config.particle_count` particles uniformly within `bounds`
    pub fn spawn<R: Rng + ?Sized>(config: &FieldConfig, bounds: &Bounds, rng: &mut R) -> Self {
        let particles = (0..config.particle_count)
            .map(|_| Particle::random(config, bounds, rng))
            .collect();
        Self { particles }
    }

    /// Wrap an explicit set of particles
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self {
            particles: particles.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }
}

fn sample_range<R: Rng + ?Sized>(rng: &mut R, [min, max]: [f32; 2]) -> f32 {
    if min < max {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn spawns_configured_count() {
        let config = FieldConfig::canvas();
        let bounds = Bounds::Plane {
            width: 800.0,
            height: 600.0,
        };
        let store = ParticleStore::spawn(&config, &bounds, &mut rng());
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn plane_particles_start_at_base_inside_viewport() {
        let config = FieldConfig::canvas();
        let bounds = Bounds::Plane {
            width: 320.0,
            height: 240.0,
        };
        let store = ParticleStore::spawn(&config, &bounds, &mut rng());

        for p in store.as_slice() {
            assert_eq!(p.position, p.base);
            assert!(bounds.contains(p.base));
            assert_eq!(p.base[2], 0.0);
            assert_eq!(p.velocity[2], 0.0);
            assert!(p.velocity[0].abs() <= 0.25 && p.velocity[1].abs() <= 0.25);
            assert!((0.5..=2.5).contains(&p.size));
            assert!((0.2..=0.7).contains(&p.opacity));
            assert!((1.0..=31.0).contains(&p.density));
            assert_eq!(p.color, [212, 197, 185]);
        }
    }

    #[test]
    fn volume_particles_fill_the_cube() {
        let config = FieldConfig::webgpu();
        let bounds = Bounds::for_field(&config, &Viewport::new(800.0, 600.0, 1.0));
        assert_eq!(bounds, Bounds::Volume { half: 5.0 });

        let store = ParticleStore::spawn(&config, &bounds, &mut rng());
        assert_eq!(store.len(), 200);
        assert!(store.as_slice().iter().all(|p| bounds.contains(p.base)));
        assert!(store.as_slice().iter().any(|p| p.base[2] != 0.0));
        assert!(
            store
                .as_slice()
                .iter()
                .all(|p| config.palette.contains(&p.color))
        );
    }

    #[test]
    fn degenerate_ranges_use_the_single_value() {
        let config = FieldConfig {
            size_range: [2.0, 2.0],
            drift_speed: 0.0,
            ..FieldConfig::canvas()
        };
        let bounds = Bounds::Plane {
            width: 10.0,
            height: 10.0,
        };
        let p = Particle::random(&config, &bounds, &mut rng());
        assert_eq!(p.size, 2.0);
        assert_eq!(p.velocity, [0.0; 3]);
    }

    #[test]
    fn plane_bounds_ignore_depth() {
        let bounds = Bounds::Plane {
            width: 10.0,
            height: 10.0,
        };
        assert!(bounds.contains([5.0, 5.0, 99.0]));
        assert!(!bounds.contains([11.0, 5.0, 0.0]));
    }
}
