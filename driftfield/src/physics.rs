//! Per-frame physics step
//!
//! Each particle's base drifts and wraps toroidally; the rendered position
//! then eases toward a target that is the base, pushed away from the pointer
//! when the pointer is within the repulsion radius.

use crate::config::FieldConfig;
use crate::particle::{Bounds, Particle};

/// Angular rate of the wobble term per axis, radians per second
const WOBBLE_RATES: [f32; 3] = [0.9, 0.7, 0.5];

/// Tunables for one physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub easing: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub falloff_exponent: f32,
    pub wobble: f32,
}

impl From<&FieldConfig> for StepParams {
    fn from(config: &FieldConfig) -> Self {
        Self {
            easing: config.easing,
            repulsion_radius: config.repulsion_radius,
            repulsion_strength: config.repulsion_strength,
            falloff_exponent: config.falloff_exponent,
            wobble: config.wobble,
        }
    }
}

/// Advance every particle by one frame.
///
/// `pointer` must already be in particle space. `elapsed` is seconds since
/// the field started and only feeds the wobble term.
pub fn step(
    particles: &mut [Particle],
    bounds: &Bounds,
    pointer: Option<[f32; 2]>,
    params: &StepParams,
    elapsed: f32,
) {
    for particle in particles.iter_mut() {
        drift(particle, bounds, params.wobble, elapsed);
        wrap(&mut particle.base, bounds);
        let target = repulsion_target(particle.base, particle.density, pointer, params);
        particle.position = ease(particle.position, target, params.easing);
    }
}

fn drift(particle: &mut Particle, bounds: &Bounds, wobble: f32, elapsed: f32) {
    for axis in 0..bounds.axes() {
        particle.base[axis] += particle.velocity[axis];
        if wobble > 0.0 {
            let angle = elapsed * WOBBLE_RATES[axis] + particle.phase;
            let wave = if axis == 1 { angle.cos() } else { angle.sin() };
            particle.base[axis] += wobble * wave;
        }
    }
}

/// Toroidal wrap of every constrained axis
pub fn wrap(point: &mut [f32; 3], bounds: &Bounds) {
    for axis in 0..bounds.axes() {
        let (min, max) = bounds.axis(axis);
        point[axis] = wrap_axis(point[axis], min, max);
    }
}

/// Values past one bound reappear at the other
pub fn wrap_axis(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        min
    } else if value < min {
        max
    } else {
        value
    }
}

/// Force magnitude in `[0, 1]`: one at the pointer, zero at and beyond `radius`
pub fn repulsion_force(distance: f32, radius: f32, exponent: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    ((radius - distance.max(0.0)) / radius).powf(exponent)
}

/// Target position for a particle resting at `base`
pub fn repulsion_target(
    base: [f32; 3],
    density: f32,
    pointer: Option<[f32; 2]>,
    params: &StepParams,
) -> [f32; 3] {
    let Some([px, py]) = pointer else {
        return base;
    };

    let dx = base[0] - px;
    let dy = base[1] - py;
    let distance = (dx * dx + dy * dy).sqrt();

    let force = repulsion_force(distance, params.repulsion_radius, params.falloff_exponent);
    if force == 0.0 {
        return base;
    }

    // Pointer exactly on the base: push along +x
    let (ux, uy) = if distance > 0.0 {
        (dx / distance, dy / distance)
    } else {
        (1.0, 0.0)
    };

    let offset = force * params.repulsion_strength * density;
    [base[0] + ux * offset, base[1] + uy * offset, base[2]]
}

/// Close `easing` of the remaining gap to `target`
pub fn ease(position: [f32; 3], target: [f32; 3], easing: f32) -> [f32; 3] {
    [
        position[0] + (target[0] - position[0]) * easing,
        position[1] + (target[1] - position[1]) * easing,
        position[2] + (target[2] - position[2]) * easing,
    ]
}

pub(crate) fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StepParams {
        StepParams {
            easing: 0.1,
            repulsion_radius: 150.0,
            repulsion_strength: 1.0,
            falloff_exponent: 2.0,
            wobble: 0.0,
        }
    }

    fn plane(width: f32, height: f32) -> Bounds {
        Bounds::Plane { width, height }
    }

    #[test]
    fn single_particle_eases_toward_base_without_overshoot() {
        let mut particle = Particle::at([100.0, 100.0, 0.0]);
        particle.position = [160.0, 40.0, 0.0];
        let mut particles = [particle];

        step(&mut particles, &plane(200.0, 200.0), None, &params(), 0.0);

        let p = particles[0].position;
        assert!((p[0] - 154.0).abs() < 1e-4);
        assert!((p[1] - 46.0).abs() < 1e-4);
        assert!(p[0] > 100.0 && p[1] < 100.0, "no overshoot past the base");
        assert_eq!(particles[0].base, [100.0, 100.0, 0.0]);
    }

    #[test]
    fn distance_to_fixed_target_strictly_decreases() {
        let mut particle = Particle::at([100.0, 100.0, 0.0]);
        particle.position = [20.0, 180.0, 0.0];
        let mut particles = [particle];
        let pointer = Some([130.0, 90.0]);
        let target = repulsion_target(particle.base, particle.density, pointer, &params());

        let mut last = distance(particles[0].position, target);
        for _ in 0..60 {
            step(&mut particles, &plane(200.0, 200.0), pointer, &params(), 0.0);
            let now = distance(particles[0].position, target);
            assert!(now < last, "{now} !< {last}");
            last = now;
        }
    }

    #[test]
    fn drift_moves_base_by_velocity() {
        let mut particle = Particle::at([10.0, 10.0, 0.0]);
        particle.velocity = [0.25, -0.125, 0.0];
        let mut particles = [particle];

        step(&mut particles, &plane(200.0, 200.0), None, &params(), 0.0);

        assert_eq!(particles[0].base, [10.25, 9.875, 0.0]);
    }

    #[test]
    fn wrap_keeps_base_within_bounds_for_any_prior_value() {
        let bounds = plane(200.0, 100.0);
        for prior in [-1e6, -0.5, 0.0, 50.0, 100.0, 100.5, 200.5, 1e6] {
            let mut particle = Particle::at([prior, prior, 0.0]);
            particle.velocity = [0.2, -0.2, 0.0];
            let mut particles = [particle];
            step(&mut particles, &bounds, None, &params(), 0.0);
            assert!(
                bounds.contains(particles[0].base),
                "{prior} -> {:?}",
                particles[0].base
            );
        }
    }

    #[test]
    fn wrap_reappears_at_opposite_edge() {
        assert_eq!(wrap_axis(201.0, 0.0, 200.0), 0.0);
        assert_eq!(wrap_axis(-1.0, 0.0, 200.0), 200.0);
        assert_eq!(wrap_axis(200.0, 0.0, 200.0), 200.0);
        assert_eq!(wrap_axis(6.0, -5.0, 5.0), -5.0);
    }

    #[test]
    fn volume_wrap_covers_depth() {
        let mut point = [0.0, 0.0, 5.5];
        wrap(&mut point, &Bounds::Volume { half: 5.0 });
        assert_eq!(point, [0.0, 0.0, -5.0]);
    }

    #[test]
    fn repulsion_is_zero_at_radius_and_maximal_at_pointer() {
        assert_eq!(repulsion_force(150.0, 150.0, 2.0), 0.0);
        assert_eq!(repulsion_force(151.0, 150.0, 2.0), 0.0);
        assert_eq!(repulsion_force(0.0, 150.0, 2.0), 1.0);

        let near = repulsion_force(10.0, 150.0, 2.0);
        let far = repulsion_force(100.0, 150.0, 2.0);
        assert!(near > far && far > 0.0);
        assert!((repulsion_force(75.0, 150.0, 2.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn falloff_exponent_is_tunable() {
        assert!((repulsion_force(75.0, 150.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn target_pushed_away_from_pointer() {
        let mut p = params();
        p.repulsion_strength = 2.0;
        let target = repulsion_target([100.0, 100.0, 0.0], 10.0, Some([25.0, 100.0]), &p);

        // force = (75/150)^2 = 0.25; offset = 0.25 * 2 * 10 = 5
        assert!((target[0] - 105.0).abs() < 1e-4);
        assert_eq!(target[1], 100.0);
    }

    #[test]
    fn target_is_base_outside_radius_or_without_pointer() {
        let base = [100.0, 100.0, 3.0];
        assert_eq!(repulsion_target(base, 5.0, None, &params()), base);
        assert_eq!(
            repulsion_target(base, 5.0, Some([250.0, 100.0]), &params()),
            base
        );
    }

    #[test]
    fn pointer_on_base_pushes_with_full_force() {
        let target = repulsion_target([50.0, 50.0, 0.0], 4.0, Some([50.0, 50.0]), &params());
        assert_eq!(target, [54.0, 50.0, 0.0]);
    }

    #[test]
    fn wobble_bends_drift_periodically() {
        let mut p = params();
        p.wobble = 0.01;
        let mut particle = Particle::at([0.0, 0.0, 0.0]);
        particle.phase = std::f32::consts::FRAC_PI_2;
        let mut particles = [particle];

        step(
            &mut particles,
            &Bounds::Volume { half: 5.0 },
            None,
            &p,
            0.0,
        );

        // sin(pi/2) = 1 on x, cos(pi/2) = 0 on y, sin(pi/2) = 1 on z
        let base = particles[0].base;
        assert!((base[0] - 0.01).abs() < 1e-6);
        assert!(base[1].abs() < 1e-6);
        assert!((base[2] - 0.01).abs() < 1e-6);
    }
}
