//! The particle field: store, pointer, viewport and per-frame pipeline
//!
//! One `tick` runs the physics step for every particle, then rebuilds the
//! connection list from the settled positions. Renderers read the result
//! through [`ParticleField::frame`].

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::camera::Camera;
use crate::config::FieldConfig;
use crate::connections::{ConnectionBuilder, Edge};
use crate::error::FieldResult;
use crate::particle::{Bounds, Particle, ParticleStore};
use crate::physics::{self, StepParams};
use crate::pointer::PointerTracker;
use crate::render::FrameView;
use crate::viewport::Viewport;

/// Counters for one completed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub edges: usize,
    pub dropped_edges: usize,
}

/// A running particle simulation, independent of any drawing surface
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: FieldConfig,
    viewport: Viewport,
    bounds: Bounds,
    camera: Camera,
    pointer: PointerTracker,
    store: ParticleStore,
    connections: ConnectionBuilder,
    params: StepParams,
    started_at: Option<f64>,
    frame: u64,
}

impl ParticleField {
    /// Spawn a field. `entropy` seeds the RNG unless the config pins a seed.
    pub fn new(config: FieldConfig, viewport: Viewport, entropy: u64) -> FieldResult<Self> {
        config.validate()?;

        let bounds = Bounds::for_field(&config, &viewport);
        let mut rng = SmallRng::seed_from_u64(config.seed.unwrap_or(entropy));
        let store = ParticleStore::spawn(&config, &bounds, &mut rng);

        debug!(
            particles = store.len(),
            backend = ?config.backend,
            width = viewport.width,
            height = viewport.height,
            "spawned particle field"
        );

        Ok(Self::assemble(config, viewport, bounds, store))
    }

    /// Build a field around explicit particles, ignoring `particle_count`
    pub fn with_particles(
        config: FieldConfig,
        viewport: Viewport,
        particles: Vec<Particle>,
    ) -> FieldResult<Self> {
        config.validate()?;
        let bounds = Bounds::for_field(&config, &viewport);
        let store = ParticleStore::from_particles(particles);
        Ok(Self::assemble(config, viewport, bounds, store))
    }

    fn assemble(
        config: FieldConfig,
        viewport: Viewport,
        bounds: Bounds,
        store: ParticleStore,
    ) -> Self {
        Self {
            camera: Camera::from_config(&config, &viewport),
            connections: ConnectionBuilder::from_config(&config),
            params: StepParams::from(&config),
            pointer: PointerTracker::new(),
            started_at: None,
            frame: 0,
            config,
            viewport,
            bounds,
            store,
        }
    }

    /// Apply a new logical size and pixel ratio.
    ///
    /// Particles keep their coordinates; the next step wraps against the new
    /// bounds. Returns whether the backing buffer changed.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> bool {
        let changed = self.viewport.resize(width, height, dpr);
        self.bounds = Bounds::for_field(&self.config, &self.viewport);
        self.camera.resize(&self.viewport);
        debug!(
            width = self.viewport.width,
            height = self.viewport.height,
            dpr = self.viewport.dpr,
            "viewport resized"
        );
        changed
    }

    /// Pointer moved, in client coordinates
    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        self.pointer.move_to(client_x, client_y);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.leave();
    }

    /// The surface's top-left corner moved, in client coordinates
    pub fn set_surface_origin(&mut self, left: f32, top: f32) {
        self.pointer.set_origin(left, top);
    }

    /// Pointer in particle space, or `None` if absent or interaction is off
    pub fn pointer_in_field(&self) -> Option<[f32; 2]> {
        if !self.config.interactive {
            return None;
        }
        let [x, y] = self.pointer.position()?;
        match self.bounds {
            Bounds::Plane { .. } => Some([x, y]),
            Bounds::Volume { .. } => Some(self.camera.unproject_to_plane(self.viewport.to_ndc(x, y))),
        }
    }

    /// Run one frame: physics for every particle, then connections.
    ///
    /// `now` is a monotonic timestamp in seconds; only differences matter.
    pub fn tick(&mut self, now: f64) -> FrameStats {
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = (now - started_at).max(0.0) as f32;
        let pointer = self.pointer_in_field();

        physics::step(
            self.store.as_mut_slice(),
            &self.bounds,
            pointer,
            &self.params,
            elapsed,
        );
        self.connections.build(self.store.as_slice());
        self.frame += 1;

        FrameStats {
            frame: self.frame,
            edges: self.connections.edges().len(),
            dropped_edges: self.connections.dropped(),
        }
    }

    /// Read-only view of the latest frame for a renderer
    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            particles: self.store.as_slice(),
            edges: self.connections.edges(),
            viewport: &self.viewport,
            camera: &self.camera,
            config: &self.config,
            frame: self.frame,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.as_slice()
    }

    pub fn edges(&self) -> &[Edge] {
        self.connections.edges()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}
