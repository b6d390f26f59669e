//! Proximity links between particles
//!
//! A brute-force scan over every unordered pair, `O(n^2)` per frame. At a few
//! hundred particles this is cheap; it is the first thing to replace with a
//! uniform grid if counts grow by an order of magnitude.

use tracing::trace;

use crate::config::FieldConfig;
use crate::particle::Particle;
use crate::physics::distance;

/// A link between particles `a < b`, valid for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    /// `1 - distance / threshold`
    pub opacity: f32,
}

/// Linear falloff: one at zero distance, zero at the threshold and beyond
pub fn link_opacity(distance: f32, threshold: f32) -> f32 {
    (1.0 - distance / threshold).clamp(0.0, 1.0)
}

/// Rebuilds the edge list each frame into a reused buffer
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    threshold: f32,
    capacity: Option<usize>,
    edges: Vec<Edge>,
    dropped: usize,
}

impl ConnectionBuilder {
    /// `capacity` bounds the edge list; the buffer is allocated here, once
    pub fn new(threshold: f32, capacity: Option<usize>) -> Self {
        Self {
            threshold,
            capacity,
            edges: Vec::with_capacity(capacity.unwrap_or(0)),
            dropped: 0,
        }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        Self::new(config.connection_distance, config.max_connections)
    }

    /// Recompute edges from current particle positions.
    ///
    /// Pairs past the capacity are counted in [`ConnectionBuilder::dropped`]
    /// and otherwise ignored.
    pub fn build(&mut self, particles: &[Particle]) -> &[Edge] {
        self.edges.clear();
        self.dropped = 0;

        let threshold_sq = self.threshold * self.threshold;

        for (a, first) in particles.iter().enumerate() {
            for (offset, second) in particles[a + 1..].iter().enumerate() {
                let dx = first.position[0] - second.position[0];
                let dy = first.position[1] - second.position[1];
                let dz = first.position[2] - second.position[2];
                if dx * dx + dy * dy + dz * dz >= threshold_sq {
                    continue;
                }

                let d = distance(first.position, second.position);
                if d >= self.threshold {
                    continue;
                }

                if self.capacity.is_some_and(|cap| self.edges.len() >= cap) {
                    self.dropped += 1;
                    continue;
                }

                self.edges.push(Edge {
                    a,
                    b: a + 1 + offset,
                    distance: d,
                    opacity: link_opacity(d, self.threshold),
                });
            }
        }

        if self.dropped > 0 {
            trace!(
                kept = self.edges.len(),
                dropped = self.dropped,
                "edge cap reached"
            );
        }

        &self.edges
    }

    /// Edges from the most recent build
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Pairs in range but discarded by the cap during the last build
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
