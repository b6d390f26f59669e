//! Scroll-linked decorative layers
//!
//! The gradient orbs behind the field move at a fraction of the page scroll.
//! They are positioned by the page; nothing here touches particles.

use serde::Serialize;

/// A decorative layer translated by `scroll_y * factor`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParallaxLayer {
    pub class_name: &'static str,
    pub factor: f32,
}

impl ParallaxLayer {
    /// Vertical offset in CSS pixels for a page scroll position
    pub fn offset(&self, scroll_y: f32) -> f32 {
        scroll_y * self.factor
    }
}

/// The three orbs, back to front
pub const LAYERS: [ParallaxLayer; 3] = [
    ParallaxLayer {
        class_name: "gradient-orb orb-1",
        factor: 0.3,
    },
    ParallaxLayer {
        class_name: "gradient-orb orb-2",
        factor: 0.5,
    },
    ParallaxLayer {
        class_name: "gradient-orb orb-3",
        factor: 0.2,
    },
];

/// Offsets for every layer, in [`LAYERS`] order
pub fn parallax_offsets(scroll_y: f32) -> [f32; 3] {
    LAYERS.each_ref().map(|layer| layer.offset(scroll_y))
}
