//! Pointer tracking in surface-relative logical pixels
//!
//! Raw event coordinates are stored alongside the surface origin so a moved
//! or resized surface re-translates the last known pointer without waiting
//! for the next pointer event.

/// Last known pointer position, or absent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerTracker {
    client: Option<[f32; 2]>,
    origin: [f32; 2],
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer move in client (viewport) coordinates
    pub fn move_to(&mut self, client_x: f32, client_y: f32) {
        if client_x.is_finite() && client_y.is_finite() {
            self.client = Some([client_x, client_y]);
        }
    }

    /// Pointer left the surface
    pub fn leave(&mut self) {
        self.client = None;
    }

    /// Update the surface's top-left corner in client coordinates
    pub fn set_origin(&mut self, left: f32, top: f32) {
        self.origin = [left, top];
    }

    /// Position relative to the surface, in logical pixels
    pub fn position(&self) -> Option<[f32; 2]> {
        self.client
            .map(|[x, y]| [x - self.origin[0], y - self.origin[1]])
    }

    pub fn is_present(&self) -> bool {
        self.client.is_some()
    }
}
