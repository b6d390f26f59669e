//! driftfield - ambient particle-field simulation
//!
//! A fixed set of particles drifts across the viewport, wraps at its edges,
//! shies away from the pointer and links up with nearby neighbours. This
//! crate holds everything that does not need a drawing surface: the
//! simulation, the connection builder, GPU buffer staging and the animation
//! loop state machine. Browser backends live in `driftfield-viz`.
//!
//! # Example
//!
//! ```
//! use driftfield::{AnimationLoop, FieldConfig, ManualScheduler, ParticleField, Viewport};
//! # use driftfield::{FrameView, Renderer};
//! # struct Noop;
//! # impl Renderer for Noop {
//! #     fn resize(&mut self, _: &Viewport) {}
//! #     fn draw(&mut self, _: &FrameView<'_>) {}
//! #     fn release(&mut self) {}
//! # }
//!
//! let field = ParticleField::new(FieldConfig::canvas(), Viewport::new(800.0, 600.0, 2.0), 7)?;
//! let mut anim = AnimationLoop::new(field, Noop, ManualScheduler::new());
//!
//! anim.start()?;
//! for frame in 0..60 {
//!     anim.on_frame(frame as f64 / 60.0);
//! }
//! anim.teardown();
//! # Ok::<(), driftfield::FieldError>(())
//! ```

pub mod animation;
pub mod camera;
pub mod config;
pub mod connections;
pub mod error;
pub mod field;
pub mod gpu;
pub mod parallax;
pub mod particle;
pub mod physics;
pub mod pointer;
pub mod render;
pub mod viewport;

pub use animation::{AnimationLoop, FrameHandle, FrameScheduler, LoopState, ManualScheduler};
pub use camera::Camera;
pub use config::{Backend, FieldConfig};
pub use connections::{ConnectionBuilder, Edge, link_opacity};
pub use error::{ConfigError, FieldError, FieldResult};
pub use field::{FrameStats, ParticleField};
pub use parallax::{LAYERS, ParallaxLayer, parallax_offsets};
pub use particle::{Bounds, Particle, ParticleStore};
pub use pointer::PointerTracker;
pub use render::{FrameView, Renderer, css_rgba};
pub use viewport::Viewport;
