//! Animation loop controller
//!
//! An explicit two-state machine driving field and renderer once per
//! scheduled frame:
//!
//! ```text
//! Stopped --start--> Running --frame--> Running --teardown--> Stopped
//! ```
//!
//! The loop owns the handle of its pending frame, so teardown can cancel it
//! synchronously. Teardown is idempotent.

use tracing::{debug, info, warn};

use crate::error::{FieldError, FieldResult};
use crate::field::{FrameStats, ParticleField};
use crate::render::Renderer;

/// Opaque id of a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Source of "next frame" callbacks plus the input listeners tied to them
pub trait FrameScheduler {
    /// Schedule the next frame callback
    fn request_frame(&mut self) -> FieldResult<FrameHandle>;

    /// Cancel a scheduled callback; unknown or stale handles are ignored
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Remove every input and resize listener. Safe to call repeatedly.
    fn detach(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Drives physics, connections and rendering once per frame
pub struct AnimationLoop<R, S> {
    field: ParticleField,
    renderer: R,
    scheduler: S,
    state: LoopState,
    pending: Option<FrameHandle>,
    released: bool,
}

impl<R: Renderer, S: FrameScheduler> AnimationLoop<R, S> {
    pub fn new(field: ParticleField, renderer: R, scheduler: S) -> Self {
        Self {
            field,
            renderer,
            scheduler,
            state: LoopState::Stopped,
            pending: None,
            released: false,
        }
    }

    /// `Stopped -> Running`: size the surface, upload static data and
    /// schedule the first frame. A no-op while already running.
    pub fn start(&mut self) -> FieldResult<()> {
        if self.state == LoopState::Running {
            return Ok(());
        }
        if self.released {
            return Err(FieldError::SurfaceUnavailable(
                "renderer already released".to_string(),
            ));
        }

        self.renderer.resize(self.field.viewport());
        self.renderer.upload_static(self.field.particles());
        self.pending = Some(self.scheduler.request_frame()?);
        self.state = LoopState::Running;

        info!(
            particles = self.field.particles().len(),
            backend = ?self.field.config().backend,
            "animation started"
        );
        Ok(())
    }

    /// Frame callback: physics, connections, render, reschedule.
    ///
    /// Returns `None` when the loop is not running, which covers a callback
    /// that fired after its cancellation.
    pub fn on_frame(&mut self, now: f64) -> Option<FrameStats> {
        if self.state != LoopState::Running {
            return None;
        }
        self.pending = None;

        let stats = self.field.tick(now);
        self.renderer.draw(&self.field.frame());

        match self.scheduler.request_frame() {
            Ok(handle) => self.pending = Some(handle),
            Err(err) => {
                warn!(error = %err, frame = stats.frame, "could not schedule next frame; stopping");
                self.state = LoopState::Stopped;
                self.scheduler.detach();
            }
        }

        Some(stats)
    }

    /// `Running -> Stopped`: cancel the pending frame, detach listeners and
    /// release the renderer. Repeated calls do nothing further.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        if self.state == LoopState::Running {
            info!(frames = self.field.frame_count(), "animation stopped");
        }
        self.state = LoopState::Stopped;
        self.scheduler.detach();

        if !self.released {
            self.renderer.release();
            self.released = true;
        }
    }

    /// Viewport changed; resizes the field and the drawing surface
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) {
        self.field.resize(width, height, dpr);
        if !self.released {
            self.renderer.resize(self.field.viewport());
        }
    }

    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        if self.accepts_input("pointer move") {
            self.field.pointer_moved(client_x, client_y);
        }
    }

    pub fn pointer_left(&mut self) {
        if self.accepts_input("pointer leave") {
            self.field.pointer_left();
        }
    }

    pub fn set_surface_origin(&mut self, left: f32, top: f32) {
        self.field.set_surface_origin(left, top);
    }

    // Listeners are detached before the loop stops, so input here is a bug
    fn accepts_input(&self, event: &str) -> bool {
        debug_assert!(
            self.state == LoopState::Running,
            "{event} delivered to a stopped loop"
        );
        if self.state != LoopState::Running {
            debug!(event, "input ignored while stopped");
            return false;
        }
        true
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

/// Scheduler for headless driving: the caller invokes frames itself
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next: i32,
    pending: Option<FrameHandle>,
    listeners: usize,
    cancelled: usize,
    refuse: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `count` input/resize listeners were attached
    pub fn with_listeners(count: usize) -> Self {
        Self {
            listeners: count,
            ..Self::default()
        }
    }

    /// Make every following `request_frame` fail
    pub fn refuse_frames(&mut self) {
        self.refuse = true;
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn listeners(&self) -> usize {
        self.listeners
    }

    /// Number of callbacks actually cancelled
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FieldResult<FrameHandle> {
        if self.refuse {
            return Err(FieldError::Schedule("scheduler refused".to_string()));
        }
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending = Some(handle);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }

    fn detach(&mut self) {
        self.listeners = 0;
    }
}
