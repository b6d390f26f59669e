//! Browser frame scheduler
//!
//! Wraps `requestAnimationFrame` and owns every DOM listener the field
//! attaches, so detaching is a single call.

use driftfield::{FieldError, FieldResult, FrameHandle, FrameScheduler};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget, Window};

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// `requestAnimationFrame` scheduler plus the listener set tied to it
pub struct BrowserScheduler {
    window: Window,
    /// Frame callback; receives the rAF timestamp in milliseconds
    frame: Option<Closure<dyn FnMut(f64)>>,
    listeners: Vec<Listener>,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            frame: None,
            listeners: Vec::new(),
        }
    }

    /// Install the callback run on every scheduled frame
    pub fn set_frame_callback(&mut self, callback: Closure<dyn FnMut(f64)>) {
        self.frame = Some(callback);
    }

    /// Attach `callback` to `target` for `kind` events until `detach`
    pub fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> FieldResult<()> {
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|e| FieldError::SurfaceUnavailable(format!("{kind} listener: {e:?}")))?;
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl FrameScheduler for BrowserScheduler {
    fn request_frame(&mut self) -> FieldResult<FrameHandle> {
        let callback = self
            .frame
            .as_ref()
            .ok_or_else(|| FieldError::Schedule("no frame callback installed".to_string()))?;
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map(FrameHandle)
            .map_err(|e| FieldError::Schedule(format!("{e:?}")))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // Cancelling a fired or unknown id is a no-op in the browser too
        self.window.cancel_animation_frame(handle.0).ok();
    }

    fn detach(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        debug!(count = self.listeners.len(), "detaching listeners");
        for listener in self.listeners.drain(..) {
            listener
                .target
                .remove_event_listener_with_callback(
                    listener.kind,
                    listener.callback.as_ref().unchecked_ref(),
                )
                .ok();
        }
        // The frame callback may be running right now, so it is dropped
        // with the scheduler rather than here.
    }
}
