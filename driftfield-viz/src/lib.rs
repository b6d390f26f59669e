//! Browser bindings for the driftfield particle backdrop
//!
//! This crate provides WASM bindings that mount a particle field onto a page
//! canvas, drive it with `requestAnimationFrame` and tear it down again.
//!
//! ```js
//! import init, { mount, parallax_offsets } from "./driftfield_viz.js";
//! await init();
//! const field = await mount(document.querySelector("canvas"), "{}");
//! // later
//! field.teardown();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use driftfield::{AnimationLoop, FieldConfig, ParticleField, Viewport};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlCanvasElement, MouseEvent, Window};

pub mod backend;
pub mod canvas2d;
pub mod scheduler;
#[cfg(feature = "webgpu")]
pub mod webgpu;

use backend::ActiveRenderer;
use scheduler::BrowserScheduler;

type FieldLoop = AnimationLoop<ActiveRenderer, BrowserScheduler>;
type SharedLoop = Rc<RefCell<Option<FieldLoop>>>;

/// Initialize WASM panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

/// Check if WebGPU is exposed by the current browser
#[wasm_bindgen]
pub fn check_webgpu_support() -> bool {
    web_sys::window()
        .map(|window| {
            js_sys::Reflect::has(&window.navigator(), &JsValue::from_str("gpu")).unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Vertical offsets of the three decorative orbs for a page scroll position
#[wasm_bindgen]
pub fn parallax_offsets(scroll_y: f32) -> Vec<f32> {
    driftfield::parallax_offsets(scroll_y).to_vec()
}

/// Orb class names and factors as JSON
#[wasm_bindgen]
pub fn parallax_layers() -> Result<String, JsValue> {
    serde_json::to_string(&driftfield::LAYERS).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// A mounted field. Dropping the handle tears the field down.
#[wasm_bindgen]
pub struct FieldHandle {
    shared: SharedLoop,
    backend: &'static str,
    frames: Cell<u64>,
}

#[wasm_bindgen]
impl FieldHandle {
    /// Stop the loop, detach listeners and release the surface.
    /// Safe to call more than once.
    pub fn teardown(&self) {
        let taken = match self.shared.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                warn!("teardown requested while a frame is running; ignored");
                return;
            }
        };
        if let Some(mut anim) = taken {
            anim.teardown();
            self.frames.set(anim.field().frame_count());
            // Closures drop with the loop, after their listeners are gone
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared
            .try_borrow()
            .map(|slot| slot.as_ref().is_some_and(|anim| anim.is_running()))
            .unwrap_or(true)
    }

    /// Frames completed so far
    pub fn frame_count(&self) -> f64 {
        let live = self
            .shared
            .try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().map(|anim| anim.field().frame_count()));
        live.unwrap_or_else(|| self.frames.get()) as f64
    }

    /// `"canvas"` or `"webgpu"`, after any fallback
    pub fn backend(&self) -> String {
        self.backend.to_string()
    }
}

impl Drop for FieldHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Mount a particle field on `canvas`.
///
/// `config_json` is a partial `FieldConfig`; missing fields come from the
/// preset of the requested backend. Nothing keeps running if this fails.
#[wasm_bindgen]
pub async fn mount(canvas: HtmlCanvasElement, config_json: String) -> Result<FieldHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let config = FieldConfig::from_json(&config_json).map_err(to_js)?;

    let (width, height, dpr) = measure(&window, &canvas);
    let viewport = Viewport::new(width, height, dpr);
    canvas.set_width(viewport.backing_width);
    canvas.set_height(viewport.backing_height);

    let (renderer, config) = ActiveRenderer::create(canvas.clone(), config)
        .await
        .map_err(|e| JsValue::from_str(&e))?;
    let backend = renderer.name();

    if !config.class_name.is_empty() {
        canvas.class_list().add_1(&config.class_name).ok();
    }

    let interactive = config.interactive;
    let entropy = (js_sys::Math::random() * u64::MAX as f64) as u64;
    let field = ParticleField::new(config, viewport, entropy).map_err(to_js)?;

    let shared: SharedLoop = Rc::new(RefCell::new(None));
    let mut scheduler = BrowserScheduler::new(window.clone());
    if let Err(err) = attach(&mut scheduler, &shared, &window, &canvas, interactive) {
        driftfield::FrameScheduler::detach(&mut scheduler);
        return Err(to_js(err));
    }

    let mut anim = AnimationLoop::new(field, renderer, scheduler);
    let rect = canvas.get_bounding_client_rect();
    anim.set_surface_origin(rect.left() as f32, rect.top() as f32);

    if let Err(err) = anim.start() {
        anim.teardown();
        return Err(to_js(err));
    }
    *shared.borrow_mut() = Some(anim);

    info!(backend, "field mounted");
    Ok(FieldHandle {
        shared,
        backend,
        frames: Cell::new(0),
    })
}

/// Install the frame callback and every listener on `scheduler`
fn attach(
    scheduler: &mut BrowserScheduler,
    shared: &SharedLoop,
    window: &Window,
    canvas: &HtmlCanvasElement,
    interactive: bool,
) -> driftfield::FieldResult<()> {
    let weak = Rc::downgrade(shared);
    scheduler.set_frame_callback(Closure::wrap(Box::new(move |timestamp: f64| {
        with_loop(&weak, |anim| {
            anim.on_frame(timestamp / 1000.0);
        });
    }) as Box<dyn FnMut(f64)>));

    if interactive {
        let weak = Rc::downgrade(shared);
        let on_move = Closure::wrap(Box::new(move |event: Event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let (x, y) = (event.client_x() as f32, event.client_y() as f32);
                with_loop(&weak, |anim| anim.pointer_moved(x, y));
            }
        }) as Box<dyn FnMut(Event)>);
        scheduler.listen(window, "pointermove", on_move)?;

        let weak = Rc::downgrade(shared);
        let on_leave = Closure::wrap(Box::new(move |_: Event| {
            with_loop(&weak, |anim| anim.pointer_left());
        }) as Box<dyn FnMut(Event)>);
        let root = window
            .document()
            .and_then(|document| document.document_element())
            .ok_or_else(|| driftfield::FieldError::SurfaceUnavailable("no document".to_string()))?;
        scheduler.listen(&root, "pointerleave", on_leave)?;
    }

    let weak = Rc::downgrade(shared);
    let (resize_window, resize_canvas) = (window.clone(), canvas.clone());
    let on_resize = Closure::wrap(Box::new(move |_: Event| {
        let (width, height, dpr) = measure(&resize_window, &resize_canvas);
        let rect = resize_canvas.get_bounding_client_rect();
        with_loop(&weak, |anim| {
            anim.resize(width, height, dpr);
            anim.set_surface_origin(rect.left() as f32, rect.top() as f32);
        });
    }) as Box<dyn FnMut(Event)>);
    scheduler.listen(window, "resize", on_resize)?;

    // Scrolling moves the surface under a still pointer
    let weak = Rc::downgrade(shared);
    let scroll_canvas = canvas.clone();
    let on_scroll = Closure::wrap(Box::new(move |_: Event| {
        let rect = scroll_canvas.get_bounding_client_rect();
        with_loop(&weak, |anim| {
            anim.set_surface_origin(rect.left() as f32, rect.top() as f32)
        });
    }) as Box<dyn FnMut(Event)>);
    scheduler.listen(window, "scroll", on_scroll)?;

    Ok(())
}

/// Run `f` on the live loop, if it is still mounted and not already borrowed
fn with_loop(weak: &Weak<RefCell<Option<FieldLoop>>>, f: impl FnOnce(&mut FieldLoop)) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let Ok(mut slot) = shared.try_borrow_mut() else {
        return;
    };
    if let Some(anim) = slot.as_mut() {
        f(anim);
    }
}

/// Logical size of the canvas container plus the device pixel ratio
fn measure(window: &Window, canvas: &HtmlCanvasElement) -> (f32, f32, f32) {
    let container = canvas
        .parent_element()
        .map(|parent| (parent.client_width(), parent.client_height()))
        .filter(|&(w, h)| w > 0 && h > 0);

    let (width, height) = match container {
        Some((w, h)) => (w as f32, h as f32),
        None => (
            window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
            window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
        ),
    };
    (width, height, window.device_pixel_ratio() as f32)
}

fn to_js(err: driftfield::FieldError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
