//! 2D Canvas rendering for the particle field
//!
//! Draws the plane simulation onto a transparent HTML canvas. The context
//! transform is scaled by the device pixel ratio so everything below works
//! in logical pixels.

use driftfield::render::link_alpha;
use driftfield::{FrameView, Renderer, Viewport, css_rgba};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// 2D Canvas renderer
pub struct Canvas2DRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    /// Particle fill styles, built once in `upload_static`
    fills: Vec<String>,
}

impl Canvas2DRenderer {
    /// Create renderer from canvas element
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| format!("Failed to get 2d context: {:?}", e))?
            .ok_or("2d context not available")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "Failed to cast to CanvasRenderingContext2d")?;

        let width = canvas.width() as f64;
        let height = canvas.height() as f64;

        Ok(Self {
            canvas,
            ctx,
            width,
            height,
            fills: Vec::new(),
        })
    }

    fn draw_links(&self, frame: &FrameView<'_>) {
        let config = frame.config;
        self.ctx.set_line_width(config.link_width as f64);

        for edge in frame.edges {
            let a = &frame.particles[edge.a].position;
            let b = &frame.particles[edge.b].position;

            let stroke = css_rgba(config.link_color, link_alpha(config, edge.opacity));
            self.ctx.set_stroke_style_str(&stroke);
            self.ctx.begin_path();
            self.ctx.move_to(a[0] as f64, a[1] as f64);
            self.ctx.line_to(b[0] as f64, b[1] as f64);
            self.ctx.stroke();
        }
    }

    fn draw_particles(&self, frame: &FrameView<'_>) {
        for (i, particle) in frame.particles.iter().enumerate() {
            let fallback;
            let fill = match self.fills.get(i) {
                Some(fill) => fill.as_str(),
                None => {
                    fallback = css_rgba(particle.color, particle.opacity);
                    fallback.as_str()
                }
            };

            self.ctx.begin_path();
            self.ctx
                .arc(
                    particle.position[0] as f64,
                    particle.position[1] as f64,
                    particle.size as f64,
                    0.0,
                    std::f64::consts::TAU,
                )
                .ok();
            self.ctx.set_fill_style_str(fill);
            self.ctx.fill();
        }
    }
}

impl Renderer for Canvas2DRenderer {
    fn resize(&mut self, viewport: &Viewport) {
        self.canvas.set_width(viewport.backing_width);
        self.canvas.set_height(viewport.backing_height);
        self.width = viewport.width as f64;
        self.height = viewport.height as f64;

        // Setting the size resets the context, so the transform goes after it
        let [a, b, c, d, e, f] = viewport.transform();
        self.ctx.set_transform(a, b, c, d, e, f).ok();
    }

    fn upload_static(&mut self, particles: &[driftfield::Particle]) {
        self.fills = particles
            .iter()
            .map(|p| css_rgba(p.color, p.opacity))
            .collect();
    }

    fn draw(&mut self, frame: &FrameView<'_>) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);

        // Links first so particles sit on top
        self.draw_links(frame);
        self.draw_particles(frame);
    }

    fn release(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
        self.fills = Vec::new();
        self.canvas.set_width(0);
        self.canvas.set_height(0);
    }
}
