//! Headless simulation runs
//!
//! Drives the animation loop with a [`ManualScheduler`] at a fixed 60 Hz
//! clock and summarizes what the connection builder produced.

use std::time::{SystemTime, UNIX_EPOCH};

use driftfield::{
    AnimationLoop, Backend, FieldConfig, FieldResult, FrameView, ManualScheduler, ParticleField,
    Renderer, Viewport,
};
use serde::Serialize;
use tracing::{debug, info};

/// Seconds between simulated frames
pub const FRAME_INTERVAL: f64 = 1.0 / 60.0;

/// Parameters of one headless run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub frames: u64,
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
    /// Pointer held still at this position, in surface pixels
    pub pointer: Option<(f32, f32)>,
    /// Resize to `resize_to` after this many frames
    pub resize_at: Option<u64>,
    pub resize_to: Option<(f32, f32)>,
    /// Overrides the config seed
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: 300,
            width: 1280.0,
            height: 720.0,
            dpr: 1.0,
            pointer: None,
            resize_at: None,
            resize_to: None,
            seed: None,
        }
    }
}

/// Summary printed by `driftfield simulate`
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub backend: Backend,
    pub seed: u64,
    pub frames: u64,
    /// Frames handed to the renderer
    pub draws: u64,
    pub particles: usize,
    pub mean_edges: f64,
    pub peak_edges: usize,
    /// Edges dropped by the cap, summed over all frames
    pub dropped_edges: usize,
    /// Particles resting outside the field bounds after the last frame
    pub out_of_bounds: usize,
    pub viewport: Viewport,
}

/// Renderer that only counts draws
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub draws: u64,
}

impl Renderer for HeadlessRenderer {
    fn resize(&mut self, _viewport: &Viewport) {}

    fn draw(&mut self, _frame: &FrameView<'_>) {
        self.draws += 1;
    }

    fn release(&mut self) {}
}

/// Run `options.frames` frames and summarize them
pub fn run(mut config: FieldConfig, options: &RunOptions) -> FieldResult<Report> {
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    let seed = config.seed.unwrap_or_else(entropy);
    config.seed = Some(seed);

    let viewport = Viewport::new(options.width, options.height, options.dpr);
    let field = ParticleField::new(config, viewport, seed)?;
    let mut anim = AnimationLoop::new(field, HeadlessRenderer::default(), ManualScheduler::new());

    anim.start()?;
    if let Some((x, y)) = options.pointer {
        anim.pointer_moved(x, y);
    }

    let mut total_edges = 0usize;
    let mut peak_edges = 0usize;
    let mut dropped_edges = 0usize;

    for frame in 0..options.frames {
        if options.resize_at == Some(frame) {
            if let Some((width, height)) = options.resize_to {
                debug!(frame, width, height, "resizing");
                anim.resize(width, height, options.dpr);
            }
        }

        let Some(stats) = anim.on_frame(frame as f64 * FRAME_INTERVAL) else {
            break;
        };
        total_edges += stats.edges;
        peak_edges = peak_edges.max(stats.edges);
        dropped_edges += stats.dropped_edges;
    }

    let field = anim.field();
    let frames = field.frame_count();
    let bounds = field.bounds();
    let report = Report {
        backend: field.config().backend,
        seed,
        frames,
        draws: anim.renderer().draws,
        particles: field.particles().len(),
        mean_edges: if frames == 0 {
            0.0
        } else {
            total_edges as f64 / frames as f64
        },
        peak_edges,
        dropped_edges,
        out_of_bounds: field
            .particles()
            .iter()
            .filter(|p| !bounds.contains(p.base))
            .count(),
        viewport: *field.viewport(),
    };

    anim.teardown();
    info!(frames, peak_edges, "simulation finished");
    Ok(report)
}

fn entropy() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
