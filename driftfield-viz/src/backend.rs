//! Backend selection

use driftfield::{Backend, FieldConfig, FrameView, Particle, Renderer, Viewport};
use tracing::{info, warn};
use web_sys::HtmlCanvasElement;

use crate::canvas2d::Canvas2DRenderer;
#[cfg(feature = "webgpu")]
use crate::webgpu::WebGpuRenderer;

/// The renderer a mounted field draws with
pub enum ActiveRenderer {
    Canvas(Canvas2DRenderer),
    #[cfg(feature = "webgpu")]
    WebGpu(WebGpuRenderer),
}

impl ActiveRenderer {
    /// Create the renderer the config asks for.
    ///
    /// A WebGPU request that cannot be honoured falls back to Canvas 2D; the
    /// returned config is then the canvas preset carrying over the caller's
    /// page-level settings.
    pub async fn create(
        canvas: HtmlCanvasElement,
        config: FieldConfig,
    ) -> Result<(Self, FieldConfig), String> {
        if config.backend == Backend::WebGpu {
            #[cfg(feature = "webgpu")]
            if crate::check_webgpu_support() {
                match WebGpuRenderer::new(canvas.clone(), &config).await {
                    Ok(renderer) => {
                        info!("using webgpu backend");
                        return Ok((Self::WebGpu(renderer), config));
                    }
                    Err(err) => warn!(error = %err, "webgpu init failed"),
                }
            }
            warn!("webgpu unavailable; falling back to canvas 2d");
            let config = canvas_fallback(&config);
            return Ok((Self::Canvas(Canvas2DRenderer::new(canvas)?), config));
        }

        Ok((Self::Canvas(Canvas2DRenderer::new(canvas)?), config))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Canvas(_) => "canvas",
            #[cfg(feature = "webgpu")]
            Self::WebGpu(_) => "webgpu",
        }
    }
}

/// Canvas preset keeping the settings that make sense in either mode
pub fn canvas_fallback(requested: &FieldConfig) -> FieldConfig {
    FieldConfig {
        interactive: requested.interactive,
        class_name: requested.class_name.clone(),
        seed: requested.seed,
        ..FieldConfig::canvas()
    }
}

impl Renderer for ActiveRenderer {
    fn resize(&mut self, viewport: &Viewport) {
        match self {
            Self::Canvas(r) => r.resize(viewport),
            #[cfg(feature = "webgpu")]
            Self::WebGpu(r) => r.resize(viewport),
        }
    }

    fn upload_static(&mut self, particles: &[Particle]) {
        match self {
            Self::Canvas(r) => r.upload_static(particles),
            #[cfg(feature = "webgpu")]
            Self::WebGpu(r) => r.upload_static(particles),
        }
    }

    fn draw(&mut self, frame: &FrameView<'_>) {
        match self {
            Self::Canvas(r) => r.draw(frame),
            #[cfg(feature = "webgpu")]
            Self::WebGpu(r) => r.draw(frame),
        }
    }

    fn release(&mut self) {
        match self {
            Self::Canvas(r) => r.release(),
            #[cfg(feature = "webgpu")]
            Self::WebGpu(r) => r.release(),
        }
    }
}
