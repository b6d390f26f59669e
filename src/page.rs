//! Host page rendering
//!
//! Renders `templates/index.html`: a full-viewport canvas behind the page,
//! the three parallax orbs, and the config handed to the WASM `mount` call.

use std::fs;
use std::path::Path;

use askama::Template;
use driftfield::{FieldConfig, LAYERS, ParallaxLayer};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    class_name: &'a str,
    /// Config JSON, safe to embed in a `<script>` element
    config_json: &'a str,
    layers: &'a [ParallaxLayer],
    /// Path of the wasm-bindgen JS glue, relative to the page
    module_path: &'a str,
}

/// Default location of the `wasm-pack --target web` output
pub const MODULE_PATH: &str = "./pkg/driftfield_viz.js";

/// Render the host page as a string
pub fn render_page(config: &FieldConfig, title: &str) -> anyhow::Result<String> {
    let json = serde_json::to_string(config)?;
    // Keep `</script>` inside strings from closing the element
    let config_json = json.replace("</", "<\\/");

    let template = IndexTemplate {
        title,
        class_name: &config.class_name,
        config_json: &config_json,
        layers: &LAYERS,
        module_path: MODULE_PATH,
    };
    Ok(template.render()?)
}

/// Render the host page into `output_dir/index.html`
pub fn write_page(config: &FieldConfig, output_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)?;
    let html = render_page(config, "driftfield")?;
    fs::write(output_dir.join("index.html"), html)?;
    Ok(())
}
