use std::path::{Path, PathBuf};

use axum::Router;
use driftfield::Backend;
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;
use tracing::{error, info};

use crate::io::load_or_preset;
use crate::page::write_page;

/// Re-render the host page from the config file (or the canvas preset)
fn regenerate(config: Option<&Path>, output: &Path) -> anyhow::Result<()> {
    let config = load_or_preset(config, Backend::Canvas)?;
    write_page(&config, output)?;
    Ok(())
}

/// Start the development server with live reload
pub async fn serve(config: Option<&Path>, output: &Path, port: u16) -> anyhow::Result<()> {
    regenerate(config, output)?;
    info!(dir = %output.display(), "rendered host page");

    // Watch the config file's directory and re-render on change
    let config_watcher = match config {
        Some(config) => Some(watch_config(config, output)?),
        None => None,
    };

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    // Any change in the served directory reloads the browser, including a
    // fresh wasm-pack build dropped into it
    let mut output_watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                reloader.reload();
            }
        }
    })?;
    output_watcher.watch(output, RecursiveMode::Recursive)?;

    let app = Router::new()
        .fallback_service(ServeDir::new(output))
        .layer(livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("development server running at http://localhost:{port}");
    if let Some(config) = config {
        info!(config = %config.display(), "watching config for changes");
    }

    // Keep watchers alive
    let _config_watcher = config_watcher;
    let _output_watcher = output_watcher;

    axum::serve(listener, app).await?;

    Ok(())
}

fn watch_config(config: &Path, output: &Path) -> anyhow::Result<notify::RecommendedWatcher> {
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let target = config.file_name().map(|name| name.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            let touches_config = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|name| name.to_os_string()) == target);
            if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                let _ = tx.blocking_send(());
            }
        }
    })?;

    let watch_path = config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

    let config = config.to_path_buf();
    let output = output.to_path_buf();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Debounce: wait a bit for rapid changes to settle
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            while rx.try_recv().is_ok() {}

            match regenerate(Some(&config), &output) {
                Ok(()) => info!("config changed; page regenerated"),
                Err(e) => error!(error = %e, "could not regenerate page"),
            }
        }
    });

    Ok(watcher)
}
