//! Tempo Docs - step-by-step visual documentation editor
//!
//! Projects are sequences of slides holding titles, text and embedded media.
//! Each project exports to a single HTML file that can be imported again.

mod app;
mod core;
mod storage;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use app::{Startup, TempoApp};
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::AppConfig;
use crate::storage::{JsonFileStore, MemoryStore, ProjectStore, StoreError};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Tempo Docs...");

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {}", e);
        AppConfig::default()
    });

    let opened = config
        .store_dir()
        .map_err(|e| StoreError::Unavailable(e.to_string()))
        .and_then(|dir| JsonFileStore::open(dir));
    let (store, stored): (Arc<dyn ProjectStore>, _) = match opened {
        Ok(store) => {
            let stored = store.get_all();
            (Arc::new(store), stored)
        }
        Err(e) => {
            tracing::error!("Project store unavailable, edits will not outlive this session: {}", e);
            (Arc::new(MemoryStore::new()), Err(e))
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("tempo-store")
        .build()?;

    let startup = Startup {
        config,
        runtime,
        store,
        stored,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Tempo Docs"),
        ..Default::default()
    };

    eframe::run_native(
        "Tempo Docs",
        native_options,
        Box::new(|cc| Ok(Box::new(TempoApp::new(cc, startup)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
