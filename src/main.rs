mod api;
mod app;
mod backend;
mod event;
mod session;
mod stream;
mod theme;
mod ui;
mod util;

use app::AgentDeckApp;
use backend::Backend;
use eframe::egui;
use std::sync::mpsc;
use theme::Theme;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("agentdeck-runtime")
        .build()?;

    let base_url = api::resolve_base_url();
    log::info!("using backend at {base_url}");

    let (tx, rx) = mpsc::channel();
    let mut backend = Backend::new(api::ApiClient::new(base_url), tx, runtime.handle().clone());

    let session_id = AgentDeckApp::mint_session_id();
    backend.subscribe_steps(&session_id);
    backend.load_history();

    let app = AgentDeckApp::new(rx, backend, session_id);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AgentDeck",
        native_options,
        Box::new(move |creation_context| {
            Theme::default().apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
