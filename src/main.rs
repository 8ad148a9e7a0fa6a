use std::sync::Arc;

use minidav::config::{self, AppState, Config};
use minidav::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging);

    // Size the Tokio runtime from the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    if !std::path::Path::new(&cfg.storage.root).is_dir() {
        return Err(format!("storage root '{}' is not a directory", cfg.storage.root).into());
    }

    let listener = server::bind_listener(addr)?;
    logger::log_server_start(&addr, &cfg);
    match cfg.to_toml() {
        Ok(rendered) => logger::log_effective_config(&rendered),
        Err(e) => logger::log_warning(&format!("Could not render configuration: {e}")),
    }

    let state = Arc::new(AppState::new(&cfg));
    server::run(listener, state, server::shutdown_signal()).await;
    Ok(())
}
