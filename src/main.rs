use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod config;
mod flags;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let cfg = config::Config::load_from(&config_path)?;
    cfg.validate()?;
    logger::init(&cfg)?;

    // Create Tokio runtime, worker thread count from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    let state = Arc::new(config::AppState::new(&cfg));
    let active_connections = Arc::new(AtomicUsize::new(0));

    let flags_root = state.lookup.store().root()?;
    logger::log_server_start(&listener.local_addr()?, &cfg, &flags_root);
    if !state.lookup.store().is_ready().await {
        logger::log_warning(&format!(
            "Flags directory {} is not accessible; every lookup will answer 404",
            flags_root.display()
        ));
    }

    server::start_signal_handler(Arc::clone(&state.shutdown_signal));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, active_connections))
        .await
}
