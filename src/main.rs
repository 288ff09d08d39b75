use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use isoserve::{config, logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Tokio runtime sized by the workers setting
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
    let backlog = cfg.server.backlog;

    // A failed bind is fatal; there is no fallback port
    let listener = server::create_listener(addr, backlog)?;
    let state = Arc::new(config::AppState::new(cfg)?);
    let active_connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&addr, &state);

    server::start_server_loop(
        listener,
        state,
        active_connections,
        server::shutdown_signal(),
    )
    .await;

    Ok(())
}
