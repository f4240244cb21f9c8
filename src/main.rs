use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod store;

use logger::request_log::RequestLog;
use server::SignalHandler;

/// How long shutdown waits for open connections, then for the request log
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    cfg.validate()?;
    logger::init(&cfg)?;

    // Requests are dispatched one at a time on a single thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // The store must be ready before the first connection is accepted
    let records = store::open_record_store(&cfg.storage)?;
    if let Err(e) = records.init().await {
        logger::log_error(&format!("Failed to initialize the record store: {e}"));
        return Err(e.into());
    }
    logger::log_store_ready(&cfg.storage, records.backend_name());

    let listener = server::create_listener(addr, cfg.performance.listen_backlog)?;
    let (request_log, log_task) = RequestLog::spawn(&cfg.logging);

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::new(cfg, records, request_log));
    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    server::start_server_loop(listener, Arc::clone(&state), signals).await;

    drain_connections(&state).await;
    drop(state);

    // Connection tasks still hold log handles; don't wait on them forever
    if let Some(task) = log_task {
        if tokio::time::timeout(DRAIN_TIMEOUT, task).await.is_err() {
            logger::log_warning("Request log did not drain before shutdown");
        }
    }

    Ok(())
}

async fn drain_connections(state: &config::AppState) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    while state.active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "{} connection(s) still open at shutdown",
                state.active_connections.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
