// Server loop module
// Accepts connections until shutdown is requested, then drains active ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// How long shutdown waits for in-flight connections
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop for the flag server.
///
/// Returns once `state.shutdown_signal` fires and active connections have
/// finished or [`DRAIN_TIMEOUT`] has elapsed.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = state.shutdown_signal.notified() => {
                break;
            }
        }
    }

    // Stop accepting before waiting on in-flight requests
    drop(listener);
    logger::log_shutdown_started(active_connections.load(Ordering::SeqCst));

    let remaining = drain_connections(&active_connections, DRAIN_TIMEOUT).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}

/// Wait until the counter reaches zero or `timeout` elapses; returns what is left
async fn drain_connections(active_connections: &AtomicUsize, timeout: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
