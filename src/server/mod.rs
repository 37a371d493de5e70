//! Connection dispatch: the listening socket, its accept loop, and the
//! handle used to shut it down.
//!
//! ```text
//! Server::serve ──► accept loop ──► spawn Connection::run per socket
//!       │                │
//!       └── close() ─────┴──► running = false, shutdown signal, listener dropped
//! ```

pub mod backoff;
pub mod handler;
pub mod listener;

pub use handler::{Handler, HandlerFuture, Sink};
pub use listener::Server;

use tokio::sync::watch;

/// Resolves once shutdown has been signalled or the server handle is gone.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
