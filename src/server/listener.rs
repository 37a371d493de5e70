use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ReadLimits};
use crate::server::backoff::AcceptBackoff;
use crate::server::handler::Handler;
use crate::server::shutdown_requested;

/// Handle to a running server.
///
/// Dropping it without calling [`close`](Self::close) also stops the accept
/// loop, but does not wait for it.
pub struct Server {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl Server {
    /// Binds `cfg.listen_addr` and starts accepting connections in the
    /// background, one task per connection.
    pub async fn serve<H: Handler>(cfg: &Config, handler: H) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&cfg.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let running = Arc::new(AtomicBool::new(true));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let accept_loop = AcceptLoop {
            listener,
            running: running.clone(),
            shutdown: shutdown_rx,
            handler: Arc::new(handler),
            limits: ReadLimits::from_config(cfg),
            backoff: AcceptBackoff::new(&cfg.accept_backoff),
        };
        let accept_task = tokio::spawn(accept_loop.run());

        Ok(Self {
            local_addr,
            running,
            shutdown,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops accepting connections and closes the listening socket.
    ///
    /// Connections still waiting for their request are dropped; handlers
    /// already running are left to finish on their own.
    pub async fn close(self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::Release);
        self.shutdown.send_replace(true);
        self.accept_task
            .await
            .context("accept loop panicked")?;
        info!("Server closed");
        Ok(())
    }
}

struct AcceptLoop {
    listener: TcpListener,
    running: Arc<AtomicBool>,
    shutdown: watch::Receiver<bool>,
    handler: Arc<dyn Handler>,
    limits: ReadLimits,
    backoff: AcceptBackoff,
}

impl AcceptLoop {
    async fn run(mut self) {
        while self.running.load(Ordering::Acquire) {
            let accepted = tokio::select! {
                res = self.listener.accept() => res,
                _ = shutdown_requested(&mut self.shutdown) => break,
            };

            match accepted {
                Ok((socket, peer)) => {
                    self.backoff.on_success();
                    info!("Accepted connection from {}", peer);

                    let conn = Connection::new(
                        socket,
                        peer,
                        self.handler.clone(),
                        self.limits,
                        self.shutdown.clone(),
                    );
                    tokio::spawn(async move {
                        if let Err(e) = conn.run().await {
                            tracing::error!("Connection error from {}: {:#}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    let delay = self.backoff.on_failure();
                    warn!(
                        error = %e,
                        failures = self.backoff.failures(),
                        delay_ms = delay.as_millis() as u64,
                        "Failed to accept connection"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown_requested(&mut self.shutdown) => break,
                    }
                }
            }
        }

        self.running.store(false, Ordering::Release);
        info!("Accept loop stopped, closing listener");
    }
}
