//! Accepts connections one at a time and prints each parsed request.

use httpfromtcp::config::Config;
use httpfromtcp::http::connection::{ReadLimits, read_request};
use httpfromtcp::http::request::Request;
use httpfromtcp::server::backoff::AcceptBackoff;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cfg = Config::load()?;
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on {}", cfg.listen_addr);

    let limits = ReadLimits::from_config(&cfg);
    let mut backoff = AcceptBackoff::new(&cfg.accept_backoff);

    loop {
        let (mut socket, peer) = match listener.accept().await {
            Ok(accepted) => {
                backoff.on_success();
                accepted
            }
            Err(e) => {
                let delay = backoff.on_failure();
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "Failed to accept connection");
                tokio::time::sleep(delay).await;
                continue;
            }
        };
        info!("Connection has been established with {}", peer);

        match read_request(&mut socket, limits).await {
            Ok(request) => print_request(&request),
            Err(e) => error!(peer = %peer, error = %e, "Failed to parse request"),
        }

        info!("Connection to {} has been closed", peer);
    }
}

fn print_request(request: &Request) {
    let line = &request.request_line;
    println!("Request line:");
    println!("- Method: {}", line.method);
    println!("- Target: {}", line.target);
    println!("- Version: {}", line.http_version);

    println!("Headers:");
    let mut headers: Vec<_> = request.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        println!("- {}: {}", name, value);
    }
}
