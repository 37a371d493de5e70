use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::parser::ParseError;
use crate::http::request::Request;
use crate::http::response::{StatusCode, TEXT_HTML, default_headers};
use crate::http::writer::ResponseWriter;
use crate::server::handler::{Handler, Sink};
use crate::server::shutdown_requested;

/// Why a request head could not be read.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("request not received within {0:?}")]
    TimedOut(Duration),
}

/// Bounds applied while waiting for a request head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadLimits {
    pub timeout: Option<Duration>,
    pub max_head_bytes: Option<usize>,
}

impl ReadLimits {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            timeout: cfg.read_timeout(),
            max_head_bytes: cfg.max_head_bytes,
        }
    }
}

/// Reads one request head from `reader` within `limits`.
pub async fn read_request<R>(reader: &mut R, limits: ReadLimits) -> Result<Request, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let parse = Request::from_reader_limited(reader, limits.max_head_bytes);
    match limits.timeout {
        Some(limit) => match tokio::time::timeout(limit, parse).await {
            Ok(res) => res.map_err(ReadError::from),
            Err(_) => Err(ReadError::TimedOut(limit)),
        },
        None => parse.await.map_err(ReadError::from),
    }
}

pub struct Connection {
    reader: OwnedReadHalf,
    writer: ResponseWriter<Sink>,
    peer: SocketAddr,
    handler: Arc<dyn Handler>,
    limits: ReadLimits,
    shutdown: watch::Receiver<bool>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Handling(Request),
    Rejecting(ReadError),
    Closed,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        handler: Arc<dyn Handler>,
        limits: ReadLimits,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader,
            writer: ResponseWriter::new(Box::new(writer)),
            peer,
            handler,
            limits,
            shutdown,
            state: ConnectionState::Reading,
        }
    }

    /// Serves exactly one request, then closes the connection.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.await_request().await {
                        Some(Ok(request)) => ConnectionState::Handling(request),
                        Some(Err(ReadError::Parse(ParseError::Io(e)))) => {
                            return Err(anyhow::Error::new(e).context("reading request"));
                        }
                        Some(Err(e)) => ConnectionState::Rejecting(e),
                        None => {
                            debug!(peer = %self.peer, "Shutdown while reading request");
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Handling(request) => {
                    info!(
                        peer = %self.peer,
                        method = request.method(),
                        target = request.target(),
                        "Handling request"
                    );
                    if let Err(e) = self.handler.handle(&mut self.writer, &request).await {
                        tracing::error!(peer = %self.peer, error = %e, "Handler failed");
                    }
                    if !self.writer.is_done() {
                        warn!(
                            peer = %self.peer,
                            state = ?self.writer.state(),
                            "Handler returned before finishing the response"
                        );
                    }
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Rejecting(err) => {
                    warn!(peer = %self.peer, error = %err, "Rejecting malformed request");
                    write_error_response(&mut self.writer, &err).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        self.writer.into_inner().shutdown().await?;
        Ok(())
    }

    /// `None` when the server shut down before a request arrived.
    async fn await_request(&mut self) -> Option<Result<Request, ReadError>> {
        let Self {
            reader,
            limits,
            shutdown,
            ..
        } = self;

        tokio::select! {
            res = read_request(reader, *limits) => Some(res),
            _ = shutdown_requested(shutdown) => None,
        }
    }
}

async fn write_error_response(
    writer: &mut ResponseWriter<Sink>,
    err: &ReadError,
) -> anyhow::Result<()> {
    let body = format!(
        "<html>\n  <head>\n    <title>500 Internal Server Error</title>\n  </head>\n  <body>\n    <h1>Internal Server Error</h1>\n    <p>{}</p>\n  </body>\n</html>\n",
        escape_html(&err.to_string())
    );

    writer.write_status_line(StatusCode::InternalServerError).await?;
    writer
        .write_headers(&default_headers(body.len(), Some(TEXT_HTML)))
        .await?;
    writer.write_body(body.as_bytes()).await?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
