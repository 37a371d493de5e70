use httpfromtcp::config::Config;
use httpfromtcp::http::headers::HeaderMap;
use httpfromtcp::http::request::Request;
use httpfromtcp::http::response::{StatusCode, TEXT_HTML, TEXT_PLAIN, default_headers};
use httpfromtcp::http::writer::ResponseWriter;
use httpfromtcp::server::{HandlerFuture, Server, Sink};
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

const MAX_DEMO_CHUNKS: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let server = Server::serve(&cfg, handler).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.close().await
}

fn handler<'a>(w: &'a mut ResponseWriter<Sink>, req: &'a Request) -> HandlerFuture<'a> {
    Box::pin(async move {
        let target = req.target();
        if let Some(count) = target.strip_prefix("/chunked/") {
            return match count.parse::<usize>() {
                Ok(n) if n <= MAX_DEMO_CHUNKS => write_chunked(w, n).await,
                _ => write_page(w, StatusCode::BadRequest, BAD_REQUEST_PAGE).await,
            };
        }

        match target {
            "/yourproblem" => write_page(w, StatusCode::BadRequest, BAD_REQUEST_PAGE).await,
            "/myproblem" => write_page(w, StatusCode::InternalServerError, SERVER_ERROR_PAGE).await,
            _ => write_page(w, StatusCode::Ok, OK_PAGE).await,
        }
    })
}

async fn write_page(
    w: &mut ResponseWriter<Sink>,
    status: StatusCode,
    page: &str,
) -> anyhow::Result<()> {
    w.write_status_line(status).await?;
    w.write_headers(&default_headers(page.len(), Some(TEXT_HTML)))
        .await?;
    w.write_body(page.as_bytes()).await?;
    Ok(())
}

/// Streams `n` generated lines as separate chunks, followed by a digest of
/// the whole body in the trailers.
async fn write_chunked(w: &mut ResponseWriter<Sink>, n: usize) -> anyhow::Result<()> {
    let mut headers = default_headers(0, Some(TEXT_PLAIN));
    headers.remove("Content-Length");
    headers.insert("Transfer-Encoding", "chunked");
    headers.insert("Trailer", "X-Content-SHA256, X-Content-Length");

    w.write_status_line(StatusCode::Ok).await?;
    w.write_headers(&headers).await?;

    let mut hasher = Sha256::new();
    let mut total = 0usize;
    for i in 0..n {
        let line = format!("chunk {i}\n");
        hasher.update(line.as_bytes());
        total += line.len();
        w.write_chunked_body(line.as_bytes()).await?;
    }
    w.write_chunked_body_done().await?;

    let mut trailers = HeaderMap::new();
    trailers.insert("X-Content-SHA256", hex::encode(hasher.finalize()));
    trailers.insert("X-Content-Length", total.to_string());
    w.write_trailers(&trailers).await?;
    Ok(())
}

const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>
";

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>
";

const SERVER_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>
";
