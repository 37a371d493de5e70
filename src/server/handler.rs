//! The seam between the dispatcher and application code.

use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncWrite;

use crate::http::request::Request;
use crate::http::writer::ResponseWriter;

/// Output half of a connection as seen by handlers.
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Produces the response for one parsed request.
///
/// Called once per connection, after the request head has been parsed. The
/// handler drives `writer` through the full response; once it returns the
/// connection is closed.
///
/// Plain functions with the matching signature implement this trait:
///
/// ```ignore
/// fn hello<'a>(w: &'a mut ResponseWriter<Sink>, _req: &'a Request) -> HandlerFuture<'a> {
///     Box::pin(async move {
///         w.write_status_line(StatusCode::Ok).await?;
///         w.write_headers(&default_headers(5, None)).await?;
///         w.write_body(b"hello").await?;
///         Ok(())
///     })
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle<'a>(
        &'a self,
        writer: &'a mut ResponseWriter<Sink>,
        request: &'a Request,
    ) -> HandlerFuture<'a>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut ResponseWriter<Sink>, &'a Request) -> HandlerFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        writer: &'a mut ResponseWriter<Sink>,
        request: &'a Request,
    ) -> HandlerFuture<'a> {
        self(writer, request)
    }
}
