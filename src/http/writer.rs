use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::HeaderMap;
use crate::http::response::StatusCode;

/// Which part of the response the writer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    StatusLineNext,
    HeadersNext,
    BodyNext,
    TrailersNext,
    Done,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("out-of-order write: cannot {operation} in state {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: WriterState,
    },

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Streams a response straight to its sink in protocol order.
///
/// ```text
/// StatusLineNext -> HeadersNext -> BodyNext -+-> Done                 (write_body)
///                                            +-> TrailersNext -> Done (chunked)
/// ```
///
/// Every operation checks the state first; a call made out of order fails
/// with [`WriteError::OutOfOrder`] without touching the sink.
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::StatusLineNext,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == WriterState::Done
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.expect(WriterState::StatusLineNext, "write status line")?;
        self.sink.write_all(status.status_line()).await?;
        self.state = WriterState::HeadersNext;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &HeaderMap) -> Result<(), WriteError> {
        self.expect(WriterState::HeadersNext, "write headers")?;
        let mut buf = serialize_fields(headers);
        buf.extend_from_slice(b"\r\n");
        self.sink.write_all(&buf).await?;
        self.state = WriterState::BodyNext;
        Ok(())
    }

    /// Writes a fixed-length body and finishes the response.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), WriteError> {
        self.expect(WriterState::BodyNext, "write body")?;
        self.sink.write_all(body).await?;
        self.state = WriterState::Done;
        Ok(())
    }

    /// Writes one chunk of a chunked body. May be called any number of times.
    ///
    /// An empty `data` writes nothing: a zero-length chunk would end the body
    /// early, that is what [`write_chunked_body_done`](Self::write_chunked_body_done) is for.
    pub async fn write_chunked_body(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.expect(WriterState::BodyNext, "write chunked body")?;
        if data.is_empty() {
            return Ok(());
        }
        let mut buf = format!("{:x}\r\n", data.len()).into_bytes();
        buf.extend_from_slice(data);
        buf.extend_from_slice(b"\r\n");
        self.sink.write_all(&buf).await?;
        Ok(())
    }

    /// Writes the terminating zero-length chunk. Trailers must follow.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), WriteError> {
        self.expect(WriterState::BodyNext, "finish chunked body")?;
        self.sink.write_all(b"0\r\n").await?;
        self.state = WriterState::TrailersNext;
        Ok(())
    }

    /// Writes the trailer fields, if any, and the blank line ending the message.
    pub async fn write_trailers(&mut self, trailers: &HeaderMap) -> Result<(), WriteError> {
        self.expect(WriterState::TrailersNext, "write trailers")?;
        let mut buf = serialize_fields(trailers);
        buf.extend_from_slice(b"\r\n");
        self.sink.write_all(&buf).await?;
        self.state = WriterState::Done;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriteError> {
        self.sink.flush().await?;
        Ok(())
    }

    fn expect(&self, expected: WriterState, operation: &'static str) -> Result<(), WriteError> {
        if self.state != expected {
            return Err(WriteError::OutOfOrder {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}

fn serialize_fields(fields: &HeaderMap) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, value) in fields.iter() {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf
}
