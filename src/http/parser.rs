use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::headers::{HeaderError, find_crlf};
use crate::http::request::{ParseState, Request, RequestLine};

/// Capacity of the read buffer before it first has to grow.
pub const INITIAL_BUFFER_CAPACITY: usize = 8;

const SUPPORTED_VERSION: &str = "1.1";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line: expected 3 parts in {0:?}")]
    MalformedRequestLine(String),

    #[error("invalid http version string: {0:?}")]
    InvalidVersion(String),

    #[error("unsupported http version: {0:?}")]
    UnsupportedVersion(String),

    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),

    #[error("method must be uppercase: {0:?}")]
    LowercaseMethod(String),

    #[error("request line is not valid UTF-8")]
    InvalidEncoding,

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("parser already complete")]
    AlreadyDone,

    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("incomplete request: stream ended while in state {state:?}")]
    Incomplete { state: ParseState },

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses the request line at the front of `data`.
///
/// Returns `Ok(None)` when no CRLF has been buffered yet. On success the
/// second element is the number of bytes consumed, CRLF included.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(idx) = find_crlf(data) else {
        return Ok(None);
    };
    let line = std::str::from_utf8(&data[..idx]).map_err(|_| ParseError::InvalidEncoding)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::MalformedRequestLine(line.to_string()));
    };

    let version_parts: Vec<&str> = version.split('/').collect();
    let [_, http_version] = version_parts[..] else {
        return Err(ParseError::InvalidVersion(version.to_string()));
    };
    if http_version != SUPPORTED_VERSION {
        return Err(ParseError::UnsupportedVersion(http_version.to_string()));
    }

    if !target.contains('/') {
        return Err(ParseError::InvalidTarget(target.to_string()));
    }

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ParseError::LowercaseMethod(method.to_string()));
    }

    let request_line = RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        http_version: http_version.to_string(),
    };
    Ok(Some((request_line, idx + 2)))
}

impl Request {
    /// Feeds buffered bytes to the parser until it either completes or runs
    /// out of complete lines.
    ///
    /// Returns how many bytes of `data` were consumed; the caller keeps the
    /// rest and presents it again with more input appended.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut total = 0;
        loop {
            let n = self.parse_single(&data[total..])?;
            total += n;
            if n == 0 || self.is_done() {
                return Ok(total);
            }
        }
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::Initialized => match parse_request_line(data)? {
                Some((request_line, n)) => {
                    self.request_line = request_line;
                    self.state = ParseState::ParsingHeaders;
                    Ok(n)
                }
                None => Ok(0),
            },
            ParseState::ParsingHeaders => {
                let (n, done) = self.headers.parse_one(data)?;
                if done {
                    self.state = ParseState::Done;
                }
                Ok(n)
            }
            ParseState::Done => Err(ParseError::AlreadyDone),
        }
    }

    /// Reads and parses a request from `reader`, however the stream happens
    /// to split it across reads.
    ///
    /// The read buffer starts at [`INITIAL_BUFFER_CAPACITY`] bytes and doubles
    /// whenever it fills up without a complete line in it.
    pub async fn from_reader<R>(reader: &mut R) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        Self::from_reader_limited(reader, None).await
    }

    /// Like [`from_reader`](Self::from_reader), but fails with
    /// [`ParseError::HeadTooLarge`] once more than `max_head_bytes` have been
    /// read without reaching the end of the header section.
    pub async fn from_reader_limited<R>(
        reader: &mut R,
        max_head_bytes: Option<usize>,
    ) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut request = Request::new();
        let mut buffer = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        let mut received = 0usize;

        while !request.is_done() {
            if buffer.len() == buffer.capacity() {
                let grow_by = buffer.capacity().max(INITIAL_BUFFER_CAPACITY);
                buffer.reserve(grow_by);
            }

            let n = reader.read_buf(&mut buffer).await?;
            if n == 0 {
                return Err(ParseError::Incomplete {
                    state: request.state,
                });
            }
            received += n;

            let consumed = request.parse(&buffer)?;
            buffer.advance(consumed);

            if let Some(limit) = max_head_bytes {
                if !request.is_done() && received > limit {
                    return Err(ParseError::HeadTooLarge { limit });
                }
            }
        }

        Ok(request)
    }
}
