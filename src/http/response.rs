use thiserror::Error;

use crate::http::headers::HeaderMap;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

/// HTTP status codes the writer can emit.
///
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request
/// - `InternalServerError` (500): Server error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 500 Internal Server Error
    InternalServerError,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unsupported status code: {0}")]
pub struct UnsupportedStatus(pub u16);

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpfromtcp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// The complete status line, CRLF included.
    pub(crate) fn status_line(&self) -> &'static [u8] {
        match self {
            StatusCode::Ok => b"HTTP/1.1 200 OK\r\n",
            StatusCode::BadRequest => b"HTTP/1.1 400 Bad Request\r\n",
            StatusCode::InternalServerError => b"HTTP/1.1 500 Internal Server Error\r\n",
        }
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = UnsupportedStatus;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(StatusCode::Ok),
            400 => Ok(StatusCode::BadRequest),
            500 => Ok(StatusCode::InternalServerError),
            other => Err(UnsupportedStatus(other)),
        }
    }
}

/// Headers for a fixed-length, non-persistent response.
///
/// A response that switches to chunked transfer must drop `Content-Length`
/// and set `Transfer-Encoding: chunked` instead.
pub fn default_headers(content_len: usize, content_type: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Content-Length", content_len.to_string());
    headers.insert("Connection", "close");
    headers.insert("Content-Type", content_type.unwrap_or(TEXT_PLAIN));
    headers
}
