use crate::http::headers::HeaderMap;

/// The first line of a request: `METHOD SP TARGET SP HTTP/VERSION`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method, uppercase letters only (e.g. "GET")
    pub method: String,
    /// Request target as sent by the client (e.g. "/index.html")
    pub target: String,
    /// Protocol version without the `HTTP/` prefix, always "1.1"
    pub http_version: String,
}

/// Where the incremental parser is in a request.
///
/// ```text
/// Initialized --(request line)--> ParsingHeaders --(blank line)--> Done
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseState {
    #[default]
    Initialized,
    ParsingHeaders,
    Done,
}

/// A request being parsed, or fully parsed once `state` is `Done`.
///
/// The parsing operations live in [`crate::http::parser`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: HeaderMap,
    pub(crate) state: ParseState,
}

impl Request {
    /// Creates an empty request in the `Initialized` state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// True once the header section has been fully read.
    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
