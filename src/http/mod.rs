//! HTTP protocol implementation.
//!
//! A minimal HTTP/1.1 server built directly on a TCP byte stream: one request
//! per connection, no request bodies, responses with either a fixed-length or
//! a chunked body.
//!
//! # Architecture
//!
//! - **`headers`**: Case-insensitive header map and the header-line parser
//! - **`request`**: Request line and request types
//! - **`parser`**: Incremental request parsing from any async byte stream
//! - **`response`**: Status codes and default response headers
//! - **`writer`**: Order-enforcing response writer (plain, chunked, trailers)
//! - **`connection`**: Drives one accepted socket from request to close
//!
//! # Connection State Machine
//!
//! ```text
//!   Reading ──(request parsed)──────────► Handling ──► Closed
//!      │                                                 ▲
//!      ├──(malformed / timed out)──► Rejecting (500) ────┤
//!      └──(server shutdown)──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use httpfromtcp::config::Config;
//! use httpfromtcp::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::serve(&Config::default(), my_handler).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.close().await
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
