//! httpfromtcp - HTTP/1.1 over a raw TCP stream
//!
//! Incremental request parsing, an order-enforcing response writer with
//! chunked bodies and trailers, and a task-per-connection dispatcher.

pub mod config;
pub mod http;
pub mod server;
