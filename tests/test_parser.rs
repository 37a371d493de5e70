mod common;

use std::io;

use common::{ChunkReader, FailingReader};
use httpfromtcp::http::headers::HeaderError;
use httpfromtcp::http::parser::{INITIAL_BUFFER_CAPACITY, ParseError, parse_request_line};
use httpfromtcp::http::request::{ParseState, Request};

const GOOD_GET: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n";

#[test]
fn test_parse_request_line() {
    let (line, consumed) = parse_request_line(b"GET /path HTTP/1.1\r\n").unwrap().unwrap();

    assert_eq!(line.method, "GET");
    assert_eq!(line.target, "/path");
    assert_eq!(line.http_version, "1.1");
    assert_eq!(consumed, 20);
}

#[test]
fn test_parse_request_line_lowercase_method() {
    let result = parse_request_line(b"get /path HTTP/1.1\r\n");
    assert!(matches!(result, Err(ParseError::LowercaseMethod(m)) if m == "get"));

    let result = parse_request_line(b"GeT /path HTTP/1.1\r\n");
    assert!(matches!(result, Err(ParseError::LowercaseMethod(_))));
}

#[test]
fn test_parse_request_line_wrong_part_count() {
    let result = parse_request_line(b"/coffee HTTP/1.1\r\n");
    assert!(matches!(result, Err(ParseError::MalformedRequestLine(_))));

    let result = parse_request_line(b"GET  /coffee HTTP/1.1\r\n");
    assert!(matches!(result, Err(ParseError::MalformedRequestLine(_))));
}

#[test]
fn test_parse_request_line_unsupported_version() {
    let result = parse_request_line(b"GET / HTTP/2.0\r\n");
    assert!(matches!(result, Err(ParseError::UnsupportedVersion(v)) if v == "2.0"));

    let result = parse_request_line(b"GET / HTTP1.1\r\n");
    assert!(matches!(result, Err(ParseError::InvalidVersion(_))));
}

#[test]
fn test_parse_request_line_target_without_slash() {
    let result = parse_request_line(b"GET coffee HTTP/1.1\r\n");
    assert!(matches!(result, Err(ParseError::InvalidTarget(t)) if t == "coffee"));
}

#[test]
fn test_parse_request_line_with_query_string() {
    let (line, _) = parse_request_line(b"POST /search?q=rust HTTP/1.1\r\n").unwrap().unwrap();

    assert_eq!(line.method, "POST");
    assert_eq!(line.target, "/search?q=rust");
}

#[test]
fn test_parse_request_line_invalid_utf8() {
    let result = parse_request_line(b"GET /\xff HTTP/1.1\r\n");
    assert!(matches!(result, Err(ParseError::InvalidEncoding)));
}

#[tokio::test]
async fn test_from_reader_good_get() {
    let mut reader = ChunkReader::new(GOOD_GET, 3);
    let request = Request::from_reader(&mut reader).await.unwrap();

    assert!(request.is_done());
    assert_eq!(request.method(), "GET");
    assert_eq!(request.target(), "/");
    assert_eq!(request.request_line.http_version, "1.1");
    assert_eq!(request.header("Host"), Some("localhost:42069"));
    assert_eq!(request.header("user-agent"), Some("curl/7.81.0"));
    assert_eq!(request.header("accept"), Some("*/*"));
}

#[tokio::test]
async fn test_from_reader_is_independent_of_read_boundaries() {
    let raw: &[u8] = b"POST /coffee HTTP/1.1\r\nHost: localhost:42069\r\nSet-Cookie: a\r\nSet-Cookie: b\r\nContent-Type: application/json\r\n\r\n";

    let mut whole: &[u8] = raw;
    let expected = Request::from_reader(&mut whole).await.unwrap();

    for chunk_size in 1..=raw.len() {
        let mut reader = ChunkReader::new(raw, chunk_size);
        let request = Request::from_reader(&mut reader).await.unwrap();
        assert_eq!(request, expected, "chunk size {chunk_size}");
    }
    assert_eq!(expected.header("set-cookie"), Some("a, b"));
}

#[tokio::test]
async fn test_from_reader_grows_buffer_for_long_request_line() {
    let target = format!("/{}", "a".repeat(INITIAL_BUFFER_CAPACITY * 64));
    let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");

    let mut reader = ChunkReader::new(raw.as_bytes(), 5);
    let request = Request::from_reader(&mut reader).await.unwrap();

    assert_eq!(request.target(), target);
    assert_eq!(request.header("host"), Some("localhost"));
}

#[tokio::test]
async fn test_from_reader_without_headers() {
    let mut reader = ChunkReader::new(&b"GET /ping HTTP/1.1\r\n\r\n"[..], 4);
    let request = Request::from_reader(&mut reader).await.unwrap();

    assert_eq!(request.target(), "/ping");
    assert!(request.headers.is_empty());
}

#[tokio::test]
async fn test_from_reader_incomplete_request() {
    let mut reader = ChunkReader::new(&b"GET / HTTP/1.1\r\nHost: localhost\r\n"[..], 8);
    let result = Request::from_reader(&mut reader).await;

    assert!(matches!(
        result,
        Err(ParseError::Incomplete {
            state: ParseState::ParsingHeaders
        })
    ));
}

#[tokio::test]
async fn test_from_reader_empty_stream() {
    let mut reader = ChunkReader::new(Vec::<u8>::new(), 8);
    let result = Request::from_reader(&mut reader).await;

    assert!(matches!(
        result,
        Err(ParseError::Incomplete {
            state: ParseState::Initialized
        })
    ));
}

#[tokio::test]
async fn test_from_reader_invalid_header() {
    let mut reader = ChunkReader::new(&b"GET / HTTP/1.1\r\nHost : localhost\r\n\r\n"[..], 3);
    let result = Request::from_reader(&mut reader).await;

    assert!(matches!(
        result,
        Err(ParseError::Header(HeaderError::SpacingBeforeColon))
    ));
}

#[tokio::test]
async fn test_from_reader_propagates_io_errors() {
    let mut reader = FailingReader(io::ErrorKind::ConnectionReset);
    let result = Request::from_reader(&mut reader).await;

    assert!(matches!(result, Err(ParseError::Io(e)) if e.kind() == io::ErrorKind::ConnectionReset));
}

#[tokio::test]
async fn test_from_reader_leaves_body_bytes_unparsed() {
    let mut reader = ChunkReader::new(&b"GET / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello"[..], 64);
    let request = Request::from_reader(&mut reader).await.unwrap();

    assert_eq!(request.header("content-length"), Some("5"));
}

#[tokio::test]
async fn test_from_reader_limited_rejects_oversized_head() {
    let raw = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(256));

    let mut reader = ChunkReader::new(raw.as_bytes(), 16);
    let result = Request::from_reader_limited(&mut reader, Some(64)).await;

    assert!(matches!(result, Err(ParseError::HeadTooLarge { limit: 64 })));
}

#[tokio::test]
async fn test_from_reader_limited_accepts_head_within_limit() {
    let mut reader = ChunkReader::new(GOOD_GET, 16);
    let request = Request::from_reader_limited(&mut reader, Some(GOOD_GET.len()))
        .await
        .unwrap();

    assert_eq!(request.header("host"), Some("localhost:42069"));
}
