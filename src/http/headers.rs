//! Case-insensitive header storage and the incremental field-line parser.

use std::collections::HashMap;
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Punctuation allowed in a header name besides letters and digits.
const SPECIAL_KEY_CHARS: &[u8] = b"!#$%&*+-.^_`|~'";

/// Errors produced while parsing a single header line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("malformed header line: no ':' found")]
    MalformedLine,

    #[error("invalid spacing before colon in header line")]
    SpacingBeforeColon,

    #[error("invalid header key character: {0:?}")]
    InvalidKeyCharacter(char),

    #[error("header key is empty")]
    EmptyKey,

    #[error("header line is not valid UTF-8")]
    InvalidEncoding,
}

/// Header fields keyed by their lower-cased name.
///
/// Repeated names are combined into a single value joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses at most one header line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// terminates the header section was reached. `Ok((0, false))` means no
    /// complete line is buffered yet and more input is needed.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpfromtcp::http::headers::HeaderMap;
    /// let mut headers = HeaderMap::new();
    /// assert_eq!(headers.parse_one(b"Host: example.com\r\n").unwrap(), (19, false));
    /// assert_eq!(headers.parse_one(b"\r\n").unwrap(), (2, true));
    /// assert_eq!(headers.get("HOST"), Some("example.com"));
    /// ```
    pub fn parse_one(&mut self, data: &[u8]) -> Result<(usize, bool), HeaderError> {
        let Some(idx) = find_crlf(data) else {
            return Ok((0, false));
        };
        if idx == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = &data[..idx];
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(HeaderError::MalformedLine)?;
        let (key, value) = (&line[..colon], &line[colon + 1..]);

        if key.last().is_some_and(|b| b.is_ascii_whitespace()) {
            return Err(HeaderError::SpacingBeforeColon);
        }

        let key = key.trim_ascii();
        if key.is_empty() {
            return Err(HeaderError::EmptyKey);
        }
        if let Some(&bad) = key.iter().find(|&&b| !is_key_byte(b)) {
            return Err(HeaderError::InvalidKeyCharacter(bad as char));
        }

        // The key is pure ASCII at this point, only the value can be off.
        let key = std::str::from_utf8(key).map_err(|_| HeaderError::InvalidEncoding)?;
        let value = std::str::from_utf8(value.trim_ascii()).map_err(|_| HeaderError::InvalidEncoding)?;

        self.append(key, value);
        Ok((idx + CRLF.len(), false))
    }

    /// Looks a header up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Sets a header, replacing any existing value.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.fields
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Adds a header value, combining it with an existing one as `"old, new"`.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        let value = value.as_ref();
        self.fields
            .entry(name.as_ref().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || SPECIAL_KEY_CHARS.contains(&b)
}
