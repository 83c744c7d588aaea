//! HTTP request header handling.
//!
//! [`RequestHeader`] wraps `http::Request<()>` and adds the accessors the body and
//! query stages decide on: declared content length, chunked transfer, content type
//! and the raw query string.

use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// The content type assumed when a request does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Represents an HTTP request header.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The declared `Content-Length`.
    ///
    /// Returns `None` when the header is absent or is not a valid length.
    pub fn content_length(&self) -> Option<u64> {
        let value = self.headers().get(CONTENT_LENGTH)?;
        value.to_str().ok()?.trim().parse().ok()
    }

    /// Whether the body is sent with the `chunked` transfer coding.
    pub fn is_chunked(&self) -> bool {
        self.headers()
            .get_all(TRANSFER_ENCODING)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
    }

    /// The media type of the body with any parameters stripped, as sent by the client.
    ///
    /// `application/json; charset=utf-8` yields `application/json`. Case is preserved,
    /// callers that compare should normalize. Falls back to [`DEFAULT_CONTENT_TYPE`].
    pub fn content_type(&self) -> &str {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|essence| !essence.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// The full `Content-Type` header parsed as a [`mime::Mime`], parameters included.
    pub fn mime(&self) -> Option<mime::Mime> {
        self.headers().get(CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    /// The `Content-Encoding` header, if any.
    pub fn content_encoding(&self) -> Option<&str> {
        self.headers().get(CONTENT_ENCODING).and_then(|value| value.to_str().ok()).map(str::trim)
    }

    /// The raw, still percent-encoded query string.
    pub fn query_string(&self) -> Option<&str> {
        self.uri().query()
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
